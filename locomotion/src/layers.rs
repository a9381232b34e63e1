use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// The default primitive storage for surface layer masks (one bit per layer).
pub type MaskContainer = u32;

/// Number of distinct surface layers representable in a [`LayerMask`].
pub const LAYER_COUNT: u8 = MaskContainer::BITS as u8;

/// Trait implemented by anything that maps to a single bit of a mask.
///
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // Equivalent to: 1 << index
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Classification layer of a collider (ground, stairs, climbable wall, water, ...).
///
/// Layers are plain indices; what each index means is decided by the scene that
/// assigns them and by the masks in the character settings.
///
/// Deserialization rejects indices outside `0..LAYER_COUNT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Layer(u8);

impl Layer {
    /// Layer every collider belongs to unless told otherwise.
    pub const DEFAULT: Layer = Layer(0);

    /// Highest representable layer.
    pub const LAST: Layer = Layer(LAYER_COUNT - 1);

    /// Create a layer from its index, clamping out-of-range indices to [`Layer::LAST`].
    #[inline]
    pub const fn new(index: u8) -> Self {
        if index < LAYER_COUNT {
            Self(index)
        } else {
            Self::LAST
        }
    }

    /// Create a layer from its index, rejecting out-of-range indices.
    pub fn try_new(index: u8) -> Result<Self, LayerError> {
        if index < LAYER_COUNT {
            Ok(Self(index))
        } else {
            Err(LayerError::OutOfRange(index))
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Layer {
    type Error = LayerError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::try_new(index)
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> Self {
        layer.0
    }
}

impl FlagBitmask for Layer {
    type Storage = MaskContainer;

    fn bit_index(&self) -> u8 {
        self.0
    }
}

/// A pure bitmask container.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

/// Set of surface layers a query or classification rule applies to.
pub type LayerMask = BitmaskFlags<MaskContainer>;

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    /// Mask with every bit set.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    /// Mask with no bit set.
    pub fn none() -> Self {
        Self { bits: T::zero() }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    // --- Single Tag Operations ---
    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    // --- Bulk Operations ---
    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    // --- Logic Gates ---
    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) == combined
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

impl LayerMask {
    /// Build a mask from a list of layers.
    pub fn from_layers(layers: &[Layer]) -> Self {
        let mut mask = Self::none();
        mask.add_many(layers);
        mask
    }

    /// Does this mask include `layer`?
    #[inline]
    pub fn contains(&self, layer: Layer) -> bool {
        self.has(layer)
    }
}
