use log::{info, warn};

use super::GravitySource;
use crate::{
    error::GravityError,
    types::{Vec3, try_normalize},
};

/// Stable identifier of a registered gravity source.
///
/// Sources are summed in ascending id order so results are identical across runs regardless of
/// registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u32);

/// Net gravity at a point plus the derived up axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravitySample {
    pub gravity: Vec3,
    /// `-normalize(gravity)`, the configured fallback when gravity is zero, otherwise `None`.
    pub up_axis: Option<Vec3>,
}

/// Registry and aggregator of gravity sources.
///
/// Owned explicitly by the simulation and passed by reference to whatever samples it. Edit the
/// registry only between ticks; sampling is a pure read.
#[derive(Clone, Debug, Default)]
pub struct GravityField {
    sources: Vec<(SourceId, GravitySource)>,
    fallback_up: Option<Vec3>,
}

impl GravityField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field that reports `up` whenever the net gravity has no direction.
    ///
    /// Without a fallback, [`GravityField::sample_with_up_axis`] yields `None` in that case.
    pub fn with_fallback_up(up: Vec3) -> Self {
        Self {
            sources: Vec::new(),
            fallback_up: try_normalize(up),
        }
    }

    pub fn fallback_up(&self) -> Option<Vec3> {
        self.fallback_up
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.position(id).is_ok()
    }

    pub fn get(&self, id: SourceId) -> Option<&GravitySource> {
        self.position(id).ok().map(|i| &self.sources[i].1)
    }

    /// Mutable access for re-parameterising a source between ticks.
    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut GravitySource> {
        self.position(id).ok().map(|i| &mut self.sources[i].1)
    }

    /// Register a source.
    ///
    /// # Panics
    /// If `id` is already registered. Duplicate registration is a caller bug; use
    /// [`GravityField::try_register`] to probe instead.
    pub fn register(&mut self, id: SourceId, source: impl Into<GravitySource>) {
        if let Err(err) = self.try_register(id, source) {
            panic!("{err}");
        }
    }

    /// Register a source, reporting duplicate registration as an error.
    pub fn try_register(
        &mut self,
        id: SourceId,
        source: impl Into<GravitySource>,
    ) -> Result<(), GravityError> {
        match self.position(id) {
            Ok(_) => Err(GravityError::DuplicateSource(id)),
            Err(slot) => {
                self.sources.insert(slot, (id, source.into()));
                info!("registered gravity source {:?} ({} active)", id, self.sources.len());
                Ok(())
            }
        }
    }

    /// Unregister a source and return it.
    ///
    /// # Panics
    /// If `id` is not registered.
    pub fn unregister(&mut self, id: SourceId) -> GravitySource {
        match self.try_unregister(id) {
            Ok(source) => source,
            Err(err) => panic!("{err}"),
        }
    }

    /// Unregister a source, reporting unknown ids as an error.
    pub fn try_unregister(&mut self, id: SourceId) -> Result<GravitySource, GravityError> {
        let index = self
            .position(id)
            .map_err(|_| GravityError::UnknownSource(id))?;
        let (_, source) = self.sources.remove(index);
        info!("unregistered gravity source {:?} ({} active)", id, self.sources.len());
        Ok(source)
    }

    /// Net gravity at `point`: the sum of every source's contribution.
    pub fn sample(&self, point: Vec3) -> Vec3 {
        self.sources
            .iter()
            .fold(Vec3::zeros(), |acc, (_, source)| acc + source.contribution(point))
    }

    /// Net gravity at `point` plus the up axis opposite to it.
    pub fn sample_with_up_axis(&self, point: Vec3) -> GravitySample {
        let gravity = self.sample(point);
        let up_axis = try_normalize(-gravity).or(self.fallback_up);
        if up_axis.is_none() {
            warn!("gravity field has no defined up axis at {:?}", point);
        }
        GravitySample { gravity, up_axis }
    }

    /// Up axis at `point`, if defined.
    pub fn up_axis(&self, point: Vec3) -> Option<Vec3> {
        self.sample_with_up_axis(point).up_axis
    }

    fn position(&self, id: SourceId) -> Result<usize, usize> {
        self.sources.binary_search_by_key(&id, |(sid, _)| *sid)
    }
}
