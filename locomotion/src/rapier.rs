//! Schema-agnostic scene definitions and their Rapier collider builders.

use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::layers::Layer;

/// How the engine moves a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves.
    #[default]
    Fixed,
    /// Moved by script through velocities or poses; ignores forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Canonical definition of a body with a single collider.
///
/// Conventions
/// - Units are meters.
/// - `rotation` is a scaled axis (axis * angle in radians).
/// - `id` doubles as the [`crate::physics::BodyId`] of the body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u64,
    #[serde(default)]
    pub kind: BodyKind,
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    pub shape: ColliderShapeDef,
    #[serde(default)]
    pub layer: Layer,
    /// Trigger volume: reports overlaps, produces no contacts.
    #[serde(default)]
    pub sensor: bool,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// Keep the body upright (characters).
    #[serde(default)]
    pub lock_rotations: bool,
}

fn default_density() -> f32 {
    1.0
}

fn default_friction() -> f32 {
    0.5
}

impl BodyDef {
    pub fn new(id: u64, kind: BodyKind, translation: [f32; 3], shape: ColliderShapeDef) -> Self {
        Self {
            id,
            kind,
            translation,
            rotation: [0.0; 3],
            shape,
            layer: Layer::DEFAULT,
            sensor: false,
            density: default_density(),
            friction: default_friction(),
            lock_rotations: false,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_rotation(mut self, scaled_axis: [f32; 3]) -> Self {
        self.rotation = scaled_axis;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn upright(mut self) -> Self {
        self.lock_rotations = true;
        self
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) whose normal is the body's local +Y.
    ///
    /// Rotation is fully supported: the half-space normal follows the body pose.
    Plane {
        /// Offset along the plane normal (meters).
        #[serde(default)]
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: [f32; 3] },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: [f32; 3],
        border_radius: f32,
    },
}

/// Build a Rapier collider builder from a `ColliderShapeDef`.
///
/// Colliders are attached to their body with an identity local transform, except planes which
/// are shifted along their normal by `offset_along_normal`.
pub fn collider_builder(shape: &ColliderShapeDef) -> ColliderBuilder {
    match shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, *offset_along_normal, 0.0]),

        ColliderShapeDef::Cuboid { half_extents: [x, y, z] } => ColliderBuilder::cuboid(*x, *y, *z),

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),

        ColliderShapeDef::RoundCuboid {
            half_extents: [x, y, z],
            border_radius,
        } => ColliderBuilder::round_cuboid(*x, *y, *z, *border_radius),
    }
}

/// Build the collider for `def`, tagging it with the definition's layer.
pub fn collider_from_def(def: &BodyDef) -> Collider {
    collider_builder(&def.shape)
        .sensor(def.sensor)
        .density(def.density)
        .friction(def.friction)
        .user_data(u128::from(def.layer.index()))
        .build()
}

/// Build the rigid body for `def`, tagging it with the definition's id.
pub fn rigid_body_from_def(def: &BodyDef) -> RigidBody {
    let builder = match def.kind {
        BodyKind::Fixed => RigidBodyBuilder::fixed(),
        BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
    };
    let [x, y, z] = def.translation;
    let [rx, ry, rz] = def.rotation;
    let mut builder = builder
        .translation(vector![x, y, z])
        .rotation(vector![rx, ry, rz])
        .user_data(u128::from(def.id));
    if def.lock_rotations {
        builder = builder.lock_rotations();
    }
    builder.build()
}
