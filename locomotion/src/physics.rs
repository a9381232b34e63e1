/*!
Boundary to the rigid-body engine.

Locomotion never integrates bodies, detects collisions or resolves impulses itself. It reads
poses and velocities, writes velocities back, pushes accelerations and asks for ray hits through
[`PhysicsWorld`]. [`crate::rapier_world::RapierWorld`] is the production implementation; tests
script the same trait.
*/

use crate::{
    layers::{Layer, LayerMask},
    types::{Iso, Vec3},
};

/// Copyable handle to a rigid body owned by the physics engine.
///
/// Holding a `BodyId` does not keep the body alive: lookups on a removed body return `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

/// Snapshot of the engine-side properties locomotion cares about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub pose: Iso,
    pub mass: f32,
    pub kinematic: bool,
    pub sleeping: bool,
}

impl BodyState {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.pose.translation.vector
    }
}

/// Whether ray queries report trigger (sensor) volumes such as water.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerInteraction {
    #[default]
    Ignore,
    Collide,
}

/// A single ray query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayQuery {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    pub max_distance: f32,
    pub mask: LayerMask,
    pub triggers: TriggerInteraction,
    /// Body whose colliders are skipped (usually the caster itself).
    pub exclude: Option<BodyId>,
}

impl RayQuery {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            mask: LayerMask::all(),
            triggers: TriggerInteraction::Ignore,
            exclude: None,
        }
    }

    pub fn with_mask(mut self, mask: LayerMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerInteraction) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn excluding(mut self, body: BodyId) -> Self {
        self.exclude = Some(body);
        self
    }
}

/// Closest hit reported by [`PhysicsWorld::raycast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    /// World-space surface normal at the hit.
    pub normal: Vec3,
    pub layer: Layer,
    /// Rigid body the hit collider is attached to, if any.
    pub body: Option<BodyId>,
}

/// The rigid-body engine as seen by locomotion.
pub trait PhysicsWorld {
    fn body(&self, id: BodyId) -> Option<BodyState>;

    fn linear_velocity(&self, id: BodyId) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec3);

    fn angular_velocity(&self, id: BodyId) -> Option<Vec3>;

    fn set_angular_velocity(&mut self, id: BodyId, velocity: Vec3);

    /// Accelerate the whole body for the next engine step (mass independent).
    fn add_acceleration(&mut self, id: BodyId, acceleration: Vec3);

    /// Accelerate the body as if pushed at `world_point` for the next engine step.
    fn add_acceleration_at_point(&mut self, id: BodyId, acceleration: Vec3, world_point: Vec3);

    /// Closest hit along the ray, if any.
    fn raycast(&self, query: &RayQuery) -> Option<RayHit>;

    /// Does any collider in `mask` (triggers included) overlap the sphere at `center`?
    fn overlaps_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;
}
