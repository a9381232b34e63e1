//! Rapier-backed physics world.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Gravity-free engine: every acceleration comes from the gravity field through
//!   [`PhysicsWorld`], so the pipeline steps with zero gravity.
//! - Handles stay inside: callers only ever see [`BodyId`]s. A body's id lives in its
//!   `user_data`, a collider's layer index in its own `user_data`.

// Re-export Rapier so downstream crates can use Rapier macros/types without depending on
// `rapier3d` directly.
pub use rapier3d;

use std::collections::BTreeMap;

use log::warn;
use rapier3d::{parry::query::PointQuery, prelude::*};

use crate::{
    contact::CollisionContact,
    layers::{Layer, LayerMask},
    physics::{BodyId, BodyState, PhysicsWorld, RayHit, RayQuery, TriggerInteraction},
    rapier::{BodyDef, collider_from_def, rigid_body_from_def},
    types::{Iso, Vec3},
};

/// Every Rapier structure needed to simulate and query a scene.
pub struct RapierWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub params: IntegrationParameters,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    pipeline: PhysicsPipeline,
    handles: BTreeMap<BodyId, RigidBodyHandle>,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            handles: BTreeMap::new(),
        }
    }
}

#[inline]
fn layer_of(collider: &Collider) -> Layer {
    u8::try_from(collider.user_data).map_or(Layer::LAST, Layer::new)
}

impl RapierWorld {
    /// Build a world from body definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    /// - A duplicate id keeps the first definition and logs a warning.
    ///
    /// The world is stepped once so the broad and narrow phases are populated and queries
    /// can run immediately. Nothing moves unless it starts out overlapping something.
    pub fn build(mut defs: Vec<BodyDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let mut world = Self::default();
        for def in &defs {
            world.insert(def);
        }
        let dt = world.params.dt;
        world.step(dt);
        world
    }

    /// Insert a single body. Returns `None` if `def.id` is already used.
    ///
    /// Queries see the new collider after the next [`RapierWorld::step`].
    pub fn insert(&mut self, def: &BodyDef) -> Option<BodyId> {
        let id = BodyId(def.id);
        if self.handles.contains_key(&id) {
            warn!("duplicate body id {}; definition ignored", def.id);
            return None;
        }

        let handle = self.bodies.insert(rigid_body_from_def(def));
        self.colliders
            .insert_with_parent(collider_from_def(def), handle, &mut self.bodies);
        self.handles.insert(id, handle);
        Some(id)
    }

    /// Remove a body and its colliders.
    pub fn remove(&mut self, id: BodyId) -> bool {
        let Some(handle) = self.handles.remove(&id) else {
            return false;
        };
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    pub fn handle(&self, id: BodyId) -> Option<RigidBodyHandle> {
        self.handles.get(&id).copied()
    }

    fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        self.handle(id).and_then(|h| self.bodies.get(h))
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.handle(id)?;
        self.bodies.get_mut(handle)
    }

    /// Id of the non-fixed body `collider` is attached to.
    fn moving_parent(&self, collider: &Collider) -> Option<BodyId> {
        let body = self.bodies.get(collider.parent()?)?;
        (!body.is_fixed()).then_some(BodyId(body.user_data as u64))
    }

    /// Advance the simulation by `dt` seconds, then clear accumulated forces.
    pub fn step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &Vector::zeros(),
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &(),
            &(),
        );
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    /// Contacts currently touching `id`, one per active contact point.
    ///
    /// Normals point from the touched surface toward `id`.
    pub fn contacts_for(&self, id: BodyId) -> Vec<CollisionContact> {
        let Some(body) = self.rigid_body(id) else {
            return Vec::new();
        };

        let mut contacts = Vec::new();
        for &own in body.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(own) {
                let (other, flip) = if pair.collider1 == own {
                    (pair.collider2, true)
                } else {
                    (pair.collider1, false)
                };
                let Some(other) = self.colliders.get(other) else {
                    continue;
                };
                let layer = layer_of(other);
                let other_body = self.moving_parent(other);

                for manifold in &pair.manifolds {
                    let normal = if flip {
                        -manifold.data.normal
                    } else {
                        manifold.data.normal
                    };
                    for _ in &manifold.data.solver_contacts {
                        contacts.push(CollisionContact::new(normal, layer, other_body));
                    }
                }
            }
        }
        contacts
    }

    /// Trigger volumes in `mask` overlapping `id`, reported by the body they belong to.
    pub fn trigger_overlaps(&self, id: BodyId, mask: LayerMask) -> Vec<Option<BodyId>> {
        let Some(body) = self.rigid_body(id) else {
            return Vec::new();
        };

        let mut overlaps = Vec::new();
        for &own in body.colliders() {
            for (c1, c2, intersecting) in self.narrow_phase.intersection_pairs_with(own) {
                if !intersecting {
                    continue;
                }
                let other = if c1 == own { c2 } else { c1 };
                let Some(other) = self.colliders.get(other) else {
                    continue;
                };
                if other.is_sensor() && mask.contains(layer_of(other)) {
                    overlaps.push(self.moving_parent(other));
                }
            }
        }
        overlaps
    }

    /// Drive a kinematic body by velocity.
    pub fn set_kinematic_velocity(&mut self, id: BodyId, linear: Vec3, angular: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_linvel(linear, true);
            body.set_angvel(angular, true);
        }
    }

    /// Teleport a body.
    pub fn set_position(&mut self, id: BodyId, pose: Iso) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_position(pose, true);
        }
    }
}

impl PhysicsWorld for RapierWorld {
    fn body(&self, id: BodyId) -> Option<BodyState> {
        self.rigid_body(id).map(|b| BodyState {
            pose: *b.position(),
            mass: b.mass(),
            kinematic: b.is_kinematic(),
            sleeping: b.is_sleeping(),
        })
    }

    fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.rigid_body(id).map(|b| *b.linvel())
    }

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_linvel(velocity, true);
        }
    }

    fn angular_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.rigid_body(id).map(|b| *b.angvel())
    }

    fn set_angular_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_angvel(velocity, true);
        }
    }

    fn add_acceleration(&mut self, id: BodyId, acceleration: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            let mass = body.mass();
            body.add_force(acceleration * mass, true);
        }
    }

    fn add_acceleration_at_point(&mut self, id: BodyId, acceleration: Vec3, world_point: Vec3) {
        if let Some(body) = self.rigid_body_mut(id) {
            let mass = body.mass();
            body.add_force_at_point(acceleration * mass, Point::from(world_point), true);
        }
    }

    fn raycast(&self, query: &RayQuery) -> Option<RayHit> {
        let mask = query.mask;
        let in_mask = |_: ColliderHandle, c: &Collider| mask.contains(layer_of(c));

        let mut filter = QueryFilter::default().predicate(&in_mask);
        if query.triggers == TriggerInteraction::Ignore {
            filter = filter.exclude_sensors();
        }
        if let Some(handle) = query.exclude.and_then(|id| self.handle(id)) {
            filter = filter.exclude_rigid_body(handle);
        }

        let pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );
        let ray = Ray::new(Point::from(query.origin), query.direction);
        let (handle, hit) = pipeline.cast_ray_and_get_normal(&ray, query.max_distance, true)?;
        let collider = self.colliders.get(handle)?;

        Some(RayHit {
            distance: hit.time_of_impact,
            normal: hit.normal,
            layer: layer_of(collider),
            body: self.moving_parent(collider),
        })
    }

    fn overlaps_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        let center = Point::from(center);
        self.colliders.iter().any(|(_, c)| {
            mask.contains(layer_of(c))
                && c.shape().distance_to_point(c.position(), &center, true) <= radius
        })
    }
}
