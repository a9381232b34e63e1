//! Scripted [`PhysicsWorld`] for unit tests.
//!
//! Bodies never move on their own: tests set poses and velocities explicitly. Ray casts only see
//! infinite planes registered with the `add_*` helpers, and point checks only see boxes.

use std::collections::BTreeMap;

use crate::{
    layers::{Layer, LayerMask},
    physics::{BodyId, BodyState, PhysicsWorld, RayHit, RayQuery, TriggerInteraction},
    types::{Iso, Vec3},
};

#[derive(Clone, Debug)]
pub struct MockBody {
    pub state: BodyState,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Every acceleration pushed since the last [`MockWorld::clear_accelerations`], with its
    /// application point when one was given.
    pub accelerations: Vec<(Vec3, Option<Vec3>)>,
}

#[derive(Clone, Copy, Debug)]
struct MockPlane {
    point: Vec3,
    normal: Vec3,
    layer: Layer,
    trigger: bool,
    body: Option<BodyId>,
}

#[derive(Clone, Copy, Debug)]
struct MockVolume {
    min: Vec3,
    max: Vec3,
    layer: Layer,
}

#[derive(Clone, Debug, Default)]
pub struct MockWorld {
    bodies: BTreeMap<BodyId, MockBody>,
    planes: Vec<MockPlane>,
    volumes: Vec<MockVolume>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, id: BodyId, position: Vec3, mass: f32, kinematic: bool) {
        self.bodies.insert(
            id,
            MockBody {
                state: BodyState {
                    pose: Iso::translation(position.x, position.y, position.z),
                    mass,
                    kinematic,
                    sleeping: false,
                },
                linear_velocity: Vec3::zeros(),
                angular_velocity: Vec3::zeros(),
                accelerations: Vec::new(),
            },
        );
    }

    pub fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(&id);
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut MockBody {
        self.bodies.get_mut(&id).expect("unknown mock body")
    }

    pub fn mock_body(&self, id: BodyId) -> &MockBody {
        self.bodies.get(&id).expect("unknown mock body")
    }

    pub fn set_pose(&mut self, id: BodyId, pose: Iso) {
        self.body_mut(id).state.pose = pose;
    }

    pub fn clear_accelerations(&mut self, id: BodyId) {
        self.body_mut(id).accelerations.clear();
    }

    /// Solid plane through `point` facing `normal`.
    pub fn add_plane(&mut self, point: Vec3, normal: Vec3, layer: Layer, body: Option<BodyId>) {
        self.planes.push(MockPlane {
            point,
            normal: normal.normalize(),
            layer,
            trigger: false,
            body,
        });
    }

    /// Solid horizontal floor at `height`.
    pub fn add_floor(&mut self, height: f32, layer: Layer, body: Option<BodyId>) {
        self.add_plane(Vec3::new(0.0, height, 0.0), Vec3::y(), layer, body);
    }

    /// Horizontal trigger plane standing in for the top face of a water volume.
    pub fn add_water_surface(&mut self, height: f32, layer: Layer, body: Option<BodyId>) {
        self.planes.push(MockPlane {
            point: Vec3::new(0.0, height, 0.0),
            normal: Vec3::y(),
            layer,
            trigger: true,
            body,
        });
    }

    /// Axis-aligned box reported by [`PhysicsWorld::overlaps_sphere`].
    pub fn add_volume(&mut self, min: Vec3, max: Vec3, layer: Layer) {
        self.volumes.push(MockVolume { min, max, layer });
    }
}

impl PhysicsWorld for MockWorld {
    fn body(&self, id: BodyId) -> Option<BodyState> {
        self.bodies.get(&id).map(|b| b.state)
    }

    fn linear_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.bodies.get(&id).map(|b| b.linear_velocity)
    }

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.linear_velocity = velocity;
        }
    }

    fn angular_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.bodies.get(&id).map(|b| b.angular_velocity)
    }

    fn set_angular_velocity(&mut self, id: BodyId, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.angular_velocity = velocity;
        }
    }

    fn add_acceleration(&mut self, id: BodyId, acceleration: Vec3) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.accelerations.push((acceleration, None));
        }
    }

    fn add_acceleration_at_point(&mut self, id: BodyId, acceleration: Vec3, world_point: Vec3) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.accelerations.push((acceleration, Some(world_point)));
        }
    }

    fn raycast(&self, query: &RayQuery) -> Option<RayHit> {
        self.planes
            .iter()
            .filter(|p| query.mask.contains(p.layer))
            .filter(|p| !p.trigger || query.triggers == TriggerInteraction::Collide)
            .filter(|p| p.body.is_none() || p.body != query.exclude)
            .filter_map(|p| {
                let denom = query.direction.dot(&p.normal);
                if denom >= 0.0 {
                    return None;
                }
                let t = (p.point - query.origin).dot(&p.normal) / denom;
                (0.0..=query.max_distance).contains(&t).then_some(RayHit {
                    distance: t,
                    normal: p.normal,
                    layer: p.layer,
                    body: p.body,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlaps_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        self.volumes.iter().any(|v| {
            let closest = center.zip_zip_map(&v.min, &v.max, |c, lo, hi| c.clamp(lo, hi));
            mask.contains(v.layer) && (closest - center).norm_squared() <= radius * radius
        })
    }
}
