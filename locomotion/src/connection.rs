use log::debug;

use crate::{
    physics::{BodyId, PhysicsWorld},
    types::{Vec3, to_local_point, to_world_point},
};

/// Follows the platform (or water body) a character stands on and derives its velocity.
///
/// The attachment point is stored in both world space and the platform's local space, so
/// rotation of the platform carries the character along an arc rather than a straight line.
#[derive(Clone, Debug, Default)]
pub struct ConnectedBodyTracker {
    connected: Option<BodyId>,
    previous: Option<BodyId>,
    world_point: Vec3,
    local_point: Vec3,
    velocity: Vec3,
}

impl ConnectedBodyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body connected this tick, if any.
    pub fn connected(&self) -> Option<BodyId> {
        self.connected
    }

    /// Body connected during the previous tick.
    pub fn previous(&self) -> Option<BodyId> {
        self.previous
    }

    /// Velocity inherited from the connected body this tick.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Connect to `candidate` and compute the connection velocity.
    ///
    /// Dynamic bodies lighter than the character are ignored. Velocity stays zero on the first
    /// tick of a new connection.
    pub fn update(
        &mut self,
        world: &impl PhysicsWorld,
        candidate: Option<BodyId>,
        position: Vec3,
        own_mass: f32,
        dt: f32,
    ) -> Vec3 {
        let Some(id) = candidate else {
            return self.velocity;
        };
        let Some(body) = world.body(id) else {
            return self.velocity;
        };
        if !body.kinematic && body.mass < own_mass {
            return self.velocity;
        }

        self.connected = Some(id);
        if self.previous == Some(id) {
            if dt > 0.0 {
                let moved = to_world_point(&body.pose, self.local_point) - self.world_point;
                self.velocity = moved / dt;
            }
        } else {
            debug!("connected to body {:?}", id);
        }

        self.world_point = position;
        self.local_point = to_local_point(&body.pose, position);
        self.velocity
    }

    /// Roll this tick's connection into history and reset the velocity.
    pub fn end_tick(&mut self) {
        if self.previous.is_some() && self.connected.is_none() {
            debug!("disconnected from body {:?}", self.previous);
        }
        self.previous = self.connected.take();
        self.velocity = Vec3::zeros();
    }
}
