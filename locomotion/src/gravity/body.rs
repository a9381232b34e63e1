use log::debug;
use serde::{Deserialize, Serialize};

use super::GravityField;
use crate::{
    constants::{FLOAT_TO_SLEEP_DELAY, REST_SPEED, SAFE_FLOATING_PROBE_RADIUS},
    layers::LayerMask,
    physics::{BodyId, PhysicsWorld},
    submergence::{SubmergenceEvaluator, WaterProbe},
    types::{Vec3, to_world_point},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityBodySettings {
    /// Stop applying gravity once the body has rested for a second.
    pub float_to_sleep: bool,
    /// Local-space points where buoyancy is applied. Empty means the body origin.
    pub buoyancy_offsets: Vec<[f32; 3]>,
    pub buoyancy: f32,
    /// Only treat a probe miss as submerged when the point is actually inside water.
    pub safe_floating: bool,
    pub submerge_offset: f32,
    pub submerge_range: f32,
    pub water_drag: f32,
    pub water_mask: LayerMask,
}

impl Default for GravityBodySettings {
    fn default() -> Self {
        Self {
            float_to_sleep: true,
            buoyancy_offsets: vec![[0.0; 3]],
            buoyancy: 1.0,
            safe_floating: false,
            submerge_offset: 0.5,
            submerge_range: 1.0,
            water_drag: 1.0,
            water_mask: LayerMask::none(),
        }
    }
}

impl GravityBodySettings {
    fn sanitized(mut self) -> Self {
        if self.buoyancy_offsets.is_empty() {
            self.buoyancy_offsets.push([0.0; 3]);
        }
        self.buoyancy = self.buoyancy.max(0.0);
        self.submerge_range = self.submerge_range.max(0.1);
        self.water_drag = self.water_drag.clamp(0.0, 10.0);
        self
    }
}

/// Ordinary rigid body driven by the gravity field instead of engine gravity.
///
/// Supports several buoyancy points so long objects settle level on water.
#[derive(Clone, Debug)]
pub struct GravityBody {
    id: BodyId,
    settings: GravityBodySettings,
    probe: SubmergenceEvaluator,
    /// Per buoyancy point, consumed by the next gravity application.
    submergence: Vec<f32>,
    sleep_delay: f32,
    resting: bool,
}

impl GravityBody {
    pub fn new(id: BodyId, settings: GravityBodySettings) -> Self {
        let settings = settings.sanitized();
        let probe = SubmergenceEvaluator::new(
            settings.submerge_offset,
            settings.submerge_range,
            settings.water_mask,
        );
        Self {
            id,
            submergence: vec![0.0; settings.buoyancy_offsets.len()],
            settings,
            probe,
            sleep_delay: 0.0,
            resting: false,
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn settings(&self) -> &GravityBodySettings {
        &self.settings
    }

    /// Pending submergence of each buoyancy point.
    pub fn submergence(&self) -> &[f32] {
        &self.submergence
    }

    /// Advance one tick.
    ///
    /// `in_water` reports whether the body overlaps a water trigger this tick. Returns whether
    /// gravity was applied.
    pub fn tick(
        &mut self,
        world: &mut impl PhysicsWorld,
        field: &GravityField,
        in_water: bool,
        dt: f32,
    ) -> bool {
        let Some(state) = world.body(self.id) else {
            return false;
        };

        if in_water && !state.sleeping {
            self.evaluate_submergence(world, field);
        }

        if self.settings.float_to_sleep {
            if state.sleeping {
                self.sleep_delay = 0.0;
                return false;
            }

            let speed = world.linear_velocity(self.id).map_or(0.0, |v| v.norm());
            if speed < REST_SPEED {
                self.sleep_delay += dt;
                if self.sleep_delay >= FLOAT_TO_SLEEP_DELAY {
                    if !self.resting {
                        debug!("gravity body {:?} came to rest", self.id);
                        self.resting = true;
                    }
                    return false;
                }
            } else {
                self.sleep_delay = 0.0;
                self.resting = false;
            }
        }

        self.apply_gravity(world, field, dt);
        true
    }

    fn evaluate_submergence(&mut self, world: &impl PhysicsWorld, field: &GravityField) {
        let Some(state) = world.body(self.id) else {
            return;
        };
        let Some(up) = field.up_axis(state.position()) else {
            return;
        };

        for (offset, submergence) in self
            .settings
            .buoyancy_offsets
            .iter()
            .zip(self.submergence.iter_mut())
        {
            let point = to_world_point(&state.pose, Vec3::from(*offset));
            match self.probe.probe(world, point, up, Some(self.id)) {
                WaterProbe::Surface(s) => *submergence = s,
                WaterProbe::Miss => {
                    let ray_origin = point + up * self.settings.submerge_offset;
                    if !self.settings.safe_floating
                        || world.overlaps_sphere(
                            ray_origin,
                            SAFE_FLOATING_PROBE_RADIUS,
                            self.settings.water_mask,
                        )
                    {
                        *submergence = 1.0;
                    }
                }
            }
        }
    }

    fn apply_gravity(&mut self, world: &mut impl PhysicsWorld, field: &GravityField, dt: f32) {
        let Some(state) = world.body(self.id) else {
            return;
        };
        let gravity = field.sample(state.position());

        let n = self.settings.buoyancy_offsets.len() as f32;
        let drag_factor = self.settings.water_drag * dt / n;
        let buoyancy_factor = -self.settings.buoyancy / n;

        let mut damping = 1.0;
        for (offset, submergence) in self
            .settings
            .buoyancy_offsets
            .iter()
            .zip(self.submergence.iter_mut())
        {
            if *submergence <= 0.0 {
                continue;
            }
            damping *= (1.0 - drag_factor * *submergence).max(0.0);
            let point = to_world_point(&state.pose, Vec3::from(*offset));
            world.add_acceleration_at_point(self.id, gravity * (buoyancy_factor * *submergence), point);
            *submergence = 0.0;
        }

        if damping < 1.0 {
            if let Some(v) = world.linear_velocity(self.id) {
                world.set_linear_velocity(self.id, v * damping);
            }
            if let Some(w) = world.angular_velocity(self.id) {
                world.set_angular_velocity(self.id, w * damping);
            }
        }

        world.add_acceleration(self.id, gravity);
    }
}
