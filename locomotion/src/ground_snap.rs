use log::debug;

use crate::{
    constants::{JUMP_GUARD_TICKS, SNAP_GRACE_TICKS},
    contact::SurfaceThresholds,
    layers::LayerMask,
    physics::{BodyId, PhysicsWorld, RayQuery, TriggerInteraction},
    types::{Vec3, normalize_or_zero},
};

/// Ground recovered by a snap probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundSnap {
    pub normal: Vec3,
    pub body: Option<BodyId>,
}

/// Keeps a character glued to the ground when it crests a bump or leaves a ramp.
///
/// A snap is only attempted when:
/// - the character was grounded at most `SNAP_GRACE_TICKS` ticks ago,
/// - more than `JUMP_GUARD_TICKS` ticks have passed since the last jump,
/// - its speed does not exceed `max_snap_speed`.
///
/// Callers only try a snap when no ground contact was reported this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundSnapper {
    pub probe_distance: f32,
    pub max_snap_speed: f32,
    pub probe_mask: LayerMask,
}

impl GroundSnapper {
    pub fn new(probe_distance: f32, max_snap_speed: f32, probe_mask: LayerMask) -> Self {
        Self {
            probe_distance,
            max_snap_speed,
            probe_mask,
        }
    }

    /// Whether the tick counters allow a snap at all.
    #[inline]
    pub fn allowed(steps_since_grounded: u32, steps_since_jumped: u32) -> bool {
        steps_since_grounded <= SNAP_GRACE_TICKS && steps_since_jumped > JUMP_GUARD_TICKS
    }

    /// Probe below `position` and, on success, bend `velocity` onto the recovered surface.
    ///
    /// Speed is preserved when the velocity had to be re-projected.
    #[allow(clippy::too_many_arguments)]
    pub fn try_snap(
        &self,
        world: &impl PhysicsWorld,
        position: Vec3,
        up_axis: Vec3,
        velocity: &mut Vec3,
        steps_since_grounded: u32,
        steps_since_jumped: u32,
        thresholds: &SurfaceThresholds,
        exclude: Option<BodyId>,
    ) -> Option<GroundSnap> {
        if !Self::allowed(steps_since_grounded, steps_since_jumped) {
            return None;
        }

        let speed = velocity.norm();
        if speed > self.max_snap_speed {
            return None;
        }

        let mut query = RayQuery::new(position, -up_axis, self.probe_distance)
            .with_mask(self.probe_mask)
            .with_triggers(TriggerInteraction::Ignore);
        query.exclude = exclude;
        let hit = world.raycast(&query)?;

        if up_axis.dot(&hit.normal) < thresholds.min_dot(hit.layer) {
            return None;
        }

        let dot = velocity.dot(&hit.normal);
        if dot > 0.0 {
            *velocity = normalize_or_zero(*velocity - hit.normal * dot) * speed;
        }

        debug!("snapped to ground {:.3} m below (speed {:.2})", hit.distance, speed);
        Some(GroundSnap {
            normal: hit.normal,
            body: hit.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CharacterSettings, layers::Layer, testing::MockWorld};

    fn snapper() -> GroundSnapper {
        GroundSnapper::new(1.0, 11.0, LayerMask::all())
    }

    fn thresholds() -> SurfaceThresholds {
        CharacterSettings::default().thresholds()
    }

    fn floor_world() -> MockWorld {
        let mut world = MockWorld::new();
        world.add_floor(0.0, Layer::DEFAULT, Some(BodyId(7)));
        world
    }

    #[test]
    fn snaps_after_leaving_ground_and_keeps_speed() {
        let world = floor_world();
        let mut velocity = Vec3::new(4.0, 3.0, 0.0);
        let speed = velocity.norm();

        let snap = snapper()
            .try_snap(&world, Vec3::new(0.0, 0.6, 0.0), Vec3::y(), &mut velocity, 1, 10, &thresholds(), None)
            .unwrap();

        assert_eq!(snap.normal, Vec3::y());
        assert_eq!(snap.body, Some(BodyId(7)));
        assert!(velocity.y.abs() < 1.0e-6);
        assert!((velocity.norm() - speed).abs() < 1.0e-5);
    }

    #[test]
    fn downward_velocity_is_left_alone() {
        let world = floor_world();
        let mut velocity = Vec3::new(4.0, -3.0, 0.0);
        snapper()
            .try_snap(&world, Vec3::new(0.0, 0.6, 0.0), Vec3::y(), &mut velocity, 1, 10, &thresholds(), None)
            .unwrap();
        assert_eq!(velocity, Vec3::new(4.0, -3.0, 0.0));
    }

    #[test]
    fn never_snaps_right_after_a_jump() {
        let world = floor_world();
        for steps_since_jumped in 0..=JUMP_GUARD_TICKS {
            let mut velocity = Vec3::new(0.0, 1.0, 0.0);
            assert!(
                snapper()
                    .try_snap(
                        &world,
                        Vec3::new(0.0, 0.5, 0.0),
                        Vec3::y(),
                        &mut velocity,
                        0,
                        steps_since_jumped,
                        &thresholds(),
                        None
                    )
                    .is_none()
            );
        }
    }

    #[test]
    fn rejects_long_airtime_fast_motion_and_misses() {
        let world = floor_world();
        let t = thresholds();
        let pos = Vec3::new(0.0, 0.5, 0.0);

        let mut v = Vec3::zeros();
        assert!(snapper().try_snap(&world, pos, Vec3::y(), &mut v, 2, 10, &t, None).is_none());

        let mut v = Vec3::new(12.0, 0.0, 0.0);
        assert!(snapper().try_snap(&world, pos, Vec3::y(), &mut v, 1, 10, &t, None).is_none());

        let mut v = Vec3::zeros();
        let high = Vec3::new(0.0, 1.5, 0.0);
        assert!(snapper().try_snap(&world, high, Vec3::y(), &mut v, 1, 10, &t, None).is_none());
    }

    #[test]
    fn steep_probe_hits_are_not_ground() {
        let mut world = MockWorld::new();
        // Steeper than both the ground and the stair limits.
        let r = 50f32.to_radians();
        let slope = Vec3::new(r.sin(), r.cos(), 0.0);
        world.add_plane(Vec3::zeros(), slope, Layer::DEFAULT, None);

        let mut v = Vec3::zeros();
        assert!(
            snapper()
                .try_snap(&world, Vec3::new(0.0, 0.5, 0.0), Vec3::y(), &mut v, 1, 10, &thresholds(), None)
                .is_none()
        );
    }
}
