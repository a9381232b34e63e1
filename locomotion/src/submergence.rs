use crate::{
    constants::SUBMERGE_PROBE_SLACK,
    layers::LayerMask,
    physics::{BodyId, PhysicsWorld, RayQuery, TriggerInteraction},
    types::Vec3,
};

/// Outcome of one submergence probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaterProbe {
    /// The probe found the water surface; value is the clamped submergence.
    Surface(f32),
    /// Nothing hit. The probe cannot see a trigger volume from inside, so a miss during a water
    /// overlap usually means fully submerged.
    Miss,
}

/// Measures how deep a point sits below a water surface.
///
/// A ray starts `offset` above the point along the up axis and travels down for
/// `range + SUBMERGE_PROBE_SLACK`, hitting only water triggers. A surface hit at distance `d`
/// gives `1 - d / range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmergenceEvaluator {
    pub offset: f32,
    pub range: f32,
    pub water_mask: LayerMask,
}

impl SubmergenceEvaluator {
    pub fn new(offset: f32, range: f32, water_mask: LayerMask) -> Self {
        Self {
            offset,
            range,
            water_mask,
        }
    }

    pub fn probe(
        &self,
        world: &impl PhysicsWorld,
        point: Vec3,
        up_axis: Vec3,
        exclude: Option<BodyId>,
    ) -> WaterProbe {
        let mut query = RayQuery::new(
            point + up_axis * self.offset,
            -up_axis,
            self.range + SUBMERGE_PROBE_SLACK,
        )
        .with_mask(self.water_mask)
        .with_triggers(TriggerInteraction::Collide);
        query.exclude = exclude;

        match world.raycast(&query) {
            Some(hit) => WaterProbe::Surface(self.depth_fraction(hit.distance)),
            None => WaterProbe::Miss,
        }
    }

    /// Submergence of a point known to overlap a water volume: a miss counts as fully under.
    pub fn evaluate(
        &self,
        world: &impl PhysicsWorld,
        point: Vec3,
        up_axis: Vec3,
        exclude: Option<BodyId>,
    ) -> f32 {
        match self.probe(world, point, up_axis, exclude) {
            WaterProbe::Surface(s) => s,
            WaterProbe::Miss => 1.0,
        }
    }

    #[inline]
    fn depth_fraction(&self, distance: f32) -> f32 {
        if self.range <= 0.0 {
            return 1.0;
        }
        (1.0 - distance / self.range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layers::Layer, testing::MockWorld};

    const WATER: Layer = Layer::new(4);

    fn evaluator() -> SubmergenceEvaluator {
        SubmergenceEvaluator::new(0.5, 1.0, LayerMask::from_layers(&[WATER]))
    }

    #[test]
    fn surface_hit_maps_distance_to_fraction() {
        let mut world = MockWorld::new();
        world.add_water_surface(1.0, WATER, None);

        // Ray starts at y = 0.5 + 0.5 = 1.0 and hits the surface immediately.
        let s = evaluator().evaluate(&world, Vec3::new(0.0, 0.5, 0.0), Vec3::y(), None);
        assert!((s - 1.0).abs() < 1.0e-6);

        // Ray starts at y = 1.25, surface 0.25 below.
        let s = evaluator().evaluate(&world, Vec3::new(0.0, 0.75, 0.0), Vec3::y(), None);
        assert!((s - 0.75).abs() < 1.0e-6);
    }

    #[test]
    fn result_is_clamped_to_unit_range() {
        let mut world = MockWorld::new();
        world.add_water_surface(0.0, WATER, None);

        // Surface 1.7 below the ray origin: raw value would be -0.7.
        let s = evaluator().evaluate(&world, Vec3::new(0.0, 1.2, 0.0), Vec3::y(), None);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn miss_inside_water_is_fully_submerged() {
        let world = MockWorld::new();
        assert_eq!(
            evaluator().probe(&world, Vec3::zeros(), Vec3::y(), None),
            WaterProbe::Miss
        );
        assert_eq!(evaluator().evaluate(&world, Vec3::zeros(), Vec3::y(), None), 1.0);
    }

    #[test]
    fn surfaces_outside_the_mask_are_ignored() {
        let mut world = MockWorld::new();
        world.add_water_surface(1.0, Layer::new(9), None);
        assert_eq!(
            evaluator().probe(&world, Vec3::new(0.0, 0.75, 0.0), Vec3::y(), None),
            WaterProbe::Miss
        );
    }
}
