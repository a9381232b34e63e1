//! Gravity emitters.
//!
//! Every variant is a pure function of its (clamped) parameters: `contribution(point)` never
//! mutates anything. Falloff coefficients are derived once whenever parameters are (re)assigned,
//! so runtime evaluation never divides by zero or sees a negative span.

use serde::{Deserialize, Serialize};

use crate::types::{DEGENERATE_SQ, Iso, Quat, Vec3};

/// Earth-like default strength (m/s^2).
pub const DEFAULT_STRENGTH: f32 = 9.81;

/// Polymorphic gravity emitter.
#[derive(Clone, Debug, PartialEq)]
pub enum GravitySource {
    Uniform(UniformGravity),
    Sphere(SphereGravity),
    Cube(CubeGravity),
    Plane(PlaneGravity),
}

impl GravitySource {
    /// Gravity acceleration this source contributes at `point` (world space).
    #[inline]
    pub fn contribution(&self, point: Vec3) -> Vec3 {
        match self {
            GravitySource::Uniform(s) => s.contribution(point),
            GravitySource::Sphere(s) => s.contribution(point),
            GravitySource::Cube(s) => s.contribution(point),
            GravitySource::Plane(s) => s.contribution(point),
        }
    }
}

impl From<UniformGravity> for GravitySource {
    fn from(s: UniformGravity) -> Self {
        GravitySource::Uniform(s)
    }
}

impl From<SphereGravity> for GravitySource {
    fn from(s: SphereGravity) -> Self {
        GravitySource::Sphere(s)
    }
}

impl From<CubeGravity> for GravitySource {
    fn from(s: CubeGravity) -> Self {
        GravitySource::Cube(s)
    }
}

impl From<PlaneGravity> for GravitySource {
    fn from(s: PlaneGravity) -> Self {
        GravitySource::Plane(s)
    }
}

/// `1 / span`, or zero when the span is empty (the ramp region it serves is then empty too).
#[inline]
fn falloff_factor(span: f32) -> f32 {
    if span > 0.0 { 1.0 / span } else { 0.0 }
}

/// Constant gravity everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformGravity {
    pub vector: Vec3,
}

impl UniformGravity {
    pub fn new(vector: Vec3) -> Self {
        Self { vector }
    }

    /// Standard downward (-Y) gravity.
    pub fn earth() -> Self {
        Self::new(Vec3::new(0.0, -DEFAULT_STRENGTH, 0.0))
    }

    #[inline]
    pub fn contribution(&self, _point: Vec3) -> Vec3 {
        self.vector
    }
}

/// Shape parameters of a spherical source.
///
/// Radii are ordered `inner_falloff_radius <= inner_radius <= outer_radius <= outer_falloff_radius`
/// after clamping. Gravity is constant between the inner and outer radius, ramps linearly to zero
/// toward both falloff radii and is zero outside them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereParams {
    pub center: [f32; 3],
    pub strength: f32,
    pub inner_falloff_radius: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub outer_falloff_radius: f32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            strength: DEFAULT_STRENGTH,
            inner_falloff_radius: 1.0,
            inner_radius: 5.0,
            outer_radius: 10.0,
            outer_falloff_radius: 15.0,
        }
    }
}

impl SphereParams {
    fn clamped(mut self) -> Self {
        self.inner_falloff_radius = self.inner_falloff_radius.max(0.0);
        self.inner_radius = self.inner_radius.max(self.inner_falloff_radius);
        self.outer_radius = self.outer_radius.max(self.inner_radius);
        self.outer_falloff_radius = self.outer_falloff_radius.max(self.outer_radius);
        self
    }
}

/// Spherical source pulling toward its center (planets, hollow worlds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereGravity {
    params: SphereParams,
    center: Vec3,
    inner_falloff_factor: f32,
    outer_falloff_factor: f32,
}

impl SphereGravity {
    pub fn new(params: SphereParams) -> Self {
        let params = params.clamped();
        Self {
            params,
            center: Vec3::from(params.center),
            inner_falloff_factor: falloff_factor(params.inner_radius - params.inner_falloff_radius),
            outer_falloff_factor: falloff_factor(params.outer_falloff_radius - params.outer_radius),
        }
    }

    /// The clamped parameters in effect.
    pub fn params(&self) -> &SphereParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SphereParams) {
        *self = Self::new(params);
    }

    /// At the exact center the direction is undefined; the contribution is zero there.
    pub fn contribution(&self, point: Vec3) -> Vec3 {
        let up = self.center - point;
        let distance_sq = up.norm_squared();
        if distance_sq <= DEGENERATE_SQ {
            return Vec3::zeros();
        }

        let distance = distance_sq.sqrt();
        let p = &self.params;
        if distance > p.outer_falloff_radius || distance < p.inner_falloff_radius {
            return Vec3::zeros();
        }

        let mut g = p.strength / distance;
        if distance > p.outer_radius {
            g *= 1.0 - (distance - p.outer_radius) * self.outer_falloff_factor;
        } else if distance < p.inner_radius {
            g *= 1.0 - (p.inner_radius - distance) * self.inner_falloff_factor;
        }

        up * g
    }
}

/// Shape parameters of a box source.
///
/// Inside the box, gravity pulls toward the nearest face with full strength up to
/// `inner_distance` from it, ramping to zero at `inner_falloff_distance`. Outside the box the
/// overshoot past the faces is treated as a radial offset with the sphere law over
/// `outer_distance`/`outer_falloff_distance`, which rounds gravity across edges and corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeParams {
    pub center: [f32; 3],
    /// Rotation as a scaled axis (radians along the axis direction).
    pub rotation: [f32; 3],
    pub strength: f32,
    pub half_extents: [f32; 3],
    pub inner_distance: f32,
    pub inner_falloff_distance: f32,
    pub outer_distance: f32,
    pub outer_falloff_distance: f32,
}

impl Default for CubeParams {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            rotation: [0.0; 3],
            strength: DEFAULT_STRENGTH,
            half_extents: [1.0; 3],
            inner_distance: 0.0,
            inner_falloff_distance: 0.0,
            outer_distance: 0.0,
            outer_falloff_distance: 0.0,
        }
    }
}

impl CubeParams {
    fn clamped(mut self) -> Self {
        for e in self.half_extents.iter_mut() {
            *e = e.max(0.0);
        }

        // Inner distances can never exceed the smallest half extent.
        let max_inner = self.half_extents[0]
            .min(self.half_extents[1])
            .min(self.half_extents[2]);

        self.inner_distance = self.inner_distance.max(0.0).min(max_inner);
        self.inner_falloff_distance = self
            .inner_falloff_distance
            .min(max_inner)
            .max(self.inner_distance);
        self.outer_distance = self.outer_distance.max(0.0);
        self.outer_falloff_distance = self.outer_falloff_distance.max(self.outer_distance);
        self
    }
}

/// Box source pulling toward its walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeGravity {
    params: CubeParams,
    pose: Iso,
    half_extents: Vec3,
    inner_falloff_factor: f32,
    outer_falloff_factor: f32,
}

impl CubeGravity {
    pub fn new(params: CubeParams) -> Self {
        let params = params.clamped();
        let rotation = Quat::from_scaled_axis(Vec3::from(params.rotation));
        Self {
            params,
            pose: crate::types::iso_from_parts(Vec3::from(params.center), rotation),
            half_extents: Vec3::from(params.half_extents),
            inner_falloff_factor: falloff_factor(
                params.inner_falloff_distance - params.inner_distance,
            ),
            outer_falloff_factor: falloff_factor(
                params.outer_falloff_distance - params.outer_distance,
            ),
        }
    }

    pub fn params(&self) -> &CubeParams {
        &self.params
    }

    pub fn set_params(&mut self, params: CubeParams) {
        *self = Self::new(params);
    }

    pub fn contribution(&self, point: Vec3) -> Vec3 {
        let local = self.pose.rotation.inverse_transform_vector(&(point - self.pose.translation.vector));

        let (overshoot, outside_axes) = self.outside_overshoot(local);
        if outside_axes > 0 {
            let distance = overshoot.norm();
            if distance > self.params.outer_falloff_distance {
                return Vec3::zeros();
            }

            let mut g = self.params.strength / distance;
            if distance > self.params.outer_distance {
                g *= 1.0 - (distance - self.params.outer_distance) * self.outer_falloff_factor;
            }
            return self.pose.rotation * (overshoot * g);
        }

        let margins = Vec3::new(
            self.half_extents.x - local.x.abs(),
            self.half_extents.y - local.y.abs(),
            self.half_extents.z - local.z.abs(),
        );

        let axis = nearest_face_axis(margins);
        let mut vector = Vec3::zeros();
        vector[axis] = self.face_component(local[axis], margins[axis]);
        self.pose.rotation * vector
    }

    /// Per-axis offset from `local` back onto the box surface, and how many axes overshoot.
    fn outside_overshoot(&self, local: Vec3) -> (Vec3, usize) {
        let mut vector = Vec3::zeros();
        let mut count = 0;
        for i in 0..3 {
            let h = self.half_extents[i];
            if local[i] > h {
                vector[i] = h - local[i];
                count += 1;
            } else if local[i] < -h {
                vector[i] = -h - local[i];
                count += 1;
            }
        }
        (vector, count)
    }

    fn face_component(&self, coordinate: f32, margin: f32) -> f32 {
        if margin > self.params.inner_falloff_distance {
            return 0.0;
        }

        let mut g = self.params.strength;
        if margin > self.params.inner_distance {
            g *= 1.0 - (margin - self.params.inner_distance) * self.inner_falloff_factor;
        }

        if coordinate < 0.0 { -g } else { g }
    }
}

/// Index of the axis with the smallest margin; on ties the earlier axis wins (X, then Y, then Z).
#[inline]
pub fn nearest_face_axis(margins: Vec3) -> usize {
    if margins.x <= margins.y && margins.x <= margins.z {
        0
    } else if margins.y <= margins.z {
        1
    } else {
        2
    }
}

/// Shape parameters of a plane source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneParams {
    pub origin: [f32; 3],
    /// Rotation as a scaled axis; the plane's up axis is `rotation * +Y`.
    pub rotation: [f32; 3],
    pub strength: f32,
    pub range: f32,
}

impl Default for PlaneParams {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            rotation: [0.0; 3],
            strength: DEFAULT_STRENGTH,
            range: 1.0,
        }
    }
}

/// Half-space source: full strength below the plane, ramping to zero `range` above it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneGravity {
    params: PlaneParams,
    origin: Vec3,
    up: Vec3,
}

impl PlaneGravity {
    pub fn new(mut params: PlaneParams) -> Self {
        params.range = params.range.max(0.0);
        let rotation = Quat::from_scaled_axis(Vec3::from(params.rotation));
        Self {
            params,
            origin: Vec3::from(params.origin),
            up: rotation * Vec3::y(),
        }
    }

    pub fn params(&self) -> &PlaneParams {
        &self.params
    }

    pub fn set_params(&mut self, params: PlaneParams) {
        *self = Self::new(params);
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn contribution(&self, point: Vec3) -> Vec3 {
        let distance = self.up.dot(&(point - self.origin));
        if distance > self.params.range {
            return Vec3::zeros();
        }

        let mut g = self.params.strength;
        if distance > 0.0 {
            g *= 1.0 - distance / self.params.range;
        }

        -self.up * g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sphere() -> SphereGravity {
        SphereGravity::new(SphereParams {
            center: [0.0; 3],
            strength: 10.0,
            inner_falloff_radius: 0.0,
            inner_radius: 0.0,
            outer_radius: 5.0,
            outer_falloff_radius: 10.0,
        })
    }

    #[test]
    fn sphere_magnitude_follows_plateau_and_outer_ramp() {
        let s = test_sphere();

        let at = |d: f32| s.contribution(Vec3::new(d, 0.0, 0.0)).norm();
        assert!((at(3.0) - 10.0).abs() < 1.0e-4);
        assert!((at(7.5) - 5.0).abs() < 1.0e-4);
        assert!(at(10.0).abs() < 1.0e-4);
        assert_eq!(at(12.0), 0.0);
    }

    #[test]
    fn sphere_always_points_toward_center() {
        let s = test_sphere();
        for p in [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, -4.0, 1.0),
            Vec3::new(2.0, 5.0, -3.0),
        ] {
            let g = s.contribution(p);
            let toward = -p.normalize();
            assert!(g.normalize().dot(&toward) > 0.9999, "g = {g:?} at {p:?}");
        }
    }

    #[test]
    fn sphere_center_is_guarded() {
        let s = test_sphere();
        assert_eq!(s.contribution(Vec3::zeros()), Vec3::zeros());
    }

    #[test]
    fn sphere_hollow_core_ramps_up_from_inner_falloff() {
        let s = SphereGravity::new(SphereParams {
            center: [0.0; 3],
            strength: 10.0,
            inner_falloff_radius: 1.0,
            inner_radius: 3.0,
            outer_radius: 5.0,
            outer_falloff_radius: 10.0,
        });

        let at = |d: f32| s.contribution(Vec3::new(0.0, d, 0.0)).norm();
        assert_eq!(at(0.5), 0.0);
        assert!((at(2.0) - 5.0).abs() < 1.0e-4);
        assert!((at(4.0) - 10.0).abs() < 1.0e-4);
    }

    #[test]
    fn sphere_params_are_clamped_into_order() {
        let s = SphereGravity::new(SphereParams {
            center: [0.0; 3],
            strength: 1.0,
            inner_falloff_radius: -2.0,
            inner_radius: 4.0,
            outer_radius: 2.0,
            outer_falloff_radius: 1.0,
        });

        let p = s.params();
        assert_eq!(p.inner_falloff_radius, 0.0);
        assert_eq!(p.outer_radius, 4.0);
        assert_eq!(p.outer_falloff_radius, 4.0);

        // Zero-width outer span must not produce NaN right at the boundary.
        let g = s.contribution(Vec3::new(4.0, 0.0, 0.0));
        assert!(g.iter().all(|c| c.is_finite()));
    }

    fn test_cube() -> CubeGravity {
        CubeGravity::new(CubeParams {
            center: [0.0; 3],
            rotation: [0.0; 3],
            strength: 10.0,
            half_extents: [5.0, 5.0, 5.0],
            inner_distance: 1.0,
            inner_falloff_distance: 5.0,
            outer_distance: 1.0,
            outer_falloff_distance: 3.0,
        })
    }

    #[test]
    fn cube_center_tie_breaks_to_first_axis() {
        let c = CubeGravity::new(CubeParams {
            inner_distance: 5.0,
            ..test_cube().params
        });
        let g = c.contribution(Vec3::zeros());

        // All margins equal: X wins, and a zero coordinate counts as positive.
        assert!((g.x - 10.0).abs() < 1.0e-5);
        assert_eq!(g.y, 0.0);
        assert_eq!(g.z, 0.0);
        assert_eq!(nearest_face_axis(Vec3::new(2.0, 2.0, 2.0)), 0);
        assert_eq!(nearest_face_axis(Vec3::new(3.0, 2.0, 2.0)), 1);
    }

    #[test]
    fn cube_inside_pulls_toward_nearest_face() {
        let c = test_cube();

        // 0.5 from the -Y face: full strength, downward.
        let g = c.contribution(Vec3::new(0.5, -4.5, 1.0));
        assert!((g - Vec3::new(0.0, -10.0, 0.0)).norm() < 1.0e-4);

        // 3.0 from the +Z face: halfway through the inner ramp.
        let g = c.contribution(Vec3::new(0.0, 0.0, 2.0));
        assert!((g - Vec3::new(0.0, 0.0, 5.0)).norm() < 1.0e-4);
    }

    #[test]
    fn cube_outside_uses_radial_law_across_edges() {
        let c = test_cube();

        // Straight above the top face, within the plateau.
        let g = c.contribution(Vec3::new(0.0, 5.5, 0.0));
        assert!((g - Vec3::new(0.0, -10.0, 0.0)).norm() < 1.0e-4);

        // Past an edge: pulled diagonally back toward the edge.
        let g = c.contribution(Vec3::new(5.5, 5.5, 0.0));
        assert!(g.x < 0.0 && g.y < 0.0);
        assert!((g.x - g.y).abs() < 1.0e-5);
        assert!((g.norm() - 10.0).abs() < 1.0e-3);

        // Beyond the outer falloff.
        assert_eq!(c.contribution(Vec3::new(0.0, 9.0, 0.0)), Vec3::zeros());
    }

    #[test]
    fn cube_respects_rotation() {
        let c = CubeGravity::new(CubeParams {
            rotation: [0.0, 0.0, std::f32::consts::FRAC_PI_2],
            outer_distance: 2.0,
            outer_falloff_distance: 4.0,
            ..test_cube().params
        });

        // Rotated 90° about Z: the local +Y face now faces world -X.
        let g = c.contribution(Vec3::new(-6.0, 0.0, 0.0));
        assert!(g.x > 9.99);
        assert!(g.y.abs() < 1.0e-4);
    }

    #[test]
    fn cube_inner_distances_are_clamped_to_smallest_extent() {
        let c = CubeGravity::new(CubeParams {
            half_extents: [2.0, -1.0, 3.0],
            inner_distance: 5.0,
            inner_falloff_distance: 1.0,
            ..Default::default()
        });
        let p = c.params();
        assert_eq!(p.half_extents, [2.0, 0.0, 3.0]);
        assert_eq!(p.inner_distance, 0.0);
        assert_eq!(p.inner_falloff_distance, 0.0);
    }

    #[test]
    fn plane_ramps_to_zero_at_range() {
        let plane = PlaneGravity::new(PlaneParams {
            origin: [0.0; 3],
            rotation: [0.0; 3],
            strength: 10.0,
            range: 4.0,
        });

        assert_eq!(plane.contribution(Vec3::new(0.0, -3.0, 0.0)), Vec3::new(0.0, -10.0, 0.0));
        assert!((plane.contribution(Vec3::new(0.0, 1.0, 0.0)).y + 7.5).abs() < 1.0e-5);
        assert!(plane.contribution(Vec3::new(0.0, 4.0, 0.0)).norm() < 1.0e-5);
        assert_eq!(plane.contribution(Vec3::new(0.0, 4.5, 0.0)), Vec3::zeros());
    }

    #[test]
    fn uniform_returns_its_vector_everywhere() {
        let u = UniformGravity::new(Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(u.contribution(Vec3::new(100.0, 5.0, -7.0)), Vec3::new(1.0, -2.0, 3.0));
    }
}
