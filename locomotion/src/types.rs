/*!
Math aliases and small vector helpers shared by every locomotion module.

This module intentionally contains no locomotion rules. It defines the data types exchanged
between:
- gravity sources and the gravity field
- the physics seam (poses, ray hits, contacts)
- the per-tick character pipeline
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Squared length below which a vector is considered degenerate (no usable direction).
pub const DEGENERATE_SQ: f32 = 1.0e-12;

/// Normalize `v`, or return `None` when it has no usable direction.
#[inline]
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len_sq = v.norm_squared();
    if len_sq > DEGENERATE_SQ && len_sq.is_finite() {
        Some(v / len_sq.sqrt())
    } else {
        None
    }
}

/// Normalize `v`, collapsing degenerate input to the zero vector instead of NaN.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    try_normalize(v).unwrap_or_else(Vec3::zeros)
}

/// Project `direction` onto the plane with unit `normal` and normalize the result.
///
/// Returns zero when `direction` is parallel to `normal`.
#[inline]
pub fn project_on_plane(direction: Vec3, normal: Vec3) -> Vec3 {
    normalize_or_zero(direction - normal * direction.dot(&normal))
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Unclamped linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp a 2D vector to at most unit length.
#[inline]
pub fn clamp_unit(v: Vec2) -> Vec2 {
    let len_sq = v.norm_squared();
    if len_sq > 1.0 { v / len_sq.sqrt() } else { v }
}

/// Transform a world-space point into the local frame of `pose`.
#[inline]
pub fn to_local_point(pose: &Iso, world: Vec3) -> Vec3 {
    pose.inverse_transform_point(&na::Point3::from(world)).coords
}

/// Transform a local-space point of `pose` into world space.
#[inline]
pub fn to_world_point(pose: &Iso, local: Vec3) -> Vec3 {
    pose.transform_point(&na::Point3::from(local)).coords
}

/// Build an isometry from a translation and rotation.
#[inline]
pub fn iso_from_parts(translation: Vec3, rotation: Quat) -> Iso {
    Iso::from_parts(na::Translation3::from(translation), rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_or_zero_never_produces_nan() {
        let v = normalize_or_zero(Vec3::zeros());
        assert_eq!(v, Vec3::zeros());

        let n = normalize_or_zero(Vec3::new(0.0, 3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn move_towards_stops_at_target() {
        assert_eq!(move_towards(0.0, 1.0, 5.0), 1.0);
        assert!((move_towards(0.0, 1.0, 0.25) - 0.25).abs() < 1.0e-6);
        assert!((move_towards(1.0, -1.0, 0.5) - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn project_on_plane_removes_normal_component() {
        let p = project_on_plane(Vec3::new(1.0, 1.0, 0.0), Vec3::y());
        assert!((p - Vec3::x()).norm() < 1.0e-6);
        assert_eq!(project_on_plane(Vec3::y(), Vec3::y()), Vec3::zeros());
    }

    #[test]
    fn local_world_points_round_trip_through_rotation() {
        let pose = iso_from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
        );
        let world = Vec3::new(4.0, 2.0, 3.0);
        let local = to_local_point(&pose, world);
        assert!((to_world_point(&pose, local) - world).norm() < 1.0e-5);
    }

    #[test]
    fn clamp_unit_keeps_short_vectors() {
        assert_eq!(clamp_unit(Vec2::new(0.5, 0.0)), Vec2::new(0.5, 0.0));
        assert!((clamp_unit(Vec2::new(3.0, 4.0)).norm() - 1.0).abs() < 1.0e-6);
    }
}
