/*!
Acceleration-limited steering on the active locomotion plane.

Intent is a 2D vector (x = right, y = forward) plus an optional dive scalar. Each axis of the
character velocity, measured relative to the connected body, moves toward `intent * speed` by at
most `acceleration * dt` per tick.
*/

use crate::{
    config::CharacterSettings,
    types::{Quat, Vec2, Vec3, lerp, move_towards, normalize_or_zero, project_on_plane},
};

/// Target speed and acceleration for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringProfile {
    pub speed: f32,
    pub acceleration: f32,
}

/// What the locomotion state looks like to the steering rules.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringContext {
    pub climbing: bool,
    pub grounded: bool,
    pub desires_climbing: bool,
    pub submergence: f32,
}

impl SteeringProfile {
    pub fn select(settings: &CharacterSettings, ctx: &SteeringContext) -> Self {
        if ctx.climbing {
            return Self {
                speed: settings.max_climb_speed,
                acceleration: settings.max_climb_acceleration,
            };
        }

        let base_acceleration = if ctx.grounded {
            settings.max_acceleration
        } else {
            settings.max_air_acceleration
        };

        if ctx.submergence > 0.0 {
            let swim = (ctx.submergence / settings.swim_threshold).min(1.0);
            return Self {
                speed: lerp(settings.max_speed, settings.max_swim_speed, swim),
                acceleration: lerp(base_acceleration, settings.max_swim_acceleration, swim),
            };
        }

        let speed = if ctx.grounded && ctx.desires_climbing {
            settings.max_climb_speed
        } else {
            settings.max_speed
        };
        Self {
            speed,
            acceleration: base_acceleration,
        }
    }
}

/// Unit directions intent is mapped onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringAxes {
    pub right: Vec3,
    pub forward: Vec3,
}

impl SteeringAxes {
    /// Right/forward of the input space (local +X/+Z, world X/Z without one), flattened onto
    /// the plane perpendicular to `up`.
    pub fn from_input_space(input_space: Option<Quat>, up: Vec3) -> Self {
        let (right, forward) = match input_space {
            Some(q) => (q * Vec3::x(), q * Vec3::z()),
            None => (Vec3::x(), Vec3::z()),
        };
        Self {
            right: project_on_plane(right, up),
            forward: project_on_plane(forward, up),
        }
    }

    /// These axes flattened onto the contact plane.
    pub fn on_plane(&self, contact_normal: Vec3) -> Self {
        Self {
            right: project_on_plane(self.right, contact_normal),
            forward: project_on_plane(self.forward, contact_normal),
        }
    }

    /// Wall-hugging axes: sideways along the wall and straight up in world space.
    pub fn climbing(contact_normal: Vec3) -> Self {
        Self {
            right: normalize_or_zero(contact_normal.cross(&Vec3::y())),
            forward: Vec3::y(),
        }
    }
}

/// Steer `velocity` along `axes` toward `intent * profile.speed`.
pub fn steer(
    velocity: &mut Vec3,
    connection_velocity: Vec3,
    axes: &SteeringAxes,
    intent: Vec2,
    profile: &SteeringProfile,
    dt: f32,
) {
    let relative = *velocity - connection_velocity;
    let max_change = profile.acceleration * dt;

    let current_x = relative.dot(&axes.right);
    let current_z = relative.dot(&axes.forward);
    let new_x = move_towards(current_x, intent.x * profile.speed, max_change);
    let new_z = move_towards(current_z, intent.y * profile.speed, max_change);

    *velocity += axes.right * (new_x - current_x) + axes.forward * (new_z - current_z);
}

/// Steer the vertical component along `up` toward `dive * profile.speed`. Used while swimming.
pub fn steer_dive(
    velocity: &mut Vec3,
    connection_velocity: Vec3,
    up: Vec3,
    dive: f32,
    profile: &SteeringProfile,
    dt: f32,
) {
    let current = (*velocity - connection_velocity).dot(&up);
    let new = move_towards(current, dive * profile.speed, profile.acceleration * dt);
    *velocity += up * (new - current);
}
