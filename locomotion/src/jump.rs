use log::{debug, trace};

use crate::types::{Vec3, try_normalize};

/// Jump speed needed to reach `height` against gravity of magnitude `gravity`.
#[inline]
pub fn jump_speed(gravity: f32, height: f32) -> f32 {
    (2.0 * gravity * height).max(0.0).sqrt()
}

/// Holds a jump request until it is performed or goes stale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JumpBuffer {
    /// Ticks the current request has waited.
    pending_for: Option<u32>,
    window: u32,
}

impl JumpBuffer {
    pub fn new(window: u32) -> Self {
        Self {
            pending_for: None,
            window,
        }
    }

    /// Record a fresh request; a repeated press restarts the window.
    pub fn request(&mut self) {
        self.pending_for = Some(0);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_for.is_some()
    }

    pub fn clear(&mut self) {
        self.pending_for = None;
    }

    /// Count one tick of waiting, dropping the request once `window` ticks have passed.
    pub fn advance(&mut self) {
        if let Some(age) = self.pending_for {
            let age = age + 1;
            if age >= self.window {
                trace!("buffered jump expired after {age} ticks");
                self.pending_for = None;
            } else {
                self.pending_for = Some(age);
            }
        }
    }
}

/// Surfaces and forces a jump can use this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpContext {
    pub grounded: bool,
    pub on_steep: bool,
    /// Ground (or climbed wall) normal; the up axis while airborne.
    pub contact_normal: Vec3,
    /// Aggregate normal of steep contacts; only meaningful when `on_steep`.
    pub steep_normal: Vec3,
    pub up_axis: Vec3,
    pub gravity: Vec3,
    pub submergence: f32,
    pub swim_threshold: f32,
}

/// Picks jump direction and height and keeps the air-jump budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpArbiter {
    pub jump_height: f32,
    pub max_air_jumps: u32,
    /// Jumps performed since the character was last supported.
    phase: u32,
}

impl JumpArbiter {
    pub fn new(jump_height: f32, max_air_jumps: u32) -> Self {
        Self {
            jump_height,
            max_air_jumps,
            phase: 0,
        }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Give back the full air-jump budget (landing).
    pub fn reset_phase(&mut self) {
        self.phase = 0;
    }

    /// Direction of the next jump, if one is possible. Steep jumps refill the budget and air
    /// jumps start consuming it.
    fn direction(&mut self, ctx: &JumpContext) -> Option<Vec3> {
        if ctx.grounded {
            Some(ctx.contact_normal)
        } else if ctx.on_steep {
            self.phase = 0;
            Some(ctx.steep_normal)
        } else if self.max_air_jumps > 0 && self.phase <= self.max_air_jumps {
            if self.phase == 0 {
                self.phase = 1;
            }
            Some(ctx.contact_normal)
        } else {
            None
        }
    }

    /// Try to jump, adding the jump impulse to `velocity`. Returns whether a jump happened.
    pub fn try_jump(&mut self, velocity: &mut Vec3, ctx: &JumpContext) -> bool {
        let Some(direction) = self.direction(ctx) else {
            trace!("jump refused: no surface and no air jumps left");
            return false;
        };
        self.phase += 1;

        let mut speed = jump_speed(ctx.gravity.norm(), self.jump_height);
        if ctx.submergence > 0.0 {
            speed *= (1.0 - ctx.submergence / ctx.swim_threshold).max(0.0);
        }

        let direction = try_normalize(direction + ctx.up_axis).unwrap_or(ctx.up_axis);
        let aligned = velocity.dot(&direction);
        if aligned > 0.0 {
            speed = (speed - aligned).max(0.0);
        }

        *velocity += direction * speed;
        debug!("jump {} along {:?} adding {:.3} m/s", self.phase, direction, speed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_ctx() -> JumpContext {
        JumpContext {
            grounded: true,
            on_steep: false,
            contact_normal: Vec3::y(),
            steep_normal: Vec3::zeros(),
            up_axis: Vec3::y(),
            gravity: Vec3::new(0.0, -9.81, 0.0),
            submergence: 0.0,
            swim_threshold: 0.5,
        }
    }

    fn airborne_ctx() -> JumpContext {
        JumpContext {
            grounded: false,
            ..grounded_ctx()
        }
    }

    #[test]
    fn jump_speed_reaches_configured_height() {
        assert!((jump_speed(9.81, 2.0) - 6.264).abs() < 1.0e-3);
    }

    #[test]
    fn ground_jump_from_rest() {
        let mut arbiter = JumpArbiter::new(2.0, 2);
        let mut v = Vec3::zeros();
        assert!(arbiter.try_jump(&mut v, &grounded_ctx()));
        assert!((v.y - 6.264).abs() < 1.0e-3);
        assert_eq!(arbiter.phase(), 1);
    }

    #[test]
    fn existing_upward_speed_cancels_the_jump() {
        let mut arbiter = JumpArbiter::new(2.0, 2);
        let mut v = Vec3::new(0.0, jump_speed(9.81, 2.0), 0.0);
        let before = v;
        assert!(arbiter.try_jump(&mut v, &grounded_ctx()));
        assert!((v - before).norm() < 1.0e-4);
    }

    #[test]
    fn air_jump_budget_is_exact() {
        let mut arbiter = JumpArbiter::new(2.0, 2);
        let ctx = airborne_ctx();
        let mut v = Vec3::zeros();

        assert!(arbiter.try_jump(&mut v, &ctx));
        v = Vec3::zeros();
        assert!(arbiter.try_jump(&mut v, &ctx));
        v = Vec3::zeros();
        assert!(!arbiter.try_jump(&mut v, &ctx));
        assert_eq!(v, Vec3::zeros());
    }

    #[test]
    fn no_air_jumps_when_budget_is_zero() {
        let mut arbiter = JumpArbiter::new(2.0, 0);
        let mut v = Vec3::zeros();
        assert!(!arbiter.try_jump(&mut v, &airborne_ctx()));
    }

    #[test]
    fn steep_wall_jump_refills_budget_and_pushes_away() {
        let mut arbiter = JumpArbiter::new(2.0, 1);
        let mut v = Vec3::zeros();
        let ctx = airborne_ctx();
        assert!(arbiter.try_jump(&mut v, &ctx));
        assert!(!arbiter.try_jump(&mut v, &ctx));

        let wall = JumpContext {
            on_steep: true,
            steep_normal: Vec3::x(),
            ..airborne_ctx()
        };
        let mut v = Vec3::zeros();
        assert!(arbiter.try_jump(&mut v, &wall));
        assert_eq!(arbiter.phase(), 1);
        assert!(v.x > 0.0 && v.y > 0.0);
        assert!((v.x - v.y).abs() < 1.0e-5);
    }

    #[test]
    fn submerged_jumps_are_weaker() {
        let mut arbiter = JumpArbiter::new(2.0, 2);
        let mut v = Vec3::zeros();
        let ctx = JumpContext {
            submergence: 0.25,
            ..grounded_ctx()
        };
        arbiter.try_jump(&mut v, &ctx);
        assert!((v.y - 0.5 * jump_speed(9.81, 2.0)).abs() < 1.0e-4);

        let mut v = Vec3::zeros();
        let deep = JumpContext {
            submergence: 0.8,
            ..grounded_ctx()
        };
        arbiter.try_jump(&mut v, &deep);
        assert_eq!(v, Vec3::zeros());
    }

    #[test]
    fn buffer_expires_after_window() {
        let mut buffer = JumpBuffer::new(3);
        buffer.request();
        buffer.advance();
        buffer.advance();
        assert!(buffer.is_pending());
        buffer.advance();
        assert!(!buffer.is_pending());
    }

    #[test]
    fn repeated_request_restarts_window() {
        let mut buffer = JumpBuffer::new(2);
        buffer.request();
        buffer.advance();
        buffer.request();
        buffer.advance();
        assert!(buffer.is_pending());
    }
}
