use std::fmt;

use log::debug;

/// Locomotion mode resolved once per tick.
///
/// Priority when several apply: Climbing, Swimming, Grounded, Airborne.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LocomotionMode {
    Grounded,
    #[default]
    Airborne,
    Swimming,
    Climbing,
}

impl LocomotionMode {
    /// Any mode in which something holds the character up.
    #[inline]
    pub fn is_supported(self) -> bool {
        !matches!(self, LocomotionMode::Airborne)
    }
}

impl fmt::Display for LocomotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocomotionMode::Grounded => "grounded",
            LocomotionMode::Airborne => "airborne",
            LocomotionMode::Swimming => "swimming",
            LocomotionMode::Climbing => "climbing",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: LocomotionMode,
    pub to: LocomotionMode,
}

impl ModeTransition {
    #[inline]
    pub fn entered(&self, mode: LocomotionMode) -> bool {
        self.to == mode
    }

    /// Airborne into any supported mode.
    #[inline]
    pub fn is_landing(&self) -> bool {
        self.from == LocomotionMode::Airborne && self.to.is_supported()
    }
}

/// Current mode plus change detection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeMachine {
    current: LocomotionMode,
}

impl ModeMachine {
    pub fn new(initial: LocomotionMode) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> LocomotionMode {
        self.current
    }

    /// Move to `next`, reporting the transition if the mode changed.
    pub fn update(&mut self, next: LocomotionMode) -> Option<ModeTransition> {
        if next == self.current {
            return None;
        }
        let transition = ModeTransition {
            from: self.current,
            to: next,
        };
        self.current = next;

        if transition.is_landing() {
            debug!("landed: {} -> {}", transition.from, transition.to);
        } else if transition.to == LocomotionMode::Airborne {
            debug!("left support: {} -> airborne", transition.from);
        } else {
            debug!("mode {} -> {}", transition.from, transition.to);
        }
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_mode_reports_nothing() {
        let mut m = ModeMachine::new(LocomotionMode::Grounded);
        assert_eq!(m.update(LocomotionMode::Grounded), None);
    }

    #[test]
    fn transitions_are_reported_once() {
        let mut m = ModeMachine::default();
        assert_eq!(m.current(), LocomotionMode::Airborne);

        let t = m.update(LocomotionMode::Swimming).unwrap();
        assert!(t.is_landing());
        assert!(t.entered(LocomotionMode::Swimming));
        assert_eq!(t.from, LocomotionMode::Airborne);
        assert_eq!(m.update(LocomotionMode::Swimming), None);

        let t = m.update(LocomotionMode::Airborne).unwrap();
        assert!(!t.is_landing());
    }

    #[test]
    fn only_airborne_is_unsupported() {
        assert!(LocomotionMode::Grounded.is_supported());
        assert!(LocomotionMode::Climbing.is_supported());
        assert!(LocomotionMode::Swimming.is_supported());
        assert!(!LocomotionMode::Airborne.is_supported());
    }
}
