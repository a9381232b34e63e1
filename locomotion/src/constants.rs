/// Upward dot product below which a non-ground contact is a ceiling rather than a steep wall.
///
/// Slightly negative so walls that lean a hair past vertical still count as steep.
pub const STEEP_CUTOFF_DOT: f32 = -0.01;

/// Fraction of the climb acceleration spent pressing the character into the wall it climbs.
///
/// Also used for the counter-force applied while grounded and wanting to climb.
pub const GRIP_FORCE_REDUCTION: f32 = 0.9;

/// Squared speed (m²/s²) under which a grounded character stops sliding down slopes.
pub const ANTI_SLIDE_SPEED_SQ: f32 = 0.1;

/// Ticks after a jump during which the character can neither snap to the ground nor climb.
///
/// Convention: a counter value `<= JUMP_GUARD_TICKS` blocks both.
pub const JUMP_GUARD_TICKS: u32 = 2;

/// Ticks after leaving the ground during which a snap probe may still recover the ground.
pub const SNAP_GRACE_TICKS: u32 = 1;

/// Ticks after a jump before a landing may reset the air-jump counter.
pub const JUMP_PHASE_RESET_TICKS: u32 = 1;

/// Default number of ticks a jump request stays buffered.
///
/// At the default 50 Hz physics rate this is one second.
pub const DEFAULT_JUMP_BUFFER_TICKS: u32 = 50;

/// Extra distance (meters) added to the submergence probe so leaving water is still detected
/// after the engine moved the body out of the volume.
pub const SUBMERGE_PROBE_SLACK: f32 = 1.0;

/// Speed (m/s) under which a gravity body counts as resting.
pub const REST_SPEED: f32 = 0.0001;

/// Seconds a gravity body has to rest before it stops receiving gravity.
pub const FLOAT_TO_SLEEP_DELAY: f32 = 1.0;

/// Radius (meters) of the volume check used by safe floating.
pub const SAFE_FLOATING_PROBE_RADIUS: f32 = 0.01;
