//! Character tuning.
//!
//! Settings are plain data, loadable from RON, and always pass through
//! [`CharacterSettings::sanitized`] before a character uses them.

use std::{fs, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    constants::DEFAULT_JUMP_BUFFER_TICKS, contact::SurfaceThresholds, error::ConfigError,
    layers::LayerMask,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSettings {
    pub max_speed: f32,
    pub max_climb_speed: f32,
    pub max_snap_speed: f32,
    pub max_swim_speed: f32,

    pub max_acceleration: f32,
    pub max_climb_acceleration: f32,
    pub max_air_acceleration: f32,
    pub max_swim_acceleration: f32,

    /// Degrees.
    pub max_ground_angle: f32,
    /// Degrees. Applies to surfaces on a stairs layer.
    pub max_stair_angle: f32,
    /// Degrees, measured from up; values past 90 allow overhangs.
    pub max_climb_angle: f32,

    pub water_drag: f32,
    pub buoyancy: f32,
    /// Submergence at which the character switches to swimming.
    pub swim_threshold: f32,

    /// Meters reached by a jump from rest.
    pub jump_height: f32,
    pub max_air_jumps: u32,
    pub jump_buffer_ticks: u32,

    pub probe_distance: f32,
    pub submerge_offset: f32,
    pub submerge_range: f32,

    pub probe_mask: LayerMask,
    pub stairs_mask: LayerMask,
    pub climb_mask: LayerMask,
    pub water_mask: LayerMask,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            max_climb_speed: 5.0,
            max_snap_speed: 11.0,
            max_swim_speed: 5.0,
            max_acceleration: 20.0,
            max_climb_acceleration: 60.0,
            max_air_acceleration: 1.0,
            max_swim_acceleration: 5.0,
            max_ground_angle: 25.0,
            max_stair_angle: 46.0,
            max_climb_angle: 140.0,
            water_drag: 1.0,
            buoyancy: 1.0,
            swim_threshold: 0.5,
            jump_height: 2.0,
            max_air_jumps: 2,
            jump_buffer_ticks: DEFAULT_JUMP_BUFFER_TICKS,
            probe_distance: 1.0,
            submerge_offset: 0.5,
            submerge_range: 1.0,
            probe_mask: LayerMask::all(),
            stairs_mask: LayerMask::all(),
            climb_mask: LayerMask::all(),
            water_mask: LayerMask::none(),
        }
    }
}

/// Clamp `value` into `[min, max]`, recording the field name when it moved. NaN maps to `min`.
fn clamp_field(value: &mut f32, min: f32, max: f32, name: &'static str, changed: &mut Vec<&'static str>) {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != *value {
        *value = clamped;
        changed.push(name);
    }
}

impl CharacterSettings {
    /// Every field moved into its legal range.
    pub fn sanitized(mut self) -> Self {
        let mut changed = Vec::new();
        let c = &mut changed;

        clamp_field(&mut self.max_speed, 0.0, 100.0, "max_speed", c);
        clamp_field(&mut self.max_climb_speed, 0.0, 100.0, "max_climb_speed", c);
        clamp_field(&mut self.max_snap_speed, 0.0, 100.0, "max_snap_speed", c);
        clamp_field(&mut self.max_swim_speed, 0.0, 100.0, "max_swim_speed", c);
        clamp_field(&mut self.max_acceleration, 0.0, 100.0, "max_acceleration", c);
        clamp_field(&mut self.max_climb_acceleration, 0.0, 100.0, "max_climb_acceleration", c);
        clamp_field(&mut self.max_air_acceleration, 0.0, 100.0, "max_air_acceleration", c);
        clamp_field(&mut self.max_swim_acceleration, 0.0, 100.0, "max_swim_acceleration", c);
        clamp_field(&mut self.max_ground_angle, 0.0, 90.0, "max_ground_angle", c);
        clamp_field(&mut self.max_stair_angle, 0.0, 90.0, "max_stair_angle", c);
        clamp_field(&mut self.max_climb_angle, 90.0, 180.0, "max_climb_angle", c);
        clamp_field(&mut self.water_drag, 0.0, 10.0, "water_drag", c);
        clamp_field(&mut self.buoyancy, 0.0, f32::MAX, "buoyancy", c);
        clamp_field(&mut self.swim_threshold, 0.1, 1.0, "swim_threshold", c);
        clamp_field(&mut self.jump_height, 0.0, f32::MAX, "jump_height", c);
        clamp_field(&mut self.probe_distance, 0.0, f32::MAX, "probe_distance", c);
        clamp_field(&mut self.submerge_range, 0.1, f32::MAX, "submerge_range", c);
        if !self.submerge_offset.is_finite() {
            self.submerge_offset = 0.0;
            changed.push("submerge_offset");
        }
        if self.max_air_jumps > 5 {
            self.max_air_jumps = 5;
            changed.push("max_air_jumps");
        }

        if !changed.is_empty() {
            warn!("character settings clamped: {}", changed.join(", "));
        }
        self
    }

    /// Cosine thresholds for surface classification.
    pub fn thresholds(&self) -> SurfaceThresholds {
        SurfaceThresholds {
            min_ground_dot: self.max_ground_angle.to_radians().cos(),
            min_stair_dot: self.max_stair_angle.to_radians().cos(),
            min_climb_dot: self.max_climb_angle.to_radians().cos(),
            stair_mask: self.stairs_mask,
            climb_mask: self.climb_mask,
        }
    }

    /// Parse and sanitize settings from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = ron::from_str(text)?;
        Ok(settings.sanitized())
    }
}

/// Load and sanitize settings from a RON file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<CharacterSettings, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CharacterSettings::from_ron_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_sane() {
        assert_eq!(CharacterSettings::default().sanitized(), CharacterSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = CharacterSettings {
            max_speed: 250.0,
            max_ground_angle: -5.0,
            max_climb_angle: 45.0,
            swim_threshold: 0.0,
            submerge_range: 0.0,
            max_air_jumps: 9,
            jump_height: f32::NAN,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(s.max_speed, 100.0);
        assert_eq!(s.max_ground_angle, 0.0);
        assert_eq!(s.max_climb_angle, 90.0);
        assert_eq!(s.swim_threshold, 0.1);
        assert_eq!(s.submerge_range, 0.1);
        assert_eq!(s.max_air_jumps, 5);
        assert_eq!(s.jump_height, 0.0);
    }

    #[test]
    fn thresholds_follow_angles() {
        let t = CharacterSettings::default().thresholds();
        assert!((t.min_ground_dot - 25f32.to_radians().cos()).abs() < 1.0e-6);
        assert!((t.min_stair_dot - 46f32.to_radians().cos()).abs() < 1.0e-6);
        assert!(t.min_climb_dot < 0.0);
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let s = CharacterSettings::from_ron_str("(jump_height: 3.5, max_air_jumps: 7, water_mask: 16)")
            .unwrap();
        assert_eq!(s.jump_height, 3.5);
        assert_eq!(s.max_air_jumps, 5);
        assert_eq!(s.water_mask, LayerMask::new(16));
        assert_eq!(s.max_speed, 10.0);
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = CharacterSettings::from_ron_str("(jump_height: \"high\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_settings("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
