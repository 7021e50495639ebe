//! Game tuning and world configuration
//!
//! Every field has a default, so a partial JSON document only overrides what
//! it names.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;

/// Player motion tuning (values are per nominal 60 fps frame)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: f32,
    /// Initial vertical velocity of a jump (negative is up)
    pub jump_force: f32,
    /// Horizontal speed cap
    pub move_speed: f32,
    /// Multiplier on player motion; moving platforms ignore it
    pub game_speed: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,
            move_speed: MOVE_SPEED,
            game_speed: GAME_SPEED,
        }
    }
}

/// Viewport and world bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub hole_threshold: f32,
    pub boundary_margin: f32,
    pub death_mark_margin: f32,
    pub player_radius: f32,
    /// Spawn point used when a stage doesn't name one
    pub spawn: Vec2,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            hole_threshold: HOLE_THRESHOLD,
            boundary_margin: BOUNDARY_MARGIN,
            death_mark_margin: DEATH_MARK_MARGIN,
            player_radius: PLAYER_RADIUS,
            spawn: Vec2::new(100.0, 400.0),
        }
    }
}

impl WorldSettings {
    /// Falling past this y leaves the world entirely
    pub fn boundary_y(&self) -> f32 {
        self.canvas_height + self.boundary_margin
    }

    /// Lowest y a death mark is drawn at
    pub fn visible_floor(&self) -> f32 {
        self.canvas_height - self.death_mark_margin
    }
}

/// Frame and clock handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Frame dt clamp in ms
    pub max_frame_ms: f32,
    /// Seconds on the clock for stages without a valid `timeLimit`
    pub default_time_limit: f32,
    pub coyote_ms: f32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            max_frame_ms: MAX_FRAME_MS,
            default_time_limit: DEFAULT_TIME_LIMIT,
            coyote_ms: COYOTE_MS,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub world: WorldSettings,
    pub timing: TimingSettings,
    /// Seed for cosmetic particle randomness
    pub seed: u64,
}

impl Settings {
    /// Parse settings, falling back to defaults for anything omitted
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings = serde_json::from_str(json).map_err(SimError::Settings)?;
        Ok(settings.sanitized())
    }

    /// Replace non-finite or nonsensical values with defaults
    pub fn sanitized(mut self) -> Self {
        let physics = PhysicsSettings::default();
        let world = WorldSettings::default();
        let timing = TimingSettings::default();

        fix(&mut self.physics.gravity, physics.gravity, |v| v >= 0.0);
        fix(&mut self.physics.jump_force, physics.jump_force, |v| v <= 0.0);
        fix(&mut self.physics.move_speed, physics.move_speed, |v| v >= 0.0);
        fix(&mut self.physics.game_speed, physics.game_speed, |v| v > 0.0);

        fix(&mut self.world.canvas_width, world.canvas_width, |v| v > 0.0);
        fix(&mut self.world.canvas_height, world.canvas_height, |v| v > 0.0);
        fix(&mut self.world.hole_threshold, world.hole_threshold, |_| true);
        fix(&mut self.world.boundary_margin, world.boundary_margin, |v| v >= 0.0);
        fix(&mut self.world.death_mark_margin, world.death_mark_margin, |v| v >= 0.0);
        fix(&mut self.world.player_radius, world.player_radius, |v| v > 0.0);
        if !self.world.spawn.is_finite() {
            self.world.spawn = world.spawn;
        }

        fix(&mut self.timing.max_frame_ms, timing.max_frame_ms, |v| v > 0.0);
        fix(&mut self.timing.default_time_limit, timing.default_time_limit, |v| v > 0.0);
        fix(&mut self.timing.coyote_ms, timing.coyote_ms, |v| v >= 0.0);
        self
    }
}

fn fix(value: &mut f32, default: f32, valid: impl Fn(f32) -> bool) {
    if !value.is_finite() || !valid(*value) {
        log::warn!("invalid setting {value}, using {default}");
        *value = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"physics": {"gravity": 0.8}, "seed": 7}"#).unwrap();
        assert_eq!(settings.physics.gravity, 0.8);
        assert_eq!(settings.physics.move_speed, MOVE_SPEED);
        assert_eq!(settings.world.canvas_height, CANVAS_HEIGHT);
        assert_eq!(settings.seed, 7);
    }

    #[test]
    fn test_sanitized_replaces_bad_values() {
        let mut settings = Settings::default();
        settings.physics.game_speed = 0.0;
        settings.timing.max_frame_ms = f32::NAN;
        settings.world.player_radius = -3.0;
        let settings = settings.sanitized();
        assert_eq!(settings.physics.game_speed, GAME_SPEED);
        assert_eq!(settings.timing.max_frame_ms, MAX_FRAME_MS);
        assert_eq!(settings.world.player_radius, PLAYER_RADIUS);
    }

    #[test]
    fn test_garbage_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SimError::Settings(_))
        ));
    }

    #[test]
    fn test_world_derived_bounds() {
        let world = WorldSettings::default();
        assert_eq!(world.boundary_y(), CANVAS_HEIGHT + BOUNDARY_MARGIN);
        assert_eq!(world.visible_floor(), CANVAS_HEIGHT - DEATH_MARK_MARGIN);
    }
}
