//! Ledge Runner - a side-scrolling platformer core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `settings`: Data-driven tuning (gravity, speeds, world bounds)
//! - `error`: Failures surfaced to the host loop
//!
//! Rendering, HUD, input capture and stage authoring live outside this crate.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{HookError, HookResult, SimError};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Nominal frame budget the motion constants are tuned against (60 fps)
    pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Frame dt clamp (~2 frames) so a stalled tab can't tunnel the player
    pub const MAX_FRAME_MS: f32 = 33.0;

    /// Player physics (per nominal frame)
    pub const GRAVITY: f32 = 0.6;
    pub const JUMP_FORCE: f32 = -12.0;
    pub const MOVE_SPEED: f32 = 4.0;
    /// Global multiplier on player motion (moving platforms ignore it)
    pub const GAME_SPEED: f32 = 2.0;
    pub const PLAYER_RADIUS: f32 = 10.0;

    /// Viewport
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;
    /// Below this the player has fallen into a hole
    pub const HOLE_THRESHOLD: f32 = 600.0;
    /// Distance below the canvas that counts as leaving the world
    pub const BOUNDARY_MARGIN: f32 = 100.0;
    /// Death marks are pulled up to this far above the canvas floor
    pub const DEATH_MARK_MARGIN: f32 = 20.0;

    /// Seconds on the clock when a stage doesn't specify one
    pub const DEFAULT_TIME_LIMIT: f32 = 20.0;
    /// Grace period after walking off a ledge during which a jump still works
    pub const COYOTE_MS: f32 = 100.0;

    /// Particle gravity for death/clear effects (per update)
    pub const PARTICLE_GRAVITY: f32 = 0.1;
}

/// Clamp a raw frame delta into `[0, max_ms]`.
///
/// Non-finite or negative deltas (clock skew, first frame) count as zero.
#[inline]
pub fn clamp_frame_dt(dt_ms: f32, max_ms: f32) -> f32 {
    if !dt_ms.is_finite() || dt_ms <= 0.0 {
        return 0.0;
    }
    dt_ms.min(max_ms)
}

/// Scale of a frame relative to the 60 fps baseline
#[inline]
pub fn dt_factor(dt_ms: f32) -> f32 {
    dt_ms / consts::NOMINAL_FRAME_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_frame_dt() {
        assert_eq!(clamp_frame_dt(16.0, 33.0), 16.0);
        assert_eq!(clamp_frame_dt(500.0, 33.0), 33.0);
        assert_eq!(clamp_frame_dt(-4.0, 33.0), 0.0);
        assert_eq!(clamp_frame_dt(f32::NAN, 33.0), 0.0);
        assert_eq!(clamp_frame_dt(f32::INFINITY, 33.0), 0.0);
    }

    #[test]
    fn test_dt_factor_nominal_frame_is_one() {
        assert!((dt_factor(consts::NOMINAL_FRAME_MS) - 1.0).abs() < 1e-6);
        assert!((dt_factor(consts::NOMINAL_FRAME_MS * 2.0) - 2.0).abs() < 1e-6);
    }
}
