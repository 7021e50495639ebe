//! Player integration and moving-platform advance
//!
//! Both steps scale by `dt / (1000/60)` so motion is tuned per 60 fps frame
//! but stays frame-rate independent.

use super::stage::{Heading, MovingPlatform};
use super::state::{Player, SimulationState};
use crate::dt_factor;
use crate::settings::PhysicsSettings;

/// Apply gravity and velocity to the player for one frame of `dt_ms`
pub fn integrate(state: &mut SimulationState, physics: &PhysicsSettings, dt_ms: f32) {
    integrate_player(&mut state.player, physics, dt_ms);
}

/// Gravity only while airborne; horizontal speed is clamped after the move
/// so this frame's displacement uses the unclamped velocity.
pub fn integrate_player(player: &mut Player, physics: &PhysicsSettings, dt_ms: f32) {
    let f = dt_factor(dt_ms) * physics.game_speed;

    if !player.grounded {
        player.vel.y += physics.gravity * f;
    }
    player.pos += player.vel * f;
    let cap = physics.move_speed.abs();
    player.vel.x = player.vel.x.max(-cap).min(cap);
}

/// Advance every moving platform in the live stage
pub fn advance_platforms(state: &mut SimulationState, dt_ms: f32) {
    for platform in &mut state.stage.moving_platforms {
        advance_platform(platform, dt_ms);
    }
}

/// Ping-pong one platform between its bounds.
///
/// Overshoot past a bound is mirrored back rather than clamped, so the
/// platform keeps constant speed through the turnaround.
pub fn advance_platform(platform: &mut MovingPlatform, dt_ms: f32) {
    let old_x1 = platform.surface.x1;
    let width = platform.surface.width();
    let movement = platform.speed * platform.heading.sign() * dt_factor(dt_ms);

    let mut new_x1 = old_x1 + movement;
    match platform.heading {
        Heading::Right if new_x1 >= platform.end_x => {
            platform.heading = platform.heading.reversed();
            new_x1 = platform.end_x - (new_x1 - platform.end_x);
        }
        Heading::Left if new_x1 <= platform.start_x => {
            platform.heading = platform.heading.reversed();
            new_x1 = platform.start_x + (platform.start_x - new_x1);
        }
        _ => {}
    }
    // Only matters when one frame's travel exceeds the whole range. Not
    // `clamp`: bounds edited out of order must not panic mid-frame.
    new_x1 = new_x1.max(platform.start_x).min(platform.end_x);

    platform.surface.x1 = new_x1;
    platform.surface.x2 = new_x1 + width;
    platform.last_dx = new_x1 - old_x1;
}
