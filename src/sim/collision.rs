//! Collision detection and response
//!
//! Checks run in a fixed priority order every tick:
//! moving platforms, static platforms, spikes, goal, then holes/boundary.
//! Platform landing uses a swept test on the player's foot so a fast fall
//! can't skip over a thin surface between two frames.

use super::geometry::spans_overlap;
use super::stage::{Platform, Stage};
use super::state::{DeathCause, Player, SimulationState};
use crate::settings::WorldSettings;

/// Optional hooks fired by the resolver. Missing hooks are skipped.
#[derive(Default)]
pub struct CollisionCallbacks<'a> {
    pub on_death: Option<&'a mut dyn FnMut(DeathCause)>,
    pub on_goal: Option<&'a mut dyn FnMut()>,
}

impl CollisionCallbacks<'_> {
    fn death(&mut self, cause: DeathCause) {
        if let Some(on_death) = self.on_death.as_deref_mut() {
            on_death(cause);
        }
    }

    fn goal(&mut self) {
        if let Some(on_goal) = self.on_goal.as_deref_mut() {
            on_goal();
        }
    }
}

/// Which surface caught the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Index into `stage.moving_platforms`
    Moving(usize),
    /// Index into `stage.platforms`
    Static(usize),
}

/// A successful landing this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub surface: Surface,
    /// Top of the surface the foot now rests on
    pub surface_y: f32,
    /// Horizontal carry applied by a moving platform
    pub carried_dx: f32,
}

/// Everything that happened during one resolve
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionReport {
    pub landing: Option<Landing>,
    pub death: Option<DeathCause>,
    pub goal: bool,
}

/// Swept landing test.
///
/// The foot must have been at or above the surface last frame and be at or
/// below it now, while falling or resting and horizontally overlapping.
/// Comparing against the previous foot position is what catches a fast fall
/// that jumps clean past the surface in one frame.
pub fn swept_landing(player: &Player, prev_foot_y: f32, platform: &Platform) -> bool {
    let curr_foot_y = player.foot_y();
    spans_overlap(player.pos.x, player.radius, platform.x1, platform.x2)
        && player.vel.y >= 0.0
        && prev_foot_y <= platform.y1
        && curr_foot_y >= platform.y1
}

fn land(player: &mut Player, surface_y: f32) {
    player.pos.y = surface_y - player.radius;
    player.vel.y = 0.0;
    player.grounded = true;
}

/// Land the player on the first platform that catches it.
///
/// Moving platforms win over static ones. The player rides a moving
/// platform by its displacement this frame.
pub fn resolve_platforms(player: &mut Player, prev_foot_y: f32, stage: &Stage) -> Option<Landing> {
    player.grounded = false;

    for (i, mp) in stage.moving_platforms.iter().enumerate() {
        if swept_landing(player, prev_foot_y, &mp.surface) {
            land(player, mp.surface.y1);
            player.pos.x += mp.last_dx;
            return Some(Landing {
                surface: Surface::Moving(i),
                surface_y: mp.surface.y1,
                carried_dx: mp.last_dx,
            });
        }
    }

    for (i, platform) in stage.platforms.iter().enumerate() {
        if swept_landing(player, prev_foot_y, platform) {
            land(player, platform.y1);
            return Some(Landing {
                surface: Surface::Static(i),
                surface_y: platform.y1,
                carried_dx: 0.0,
            });
        }
    }

    None
}

/// Run every collision check for this tick
pub fn resolve(
    state: &mut SimulationState,
    world: &WorldSettings,
    callbacks: &mut CollisionCallbacks<'_>,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    state.flags = Default::default();

    report.landing = resolve_platforms(&mut state.player, state.prev_foot_y, &state.stage);

    let player_box = state.player.bounds();

    if state.stage.spikes.iter().any(|spike| spike.overlaps(&player_box)) {
        report.death = Some(DeathCause::Spike);
        callbacks.death(DeathCause::Spike);
        state.prev_foot_y = state.player.foot_y();
        return report;
    }

    if state
        .stage
        .goal
        .is_some_and(|goal| goal.overlaps(&player_box))
    {
        state.flags.goal = true;
        report.goal = true;
        callbacks.goal();
    }

    let y = state.player.pos.y;
    state.flags.hole = y > world.hole_threshold;
    state.flags.boundary = y > world.boundary_y();
    if state.flags.hole || state.flags.boundary {
        report.death = Some(DeathCause::Fall);
        callbacks.death(DeathCause::Fall);
    }

    state.prev_foot_y = state.player.foot_y();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::geometry::Rect;
    use crate::sim::stage::{Heading, MovingPlatform};
    use glam::Vec2;
    use proptest::prelude::*;

    fn player(x: f32, y: f32, vy: f32, radius: f32) -> Player {
        Player {
            pos: Vec2::new(x, y),
            vel: Vec2::new(2.0, vy),
            radius,
            grounded: false,
        }
    }

    fn stage_with(platforms: Vec<Platform>) -> Stage {
        Stage {
            name: "test".into(),
            platforms,
            moving_platforms: Vec::new(),
            spikes: Vec::new(),
            goal: None,
            time_limit: 20.0,
            spawn: None,
        }
    }

    fn state_with(stage: Stage, pos: Vec2) -> SimulationState {
        let mut state = SimulationState::new(stage, &Settings::default());
        state.player.pos = pos;
        state.prev_foot_y = state.player.foot_y();
        state
    }

    #[test]
    fn test_lands_on_platform() {
        let stage = stage_with(vec![Platform::new(90.0, 410.0, 110.0, 410.0)]);
        let mut p = player(100.0, 408.0, 5.0, 3.0);

        let landing = resolve_platforms(&mut p, 405.0, &stage).unwrap();
        assert_eq!(landing.surface, Surface::Static(0));
        assert_eq!(p.pos.y, 407.0);
        assert_eq!(p.vel.y, 0.0);
        assert!(p.grounded);
    }

    #[test]
    fn test_no_landing_when_already_below() {
        let stage = stage_with(vec![Platform::new(90.0, 410.0, 110.0, 410.0)]);
        let mut p = player(100.0, 500.0, 5.0, 3.0);

        assert!(resolve_platforms(&mut p, 495.0, &stage).is_none());
        assert_eq!(p.pos.y, 500.0);
        assert!(!p.grounded);
    }

    #[test]
    fn test_no_landing_outside_horizontal_span() {
        let stage = stage_with(vec![Platform::new(90.0, 410.0, 110.0, 410.0)]);
        let mut p = player(120.0, 408.0, 5.0, 3.0);
        assert!(resolve_platforms(&mut p, 405.0, &stage).is_none());
    }

    #[test]
    fn test_resting_player_stays_grounded() {
        let stage = stage_with(vec![Platform::new(0.0, 500.0, 300.0, 500.0)]);
        let mut p = player(100.0, 490.0, 0.0, 10.0);
        assert!(resolve_platforms(&mut p, 500.0, &stage).is_some());
        assert!(p.grounded);
        assert_eq!(p.pos.y, 490.0);
    }

    #[test]
    fn test_moving_platform_wins_and_carries() {
        let mut stage = stage_with(vec![Platform::new(0.0, 400.0, 300.0, 400.0)]);
        let mut mp = MovingPlatform::new(
            Platform::new(80.0, 400.0, 160.0, 400.0),
            0.0,
            500.0,
            1.5,
            Heading::Right,
        );
        mp.last_dx = 1.5;
        stage.moving_platforms.push(mp);

        let mut p = player(100.0, 392.0, 4.0, 10.0);
        let landing = resolve_platforms(&mut p, 395.0, &stage).unwrap();
        assert_eq!(landing.surface, Surface::Moving(0));
        assert_eq!(landing.carried_dx, 1.5);
        assert_eq!(p.pos.x, 101.5);
        assert_eq!(p.pos.y, 390.0);
    }

    #[test]
    fn test_first_static_platform_wins() {
        let stage = stage_with(vec![
            Platform::new(0.0, 400.0, 300.0, 400.0),
            Platform::new(0.0, 402.0, 300.0, 402.0),
        ]);
        let mut p = player(100.0, 395.0, 8.0, 10.0);
        let landing = resolve_platforms(&mut p, 390.0, &stage).unwrap();
        assert_eq!(landing.surface, Surface::Static(0));
        assert_eq!(p.pos.y, 390.0);
    }

    #[test]
    fn test_spike_kills_and_short_circuits() {
        let mut stage = stage_with(Vec::new());
        stage.spikes.push(Rect::new(90.0, 90.0, 20.0, 20.0));
        stage.goal = Some(Rect::new(80.0, 80.0, 40.0, 40.0));
        let mut state = state_with(stage, Vec2::new(100.0, 100.0));
        let world = Settings::default().world;

        let mut deaths = Vec::new();
        let mut goals = 0;
        let mut on_death = |cause: DeathCause| deaths.push(cause);
        let mut on_goal = || goals += 1;
        let mut callbacks = CollisionCallbacks {
            on_death: Some(&mut on_death),
            on_goal: Some(&mut on_goal),
        };
        let report = resolve(&mut state, &world, &mut callbacks);
        drop(callbacks);

        assert_eq!(report.death, Some(DeathCause::Spike));
        assert!(!report.goal);
        assert!(!state.flags.goal);
        assert_eq!(deaths, vec![DeathCause::Spike]);
        assert_eq!(goals, 0);
    }

    #[test]
    fn test_goal_sets_flag_and_fires() {
        let mut stage = stage_with(Vec::new());
        stage.goal = Some(Rect::new(80.0, 80.0, 40.0, 40.0));
        let mut state = state_with(stage, Vec2::new(100.0, 100.0));
        let world = Settings::default().world;

        let mut goals = 0;
        let mut on_goal = || goals += 1;
        let mut callbacks = CollisionCallbacks {
            on_death: None,
            on_goal: Some(&mut on_goal),
        };
        let report = resolve(&mut state, &world, &mut callbacks);
        drop(callbacks);

        assert!(report.goal);
        assert!(state.flags.goal);
        assert_eq!(goals, 1);
    }

    #[test]
    fn test_hole_threshold_is_strict() {
        let world = Settings::default().world;
        let mut state = state_with(stage_with(Vec::new()), Vec2::new(0.0, world.hole_threshold));
        let report = resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert_eq!(report.death, None);
        assert!(!state.flags.hole);

        state.player.pos.y = world.hole_threshold + 0.01;
        let report = resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert_eq!(report.death, Some(DeathCause::Fall));
        assert!(state.flags.hole);
        assert!(!state.flags.boundary);

        state.player.pos.y = world.boundary_y() + 1.0;
        resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert!(state.flags.boundary);
    }

    #[test]
    fn test_missing_callbacks_are_noops() {
        let mut stage = stage_with(Vec::new());
        stage.spikes.push(Rect::new(90.0, 90.0, 20.0, 20.0));
        let mut state = state_with(stage, Vec2::new(100.0, 100.0));
        let world = Settings::default().world;
        let report = resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert_eq!(report.death, Some(DeathCause::Spike));
    }

    #[test]
    fn test_empty_stage_never_collides() {
        let world = Settings::default().world;
        let mut state = state_with(stage_with(Vec::new()), Vec2::new(0.0, 0.0));
        let report = resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert_eq!(report, CollisionReport::default());
        assert!(!state.player.grounded);
    }

    #[test]
    fn test_prev_foot_recorded_for_next_frame() {
        let world = Settings::default().world;
        let mut state = state_with(stage_with(Vec::new()), Vec2::new(0.0, 0.0));
        state.player.pos.y = 123.0;
        resolve(&mut state, &world, &mut CollisionCallbacks::default());
        assert_eq!(state.prev_foot_y, 123.0 + state.player.radius);
    }

    proptest! {
        #[test]
        fn prop_fast_fall_never_tunnels(
            surface in 100.0f32..500.0,
            above in 0.0f32..200.0,
            vy in 0.0f32..400.0,
            x in 0.0f32..200.0,
        ) {
            let stage = stage_with(vec![Platform::new(-50.0, surface, 250.0, surface)]);
            let radius = 10.0;
            let prev_foot_y = surface - above;
            // Foot ends at or past the surface this frame
            let mut p = player(x, prev_foot_y - radius + above + vy, vy, radius);
            prop_assume!(p.foot_y() >= surface);

            let landing = resolve_platforms(&mut p, prev_foot_y, &stage);
            prop_assert!(landing.is_some());
            prop_assert!((p.foot_y() - surface).abs() < 1e-3);
            prop_assert!(p.grounded);
        }

        #[test]
        fn prop_ascending_never_lands(
            y in 0.0f32..1000.0,
            prev_foot_y in 0.0f32..1000.0,
            vy in -50.0f32..-0.001,
            surface in 0.0f32..1000.0,
        ) {
            let stage = stage_with(vec![Platform::new(-1000.0, surface, 1000.0, surface)]);
            let mut p = player(0.0, y, vy, 10.0);
            prop_assert!(resolve_platforms(&mut p, prev_foot_y, &stage).is_none());
            prop_assert!(!p.grounded);
        }
    }
}
