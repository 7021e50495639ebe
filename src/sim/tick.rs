//! Frame-stepped game loop
//!
//! `Game` owns the simulation state and advances it one display frame at a
//! time: input, physics, moving platforms, collisions, animations, timer,
//! camera. The order is fixed; collisions see this frame's integrated
//! position and animations see this frame's deaths.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{self, CollisionCallbacks};
use super::physics;
use super::stage::Stage;
use super::state::{DeathCause, GamePhase, SimulationState};
use crate::clamp_frame_dt;
use crate::error::{HookResult, SimError};
use crate::settings::Settings;

/// Logical input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    /// Begin a run from `Idle`
    pub start: bool,
    /// Return to `Idle` from `Over`
    pub restart: bool,
}

/// Passed to the death hook
#[derive(Debug, Clone, PartialEq)]
pub struct DeathEvent {
    pub cause: DeathCause,
    pub message: &'static str,
    pub pos: Vec2,
    /// Deaths this session, including this one
    pub death_count: u32,
}

/// Passed to the goal hook
#[derive(Debug, Clone, PartialEq)]
pub struct ClearEvent {
    pub score: u32,
    pub time_remaining: f32,
}

/// Something the UI may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    Died(DeathEvent),
    Cleared(ClearEvent),
    Restarted,
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub phase: GamePhase,
    pub events: Vec<GameEvent>,
}

pub type DeathHook = Box<dyn FnMut(&DeathEvent) -> HookResult>;
pub type GoalHook = Box<dyn FnMut(&ClearEvent) -> HookResult>;

/// The orchestrator: owns state, the pristine stage and host hooks
pub struct Game {
    state: SimulationState,
    /// Stage as loaded; restarts copy moving platforms back from here
    original: Stage,
    settings: Settings,
    rng: Pcg32,
    on_death: Option<DeathHook>,
    on_goal: Option<GoalHook>,
    halted: bool,
}

impl Game {
    pub fn new(stage: Stage, settings: Settings) -> Self {
        let settings = settings.sanitized();
        let stage = stage.normalized();
        let original = stage.clone();
        let rng = Pcg32::seed_from_u64(settings.seed);
        Self {
            state: SimulationState::new(stage, &settings),
            original,
            settings,
            rng,
            on_death: None,
            on_goal: None,
            halted: false,
        }
    }

    /// Build a game straight from stage JSON
    pub fn from_json(json: &str, settings: Settings) -> Result<Self, SimError> {
        let stage = Stage::from_json(json, settings.timing.default_time_limit)?;
        Ok(Self::new(stage, settings))
    }

    pub fn set_on_death(&mut self, hook: impl FnMut(&DeathEvent) -> HookResult + 'static) {
        self.on_death = Some(Box::new(hook));
    }

    pub fn set_on_goal(&mut self, hook: impl FnMut(&ClearEvent) -> HookResult + 'static) {
        self.on_goal = Some(Box::new(hook));
    }

    /// Read-only view for renderers and HUDs; valid between ticks
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn original_stage(&self) -> &Stage {
        &self.original
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Advance one display frame of `dt_ms` milliseconds.
    ///
    /// Physics uses `dt_ms` clamped to `max_frame_ms`; the clock advances by
    /// the real value. If a hook fails the frame still completes, the error
    /// is returned and every later tick returns [`SimError::Halted`].
    pub fn tick(&mut self, input: &TickInput, dt_ms: f32) -> Result<FrameReport, SimError> {
        if self.halted {
            return Err(SimError::Halted);
        }

        let elapsed = if dt_ms.is_finite() && dt_ms > 0.0 { dt_ms } else { 0.0 };
        self.state.clock_ms += f64::from(elapsed);
        let dt = clamp_frame_dt(dt_ms, self.settings.timing.max_frame_ms);

        let mut events = Vec::new();
        let mut failure = None;

        match self.state.phase {
            GamePhase::Idle => {
                if input.start {
                    self.start_run();
                    events.push(GameEvent::Started);
                }
            }
            GamePhase::Running => {
                failure = self.step_running(input, dt, &mut events);
            }
            GamePhase::Over => {
                if input.restart {
                    self.reset_game_state();
                    events.push(GameEvent::Restarted);
                } else {
                    // Frozen world; effects keep playing
                    self.update_animations();
                }
            }
        }

        if let Some(err) = failure {
            log::error!("halting simulation: {err}");
            self.halted = true;
            return Err(err);
        }

        Ok(FrameReport {
            phase: self.state.phase,
            events,
        })
    }

    /// `Idle` -> `Running`
    fn start_run(&mut self) {
        self.state.phase = GamePhase::Running;
        self.state.game_start_ms = self.state.clock_ms;
        self.state.flags = Default::default();
        log::info!("stage '{}' started", self.state.stage.name);
    }

    /// `Over` -> `Idle`. Death marks survive.
    pub fn reset_game_state(&mut self) {
        self.state.reset(&self.original, &self.settings);
        log::info!(
            "stage '{}' reset ({} death marks kept)",
            self.state.stage.name,
            self.state.death_marks.len()
        );
    }

    /// One `Running` frame. Returns the first hook failure, if any.
    fn step_running(
        &mut self,
        input: &TickInput,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) -> Option<SimError> {
        self.apply_input(input);

        physics::integrate(&mut self.state, &self.settings.physics, dt);
        physics::advance_platforms(&mut self.state, dt);

        let mut death = None;
        let mut goal = false;
        let report = {
            let mut on_death = |cause: DeathCause| {
                death.get_or_insert(cause);
            };
            let mut on_goal = || goal = true;
            let mut callbacks = CollisionCallbacks {
                on_death: Some(&mut on_death),
                on_goal: Some(&mut on_goal),
            };
            collision::resolve(&mut self.state, &self.settings.world, &mut callbacks)
        };

        if report.landing.is_some() {
            self.state.airborne_ms = 0.0;
        } else {
            self.state.airborne_ms += dt;
        }

        // Goal is resolved before a same-frame fall, so it wins
        let mut failure = None;
        if goal {
            failure = failure.or(self.handle_goal(events));
        }
        if let Some(cause) = death {
            failure = failure.or(self.handle_death(cause, events));
        }

        self.update_animations();

        if self.state.game_running() {
            let remaining = self.state.stage.time_limit - self.state.elapsed_secs();
            self.state.time_remaining = remaining.max(0.0);
            if remaining <= 0.0 {
                failure = failure.or(self.handle_death(DeathCause::Time, events));
            }
        }

        self.state
            .camera
            .follow(&self.state.player, self.settings.world.canvas_width);

        failure
    }

    fn apply_input(&mut self, input: &TickInput) {
        let physics = &self.settings.physics;
        let player = &mut self.state.player;

        player.vel.x = match (input.move_left, input.move_right) {
            (true, false) => -physics.move_speed,
            (false, true) => physics.move_speed,
            _ => 0.0,
        };

        let can_jump =
            player.grounded || self.state.airborne_ms <= self.settings.timing.coyote_ms;
        if input.jump && can_jump {
            player.vel.y = physics.jump_force;
            player.grounded = false;
            // No second jump until the next landing
            self.state.airborne_ms = f32::INFINITY;
        }
    }

    /// Game over by death. Ignored unless the run is still live.
    fn handle_death(&mut self, cause: DeathCause, events: &mut Vec<GameEvent>) -> Option<SimError> {
        if !self.state.game_running() {
            return None;
        }
        self.state.phase = GamePhase::Over;
        self.state.death_count += 1;

        let pos = self.state.player.pos;
        self.state.death_fx.trigger(
            pos,
            self.settings.world.visible_floor(),
            &mut self.state.death_marks,
            self.state.clock_ms,
            &mut self.rng,
        );
        log::info!(
            "player died ({}) at ({:.1}, {:.1}), deaths this session: {}",
            cause.as_str(),
            pos.x,
            pos.y,
            self.state.death_count
        );

        let event = DeathEvent {
            cause,
            message: cause.message(),
            pos,
            death_count: self.state.death_count,
        };
        let result = match self.on_death.as_mut() {
            Some(hook) => hook(&event),
            None => Ok(()),
        };
        events.push(GameEvent::Died(event));
        result
            .err()
            .map(|source| SimError::Hook {
                hook: "on_death",
                source,
            })
    }

    /// Game over by reaching the goal. Ignored unless the run is still live.
    fn handle_goal(&mut self, events: &mut Vec<GameEvent>) -> Option<SimError> {
        if !self.state.game_running() {
            return None;
        }
        self.state.phase = GamePhase::Over;
        self.state.final_score = self.state.time_remaining.max(0.0).ceil() as u32;

        let origin = self
            .state
            .stage
            .goal
            .map(|goal| goal.center())
            .unwrap_or(self.state.player.pos);
        self.state
            .clear_fx
            .start(origin, self.state.clock_ms, &mut self.rng);
        log::info!(
            "stage '{}' cleared, score {}",
            self.state.stage.name,
            self.state.final_score
        );

        let event = ClearEvent {
            score: self.state.final_score,
            time_remaining: self.state.time_remaining,
        };
        let result = match self.on_goal.as_mut() {
            Some(hook) => hook(&event),
            None => Ok(()),
        };
        events.push(GameEvent::Cleared(event));
        result
            .err()
            .map(|source| SimError::Hook {
                hook: "on_goal",
                source,
            })
    }

    fn update_animations(&mut self) {
        let now = self.state.clock_ms;
        self.state.death_fx.update(now);
        self.state.clear_fx.update(now);
    }
}
