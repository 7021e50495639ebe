//! Game state and core simulation types
//!
//! One `SimulationState` exists per session. It is owned by the orchestrator
//! and lent to each system for the duration of a tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::animation::{AnimationLatch, DeathEffect, EffectKind};
use super::geometry::Rect;
use super::stage::Stage;
use crate::settings::Settings;

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for start input
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Dead or cleared; world frozen until restart
    Over,
}

/// Why the player died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Spike,
    /// Fell into a hole or out of the world
    Fall,
    /// Clock ran out
    Time,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::Spike => "spike",
            DeathCause::Fall => "fall",
            DeathCause::Time => "time",
        }
    }

    /// Message shown by the HUD
    pub fn message(&self) -> &'static str {
        match self {
            DeathCause::Spike => "Hit a spike!",
            DeathCause::Fall => "Fell into a hole!",
            DeathCause::Time => "Time up!",
        }
    }
}

/// The player: a circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Recomputed by the collision resolver every tick
    pub grounded: bool,
}

impl Player {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            grounded: false,
        }
    }

    /// Bottom of the collider
    #[inline]
    pub fn foot_y(&self) -> f32 {
        self.pos.y + self.radius
    }

    pub fn bounds(&self) -> Rect {
        Rect::around_circle(self.pos, self.radius)
    }
}

/// Render offset; follows the player horizontally
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    /// Center the player horizontally in the viewport
    pub fn follow(&mut self, player: &Player, canvas_width: f32) {
        self.x = player.pos.x - canvas_width * 0.5;
        self.y = 0.0;
    }
}

/// Where the player died; kept for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathMark {
    pub pos: Vec2,
    pub timestamp_ms: f64,
}

/// Per-frame collision results, cleared at the start of each resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionFlags {
    pub hole: bool,
    pub boundary: bool,
    pub goal: bool,
}

/// Complete mutable simulation state
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub player: Player,
    pub camera: Camera,
    /// Live stage; moving platforms advance in place
    pub stage: Stage,
    pub flags: CollisionFlags,
    /// Foot y at the end of the previous frame (for swept landing)
    pub prev_foot_y: f32,
    pub phase: GamePhase,
    /// Seconds left on the clock
    pub time_remaining: f32,
    /// Seconds left when the goal was reached, rounded up
    pub final_score: u32,
    pub death_count: u32,
    /// Session log; survives restarts
    pub death_marks: Vec<DeathMark>,
    pub death_fx: DeathEffect,
    pub clear_fx: AnimationLatch,
    /// Milliseconds since session start
    pub clock_ms: f64,
    pub game_start_ms: f64,
    /// Time since the player last stood on something; infinite until the
    /// first landing and after a jump
    pub airborne_ms: f32,
}

impl SimulationState {
    /// Create a fresh session for a stage
    pub fn new(stage: Stage, settings: &Settings) -> Self {
        let spawn = spawn_point(&stage, settings);
        let player = Player::new(spawn, settings.world.player_radius);
        let prev_foot_y = player.foot_y();
        let time_remaining = stage.time_limit;
        let mut camera = Camera::default();
        camera.follow(&player, settings.world.canvas_width);

        Self {
            player,
            camera,
            stage,
            flags: CollisionFlags::default(),
            prev_foot_y,
            phase: GamePhase::Idle,
            time_remaining,
            final_score: 0,
            death_count: 0,
            death_marks: Vec::new(),
            death_fx: DeathEffect::default(),
            clear_fx: AnimationLatch::new(EffectKind::Clear),
            clock_ms: 0.0,
            game_start_ms: 0.0,
            airborne_ms: f32::INFINITY,
        }
    }

    /// Back to `Idle` with the stage as originally loaded.
    ///
    /// Death marks and the death count are kept.
    pub fn reset(&mut self, original: &Stage, settings: &Settings) {
        self.stage.moving_platforms.clone_from(&original.moving_platforms);

        let spawn = spawn_point(original, settings);
        self.player = Player::new(spawn, settings.world.player_radius);
        self.prev_foot_y = self.player.foot_y();
        self.camera.follow(&self.player, settings.world.canvas_width);

        self.flags = CollisionFlags::default();
        self.phase = GamePhase::Idle;
        self.time_remaining = original.time_limit;
        self.final_score = 0;
        self.death_fx.reset();
        self.clear_fx.reset();
        self.game_start_ms = self.clock_ms;
        self.airborne_ms = f32::INFINITY;
    }

    pub fn game_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn game_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Seconds elapsed since the run started
    pub fn elapsed_secs(&self) -> f32 {
        ((self.clock_ms - self.game_start_ms) / 1000.0) as f32
    }
}

fn spawn_point(stage: &Stage, settings: &Settings) -> Vec2 {
    stage.spawn.unwrap_or(settings.world.spawn)
}
