//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through the `dt` passed to `Game::tick`
//! - Seeded RNG only (cosmetic particles)
//! - Stable iteration order (stage array order)
//! - No rendering or platform dependencies

pub mod animation;
pub mod collision;
pub mod geometry;
pub mod physics;
pub mod stage;
pub mod state;
pub mod tick;

pub use animation::{AnimationLatch, DeathEffect, EffectKind, LatchState, Particle, ParticleArena};
pub use collision::{CollisionCallbacks, CollisionReport, Landing, Surface, resolve, swept_landing};
pub use geometry::Rect;
pub use stage::{Heading, MovingPlatform, Platform, Stage, StageDescriptor};
pub use state::{
    Camera, CollisionFlags, DeathCause, DeathMark, GamePhase, Player, SimulationState,
};
pub use tick::{ClearEvent, DeathEvent, FrameReport, Game, GameEvent, TickInput};
