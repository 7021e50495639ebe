//! Single-trigger particle effects for deaths and stage clears
//!
//! A latch fires once and ignores further triggers until its duration runs
//! out or it is reset, so a condition that stays true for many frames (the
//! game-over flag) produces exactly one burst.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::DeathMark;
use crate::consts::PARTICLE_GRAVITY;

/// A particle for visual effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1 at spawn, removed once it reaches 0
    pub life: f32,
    /// Life lost per update
    pub decay: f32,
    pub size: f32,
}

/// Particle storage with O(1) swap-remove of dead entries.
///
/// Order is not preserved.
#[derive(Debug, Clone, Default)]
pub struct ParticleArena {
    particles: Vec<Particle>,
}

impl ParticleArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Integrate every particle one step and drop the ones that died
    pub fn step(&mut self, gravity: f32) {
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.pos += p.vel;
            p.vel.y += gravity;
            p.life -= p.decay;
            if p.life <= 0.0 {
                // The last particle moves into slot i, so don't advance
                self.particles.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Which burst a latch plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Radial explosion at the death point
    Death,
    /// Confetti scattered around the goal
    Clear,
}

impl EffectKind {
    pub fn particle_count(self) -> usize {
        match self {
            EffectKind::Death => 15,
            EffectKind::Clear => 20,
        }
    }

    pub fn duration_ms(self) -> f64 {
        match self {
            EffectKind::Death => 2000.0,
            EffectKind::Clear => 3000.0,
        }
    }

    fn spawn(self, index: usize, origin: Vec2, rng: &mut impl Rng) -> Particle {
        match self {
            EffectKind::Death => {
                let count = self.particle_count() as f32;
                let angle = index as f32 / count * std::f32::consts::TAU;
                let speed: f32 = rng.random_range(2.0..5.0);
                Particle {
                    pos: origin,
                    vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                    life: 1.0,
                    decay: rng.random_range(0.01..0.03),
                    size: rng.random_range(2.0..4.0),
                }
            }
            EffectKind::Clear => Particle {
                pos: origin + Vec2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)),
                vel: Vec2::new(rng.random_range(-2.0..2.0), rng.random_range(-4.0..-1.0)),
                life: 1.0,
                decay: rng.random_range(0.005..0.015),
                size: rng.random_range(2.0..5.0),
            },
        }
    }
}

/// Latch state; `Active` carries its own start time so an active latch
/// without one can't exist
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LatchState {
    #[default]
    Inactive,
    Active { started_at_ms: f64 },
}

/// A one-shot particle burst
#[derive(Debug, Clone)]
pub struct AnimationLatch {
    kind: EffectKind,
    state: LatchState,
    particles: ParticleArena,
}

impl AnimationLatch {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            state: LatchState::Inactive,
            particles: ParticleArena::with_capacity(kind.particle_count()),
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, LatchState::Active { .. })
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    /// Fire the burst at `origin`. Returns false (and does nothing) if the
    /// latch is already active.
    pub fn start(&mut self, origin: Vec2, now_ms: f64, rng: &mut impl Rng) -> bool {
        match self.state {
            LatchState::Active { .. } => false,
            LatchState::Inactive => {
                self.state = LatchState::Active {
                    started_at_ms: now_ms,
                };
                self.particles.clear();
                for i in 0..self.kind.particle_count() {
                    self.particles.push(self.kind.spawn(i, origin, &mut *rng));
                }
                true
            }
        }
    }

    /// Advance particles one step; deactivates once the duration elapsed
    pub fn update(&mut self, now_ms: f64) {
        let LatchState::Active { started_at_ms } = self.state else {
            return;
        };
        self.particles.step(PARTICLE_GRAVITY);
        if now_ms - started_at_ms > self.kind.duration_ms() {
            self.state = LatchState::Inactive;
        }
    }

    pub fn reset(&mut self) {
        self.state = LatchState::Inactive;
        self.particles.clear();
    }
}

/// Death burst plus the once-per-death mark
#[derive(Debug, Clone)]
pub struct DeathEffect {
    latch: AnimationLatch,
    /// Set when this death's mark was recorded; independent of the latch,
    /// which goes inactive while the game-over flag is still up
    mark_recorded: bool,
}

impl Default for DeathEffect {
    fn default() -> Self {
        Self {
            latch: AnimationLatch::new(EffectKind::Death),
            mark_recorded: false,
        }
    }
}

impl DeathEffect {
    pub fn latch(&self) -> &AnimationLatch {
        &self.latch
    }

    pub fn mark_recorded(&self) -> bool {
        self.mark_recorded
    }

    /// Record the mark (once) and start the burst.
    ///
    /// The y is pulled up to `visible_floor` so fall deaths stay on screen.
    pub fn trigger(
        &mut self,
        at: Vec2,
        visible_floor: f32,
        marks: &mut Vec<DeathMark>,
        now_ms: f64,
        rng: &mut impl Rng,
    ) {
        let origin = Vec2::new(at.x, at.y.min(visible_floor));
        if !self.mark_recorded {
            marks.push(DeathMark {
                pos: origin,
                timestamp_ms: now_ms,
            });
            self.mark_recorded = true;
        }
        self.latch.start(origin, now_ms, &mut *rng);
    }

    pub fn update(&mut self, now_ms: f64) {
        self.latch.update(now_ms);
    }

    /// Clears the burst and the guard. Marks belong to the caller.
    pub fn reset(&mut self) {
        self.latch.reset();
        self.mark_recorded = false;
    }
}
