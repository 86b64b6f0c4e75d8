//! Hopping creature that relocates around the scene.

use std::{
    f32::consts::{PI, TAU},
    time::Duration,
};

use ar_summon_core::{easing::Easing, Bounds, ConfigError, Phase};
use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{millis_range, CreatureConfig},
    phase::{PhaseController, PhaseTimings, PhaseTransition},
    pool::{EntityBehaviour, Positioned},
    TickContext, Transform,
};

const MIN_ANNULUS_DISTANCE: f32 = 50.0;
const SWEEP_VERTICAL_JITTER: f32 = 30.0;
const IDLE_PULSE_SPEED: f32 = 6.0;

/// Rule used to pick jump targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementPattern {
    /// Uniform offset up to the jump distance on both axes.
    RandomOffset,
    /// Random direction at a distance between 50 units and the jump distance.
    Annulus,
    /// Full jump distance left or right, following a slow clock-driven sweep.
    Sweep,
}

impl MovementPattern {
    const ALL: [MovementPattern; 3] = [Self::RandomOffset, Self::Annulus, Self::Sweep];
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CreatureSettings {
    config: CreatureConfig,
    timings: PhaseTimings,
    interval_ms: [u64; 2],
    duration_ms: [u64; 2],
}

impl CreatureSettings {
    pub(crate) fn from_config(config: &CreatureConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: *config,
            timings: config.timings()?,
            interval_ms: millis_range("jump_interval_ms", config.jump_interval_ms)?,
            duration_ms: millis_range("jump_duration_ms", config.jump_duration_ms)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Jump {
    from: Vec2,
    to: Vec2,
    started_at: Duration,
    duration: Duration,
    height: f32,
}

/// Creature that idles, hops to new targets and leaves when its lifetime ends.
#[derive(Clone, Debug)]
pub struct Creature {
    position: Vec2,
    height: f32,
    rotation: f32,
    scale: f32,
    opacity: f32,
    color_blend: f32,
    idle_phase: f32,
    created_at: Duration,
    settings: CreatureSettings,
    controller: PhaseController,
    pattern: MovementPattern,
    move_timer: Duration,
    move_interval: Duration,
    jump: Option<Jump>,
    jump_requested: bool,
    rng: ChaCha8Rng,
}

impl Creature {
    pub(crate) fn new(
        position: Vec2,
        created_at: Duration,
        settings: CreatureSettings,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pattern = *MovementPattern::ALL
            .choose(&mut rng)
            .unwrap_or(&MovementPattern::RandomOffset);
        let rotation = rng.gen_range(0.0..TAU);
        let idle_phase = rng.gen_range(0.0..TAU);
        let move_interval = random_millis(&mut rng, settings.interval_ms);
        Self {
            position,
            height: 0.0,
            rotation,
            scale: 0.0,
            opacity: 0.0,
            color_blend: 0.0,
            idle_phase,
            created_at,
            settings,
            controller: PhaseController::new(settings.timings),
            pattern,
            move_timer: Duration::ZERO,
            move_interval,
            jump: None,
            jump_requested: false,
            rng,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Movement pattern chosen at spawn.
    #[must_use]
    pub const fn pattern(&self) -> MovementPattern {
        self.pattern
    }

    /// Height above the placement plane.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Reports whether a jump is in progress.
    #[must_use]
    pub const fn is_jumping(&self) -> bool {
        self.jump.is_some()
    }

    /// Target of the jump in progress.
    #[must_use]
    pub fn jump_target(&self) -> Option<Vec2> {
        self.jump.map(|jump| jump.to)
    }

    /// Render transform derived from the animation state.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position.extend(self.height),
            scale: self.scale,
            rotation: self.rotation,
            opacity: self.opacity,
            color_blend: self.color_blend,
        }
    }

    /// Starts a jump towards `target`, unless a jump is already in progress.
    pub fn force_jump(&mut self, target: Vec2, now: Duration) -> bool {
        if self.jump.is_some() || self.controller.is_expired() {
            return false;
        }
        let duration = random_millis(&mut self.rng, self.settings.duration_ms);
        let nominal = self.settings.config.jump_height;
        let height = self.rng.gen_range(0.7_f32..=1.3) * nominal;
        self.jump = Some(Jump {
            from: self.position,
            to: target,
            started_at: now,
            duration,
            height,
        });
        true
    }

    /// Advances the creature; leaving the display region expires it immediately.
    pub(crate) fn update(&mut self, ctx: &TickContext) -> Option<PhaseTransition> {
        if self.controller.is_expired() {
            return None;
        }
        let mut transition = self
            .controller
            .advance(ctx.now.saturating_sub(self.created_at));
        if self.controller.is_expired() {
            return transition;
        }

        let dt = ctx.dt.as_secs_f32();
        if self.controller.phase() == Phase::Spawning {
            let progress = self.controller.progress();
            self.opacity = progress;
            self.scale = Easing::OutBounce.apply(progress);
            self.color_blend = 0.3 * (progress * PI * 8.0).sin();
        } else {
            self.opacity = 1.0;
            self.scale = 1.0;
        }

        if self.jump.is_some() {
            self.advance_jump(ctx.now);
        } else {
            self.move_timer += ctx.dt;
            if self.jump_requested || self.move_timer >= self.move_interval {
                self.jump_requested = false;
                self.move_timer = Duration::ZERO;
                self.move_interval = random_millis(&mut self.rng, self.settings.interval_ms);
                let target = self.pick_target(ctx.now, &ctx.bounds);
                let _ = self.force_jump(target, ctx.now);
            }
        }

        if self.jump.is_none() {
            self.idle_phase += IDLE_PULSE_SPEED * dt;
            if self.controller.phase() != Phase::Spawning {
                self.color_blend = 0.1 * self.idle_phase.sin();
            }
        }

        let margin = self.settings.config.size * 2.0;
        if !ctx.bounds.contains_with_margin(self.position, margin) {
            transition = match (transition, self.controller.expire()) {
                (Some(first), Some(last)) => Some(PhaseTransition {
                    from: first.from,
                    to: last.to,
                }),
                (first, last) => last.or(first),
            };
        }
        transition
    }

    fn advance_jump(&mut self, now: Duration) {
        let Some(jump) = self.jump else {
            return;
        };
        let elapsed = now.saturating_sub(jump.started_at);
        let progress = if jump.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f32() / jump.duration.as_secs_f32()
        };
        if progress >= 1.0 {
            self.position = jump.to;
            self.height = 0.0;
            self.jump = None;
            return;
        }
        let eased = Easing::InOutSine.apply(progress);
        self.position = jump.from.lerp(jump.to, eased);
        self.height = jump.height * (PI * progress).sin();
        self.rotation = TAU * progress;
    }

    fn pick_target(&mut self, now: Duration, bounds: &Bounds) -> Vec2 {
        let reach = self.settings.config.jump_distance;
        let offset = match self.pattern {
            MovementPattern::RandomOffset => Vec2::new(
                self.rng.gen_range(-reach..=reach),
                self.rng.gen_range(-reach..=reach),
            ),
            MovementPattern::Annulus => {
                let angle = self.rng.gen_range(0.0..TAU);
                let distance = self
                    .rng
                    .gen_range(MIN_ANNULUS_DISTANCE.min(reach)..=reach);
                Vec2::from_angle(angle) * distance
            }
            MovementPattern::Sweep => {
                let direction = if now.as_secs_f32().sin() > 0.0 {
                    1.0
                } else {
                    -1.0
                };
                Vec2::new(
                    direction * reach,
                    self.rng
                        .gen_range(-SWEEP_VERTICAL_JITTER..=SWEEP_VERTICAL_JITTER),
                )
            }
        };
        bounds.clamp_inset(self.position + offset, self.settings.config.size)
    }
}

fn random_millis<R: Rng + ?Sized>(rng: &mut R, range: [u64; 2]) -> Duration {
    Duration::from_millis(rng.gen_range(range[0]..=range[1]))
}

impl Positioned for Creature {
    fn position(&self) -> Vec2 {
        self.position
    }
}

impl EntityBehaviour for Creature {
    fn reset(&mut self) {
        self.jump_requested = false;
    }

    fn intensify(&mut self) -> Option<Duration> {
        if self.jump.is_none() {
            self.jump_requested = true;
        }
        None
    }

    fn destroy(&mut self) -> Option<PhaseTransition> {
        self.controller.expire()
    }
}
