//! Swaying egg that idles until its lifetime ends.

use std::{f32::consts::TAU, time::Duration};

use ar_summon_core::{easing::Easing, ConfigError, Phase};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{non_negative, EggConfig},
    phase::{PhaseController, PhaseTimings, PhaseTransition},
    pool::{EntityBehaviour, Positioned},
    satellites::{SatelliteParticleSet, SatellitePoint, SatelliteStyle},
    TickContext, Transform,
};

const CRACK_PROBABILITY: f64 = 0.002;
const SPARK_PROBABILITY: f64 = 0.001;
const CRACK_THRESHOLD: f32 = 0.75;
const SPARK_COUNT: usize = 5;
const SPARK_LIFE_TICKS: u32 = 60;
const HEARTBEAT_SPEED: f32 = 4.8;
const HEARTBEAT_SCALE: f32 = 0.15;
const TAP_HEARTBEAT: f32 = 0.3;
const COLOR_PULSE_DEPTH: f32 = 0.3;
const SCALE_PULSE_DEPTH: f32 = 0.05;
const BOB_HEIGHT: f32 = 2.0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct EggSettings {
    config: EggConfig,
    timings: PhaseTimings,
    restore_after: Duration,
}

impl EggSettings {
    pub(crate) fn from_config(config: &EggConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: *config,
            timings: config.timings()?,
            restore_after: Duration::from_millis(non_negative(
                "sway_restore_ms",
                config.sway_restore_ms,
            )?),
        })
    }
}

/// Cosmetic crack drawn on the shell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crack {
    /// Angle on the shell where the crack starts.
    pub start_angle: f32,
    /// Crack length.
    pub length: f32,
    /// Crack opacity.
    pub opacity: f32,
    /// Stroke width.
    pub width: f32,
}

/// Short-lived glowing particle counted in ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spark {
    /// Offset from the egg's centre.
    pub offset: Vec2,
    /// Spark size.
    pub size: f32,
    life: u32,
}

impl Spark {
    /// Remaining life in ticks.
    #[must_use]
    pub const fn life(&self) -> u32 {
        self.life
    }

    /// Opacity fading out with the remaining life.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.life as f32 / SPARK_LIFE_TICKS as f32
    }
}

/// Per-tick outcome of an egg update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct EggStep {
    pub(crate) transition: Option<PhaseTransition>,
    pub(crate) cracks_added: usize,
}

/// Egg that sways, pulses and reacts to taps.
#[derive(Clone, Debug)]
pub struct Egg {
    anchor: Vec2,
    bob: f32,
    rotation: f32,
    scale: f32,
    opacity: f32,
    color_blend: f32,
    heartbeat: f32,
    heartbeat_boost: f32,
    sway_phase: f32,
    sway_amount: f32,
    pulse_phase: f32,
    heartbeat_phase: f32,
    cracks: Vec<Crack>,
    sparks: Vec<Spark>,
    satellites: SatelliteParticleSet,
    created_at: Duration,
    settings: EggSettings,
    controller: PhaseController,
    rng: ChaCha8Rng,
}

impl Egg {
    pub(crate) fn new(anchor: Vec2, created_at: Duration, settings: EggSettings, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let satellites =
            SatelliteParticleSet::new(&SatelliteStyle::egg_ambient(), settings.config.size, &mut rng);
        let sway_phase = rng.gen_range(0.0..TAU);
        let pulse_phase = rng.gen_range(0.0..TAU);
        Self {
            anchor,
            bob: 0.0,
            rotation: 0.0,
            scale: 0.0,
            opacity: 0.0,
            color_blend: 0.0,
            heartbeat: 0.0,
            heartbeat_boost: 0.0,
            sway_phase,
            sway_amount: settings.config.sway_amount,
            pulse_phase,
            heartbeat_phase: 0.0,
            cracks: Vec::new(),
            sparks: Vec::new(),
            satellites,
            created_at,
            settings,
            controller: PhaseController::new(settings.timings),
            rng,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Current sway amplitude in radians.
    #[must_use]
    pub const fn sway_amount(&self) -> f32 {
        self.sway_amount
    }

    /// Heartbeat glow intensity.
    #[must_use]
    pub const fn heartbeat(&self) -> f32 {
        self.heartbeat
    }

    /// Cracks accumulated on the shell.
    #[must_use]
    pub fn cracks(&self) -> &[Crack] {
        &self.cracks
    }

    /// Live spark particles.
    #[must_use]
    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    /// Samples the ambient satellites.
    #[must_use]
    pub fn satellites(&self) -> Vec<SatellitePoint> {
        self.satellites
            .sample(self.controller.elapsed(), self.pulse_phase, self.opacity)
    }

    /// Render transform derived from the animation state.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform {
            position: (self.anchor + Vec2::new(0.0, self.bob)).extend(0.0),
            scale: self.scale,
            rotation: self.rotation,
            opacity: self.opacity,
            color_blend: self.color_blend,
        }
    }

    pub(crate) fn update(&mut self, ctx: &TickContext) -> EggStep {
        if self.controller.is_expired() {
            return EggStep::default();
        }
        let age = ctx.now.saturating_sub(self.created_at);
        let transition = self.controller.advance(age);
        if self.controller.is_expired() {
            return EggStep {
                transition,
                cracks_added: 0,
            };
        }

        let dt = ctx.dt.as_secs_f32();
        let spawn_scale = if self.controller.phase() == Phase::Spawning {
            let progress = self.controller.progress();
            self.opacity = progress;
            Easing::OutBounce.apply(progress)
        } else {
            self.opacity = 1.0;
            1.0
        };

        self.sway_phase += self.settings.config.sway_speed * dt;
        self.rotation = self.sway_phase.sin() * self.sway_amount;
        self.bob = BOB_HEIGHT * (self.sway_phase * 0.7).sin();

        self.pulse_phase += self.settings.config.pulse_speed * dt;
        let pulse = (self.pulse_phase.sin() + 1.0) * 0.5;
        self.color_blend = COLOR_PULSE_DEPTH * pulse;
        self.scale = spawn_scale * (1.0 + SCALE_PULSE_DEPTH * pulse);

        self.heartbeat_phase += HEARTBEAT_SPEED * dt;
        let rhythm = ((self.heartbeat_phase * 2.0).sin() * self.heartbeat_phase.sin()).max(0.0)
            * HEARTBEAT_SCALE;
        self.heartbeat_boost = (self.heartbeat_boost - TAP_HEARTBEAT * dt).max(0.0);
        self.heartbeat = rhythm.max(self.heartbeat_boost);

        self.sparks.retain_mut(|spark| {
            spark.life = spark.life.saturating_sub(1);
            spark.life > 0
        });

        let lifetime = self.controller.timings().total().as_secs_f32();
        let mut cracks_added = 0;
        if age.as_secs_f32() > lifetime * CRACK_THRESHOLD && self.rng.gen_bool(CRACK_PROBABILITY) {
            cracks_added = self.add_cracks();
        }
        if self.rng.gen_bool(SPARK_PROBABILITY) {
            self.emit_sparks();
        }

        EggStep {
            transition,
            cracks_added,
        }
    }

    fn add_cracks(&mut self) -> usize {
        let count = self.rng.gen_range(2..=4);
        for _ in 0..count {
            let crack = Crack {
                start_angle: self.rng.gen_range(0.0..TAU),
                length: self.rng.gen_range(10.0..20.0),
                opacity: self.rng.gen_range(0.5..0.8),
                width: self.rng.gen_range(1.0..2.0),
            };
            self.cracks.push(crack);
        }
        count
    }

    fn emit_sparks(&mut self) {
        let half = self.settings.config.size / 2.0;
        for _ in 0..SPARK_COUNT {
            let spark = Spark {
                offset: Vec2::new(
                    self.rng.gen_range(-half..=half),
                    self.rng.gen_range(-half..=half),
                ),
                size: self.rng.gen_range(2.0..4.0),
                life: SPARK_LIFE_TICKS,
            };
            self.sparks.push(spark);
        }
    }
}

impl Positioned for Egg {
    fn position(&self) -> Vec2 {
        self.anchor + Vec2::new(0.0, self.bob)
    }
}

impl EntityBehaviour for Egg {
    fn reset(&mut self) {
        self.sway_amount = self.settings.config.sway_amount;
        self.heartbeat_boost = 0.0;
    }

    fn intensify(&mut self) -> Option<Duration> {
        if self.controller.is_expired() {
            return None;
        }
        self.heartbeat_boost = TAP_HEARTBEAT;
        self.heartbeat = self.heartbeat.max(TAP_HEARTBEAT);
        self.emit_sparks();
        self.sway_amount = self.settings.config.sway_amount * 2.0;
        Some(self.settings.restore_after)
    }

    fn destroy(&mut self) -> Option<PhaseTransition> {
        self.controller.expire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ar_summon_core::Bounds;

    fn egg(seed: u64) -> Egg {
        let settings = EggSettings::from_config(&EggConfig::default()).expect("default settings");
        Egg::new(Vec2::new(10.0, 20.0), Duration::ZERO, settings, seed)
    }

    fn ctx(now_ms: u64, dt_ms: u64) -> TickContext {
        TickContext {
            now: Duration::from_millis(now_ms),
            dt: Duration::from_millis(dt_ms),
            bounds: Bounds::from_corners(Vec2::splat(-400.0), Vec2::splat(400.0)),
        }
    }

    #[test]
    fn sway_stays_within_amplitude_and_colour_within_pulse_depth() {
        let mut egg = egg(1);
        let mut now = 0;
        for _ in 0..200 {
            now += 16;
            let _ = egg.update(&ctx(now, 16));
            let transform = egg.transform();
            assert!(transform.rotation.abs() <= 0.3 + 1e-6);
            assert!((0.0..=0.3 + 1e-6).contains(&transform.color_blend));
            assert!((transform.position.y - 20.0).abs() <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn tap_reaction_intensifies_without_changing_phase() {
        let mut egg = egg(2);
        let _ = egg.update(&ctx(1_200, 1_200));
        assert_eq!(egg.phase(), Phase::Active);

        let restore = egg.intensify();
        assert_eq!(restore, Some(Duration::from_millis(1_000)));
        assert_eq!(egg.phase(), Phase::Active);
        assert!((egg.sway_amount() - 0.6).abs() < 1e-6);
        assert_eq!(egg.sparks().len(), SPARK_COUNT);
        assert!(egg.heartbeat() >= TAP_HEARTBEAT);

        let _ = egg.update(&ctx(1_700, 500));
        assert!(egg.heartbeat() >= 0.15 - 1e-6);

        egg.reset();
        assert!((egg.sway_amount() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn sparks_live_sixty_ticks() {
        let mut egg = egg(3);
        let _ = egg.intensify();
        let mut now = 0;
        for _ in 0..59 {
            now += 16;
            let _ = egg.update(&ctx(now, 16));
        }
        let expiring = egg.sparks().iter().filter(|spark| spark.life() == 1).count();
        assert_eq!(expiring, SPARK_COUNT);
        let before = egg.sparks().len();

        now += 16;
        let _ = egg.update(&ctx(now, 16));
        let fresh = egg
            .sparks()
            .iter()
            .filter(|spark| spark.life() == SPARK_LIFE_TICKS)
            .count();
        assert_eq!(egg.sparks().len(), before - expiring + fresh);
    }

    fn first_crack(seed: u64) -> Option<(u64, usize)> {
        let mut egg = egg(seed);
        let mut now = 0;
        while now + 16 <= 15_000 {
            now += 16;
            let step = egg.update(&ctx(now, 16));
            if step.cracks_added > 0 {
                return Some((now, step.cracks_added));
            }
        }
        assert_eq!(egg.phase(), Phase::Active);
        let step = egg.update(&ctx(15_001, 1));
        assert_eq!(step.transition.map(|t| t.to), Some(Phase::Expired));
        None
    }

    #[test]
    fn cracks_only_appear_late_in_life() {
        let cracked: Vec<(u64, usize)> = (0..40).filter_map(first_crack).collect();
        assert!(!cracked.is_empty(), "no egg cracked within its lifetime");
        for (at, count) in cracked {
            assert!(at > 11_250, "crack appeared at {at} ms");
            assert!((2..=4).contains(&count));
        }
    }
}
