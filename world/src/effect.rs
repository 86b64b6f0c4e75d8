//! Summoning circle that precedes every summon.

use std::time::Duration;

use ar_summon_core::{easing::Easing, Phase};
use glam::Vec2;
use rand::Rng;

use crate::{
    config::EffectConfig,
    phase::{PhaseController, PhaseTimings, PhaseTransition},
    pool::{EntityBehaviour, Positioned},
    satellites::{SatelliteParticleSet, SatellitePoint, SatelliteStyle},
    TickContext, Transform,
};

/// Transient circle that expands, pulses, fades and then completes.
#[derive(Clone, Debug)]
pub struct Effect {
    position: Vec2,
    created_at: Duration,
    settings: EffectConfig,
    controller: PhaseController,
    size: f32,
    opacity: f32,
    glow: f32,
    rotation: f32,
    pulse_phase: f32,
    satellites: SatelliteParticleSet,
}

impl Effect {
    pub(crate) fn new<R: Rng + ?Sized>(
        position: Vec2,
        created_at: Duration,
        settings: EffectConfig,
        timings: PhaseTimings,
        rng: &mut R,
    ) -> Self {
        let satellites = SatelliteParticleSet::new(
            &SatelliteStyle::effect_ring(settings.satellites),
            settings.size,
            rng,
        );
        Self {
            position,
            created_at,
            settings,
            controller: PhaseController::new(timings),
            size: 0.0,
            opacity: 0.0,
            glow: 0.0,
            rotation: 0.0,
            pulse_phase: 0.0,
            satellites,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Time elapsed since the circle was created, clamped to its lifetime.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.controller.elapsed()
    }

    /// Current diameter.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Current opacity.
    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Current glow radius.
    #[must_use]
    pub const fn glow(&self) -> f32 {
        self.glow
    }

    /// Current rotation in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Samples the orbiting satellites.
    #[must_use]
    pub fn satellites(&self) -> Vec<SatellitePoint> {
        self.satellites
            .sample(self.controller.elapsed(), self.pulse_phase, self.opacity)
    }

    /// Render transform derived from the animation state.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position.extend(0.0),
            scale: ratio(self.size, self.settings.size),
            rotation: self.rotation,
            opacity: self.opacity,
            color_blend: ratio(self.glow, self.settings.glow),
        }
    }

    /// Advances the animation; a transition into `Expired` marks natural completion.
    pub(crate) fn update(&mut self, ctx: &TickContext) -> Option<PhaseTransition> {
        if self.controller.is_expired() {
            return None;
        }
        let transition = self
            .controller
            .advance(ctx.now.saturating_sub(self.created_at));
        let progress = self.controller.progress();
        match self.controller.phase() {
            Phase::Spawning => {
                let eased = Easing::OutQuart.apply(progress);
                self.size = self.settings.size * eased;
                self.opacity = eased;
                self.glow = self.settings.glow * eased;
            }
            Phase::Active => {
                self.size = self.settings.size;
                self.opacity = 0.8 + 0.2 * self.pulse_phase.sin();
                self.glow = self.settings.glow * self.opacity;
            }
            Phase::Fading => {
                let remaining = 1.0 - progress;
                self.size = self.settings.size;
                self.opacity = 0.8 * remaining;
                self.glow = self.settings.glow * remaining;
            }
            Phase::Expired => {
                self.opacity = 0.0;
                self.glow = 0.0;
                return transition;
            }
        }
        let dt = ctx.dt.as_secs_f32();
        self.rotation += self.settings.rotation_speed * dt;
        self.pulse_phase += self.settings.pulse_speed * dt;
        transition
    }
}

fn ratio(value: f32, full: f32) -> f32 {
    if full > 0.0 {
        value / full
    } else {
        0.0
    }
}

impl Positioned for Effect {
    fn position(&self) -> Vec2 {
        self.position
    }
}

impl EntityBehaviour for Effect {
    fn reset(&mut self) {}

    fn intensify(&mut self) -> Option<Duration> {
        None
    }

    fn destroy(&mut self) -> Option<PhaseTransition> {
        self.opacity = 0.0;
        self.glow = 0.0;
        self.controller.expire()
    }
}
