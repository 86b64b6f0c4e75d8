//! Phase state machine shared by every pooled entity.

use std::time::Duration;

use ar_summon_core::{ConfigError, Phase};

/// How long an entity stays in its [`Phase::Active`] stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sustain {
    /// Active for a fixed duration, followed by a fade.
    Fixed(Duration),
    /// Active until the elapsed time exceeds the provided lifetime; no fade.
    UntilLifetime(Duration),
}

/// Validated phase durations for one entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTimings {
    spawn: Duration,
    sustain: Sustain,
    fade: Duration,
}

impl PhaseTimings {
    /// Timings for a transient entity: expand, sustain for the remainder, then fade.
    ///
    /// The sustain duration is `total - spawn - fade`; a negative remainder is
    /// rejected.
    pub fn transient(spawn_ms: i64, total_ms: i64, fade_ms: i64) -> Result<Self, ConfigError> {
        let spawn = non_negative("spawn", spawn_ms)?;
        let _ = non_negative("total", total_ms)?;
        let fade = non_negative("fade", fade_ms)?;
        let remainder = total_ms - spawn_ms - fade_ms;
        if remainder < 0 {
            return Err(ConfigError::SustainUnderflow {
                total_ms,
                expand_ms: spawn_ms,
                fade_ms,
            });
        }
        Ok(Self {
            spawn,
            sustain: Sustain::Fixed(Duration::from_millis(remainder.unsigned_abs())),
            fade,
        })
    }

    /// Timings for a persistent entity that stays active until its lifetime ends.
    pub fn persistent(spawn_ms: i64, lifetime_ms: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            spawn: non_negative("spawn", spawn_ms)?,
            sustain: Sustain::UntilLifetime(non_negative("lifetime", lifetime_ms)?),
            fade: Duration::ZERO,
        })
    }

    /// Duration of the spawning phase.
    #[must_use]
    pub const fn spawn(&self) -> Duration {
        self.spawn
    }

    /// Sustain rule of the active phase.
    #[must_use]
    pub const fn sustain(&self) -> Sustain {
        self.sustain
    }

    /// Duration of the fading phase.
    #[must_use]
    pub const fn fade(&self) -> Duration {
        self.fade
    }

    /// Total lifetime after which the entity is expired.
    #[must_use]
    pub fn total(&self) -> Duration {
        match self.sustain {
            Sustain::Fixed(sustain) => self.spawn + sustain + self.fade,
            Sustain::UntilLifetime(lifetime) => lifetime,
        }
    }

    fn phase_at(&self, elapsed: Duration) -> Phase {
        match self.sustain {
            Sustain::Fixed(sustain) => {
                if elapsed < self.spawn {
                    Phase::Spawning
                } else if elapsed < self.spawn + sustain {
                    Phase::Active
                } else if elapsed < self.total() {
                    Phase::Fading
                } else {
                    Phase::Expired
                }
            }
            Sustain::UntilLifetime(lifetime) => {
                if elapsed > lifetime {
                    Phase::Expired
                } else if elapsed < self.spawn {
                    Phase::Spawning
                } else {
                    Phase::Active
                }
            }
        }
    }
}

fn non_negative(name: &'static str, millis: i64) -> Result<Duration, ConfigError> {
    u64::try_from(millis)
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::NegativeDuration { name, millis })
}

/// Phase change reported by a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase before the change.
    pub from: Phase,
    /// Phase after the change.
    pub to: Phase,
}

/// Per-entity phase state machine.
///
/// The phase only ever moves forward and the recorded elapsed time never
/// exceeds the total lifetime.
#[derive(Clone, Debug)]
pub struct PhaseController {
    timings: PhaseTimings,
    phase: Phase,
    elapsed: Duration,
}

impl PhaseController {
    /// Creates a controller in the spawning phase.
    #[must_use]
    pub fn new(timings: PhaseTimings) -> Self {
        let mut controller = Self {
            timings,
            phase: Phase::Spawning,
            elapsed: Duration::ZERO,
        };
        let _ = controller.advance(Duration::ZERO);
        controller
    }

    /// Timings the controller was built with.
    #[must_use]
    pub const fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Elapsed time recorded at the last advance, clamped to the total lifetime.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Reports whether the controller reached [`Phase::Expired`].
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Expired
    }

    /// Moves the controller to the phase matching the entity's age.
    ///
    /// Advancing an expired controller is a no-op. Ages earlier than the last
    /// recorded one never move the phase backwards.
    pub fn advance(&mut self, age: Duration) -> Option<PhaseTransition> {
        if self.is_expired() {
            return None;
        }
        let age = age.max(self.elapsed);
        let target = self.timings.phase_at(age).max(self.phase);
        self.elapsed = age.min(self.timings.total());
        self.transition_to(target)
    }

    /// Forces the controller into [`Phase::Expired`].
    pub fn expire(&mut self) -> Option<PhaseTransition> {
        self.transition_to(Phase::Expired)
    }

    /// Progress through the current phase in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let spawn = self.timings.spawn;
        match self.phase {
            Phase::Spawning => ratio(self.elapsed, spawn),
            Phase::Active => match self.timings.sustain {
                Sustain::Fixed(sustain) => ratio(self.elapsed.saturating_sub(spawn), sustain),
                Sustain::UntilLifetime(lifetime) => ratio(
                    self.elapsed.saturating_sub(spawn),
                    lifetime.saturating_sub(spawn),
                ),
            },
            Phase::Fading => {
                let fade_start = self.timings.total().saturating_sub(self.timings.fade);
                ratio(self.elapsed.saturating_sub(fade_start), self.timings.fade)
            }
            Phase::Expired => 1.0,
        }
    }

    fn transition_to(&mut self, target: Phase) -> Option<PhaseTransition> {
        if target <= self.phase {
            return None;
        }
        let from = self.phase;
        self.phase = target;
        Some(PhaseTransition { from, to: target })
    }
}

fn ratio(part: Duration, whole: Duration) -> f32 {
    if whole.is_zero() {
        return 1.0;
    }
    (part.as_secs_f32() / whole.as_secs_f32()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn effect_timings() -> PhaseTimings {
        PhaseTimings::transient(800, 3000, 500).expect("valid timings")
    }

    #[test]
    fn transient_timings_compute_sustain_remainder() {
        let timings = effect_timings();
        assert_eq!(timings.sustain(), Sustain::Fixed(ms(1700)));
        assert_eq!(timings.total(), ms(3000));
    }

    #[test]
    fn negative_durations_are_rejected() {
        assert_eq!(
            PhaseTimings::transient(-1, 3000, 500),
            Err(ConfigError::NegativeDuration {
                name: "spawn",
                millis: -1
            })
        );
        assert_eq!(
            PhaseTimings::persistent(600, -8000),
            Err(ConfigError::NegativeDuration {
                name: "lifetime",
                millis: -8000
            })
        );
        assert!(matches!(
            PhaseTimings::transient(800, 1000, 500),
            Err(ConfigError::SustainUnderflow { .. })
        ));
    }

    #[test]
    fn transient_controller_walks_every_phase() {
        let mut controller = PhaseController::new(effect_timings());
        assert_eq!(controller.advance(ms(400)), None);
        assert_eq!(controller.phase(), Phase::Spawning);
        assert!((controller.progress() - 0.5).abs() < 1e-6);

        assert_eq!(
            controller.advance(ms(2000)),
            Some(PhaseTransition {
                from: Phase::Spawning,
                to: Phase::Active
            })
        );
        assert_eq!(controller.advance(ms(2900)).map(|t| t.to), Some(Phase::Fading));
        assert!((controller.progress() - 0.8).abs() < 1e-4);
        assert_eq!(controller.advance(ms(3001)).map(|t| t.to), Some(Phase::Expired));
        assert_eq!(controller.elapsed(), ms(3000));
    }

    #[test]
    fn persistent_controller_expires_strictly_after_lifetime() {
        let mut controller =
            PhaseController::new(PhaseTimings::persistent(600, 8000).expect("valid timings"));
        let _ = controller.advance(ms(8000));
        assert_eq!(controller.phase(), Phase::Active);
        assert_eq!(
            controller.advance(ms(8001)),
            Some(PhaseTransition {
                from: Phase::Active,
                to: Phase::Expired
            })
        );
    }

    #[test]
    fn phases_never_regress() {
        let mut controller = PhaseController::new(effect_timings());
        let mut previous = controller.phase();
        for age in [0, 900, 300, 2600, 100, 2999, 1200, 3500, 0] {
            let _ = controller.advance(ms(age));
            assert!(controller.phase() >= previous, "regressed at {age} ms");
            assert!(controller.elapsed() <= controller.timings().total());
            previous = controller.phase();
        }
        assert_eq!(previous, Phase::Expired);
    }

    #[test]
    fn expired_controller_ignores_updates() {
        let mut controller = PhaseController::new(effect_timings());
        assert!(controller.expire().is_some());
        assert_eq!(controller.expire(), None);
        assert_eq!(controller.advance(ms(10)), None);
        assert_eq!(controller.elapsed(), Duration::ZERO);
    }

    #[test]
    fn zero_spawn_starts_active() {
        let controller =
            PhaseController::new(PhaseTimings::persistent(0, 1000).expect("valid timings"));
        assert_eq!(controller.phase(), Phase::Active);
    }
}
