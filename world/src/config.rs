//! Serializable world configuration.

use ar_summon_core::{ConfigError, EntityKind};
use serde::{Deserialize, Serialize};

use crate::phase::PhaseTimings;

/// Configuration of every pool and entity kind in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Seed of the world's random source.
    pub seed: u64,
    /// Summoning circle settings.
    pub effect: EffectConfig,
    /// Creature settings.
    pub creature: CreatureConfig,
    /// Egg settings.
    pub egg: EggConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_a11c_e5ca_1ab5,
            effect: EffectConfig::default(),
            creature: CreatureConfig::default(),
            egg: EggConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Checks every setting, reporting the first configuration error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.effect.timings()?;
        let _ = self.creature.timings()?;
        let _ = self.egg.timings()?;
        for (kind, capacity) in [
            (EntityKind::Effect, self.effect.capacity),
            (EntityKind::Creature, self.creature.capacity),
            (EntityKind::Egg, self.egg.capacity),
        ] {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity { kind });
            }
        }
        let _ = millis_range("jump_interval_ms", self.creature.jump_interval_ms)?;
        let _ = millis_range("jump_duration_ms", self.creature.jump_duration_ms)?;
        let _ = non_negative("sway_restore_ms", self.egg.sway_restore_ms)?;
        Ok(())
    }
}

/// Summoning circle settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    /// Maximum number of simultaneous circles.
    pub capacity: usize,
    /// Diameter at full expansion.
    pub size: f32,
    /// Total lifetime in milliseconds.
    pub duration_ms: i64,
    /// Expansion duration in milliseconds.
    pub expand_ms: i64,
    /// Fade duration in milliseconds.
    pub fade_ms: i64,
    /// Glow radius at full intensity.
    pub glow: f32,
    /// Rotation speed in radians per second.
    pub rotation_speed: f32,
    /// Pulse speed in radians per second.
    pub pulse_speed: f32,
    /// Number of orbiting satellites.
    pub satellites: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            size: 160.0,
            duration_ms: 3_000,
            expand_ms: 800,
            fade_ms: 500,
            glow: 60.0,
            rotation_speed: 0.9,
            pulse_speed: 4.8,
            satellites: 15,
        }
    }
}

impl EffectConfig {
    /// Validated phase timings.
    pub fn timings(&self) -> Result<PhaseTimings, ConfigError> {
        PhaseTimings::transient(self.expand_ms, self.duration_ms, self.fade_ms)
    }
}

/// Creature settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreatureConfig {
    /// Maximum number of simultaneous creatures.
    pub capacity: usize,
    /// Body size, also the inset applied to jump targets.
    pub size: f32,
    /// Lifetime in milliseconds.
    pub lifetime_ms: i64,
    /// Spawn animation duration in milliseconds.
    pub spawn_ms: i64,
    /// Nominal jump height; each jump scales it by a factor in `0.7..1.3`.
    pub jump_height: f32,
    /// Maximum jump distance.
    pub jump_distance: f32,
    /// Range of waits between jumps in milliseconds.
    pub jump_interval_ms: [i64; 2],
    /// Range of jump durations in milliseconds.
    pub jump_duration_ms: [i64; 2],
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            size: 30.0,
            lifetime_ms: 8_000,
            spawn_ms: 600,
            jump_height: 80.0,
            jump_distance: 120.0,
            jump_interval_ms: [2_000, 4_000],
            jump_duration_ms: [800, 1_400],
        }
    }
}

impl CreatureConfig {
    /// Validated phase timings.
    pub fn timings(&self) -> Result<PhaseTimings, ConfigError> {
        PhaseTimings::persistent(self.spawn_ms, self.lifetime_ms)
    }
}

/// Egg settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EggConfig {
    /// Maximum number of simultaneous eggs.
    pub capacity: usize,
    /// Egg size.
    pub size: f32,
    /// Lifetime in milliseconds.
    pub lifetime_ms: i64,
    /// Spawn animation duration in milliseconds.
    pub spawn_ms: i64,
    /// Resting sway amplitude in radians.
    pub sway_amount: f32,
    /// Sway speed in radians per second.
    pub sway_speed: f32,
    /// Colour and scale pulse speed in radians per second.
    pub pulse_speed: f32,
    /// Radius within which a tap hits an egg.
    pub tap_radius: f32,
    /// Delay after which a tap reaction is reset, in milliseconds.
    pub sway_restore_ms: i64,
}

impl Default for EggConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            size: 40.0,
            lifetime_ms: 15_000,
            spawn_ms: 1_000,
            sway_amount: 0.3,
            sway_speed: 3.0,
            pulse_speed: 4.8,
            tap_radius: 30.0,
            sway_restore_ms: 1_000,
        }
    }
}

impl EggConfig {
    /// Validated phase timings.
    pub fn timings(&self) -> Result<PhaseTimings, ConfigError> {
        PhaseTimings::persistent(self.spawn_ms, self.lifetime_ms)
    }
}

pub(crate) fn non_negative(name: &'static str, millis: i64) -> Result<u64, ConfigError> {
    u64::try_from(millis).map_err(|_| ConfigError::NegativeDuration { name, millis })
}

pub(crate) fn millis_range(name: &'static str, range: [i64; 2]) -> Result<[u64; 2], ConfigError> {
    let low = non_negative(name, range[0])?;
    let high = non_negative(name, range[1])?;
    if low > high {
        return Err(ConfigError::InvertedRange {
            name,
            low: low as f32,
            high: high as f32,
        });
    }
    Ok([low, high])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(WorldConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config = WorldConfig::default();
        config.egg.capacity = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCapacity {
                kind: EntityKind::Egg
            })
        );
    }

    #[test]
    fn rejects_negative_lifetime() {
        let mut config = WorldConfig::default();
        config.creature.lifetime_ms = -5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeDuration {
                name: "lifetime",
                millis: -5
            })
        );
    }

    #[test]
    fn rejects_inverted_jump_interval() {
        let mut config = WorldConfig::default();
        config.creature.jump_interval_ms = [4_000, 2_000];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                name: "jump_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn rejects_effect_phases_longer_than_total() {
        let mut config = WorldConfig::default();
        config.effect.duration_ms = 1_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SustainUnderflow { .. })
        ));
    }
}
