//! Session configuration loaded from TOML.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result as AnyResult};
use ar_summon_core::gesture::MIN_LONG_PRESS;
use ar_summon_system_performance::PerformanceConfig;
use ar_summon_system_playback::{CategoryGains, PlaybackConfig};
use ar_summon_system_projection::CameraConfig;
use ar_summon_world::config::WorldConfig;
use serde::Deserialize;

/// Every tunable of a headless session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    pub(crate) world: WorldConfig,
    pub(crate) audio: AudioConfig,
    pub(crate) camera: CameraConfig,
    pub(crate) performance: PerformanceConfig,
    pub(crate) input: InputConfig,
}

/// Synthesis and playback settings.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AudioConfig {
    pub(crate) sample_rate: u32,
    pub(crate) enabled: bool,
    pub(crate) master_volume: f32,
    pub(crate) gains: CategoryGains,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let playback = PlaybackConfig::default();
        Self {
            sample_rate: 44_100,
            enabled: playback.enabled,
            master_volume: playback.master_volume,
            gains: playback.gains,
        }
    }
}

impl AudioConfig {
    pub(crate) fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            enabled: self.enabled,
            master_volume: self.master_volume,
            gains: self.gains,
        }
    }
}

/// Gesture recognition settings.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct InputConfig {
    pub(crate) long_press_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            long_press_ms: MIN_LONG_PRESS.as_millis() as u64,
        }
    }
}

impl InputConfig {
    pub(crate) fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl SessionConfig {
    /// Reads a configuration file, falling back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> AnyResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load session config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> AnyResult<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse session config toml contents")?;
        config
            .world
            .validate()
            .context("world section is invalid")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SessionConfig::parse("").expect("defaults");
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.audio.playback(), PlaybackConfig::default());
        assert_eq!(config.input.long_press(), Duration::from_millis(500));
    }

    #[test]
    fn sections_override_defaults() {
        let config = SessionConfig::parse(
            r#"
            [world]
            seed = 99

            [world.creature]
            capacity = 8

            [audio]
            sample_rate = 22050
            master_volume = 0.4

            [audio.gains]
            ui = 0.1

            [camera]
            viewport_width = 640.0
            viewport_height = 480.0

            [performance]
            auto_adjust = false

            [input]
            long_press_ms = 650
            "#,
        )
        .expect("valid config");

        assert_eq!(config.world.seed, 99);
        assert_eq!(config.world.creature.capacity, 8);
        assert_eq!(config.audio.sample_rate, 22_050);
        assert_eq!(config.audio.playback().master_volume, 0.4);
        assert_eq!(config.audio.gains.ui, 0.1);
        assert_eq!(config.audio.gains.effect, 0.8);
        assert_eq!(config.camera.viewport_width, 640.0);
        assert!(!config.performance.auto_adjust);
        assert_eq!(config.input.long_press_ms, 650);
    }

    #[test]
    fn invalid_world_section_is_rejected() {
        let error = SessionConfig::parse("[world.egg]\ncapacity = 0\n").expect_err("zero capacity");
        assert!(format!("{error:#}").contains("world section is invalid"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SessionConfig::parse("[audio]\nvolume = 1.0\n").is_err());
    }
}
