#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-rate sampling and adaptive quality selection.
//!
//! The governor counts one frame per `TimeAdvanced` event, turns each full
//! sampling window into a frames-per-second figure and replies with
//! `SetQualityLevel` commands. The world stays the owner of the active level;
//! the governor mirrors it from `QualityChanged` events.

use std::time::Duration;

use ar_summon_core::{Command, Event, QualityLevel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Thresholds and sampling window of the governor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerformanceConfig {
    /// Samples below this rate step quality down one level.
    pub low_fps: u32,
    /// Samples above this rate restore full quality.
    pub high_fps: u32,
    /// Whether samples change the quality level at all.
    pub auto_adjust: bool,
    /// Length of a sampling window in milliseconds.
    pub window_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            low_fps: 20,
            high_fps: 35,
            auto_adjust: true,
            window_ms: 1_000,
        }
    }
}

/// Counts frames and reports the rate once per window.
#[derive(Clone, Debug)]
pub struct FrameRateSampler {
    window: Duration,
    window_start: Duration,
    frames: u64,
    last_fps: Option<u32>,
}

impl FrameRateSampler {
    /// Creates a sampler whose first window starts at `now`.
    #[must_use]
    pub fn new(window: Duration, now: Duration) -> Self {
        Self {
            window: window.max(Duration::from_millis(1)),
            window_start: now,
            frames: 0,
            last_fps: None,
        }
    }

    /// Records a rendered frame and returns the rate when a window closes.
    pub fn record_frame(&mut self, now: Duration) -> Option<u32> {
        self.frames += 1;
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < self.window {
            return None;
        }
        let elapsed_ms = elapsed.as_millis().max(1) as f64;
        let fps = (self.frames as f64 * 1_000.0 / elapsed_ms).round() as u32;
        self.frames = 0;
        self.window_start = now;
        self.last_fps = Some(fps);
        Some(fps)
    }

    /// Most recent completed sample.
    #[must_use]
    pub const fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }
}

/// Hysteresis controller choosing the quality level from sampled rates.
#[derive(Clone, Debug)]
pub struct PerformanceGovernor {
    config: PerformanceConfig,
    level: QualityLevel,
    sampler: FrameRateSampler,
}

impl PerformanceGovernor {
    /// Creates a governor starting at full quality.
    #[must_use]
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            level: QualityLevel::Normal,
            sampler: FrameRateSampler::new(Duration::from_millis(config.window_ms), Duration::ZERO),
        }
    }

    /// Level the governor believes is active.
    #[must_use]
    pub const fn level(&self) -> QualityLevel {
        self.level
    }

    /// Reports whether samples adjust the level.
    #[must_use]
    pub const fn auto_adjust(&self) -> bool {
        self.config.auto_adjust
    }

    /// Enables or disables automatic adjustment.
    pub fn set_auto_adjust(&mut self, enabled: bool) {
        self.config.auto_adjust = enabled;
    }

    /// Most recent completed rate sample.
    #[must_use]
    pub const fn last_fps(&self) -> Option<u32> {
        self.sampler.last_fps()
    }

    /// Feeds one rate sample, returning the new level when it changes.
    ///
    /// Low samples step down a single level per sample; a high sample jumps
    /// straight back to full quality.
    pub fn observe(&mut self, fps: u32) -> Option<QualityLevel> {
        if !self.config.auto_adjust {
            return None;
        }
        let next = if fps < self.config.low_fps {
            match self.level {
                QualityLevel::Normal => QualityLevel::Low,
                QualityLevel::Low | QualityLevel::Potato => QualityLevel::Potato,
            }
        } else if fps > self.config.high_fps {
            QualityLevel::Normal
        } else {
            self.level
        };
        if next == self.level {
            return None;
        }
        info!(fps, from = self.level.label(), to = next.label(), "quality_adjusted");
        self.level = next;
        Some(next)
    }

    /// Reports whether the frame with the provided index should be skipped.
    #[must_use]
    pub fn should_skip(&self, frame: u64) -> bool {
        self.level
            .skip_cadence()
            .is_some_and(|cadence| frame % cadence == 0)
    }

    /// Requests the next level in `Normal → Low → Potato` order, wrapping around.
    ///
    /// The governor keeps its current level until the world confirms the
    /// switch with a `QualityChanged` event.
    pub fn cycle(&mut self, out: &mut Vec<Command>) -> QualityLevel {
        let next = match self.level {
            QualityLevel::Normal => QualityLevel::Low,
            QualityLevel::Low => QualityLevel::Potato,
            QualityLevel::Potato => QualityLevel::Normal,
        };
        debug!(from = self.level.label(), to = next.label(), "quality_cycle_requested");
        out.push(Command::SetQualityLevel { level: next });
        next
    }

    /// Consumes world events and emits quality commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { now, .. } => {
                    if let Some(fps) = self.sampler.record_frame(*now) {
                        debug!(fps, "frame_rate_sampled");
                        if let Some(level) = self.observe(fps) {
                            out.push(Command::SetQualityLevel { level });
                        }
                    }
                }
                Event::QualityChanged { level } => self.level = *level,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_rounds_frames_over_elapsed_window() {
        let mut sampler = FrameRateSampler::new(Duration::from_secs(1), Duration::ZERO);
        let mut sample = None;
        for frame in 1..=31_u64 {
            sample = sampler.record_frame(Duration::from_millis(frame * 33));
        }
        // 31 frames over 1023 ms.
        assert_eq!(sample, Some(30));
        assert_eq!(sampler.last_fps(), Some(30));
    }

    #[test]
    fn sampler_is_silent_inside_a_window() {
        let mut sampler = FrameRateSampler::new(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(sampler.record_frame(Duration::from_millis(500)), None);
        assert_eq!(sampler.record_frame(Duration::from_millis(999)), None);
        assert_eq!(sampler.record_frame(Duration::from_millis(1_000)), Some(3));
    }

    #[test]
    fn mid_band_samples_hold_the_level() {
        let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
        assert_eq!(governor.observe(15), Some(QualityLevel::Low));
        assert_eq!(governor.observe(20), None);
        assert_eq!(governor.observe(35), None);
        assert_eq!(governor.level(), QualityLevel::Low);
    }

    #[test]
    fn disabled_auto_adjust_ignores_samples() {
        let mut governor = PerformanceGovernor::new(PerformanceConfig {
            auto_adjust: false,
            ..PerformanceConfig::default()
        });
        assert_eq!(governor.observe(5), None);
        governor.set_auto_adjust(true);
        assert_eq!(governor.observe(5), Some(QualityLevel::Low));
    }

    #[test]
    fn frame_skipping_follows_level_cadence() {
        let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
        assert!((0..12).all(|frame| !governor.should_skip(frame)));

        governor.handle(
            &[Event::QualityChanged {
                level: QualityLevel::Low,
            }],
            &mut Vec::new(),
        );
        let skipped: Vec<u64> = (1..=9).filter(|f| governor.should_skip(*f)).collect();
        assert_eq!(skipped, vec![3, 6, 9]);

        governor.handle(
            &[Event::QualityChanged {
                level: QualityLevel::Potato,
            }],
            &mut Vec::new(),
        );
        let skipped: Vec<u64> = (1..=6).filter(|f| governor.should_skip(*f)).collect();
        assert_eq!(skipped, vec![2, 4, 6]);
    }

    #[test]
    fn cycle_requests_the_next_level_without_switching() {
        let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
        let mut out = Vec::new();
        assert_eq!(governor.cycle(&mut out), QualityLevel::Low);
        assert_eq!(
            out,
            vec![Command::SetQualityLevel {
                level: QualityLevel::Low
            }]
        );
        assert_eq!(governor.level(), QualityLevel::Normal);
        assert!(!governor.should_skip(3));
    }
}
