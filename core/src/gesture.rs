//! Classification of raw press timings into taps and long presses.

use std::time::Duration;

use glam::Vec2;

use crate::ConfigError;

/// Shortest supported long-press threshold.
pub const MIN_LONG_PRESS: Duration = Duration::from_millis(500);

/// Longest supported long-press threshold.
pub const MAX_LONG_PRESS: Duration = Duration::from_millis(800);

/// Gesture recognised from a press.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Press released before the long-press threshold.
    Tap(Vec2),
    /// Press held until the long-press threshold elapsed.
    LongPress(Vec2),
}

#[derive(Clone, Copy, Debug)]
struct ActivePress {
    position: Vec2,
    started_at: Duration,
    long_press_fired: bool,
}

/// Turns press and release timings into [`Gesture`] values.
///
/// A long press fires while the press is still held, so callers poll the
/// classifier every tick; a release after a long press yields nothing.
#[derive(Clone, Debug)]
pub struct PressClassifier {
    threshold: Duration,
    active: Option<ActivePress>,
}

impl PressClassifier {
    /// Creates a classifier, validating the threshold against the supported window.
    pub fn new(threshold: Duration) -> Result<Self, ConfigError> {
        if threshold < MIN_LONG_PRESS || threshold > MAX_LONG_PRESS {
            return Err(ConfigError::LongPressThreshold {
                millis: u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(Self {
            threshold,
            active: None,
        })
    }

    /// Threshold separating taps from long presses.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Records the start of a press; an unreleased earlier press is discarded.
    pub fn press(&mut self, position: Vec2, at: Duration) {
        self.active = Some(ActivePress {
            position,
            started_at: at,
            long_press_fired: false,
        });
    }

    /// Reports a long press once the active press has been held past the threshold.
    pub fn poll(&mut self, now: Duration) -> Option<Gesture> {
        let threshold = self.threshold;
        let active = self.active.as_mut()?;
        if active.long_press_fired || now.saturating_sub(active.started_at) < threshold {
            return None;
        }
        active.long_press_fired = true;
        Some(Gesture::LongPress(active.position))
    }

    /// Ends the active press, reporting a tap when it was short.
    pub fn release(&mut self, at: Duration) -> Option<Gesture> {
        let active = self.active.take()?;
        if active.long_press_fired || at.saturating_sub(active.started_at) >= self.threshold {
            return None;
        }
        Some(Gesture::Tap(active.position))
    }
}
