use thiserror::Error;

use crate::EntityKind;

/// Configuration errors that abort initialization.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A phase or timer duration was configured with a negative value.
    #[error("duration `{name}` must not be negative (got {millis} ms)")]
    NegativeDuration {
        /// Name of the offending setting.
        name: &'static str,
        /// Configured value in milliseconds.
        millis: i64,
    },
    /// The effect's expand and fade phases do not fit in its total duration.
    #[error("effect duration {total_ms} ms is shorter than expand {expand_ms} ms plus fade {fade_ms} ms")]
    SustainUnderflow {
        /// Configured total duration.
        total_ms: i64,
        /// Configured expand duration.
        expand_ms: i64,
        /// Configured fade duration.
        fade_ms: i64,
    },
    /// A pool was configured without room for a single entity.
    #[error("{} pool capacity must be at least one", kind.label())]
    ZeroCapacity {
        /// Kind of the misconfigured pool.
        kind: EntityKind,
    },
    /// A randomized range has its lower end above its upper end.
    #[error("range `{name}` is inverted ({low} > {high})")]
    InvertedRange {
        /// Name of the offending setting.
        name: &'static str,
        /// Configured lower end.
        low: f32,
        /// Configured upper end.
        high: f32,
    },
    /// The long-press threshold lies outside the supported window.
    #[error("long-press threshold {millis} ms must lie within 500..=800 ms")]
    LongPressThreshold {
        /// Configured threshold in milliseconds.
        millis: u64,
    },
}
