#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the AR Summon engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams and respond exclusively with new
//! command batches or [`SoundRequest`] values for the playback scheduler.

pub mod easing;
mod error;
pub mod gesture;

use std::time::Duration;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use error::ConfigError;

/// Kinds of pooled entities that can inhabit the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Transient summoning circle that precedes every summon.
    Effect,
    /// Hopping creature that relocates around the scene.
    Creature,
    /// Swaying egg that idles until its lifetime ends.
    Egg,
}

impl EntityKind {
    /// Every entity kind in a stable order.
    pub const ALL: [EntityKind; 3] = [Self::Effect, Self::Creature, Self::Egg];

    /// Human readable label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Effect => "effect",
            Self::Creature => "creature",
            Self::Egg => "egg",
        }
    }
}

/// Unique identifier assigned to a pooled entity.
///
/// Serials are allocated by the owning pool, so the kind is part of the
/// identity and identifiers never collide across pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    kind: EntityKind,
    serial: u32,
}

impl EntityId {
    /// Creates a new identifier for the provided kind and serial number.
    #[must_use]
    pub const fn new(kind: EntityKind, serial: u32) -> Self {
        Self { kind, serial }
    }

    /// Kind of entity the identifier refers to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Pool-local serial number of the identifier.
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

/// Lifecycle stage of a pooled entity.
///
/// Variants are ordered so that a later stage always compares greater than an
/// earlier one; phase controllers rely on this to stay monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Entity is animating into view.
    Spawning,
    /// Entity is fully visible; sustain for effects, idle or moving for creatures.
    Active,
    /// Entity is animating out of view.
    Fading,
    /// Entity finished its lifecycle and awaits removal.
    Expired,
}

/// Discrete fidelity tier chosen adaptively from frame-rate samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Full fidelity, no frames skipped.
    #[default]
    Normal,
    /// Reduced fidelity, one frame in three skipped.
    Low,
    /// Minimal fidelity, one frame in two skipped.
    Potato,
}

impl QualityLevel {
    /// Returns the modulus used to decide frame skipping, if any.
    ///
    /// A frame whose index is divisible by the cadence is skipped.
    #[must_use]
    pub const fn skip_cadence(self) -> Option<u64> {
        match self {
            Self::Normal => None,
            Self::Low => Some(3),
            Self::Potato => Some(2),
        }
    }

    /// Human readable label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Potato => "potato",
        }
    }
}

/// Identifiers of the procedurally generated sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoundId {
    /// Rumbling chime played when a summoning circle appears.
    EffectTrigger,
    /// Croak played when a creature is summoned.
    CreatureCall,
    /// Double heartbeat played when an egg is summoned.
    Heartbeat,
    /// Short bell confirming a tap.
    UiConfirm,
}

impl SoundId {
    /// Every sound known to the synthesizer.
    pub const ALL: [SoundId; 4] = [
        Self::EffectTrigger,
        Self::CreatureCall,
        Self::Heartbeat,
        Self::UiConfirm,
    ];

    /// Stable buffer name used to look the sound up in a bank.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EffectTrigger => "magic_circle",
            Self::CreatureCall => "frog",
            Self::Heartbeat => "egg_heartbeat",
            Self::UiConfirm => "ui",
        }
    }

    /// Resolves a buffer name back into a sound identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sound| sound.name() == name)
    }

    /// Length of the generated buffer in milliseconds.
    #[must_use]
    pub const fn duration_millis(self) -> u64 {
        match self {
            Self::EffectTrigger => 2_000,
            Self::CreatureCall => 500,
            Self::Heartbeat => 1_000,
            Self::UiConfirm => 200,
        }
    }

    /// Number of channels in the generated buffer.
    #[must_use]
    pub const fn channel_count(self) -> usize {
        match self {
            Self::EffectTrigger => 2,
            Self::CreatureCall | Self::Heartbeat | Self::UiConfirm => 1,
        }
    }

    /// Final output scale applied to every sample of the sound.
    #[must_use]
    pub const fn output_scale(self) -> f32 {
        match self {
            Self::EffectTrigger | Self::Heartbeat => 0.3,
            Self::CreatureCall => 0.4,
            Self::UiConfirm => 0.2,
        }
    }

    /// Largest absolute sample value the formula can produce.
    ///
    /// The bound is the output scale multiplied by the sum of the partial
    /// amplitudes that can overlap at any instant.
    #[must_use]
    pub fn peak_bound(self) -> f32 {
        match self {
            Self::EffectTrigger => 0.3 * (1.0 + 0.5 + 0.3 + 0.05),
            Self::CreatureCall => 0.4 * 1.3,
            Self::Heartbeat => 0.3,
            Self::UiConfirm => 0.2,
        }
    }
}

/// Request for the playback scheduler emitted by systems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundRequest {
    /// Sound to play.
    pub sound: SoundId,
    /// Caller volume before category and master gains are applied.
    pub volume: f32,
    /// Playback-rate multiplier; `1.0` keeps the original pitch.
    pub pitch: f32,
    /// Delay before the sound starts.
    pub delay: Duration,
}

impl SoundRequest {
    /// Creates a request at full volume, original pitch and no delay.
    #[must_use]
    pub const fn immediate(sound: SoundId) -> Self {
        Self {
            sound,
            volume: 1.0,
            pitch: 1.0,
            delay: Duration::ZERO,
        }
    }
}

/// Axis-aligned rectangle on the placement plane measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    /// Creates bounds from two corners, normalising their order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Reports whether the point lies inside the rectangle grown by `margin`.
    #[must_use]
    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        point.x >= self.min.x - margin
            && point.x <= self.max.x + margin
            && point.y >= self.min.y - margin
            && point.y <= self.max.y + margin
    }

    /// Clamps the point into the rectangle shrunk by `inset` on every side.
    ///
    /// When the inset would invert the rectangle the point collapses onto the
    /// centre along that axis.
    #[must_use]
    pub fn clamp_inset(&self, point: Vec2, inset: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(point.x, self.min.x + inset, self.max.x - inset),
            clamp_axis(point.y, self.min.y + inset, self.max.y - inset),
        )
    }
}

fn clamp_axis(value: f32, low: f32, high: f32) -> f32 {
    if low > high {
        (low + high) * 0.5
    } else {
        value.clamp(low, high)
    }
}

/// Closed set of commands every entity kind understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityCommand {
    /// Restores transient reaction parameters to their resting values.
    Reset,
    /// Triggers the kind's tap reaction without altering its phase.
    Intensify,
    /// Marks the entity expired so the next update removes it.
    Destroy,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports a short tap on the placement plane.
    Tap {
        /// World-space point produced by the coordinate projector.
        position: Vec2,
    },
    /// Reports a press held past the long-press threshold.
    LongPress {
        /// World-space point produced by the coordinate projector.
        position: Vec2,
    },
    /// Requests a summoning circle at the provided point.
    SpawnEffect {
        /// Centre of the circle on the placement plane.
        position: Vec2,
    },
    /// Requests a creature at the provided point.
    SpawnCreature {
        /// Landing point of the creature on the placement plane.
        position: Vec2,
        /// Delay after which the creature performs its first jump, if any.
        first_jump_after: Option<Duration>,
    },
    /// Requests an egg at the provided point.
    SpawnEgg {
        /// Resting point of the egg on the placement plane.
        position: Vec2,
    },
    /// Dispatches an entity command to every live entity of a kind.
    CommandAll {
        /// Kind whose pool receives the command.
        kind: EntityKind,
        /// Command to dispatch.
        command: EntityCommand,
    },
    /// Removes every entity from every pool and cancels deferred tasks.
    Clear,
    /// Stores a new quality level in the simulation context.
    SetQualityLevel {
        /// Level selected by the performance governor.
        level: QualityLevel,
    },
    /// Replaces the display bounds entities are confined to.
    SetDisplayBounds {
        /// New bounds measured on the placement plane.
        bounds: Bounds,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation time after the tick.
        now: Duration,
    },
    /// Confirms that an entity entered its pool.
    EntitySpawned {
        /// Identifier assigned to the entity.
        id: EntityId,
        /// Initial world position including height.
        position: Vec3,
    },
    /// Reports that the oldest entity of a full pool was evicted.
    EntityEvicted {
        /// Identifier of the evicted entity.
        id: EntityId,
    },
    /// Reports that an entity reached the end of its lifecycle and was removed.
    EntityExpired {
        /// Identifier of the removed entity.
        id: EntityId,
    },
    /// Reports that an entity moved into a later phase.
    PhaseChanged {
        /// Identifier of the entity.
        id: EntityId,
        /// Phase before the transition.
        from: Phase,
        /// Phase after the transition.
        to: Phase,
    },
    /// Reports that a summoning circle completed its full lifecycle.
    EffectCompleted {
        /// Identifier of the completed circle.
        id: EntityId,
        /// Centre of the circle, used to place the summoned entities.
        position: Vec2,
    },
    /// Reports that a tap landed on an egg and triggered its reaction.
    EggTapped {
        /// Identifier of the egg that reacted.
        id: EntityId,
    },
    /// Reports that a long press was received at the provided point.
    LongPressed {
        /// World-space point of the press.
        position: Vec2,
    },
    /// Reports that cracks appeared on an egg.
    CracksAppeared {
        /// Identifier of the cracked egg.
        id: EntityId,
        /// Total number of cracks on the egg after the event.
        total: usize,
    },
    /// Announces that the simulation context switched quality level.
    QualityChanged {
        /// Level now active.
        level: QualityLevel,
    },
    /// Reports that every pool was emptied.
    Cleared,
}
