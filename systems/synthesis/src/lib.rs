#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Offline generator of the procedural sound buffers.
//!
//! Every sound is a closed-form function of time evaluated once per sample.
//! Noise is drawn from the caller's random source so a seeded generator yields
//! byte-identical buffers.

use std::{collections::BTreeMap, f32::consts::TAU, sync::Arc, time::Duration};

use ar_summon_core::SoundId;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort synthesis at startup.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// A buffer was requested with a sample rate of zero.
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    /// A buffer name did not match any known sound.
    #[error("unknown sound `{name}`")]
    UnknownSound {
        /// Name that failed to resolve.
        name: String,
    },
}

/// Immutable multi-channel sample buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundBuffer {
    id: SoundId,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SoundBuffer {
    /// Sound the buffer was generated for.
    #[must_use]
    pub const fn id(&self) -> SoundId {
        self.id
    }

    /// Samples per second.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of one channel.
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Samples per channel.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Playback length at the original pitch.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value across all channels.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
    }
}

/// Number of samples per channel for a sound at the provided rate.
#[must_use]
pub fn frame_count(sound: SoundId, sample_rate: u32) -> usize {
    let frames = u64::from(sample_rate) * sound.duration_millis() / 1_000;
    usize::try_from(frames).unwrap_or(usize::MAX)
}

/// Generates the buffer for a sound.
pub fn synthesize<R: Rng + ?Sized>(
    sound: SoundId,
    sample_rate: u32,
    rng: &mut R,
) -> Result<SoundBuffer, SynthesisError> {
    if sample_rate == 0 {
        return Err(SynthesisError::ZeroSampleRate);
    }
    let frames = frame_count(sound, sample_rate);
    let duration = sound.duration_millis() as f32 / 1_000.0;
    let rate = sample_rate as f32;
    let bound = sound.peak_bound() + 1e-4;
    let mut out_of_bounds = 0_usize;

    let channels = (0..sound.channel_count())
        .map(|_| {
            (0..frames)
                .map(|index| {
                    let t = index as f32 / rate;
                    let sample = evaluate(sound, t, t / duration, rng);
                    if sample.abs() > bound {
                        out_of_bounds += 1;
                    }
                    sample.clamp(-1.0, 1.0)
                })
                .collect::<Vec<f32>>()
        })
        .collect();

    if out_of_bounds > 0 {
        warn!(
            sound = sound.name(),
            samples = out_of_bounds,
            bound = sound.peak_bound(),
            "synthesized_samples_exceed_bound"
        );
    }
    debug!(sound = sound.name(), sample_rate, frames, "sound_synthesized");
    Ok(SoundBuffer {
        id: sound,
        sample_rate,
        channels,
    })
}

/// Resolves a buffer name and generates its sound.
pub fn synthesize_named<R: Rng + ?Sized>(
    name: &str,
    sample_rate: u32,
    rng: &mut R,
) -> Result<SoundBuffer, SynthesisError> {
    let sound = SoundId::from_name(name).ok_or_else(|| SynthesisError::UnknownSound {
        name: name.to_owned(),
    })?;
    synthesize(sound, sample_rate, rng)
}

fn evaluate<R: Rng + ?Sized>(sound: SoundId, t: f32, progress: f32, rng: &mut R) -> f32 {
    match sound {
        SoundId::EffectTrigger => {
            let bass = (TAU * 80.0 * t).sin() * (-0.5 * t).exp();
            let mid = 0.5 * (TAU * 220.0 * t).sin() * (-t).exp();
            let high = 0.3 * (TAU * 880.0 * t).sin() * (-2.0 * t).exp();
            let noise = 0.1 * (rng.gen::<f32>() - 0.5) * (-3.0 * t).exp();
            let envelope = (-0.8 * t).exp() * (1.0 - 0.5 * progress);
            (bass + mid + high + noise) * envelope * sound.output_scale()
        }
        SoundId::CreatureCall => {
            let base = 150.0 + 30.0 * (20.0 * t).sin();
            let fundamental = (TAU * base * t).sin();
            let harmonic = 0.3 * (TAU * 2.0 * base * t).sin();
            let envelope = (20.0 * progress).min(1.0) * (-8.0 * progress).exp();
            (fundamental + harmonic) * envelope * sound.output_scale()
        }
        SoundId::Heartbeat => {
            const PULSE: f32 = 0.1;
            const SECOND_ONSET: f32 = 0.3;
            let mut amplitude = 0.0;
            if t < PULSE {
                amplitude = (TAU * 60.0 * t).sin() * (-15.0 * t / PULSE).exp();
            }
            if t > SECOND_ONSET && t < SECOND_ONSET + PULSE {
                let local = t - SECOND_ONSET;
                amplitude += 0.7 * (TAU * 55.0 * local).sin() * (-12.0 * local / PULSE).exp();
            }
            amplitude * sound.output_scale()
        }
        SoundId::UiConfirm => {
            (TAU * 800.0 * t).sin() * (-8.0 * progress).exp() * sound.output_scale()
        }
    }
}

/// Buffers for every known sound, generated once and shared read-only.
#[derive(Clone, Debug, Default)]
pub struct SoundBank {
    sample_rate: u32,
    buffers: BTreeMap<SoundId, Arc<SoundBuffer>>,
}

impl SoundBank {
    /// Generates all four sounds at the provided rate.
    pub fn synthesize_all<R: Rng + ?Sized>(
        sample_rate: u32,
        rng: &mut R,
    ) -> Result<Self, SynthesisError> {
        let mut buffers = BTreeMap::new();
        for sound in SoundId::ALL {
            let _ = buffers.insert(sound, Arc::new(synthesize(sound, sample_rate, rng)?));
        }
        Ok(Self {
            sample_rate,
            buffers,
        })
    }

    /// Sample rate shared by every buffer.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of buffers in the bank.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Reports whether the bank holds no buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Shared handle to the buffer of a sound.
    #[must_use]
    pub fn get(&self, sound: SoundId) -> Option<Arc<SoundBuffer>> {
        self.buffers.get(&sound).cloned()
    }

    /// Shared handle to the buffer registered under a name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<SoundBuffer>> {
        SoundId::from_name(name).and_then(|sound| self.get(sound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn heartbeat_is_silent_between_pulses() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let buffer = synthesize(SoundId::Heartbeat, 1_000, &mut rng).expect("synthesis");
        let samples = buffer.channel(0).expect("mono");
        assert!(samples[100..=300].iter().all(|sample| *sample == 0.0));
        assert!(samples[400..].iter().all(|sample| *sample == 0.0));
        assert!(samples[1..100].iter().any(|sample| *sample != 0.0));
        assert!(samples[301..400].iter().any(|sample| *sample != 0.0));
    }

    #[test]
    fn creature_call_starts_silent_and_decays() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let buffer = synthesize(SoundId::CreatureCall, 8_000, &mut rng).expect("synthesis");
        let samples = buffer.channel(0).expect("mono");
        assert_eq!(samples[0], 0.0);
        let head = samples[..1_000].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        let tail = samples[3_000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(tail < head);
    }

    #[test]
    fn effect_trigger_channels_carry_independent_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let buffer = synthesize(SoundId::EffectTrigger, 22_050, &mut rng).expect("synthesis");
        assert_eq!(buffer.channel_count(), 2);
        assert_ne!(buffer.channel(0), buffer.channel(1));
    }

    #[test]
    fn zero_sample_rate_is_a_configuration_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            synthesize(SoundId::UiConfirm, 0, &mut rng),
            Err(SynthesisError::ZeroSampleRate)
        );
    }
}
