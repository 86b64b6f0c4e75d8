#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scheduler that tracks concurrently playing sound instances.
//!
//! The scheduler owns an optional [`AudioBackend`]. Without one it runs in
//! degraded mode and every `play` call is a silent no-op. Backends report
//! natural completion through a single-fire [`CompletionNotifier`]; the
//! scheduler drains those reports in [`PlaybackScheduler::pump`], which is the
//! only place besides explicit stops where tracked instances are removed.

use std::{
    collections::BTreeMap,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use ar_summon_core::{SoundId, SoundRequest};
use ar_summon_system_synthesis::{SoundBank, SoundBuffer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Identifier of a tracked playback instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Creates an identifier from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Backend-specific handle of a started voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    /// Creates a handle from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Everything a backend needs to render one instance.
#[derive(Clone, Debug)]
pub struct Voice {
    /// Shared sample data.
    pub buffer: Arc<SoundBuffer>,
    /// Final linear gain.
    pub gain: f32,
    /// Playback-rate multiplier.
    pub pitch: f32,
    /// Backend time at which playback starts.
    pub start_at: Duration,
}

/// Single-fire completion report handed to the backend with every voice.
#[derive(Debug)]
pub struct CompletionNotifier {
    instance: InstanceId,
    sender: Sender<InstanceId>,
}

impl CompletionNotifier {
    /// Instance the notifier reports on.
    #[must_use]
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Reports natural completion; a scheduler that went away is ignored.
    pub fn notify(self) {
        let _ = self.sender.send(self.instance);
    }
}

/// Errors raised by audio backends.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AudioBackendError {
    /// The output device cannot be used.
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    /// The backend refused to start a voice.
    #[error("voice rejected: {0}")]
    Rejected(String),
}

/// Audio output collaborator driven by the scheduler.
pub trait AudioBackend {
    /// Current backend time.
    fn now(&self) -> Duration;

    /// Starts a voice, reporting natural completion through `notifier`.
    fn start(
        &mut self,
        voice: Voice,
        notifier: CompletionNotifier,
    ) -> Result<VoiceHandle, AudioBackendError>;

    /// Stops a voice; stopping a finished voice is harmless.
    fn stop(&mut self, handle: VoiceHandle);
}

/// Per-category gains applied on top of caller volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryGains {
    /// Summoning circle sound.
    pub effect: f32,
    /// Creature calls.
    pub creature: f32,
    /// Egg heartbeat.
    pub heartbeat: f32,
    /// Interface confirmation.
    pub ui: f32,
}

impl Default for CategoryGains {
    fn default() -> Self {
        Self {
            effect: 0.8,
            creature: 0.6,
            heartbeat: 0.5,
            ui: 0.5,
        }
    }
}

impl CategoryGains {
    /// Gain of the category a sound belongs to.
    #[must_use]
    pub fn gain(&self, sound: SoundId) -> f32 {
        match sound {
            SoundId::EffectTrigger => self.effect,
            SoundId::CreatureCall => self.creature,
            SoundId::Heartbeat => self.heartbeat,
            SoundId::UiConfirm => self.ui,
        }
    }
}

/// Scheduler settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Whether playback starts enabled.
    pub enabled: bool,
    /// Master gain applied to every new instance.
    pub master_volume: f32,
    /// Category gains.
    pub gains: CategoryGains,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 0.7,
            gains: CategoryGains::default(),
        }
    }
}

/// Instance tracked until completion or stop.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackInstance {
    /// Sound being played.
    pub sound: SoundId,
    /// Final gain passed to the backend.
    pub gain: f32,
    /// Playback-rate multiplier.
    pub pitch: f32,
    /// Backend time at which playback starts.
    pub start_at: Duration,
    /// Backend handle of the voice.
    pub handle: VoiceHandle,
}

/// Snapshot of the scheduler state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackStatus {
    /// Whether a backend is attached.
    pub initialized: bool,
    /// Whether playback is enabled.
    pub enabled: bool,
    /// Number of tracked instances.
    pub playing: usize,
    /// Master gain.
    pub master_volume: f32,
    /// Number of buffers available.
    pub sounds_loaded: usize,
}

/// Tracks playing instances and applies gain staging.
#[derive(Debug)]
pub struct PlaybackScheduler<B> {
    backend: Option<B>,
    bank: SoundBank,
    enabled: bool,
    master_volume: f32,
    gains: CategoryGains,
    instances: BTreeMap<InstanceId, PlaybackInstance>,
    next_instance: u64,
    completions_tx: Sender<InstanceId>,
    completions_rx: Receiver<InstanceId>,
}

impl<B: AudioBackend> PlaybackScheduler<B> {
    /// Creates an uninitialised scheduler over pre-synthesized buffers.
    #[must_use]
    pub fn new(bank: SoundBank, config: PlaybackConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        Self {
            backend: None,
            bank,
            enabled: config.enabled,
            master_volume: clamp_volume(config.master_volume),
            gains: config.gains,
            instances: BTreeMap::new(),
            next_instance: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// Attaches a backend, leaving degraded mode.
    pub fn initialize(&mut self, backend: B) {
        info!(sounds = self.bank.len(), "audio_initialized");
        self.backend = Some(backend);
    }

    /// Stops everything and detaches the backend.
    pub fn shutdown(&mut self) -> Option<B> {
        let _ = self.stop_all();
        let backend = self.backend.take();
        if backend.is_some() {
            info!("audio_shutdown");
        }
        backend
    }

    /// Attached backend, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Attached backend for mutation, if any.
    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Plays a buffer by name.
    ///
    /// Returns `None` without side effects when playback is disabled, no
    /// backend is attached, or the name is unknown; only the last case logs a
    /// warning.
    pub fn play(
        &mut self,
        name: &str,
        volume: f32,
        pitch: f32,
        delay: Duration,
    ) -> Option<InstanceId> {
        if !self.ready() {
            return None;
        }
        let Some(sound) = SoundId::from_name(name) else {
            warn!(name, "unknown_sound");
            return None;
        };
        self.start(sound, volume, pitch, delay)
    }

    /// Plays a request emitted by a system.
    pub fn play_request(&mut self, request: SoundRequest) -> Option<InstanceId> {
        if !self.ready() {
            return None;
        }
        self.start(request.sound, request.volume, request.pitch, request.delay)
    }

    fn ready(&self) -> bool {
        self.enabled && self.backend.is_some()
    }

    fn start(
        &mut self,
        sound: SoundId,
        volume: f32,
        pitch: f32,
        delay: Duration,
    ) -> Option<InstanceId> {
        let Some(buffer) = self.bank.get(sound) else {
            warn!(name = sound.name(), "unknown_sound");
            return None;
        };
        let backend = self.backend.as_mut()?;
        let gain = volume * self.gains.gain(sound) * self.master_volume;
        let start_at = backend.now() + delay;
        let id = InstanceId::new(self.next_instance);
        self.next_instance = self.next_instance.wrapping_add(1);
        let notifier = CompletionNotifier {
            instance: id,
            sender: self.completions_tx.clone(),
        };
        let voice = Voice {
            buffer,
            gain,
            pitch,
            start_at,
        };
        match backend.start(voice, notifier) {
            Ok(handle) => {
                debug!(sound = sound.name(), instance = id.get(), gain, pitch, "sound_started");
                let _ = self.instances.insert(
                    id,
                    PlaybackInstance {
                        sound,
                        gain,
                        pitch,
                        start_at,
                        handle,
                    },
                );
                Some(id)
            }
            Err(error) => {
                warn!(sound = sound.name(), error = %error, "sound_start_failed");
                None
            }
        }
    }

    /// Removes every instance whose completion has been reported.
    pub fn pump(&mut self) -> usize {
        let finished: Vec<InstanceId> = self.completions_rx.try_iter().collect();
        finished
            .into_iter()
            .filter(|id| self.instances.remove(id).is_some())
            .count()
    }

    /// Stops one instance; stopping an unknown or finished instance does nothing.
    pub fn stop(&mut self, id: InstanceId) -> bool {
        let Some(instance) = self.instances.remove(&id) else {
            return false;
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.stop(instance.handle);
        }
        true
    }

    /// Stops every tracked instance and returns how many were stopped.
    pub fn stop_all(&mut self) -> usize {
        let instances = std::mem::take(&mut self.instances);
        if let Some(backend) = self.backend.as_mut() {
            for instance in instances.values() {
                backend.stop(instance.handle);
            }
        }
        if !instances.is_empty() {
            debug!(stopped = instances.len(), "all_sounds_stopped");
        }
        instances.len()
    }

    /// Enables or disables playback; disabling stops every tracked instance.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            let _ = self.stop_all();
        }
        info!(enabled, "audio_toggled");
    }

    /// Reports whether playback is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the master gain for future instances, clamped to `0.0..=1.0`.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_volume(volume);
        debug!(master_volume = self.master_volume, "master_volume_set");
    }

    /// Master gain applied to future instances.
    #[must_use]
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Looks up a tracked instance.
    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&PlaybackInstance> {
        self.instances.get(&id)
    }

    /// Number of tracked instances.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.instances.len()
    }

    /// Snapshot of the scheduler state.
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            initialized: self.backend.is_some(),
            enabled: self.enabled,
            playing: self.instances.len(),
            master_volume: self.master_volume,
            sounds_loaded: self.bank.len(),
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_gains_match_sound_kinds() {
        let gains = CategoryGains::default();
        assert_eq!(gains.gain(SoundId::EffectTrigger), 0.8);
        assert_eq!(gains.gain(SoundId::CreatureCall), 0.6);
        assert_eq!(gains.gain(SoundId::Heartbeat), 0.5);
        assert_eq!(gains.gain(SoundId::UiConfirm), 0.5);
    }

    #[test]
    fn volume_clamping_rejects_nan() {
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_volume(1.7), 1.0);
        assert_eq!(clamp_volume(-0.2), 0.0);
    }

    #[test]
    fn notifier_survives_dropped_receiver() {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);
        let notifier = CompletionNotifier {
            instance: InstanceId::new(3),
            sender,
        };
        assert_eq!(notifier.instance(), InstanceId::new(3));
        notifier.notify();
    }
}
