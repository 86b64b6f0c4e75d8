//! Backends used when the session runs without audio or display devices.

use std::{collections::BTreeSet, time::Duration};

use anyhow::{ensure, Result as AnyResult};
use ar_summon_core::EntityId;
use ar_summon_rendering::{Background, Color, RenderingBackend, Visual};
use ar_summon_system_playback::{
    AudioBackend, AudioBackendError, CompletionNotifier, Voice, VoiceHandle,
};
use ar_summon_world::Transform;

struct ActiveVoice {
    handle: VoiceHandle,
    ends_at: Duration,
    notifier: CompletionNotifier,
}

/// Audio backend driven by the session clock instead of a sound card.
#[derive(Default)]
pub(crate) struct SimulatedAudio {
    now: Duration,
    next_handle: u64,
    voices: Vec<ActiveVoice>,
    started: usize,
    peak_voices: usize,
}

impl SimulatedAudio {
    /// Advances the backend clock, reporting every voice that ran to its end.
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.now += dt;
        let now = self.now;
        let (finished, active): (Vec<ActiveVoice>, Vec<ActiveVoice>) = self
            .voices
            .drain(..)
            .partition(|voice| voice.ends_at <= now);
        self.voices = active;
        for voice in finished {
            voice.notifier.notify();
        }
    }

    pub(crate) fn started(&self) -> usize {
        self.started
    }

    pub(crate) fn peak_voices(&self) -> usize {
        self.peak_voices
    }
}

impl AudioBackend for SimulatedAudio {
    fn now(&self) -> Duration {
        self.now
    }

    fn start(
        &mut self,
        voice: Voice,
        notifier: CompletionNotifier,
    ) -> Result<VoiceHandle, AudioBackendError> {
        if !(voice.pitch.is_finite() && voice.pitch > 0.0) {
            return Err(AudioBackendError::Rejected(format!(
                "pitch {} is not playable",
                voice.pitch
            )));
        }
        let handle = VoiceHandle::new(self.next_handle);
        self.next_handle += 1;
        let length = voice.buffer.duration().div_f32(voice.pitch);
        self.voices.push(ActiveVoice {
            handle,
            ends_at: voice.start_at + length,
            notifier,
        });
        self.started += 1;
        self.peak_voices = self.peak_voices.max(self.voices.len());
        Ok(handle)
    }

    fn stop(&mut self, handle: VoiceHandle) {
        self.voices.retain(|voice| voice.handle != handle);
    }
}

/// Rendering backend that only keeps books on the drawables it was given.
#[derive(Debug, Default)]
pub(crate) struct HeadlessRenderer {
    live: BTreeSet<EntityId>,
    added: usize,
    updates: usize,
    peak_live: usize,
    background_changes: usize,
}

impl HeadlessRenderer {
    pub(crate) fn added(&self) -> usize {
        self.added
    }

    pub(crate) fn updates(&self) -> usize {
        self.updates
    }

    pub(crate) fn peak_live(&self) -> usize {
        self.peak_live
    }

    pub(crate) fn background_changes(&self) -> usize {
        self.background_changes
    }
}

impl RenderingBackend for HeadlessRenderer {
    fn add(&mut self, id: EntityId, _visual: Visual) -> AnyResult<()> {
        ensure!(self.live.insert(id), "drawable {id:?} already present");
        self.added += 1;
        self.peak_live = self.peak_live.max(self.live.len());
        Ok(())
    }

    fn update_transform(
        &mut self,
        id: EntityId,
        _transform: &Transform,
        _color: Color,
    ) -> AnyResult<()> {
        ensure!(self.live.contains(&id), "drawable {id:?} is not present");
        self.updates += 1;
        Ok(())
    }

    fn remove(&mut self, id: EntityId) -> AnyResult<()> {
        ensure!(self.live.remove(&id), "drawable {id:?} is not present");
        Ok(())
    }

    fn set_background(&mut self, _background: Background) -> AnyResult<()> {
        self.background_changes += 1;
        Ok(())
    }
}
