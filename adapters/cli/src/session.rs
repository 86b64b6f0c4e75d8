//! Headless session wiring the world, the systems and the collaborators.

use std::{fmt, time::Duration};

use anyhow::{Context, Result as AnyResult};
use ar_summon_core::{
    gesture::{Gesture, PressClassifier},
    Command, EntityKind, Event, QualityLevel,
};
use ar_summon_rendering::{Color, NoVideo, SceneSync, VisualStyle};
use ar_summon_system_performance::PerformanceGovernor;
use ar_summon_system_playback::PlaybackScheduler;
use ar_summon_system_projection::CoordinateProjector;
use ar_summon_system_summoning::{Config as SummoningConfig, Summoning};
use ar_summon_system_synthesis::SoundBank;
use ar_summon_world::{self as world, query, World};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    config::SessionConfig,
    headless::{HeadlessRenderer, SimulatedAudio},
};

const PLACEHOLDER_BACKGROUND: Color = Color::new(0.05, 0.02, 0.1, 1.0);
const SUMMONING_SEED_SALT: u64 = 0x5a5a_1e55_c0de_f00d;
const PRESS_GAP_MS: (u64, u64) = (600, 1_800);
const TAP_HOLD_MS: (u64, u64) = (60, 200);
const LONG_HOLD_EXTRA_MS: (u64, u64) = (100, 400);
const LONG_PRESS_SHARE: f64 = 0.2;

/// Press performed by the scripted user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScriptedPress {
    pub(crate) at: Duration,
    pub(crate) screen: Vec2,
    pub(crate) hold: Duration,
}

/// Generates non-overlapping presses spread over the viewport.
pub(crate) fn scripted_presses(
    seed: u64,
    duration: Duration,
    viewport: Vec2,
    long_press: Duration,
) -> Vec<ScriptedPress> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut presses = Vec::new();
    let mut cursor = Duration::from_millis(rng.gen_range(PRESS_GAP_MS.0..=PRESS_GAP_MS.1));
    while cursor < duration {
        let hold = if rng.gen_bool(LONG_PRESS_SHARE) {
            long_press
                + Duration::from_millis(rng.gen_range(LONG_HOLD_EXTRA_MS.0..=LONG_HOLD_EXTRA_MS.1))
        } else {
            Duration::from_millis(rng.gen_range(TAP_HOLD_MS.0..=TAP_HOLD_MS.1))
        };
        let screen = Vec2::new(
            rng.gen_range(0.0..=viewport.x),
            rng.gen_range(0.0..=viewport.y),
        );
        presses.push(ScriptedPress {
            at: cursor,
            screen,
            hold,
        });
        cursor += hold + Duration::from_millis(rng.gen_range(PRESS_GAP_MS.0..=PRESS_GAP_MS.1));
    }
    presses
}

/// Aggregated outcome of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SessionReport {
    pub(crate) simulated: Duration,
    pub(crate) frames: u64,
    pub(crate) rendered_frames: u64,
    pub(crate) taps: usize,
    pub(crate) long_presses: usize,
    pub(crate) effects_spawned: usize,
    pub(crate) creatures_spawned: usize,
    pub(crate) eggs_spawned: usize,
    pub(crate) evictions: usize,
    pub(crate) effects_completed: usize,
    pub(crate) egg_taps: usize,
    pub(crate) cracks: usize,
    pub(crate) sounds_requested: usize,
    pub(crate) sounds_started: usize,
    pub(crate) peak_voices: usize,
    pub(crate) quality_changes: usize,
    pub(crate) final_quality: QualityLevel,
    pub(crate) last_fps: Option<u32>,
    pub(crate) live_entities: usize,
    pub(crate) drawables_added: usize,
    pub(crate) transform_updates: usize,
    pub(crate) peak_drawables: usize,
    pub(crate) background_changes: usize,
}

impl SessionReport {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EntitySpawned { id, .. } => match id.kind() {
                EntityKind::Effect => self.effects_spawned += 1,
                EntityKind::Creature => self.creatures_spawned += 1,
                EntityKind::Egg => self.eggs_spawned += 1,
            },
            Event::EntityEvicted { .. } => self.evictions += 1,
            Event::EffectCompleted { .. } => self.effects_completed += 1,
            Event::EggTapped { .. } => self.egg_taps += 1,
            Event::CracksAppeared { .. } => self.cracks += 1,
            Event::LongPressed { .. } => self.long_presses += 1,
            Event::QualityChanged { .. } => self.quality_changes += 1,
            _ => {}
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self
            .last_fps
            .map_or_else(|| "n/a".to_owned(), |fps| fps.to_string());
        writeln!(f, "simulated:        {:.1}s", self.simulated.as_secs_f32())?;
        writeln!(
            f,
            "frames:           {} ({} rendered)",
            self.frames, self.rendered_frames
        )?;
        writeln!(
            f,
            "gestures:         {} taps, {} long presses",
            self.taps, self.long_presses
        )?;
        writeln!(
            f,
            "spawned:          {} circles, {} creatures, {} eggs ({} evicted)",
            self.effects_spawned, self.creatures_spawned, self.eggs_spawned, self.evictions
        )?;
        writeln!(
            f,
            "circles:          {} completed",
            self.effects_completed
        )?;
        writeln!(
            f,
            "eggs:             {} taps, {} crack events",
            self.egg_taps, self.cracks
        )?;
        writeln!(
            f,
            "sounds:           {} requested, {} started, {} peak voices",
            self.sounds_requested, self.sounds_started, self.peak_voices
        )?;
        writeln!(
            f,
            "quality:          {} ({} changes, last sample {fps} fps)",
            self.final_quality.label(),
            self.quality_changes
        )?;
        writeln!(
            f,
            "scene:            {} live, {} added, {} peak, {} updates, {} background changes",
            self.live_entities,
            self.drawables_added,
            self.peak_drawables,
            self.transform_updates,
            self.background_changes
        )
    }
}

/// Every collaborator of a running session.
pub(crate) struct Session {
    world: World,
    summoning: Summoning,
    governor: PerformanceGovernor,
    projector: CoordinateProjector,
    classifier: PressClassifier,
    audio: PlaybackScheduler<SimulatedAudio>,
    scene: SceneSync,
    renderer: HeadlessRenderer,
    video: NoVideo,
    unsynced: Vec<Event>,
    report: SessionReport,
}

impl Session {
    /// Builds a session, synthesizing every sound up front.
    pub(crate) fn new(config: &SessionConfig) -> AnyResult<Self> {
        let seed = config.world.seed;
        let mut world = World::new(&config.world).context("invalid world configuration")?;
        let projector =
            CoordinateProjector::new(config.camera).context("invalid camera configuration")?;
        let classifier = PressClassifier::new(config.input.long_press())
            .context("invalid input configuration")?;

        let mut synthesis_rng = ChaCha8Rng::seed_from_u64(seed);
        let bank = SoundBank::synthesize_all(config.audio.sample_rate, &mut synthesis_rng)
            .context("failed to synthesize sounds")?;
        let mut audio = PlaybackScheduler::new(bank, config.audio.playback());
        audio.initialize(SimulatedAudio::default());

        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SetDisplayBounds {
                bounds: projector.visible_bounds(),
            },
            &mut events,
        );

        Ok(Self {
            world,
            summoning: Summoning::new(SummoningConfig::new(seed ^ SUMMONING_SEED_SALT)),
            governor: PerformanceGovernor::new(config.performance),
            projector,
            classifier,
            audio,
            scene: SceneSync::new(VisualStyle::default(), PLACEHOLDER_BACKGROUND),
            renderer: HeadlessRenderer::default(),
            video: NoVideo,
            unsynced: events,
            report: SessionReport::default(),
        })
    }

    /// Viewport the scripted presses are spread over.
    pub(crate) fn viewport(&self) -> Vec2 {
        self.projector.viewport()
    }

    /// Long-press threshold of the gesture classifier.
    pub(crate) fn long_press(&self) -> Duration {
        self.classifier.threshold()
    }

    /// Runs fixed-size frames until `duration` of simulated time has elapsed.
    pub(crate) fn run(
        mut self,
        script: &[ScriptedPress],
        duration: Duration,
        frame: Duration,
    ) -> AnyResult<SessionReport> {
        let mut upcoming = script.iter().peekable();
        let mut held: Option<ScriptedPress> = None;
        let mut frame_index = 0_u64;

        while query::now(&self.world) < duration {
            let now = query::now(&self.world);
            let mut commands = Vec::new();

            if held.is_none() {
                if let Some(press) = upcoming.next_if(|press| press.at <= now) {
                    self.classifier.press(press.screen, now);
                    held = Some(*press);
                }
            }
            if let Some(press) = held {
                if let Some(gesture) = self.classifier.poll(now) {
                    commands.push(self.gesture_command(gesture));
                }
                if now >= press.at + press.hold {
                    if let Some(gesture) = self.classifier.release(now) {
                        commands.push(self.gesture_command(gesture));
                    }
                    held = None;
                }
            }

            commands.push(Command::Tick { dt: frame });
            self.submit(commands);

            if let Some(backend) = self.audio.backend_mut() {
                backend.advance(frame);
            }
            let _ = self.audio.pump();

            frame_index += 1;
            if self.governor.should_skip(frame_index) {
                continue;
            }
            self.scene
                .sync(
                    &self.world,
                    &self.unsynced,
                    &mut self.renderer,
                    &mut self.video,
                )
                .context("scene synchronisation failed")?;
            self.unsynced.clear();
            self.report.rendered_frames += 1;
        }

        self.report.frames = frame_index;
        Ok(self.finish())
    }

    fn gesture_command(&mut self, gesture: Gesture) -> Command {
        match gesture {
            Gesture::Tap(screen) => {
                self.report.taps += 1;
                Command::Tap {
                    position: self.projector.project(screen).truncate(),
                }
            }
            Gesture::LongPress(screen) => Command::LongPress {
                position: self.projector.project(screen).truncate(),
            },
        }
    }

    fn submit(&mut self, mut pending: Vec<Command>) {
        let mut events = Vec::new();
        let mut sounds = Vec::new();
        while !pending.is_empty() {
            events.clear();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.summoning.handle(&events, &mut pending, &mut sounds);
            self.governor.handle(&events, &mut pending);
            for event in &events {
                self.report.record(event);
            }
            self.unsynced.extend(events.iter().cloned());
        }
        for request in sounds {
            self.report.sounds_requested += 1;
            if self.audio.play_request(request).is_none() {
                debug!(sound = request.sound.name(), "sound_not_played");
            }
        }
    }

    fn finish(mut self) -> SessionReport {
        let status = self.audio.status();
        info!(
            playing = status.playing,
            sounds = status.sounds_loaded,
            "session_finished"
        );
        if let Some(backend) = self.audio.shutdown() {
            self.report.sounds_started = backend.started();
            self.report.peak_voices = backend.peak_voices();
        }
        self.report.simulated = query::now(&self.world);
        self.report.final_quality = query::quality_level(&self.world);
        self.report.last_fps = self.governor.last_fps();
        self.report.live_entities = query::snapshots(&self.world).len();
        self.report.drawables_added = self.renderer.added();
        self.report.transform_updates = self.renderer.updates();
        self.report.peak_drawables = self.renderer.peak_live();
        self.report.background_changes = self.renderer.background_changes();
        self.report
    }
}
