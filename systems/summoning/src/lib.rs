#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic summoning system reacting to taps, long presses and completed circles.

use std::time::Duration;

use ar_summon_core::{Command, EntityKind, Event, SoundId, SoundRequest};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

const CREATURE_SUMMON_PROBABILITY: f64 = 0.6;
const SUMMON_SPREAD: f32 = 20.0;
const MAX_SUMMONED_CREATURES: usize = 3;
const CALL_STAGGER: Duration = Duration::from_millis(200);
const CALL_PITCH_JITTER: (f32, f32) = (0.8, 1.2);
const UI_VOLUME: f32 = 0.5;
const SWARM_SIZE: usize = 5;
const SWARM_SPREAD: f32 = 30.0;
const SWARM_JUMP_STAGGER: Duration = Duration::from_millis(200);
const CHORUS_VOICES: usize = 5;
const CHORUS_SPACING_SECS: f32 = 0.1;
const CHORUS_VOLUME: (f32, f32) = (0.3, 0.8);
const CHORUS_PITCH: (f32, f32) = (0.7, 1.5);

/// Configuration parameters required to construct the summoning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration using the provided random seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system translating world events into spawn commands and sound requests.
#[derive(Debug)]
pub struct Summoning {
    rng: ChaCha8Rng,
}

impl Summoning {
    /// Creates a new summoning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events to emit follow-up commands and sounds.
    pub fn handle(
        &mut self,
        events: &[Event],
        commands: &mut Vec<Command>,
        sounds: &mut Vec<SoundRequest>,
    ) {
        for event in events {
            match event {
                Event::EntitySpawned { id, .. } if id.kind() == EntityKind::Effect => {
                    sounds.push(ui_confirm());
                    sounds.push(SoundRequest::immediate(SoundId::EffectTrigger));
                }
                Event::EggTapped { .. } => sounds.push(ui_confirm()),
                Event::EffectCompleted { position, .. } => {
                    self.summon(*position, commands, sounds);
                }
                Event::LongPressed { position } => {
                    self.swarm(*position, commands, sounds);
                }
                _ => {}
            }
        }
    }

    fn summon(&mut self, centre: Vec2, commands: &mut Vec<Command>, sounds: &mut Vec<SoundRequest>) {
        if self.rng.gen_bool(CREATURE_SUMMON_PROBABILITY) {
            let count = self.rng.gen_range(1..=MAX_SUMMONED_CREATURES);
            for index in 0..count {
                commands.push(Command::SpawnCreature {
                    position: self.scatter(centre, SUMMON_SPREAD),
                    first_jump_after: None,
                });
                sounds.push(SoundRequest {
                    sound: SoundId::CreatureCall,
                    volume: 1.0,
                    pitch: self.rng.gen_range(CALL_PITCH_JITTER.0..=CALL_PITCH_JITTER.1),
                    delay: CALL_STAGGER * index as u32,
                });
            }
            debug!(count, x = centre.x, y = centre.y, "creatures_summoned");
        } else {
            commands.push(Command::SpawnEgg { position: centre });
            sounds.push(SoundRequest::immediate(SoundId::Heartbeat));
            debug!(x = centre.x, y = centre.y, "egg_summoned");
        }
    }

    fn swarm(&mut self, centre: Vec2, commands: &mut Vec<Command>, sounds: &mut Vec<SoundRequest>) {
        for index in 0..SWARM_SIZE {
            commands.push(Command::SpawnCreature {
                position: self.scatter(centre, SWARM_SPREAD),
                first_jump_after: Some(SWARM_JUMP_STAGGER * index as u32),
            });
        }
        for index in 0..CHORUS_VOICES {
            let offset = index as f32 * CHORUS_SPACING_SECS
                + self.rng.gen_range(0.0..CHORUS_SPACING_SECS);
            sounds.push(SoundRequest {
                sound: SoundId::CreatureCall,
                volume: self.rng.gen_range(CHORUS_VOLUME.0..=CHORUS_VOLUME.1),
                pitch: self.rng.gen_range(CHORUS_PITCH.0..=CHORUS_PITCH.1),
                delay: Duration::from_secs_f32(offset),
            });
        }
        debug!(count = SWARM_SIZE, x = centre.x, y = centre.y, "swarm_summoned");
    }

    fn scatter(&mut self, centre: Vec2, spread: f32) -> Vec2 {
        centre
            + Vec2::new(
                self.rng.gen_range(-spread..=spread),
                self.rng.gen_range(-spread..=spread),
            )
    }
}

fn ui_confirm() -> SoundRequest {
    SoundRequest {
        volume: UI_VOLUME,
        ..SoundRequest::immediate(SoundId::UiConfirm)
    }
}
