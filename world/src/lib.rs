#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation context for AR Summon.
//!
//! The world owns the clock, one bounded pool per entity kind, the deferred
//! task queue, the random source and the active quality level. Adapters and
//! systems never mutate it directly: they submit [`Command`] values through
//! [`apply`] and read state through [`query`].

pub mod config;
pub mod creature;
pub mod deferred;
pub mod effect;
pub mod egg;
pub mod phase;
pub mod pool;
pub mod satellites;

use std::time::Duration;

use ar_summon_core::{
    Bounds, Command, ConfigError, EntityCommand, EntityId, EntityKind, Event, Phase, QualityLevel,
};
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::{
    config::{EffectConfig, WorldConfig},
    creature::{Creature, CreatureSettings},
    deferred::DeferredQueue,
    effect::Effect,
    egg::{Egg, EggSettings},
    phase::{PhaseTimings, PhaseTransition},
    pool::{CommandOutcome, EntityPool, Positioned, SpawnOutcome},
};

const DEFAULT_HALF_EXTENT: Vec2 = Vec2::new(410.0, 230.0);

/// Monotonic simulation clock advanced by ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now: Duration,
}

impl Clock {
    /// Creates a clock at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current simulation time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Advances the clock and returns the new time.
    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.now = self.now.saturating_add(dt);
        self.now
    }

    /// Time elapsed since `instant`; instants in the future yield zero.
    #[must_use]
    pub fn since(&self, instant: Duration) -> Duration {
        self.now.saturating_sub(instant)
    }
}

/// Render transform of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World position; `z` is the height above the placement plane.
    pub position: Vec3,
    /// Uniform scale relative to the entity's nominal size.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Blend factor towards the kind's accent colour.
    pub color_blend: f32,
}

/// Per-tick inputs handed to entity updates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickContext {
    pub(crate) now: Duration,
    pub(crate) dt: Duration,
    pub(crate) bounds: Bounds,
}

/// Read-only snapshot of a live entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Current phase.
    pub phase: Phase,
    /// Current render transform.
    pub transform: Transform,
}

/// Represents the authoritative AR Summon simulation state.
#[derive(Debug)]
pub struct World {
    clock: Clock,
    effects: EntityPool<Effect>,
    creatures: EntityPool<Creature>,
    eggs: EntityPool<Egg>,
    effect_config: EffectConfig,
    effect_timings: PhaseTimings,
    creature_settings: CreatureSettings,
    egg_settings: EggSettings,
    tap_radius: f32,
    quality: QualityLevel,
    bounds: Bounds,
    deferred: DeferredQueue,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world from validated configuration.
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = Self {
            clock: Clock::new(),
            effects: EntityPool::new(EntityKind::Effect, config.effect.capacity)?,
            creatures: EntityPool::new(EntityKind::Creature, config.creature.capacity)?,
            eggs: EntityPool::new(EntityKind::Egg, config.egg.capacity)?,
            effect_config: config.effect,
            effect_timings: config.effect.timings()?,
            creature_settings: CreatureSettings::from_config(&config.creature)?,
            egg_settings: EggSettings::from_config(&config.egg)?,
            tap_radius: config.egg.tap_radius,
            quality: QualityLevel::Normal,
            bounds: Bounds::from_corners(-DEFAULT_HALF_EXTENT, DEFAULT_HALF_EXTENT),
            deferred: DeferredQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        };
        info!(
            seed = config.seed,
            effects = config.effect.capacity,
            creatures = config.creature.capacity,
            eggs = config.egg.capacity,
            "world_created"
        );
        Ok(world)
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let now = self.clock.advance(dt);
        out_events.push(Event::TimeAdvanced { dt, now });

        for task in self.deferred.take_due(now) {
            match self.dispatch(task.owner, task.command) {
                Some(outcome) => self.record_outcome(task.owner, outcome, out_events),
                None => debug!(owner = ?task.owner, "deferred_task_without_owner"),
            }
        }

        let ctx = TickContext {
            now,
            dt,
            bounds: self.bounds,
        };

        let removed = self.effects.update(|id, effect| {
            if let Some(transition) = effect.update(&ctx) {
                push_transition(id, transition, out_events);
                if transition.to == Phase::Expired {
                    out_events.push(Event::EffectCompleted {
                        id,
                        position: effect.position(),
                    });
                }
            }
            effect.phase() != Phase::Expired
        });
        self.retire(removed, out_events);

        let removed = self.creatures.update(|id, creature| {
            if let Some(transition) = creature.update(&ctx) {
                push_transition(id, transition, out_events);
            }
            creature.phase() != Phase::Expired
        });
        self.retire(removed, out_events);

        let removed = self.eggs.update(|id, egg| {
            let step = egg.update(&ctx);
            if let Some(transition) = step.transition {
                push_transition(id, transition, out_events);
            }
            if step.cracks_added > 0 {
                out_events.push(Event::CracksAppeared {
                    id,
                    total: egg.cracks().len(),
                });
            }
            egg.phase() != Phase::Expired
        });
        self.retire(removed, out_events);
    }

    fn tap(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        let Some(id) = self.eggs.find_near(position, self.tap_radius) else {
            self.spawn_effect(position, out_events);
            return;
        };
        match self.eggs.command(id, EntityCommand::Intensify) {
            Some(CommandOutcome::ResetAfter(delay)) => {
                self.deferred
                    .schedule(self.clock.now() + delay, id, EntityCommand::Reset);
                out_events.push(Event::EggTapped { id });
            }
            _ => warn!(egg = ?id, "tap_on_expired_egg"),
        }
    }

    fn spawn_effect(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        let effect = Effect::new(
            position,
            self.clock.now(),
            self.effect_config,
            self.effect_timings,
            &mut self.rng,
        );
        let placed = effect.transform().position;
        let outcome = self.effects.spawn(effect);
        self.record_spawn(outcome, placed, out_events);
    }

    fn spawn_creature(
        &mut self,
        position: Vec2,
        first_jump_after: Option<Duration>,
        out_events: &mut Vec<Event>,
    ) {
        let creature = Creature::new(
            position,
            self.clock.now(),
            self.creature_settings,
            self.rng.gen(),
        );
        let placed = creature.transform().position;
        let outcome = self.creatures.spawn(creature);
        self.record_spawn(outcome, placed, out_events);
        if let Some(delay) = first_jump_after {
            self.deferred
                .schedule(self.clock.now() + delay, outcome.id, EntityCommand::Intensify);
        }
    }

    fn spawn_egg(&mut self, position: Vec2, out_events: &mut Vec<Event>) {
        let egg = Egg::new(
            position,
            self.clock.now(),
            self.egg_settings,
            self.rng.gen(),
        );
        let placed = egg.transform().position;
        let outcome = self.eggs.spawn(egg);
        self.record_spawn(outcome, placed, out_events);
    }

    fn record_spawn(&mut self, outcome: SpawnOutcome, position: Vec3, out_events: &mut Vec<Event>) {
        if let Some(evicted) = outcome.evicted {
            debug!(evicted = ?evicted, replacement = ?outcome.id, "pool_full_evicted_oldest");
            let _ = self.deferred.cancel_owner(evicted);
            out_events.push(Event::EntityEvicted { id: evicted });
        }
        out_events.push(Event::EntitySpawned {
            id: outcome.id,
            position,
        });
    }

    fn command_all(
        &mut self,
        kind: EntityKind,
        command: EntityCommand,
        out_events: &mut Vec<Event>,
    ) {
        let outcomes = match kind {
            EntityKind::Effect => self.effects.command_all(command),
            EntityKind::Creature => self.creatures.command_all(command),
            EntityKind::Egg => self.eggs.command_all(command),
        };
        debug!(kind = kind.label(), ?command, targets = outcomes.len(), "command_all");
        for (id, outcome) in outcomes {
            self.record_outcome(id, outcome, out_events);
        }
    }

    fn dispatch(&mut self, id: EntityId, command: EntityCommand) -> Option<CommandOutcome> {
        match id.kind() {
            EntityKind::Effect => self.effects.command(id, command),
            EntityKind::Creature => self.creatures.command(id, command),
            EntityKind::Egg => self.eggs.command(id, command),
        }
    }

    fn record_outcome(&mut self, id: EntityId, outcome: CommandOutcome, out_events: &mut Vec<Event>) {
        match outcome {
            CommandOutcome::Done => {}
            CommandOutcome::ResetAfter(delay) => {
                self.deferred
                    .schedule(self.clock.now() + delay, id, EntityCommand::Reset);
            }
            CommandOutcome::Transitioned(transition) => {
                push_transition(id, transition, out_events);
            }
        }
    }

    fn retire(&mut self, removed: Vec<EntityId>, out_events: &mut Vec<Event>) {
        for id in removed {
            let _ = self.deferred.cancel_owner(id);
            out_events.push(Event::EntityExpired { id });
        }
    }

    fn clear(&mut self, out_events: &mut Vec<Event>) {
        let removed =
            self.effects.clear().len() + self.creatures.clear().len() + self.eggs.clear().len();
        self.deferred.clear();
        info!(removed, "pools_cleared");
        out_events.push(Event::Cleared);
    }
}

fn push_transition(id: EntityId, transition: PhaseTransition, out_events: &mut Vec<Event>) {
    out_events.push(Event::PhaseChanged {
        id,
        from: transition.from,
        to: transition.to,
    });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Tap { position } => world.tap(position, out_events),
        Command::LongPress { position } => out_events.push(Event::LongPressed { position }),
        Command::SpawnEffect { position } => world.spawn_effect(position, out_events),
        Command::SpawnCreature {
            position,
            first_jump_after,
        } => world.spawn_creature(position, first_jump_after, out_events),
        Command::SpawnEgg { position } => world.spawn_egg(position, out_events),
        Command::CommandAll { kind, command } => world.command_all(kind, command, out_events),
        Command::Clear => world.clear(out_events),
        Command::SetQualityLevel { level } => {
            if world.quality != level {
                info!(from = world.quality.label(), to = level.label(), "quality_changed");
                world.quality = level;
                out_events.push(Event::QualityChanged { level });
            }
        }
        Command::SetDisplayBounds { bounds } => {
            debug!(min = ?bounds.min(), max = ?bounds.max(), "display_bounds_updated");
            world.bounds = bounds;
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use ar_summon_core::{Bounds, EntityId, EntityKind, QualityLevel};

    use super::{Creature, Effect, Egg, EntityPool, EntitySnapshot, World};

    /// Current simulation time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.clock.now()
    }

    /// Quality level stored in the simulation context.
    #[must_use]
    pub fn quality_level(world: &World) -> QualityLevel {
        world.quality
    }

    /// Bounds entities are confined to.
    #[must_use]
    pub fn display_bounds(world: &World) -> Bounds {
        world.bounds
    }

    /// Read-only access to the summoning circle pool.
    #[must_use]
    pub fn effects(world: &World) -> &EntityPool<Effect> {
        &world.effects
    }

    /// Read-only access to the creature pool.
    #[must_use]
    pub fn creatures(world: &World) -> &EntityPool<Creature> {
        &world.creatures
    }

    /// Read-only access to the egg pool.
    #[must_use]
    pub fn eggs(world: &World) -> &EntityPool<Egg> {
        &world.eggs
    }

    /// Number of live entities of a kind.
    #[must_use]
    pub fn entity_count(world: &World, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Effect => world.effects.len(),
            EntityKind::Creature => world.creatures.len(),
            EntityKind::Egg => world.eggs.len(),
        }
    }

    /// Snapshot of a single live entity.
    #[must_use]
    pub fn snapshot(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        match id.kind() {
            EntityKind::Effect => world.effects.get(id).map(|effect| EntitySnapshot {
                id,
                phase: effect.phase(),
                transform: effect.transform(),
            }),
            EntityKind::Creature => world.creatures.get(id).map(|creature| EntitySnapshot {
                id,
                phase: creature.phase(),
                transform: creature.transform(),
            }),
            EntityKind::Egg => world.eggs.get(id).map(|egg| EntitySnapshot {
                id,
                phase: egg.phase(),
                transform: egg.transform(),
            }),
        }
    }

    /// Snapshots of every live entity, grouped by kind and ordered by age.
    #[must_use]
    pub fn snapshots(world: &World) -> Vec<EntitySnapshot> {
        let ids = world
            .effects
            .ids()
            .into_iter()
            .chain(world.creatures.ids())
            .chain(world.eggs.ids());
        ids.filter_map(|id| snapshot(world, id)).collect()
    }

    /// Number of deferred tasks waiting for their due time.
    #[must_use]
    pub fn pending_tasks(world: &World) -> usize {
        world.deferred.len()
    }
}
