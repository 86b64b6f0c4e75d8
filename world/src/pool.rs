//! Bounded, insertion-ordered entity storage.

use std::{collections::VecDeque, time::Duration};

use ar_summon_core::{ConfigError, EntityCommand, EntityId, EntityKind};
use glam::Vec2;

use crate::phase::PhaseTransition;

/// Entities that occupy a point on the placement plane.
pub trait Positioned {
    /// Current position used for proximity queries.
    fn position(&self) -> Vec2;
}

/// Capabilities every entity kind exposes to pool-wide commands.
pub trait EntityBehaviour {
    /// Restores transient reaction parameters to their resting values.
    fn reset(&mut self);

    /// Triggers the tap reaction, returning when it should be reset, if ever.
    fn intensify(&mut self) -> Option<Duration>;

    /// Marks the entity expired so the next update removes it.
    fn destroy(&mut self) -> Option<PhaseTransition>;
}

/// Result of dispatching an [`EntityCommand`] to one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command completed without follow-up work.
    Done,
    /// The entity asks to be reset after the provided delay.
    ResetAfter(Duration),
    /// The entity changed phase as a result of the command.
    Transitioned(PhaseTransition),
}

fn dispatch<T: EntityBehaviour>(entity: &mut T, command: EntityCommand) -> CommandOutcome {
    match command {
        EntityCommand::Reset => {
            entity.reset();
            CommandOutcome::Done
        }
        EntityCommand::Intensify => entity
            .intensify()
            .map_or(CommandOutcome::Done, CommandOutcome::ResetAfter),
        EntityCommand::Destroy => entity
            .destroy()
            .map_or(CommandOutcome::Done, CommandOutcome::Transitioned),
    }
}

/// Identifiers produced by a spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnOutcome {
    /// Identifier of the inserted entity.
    pub id: EntityId,
    /// Identifier of the entity evicted to make room, if the pool was full.
    pub evicted: Option<EntityId>,
}

/// Bounded pool that evicts its oldest entity when full.
#[derive(Clone, Debug)]
pub struct EntityPool<T> {
    kind: EntityKind,
    capacity: usize,
    next_serial: u32,
    entries: VecDeque<(EntityId, T)>,
}

impl<T> EntityPool<T> {
    /// Creates an empty pool; a zero capacity is a configuration error.
    pub fn new(kind: EntityKind, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity { kind });
        }
        Ok(Self {
            kind,
            capacity,
            next_serial: 0,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    /// Kind of entity stored in the pool.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Maximum number of live entities.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the pool holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entity, evicting the oldest one first when the pool is full.
    pub fn spawn(&mut self, entity: T) -> SpawnOutcome {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front().map(|(id, _)| id)
        } else {
            None
        };
        let id = EntityId::new(self.kind, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);
        self.entries.push_back((id, entity));
        SpawnOutcome { id, evicted }
    }

    /// Runs `update` on every entity and removes those reporting `false`.
    ///
    /// Survivors keep their relative order. Returns the removed identifiers in
    /// age order.
    pub fn update<F>(&mut self, mut update: F) -> Vec<EntityId>
    where
        F: FnMut(EntityId, &mut T) -> bool,
    {
        let mut removed = Vec::new();
        self.entries.retain_mut(|(id, entity)| {
            let keep = update(*id, entity);
            if !keep {
                removed.push(*id);
            }
            keep
        });
        removed
    }

    /// Visits every entity from oldest to newest.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(EntityId, &T),
    {
        for (id, entity) in &self.entries {
            visit(*id, entity);
        }
    }

    /// Iterates over entities from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.entries.iter().map(|(id, entity)| (*id, entity))
    }

    /// Identifiers of live entities from oldest to newest.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Looks up an entity by identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, entity)| entity)
    }

    /// Looks up an entity by identifier for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, entity)| entity)
    }

    /// Removes a single entity.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.entries.iter().position(|(candidate, _)| *candidate == id)?;
        self.entries.remove(index).map(|(_, entity)| entity)
    }

    /// Removes every entity and returns their identifiers; repeated calls are harmless.
    pub fn clear(&mut self) -> Vec<EntityId> {
        self.entries.drain(..).map(|(id, _)| id).collect()
    }
}

impl<T: Positioned> EntityPool<T> {
    /// First entity in age order whose position lies within `radius` of `point`.
    #[must_use]
    pub fn find_near(&self, point: Vec2, radius: f32) -> Option<EntityId> {
        self.entries
            .iter()
            .find(|(_, entity)| entity.position().distance(point) <= radius)
            .map(|(id, _)| *id)
    }
}

impl<T: EntityBehaviour> EntityPool<T> {
    /// Dispatches a command to every entity, oldest first.
    pub fn command_all(&mut self, command: EntityCommand) -> Vec<(EntityId, CommandOutcome)> {
        self.entries
            .iter_mut()
            .map(|(id, entity)| (*id, dispatch(entity, command)))
            .collect()
    }

    /// Dispatches a command to a single entity, if it is still alive.
    pub fn command(&mut self, id: EntityId, command: EntityCommand) -> Option<CommandOutcome> {
        self.get_mut(id).map(|entity| dispatch(entity, command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker {
        label: char,
        position: Vec2,
        resets: u32,
    }

    impl Marker {
        fn new(label: char) -> Self {
            Self {
                label,
                position: Vec2::ZERO,
                resets: 0,
            }
        }
    }

    impl Positioned for Marker {
        fn position(&self) -> Vec2 {
            self.position
        }
    }

    impl EntityBehaviour for Marker {
        fn reset(&mut self) {
            self.resets += 1;
        }

        fn intensify(&mut self) -> Option<Duration> {
            Some(Duration::from_millis(250))
        }

        fn destroy(&mut self) -> Option<PhaseTransition> {
            None
        }
    }

    fn labels(pool: &EntityPool<Marker>) -> String {
        pool.iter().map(|(_, marker)| marker.label).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            EntityPool::<Marker>::new(EntityKind::Egg, 0).unwrap_err(),
            ConfigError::ZeroCapacity {
                kind: EntityKind::Egg
            }
        );
    }

    #[test]
    fn evicts_oldest_before_inserting() {
        let mut pool = EntityPool::new(EntityKind::Creature, 3).expect("capacity");
        let ids: Vec<EntityId> = ['A', 'B', 'C']
            .into_iter()
            .map(|label| pool.spawn(Marker::new(label)).id)
            .collect();
        assert_eq!(labels(&pool), "ABC");

        let outcome = pool.spawn(Marker::new('D'));
        assert_eq!(outcome.evicted, Some(ids[0]));
        assert_eq!(labels(&pool), "BCD");

        let outcome = pool.spawn(Marker::new('E'));
        assert_eq!(outcome.evicted, Some(ids[1]));
        assert_eq!(labels(&pool), "CDE");
    }

    #[test]
    fn size_never_exceeds_capacity_and_keeps_most_recent() {
        for capacity in 1..=5 {
            let mut pool = EntityPool::new(EntityKind::Effect, capacity).expect("capacity");
            let labels_in: Vec<char> = ('a'..='z').collect();
            for label in &labels_in {
                let _ = pool.spawn(Marker::new(*label));
                assert!(pool.len() <= capacity);
            }
            let expected: String = labels_in[labels_in.len() - capacity..].iter().collect();
            assert_eq!(labels(&pool), expected);
        }
    }

    #[test]
    fn update_removes_inactive_entities_preserving_order() {
        let mut pool = EntityPool::new(EntityKind::Egg, 4).expect("capacity");
        let ids: Vec<EntityId> = ['A', 'B', 'C', 'D']
            .into_iter()
            .map(|label| pool.spawn(Marker::new(label)).id)
            .collect();

        let removed = pool.update(|_, marker| marker.label != 'B' && marker.label != 'D');
        assert_eq!(removed, vec![ids[1], ids[3]]);
        assert_eq!(labels(&pool), "AC");
    }

    #[test]
    fn find_near_returns_first_match_in_age_order() {
        let mut pool = EntityPool::new(EntityKind::Egg, 3).expect("capacity");
        let mut far = Marker::new('A');
        far.position = Vec2::new(100.0, 0.0);
        let _ = pool.spawn(far);
        let mut near_old = Marker::new('B');
        near_old.position = Vec2::new(10.0, 0.0);
        let old = pool.spawn(near_old).id;
        let mut near_new = Marker::new('C');
        near_new.position = Vec2::new(1.0, 0.0);
        let _ = pool.spawn(near_new);

        assert_eq!(pool.find_near(Vec2::ZERO, 30.0), Some(old));
        assert_eq!(pool.find_near(Vec2::new(0.0, 500.0), 30.0), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut pool = EntityPool::new(EntityKind::Effect, 2).expect("capacity");
        let _ = pool.spawn(Marker::new('A'));
        assert_eq!(pool.clear().len(), 1);
        assert!(pool.clear().is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn commands_reach_every_entity() {
        let mut pool = EntityPool::new(EntityKind::Creature, 3).expect("capacity");
        let first = pool.spawn(Marker::new('A')).id;
        let _ = pool.spawn(Marker::new('B'));

        let outcomes = pool.command_all(EntityCommand::Reset);
        assert_eq!(outcomes.len(), 2);
        pool.for_each(|_, marker| assert_eq!(marker.resets, 1));

        assert_eq!(
            pool.command(first, EntityCommand::Intensify),
            Some(CommandOutcome::ResetAfter(Duration::from_millis(250)))
        );
        let _ = pool.remove(first);
        assert_eq!(pool.command(first, EntityCommand::Destroy), None);
    }
}
