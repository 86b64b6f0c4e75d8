//! Cancellable delayed entity commands.

use std::{collections::BTreeMap, time::Duration};

use ar_summon_core::{EntityCommand, EntityId};

/// Command waiting for its due time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferredTask {
    /// Entity the command is addressed to.
    pub owner: EntityId,
    /// Command to dispatch.
    pub command: EntityCommand,
}

/// Queue of delayed commands ordered by due time and then by scheduling order.
///
/// Removing an owner cancels its tasks; a task that outlives its owner is
/// dispatched to nobody and therefore does nothing.
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    tasks: BTreeMap<(Duration, u64), DeferredTask>,
    next_sequence: u64,
}

impl DeferredQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Reports whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Schedules a command, replacing a pending identical command for the same owner.
    pub fn schedule(&mut self, due: Duration, owner: EntityId, command: EntityCommand) {
        self.tasks
            .retain(|_, task| !(task.owner == owner && task.command == command));
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self
            .tasks
            .insert((due, sequence), DeferredTask { owner, command });
    }

    /// Removes and returns every task due at or before `now`, in order.
    pub fn take_due(&mut self, now: Duration) -> Vec<DeferredTask> {
        let pending = self.tasks.split_off(&(now, u64::MAX));
        let due = std::mem::replace(&mut self.tasks, pending);
        due.into_values().collect()
    }

    /// Cancels every task owned by `owner`, returning how many were dropped.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| task.owner != owner);
        before - self.tasks.len()
    }

    /// Cancels every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
