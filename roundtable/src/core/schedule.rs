//! Deterministic turn schedule built from a plan.
//!
//! A schedule is one pass over the plan's subtasks (in order, duplicates kept)
//! followed by a fixed recovery cycle. The recovery role is always schedulable,
//! even when no subtask names it.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::core::plan::Task;
use crate::core::role::{Role, RoleId};

/// Default number of times the recovery cycle is appended.
pub const DEFAULT_RECOVERY_REPEATS: usize = 3;

/// Largest accepted recovery repeat count.
pub const MAX_RECOVERY_REPEATS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("schedule must contain at least one turn")]
    Empty,
}

/// The verify -> fix -> re-implement loop appended to every schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCycle {
    pub verifier: RoleId,
    pub fixer: RoleId,
    pub implementer: RoleId,
    pub repeats: usize,
}

impl RecoveryCycle {
    /// One iteration of the cycle, in order.
    pub fn pattern(&self) -> [&RoleId; 3] {
        [&self.verifier, &self.fixer, &self.implementer]
    }
}

impl Default for RecoveryCycle {
    fn default() -> Self {
        Self {
            verifier: Role::Verifier.canonical_id(),
            fixer: Role::Fixer.canonical_id(),
            implementer: Role::Implementer.canonical_id(),
            repeats: DEFAULT_RECOVERY_REPEATS,
        }
    }
}

/// Read-only ordered sequence of role turns. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    turns: Vec<RoleId>,
}

impl Schedule {
    pub fn new(turns: Vec<RoleId>) -> Result<Self, ScheduleError> {
        if turns.is_empty() {
            return Err(ScheduleError::Empty);
        }
        Ok(Self { turns })
    }

    pub fn turns(&self) -> &[RoleId] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Builds [`Schedule`]s with a configured recovery cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleBuilder {
    recovery: RecoveryCycle,
}

impl ScheduleBuilder {
    pub fn new(recovery: RecoveryCycle) -> Self {
        Self { recovery }
    }

    /// Build the schedule for `task`.
    ///
    /// 1. Every subtask role, in plan order.
    /// 2. The fixer once, if step 1 never named it.
    /// 3. `(verifier, fixer, implementer)` repeated `repeats` times, regardless
    ///    of what already appeared.
    pub fn build(&self, task: &Task) -> Schedule {
        let mut turns = Vec::with_capacity(task.subtasks().len() + 1);
        let mut seen: HashSet<&RoleId> = HashSet::new();

        for subtask in task.subtasks() {
            turns.push(subtask.role().clone());
            seen.insert(subtask.role());
        }

        if !seen.contains(&self.recovery.fixer) {
            turns.push(self.recovery.fixer.clone());
        }

        for _ in 0..self.recovery.repeats {
            turns.extend(self.recovery.pattern().into_iter().cloned());
        }

        // Step 2 guarantees at least one turn.
        Schedule { turns }
    }
}

/// Build a schedule with the default recovery cycle.
pub fn build_schedule(task: &Task) -> Schedule {
    ScheduleBuilder::default().build(task)
}
