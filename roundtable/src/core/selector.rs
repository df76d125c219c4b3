//! Deterministic turn selection.
//!
//! Selection is a pure function of the elapsed message count: no state is kept
//! between calls. Each logical turn spans [`MESSAGES_PER_TURN`] raw messages
//! (request, tool call, tool result), so the schedule index advances once per
//! three messages and wraps around the schedule.

use crate::core::role::{RoleId, RoleRegistry};
use crate::core::schedule::Schedule;

/// Raw conversation messages that make up one logical turn.
pub const MESSAGES_PER_TURN: usize = 3;

/// How a turn's role was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSource {
    /// No messages yet: the designated opening role.
    Opening,
    /// The scheduled role at `index` is active.
    Scheduled { index: usize },
    /// The scheduled role at `index` is not active; the registry's first role
    /// was used instead.
    Fallback { index: usize, scheduled: RoleId },
}

/// Outcome of [`resolve_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDecision {
    pub role: RoleId,
    pub source: TurnSource,
}

/// Schedule index for a non-zero elapsed message count.
///
/// # Panics
///
/// Panics if `schedule` is empty. [`Schedule`] construction rules this out.
pub fn turn_index(elapsed_messages: usize, schedule: &Schedule) -> usize {
    assert!(!schedule.is_empty(), "turn selection requires a non-empty schedule");
    (elapsed_messages / MESSAGES_PER_TURN) % schedule.len()
}

/// Decide who acts after `elapsed_messages` messages, with the reason.
pub fn resolve_turn(
    elapsed_messages: usize,
    schedule: &Schedule,
    active_roles: &RoleRegistry,
    first_role: &RoleId,
) -> TurnDecision {
    if elapsed_messages == 0 {
        return TurnDecision {
            role: first_role.clone(),
            source: TurnSource::Opening,
        };
    }

    let index = turn_index(elapsed_messages, schedule);
    let candidate = &schedule.turns()[index];
    if active_roles.contains(candidate) {
        return TurnDecision {
            role: candidate.clone(),
            source: TurnSource::Scheduled { index },
        };
    }

    TurnDecision {
        role: active_roles.first().clone(),
        source: TurnSource::Fallback {
            index,
            scheduled: candidate.clone(),
        },
    }
}

/// Role whose turn it is after `elapsed_messages` messages.
pub fn select_turn(
    elapsed_messages: usize,
    schedule: &Schedule,
    active_roles: &RoleRegistry,
    first_role: &RoleId,
) -> RoleId {
    resolve_turn(elapsed_messages, schedule, active_roles, first_role).role
}
