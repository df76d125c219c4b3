//! Persisted conversation state (`.roundtable/state/conversation.json`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{Message, StopReason};

/// Append-only conversation history plus the kickoff that opened it.
///
/// The kickoff is not part of `history` and is not counted, so the first
/// turn selection sees zero elapsed messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationState {
    pub kickoff: Option<String>,
    pub history: Vec<Message>,
    /// Always equal to `history.len()`.
    pub message_count: usize,
    /// Turns completed so far; numbers the turn log directories.
    #[serde(default)]
    pub turns_completed: usize,
    /// Set once the driver stops.
    #[serde(default)]
    pub stop: Option<StopReason>,
}

impl ConversationState {
    pub fn started(kickoff: String) -> Self {
        Self {
            kickoff: Some(kickoff),
            ..Self::default()
        }
    }

    pub fn push(&mut self, message: Message) {
        self.history.push(message);
        self.message_count = self.history.len();
    }
}

/// Load conversation state from disk.
pub fn load_conversation(path: &Path) -> Result<ConversationState> {
    debug!(path = %path.display(), "loading conversation");
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read conversation {}", path.display()))?;
    let state: ConversationState = serde_json::from_str(&contents)
        .with_context(|| format!("parse conversation {}", path.display()))?;
    if state.message_count != state.history.len() {
        return Err(anyhow!(
            "conversation {}: message_count {} does not match history length {}",
            path.display(),
            state.message_count,
            state.history.len()
        ));
    }
    debug!(message_count = state.message_count, "conversation loaded");
    Ok(state)
}

/// Atomically write conversation state to disk (temp file + rename).
pub fn write_conversation(path: &Path, state: &ConversationState) -> Result<()> {
    debug!(path = %path.display(), message_count = state.message_count, "writing conversation");
    let mut buf = serde_json::to_string_pretty(state).context("serialize conversation")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}

/// Clear the persisted conversation and remove all turn logs.
pub fn reset_conversation(conversation_path: &Path, turns_dir: &Path) -> Result<()> {
    debug!(path = %conversation_path.display(), "resetting conversation");
    write_conversation(conversation_path, &ConversationState::default())?;
    if turns_dir.exists() {
        fs::remove_dir_all(turns_dir)
            .with_context(|| format!("remove turn logs {}", turns_dir.display()))?;
    }
    fs::create_dir_all(turns_dir)
        .with_context(|| format!("create directory {}", turns_dir.display()))?;
    Ok(())
}
