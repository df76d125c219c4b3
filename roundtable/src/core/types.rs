//! Shared deterministic types for conversation bookkeeping.
//!
//! These types define stable contracts between the conversation driver and
//! role executors. They serialize to the persisted conversation state and to
//! executor output, so field names and casing must stay stable.

use serde::{Deserialize, Serialize};

use crate::core::role::RoleId;

/// Position of a message within a logical turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// The role's request or statement.
    Request,
    /// A function/tool invocation issued by the role.
    ToolCall,
    /// The result of that invocation.
    ToolResult,
    /// Free-form reply that does not fit the request/tool pattern.
    Reply,
}

/// Message drafted by an executor, before it is attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMessage {
    pub kind: MessageKind,
    pub content: String,
}

/// Structured output of one role turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    pub messages: Vec<DraftMessage>,
    /// Role asks to end the conversation after this turn.
    #[serde(default)]
    pub terminate: bool,
}

/// A message in the append-only conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: RoleId,
    pub kind: MessageKind,
    pub content: String,
}

impl Message {
    pub fn attributed(speaker: &RoleId, draft: DraftMessage) -> Self {
        Self {
            speaker: speaker.clone(),
            kind: draft.kind,
            content: draft.content,
        }
    }
}

/// Why a conversation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum StopReason {
    /// A role signalled the end of the conversation.
    Terminated { by: RoleId },
    /// The message budget was exhausted.
    MaxRounds { limit: usize },
}
