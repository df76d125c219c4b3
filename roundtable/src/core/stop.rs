//! Detection of the conversation stop signal.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::TurnOutput;

/// Word a role emits to end the conversation.
pub const STOP_WORD: &str = "TERMINATE";

static STOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTERMINATE\b").expect("stop word pattern should be valid"));

/// True if `content` carries the stop word as a whole word.
pub fn contains_stop_word(content: &str) -> bool {
    STOP_RE.is_match(content)
}

/// True if the turn output asks to end the conversation, either explicitly or
/// through the stop word in any message.
pub fn requests_stop(output: &TurnOutput) -> bool {
    output.terminate
        || output
            .messages
            .iter()
            .any(|message| contains_stop_word(&message.content))
}
