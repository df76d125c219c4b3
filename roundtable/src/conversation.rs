//! Conversation driver for `roundtable run`.
//!
//! Each turn: pick the role for the current message count, render its prompt,
//! run the executor, append the produced messages and persist. The loop stops
//! when a role asks to terminate or the message budget is spent.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::core::role::RoleId;
use crate::core::schedule::Schedule;
use crate::core::selector::{TurnSource, resolve_turn};
use crate::core::stop::requests_stop;
use crate::core::types::{Message, StopReason};
use crate::io::config::load_config;
use crate::io::conversation_store::{ConversationState, load_conversation, write_conversation};
use crate::io::executor::{RoleExecutor, TurnRequest};
use crate::io::init::RoundtablePaths;
use crate::io::plan_store::load_plan;
use crate::io::prompt::{PromptEngine, TurnPromptInput};
use crate::io::turn_log::TurnLogPaths;

/// Per-invocation overrides for `run_conversation`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `max_rounds` from config.
    pub max_rounds: Option<usize>,
}

/// What happened in one executed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    /// 1-based turn number.
    pub turn: usize,
    pub role_id: RoleId,
    pub source: TurnSource,
    pub messages_added: usize,
    /// Message count after the turn.
    pub message_count: usize,
}

/// Summary of a `run_conversation` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationOutcome {
    /// Turns executed by this invocation (not counting earlier runs).
    pub turns_executed: usize,
    pub message_count: usize,
    pub stop: StopReason,
}

/// Drive the conversation from its persisted state until it stops.
///
/// Resumes where the last run left off. A conversation that a role already
/// terminated is not continued. Any executor or I/O error aborts the run with
/// the state of the last completed turn on disk.
pub fn run_conversation<E: RoleExecutor, F: FnMut(&TurnRecord)>(
    root: &Path,
    executor: &E,
    options: &RunOptions,
    mut on_turn: F,
) -> Result<ConversationOutcome> {
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path).context("load config.toml")?;
    let max_rounds = options.max_rounds.unwrap_or(config.max_rounds);
    if max_rounds == 0 {
        bail!("max rounds must be > 0");
    }
    let registry = config.registry()?;
    let first_role = config.first_role()?;
    let task = load_plan(&paths.plan_path)
        .context("load project_plan.xml (write it with `roundtable plan`)")?;
    let schedule: Schedule = config.schedule_builder()?.build(&task);
    let engine = PromptEngine::new()?;

    let mut state = load_conversation(&paths.conversation_path)
        .context("load conversation.json")?;
    if let Some(StopReason::Terminated { by }) = &state.stop {
        info!(by = %by, "conversation already terminated");
        return Ok(ConversationOutcome {
            turns_executed: 0,
            message_count: state.message_count,
            stop: StopReason::Terminated { by: by.clone() },
        });
    }
    let kickoff = match state.kickoff.clone() {
        Some(kickoff) => kickoff,
        None => {
            let kickoff = engine.render_kickoff(&task)?;
            state = ConversationState::started(kickoff.clone());
            write_conversation(&paths.conversation_path, &state)?;
            debug!("conversation started");
            kickoff
        }
    };
    state.stop = None;

    info!(
        schedule_len = schedule.len(),
        message_count = state.message_count,
        max_rounds,
        "running conversation"
    );

    let mut turns_executed = 0usize;
    let stop = loop {
        if state.message_count >= max_rounds {
            info!(message_count = state.message_count, max_rounds, "round limit reached");
            break StopReason::MaxRounds { limit: max_rounds };
        }

        let decision = resolve_turn(state.message_count, &schedule, &registry, &first_role);
        if let TurnSource::Fallback { index, scheduled } = &decision.source {
            debug!(
                index,
                scheduled = %scheduled,
                fallback = %decision.role,
                "scheduled role is not active, falling back"
            );
        }
        let role = registry
            .lookup(&decision.role)
            .ok_or_else(|| anyhow!("role '{}' is not registered", decision.role))?;

        let turn = state.turns_completed + 1;
        let log = TurnLogPaths::new(&paths.turns_dir, turn);
        let prompt = engine.render_turn(&TurnPromptInput {
            turn,
            role_id: &decision.role,
            role,
            kickoff: &kickoff,
            history: &state.history,
        })?;
        log.write_prompt(&prompt)?;

        let request = TurnRequest {
            turn,
            role_id: decision.role.clone(),
            role,
            prompt,
            workdir: paths.root.clone(),
            log: log.clone(),
        };
        let output = executor
            .run_turn(&request)
            .with_context(|| format!("turn {turn} ({})", decision.role))?;
        log.write_output(&output)?;

        if output.messages.is_empty() {
            bail!("turn {turn} ({}) produced no messages", decision.role);
        }
        let stop_requested = requests_stop(&output);
        let messages_added = output.messages.len();
        for draft in output.messages {
            state.push(Message::attributed(&decision.role, draft));
        }
        state.turns_completed = turn;
        if stop_requested {
            state.stop = Some(StopReason::Terminated {
                by: decision.role.clone(),
            });
        }
        write_conversation(&paths.conversation_path, &state)?;
        turns_executed += 1;

        info!(
            turn,
            role_id = %decision.role,
            messages_added,
            message_count = state.message_count,
            "turn complete"
        );
        on_turn(&TurnRecord {
            turn,
            role_id: decision.role.clone(),
            source: decision.source,
            messages_added,
            message_count: state.message_count,
        });

        if stop_requested {
            break StopReason::Terminated { by: decision.role };
        }
    };

    if state.stop.is_none() {
        state.stop = Some(stop.clone());
        write_conversation(&paths.conversation_path, &state)?;
    }

    Ok(ConversationOutcome {
        turns_executed,
        message_count: state.message_count,
        stop,
    })
}
