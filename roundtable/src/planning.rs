//! Planning phase for `roundtable plan`.
//!
//! The planner role turns a free-form project request into the plan document
//! the conversation is scheduled from. Each attempt is one planner turn: the
//! newest message carrying a `<project_plan>` document is parsed and, once it
//! is valid, written to `.roundtable/project_plan.xml`. A rejected document's
//! error is fed back into the next attempt's prompt.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use crate::core::plan::{PLAN_ROOT, Task, find_plan_document, parse_plan};
use crate::core::role::Role;
use crate::core::types::TurnOutput;
use crate::io::config::load_config;
use crate::io::conversation_store::load_conversation;
use crate::io::executor::{RoleExecutor, TurnRequest};
use crate::io::init::RoundtablePaths;
use crate::io::plan_store::write_plan;
use crate::io::prompt::{PlanPromptInput, PromptEngine};
use crate::io::turn_log::TurnLogPaths;

/// Directory under `turns/` holding planning attempt logs.
pub const PLANNING_LOG_DIR: &str = "plan";

/// Per-invocation overrides for `plan_from_prompt`.
#[derive(Debug, Clone, Default)]
pub struct PlanningOptions {
    /// Overrides `planning_rounds` from config.
    pub max_attempts: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningOutcome {
    /// Attempts used, including the successful one.
    pub attempts: usize,
    pub task: Task,
}

/// Log paths for a 1-based planning attempt.
pub fn planning_log(paths: &RoundtablePaths, attempt: usize) -> TurnLogPaths {
    TurnLogPaths::in_dir(
        paths
            .turns_dir
            .join(PLANNING_LOG_DIR)
            .join(attempt.to_string()),
    )
}

/// Ask the planner for a plan and persist the first valid one.
///
/// Refuses to re-plan a conversation that has already started, since its
/// kickoff was rendered from the current plan.
pub fn plan_from_prompt<E: RoleExecutor>(
    root: &Path,
    executor: &E,
    project_prompt: &str,
    options: &PlanningOptions,
) -> Result<PlanningOutcome> {
    if project_prompt.trim().is_empty() {
        bail!("project prompt must be non-empty");
    }
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path).context("load config.toml")?;
    let max_attempts = options.max_attempts.unwrap_or(config.planning_rounds);
    if max_attempts == 0 {
        bail!("planning attempts must be > 0");
    }
    let registry = config.registry()?;
    let planner = registry
        .id_for(Role::Planner)
        .cloned()
        .ok_or_else(|| anyhow!("no registered role acts as {}", Role::Planner))?;

    let state = load_conversation(&paths.conversation_path).context("load conversation.json")?;
    if state.kickoff.is_some() || state.message_count > 0 {
        bail!("conversation already started; run `roundtable reset` before planning again");
    }

    let engine = PromptEngine::new()?;
    info!(planner = %planner, max_attempts, "planning");

    let mut previous_error: Option<String> = None;
    for attempt in 1..=max_attempts {
        let log = planning_log(&paths, attempt);
        let prompt = engine.render_plan_prompt(&PlanPromptInput {
            attempt,
            role_id: &planner,
            project_prompt,
            previous_error: previous_error.as_deref(),
        })?;
        log.write_prompt(&prompt)?;

        let request = TurnRequest {
            turn: attempt,
            role_id: planner.clone(),
            role: Role::Planner,
            prompt,
            workdir: paths.root.clone(),
            log: log.clone(),
        };
        let output = executor
            .run_turn(&request)
            .with_context(|| format!("planning attempt {attempt} ({planner})"))?;
        log.write_output(&output)?;

        match plan_from_output(&output) {
            Ok(task) => {
                write_plan(&paths.plan_path, &task)?;
                info!(
                    attempt,
                    name = task.name(),
                    subtasks = task.subtasks().len(),
                    "plan written"
                );
                return Ok(PlanningOutcome {
                    attempts: attempt,
                    task,
                });
            }
            Err(err) => {
                warn!(attempt, error = %format!("{err:#}"), "planner output rejected");
                previous_error = Some(format!("{err:#}"));
            }
        }
    }

    bail!(
        "planner produced no valid plan after {max_attempts} attempts: {}",
        previous_error.unwrap_or_default()
    )
}

fn plan_from_output(output: &TurnOutput) -> Result<Task> {
    let document = output
        .messages
        .iter()
        .rev()
        .find_map(|message| find_plan_document(&message.content))
        .ok_or_else(|| anyhow!("no <{PLAN_ROOT}> document in planner output"))?;
    Ok(parse_plan(document)?)
}
