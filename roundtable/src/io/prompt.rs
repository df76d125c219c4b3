//! Prompt rendering for the conversation kickoff and each role turn.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::plan::Task;
use crate::core::role::{Role, RoleId};
use crate::core::stop::STOP_WORD;
use crate::core::types::Message;

const KICKOFF_TEMPLATE: &str = include_str!("prompts/kickoff.md");
const TURN_TEMPLATE: &str = include_str!("prompts/turn.md");
const PLAN_TEMPLATE: &str = include_str!("prompts/plan.md");

#[derive(Debug, Clone, Serialize)]
struct SubtaskContext<'a> {
    role: &'a str,
    description: &'a str,
}

/// Inputs for one role's turn prompt.
#[derive(Debug, Clone)]
pub struct TurnPromptInput<'a> {
    /// 1-based turn number.
    pub turn: usize,
    pub role_id: &'a RoleId,
    pub role: Role,
    pub kickoff: &'a str,
    pub history: &'a [Message],
}

/// Inputs for one planning attempt.
#[derive(Debug, Clone)]
pub struct PlanPromptInput<'a> {
    /// 1-based attempt number.
    pub attempt: usize,
    pub role_id: &'a RoleId,
    pub project_prompt: &'a str,
    /// Why the previous attempt's plan was rejected.
    pub previous_error: Option<&'a str>,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("kickoff", KICKOFF_TEMPLATE)
            .context("load kickoff template")?;
        env.add_template("turn", TURN_TEMPLATE)
            .context("load turn template")?;
        env.add_template("plan", PLAN_TEMPLATE)
            .context("load plan template")?;
        Ok(Self { env })
    }

    /// Opening message: the task description and every subtask with its role.
    pub fn render_kickoff(&self, task: &Task) -> Result<String> {
        let subtasks: Vec<SubtaskContext<'_>> = task
            .subtasks()
            .iter()
            .map(|subtask| SubtaskContext {
                role: subtask.role().as_str(),
                description: subtask.description(),
            })
            .collect();
        let rendered = self
            .env
            .get_template("kickoff")?
            .render(context! {
                description => task.description(),
                subtasks => subtasks,
            })
            .context("render kickoff")?;
        Ok(rendered)
    }

    pub fn render_turn(&self, input: &TurnPromptInput<'_>) -> Result<String> {
        let rendered = self
            .env
            .get_template("turn")?
            .render(context! {
                turn => input.turn,
                role_id => input.role_id.as_str(),
                role => input.role.as_str(),
                instructions => role_instructions(input.role),
                kickoff => input.kickoff.trim(),
                history => input.history,
                stop_word => STOP_WORD,
            })
            .with_context(|| format!("render turn {} prompt", input.turn))?;
        Ok(rendered)
    }

    pub fn render_plan_prompt(&self, input: &PlanPromptInput<'_>) -> Result<String> {
        let rendered = self
            .env
            .get_template("plan")?
            .render(context! {
                attempt => input.attempt,
                role_id => input.role_id.as_str(),
                project_prompt => input.project_prompt.trim(),
                previous_error => input.previous_error,
            })
            .with_context(|| format!("render planning prompt (attempt {})", input.attempt))?;
        Ok(rendered)
    }
}

fn role_instructions(role: Role) -> &'static str {
    match role {
        Role::Planner => {
            "Own the plan. Break the task into subtasks, assign each to a role, and keep \
             `.roundtable/project_plan.xml` current. Judge whether the team is done."
        }
        Role::Implementer => {
            "Write the code for the subtasks assigned to you. Keep changes small and \
             report exactly which files you touched."
        }
        Role::Verifier => {
            "Write and run tests against the current code. Report failures precisely, \
             with the command you ran and its output."
        }
        Role::Fixer => {
            "Diagnose the most recent failure and fix it at the root cause. Re-run the \
             failing check before handing over."
        }
    }
}
