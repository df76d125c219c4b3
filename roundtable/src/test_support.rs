//! Test-only helpers: plan fixtures, a scripted executor and a temp workspace.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::plan::{Subtask, Task};
use crate::core::role::RoleId;
use crate::core::types::{DraftMessage, MessageKind, TurnOutput};
use crate::io::config::{RoundtableConfig, write_config};
use crate::io::executor::{RoleExecutor, TurnRequest};
use crate::io::init::{InitOptions, RoundtablePaths, init_roundtable};

/// Plan with a planner subtask followed by a coder subtask.
pub const TWO_TASK_PLAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project_plan>
  <name>calculator</name>
  <description>Build a CLI calculator</description>
  <delegatedTo>
    <agent>planner</agent>
    <agent>coder</agent>
  </delegatedTo>
  <tasks>
    <task><name>design</name><delegatedTo>planner</delegatedTo></task>
    <task><name>implement</name><delegatedTo>coder</delegatedTo></task>
  </tasks>
</project_plan>
"#;

/// Plan whose second task has no role.
pub const BROKEN_PLAN: &str = r#"<project_plan>
  <name>calculator</name>
  <description>Build a CLI calculator</description>
  <tasks>
    <task><name>design</name><delegatedTo>planner</delegatedTo></task>
    <task><name>implement</name></task>
  </tasks>
</project_plan>
"#;

/// Role id from a literal known to be valid.
pub fn role(raw: &str) -> RoleId {
    RoleId::new(raw).expect("test role id")
}

/// Task with deterministic name/description and the given `(description, role)` subtasks.
pub fn task_with_subtasks(subtasks: &[(&str, &str)]) -> Task {
    let subtasks = subtasks
        .iter()
        .map(|(description, role)| Subtask::new(description, role).expect("test subtask"))
        .collect();
    Task::new("fixture", "fixture task description", Vec::new(), subtasks).expect("test task")
}

/// Turn output made of one message per `(kind, content)` pair.
pub fn turn_output(messages: &[(MessageKind, &str)], terminate: bool) -> TurnOutput {
    TurnOutput {
        messages: messages
            .iter()
            .map(|(kind, content)| DraftMessage {
                kind: *kind,
                content: content.to_string(),
            })
            .collect(),
        terminate,
    }
}

/// A full request / tool call / tool result turn.
pub fn full_turn(label: &str) -> TurnOutput {
    turn_output(
        &[
            (MessageKind::Request, &format!("{label}: request")),
            (MessageKind::ToolCall, &format!("{label}: tool call")),
            (MessageKind::ToolResult, &format!("{label}: tool result")),
        ],
        false,
    )
}

/// Executor that replays queued outputs and records every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    outputs: RefCell<VecDeque<TurnOutput>>,
    requests: RefCell<Vec<TurnRequest>>,
}

impl ScriptedExecutor {
    pub fn new(outputs: Vec<TurnOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Role ids of every turn run so far, in order.
    pub fn speakers(&self) -> Vec<RoleId> {
        self.requests
            .borrow()
            .iter()
            .map(|request| request.role_id.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.outputs.borrow().len()
    }
}

impl RoleExecutor for ScriptedExecutor {
    fn run_turn(&self, request: &TurnRequest) -> Result<TurnOutput> {
        self.requests.borrow_mut().push(request.clone());
        self.outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted executor exhausted at turn {}", request.turn))
    }
}

/// Temp directory with an initialized `.roundtable/` layout.
pub struct TestWorkspace {
    dir: TempDir,
    paths: RoundtablePaths,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        let paths = init_roundtable(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir, paths })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &RoundtablePaths {
        &self.paths
    }

    pub fn write_plan_xml(&self, contents: &str) -> Result<()> {
        fs::write(&self.paths.plan_path, contents)
            .with_context(|| format!("write plan {}", self.paths.plan_path.display()))
    }

    pub fn write_config(&self, config: &RoundtableConfig) -> Result<()> {
        write_config(&self.paths.config_path, config)
    }
}
