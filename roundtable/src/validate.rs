//! Validation helpers for the `.roundtable/` layout, config and plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::io::config::load_config;
use crate::io::conversation_store::load_conversation;
use crate::io::init::RoundtablePaths;
use crate::io::plan_store::load_plan;

/// Summary of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub plan_name: String,
    pub subtasks: usize,
    pub schedule_len: usize,
    pub message_count: usize,
}

/// Validate `.roundtable/` layout, config, plan and conversation state.
pub fn validate_roundtable(root: &Path) -> Result<ValidateOutcome> {
    let paths = RoundtablePaths::new(root);

    ensure_dir(&paths.roundtable_dir)?;
    ensure_dir(&paths.state_dir)?;
    ensure_dir(&paths.turns_dir)?;
    ensure_file(&paths.gitignore_path)?;
    ensure_file(&paths.plan_path)?;
    ensure_file(&paths.config_path)?;
    ensure_file(&paths.conversation_path)?;
    ensure_gitignore(&paths.gitignore_path)?;

    let config = load_config(&paths.config_path).context("load config.toml")?;
    let task = load_plan(&paths.plan_path).context("load project_plan.xml")?;
    let schedule = config.schedule_builder()?.build(&task);
    let conversation =
        load_conversation(&paths.conversation_path).context("load conversation.json")?;

    Ok(ValidateOutcome {
        plan_name: task.name().to_string(),
        subtasks: task.subtasks().len(),
        schedule_len: schedule.len(),
        message_count: conversation.message_count,
    })
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(anyhow!("missing directory {}", path.display()));
    }
    Ok(())
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("missing file {}", path.display()));
    }
    Ok(())
}

fn ensure_gitignore(path: &Path) -> Result<()> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if !contents.lines().any(|line| line.trim() == "turns/") {
        return Err(anyhow!("{} must ignore turns/", path.display()));
    }
    Ok(())
}
