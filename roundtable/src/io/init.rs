//! Initialization helpers for `.roundtable/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::config::{RoundtableConfig, write_config};
use super::conversation_store::{ConversationState, write_conversation};

/// All canonical paths within `.roundtable/` for a project root.
#[derive(Debug, Clone)]
pub struct RoundtablePaths {
    pub root: PathBuf,
    pub roundtable_dir: PathBuf,
    pub state_dir: PathBuf,
    pub turns_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub plan_path: PathBuf,
    pub config_path: PathBuf,
    pub conversation_path: PathBuf,
}

impl RoundtablePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let roundtable_dir = root.join(".roundtable");
        let state_dir = roundtable_dir.join("state");
        Self {
            root: root.clone(),
            roundtable_dir: roundtable_dir.clone(),
            state_dir: state_dir.clone(),
            turns_dir: roundtable_dir.join("turns"),
            gitignore_path: roundtable_dir.join(".gitignore"),
            plan_path: roundtable_dir.join("project_plan.xml"),
            config_path: roundtable_dir.join("config.toml"),
            conversation_path: state_dir.join("conversation.json"),
        }
    }
}

/// Options for `init_roundtable`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, restore config, conversation and `.gitignore` to defaults.
    /// An existing plan is kept.
    pub force: bool,
}

/// Create `.roundtable/` scaffolding in `root`.
///
/// The plan file starts empty until `roundtable plan` writes it.
/// Fails if `.roundtable/` already exists unless `options.force` is set.
pub fn init_roundtable(root: &Path, options: &InitOptions) -> Result<RoundtablePaths> {
    let paths = RoundtablePaths::new(root);
    if paths.roundtable_dir.exists() && !paths.roundtable_dir.is_dir() {
        return Err(anyhow!(
            "roundtable init: .roundtable exists but is not a directory"
        ));
    }
    if paths.roundtable_dir.exists() && !options.force {
        return Err(anyhow!(
            "roundtable init: .roundtable already exists (use --force to overwrite)"
        ));
    }
    debug!(root = %root.display(), force = options.force, "initializing roundtable");

    create_dir(&paths.roundtable_dir)?;
    create_dir(&paths.state_dir)?;
    create_dir(&paths.turns_dir)?;

    write_file(&paths.gitignore_path, ROUNDTABLE_GITIGNORE)?;
    if paths.plan_path.is_file() {
        debug!(path = %paths.plan_path.display(), "keeping existing plan");
    } else {
        write_file(&paths.plan_path, "")?;
    }
    write_config(&paths.config_path, &RoundtableConfig::default())?;
    write_conversation(&paths.conversation_path, &ConversationState::default())?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write file {}", path.display()))
}

const ROUNDTABLE_GITIGNORE: &str = "turns/\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::load_config;
    use crate::io::conversation_store::load_conversation;
    use crate::test_support::TWO_TASK_PLAN;

    fn read_to_string(path: &Path) -> String {
        fs::read_to_string(path).expect("read file")
    }

    #[test]
    fn init_creates_expected_layout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");

        assert!(paths.roundtable_dir.is_dir());
        assert!(paths.state_dir.is_dir());
        assert!(paths.turns_dir.is_dir());
        assert!(paths.plan_path.is_file());
        assert_eq!(read_to_string(&paths.plan_path), "");
        assert_eq!(read_to_string(&paths.gitignore_path), ROUNDTABLE_GITIGNORE);

        assert_eq!(
            load_config(&paths.config_path).expect("config"),
            RoundtableConfig::default()
        );
        let conversation = load_conversation(&paths.conversation_path).expect("conversation");
        assert_eq!(conversation, ConversationState::default());
    }

    #[test]
    fn init_without_force_refuses_existing_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
        let err = init_roundtable(temp.path(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_with_force_restores_defaults_but_keeps_plan() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
        fs::write(&paths.plan_path, TWO_TASK_PLAN).expect("write plan");
        fs::write(&paths.config_path, "max_rounds = 5\n").expect("write config");

        init_roundtable(temp.path(), &InitOptions { force: true }).expect("re-init");

        assert_eq!(read_to_string(&paths.plan_path), TWO_TASK_PLAN);
        assert_eq!(load_config(&paths.config_path).expect("config").max_rounds, 99);
    }

    #[test]
    fn init_with_force_recreates_missing_plan() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
        fs::remove_file(&paths.plan_path).expect("remove plan");

        init_roundtable(temp.path(), &InitOptions { force: true }).expect("re-init");
        assert_eq!(read_to_string(&paths.plan_path), "");
    }
}
