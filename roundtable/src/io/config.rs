//! Roundtable configuration stored under `.roundtable/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::role::{Role, RoleEntry, RoleId, RoleRegistry, default_entries};
use crate::core::schedule::{
    DEFAULT_RECOVERY_REPEATS, MAX_RECOVERY_REPEATS, RecoveryCycle, ScheduleBuilder,
};

const ROLE_NAMES: [&str; 4] = [
    Role::Planner.as_str(),
    Role::Implementer.as_str(),
    Role::Verifier.as_str(),
    Role::Fixer.as_str(),
];

/// Roundtable configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to the
/// values the scheduler was designed around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoundtableConfig {
    /// Role that speaks first, before any message exists.
    pub first_role: String,

    /// Upper bound on conversation messages before the driver stops.
    pub max_rounds: usize,

    /// Planner attempts `roundtable plan` makes before giving up.
    pub planning_rounds: usize,

    pub recovery: RecoveryConfig,

    pub executor: ExecutorConfig,

    /// Active roles in definition order. The first entry is the fallback role.
    pub roles: Vec<RoleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryConfig {
    pub verifier: String,
    pub fixer: String,
    pub implementer: String,
    /// Times the verifier -> fixer -> implementer cycle is appended.
    pub repeats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleConfig {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Command run for every turn; the prompt is written to its stdin.
    pub command: Vec<String>,

    /// Wall-clock budget for a single turn, in seconds.
    pub timeout_secs: u64,

    /// Truncate executor stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Per-role overrides of `command`, keyed by role name (`planner`,
    /// `implementer`, `verifier`, `fixer`).
    pub commands: BTreeMap<String, Vec<String>>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            verifier: Role::Verifier.as_str().to_string(),
            fixer: Role::Fixer.as_str().to_string(),
            implementer: Role::Implementer.as_str().to_string(),
            repeats: DEFAULT_RECOVERY_REPEATS,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command: vec!["codex".to_string(), "exec".to_string(), "-".to_string()],
            timeout_secs: 30 * 60,
            output_limit_bytes: 100_000,
            commands: BTreeMap::new(),
        }
    }
}

impl Default for RoundtableConfig {
    fn default() -> Self {
        Self {
            first_role: Role::Planner.as_str().to_string(),
            max_rounds: 99,
            planning_rounds: 3,
            recovery: RecoveryConfig::default(),
            executor: ExecutorConfig::default(),
            roles: default_entries()
                .into_iter()
                .map(|entry| RoleConfig {
                    id: entry.id.to_string(),
                    role: entry.role,
                })
                .collect(),
        }
    }
}

impl ExecutorConfig {
    /// Command for `role`: the per-role override if present, else the default.
    pub fn command_for(&self, role: Role) -> &[String] {
        self.commands
            .get(role.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&self.command)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RoundtableConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(anyhow!("max_rounds must be > 0"));
        }
        if self.planning_rounds == 0 {
            return Err(anyhow!("planning_rounds must be > 0"));
        }
        if self.recovery.repeats == 0 || self.recovery.repeats > MAX_RECOVERY_REPEATS {
            return Err(anyhow!(
                "recovery.repeats must be between 1 and {MAX_RECOVERY_REPEATS}"
            ));
        }
        if self.executor.timeout_secs == 0 {
            return Err(anyhow!("executor.timeout_secs must be > 0"));
        }
        if self.executor.output_limit_bytes == 0 {
            return Err(anyhow!("executor.output_limit_bytes must be > 0"));
        }
        validate_command("executor.command", &self.executor.command)?;
        for (name, command) in &self.executor.commands {
            if !ROLE_NAMES.contains(&name.as_str()) {
                return Err(anyhow!(
                    "executor.commands.{name}: unknown role (expected one of {})",
                    ROLE_NAMES.join(", ")
                ));
            }
            validate_command(&format!("executor.commands.{name}"), command)?;
        }

        let registry = self.registry()?;
        let first = self.first_role()?;
        if !registry.contains(&first) {
            return Err(anyhow!("first_role '{first}' is not a registered role"));
        }
        self.recovery_cycle()?;
        Ok(())
    }

    /// Active role registry built from `roles`.
    pub fn registry(&self) -> Result<RoleRegistry> {
        let entries = self
            .roles
            .iter()
            .map(|entry| {
                Ok(RoleEntry {
                    id: RoleId::new(&entry.id).context("roles.id")?,
                    role: entry.role,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        RoleRegistry::new(entries).context("roles")
    }

    pub fn first_role(&self) -> Result<RoleId> {
        RoleId::new(&self.first_role).context("first_role")
    }

    pub fn recovery_cycle(&self) -> Result<RecoveryCycle> {
        Ok(RecoveryCycle {
            verifier: RoleId::new(&self.recovery.verifier).context("recovery.verifier")?,
            fixer: RoleId::new(&self.recovery.fixer).context("recovery.fixer")?,
            implementer: RoleId::new(&self.recovery.implementer)
                .context("recovery.implementer")?,
            repeats: self.recovery.repeats,
        })
    }

    pub fn schedule_builder(&self) -> Result<ScheduleBuilder> {
        Ok(ScheduleBuilder::new(self.recovery_cycle()?))
    }
}

fn validate_command(label: &str, command: &[String]) -> Result<()> {
    if command.is_empty() || command[0].trim().is_empty() {
        return Err(anyhow!("{label} must be a non-empty array"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RoundtableConfig::default()`.
pub fn load_config(path: &Path) -> Result<RoundtableConfig> {
    if !path.exists() {
        let cfg = RoundtableConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RoundtableConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RoundtableConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf)
}
