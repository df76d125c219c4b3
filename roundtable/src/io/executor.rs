//! Role execution backends.
//!
//! The [`RoleExecutor`] trait decouples the conversation driver from the agent
//! backend that plays a role. [`ProcessExecutor`] spawns the configured
//! command per turn; tests use scripted executors that return predetermined
//! outputs without spawning processes.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::role::{Role, RoleId};
use crate::core::types::TurnOutput;
use crate::io::config::ExecutorConfig;
use crate::io::process::run_command_with_timeout;
use crate::io::turn_log::TurnLogPaths;

const TURN_OUTPUT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/turn_output.schema.json"
));

/// Environment variable carrying the behavior category of the current turn.
pub const ROLE_ENV: &str = "ROUNDTABLE_ROLE";
/// Environment variable carrying the scheduled role id of the current turn.
pub const ROLE_ID_ENV: &str = "ROUNDTABLE_ROLE_ID";

/// Parameters for one role turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// 1-based turn number.
    pub turn: usize,
    pub role_id: RoleId,
    pub role: Role,
    /// Rendered prompt for the role.
    pub prompt: String,
    /// Working directory for the role.
    pub workdir: PathBuf,
    /// Where this turn's artifacts are written.
    pub log: TurnLogPaths,
}

/// Abstraction over the backends that play a role for one turn.
pub trait RoleExecutor {
    fn run_turn(&self, request: &TurnRequest) -> Result<TurnOutput>;
}

/// Executor that spawns an external command per turn.
///
/// The prompt goes to stdin; stdout must be a single [`TurnOutput`] JSON
/// object. Stdout and stderr are kept in the turn's `executor.log`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    config: ExecutorConfig,
}

impl ProcessExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn command(&self, request: &TurnRequest) -> Result<Command> {
        let argv = self.config.command_for(request.role);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("executor command for {} is empty", request.role))?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&request.workdir)
            .env(ROLE_ENV, request.role.as_str())
            .env(ROLE_ID_ENV, request.role_id.as_str());
        Ok(cmd)
    }
}

impl RoleExecutor for ProcessExecutor {
    #[instrument(skip_all, fields(turn = request.turn, role_id = %request.role_id, role = %request.role))]
    fn run_turn(&self, request: &TurnRequest) -> Result<TurnOutput> {
        info!(workdir = %request.workdir.display(), "starting role executor");
        let cmd = self.command(request)?;
        let output = run_command_with_timeout(
            cmd,
            Some(request.prompt.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )
        .with_context(|| format!("run executor for {}", request.role_id))?;

        fs::create_dir_all(&request.log.dir)
            .with_context(|| format!("create turn dir {}", request.log.dir.display()))?;
        fs::write(&request.log.executor_log_path, output.transcript()).with_context(|| {
            format!(
                "write executor log {}",
                request.log.executor_log_path.display()
            )
        })?;

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "executor timed out");
            bail!(
                "executor for {} timed out after {}s",
                request.role_id,
                self.config.timeout_secs
            );
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "executor failed");
            bail!(
                "executor for {} failed with status {:?} (see {})",
                request.role_id,
                output.status.code(),
                request.log.executor_log_path.display()
            );
        }
        if output.stdout_truncated > 0 {
            bail!(
                "executor for {} produced more than {} bytes of output",
                request.role_id,
                self.config.output_limit_bytes
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_turn_output(&stdout)
            .with_context(|| format!("executor output for {}", request.role_id))?;
        debug!(messages = parsed.messages.len(), terminate = parsed.terminate, "parsed turn output");
        Ok(parsed)
    }
}

/// Parse and schema-check a [`TurnOutput`] JSON document.
pub fn parse_turn_output(raw: &str) -> Result<TurnOutput> {
    let value: Value = serde_json::from_str(raw.trim()).context("parse turn output json")?;
    validate_turn_output(&value)?;
    let output: TurnOutput =
        serde_json::from_value(value).context("deserialize turn output")?;
    Ok(output)
}

fn validate_turn_output(value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(TURN_OUTPUT_SCHEMA).context("parse turn output schema")?;
    let compiled =
        validator_for(&schema).map_err(|err| anyhow!("invalid turn output schema: {err}"))?;
    let messages: Vec<String> = compiled
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("turn output schema validation failed: {}", messages.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MessageKind;

    #[test]
    fn parses_valid_output() {
        let output = parse_turn_output(
            r#"{"messages":[{"kind":"tool_call","content":"run tests"}],"terminate":true}"#,
        )
        .expect("parse");
        assert_eq!(output.messages.len(), 1);
        assert_eq!(output.messages[0].kind, MessageKind::ToolCall);
        assert!(output.terminate);
    }

    #[test]
    fn terminate_defaults_to_false() {
        let output =
            parse_turn_output(r#"{"messages":[{"kind":"reply","content":"ok"}]}"#).expect("parse");
        assert!(!output.terminate);
    }

    #[test]
    fn rejects_schema_violations() {
        for raw in [
            r#"{"messages":[{"kind":"shout","content":"x"}]}"#,
            r#"{"messages":[{"kind":"reply"}]}"#,
            r#"{"terminate":true}"#,
            r#"{"messages":[],"extra":1}"#,
        ] {
            let err = parse_turn_output(raw).expect_err(raw);
            assert!(
                err.to_string().contains("schema validation failed"),
                "{raw}: {err}"
            );
        }
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_turn_output("I wrote the code.").expect_err("not json");
        assert!(err.to_string().contains("parse turn output json"));
    }

    #[cfg(unix)]
    fn request(workdir: &std::path::Path) -> TurnRequest {
        TurnRequest {
            turn: 1,
            role_id: RoleId::new("coder").expect("role id"),
            role: Role::Implementer,
            prompt: "prompt body".to_string(),
            workdir: workdir.to_path_buf(),
            log: TurnLogPaths::new(&workdir.join("turns"), 1),
        }
    }

    #[cfg(unix)]
    fn sh(script: &str) -> ExecutorConfig {
        ExecutorConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            timeout_secs: 10,
            ..ExecutorConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn process_executor_passes_role_env_and_reads_stdout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = ProcessExecutor::new(sh(
            r#"cat >/dev/null; printf '{"messages":[{"kind":"reply","content":"%s/%s"}]}' "$ROUNDTABLE_ROLE" "$ROUNDTABLE_ROLE_ID""#,
        ));
        let req = request(temp.path());

        let output = executor.run_turn(&req).expect("run");
        assert_eq!(output.messages[0].content, "implementer/coder");
        assert!(req.log.executor_log_path.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn process_executor_uses_role_override() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = sh("exit 3");
        config.commands.insert(
            "implementer".to_string(),
            vec![
                "sh".to_string(),
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"messages":[{"kind":"reply","content":"override"}]}'"#
                    .to_string(),
            ],
        );
        let output = ProcessExecutor::new(config)
            .run_turn(&request(temp.path()))
            .expect("run");
        assert_eq!(output.messages[0].content, "override");
    }

    #[cfg(unix)]
    #[test]
    fn process_executor_reports_failure_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = ProcessExecutor::new(sh("cat >/dev/null; echo boom >&2; exit 3"))
            .run_turn(&request(temp.path()))
            .expect_err("failure");
        assert!(err.to_string().contains("failed with status Some(3)"));
        let log = fs::read_to_string(temp.path().join("turns/1/executor.log")).expect("log");
        assert!(log.contains("boom"));
    }
}
