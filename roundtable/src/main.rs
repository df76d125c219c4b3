//! Multi-role conversation runner.
//!
//! `roundtable plan` asks the planner role to turn a project request into
//! `.roundtable/project_plan.xml`. `roundtable run` builds a deterministic turn
//! schedule from that plan and drives the roles through the conversation, one
//! turn at a time, with the schedule deciding who speaks next.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use roundtable::conversation::{RunOptions, run_conversation};
use roundtable::core::selector::TurnSource;
use roundtable::core::types::StopReason;
use roundtable::exit_codes;
use roundtable::io::config::load_config;
use roundtable::io::conversation_store::reset_conversation;
use roundtable::io::executor::ProcessExecutor;
use roundtable::io::init::{InitOptions, RoundtablePaths, init_roundtable};
use roundtable::logging;
use roundtable::planning::{PlanningOptions, plan_from_prompt};
use roundtable::select::{next_from_root, schedule_from_root};
use roundtable::validate::validate_roundtable;

#[derive(Parser)]
#[command(
    name = "roundtable",
    version,
    about = "Deterministic turn scheduling for multi-role coding conversations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.roundtable/` with an empty plan, default config and empty conversation.
    Init {
        /// Restore config and conversation to defaults. An existing plan is kept.
        #[arg(short, long)]
        force: bool,
    },
    /// Ask the planner role to write the plan from a project request.
    Plan {
        /// Project request text.
        #[arg(long, conflicts_with = "prompt_file", required_unless_present = "prompt_file")]
        prompt: Option<String>,
        /// Read the project request from a file.
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Override `planning_rounds` from config.
        #[arg(long)]
        attempts: Option<usize>,
    },
    /// Check layout, config and plan.
    Validate,
    /// Print the turn schedule, one role per line.
    Schedule,
    /// Print the role that speaks next.
    Next {
        /// Elapsed message count (default: the persisted conversation's count).
        #[arg(long)]
        elapsed: Option<usize>,
    },
    /// Drive the conversation until a role terminates it or the round limit is hit.
    Run {
        /// Override `max_rounds` from config.
        #[arg(long)]
        max_rounds: Option<usize>,
    },
    /// Clear the conversation and turn logs, keeping plan and config.
    Reset,
}

fn main() -> ExitCode {
    logging::init();
    match run(Cli::parse()) {
        Ok(code) => exit_code(code),
        Err(err) => {
            eprintln!("{err:#}");
            exit_code(exit_codes::INVALID)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: Cli) -> Result<i32> {
    let root = Path::new(".");
    match cli.command {
        Command::Init { force } => cmd_init(root, force),
        Command::Plan {
            prompt,
            prompt_file,
            attempts,
        } => cmd_plan(root, prompt, prompt_file, attempts),
        Command::Validate => cmd_validate(root),
        Command::Schedule => cmd_schedule(root),
        Command::Next { elapsed } => cmd_next(root, elapsed),
        Command::Run { max_rounds } => cmd_run(root, max_rounds),
        Command::Reset => cmd_reset(root),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_roundtable(root, &InitOptions { force })?;
    println!("initialized {}", paths.roundtable_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_plan(
    root: &Path,
    prompt: Option<String>,
    prompt_file: Option<PathBuf>,
    attempts: Option<usize>,
) -> Result<i32> {
    let project_prompt = match (prompt, prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("read prompt file {}", path.display()))?,
        (None, None) => bail!("either --prompt or --prompt-file is required"),
    };
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path)?;
    let executor = ProcessExecutor::new(config.executor);
    let outcome = plan_from_prompt(
        root,
        &executor,
        &project_prompt,
        &PlanningOptions {
            max_attempts: attempts,
        },
    )?;
    println!(
        "wrote plan '{}' ({} subtasks) after {} attempt(s)",
        outcome.task.name(),
        outcome.task.subtasks().len(),
        outcome.attempts
    );
    Ok(exit_codes::OK)
}

fn cmd_validate(root: &Path) -> Result<i32> {
    let outcome = validate_roundtable(root)?;
    println!(
        "ok: plan '{}' ({} subtasks, {} scheduled turns, {} messages so far)",
        outcome.plan_name, outcome.subtasks, outcome.schedule_len, outcome.message_count
    );
    Ok(exit_codes::OK)
}

fn cmd_schedule(root: &Path) -> Result<i32> {
    let schedule = schedule_from_root(root)?;
    for role in schedule.turns() {
        println!("{role}");
    }
    Ok(exit_codes::OK)
}

fn cmd_next(root: &Path, elapsed: Option<usize>) -> Result<i32> {
    let next = next_from_root(root, elapsed)?;
    println!("{}", next.decision.role);
    if let TurnSource::Fallback { scheduled, .. } = &next.decision.source {
        eprintln!("note: scheduled role '{scheduled}' is not active");
    }
    Ok(exit_codes::OK)
}

fn cmd_run(root: &Path, max_rounds: Option<usize>) -> Result<i32> {
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path)?;
    let executor = ProcessExecutor::new(config.executor);
    let outcome = run_conversation(root, &executor, &RunOptions { max_rounds }, |turn| {
        println!(
            "turn {}: {} (+{} messages, {} total)",
            turn.turn, turn.role_id, turn.messages_added, turn.message_count
        );
    })?;
    match outcome.stop {
        StopReason::Terminated { by } => {
            println!(
                "terminated by {by} after {} messages",
                outcome.message_count
            );
            Ok(exit_codes::OK)
        }
        StopReason::MaxRounds { limit } => {
            println!("round limit {limit} reached after {} messages", outcome.message_count);
            Ok(exit_codes::ROUND_LIMIT)
        }
    }
}

fn cmd_reset(root: &Path) -> Result<i32> {
    let paths = RoundtablePaths::new(root);
    reset_conversation(&paths.conversation_path, &paths.turns_dir)?;
    println!("conversation reset");
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["roundtable", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["roundtable", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_plan_with_inline_prompt() {
        let cli = Cli::parse_from(["roundtable", "plan", "--prompt", "Build a calculator"]);
        match cli.command {
            Command::Plan {
                prompt,
                prompt_file,
                attempts,
            } => {
                assert_eq!(prompt.as_deref(), Some("Build a calculator"));
                assert!(prompt_file.is_none());
                assert!(attempts.is_none());
            }
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn parse_plan_requires_exactly_one_prompt_source() {
        assert!(Cli::try_parse_from(["roundtable", "plan"]).is_err());
        assert!(
            Cli::try_parse_from([
                "roundtable",
                "plan",
                "--prompt",
                "x",
                "--prompt-file",
                "request.md"
            ])
            .is_err()
        );
        let cli = Cli::parse_from(["roundtable", "plan", "--prompt-file", "request.md", "--attempts", "5"]);
        assert!(matches!(
            cli.command,
            Command::Plan {
                prompt: None,
                prompt_file: Some(_),
                attempts: Some(5)
            }
        ));
    }

    #[test]
    fn parse_next_with_elapsed() {
        let cli = Cli::parse_from(["roundtable", "next", "--elapsed", "9"]);
        assert!(matches!(cli.command, Command::Next { elapsed: Some(9) }));
    }

    #[test]
    fn parse_run_defaults_to_config_limit() {
        let cli = Cli::parse_from(["roundtable", "run"]);
        assert!(matches!(cli.command, Command::Run { max_rounds: None }));
    }

    #[test]
    fn rejects_negative_elapsed() {
        assert!(Cli::try_parse_from(["roundtable", "next", "--elapsed", "-1"]).is_err());
    }
}
