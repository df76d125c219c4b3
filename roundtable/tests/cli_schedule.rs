//! CLI tests for the `roundtable` binary.
//!
//! Spawns the binary against temp workspaces and checks stdout and exit codes
//! for the read-only commands and for `plan` and `run` with shell-scripted roles.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use roundtable::exit_codes;
use roundtable::io::config::{RoundtableConfig, write_config};
use roundtable::io::conversation_store::load_conversation;
use roundtable::io::init::{InitOptions, RoundtablePaths, init_roundtable};
use roundtable::test_support::{BROKEN_PLAN, TWO_TASK_PLAN};

fn roundtable(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_roundtable"))
        .current_dir(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn roundtable")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn workspace_with_plan(plan: &str) -> (tempfile::TempDir, RoundtablePaths) {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
    fs::write(&paths.plan_path, plan).expect("write plan");
    (temp, paths)
}

#[test]
fn init_then_init_again_requires_force() {
    let temp = tempfile::tempdir().expect("tempdir");

    let first = roundtable(temp.path(), &["init"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    assert!(temp.path().join(".roundtable/config.toml").is_file());

    let second = roundtable(temp.path(), &["init"]);
    assert_eq!(second.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));

    let forced = roundtable(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn schedule_prints_one_role_per_line() {
    let (temp, _paths) = workspace_with_plan(TWO_TASK_PLAN);

    let output = roundtable(temp.path(), &["schedule"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "planner",
            "coder",
            "fixer",
            "verifier",
            "fixer",
            "implementer",
            "verifier",
            "fixer",
            "implementer",
            "verifier",
            "fixer",
            "implementer",
        ]
    );
}

#[test]
fn next_follows_elapsed_message_count() {
    let (temp, _paths) = workspace_with_plan(TWO_TASK_PLAN);

    for (elapsed, expected) in [("0", "planner"), ("3", "coder"), ("6", "fixer"), ("9", "verifier")] {
        let output = roundtable(temp.path(), &["next", "--elapsed", elapsed]);
        assert_eq!(output.status.code(), Some(exit_codes::OK));
        assert_eq!(stdout(&output).trim(), expected, "elapsed={elapsed}");
    }

    let from_state = roundtable(temp.path(), &["next"]);
    assert_eq!(stdout(&from_state).trim(), "planner");
}

#[test]
fn validate_rejects_broken_plan() {
    let (temp, _paths) = workspace_with_plan(BROKEN_PLAN);

    let output = roundtable(temp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tasks/task[2]/delegatedTo"));

    fs::write(temp.path().join(".roundtable/project_plan.xml"), TWO_TASK_PLAN).expect("fix plan");
    let output = roundtable(temp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("plan 'calculator'"));
}

#[cfg(unix)]
#[test]
fn run_stops_at_round_limit_then_reset_clears_state() {
    let (temp, paths) = workspace_with_plan(TWO_TASK_PLAN);
    let mut config = RoundtableConfig::default();
    config.executor.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"cat >/dev/null; echo '{"messages":[{"kind":"request","content":"r"},{"kind":"tool_call","content":"c"},{"kind":"tool_result","content":"ok"}]}'"#
            .to_string(),
    ];
    write_config(&paths.config_path, &config).expect("config");

    let output = roundtable(temp.path(), &["run", "--max-rounds", "6"]);
    assert_eq!(
        output.status.code(),
        Some(exit_codes::ROUND_LIMIT),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = stdout(&output);
    assert!(out.contains("turn 1: planner"));
    assert!(out.contains("turn 2: coder"));
    assert_eq!(
        load_conversation(&paths.conversation_path)
            .expect("state")
            .message_count,
        6
    );
    assert!(paths.turns_dir.join("2/executor.log").is_file());

    let reset = roundtable(temp.path(), &["reset"]);
    assert_eq!(reset.status.code(), Some(exit_codes::OK));
    assert_eq!(
        load_conversation(&paths.conversation_path)
            .expect("state")
            .message_count,
        0
    );
    assert!(!paths.turns_dir.join("1").exists());
    assert!(paths.plan_path.is_file());
}

#[cfg(unix)]
#[test]
fn run_exits_ok_when_a_role_terminates() {
    let (temp, paths) = workspace_with_plan(TWO_TASK_PLAN);
    let mut config = RoundtableConfig::default();
    config.executor.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"cat >/dev/null; echo '{"messages":[{"kind":"reply","content":"All done. TERMINATE"}]}'"#
            .to_string(),
    ];
    write_config(&paths.config_path, &config).expect("config");

    let output = roundtable(temp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("terminated by planner"));
}

#[cfg(unix)]
#[test]
fn plan_writes_plan_from_inline_prompt_and_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
    let mut config = RoundtableConfig::default();
    config.executor.commands.insert(
        "planner".to_string(),
        vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"grep -q 'Build a calculator' && echo '{"messages":[{"kind":"reply","content":"<project_plan><name>calc</name><description>d</description><tasks><task><name>impl</name><delegatedTo>coder</delegatedTo></task></tasks></project_plan>"}]}'"#
                .to_string(),
        ],
    );
    write_config(&paths.config_path, &config).expect("config");

    let output = roundtable(temp.path(), &["plan", "--prompt", "Build a calculator"]);
    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("wrote plan 'calc' (1 subtasks) after 1 attempt(s)"));

    let schedule = roundtable(temp.path(), &["schedule"]);
    assert_eq!(stdout(&schedule).lines().take(2).collect::<Vec<_>>(), ["coder", "fixer"]);

    fs::write(temp.path().join("request.md"), "Build a calculator\n").expect("request");
    let from_file = roundtable(temp.path(), &["plan", "--prompt-file", "request.md"]);
    assert_eq!(from_file.status.code(), Some(exit_codes::OK));
}

#[cfg(unix)]
#[test]
fn plan_fails_when_planner_never_returns_a_plan() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_roundtable(temp.path(), &InitOptions { force: false }).expect("init");
    let mut config = RoundtableConfig::default();
    config.executor.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"cat >/dev/null; echo '{"messages":[{"kind":"reply","content":"no plan"}]}'"#
            .to_string(),
    ];
    write_config(&paths.config_path, &config).expect("config");

    let output = roundtable(temp.path(), &["plan", "--prompt", "x", "--attempts", "2"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no valid plan after 2 attempts"));
    assert!(paths.turns_dir.join("plan/2/executor.log").is_file());
    assert_eq!(fs::read_to_string(&paths.plan_path).expect("plan"), "");
}
