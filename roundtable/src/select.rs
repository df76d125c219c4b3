//! Schedule and turn lookups for `roundtable schedule` and `roundtable next`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::schedule::Schedule;
use crate::core::selector::{TurnDecision, resolve_turn};
use crate::io::config::load_config;
use crate::io::conversation_store::load_conversation;
use crate::io::init::RoundtablePaths;
use crate::io::plan_store::load_plan;

/// Build the schedule for the plan and config under `root`.
pub fn schedule_from_root(root: &Path) -> Result<Schedule> {
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path).context("load config.toml")?;
    let task = load_plan(&paths.plan_path).context("load project_plan.xml")?;
    Ok(config.schedule_builder()?.build(&task))
}

/// Turn decision plus the elapsed count it was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextTurn {
    pub elapsed: usize,
    pub decision: TurnDecision,
}

/// Decide who speaks after `elapsed` messages, defaulting to the persisted
/// conversation's message count.
pub fn next_from_root(root: &Path, elapsed: Option<usize>) -> Result<NextTurn> {
    let paths = RoundtablePaths::new(root);
    let config = load_config(&paths.config_path).context("load config.toml")?;
    let registry = config.registry()?;
    let first_role = config.first_role()?;
    let task = load_plan(&paths.plan_path).context("load project_plan.xml")?;
    let schedule = config.schedule_builder()?.build(&task);

    let elapsed = match elapsed {
        Some(elapsed) => elapsed,
        None => {
            load_conversation(&paths.conversation_path)
                .context("load conversation.json")?
                .message_count
        }
    };
    Ok(NextTurn {
        elapsed,
        decision: resolve_turn(elapsed, &schedule, &registry, &first_role),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::role::RoleId;
    use crate::core::selector::TurnSource;
    use crate::core::types::{Message, MessageKind};
    use crate::io::config::RoundtableConfig;
    use crate::io::conversation_store::{ConversationState, write_conversation};
    use crate::test_support::{TWO_TASK_PLAN, TestWorkspace, role};

    fn workspace() -> TestWorkspace {
        let ws = TestWorkspace::new().expect("workspace");
        ws.write_plan_xml(TWO_TASK_PLAN).expect("plan");
        ws
    }

    #[test]
    fn schedule_uses_configured_recovery_cycle() {
        let ws = workspace();
        let mut config = RoundtableConfig::default();
        config.recovery.repeats = 1;
        ws.write_config(&config).expect("config");

        let schedule = schedule_from_root(ws.path()).expect("schedule");
        let names: Vec<&str> = schedule.turns().iter().map(RoleId::as_str).collect();
        assert_eq!(
            names,
            vec!["planner", "coder", "fixer", "verifier", "fixer", "implementer"]
        );
    }

    #[test]
    fn next_defaults_to_persisted_message_count() {
        let ws = workspace();
        let mut state = ConversationState::started("kickoff".to_string());
        for content in ["req", "call", "result"] {
            state.push(Message {
                speaker: role("planner"),
                kind: MessageKind::Request,
                content: content.to_string(),
            });
        }
        write_conversation(&ws.paths().conversation_path, &state).expect("write");

        let next = next_from_root(ws.path(), None).expect("next");
        assert_eq!(next.elapsed, 3);
        assert_eq!(next.decision.role, role("coder"));
        assert_eq!(next.decision.source, TurnSource::Scheduled { index: 1 });
    }

    #[test]
    fn explicit_elapsed_overrides_state() {
        let ws = workspace();
        let next = next_from_root(ws.path(), Some(0)).expect("next");
        assert_eq!(next.decision.role, role("planner"));
        assert_eq!(next.decision.source, TurnSource::Opening);

        let next = next_from_root(ws.path(), Some(9)).expect("next");
        assert_eq!(next.decision.role, role("verifier"));
    }
}
