//! Plan document storage (`.roundtable/project_plan.xml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::plan::{Task, parse_plan, render_plan};

/// Read and parse the plan at `path`.
pub fn load_plan(path: &Path) -> Result<Task> {
    debug!(path = %path.display(), "loading plan");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read plan {}", path.display()))?;
    let task = parse_plan(&contents).with_context(|| format!("parse plan {}", path.display()))?;
    debug!(
        name = task.name(),
        subtasks = task.subtasks().len(),
        "plan loaded"
    );
    Ok(task)
}

/// Atomically write `task` to `path` (temp file + rename).
pub fn write_plan(path: &Path, task: &Task) -> Result<()> {
    debug!(path = %path.display(), name = task.name(), "writing plan");
    let contents = render_plan(task)?;
    super::write_atomic(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::PlanError;
    use crate::test_support::{TWO_TASK_PLAN, task_with_subtasks};

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("project_plan.xml");
        let task = task_with_subtasks(&[("design", "planner"), ("implement", "coder")]);

        write_plan(&path, &task).expect("write");
        assert_eq!(load_plan(&path).expect("load"), task);
    }

    #[test]
    fn load_reports_path_and_keeps_typed_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("project_plan.xml");
        fs::write(&path, "").expect("write");

        let err = load_plan(&path).expect_err("empty plan");
        assert!(err.to_string().contains("project_plan.xml"));
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn loads_fixture_plan() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("project_plan.xml");
        fs::write(&path, TWO_TASK_PLAN).expect("write");
        let task = load_plan(&path).expect("load");
        assert_eq!(task.subtasks().len(), 2);
    }
}
