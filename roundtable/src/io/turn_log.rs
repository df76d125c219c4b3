//! Per-turn artifacts under `.roundtable/turns/<n>/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::TurnOutput;

pub const PROMPT_FILE: &str = "prompt.md";
pub const OUTPUT_FILE: &str = "output.json";
pub const EXECUTOR_LOG_FILE: &str = "executor.log";

#[derive(Debug, Clone)]
pub struct TurnLogPaths {
    pub dir: PathBuf,
    pub prompt_path: PathBuf,
    pub output_path: PathBuf,
    pub executor_log_path: PathBuf,
}

impl TurnLogPaths {
    /// Paths for the 1-based turn number `turn` under `turns_dir`.
    pub fn new(turns_dir: &Path, turn: usize) -> Self {
        Self::in_dir(turns_dir.join(turn.to_string()))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self {
            prompt_path: dir.join(PROMPT_FILE),
            output_path: dir.join(OUTPUT_FILE),
            executor_log_path: dir.join(EXECUTOR_LOG_FILE),
            dir,
        }
    }

    /// Create the turn directory and record the prompt sent to the role.
    pub fn write_prompt(&self, prompt: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create turn dir {}", self.dir.display()))?;
        write_text(&self.prompt_path, prompt)
    }

    pub fn write_output(&self, output: &TurnOutput) -> Result<()> {
        write_json(&self.output_path, output)
    }
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DraftMessage, MessageKind};

    #[test]
    fn turn_paths_are_stable() {
        let paths = TurnLogPaths::new(Path::new("/work/.roundtable/turns"), 3);
        assert!(paths.dir.ends_with(".roundtable/turns/3"));
        assert!(paths.prompt_path.ends_with("3/prompt.md"));
        assert!(paths.output_path.ends_with("3/output.json"));
        assert!(paths.executor_log_path.ends_with("3/executor.log"));
    }

    #[test]
    fn writes_prompt_and_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = TurnLogPaths::new(temp.path(), 1);
        let output = TurnOutput {
            messages: vec![DraftMessage {
                kind: MessageKind::Reply,
                content: "TERMINATE".to_string(),
            }],
            terminate: false,
        };

        paths.write_prompt("# Turn 1\n").expect("prompt");
        paths.write_output(&output).expect("output");

        assert_eq!(
            fs::read_to_string(&paths.prompt_path).expect("read"),
            "# Turn 1\n"
        );
        let loaded: TurnOutput =
            serde_json::from_str(&fs::read_to_string(&paths.output_path).expect("read"))
                .expect("parse");
        assert_eq!(loaded, output);
    }
}
