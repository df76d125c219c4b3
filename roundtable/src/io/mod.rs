//! I/O helpers for roundtable commands.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub mod config;
pub mod conversation_store;
pub mod executor;
pub mod init;
pub mod plan_store;
pub mod process;
pub mod prompt;
pub mod turn_log;

/// Write `contents` to `path` via a sibling temp file and rename, creating
/// parent directories as needed.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;

    let mut tmp_name: OsString = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);

    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
