//! Child process execution with a wall-clock timeout and bounded output.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Human-readable transcript of both streams, noting truncation and timeout.
    pub fn transcript(&self) -> String {
        let mut buf = String::new();
        buf.push_str("=== stdout ===\n");
        buf.push_str(&String::from_utf8_lossy(&self.stdout));
        if self.stdout_truncated > 0 {
            buf.push_str(&format!(
                "\n[stdout truncated {} bytes]\n",
                self.stdout_truncated
            ));
        }
        buf.push_str("\n=== stderr ===\n");
        buf.push_str(&String::from_utf8_lossy(&self.stderr));
        if self.stderr_truncated > 0 {
            buf.push_str(&format!(
                "\n[stderr truncated {} bytes]\n",
                self.stderr_truncated
            ));
        }
        if self.timed_out {
            buf.push_str("\n[timed out]\n");
        }
        buf
    }
}

/// Run `cmd`, feeding `stdin` if given, and capture stdout/stderr.
///
/// Stdin is fed and both output streams are drained on their own threads while
/// the child runs, so the timeout holds even when the child stops reading its
/// input. At most `output_limit_bytes` per stream are kept; the rest is
/// counted and discarded. On timeout the child is killed
/// and the partial output is returned with `timed_out` set.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!(program = ?cmd.get_program(), "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, program = ?cmd.get_program(), "failed to spawn command");
            return Err(e).with_context(|| format!("spawn {:?}", cmd.get_program()));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let stdin_handle = match stdin {
        Some(input) => {
            let mut child_stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            // Dropping the handle at the end of the thread closes the pipe.
            Some(thread::spawn(move || child_stdin.write_all(&input)))
        }
        None => None,
    };

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    if let Some(handle) = stdin_handle {
        match handle.join() {
            // A child that exits (or is killed) without reading all of its
            // input is not an error here; the exit status tells the caller.
            Ok(Err(e)) => warn!(err = %e, "child closed stdin early"),
            Ok(Ok(())) => {}
            Err(_) => return Err(anyhow!("stdin writer thread panicked")),
        }
    }

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        let keep = n.min(remaining);
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}
