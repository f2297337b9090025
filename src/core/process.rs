//! Process execution utilities
//!
//! Helpers for running the external tools (yt-dlp, ffmpeg) either to
//! completion with captured output, or spawned with piped output for the
//! streaming path. A missing executable never propagates as a raw IO fault:
//! `run_once` turns it into a synthetic exit-127 result so callers deal with
//! one shape only.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Captured result of a completed external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// True when the command never started because the binary is missing.
    pub fn not_found(&self) -> bool {
        self.code == 127
    }
}

/// Run a command to completion and capture stdout, stderr and exit code.
///
/// Spawn failures produce a synthetic result instead of an error: a missing
/// binary yields exit 127 with an explanatory stderr, any other spawn fault
/// yields exit -1.
pub async fn run_once(bin: &str, args: &[&str]) -> CommandOutput {
    match Command::new(bin).args(args).output().await {
        Ok(output) => CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => CommandOutput {
            stdout: String::new(),
            stderr: format!("Command not found: {}", bin),
            code: 127,
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Failed to start {}: {}", bin, e),
            code: -1,
        },
    }
}

/// Run a command with a timeout, used for metadata probes. A timeout is
/// reported as exit 124 (the GNU timeout convention) rather than an error.
pub async fn run_once_with_timeout(bin: &str, args: &[&str], timeout: Duration) -> CommandOutput {
    match tokio::time::timeout(timeout, run_once(bin, args)).await {
        Ok(output) => output,
        Err(_) => CommandOutput {
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs()),
            code: 124,
        },
    }
}

/// Spawn a command with stdout and stderr piped for line-by-line reading.
///
/// The child is configured to be killed when its handle is dropped, so an
/// abandoned stream cannot leave an orphaned download running.
pub fn spawn_piped(bin: &str, args: &[String]) -> std::io::Result<Child> {
    Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}
