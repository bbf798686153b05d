// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts.

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default timeout for git operations (clone, push).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for `docker build`.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for short docker commands (run, stop, rm, logs --tail).
pub const DOCKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for the external repair command.
pub const REPAIR_TIMEOUT: Duration = Duration::from_secs(300);

/// Run a command to completion, killing it if it outlives `timeout`.
///
/// `description` names the command in error messages.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{} failed to execute: {}", description, e)),
        Err(_) => Err(format!("{} timed out after {}s", description, timeout.as_secs())),
    }
}

/// Like [`run_with_timeout`], writing `input` to the child's stdin first.
pub async fn run_with_input(
    mut cmd: Command,
    input: &str,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
    let mut child =
        cmd.spawn().map_err(|e| format!("{} failed to execute: {}", description, e))?;

    let run = async move {
        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading stdin is not an error
            let _ = stdin.write_all(input.as_bytes()).await;
        }
        child.wait_with_output().await
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{} failed: {}", description, e)),
        Err(_) => Err(format!("{} timed out after {}s", description, timeout.as_secs())),
    }
}

/// Trimmed stderr, falling back to stdout when stderr is empty.
pub fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
