// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker CLI implementation of [`ContainerAdapter`].

use super::{ContainerAdapter, ContainerError, InstanceHandle, LogStream, RunSpec};
use crate::subprocess::{failure_text, run_with_timeout, BUILD_TIMEOUT, DOCKER_TIMEOUT};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Buffered lines between the follower process and the monitor.
const LOG_CHANNEL_CAPACITY: usize = 256;

/// Drives the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerAdapter {
    bin: String,
    build_timeout: Duration,
    command_timeout: Duration,
}

impl Default for DockerAdapter {
    fn default() -> Self {
        Self {
            bin: "docker".to_string(),
            build_timeout: BUILD_TIMEOUT,
            command_timeout: DOCKER_TIMEOUT,
        }
    }
}

impl DockerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    ah_core::setters! {
        into { bin: String }
        set { build_timeout: Duration, command_timeout: Duration }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args);
        cmd
    }

    /// Run a docker CLI command and return trimmed stdout on success.
    async fn run_docker(&self, args: Vec<String>, timeout: Duration) -> Result<String, String> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let output =
            run_with_timeout(self.command(&args), timeout, &format!("docker {}", subcommand))
                .await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(format!("docker {} failed: {}", subcommand, failure_text(&output)))
        }
    }
}

pub(crate) fn build_args(context: &Path, tag: &str) -> Vec<String> {
    vec!["build".into(), "-t".into(), tag.into(), context.display().to_string()]
}

pub(crate) fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".into(), "-d".into(), "--name".into(), spec.name.clone()];
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

pub(crate) fn stop_args(name: &str, grace: Duration) -> Vec<String> {
    vec!["stop".into(), "-t".into(), grace.as_secs().to_string(), name.into()]
}

pub(crate) fn tail_args(name: &str, lines: usize) -> Vec<String> {
    vec!["logs".into(), "--timestamps".into(), "--tail".into(), lines.to_string(), name.into()]
}

/// Split a `--timestamps` line into its RFC 3339 stamp and the text.
fn split_timestamp(line: &str) -> (Option<DateTime<FixedOffset>>, &str) {
    match line.split_once(' ') {
        Some((stamp, text)) => match DateTime::parse_from_rfc3339(stamp) {
            Ok(at) => (Some(at), text),
            Err(_) => (None, line),
        },
        None => (None, line),
    }
}

/// Merge the replayed stdout and stderr back into emission order.
///
/// Each stream is already ordered, so this is a two-way merge on the
/// timestamps. A line without a stamp sorts with the line before it on its
/// own stream. Ties go to stdout.
pub(crate) fn interleave(stdout: &str, stderr: &str) -> Vec<String> {
    fn stamped(text: &str) -> Vec<(Option<DateTime<FixedOffset>>, String)> {
        let mut last = None;
        text.lines()
            .map(|line| {
                let (at, text) = split_timestamp(line);
                last = at.or(last);
                (last, text.to_string())
            })
            .collect()
    }
    let mut out = stamped(stdout).into_iter().peekable();
    let mut err = stamped(stderr).into_iter().peekable();
    let mut merged = Vec::new();
    loop {
        let take_err = match (out.peek(), err.peek()) {
            (None, None) => break,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (Some((a, _)), Some((b, _))) => matches!((a, b), (Some(a), Some(b)) if b < a),
        };
        let next = if take_err { err.next() } else { out.next() };
        if let Some((_, line)) = next {
            merged.push(line);
        }
    }
    merged
}

fn is_missing(message: &str) -> bool {
    message.contains("No such container")
}

/// Forward every line of `reader` into `tx` until EOF or the receiver closes.
fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl ContainerAdapter for DockerAdapter {
    async fn build(&self, context: &Path, tag: &str) -> Result<(), ContainerError> {
        tracing::info!(tag, context = %context.display(), "building image");
        let start = std::time::Instant::now();
        self.run_docker(build_args(context, tag), self.build_timeout)
            .await
            .map_err(ContainerError::Build)?;
        tracing::info!(tag, elapsed_ms = start.elapsed().as_millis() as u64, "image built");
        Ok(())
    }

    async fn run(&self, spec: &RunSpec) -> Result<InstanceHandle, ContainerError> {
        tracing::info!(name = %spec.name, image = %spec.image, "launching instance");
        let id = self
            .run_docker(run_args(spec), self.command_timeout)
            .await
            .map_err(ContainerError::Run)?;
        Ok(InstanceHandle { name: spec.name.clone(), id })
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<(), ContainerError> {
        // stop gives the process its grace period; rm -f catches whatever is left
        let stop_timeout = self.command_timeout + grace;
        if let Err(e) = self.run_docker(stop_args(name, grace), stop_timeout).await {
            if is_missing(&e) {
                return Ok(());
            }
            tracing::debug!(name, error = %e, "docker stop failed, forcing removal");
        }
        let rm_args = vec!["rm".into(), "-f".into(), name.into()];
        let removed = self.run_docker(rm_args, self.command_timeout).await;
        match removed {
            Ok(_) => Ok(()),
            Err(e) if is_missing(&e) => Ok(()),
            Err(e) => Err(ContainerError::Remove(e)),
        }
    }

    async fn logs(&self, name: &str) -> Result<LogStream, ContainerError> {
        let mut cmd = self.command(&["logs".into(), "-f".into(), name.into()]);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        let mut child = cmd
            .spawn()
            .map_err(|e| ContainerError::Logs(format!("failed to exec docker: {}", e)))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }
        Ok(LogStream::with_follower(rx, child))
    }

    async fn tail(&self, name: &str, lines: usize) -> Result<Vec<String>, ContainerError> {
        let output = run_with_timeout(
            self.command(&tail_args(name, lines)),
            self.command_timeout,
            "docker logs",
        )
        .await
        .map_err(ContainerError::Logs)?;
        if !output.status.success() {
            return Err(ContainerError::Logs(failure_text(&output)));
        }
        // docker replays the instance's stdout and stderr on its own streams
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let all = interleave(&stdout, &stderr);
        let skip = all.len().saturating_sub(lines);
        Ok(all.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
