// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container engine adapter: build an image, run a named instance, follow
//! its output and tear it down again.

mod docker;
pub use docker::DockerAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ContainerCall, FakeContainerAdapter};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Child;
use tokio::sync::mpsc;

/// Errors from container operations
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("image build failed: {0}")]
    Build(String),
    #[error("instance launch failed: {0}")]
    Run(String),
    #[error("instance removal failed: {0}")]
    Remove(String),
    #[error("log stream unavailable: {0}")]
    Logs(String),
}

/// What to launch: image, deterministic instance name and argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub command: Vec<String>,
}

/// A launched instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    pub name: String,
    pub id: String,
}

/// Combined stdout/stderr of an instance, one line at a time.
///
/// The stream ends when the instance exits or is removed. Dropping it
/// stops any follower process backing it.
pub struct LogStream {
    lines: mpsc::Receiver<String>,
    _follower: Option<Child>,
}

impl LogStream {
    pub fn from_receiver(lines: mpsc::Receiver<String>) -> Self {
        Self { lines, _follower: None }
    }

    fn with_follower(lines: mpsc::Receiver<String>, follower: Child) -> Self {
        Self { lines, _follower: Some(follower) }
    }

    /// Next line, or `None` once the output has ended.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }
}

/// Adapter for the container engine.
#[async_trait]
pub trait ContainerAdapter: Clone + Send + Sync + 'static {
    /// Build `context` into an image tagged `tag`.
    async fn build(&self, context: &Path, tag: &str) -> Result<(), ContainerError>;

    /// Launch a detached instance.
    async fn run(&self, spec: &RunSpec) -> Result<InstanceHandle, ContainerError>;

    /// Stop (with `grace`) and remove the named instance. A missing
    /// instance is not an error.
    async fn remove(&self, name: &str, grace: Duration) -> Result<(), ContainerError>;

    /// Follow the instance's output from the start.
    async fn logs(&self, name: &str) -> Result<LogStream, ContainerError>;

    /// Last `lines` lines of the instance's output, as the engine kept them,
    /// in the order the instance wrote them across stdout and stderr.
    async fn tail(&self, name: &str, lines: usize) -> Result<Vec<String>, ContainerError>;
}
