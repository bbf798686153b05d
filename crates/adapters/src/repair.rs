// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seam to the external change-generation step.
//!
//! The orchestrator hands the workspace and the cleaned crash context to a
//! [`RepairAdapter`]; whatever it edits on disk is what gets published.

use crate::subprocess::{failure_text, run_with_input, REPAIR_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Result of one repair attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The step ran; `summary` is its own one-line account.
    Attempted { summary: String },
    /// The step could not run or reported failure.
    Failed(String),
}

/// Adapter for the repair step
#[async_trait]
pub trait RepairAdapter: Clone + Send + Sync + 'static {
    async fn repair(&self, workspace: &Path, error_context: &str) -> RepairOutcome;
}

/// Runs a configured shell command inside the workspace.
///
/// The command sees `AH_WORKSPACE` and `AH_ERROR_LOG` in its environment and
/// receives the error context on stdin.
#[derive(Debug, Clone)]
pub struct CommandRepair {
    command: String,
    timeout: Duration,
}

impl CommandRepair {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), timeout: REPAIR_TIMEOUT }
    }

    ah_core::setters! {
        set { timeout: Duration }
    }
}

#[async_trait]
impl RepairAdapter for CommandRepair {
    async fn repair(&self, workspace: &Path, error_context: &str) -> RepairOutcome {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .current_dir(workspace)
            .env("AH_WORKSPACE", workspace)
            .env("AH_ERROR_LOG", error_context);

        tracing::info!(
            command = %self.command,
            workspace = %workspace.display(),
            "running repair command"
        );
        match run_with_input(cmd, error_context, self.timeout, "repair command").await {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let summary = stdout
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .unwrap_or("repair command finished")
                    .to_string();
                RepairOutcome::Attempted { summary }
            }
            Ok(output) => {
                let code = output.status.code().unwrap_or(-1);
                let detail = failure_text(&output);
                if detail.is_empty() {
                    RepairOutcome::Failed(format!("repair command exited with {}", code))
                } else {
                    RepairOutcome::Failed(format!(
                        "repair command exited with {}: {}",
                        code, detail
                    ))
                }
            }
            Err(e) => RepairOutcome::Failed(e),
        }
    }
}

/// Used when no repair command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRepair;

#[async_trait]
impl RepairAdapter for NoopRepair {
    async fn repair(&self, workspace: &Path, _error_context: &str) -> RepairOutcome {
        tracing::warn!(workspace = %workspace.display(), "no repair command configured");
        RepairOutcome::Failed("no repair command configured".to_string())
    }
}

/// Repair adapter chosen from configuration at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredRepair {
    Command(CommandRepair),
    Noop(NoopRepair),
}

impl ConfiguredRepair {
    pub fn from_command(command: Option<String>, timeout: Duration) -> Self {
        match command.filter(|c| !c.trim().is_empty()) {
            Some(command) => Self::Command(CommandRepair::new(command).timeout(timeout)),
            None => Self::Noop(NoopRepair),
        }
    }
}

#[async_trait]
impl RepairAdapter for ConfiguredRepair {
    async fn repair(&self, workspace: &Path, error_context: &str) -> RepairOutcome {
        match self {
            Self::Command(inner) => inner.repair(workspace, error_context).await,
            Self::Noop(inner) => inner.repair(workspace, error_context).await,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{RepairAdapter, RepairOutcome};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded repair request
    #[derive(Debug, Clone)]
    pub struct RepairCall {
        pub workspace: PathBuf,
        pub error_context: String,
    }

    struct FakeRepairState {
        calls: Vec<RepairCall>,
        outcome: RepairOutcome,
        /// Written relative to the workspace before returning
        edit: Option<(PathBuf, String)>,
    }

    /// Fake repair adapter for testing
    #[derive(Clone)]
    pub struct FakeRepairAdapter {
        inner: Arc<Mutex<FakeRepairState>>,
    }

    impl Default for FakeRepairAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeRepairState {
                    calls: Vec::new(),
                    outcome: RepairOutcome::Attempted { summary: "patched".to_string() },
                    edit: None,
                })),
            }
        }
    }

    impl FakeRepairAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_outcome(&self, outcome: RepairOutcome) {
            self.inner.lock().outcome = outcome;
        }

        /// Overwrite `path` (relative to the workspace) when repair runs.
        pub fn set_edit(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
            self.inner.lock().edit = Some((path.into(), contents.into()));
        }

        /// Get all recorded repair requests
        pub fn calls(&self) -> Vec<RepairCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl RepairAdapter for FakeRepairAdapter {
        async fn repair(&self, workspace: &Path, error_context: &str) -> RepairOutcome {
            let (edit, outcome) = {
                let mut inner = self.inner.lock();
                inner.calls.push(RepairCall {
                    workspace: workspace.to_path_buf(),
                    error_context: error_context.to_string(),
                });
                (inner.edit.clone(), inner.outcome.clone())
            };
            if let Some((rel, contents)) = edit {
                if let Err(e) = std::fs::write(workspace.join(rel), contents) {
                    return RepairOutcome::Failed(e.to_string());
                }
            }
            outcome
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRepairAdapter, RepairCall};

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
