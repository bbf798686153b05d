// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared record of the live job.
//!
//! There is exactly one live job. [`JobState::begin`] replaces the record
//! wholesale; every write afterwards goes through a [`JobScope`] tagged with
//! the job's id, and is dropped once a newer job has begun. `STOPPED` is
//! absorbing, so a heal cycle that finishes after a stop cannot revive the
//! job.

use crate::clock::Clock;
use crate::job::{JobId, JobStatus};
use crate::log_buffer::LogBuffer;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct JobRecord {
    id: JobId,
    status: JobStatus,
    logs: LogBuffer,
    repo_url: Option<String>,
    workspace_path: Option<PathBuf>,
    instance: Option<String>,
}

/// Point-in-time copy of the job record, as served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub logs: Vec<String>,
    pub workspace_path: String,
    pub repo_url: Option<String>,
    pub instance: Option<String>,
}

/// Handle to the shared job record.
#[derive(Clone)]
pub struct JobState<C: Clock> {
    inner: Arc<Mutex<JobRecord>>,
    clock: C,
}

impl<C: Clock> JobState<C> {
    pub fn new(log_capacity: usize, clock: C) -> Self {
        let record = JobRecord {
            id: JobId::new(),
            status: JobStatus::Idle,
            logs: LogBuffer::new(log_capacity),
            repo_url: None,
            workspace_path: None,
            instance: None,
        };
        Self { inner: Arc::new(Mutex::new(record)), clock }
    }

    /// Start a new job: fresh id, cleared logs, `DEPLOYING`.
    pub fn begin(&self, repo_url: &str) -> JobScope<C> {
        let id = JobId::new();
        {
            let mut record = self.inner.lock();
            record.id = id.clone();
            record.status = JobStatus::Deploying;
            record.logs.clear();
            record.repo_url = Some(repo_url.to_string());
            record.workspace_path = None;
            record.instance = None;
        }
        tracing::info!(job_id = %id, repo_url, "job started");
        JobScope { id, state: self.clone() }
    }

    /// Writer for whichever job is live right now (the idle record included).
    pub fn current(&self) -> JobScope<C> {
        JobScope { id: self.inner.lock().id.clone(), state: self.clone() }
    }

    pub fn status(&self) -> JobStatus {
        self.inner.lock().status
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let record = self.inner.lock();
        JobSnapshot {
            job_id: record.id.to_string(),
            status: record.status,
            logs: record.logs.to_vec(),
            workspace_path: record
                .workspace_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            repo_url: record.repo_url.clone(),
            instance: record.instance.clone(),
        }
    }

    /// Run `f` against the record only if `id` is still the live job.
    fn with_current<R>(&self, id: &JobId, f: impl FnOnce(&mut JobRecord) -> R) -> Option<R> {
        let mut record = self.inner.lock();
        if record.id == *id {
            Some(f(&mut record))
        } else {
            None
        }
    }
}

/// Writer bound to one job id.
#[derive(Clone)]
pub struct JobScope<C: Clock> {
    id: JobId,
    state: JobState<C>,
}

impl<C: Clock> JobScope<C> {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Whether this job is still the live one.
    pub fn is_current(&self) -> bool {
        self.state.inner.lock().id == self.id
    }

    pub fn status(&self) -> JobStatus {
        self.state.with_current(&self.id, |r| r.status).unwrap_or(JobStatus::Idle)
    }

    /// Append a timestamped line. Returns `false` if the job was superseded.
    pub fn log(&self, message: impl AsRef<str>) -> bool {
        let message = message.as_ref();
        let line = format!("[{}] {}", self.state.clock.stamp(), message);
        let appended = self.state.with_current(&self.id, |r| r.logs.push(line)).is_some();
        if appended {
            tracing::info!(job_id = %self.id, "{}", message);
        } else {
            tracing::debug!(job_id = %self.id, "{}", message);
        }
        appended
    }

    /// Move to `next` if the state machine allows it.
    pub fn transition(&self, next: JobStatus) -> bool {
        let outcome = self.state.with_current(&self.id, |r| {
            let from = r.status;
            if from.can_transition_to(next) {
                r.status = next;
                Ok(from)
            } else {
                Err(from)
            }
        });
        match outcome {
            Some(Ok(from)) => {
                tracing::info!(job_id = %self.id, %from, to = %next, "job status changed");
                true
            }
            Some(Err(from)) => {
                tracing::warn!(job_id = %self.id, %from, to = %next, "ignoring illegal transition");
                false
            }
            None => {
                tracing::debug!(
                    job_id = %self.id,
                    to = %next,
                    "ignoring transition for superseded job"
                );
                false
            }
        }
    }

    pub fn set_workspace(&self, path: &Path) {
        self.state.with_current(&self.id, |r| r.workspace_path = Some(path.to_path_buf()));
    }

    pub fn set_instance(&self, name: Option<String>) {
        self.state.with_current(&self.id, |r| r.instance = name);
    }

    pub fn instance(&self) -> Option<String> {
        self.state.with_current(&self.id, |r| r.instance.clone()).flatten()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
