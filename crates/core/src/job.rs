// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and status state machine.
//!
//! ```text
//! IDLE ─► DEPLOYING ─► RUNNING ─► CRASHED ─► FIXING ─► SUCCESS
//!             │           │                     └────► PATCHED
//!             ▼           ▼
//!           FAILED      EXITED
//!
//! any (except STOPPED) ─► STOPPED
//! ```

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Unique identifier for one deploy request, e.g. `job-V1StGXR8_Z5jdHi6B-myT`.
///
/// Writes to the shared job record are tagged with this id so a
/// superseded job cannot clobber the status of its successor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(SmolStr);

impl JobId {
    pub const PREFIX: &'static str = "job-";

    pub fn new() -> Self {
        Self(SmolStr::new(format!("{}{}", Self::PREFIX, nanoid::nanoid!(19))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of the live job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// No deploy has been accepted yet
    #[default]
    Idle,
    /// Staging, building and launching
    Deploying,
    /// Instance launched and its output is being monitored
    Running,
    /// A crash signature matched
    Crashed,
    /// The repair step is running
    Fixing,
    /// Fix applied and pushed to the remote
    Success,
    /// Fix applied locally but not published
    Patched,
    /// Instance output ended without a crash
    Exited,
    /// A pipeline stage aborted the job
    Failed,
    /// Torn down by an explicit stop
    Stopped,
}

crate::simple_display! {
    JobStatus {
        Idle => "IDLE",
        Deploying => "DEPLOYING",
        Running => "RUNNING",
        Crashed => "CRASHED",
        Fixing => "FIXING",
        Success => "SUCCESS",
        Patched => "PATCHED",
        Exited => "EXITED",
        Failed => "FAILED",
        Stopped => "STOPPED",
    }
}

impl JobStatus {
    /// Legal transitions within one job.
    ///
    /// Entering `Deploying` is not listed: it only happens when a new job
    /// replaces the record, never as a transition of an existing job.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Deploying, Running | Failed) => true,
            (Running, Crashed | Exited | Failed) => true,
            (Crashed, Fixing) => true,
            (Fixing, Success | Patched | Failed) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
