// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core types.
pub mod strategies {
    use crate::job::JobStatus;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Idle),
            Just(JobStatus::Deploying),
            Just(JobStatus::Running),
            Just(JobStatus::Crashed),
            Just(JobStatus::Fixing),
            Just(JobStatus::Success),
            Just(JobStatus::Patched),
            Just(JobStatus::Exited),
            Just(JobStatus::Failed),
            Just(JobStatus::Stopped),
        ]
    }

    /// Token-like strings: no `@`, `/` or whitespace.
    pub fn arb_token() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_]{1,40}"
    }

    /// Repository names as they appear in clone URLs.
    pub fn arb_repo_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9_.-]{0,30}"
    }
}
