// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external systems the orchestrator drives: the container
//! engine, git and the repair step.

pub mod container;
pub mod git;
pub mod repair;
pub mod subprocess;

pub use container::{
    ContainerAdapter, ContainerError, DockerAdapter, InstanceHandle, LogStream, RunSpec,
};
pub use git::{CliGit, GitAdapter, GitError};
pub use repair::{CommandRepair, ConfiguredRepair, NoopRepair, RepairAdapter, RepairOutcome};

#[cfg(any(test, feature = "test-support"))]
pub use container::{ContainerCall, FakeContainerAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use git::{FakeGitAdapter, GitCall};
#[cfg(any(test, feature = "test-support"))]
pub use repair::{FakeRepairAdapter, RepairCall};
