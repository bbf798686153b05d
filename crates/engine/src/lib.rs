// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ah-engine: the job pipeline and its stages

pub mod config;
pub mod entrypoint;
mod error;
pub mod heal;
pub mod monitor;
pub mod orchestrator;
pub mod publisher;
pub mod stager;

pub use config::OrchestratorConfig;
pub use error::{PipelineError, PublishError, StageError};
pub use monitor::MonitorExit;
pub use orchestrator::{DeployRequest, Orchestrator};
pub use publisher::PublishOutcome;
