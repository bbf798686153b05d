// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autoheal daemon library
//!
//! Configuration loading and the HTTP router, shared by the `ahd` binary
//! and its tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod listener;

pub use config::{Config, ConfigError, FileConfig};
pub use listener::{router, DeployBody};
