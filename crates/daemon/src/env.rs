// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Daemon version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn millis(name: &str) -> Option<Duration> {
    var(name).and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_millis)
}

/// Resolve state directory: AH_STATE_DIR > XDG_STATE_HOME/autoheal > ~/.local/state/autoheal
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = var("AH_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("autoheal"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/autoheal"))
}

/// Explicit config file path
pub fn config_path() -> Option<PathBuf> {
    var("AH_CONFIG").map(PathBuf::from)
}

/// Checkout root: AH_WORKSPACE_DIR, or WORKSPACE_DIR for compatibility
pub fn workspace_dir() -> Option<PathBuf> {
    var("AH_WORKSPACE_DIR").or_else(|| var("WORKSPACE_DIR")).map(PathBuf::from)
}

/// Administrator token: AH_GITHUB_TOKEN, or GITHUB_TOKEN for compatibility
pub fn github_token() -> Option<String> {
    var("AH_GITHUB_TOKEN").or_else(|| var("GITHUB_TOKEN"))
}

/// HTTP listen address
pub fn bind() -> Option<String> {
    var("AH_BIND")
}

pub fn log_capacity() -> Option<usize> {
    var("AH_LOG_CAPACITY").and_then(|s| s.trim().parse().ok())
}

/// Shell command run as the repair step
pub fn repair_command() -> Option<String> {
    var("AH_REPAIR_COMMAND")
}

pub fn repair_timeout() -> Option<Duration> {
    millis("AH_REPAIR_TIMEOUT_MS")
}

pub fn build_timeout() -> Option<Duration> {
    millis("AH_BUILD_TIMEOUT_MS")
}

pub fn git_timeout() -> Option<Duration> {
    millis("AH_GIT_TIMEOUT_MS")
}

/// Container engine binary (default `docker`)
pub fn docker_bin() -> Option<String> {
    var("AH_DOCKER_BIN")
}
