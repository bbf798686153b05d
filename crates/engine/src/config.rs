// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline settings handed to the orchestrator.

use ah_core::SignatureSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything the pipeline needs that is not an adapter.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Parent directory of all checkouts
    pub workspace_root: PathBuf,
    /// File the instance is launched with
    pub entry_file: String,
    pub interpreter: String,
    /// Lines of output captured as crash context
    pub tail_lines: usize,
    /// Grace period when stopping an instance
    pub stop_grace: Duration,
    /// Working directory inside the image, stripped from crash context
    pub container_workdir: String,
    /// Descriptor written when the repository has none; built-in template if unset
    pub dockerfile_template: Option<PathBuf>,
    pub bot_name: String,
    pub bot_email: String,
    pub commit_message: String,
    pub remote: String,
    /// Hosts that receive the token inline in clone and push URLs
    pub credential_hosts: Vec<String>,
    pub log_capacity: usize,
    pub signatures: Arc<SignatureSet>,
}

impl OrchestratorConfig {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            entry_file: "main.py".to_string(),
            interpreter: "python".to_string(),
            tail_lines: 20,
            stop_grace: Duration::from_secs(1),
            container_workdir: "/app/".to_string(),
            dockerfile_template: None,
            bot_name: "AutoDev Bot".to_string(),
            bot_email: "bot@autodev.ai".to_string(),
            commit_message: "Auto-fix: repaired the crash".to_string(),
            remote: "origin".to_string(),
            credential_hosts: vec!["github.com".to_string()],
            log_capacity: ah_core::DEFAULT_LOG_CAPACITY,
            signatures: Arc::new(SignatureSet::default()),
        }
    }

    ah_core::setters! {
        into {
            entry_file: String,
            interpreter: String,
            container_workdir: String,
            bot_name: String,
            bot_email: String,
            commit_message: String,
            remote: String,
        }
        set {
            tail_lines: usize,
            stop_grace: Duration,
            credential_hosts: Vec<String>,
            log_capacity: usize,
            signatures: Arc<SignatureSet>,
        }
        option {
            dockerfile_template: PathBuf,
        }
    }

    /// Whether `host` may receive the token inline. Matching ignores case.
    pub fn is_credential_host(&self, host: &str) -> bool {
        self.credential_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
