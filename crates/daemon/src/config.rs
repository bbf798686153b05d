// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: defaults, then an optional TOML file, then
//! environment overrides.

use crate::env;
use ah_adapters::subprocess::{BUILD_TIMEOUT, GIT_TIMEOUT, REPAIR_TIMEOUT};
use ah_core::{Pattern, SignatureSet, DEFAULT_LOG_CAPACITY};
use ah_engine::OrchestratorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

/// Errors while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory (set AH_STATE_DIR)")]
    NoStateDir,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid crash signature '{pattern}': {source}")]
    Signature {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Config file contents; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub workspace_dir: Option<PathBuf>,
    pub github_token: Option<String>,
    pub log_capacity: Option<usize>,
    pub docker_bin: Option<String>,
    pub build_timeout_ms: Option<u64>,
    pub git_timeout_ms: Option<u64>,
    pub repair_command: Option<String>,
    pub repair_timeout_ms: Option<u64>,
    pub entry_file: Option<String>,
    pub interpreter: Option<String>,
    pub dockerfile_template: Option<PathBuf>,
    pub container_workdir: Option<String>,
    pub tail_lines: Option<usize>,
    pub credential_hosts: Option<Vec<String>>,
    pub signatures: Option<Vec<String>>,
    pub bot_name: Option<String>,
    pub bot_email: Option<String>,
    pub commit_message: Option<String>,
    pub remote: Option<String>,
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/autoheal)
    pub state_dir: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub bind: String,
    /// Parent directory of all checkouts
    pub workspace_dir: PathBuf,
    /// Administrator fallback token
    pub github_token: Option<String>,
    pub log_capacity: usize,
    pub docker_bin: String,
    pub build_timeout: Duration,
    pub git_timeout: Duration,
    pub repair_command: Option<String>,
    pub repair_timeout: Duration,
    pub entry_file: String,
    pub interpreter: String,
    pub dockerfile_template: Option<PathBuf>,
    pub container_workdir: String,
    pub tail_lines: usize,
    pub credential_hosts: Vec<String>,
    /// Extra regex crash signatures, checked after the defaults
    pub signatures: Vec<String>,
    pub bot_name: String,
    pub bot_email: String,
    pub commit_message: String,
    pub remote: String,
}

impl Config {
    /// Built-in defaults rooted at `state_dir`.
    pub fn defaults(state_dir: PathBuf) -> Self {
        let engine = OrchestratorConfig::new(state_dir.join("workspaces"));
        Self {
            log_path: state_dir.join("daemon.log"),
            bind: DEFAULT_BIND.to_string(),
            workspace_dir: engine.workspace_root,
            github_token: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
            docker_bin: "docker".to_string(),
            build_timeout: BUILD_TIMEOUT,
            git_timeout: GIT_TIMEOUT,
            repair_command: None,
            repair_timeout: REPAIR_TIMEOUT,
            entry_file: engine.entry_file,
            interpreter: engine.interpreter,
            dockerfile_template: None,
            container_workdir: engine.container_workdir,
            tail_lines: engine.tail_lines,
            credential_hosts: engine.credential_hosts,
            signatures: Vec::new(),
            bot_name: engine.bot_name,
            bot_email: engine.bot_email,
            commit_message: engine.commit_message,
            remote: engine.remote,
            state_dir,
        }
    }

    /// Load configuration for this process.
    ///
    /// The config file is `AH_CONFIG` if set, else `<state_dir>/config.toml`
    /// when it exists.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = env::state_dir().ok_or(ConfigError::NoStateDir)?;
        let mut config = Self::defaults(state_dir);

        let explicit = env::config_path();
        let path = explicit.clone().unwrap_or_else(|| config.state_dir.join("config.toml"));
        if let Some(file) = read_file(&path, explicit.is_some())? {
            config.apply_file(file);
        }
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = file.$field { self.$field = v; })*
            };
        }
        take!(
            bind,
            workspace_dir,
            log_capacity,
            docker_bin,
            entry_file,
            interpreter,
            container_workdir,
            tail_lines,
            credential_hosts,
            signatures,
            bot_name,
            bot_email,
            commit_message,
            remote,
        );
        if file.github_token.is_some() {
            self.github_token = file.github_token;
        }
        if file.repair_command.is_some() {
            self.repair_command = file.repair_command;
        }
        if file.dockerfile_template.is_some() {
            self.dockerfile_template = file.dockerfile_template;
        }
        if let Some(ms) = file.build_timeout_ms {
            self.build_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.git_timeout_ms {
            self.git_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.repair_timeout_ms {
            self.repair_timeout = Duration::from_millis(ms);
        }
    }

    pub fn apply_env(&mut self) {
        if let Some(v) = env::bind() {
            self.bind = v;
        }
        if let Some(v) = env::workspace_dir() {
            self.workspace_dir = v;
        }
        if let Some(v) = env::github_token() {
            self.github_token = Some(v);
        }
        if let Some(v) = env::log_capacity() {
            self.log_capacity = v;
        }
        if let Some(v) = env::docker_bin() {
            self.docker_bin = v;
        }
        if let Some(v) = env::build_timeout() {
            self.build_timeout = v;
        }
        if let Some(v) = env::git_timeout() {
            self.git_timeout = v;
        }
        if let Some(v) = env::repair_command() {
            self.repair_command = Some(v);
        }
        if let Some(v) = env::repair_timeout() {
            self.repair_timeout = v;
        }
    }

    /// Compile the configured crash signatures on top of the defaults.
    pub fn signature_set(&self) -> Result<SignatureSet, ConfigError> {
        let mut set = SignatureSet::default();
        for pattern in &self.signatures {
            let compiled = Pattern::new(pattern)
                .map_err(|source| ConfigError::Signature { pattern: pattern.clone(), source })?;
            set = set.with(compiled);
        }
        Ok(set)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.signature_set().map(|_| ())
    }

    /// Engine settings derived from this configuration.
    pub fn orchestrator(&self) -> Result<OrchestratorConfig, ConfigError> {
        let mut engine = OrchestratorConfig::new(&self.workspace_dir)
            .entry_file(self.entry_file.as_str())
            .interpreter(self.interpreter.as_str())
            .container_workdir(self.container_workdir.as_str())
            .bot_name(self.bot_name.as_str())
            .bot_email(self.bot_email.as_str())
            .commit_message(self.commit_message.as_str())
            .remote(self.remote.as_str())
            .tail_lines(self.tail_lines)
            .credential_hosts(self.credential_hosts.clone())
            .log_capacity(self.log_capacity)
            .signatures(Arc::new(self.signature_set()?));
        if let Some(template) = &self.dockerfile_template {
            engine = engine.dockerfile_template(template.clone());
        }
        Ok(engine)
    }
}

/// Read and parse `path`. A missing file is only an error when it was
/// named explicitly.
fn read_file(path: &Path, explicit: bool) -> Result<Option<FileConfig>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };
    toml::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
