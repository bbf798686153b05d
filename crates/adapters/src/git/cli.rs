// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! git CLI implementation of [`GitAdapter`].

use super::{GitAdapter, GitError};
use crate::subprocess::{failure_text, run_with_timeout, GIT_TIMEOUT};
use ah_core::redact;
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Drives the `git` binary.
#[derive(Debug, Clone)]
pub struct CliGit {
    bin: String,
    timeout: Duration,
}

impl Default for CliGit {
    fn default() -> Self {
        Self { bin: "git".to_string(), timeout: GIT_TIMEOUT }
    }
}

impl CliGit {
    pub fn new() -> Self {
        Self::default()
    }

    ah_core::setters! {
        into { bin: String }
        set { timeout: Duration }
    }

    fn command(&self, repo: Option<&Path>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(repo) = repo {
            cmd.arg("-C").arg(repo);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        cmd
    }

    async fn output(
        &self,
        op: &'static str,
        repo: Option<&Path>,
        args: &[&str],
    ) -> Result<Output, GitError> {
        let description = format!("git {}", op);
        run_with_timeout(self.command(repo, args), self.timeout, &description)
            .await
            .map_err(|message| GitError::Exec { op, message: redact(&message, None) })
    }

    /// Run and require exit 0; returns trimmed stdout.
    async fn git(
        &self,
        op: &'static str,
        repo: Option<&Path>,
        args: &[&str],
    ) -> Result<String, GitError> {
        let output = self.output(op, repo, args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(GitError::Failed { op, message: redact(&failure_text(&output), None) })
        }
    }
}

#[async_trait]
impl GitAdapter for CliGit {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let dest = dest.display().to_string();
        self.git("clone", None, &["clone", "--", url, &dest]).await.map(|_| ())
    }

    async fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<(), GitError> {
        self.git("config", Some(repo), &["config", "user.name", name]).await?;
        self.git("config", Some(repo), &["config", "user.email", email]).await?;
        Ok(())
    }

    async fn stage_all(&self, repo: &Path) -> Result<(), GitError> {
        self.git("add", Some(repo), &["add", "--all"]).await.map(|_| ())
    }

    async fn has_staged_changes(&self, repo: &Path) -> Result<bool, GitError> {
        let output = self.output("diff", Some(repo), &["diff", "--cached", "--quiet"]).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => {
                Err(GitError::Failed { op: "diff", message: redact(&failure_text(&output), None) })
            }
        }
    }

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), GitError> {
        self.git("commit", Some(repo), &["commit", "-m", message]).await.map(|_| ())
    }

    async fn remote_url(&self, repo: &Path, remote: &str) -> Result<String, GitError> {
        self.git("remote", Some(repo), &["remote", "get-url", remote]).await
    }

    async fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<(), GitError> {
        self.git("remote", Some(repo), &["remote", "set-url", remote, url]).await.map(|_| ())
    }

    async fn push(&self, repo: &Path, remote: &str) -> Result<(), GitError> {
        self.git("push", Some(repo), &["push", remote, "HEAD"]).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
