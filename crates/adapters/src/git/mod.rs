// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version-control adapter used to stage checkouts and publish fixes.

mod cli;
pub use cli::CliGit;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGitAdapter, GitCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from git operations. Messages never carry inline credentials.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {op} failed: {message}")]
    Failed { op: &'static str, message: String },
    #[error("git {op}: {message}")]
    Exec { op: &'static str, message: String },
}

/// Adapter for the git operations the pipeline needs.
#[async_trait]
pub trait GitAdapter: Clone + Send + Sync + 'static {
    /// Clone `url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError>;

    /// Set the committer identity for this checkout only.
    async fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<(), GitError>;

    /// Stage every change in the working tree, untracked files included.
    async fn stage_all(&self, repo: &Path) -> Result<(), GitError>;

    async fn has_staged_changes(&self, repo: &Path) -> Result<bool, GitError>;

    async fn commit(&self, repo: &Path, message: &str) -> Result<(), GitError>;

    async fn remote_url(&self, repo: &Path, remote: &str) -> Result<String, GitError>;

    async fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<(), GitError>;

    /// Push the current branch to `remote`.
    async fn push(&self, repo: &Path, remote: &str) -> Result<(), GitError>;
}
