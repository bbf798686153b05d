// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording git adapter for tests.

use super::{GitAdapter, GitError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded git call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Clone { url: String, dest: PathBuf },
    SetIdentity { name: String, email: String },
    StageAll,
    HasStagedChanges,
    Commit { message: String },
    RemoteUrl { remote: String },
    SetRemoteUrl { remote: String, url: String },
    Push { remote: String },
}

struct FakeGitState {
    calls: Vec<GitCall>,
    /// Files written into the destination on clone
    files: Vec<(PathBuf, String)>,
    dirty: bool,
    remotes: HashMap<String, String>,
    clone_error: Option<String>,
    push_error: Option<String>,
}

/// Fake git adapter for testing.
///
/// `clone_repo` creates the destination and writes the configured files, so
/// stager tests see a real checkout on disk.
#[derive(Clone)]
pub struct FakeGitAdapter {
    inner: Arc<Mutex<FakeGitState>>,
}

impl Default for FakeGitAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeGitState {
                calls: Vec::new(),
                files: vec![(PathBuf::from("main.py"), "print('hello')\n".to_string())],
                dirty: true,
                remotes: HashMap::new(),
                clone_error: None,
                push_error: None,
            })),
        }
    }
}

impl FakeGitAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the files a clone produces.
    pub fn set_files<I, P, S>(&self, files: I)
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        self.inner.lock().files = files.into_iter().map(|(p, s)| (p.into(), s.into())).collect();
    }

    /// Whether `has_staged_changes` reports anything to commit.
    pub fn set_dirty(&self, dirty: bool) {
        self.inner.lock().dirty = dirty;
    }

    pub fn fail_clone(&self, message: &str) {
        self.inner.lock().clone_error = Some(message.to_string());
    }

    pub fn fail_push(&self, message: &str) {
        self.inner.lock().push_error = Some(message.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<GitCall> {
        self.inner.lock().calls.clone()
    }

    pub fn remote(&self, name: &str) -> Option<String> {
        self.inner.lock().remotes.get(name).cloned()
    }
}

#[async_trait]
impl GitAdapter for FakeGitAdapter {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let files = {
            let mut inner = self.inner.lock();
            inner.calls.push(GitCall::Clone { url: url.to_string(), dest: dest.to_path_buf() });
            if let Some(message) = &inner.clone_error {
                return Err(GitError::Failed { op: "clone", message: message.clone() });
            }
            inner.remotes.insert("origin".to_string(), url.to_string());
            inner.files.clone()
        };
        let write = |rel: &Path, contents: &str| -> std::io::Result<()> {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)
        };
        std::fs::create_dir_all(dest)
            .and_then(|_| files.iter().try_for_each(|(rel, contents)| write(rel, contents)))
            .map_err(|e| GitError::Exec { op: "clone", message: e.to_string() })
    }

    async fn set_identity(&self, _repo: &Path, name: &str, email: &str) -> Result<(), GitError> {
        self.inner
            .lock()
            .calls
            .push(GitCall::SetIdentity { name: name.to_string(), email: email.to_string() });
        Ok(())
    }

    async fn stage_all(&self, _repo: &Path) -> Result<(), GitError> {
        self.inner.lock().calls.push(GitCall::StageAll);
        Ok(())
    }

    async fn has_staged_changes(&self, _repo: &Path) -> Result<bool, GitError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GitCall::HasStagedChanges);
        Ok(inner.dirty)
    }

    async fn commit(&self, _repo: &Path, message: &str) -> Result<(), GitError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GitCall::Commit { message: message.to_string() });
        inner.dirty = false;
        Ok(())
    }

    async fn remote_url(&self, _repo: &Path, remote: &str) -> Result<String, GitError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GitCall::RemoteUrl { remote: remote.to_string() });
        inner.remotes.get(remote).cloned().ok_or_else(|| GitError::Failed {
            op: "remote",
            message: format!("No such remote '{}'", remote),
        })
    }

    async fn set_remote_url(&self, _repo: &Path, remote: &str, url: &str) -> Result<(), GitError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(GitCall::SetRemoteUrl { remote: remote.to_string(), url: url.to_string() });
        inner.remotes.insert(remote.to_string(), url.to_string());
        Ok(())
    }

    async fn push(&self, _repo: &Path, remote: &str) -> Result<(), GitError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GitCall::Push { remote: remote.to_string() });
        match &inner.push_error {
            Some(message) => Err(GitError::Failed { op: "push", message: message.clone() }),
            None => Ok(()),
        }
    }
}
