// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository reference and the slug every per-repo resource is named from.
//!
//! The workspace directory, image tag and instance name all derive from the
//! same slug, so redeploying a repository replaces its resources instead of
//! leaking stale ones.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix for built image tags.
pub const IMAGE_PREFIX: &str = "autoheal-";
/// Prefix for running instance names.
pub const INSTANCE_PREFIX: &str = "run-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoRefError {
    #[error("repository URL is empty")]
    Empty,
    #[error("cannot derive a repository name from '{0}'")]
    NoName(String),
}

/// A repository URL plus its sanitized slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    url: String,
    slug: String,
}

impl RepoRef {
    pub fn parse(url: &str) -> Result<Self, RepoRefError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RepoRefError::Empty);
        }
        let slug = slugify(url).ok_or_else(|| RepoRefError::NoName(url.to_string()))?;
        Ok(Self { url: url.to_string(), slug })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn workspace_path(&self, root: &Path) -> PathBuf {
        root.join(&self.slug)
    }

    pub fn image_tag(&self) -> String {
        format!("{}{}", IMAGE_PREFIX, self.slug)
    }

    pub fn instance_name(&self) -> String {
        format!("{}{}", INSTANCE_PREFIX, self.slug)
    }
}

/// Last path segment, minus `.git`, lowercased and restricted to
/// `[a-z0-9._-]` so it is valid as a directory, image tag and container name.
fn slugify(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':', '\\']).next().unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);

    let slug: String = name
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect();
    let slug = slug.trim_start_matches(['.', '-', '_']);

    if slug.is_empty() || slug.chars().all(|c| c == '.') {
        None
    } else {
        Some(slug.to_string())
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
