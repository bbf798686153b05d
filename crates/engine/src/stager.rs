// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fresh checkout of the repository plus its environment descriptor.

use crate::config::OrchestratorConfig;
use crate::error::StageError;
use ah_adapters::GitAdapter;
use ah_core::{embed_credential, supports_inline_credentials, url_host, Credential, RepoRef};
use std::path::{Path, PathBuf};

/// Built-in descriptor for Python repositories.
pub const PYTHON_DOCKERFILE: &str = include_str!("../templates/Dockerfile.python");

/// Descriptor file name looked for at the workspace root.
pub const DESCRIPTOR: &str = "Dockerfile";

/// URL to clone from: the token is embedded only for credential hosts and
/// only where the URL form can carry it.
pub fn clone_url(
    url: &str,
    credential: Option<&Credential>,
    config: &OrchestratorConfig,
) -> String {
    match credential {
        Some(credential)
            if supports_inline_credentials(url) && config.is_credential_host(url_host(url)) =>
        {
            embed_credential(url, credential)
        }
        _ => url.to_string(),
    }
}

/// Clone `repo` into a clean workspace and make sure it has a descriptor.
///
/// Returns the workspace path. Any existing checkout at that path is
/// removed first.
pub async fn stage<G: GitAdapter>(
    git: &G,
    config: &OrchestratorConfig,
    repo: &RepoRef,
    credential: Option<&Credential>,
) -> Result<PathBuf, StageError> {
    let root = &config.workspace_root;
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| StageError::Filesystem { path: root.clone(), source })?;

    let workspace = repo.workspace_path(root);
    if tokio::fs::try_exists(&workspace).await.unwrap_or(false) {
        tracing::info!(workspace = %workspace.display(), "removing previous checkout");
        tokio::fs::remove_dir_all(&workspace)
            .await
            .map_err(|source| StageError::Filesystem { path: workspace.clone(), source })?;
    }

    let url = clone_url(repo.url(), credential, config);
    git.clone_repo(&url, &workspace)
        .await
        .map_err(|e| StageError::Clone(ah_core::redact(&e.to_string(), credential)))?;

    ensure_descriptor(&workspace, config.dockerfile_template.as_deref()).await?;
    Ok(workspace)
}

/// Write the descriptor template unless the repository ships its own.
/// Returns whether a template was written.
pub async fn ensure_descriptor(
    workspace: &Path,
    template: Option<&Path>,
) -> Result<bool, StageError> {
    let target = workspace.join(DESCRIPTOR);
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        tracing::debug!(workspace = %workspace.display(), "repository ships its own descriptor");
        return Ok(false);
    }
    let contents = match template {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StageError::Template(format!("{}: {}", path.display(), e)))?,
        None => PYTHON_DOCKERFILE.to_string(),
    };
    tokio::fs::write(&target, contents)
        .await
        .map_err(|e| StageError::Template(format!("{}: {}", target.display(), e)))?;
    Ok(true)
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
