// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit the repaired workspace and push it back to its remote.

use crate::config::OrchestratorConfig;
use crate::error::PublishError;
use ah_adapters::{GitAdapter, GitError};
use ah_core::{
    embed_credential, redact, strip_credentials, supports_inline_credentials, url_host, Credential,
};
use std::path::Path;

/// What publishing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Pushed,
    SkippedNoCredential,
    NothingToCommit,
}

/// Commit every change in `workspace` as the bot and push it.
///
/// Without a credential nothing is touched. The token is embedded in the
/// remote URL only for the push and the clean URL is restored afterwards.
pub async fn publish<G: GitAdapter>(
    git: &G,
    config: &OrchestratorConfig,
    workspace: &Path,
    credential: Option<&Credential>,
) -> Result<PublishOutcome, PublishError> {
    let Some(credential) = credential else {
        return Ok(PublishOutcome::SkippedNoCredential);
    };
    let fail = |op: &'static str| {
        move |e: GitError| PublishError::Git {
            op,
            message: redact(&e.to_string(), Some(credential)),
        }
    };

    git.set_identity(workspace, &config.bot_name, &config.bot_email).await.map_err(fail("config"))?;
    git.stage_all(workspace).await.map_err(fail("add"))?;
    if !git.has_staged_changes(workspace).await.map_err(fail("diff"))? {
        return Ok(PublishOutcome::NothingToCommit);
    }
    git.commit(workspace, &config.commit_message).await.map_err(fail("commit"))?;

    let current = git.remote_url(workspace, &config.remote).await.map_err(fail("remote"))?;
    let inline =
        supports_inline_credentials(&current) && config.is_credential_host(url_host(&current));
    let clean = strip_credentials(&current);
    if inline {
        let authed = embed_credential(&clean, credential);
        git.set_remote_url(workspace, &config.remote, &authed).await.map_err(fail("remote"))?;
    }

    let pushed = git.push(workspace, &config.remote).await.map_err(fail("push"));

    if inline {
        if let Err(e) = git.set_remote_url(workspace, &config.remote, &clean).await {
            tracing::warn!(
                workspace = %workspace.display(),
                error = %redact(&e.to_string(), Some(credential)),
                "failed to restore remote URL"
            );
        }
    }

    pushed.map(|_| PublishOutcome::Pushed)
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
