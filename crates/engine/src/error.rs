// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that abort a pipeline stage.

use ah_adapters::ContainerError;
use std::path::PathBuf;
use thiserror::Error;

/// Repository staging failures.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("workspace {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Message has the credential redacted.
    #[error("clone failed: {0}")]
    Clone(String),
    #[error("environment descriptor: {0}")]
    Template(String),
}

/// Publish failures. Messages have the credential redacted.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{message}")]
    Git { op: &'static str, message: String },
}

/// Any failure that ends a job as `FAILED`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("{0}")]
    Build(ContainerError),
    #[error("{0}")]
    Run(ContainerError),
    #[error("{0}")]
    Logs(ContainerError),
}
