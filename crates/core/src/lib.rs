// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ah-core: domain types for the autoheal orchestrator

pub mod macros;

pub mod clock;
pub mod credential;
pub mod job;
pub mod log_buffer;
pub mod repo;
pub mod signature;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{format_stamp, Clock, FakeClock, SystemClock};
pub use credential::{
    embed_credential, redact, strip_credentials, supports_inline_credentials, url_host, Credential,
    CredentialResolver,
};
pub use job::{JobId, JobStatus};
pub use log_buffer::{LogBuffer, DEFAULT_LOG_CAPACITY};
pub use repo::{RepoRef, RepoRefError, IMAGE_PREFIX, INSTANCE_PREFIX};
pub use signature::{CrashSignature, Pattern, SignatureSet, Substring};
pub use state::{JobScope, JobSnapshot, JobState};
