// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Follow an instance's output and stop at the first crash signature.

use ah_adapters::LogStream;
use ah_core::{Clock, JobScope, LogBuffer, SignatureSet};
use tokio_util::sync::CancellationToken;

/// Prefix for instance output in the job log.
pub const APP_PREFIX: &str = "[App]";

/// Why monitoring stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    /// `line` matched the signature named `signature`.
    Crashed { signature: String, line: String },
    /// The output ended without a crash.
    StreamEnded,
    /// The job was stopped or superseded.
    Cancelled,
}

/// Relay `stream` into the job log until a crash, end of output or
/// cancellation.
///
/// Every relayed line is also kept in `window`, the in-memory fallback for
/// crash context.
pub async fn watch<K: Clock>(
    stream: &mut LogStream,
    scope: &JobScope<K>,
    signatures: &SignatureSet,
    window: &mut LogBuffer,
    cancel: &CancellationToken,
) -> MonitorExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return MonitorExit::Cancelled,
            line = stream.next_line() => line,
        };
        let Some(raw) = next else {
            return MonitorExit::StreamEnded;
        };

        let line = raw.trim();
        scope.log(format!("{} {}", APP_PREFIX, line));
        window.push(line);

        if let Some(signature) = signatures.first_match(line) {
            tracing::info!(job_id = %scope.id(), signature, "crash signature matched");
            return MonitorExit::Crashed {
                signature: signature.to_string(),
                line: line.to_string(),
            };
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
