// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash context capture for the repair step.

use ah_adapters::ContainerAdapter;
use ah_core::LogBuffer;

/// Last `lines` lines of instance output.
///
/// Prefers the engine's own tail; falls back to the monitor's window when
/// the engine has nothing or the call fails.
pub async fn capture_context<C: ContainerAdapter>(
    container: &C,
    instance: &str,
    lines: usize,
    window: &LogBuffer,
) -> Vec<String> {
    match container.tail(instance, lines).await {
        Ok(tail) if !tail.is_empty() => tail,
        Ok(_) => window.tail(lines),
        Err(e) => {
            tracing::warn!(instance, error = %e, "engine tail unavailable, using monitor window");
            window.tail(lines)
        }
    }
}

/// Join the context and drop the in-image working directory so paths read
/// relative to the repository.
pub fn clean_error_context(lines: &[String], workdir: &str) -> String {
    let joined = lines.join("\n");
    if workdir.is_empty() {
        joined
    } else {
        joined.replace(workdir, "")
    }
}

#[cfg(test)]
#[path = "heal_tests.rs"]
mod tests;
