// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory container adapter for tests.

use super::{ContainerAdapter, ContainerError, InstanceHandle, LogStream, RunSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Recorded container call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerCall {
    Build { context: PathBuf, tag: String },
    Run(RunSpec),
    Remove { name: String, grace: Duration },
    Logs { name: String },
    Tail { name: String, lines: usize },
}

#[derive(Default)]
struct FakeContainerState {
    calls: Vec<ContainerCall>,
    output: Vec<String>,
    hold_open: bool,
    build_error: Option<String>,
    run_error: Option<String>,
    tail_error: bool,
    /// Senders kept alive until the instance is removed
    open_streams: HashMap<String, mpsc::Sender<String>>,
}

/// Fake container adapter for testing.
///
/// Every `logs` call replays the scripted output. With `hold_open` set the
/// stream then stays open until the instance is removed, like a server that
/// keeps running.
#[derive(Clone, Default)]
pub struct FakeContainerAdapter {
    inner: Arc<Mutex<FakeContainerState>>,
}

impl FakeContainerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines the instance prints.
    pub fn set_output<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().output = lines.into_iter().map(Into::into).collect();
    }

    pub fn set_hold_open(&self, hold: bool) {
        self.inner.lock().hold_open = hold;
    }

    pub fn fail_build(&self, message: &str) {
        self.inner.lock().build_error = Some(message.to_string());
    }

    pub fn fail_run(&self, message: &str) {
        self.inner.lock().run_error = Some(message.to_string());
    }

    pub fn fail_tail(&self) {
        self.inner.lock().tail_error = true;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ContainerCall> {
        self.inner.lock().calls.clone()
    }

    /// Names of instances whose log stream is still open.
    pub fn open_streams(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().open_streams.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ContainerAdapter for FakeContainerAdapter {
    async fn build(&self, context: &Path, tag: &str) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(ContainerCall::Build { context: context.to_path_buf(), tag: tag.to_string() });
        match &inner.build_error {
            Some(message) => Err(ContainerError::Build(message.clone())),
            None => Ok(()),
        }
    }

    async fn run(&self, spec: &RunSpec) -> Result<InstanceHandle, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Run(spec.clone()));
        match &inner.run_error {
            Some(message) => Err(ContainerError::Run(message.clone())),
            None => {
                Ok(InstanceHandle { name: spec.name.clone(), id: format!("fake-{}", spec.name) })
            }
        }
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<(), ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Remove { name: name.to_string(), grace });
        inner.open_streams.remove(name);
        Ok(())
    }

    async fn logs(&self, name: &str) -> Result<LogStream, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Logs { name: name.to_string() });
        let (tx, rx) = mpsc::channel(inner.output.len() + 1);
        for line in &inner.output {
            let _ = tx.try_send(line.clone());
        }
        if inner.hold_open {
            inner.open_streams.insert(name.to_string(), tx);
        }
        Ok(LogStream::from_receiver(rx))
    }

    async fn tail(&self, name: &str, lines: usize) -> Result<Vec<String>, ContainerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ContainerCall::Tail { name: name.to_string(), lines });
        if inner.tail_error {
            return Err(ContainerError::Logs(format!("no such instance: {}", name)));
        }
        let skip = inner.output.len().saturating_sub(lines);
        Ok(inner.output.iter().skip(skip).cloned().collect())
    }
}
