// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The deploy → observe → detect → heal → publish pipeline.
//!
//! One job is live at a time. Each job runs as its own task with its own
//! cancellation token; a new deploy cancels the previous job and the new
//! task waits for the old one to finish before touching any workspace.

use crate::config::OrchestratorConfig;
use crate::error::PipelineError;
use crate::heal::{capture_context, clean_error_context};
use crate::monitor::{self, MonitorExit};
use crate::publisher::{self, PublishOutcome};
use crate::{entrypoint, stager};
use ah_adapters::{ContainerAdapter, GitAdapter, RepairAdapter, RepairOutcome, RunSpec};
use ah_core::{
    redact, Clock, Credential, CredentialResolver, JobId, JobScope, JobSnapshot, JobState,
    JobStatus, LogBuffer, RepoRef, RepoRefError,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A deploy request as accepted from the outside.
#[derive(Debug, Clone, Default)]
pub struct DeployRequest {
    pub repo_url: String,
    /// Per-request token; the administrator fallback applies when absent.
    pub token: Option<String>,
}

struct ActiveJob {
    id: JobId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner<C, G, R, K: Clock> {
    container: C,
    git: G,
    repair: R,
    config: OrchestratorConfig,
    credentials: CredentialResolver,
    state: JobState<K>,
    active: Mutex<Option<ActiveJob>>,
}

/// Owns the job state and drives jobs through the adapters.
pub struct Orchestrator<C, G, R, K: Clock> {
    inner: Arc<Inner<C, G, R, K>>,
}

impl<C, G, R, K: Clock> Clone for Orchestrator<C, G, R, K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C, G, R, K> Orchestrator<C, G, R, K>
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    pub fn new(
        container: C,
        git: G,
        repair: R,
        config: OrchestratorConfig,
        credentials: CredentialResolver,
        clock: K,
    ) -> Self {
        let state = JobState::new(config.log_capacity, clock);
        Self {
            inner: Arc::new(Inner {
                container,
                git,
                repair,
                config,
                credentials,
                state,
                active: Mutex::new(None),
            }),
        }
    }

    /// Accept a deploy and start its job in the background.
    ///
    /// Fails only when no repository name can be derived from the URL.
    pub fn deploy(&self, request: DeployRequest) -> Result<JobId, RepoRefError> {
        let repo = RepoRef::parse(&request.repo_url)?;
        let credential = self.inner.credentials.resolve(request.token.as_deref());

        let mut active = self.inner.active.lock();
        let previous = active.take();
        if let Some(previous) = &previous {
            tracing::info!(job_id = %previous.id, "superseding job");
            previous.cancel.cancel();
        }

        let scope = self.inner.state.begin(repo.url());
        let id = scope.id().clone();
        let cancel = CancellationToken::new();
        tracing::info!(
            job_id = %id,
            slug = repo.slug(),
            has_credential = credential.is_some(),
            "deploy accepted"
        );

        let inner = Arc::clone(&self.inner);
        let job_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.handle.await {
                    tracing::warn!(job_id = %previous.id, error = %e, "superseded job panicked");
                }
            }
            inner.run_job(repo, credential, scope, job_cancel).await;
        });

        *active = Some(ActiveJob { id: id.clone(), cancel, handle });
        Ok(id)
    }

    pub fn status(&self) -> JobSnapshot {
        self.inner.state.snapshot()
    }

    /// Cancel the live job, remove its instance and mark it `STOPPED`.
    pub async fn stop(&self) {
        let scope = self.inner.state.current();
        scope.log("Manual stop signal received.");
        let cancel = self.inner.active.lock().as_ref().map(|active| active.cancel.clone());
        if let Some(cancel) = cancel {
            cancel.cancel();
        }

        if let Some(instance) = scope.instance() {
            match self.inner.container.remove(&instance, self.inner.config.stop_grace).await {
                Ok(()) => scope.log(format!("Instance {} destroyed.", instance)),
                Err(e) => scope.log(format!("Could not stop instance: {}", e)),
            };
        }
        scope.transition(JobStatus::Stopped);
    }

    /// Cancel the live job and wait for its task to finish.
    pub async fn shutdown(&self) {
        let active = self.inner.active.lock().take();
        if let Some(active) = active {
            active.cancel.cancel();
            if let Err(e) = active.handle.await {
                tracing::warn!(job_id = %active.id, error = %e, "job task panicked");
            }
        }
    }
}

impl<C, G, R, K> Inner<C, G, R, K>
where
    C: ContainerAdapter,
    G: GitAdapter,
    R: RepairAdapter,
    K: Clock,
{
    async fn run_job(
        &self,
        repo: RepoRef,
        credential: Option<Credential>,
        scope: JobScope<K>,
        cancel: CancellationToken,
    ) {
        let start = std::time::Instant::now();
        if let Err(e) = self.pipeline(&repo, credential.as_ref(), &scope, &cancel).await {
            let message = redact(&e.to_string(), credential.as_ref());
            tracing::error!(
                job_id = %scope.id(),
                slug = repo.slug(),
                error = %message,
                "job failed"
            );
            scope.log(format!("Error: {}", message));
            scope.transition(JobStatus::Failed);
        }
        tracing::info!(
            job_id = %scope.id(),
            status = %scope.status(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "job finished"
        );
    }

    async fn pipeline(
        &self,
        repo: &RepoRef,
        credential: Option<&Credential>,
        scope: &JobScope<K>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        scope.log(format!("Cloning {}...", redact(repo.url(), credential)));
        let workspace = stager::stage(&self.git, &self.config, repo, credential).await?;
        scope.set_workspace(&workspace);

        if cancel.is_cancelled() {
            return Ok(());
        }
        let entry = entrypoint::detect(&workspace, &self.config.entry_file);
        let image = repo.image_tag();
        scope.log("Building environment...");
        self.container.build(&workspace, &image).await.map_err(PipelineError::Build)?;

        if cancel.is_cancelled() {
            return Ok(());
        }
        let name = repo.instance_name();
        if let Err(e) = self.container.remove(&name, self.config.stop_grace).await {
            tracing::debug!(instance = %name, error = %e, "no previous instance removed");
        }
        scope.log(format!("Launching {}...", entry));
        let spec = RunSpec {
            image,
            name: name.clone(),
            command: vec![self.config.interpreter.clone(), entry],
        };
        let handle = self.container.run(&spec).await.map_err(PipelineError::Run)?;
        scope.set_instance(Some(handle.name.clone()));

        if cancel.is_cancelled() {
            self.discard_instance(&name).await;
            return Ok(());
        }
        let mut stream = self.container.logs(&name).await.map_err(PipelineError::Logs)?;
        scope.log(format!("Monitoring {}...", name));
        scope.transition(JobStatus::Running);

        let mut window = LogBuffer::new(self.config.tail_lines);
        let exit =
            monitor::watch(&mut stream, scope, &self.config.signatures, &mut window, cancel).await;
        drop(stream);

        match exit {
            MonitorExit::Crashed { .. } => {
                self.heal(&workspace, &name, &window, credential, scope).await;
            }
            MonitorExit::StreamEnded => {
                scope.log("Instance output ended.");
                scope.transition(JobStatus::Exited);
            }
            MonitorExit::Cancelled => {
                tracing::info!(job_id = %scope.id(), instance = %name, "monitoring cancelled");
                self.discard_instance(&name).await;
            }
        }
        Ok(())
    }

    /// One heal cycle: capture context, repair, publish. Runs to completion
    /// even if the job is stopped meanwhile.
    async fn heal(
        &self,
        workspace: &Path,
        instance: &str,
        window: &LogBuffer,
        credential: Option<&Credential>,
        scope: &JobScope<K>,
    ) {
        scope.log("Crash detected! Starting repair...");
        scope.transition(JobStatus::Crashed);

        let context =
            capture_context(&self.container, instance, self.config.tail_lines, window).await;
        let context = clean_error_context(&context, &self.config.container_workdir);
        scope.transition(JobStatus::Fixing);
        scope.log("Diagnosing...");

        match self.repair.repair(workspace, &context).await {
            RepairOutcome::Attempted { summary } => scope.log(format!("Repair: {}", summary)),
            RepairOutcome::Failed(reason) => scope.log(format!("Repair failed: {}", reason)),
        };

        let outcome = if credential.is_some() {
            scope.log("Pushing fix...");
            publisher::publish(&self.git, &self.config, workspace, credential).await
        } else {
            Ok(PublishOutcome::SkippedNoCredential)
        };
        match outcome {
            Ok(PublishOutcome::Pushed) => {
                scope.log("SUCCESS: Fix pushed.");
                scope.transition(JobStatus::Success);
            }
            Ok(PublishOutcome::SkippedNoCredential) => {
                scope.log("No token. Skipping push.");
                scope.transition(JobStatus::Patched);
            }
            Ok(PublishOutcome::NothingToCommit) => {
                scope.log("Nothing to commit. Skipping push.");
                scope.transition(JobStatus::Patched);
            }
            Err(e) => {
                scope.log(format!("Publish failed: {}", e));
                scope.transition(JobStatus::Patched);
            }
        }
        scope.log("Patch applied.");
    }

    async fn discard_instance(&self, name: &str) {
        if let Err(e) = self.container.remove(name, self.config.stop_grace).await {
            tracing::warn!(instance = name, error = %e, "failed to remove instance");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
