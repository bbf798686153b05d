// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ah_adapters::{
    ContainerCall, ContainerError, FakeContainerAdapter, FakeGitAdapter, FakeRepairAdapter,
    GitCall, InstanceHandle, LogStream,
};
use ah_core::FakeClock;
use async_trait::async_trait;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

type TestOrchestrator =
    Orchestrator<FakeContainerAdapter, FakeGitAdapter, FakeRepairAdapter, FakeClock>;

const CRASH_OUTPUT: [&str; 4] = [
    "booting",
    "Traceback (most recent call last):",
    "  File \"/app/main.py\", line 1, in <module>",
    "NameError: name 'x' is not defined",
];

struct Harness {
    orch: TestOrchestrator,
    container: FakeContainerAdapter,
    git: FakeGitAdapter,
    repair: FakeRepairAdapter,
    dir: TempDir,
}

fn harness(fallback: Option<&str>) -> Harness {
    let dir = TempDir::new().unwrap();
    let container = FakeContainerAdapter::new();
    let git = FakeGitAdapter::new();
    let repair = FakeRepairAdapter::new();
    let orch = Orchestrator::new(
        container.clone(),
        git.clone(),
        repair.clone(),
        OrchestratorConfig::new(dir.path().join("repos")),
        CredentialResolver::new(fallback.map(str::to_string)),
        FakeClock::new(),
    );
    Harness { orch, container, git, repair, dir }
}

fn request(url: &str, token: Option<&str>) -> DeployRequest {
    DeployRequest { repo_url: url.to_string(), token: token.map(str::to_string) }
}

async fn wait_for(orch: &TestOrchestrator, status: JobStatus) -> JobSnapshot {
    for _ in 0..500 {
        let snap = orch.status();
        if snap.status == status {
            return snap;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}: {:#?}", status, orch.status());
}

fn logged(snap: &JobSnapshot, needle: &str) -> bool {
    snap.logs.iter().any(|l| l.contains(needle))
}

fn pushed(git: &FakeGitAdapter) -> bool {
    git.calls().iter().any(|c| matches!(c, GitCall::Push { .. }))
}

#[tokio::test]
async fn crash_with_token_heals_and_pushes() {
    let h = harness(None);
    h.container.set_output(CRASH_OUTPUT);

    let id = h.orch.deploy(request("https://github.com/o/App.git", Some("tok"))).unwrap();
    wait_for(&h.orch, JobStatus::Success).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert_eq!(snap.job_id, id.to_string());
    assert_eq!(snap.workspace_path, h.dir.path().join("repos/app").display().to_string());
    assert_eq!(snap.instance.as_deref(), Some("run-app"));
    assert!(logged(&snap, "[App] booting"));
    assert!(logged(&snap, "[App] Traceback (most recent call last):"));
    assert!(!logged(&snap, "NameError"), "monitor stops at the first crash line");
    assert!(logged(&snap, "SUCCESS: Fix pushed."));
    assert!(snap.logs.last().unwrap().ends_with("Patch applied."));
    assert!(!snap.logs.iter().any(|l| l.contains("tok@")));

    let calls = h.container.calls();
    assert!(matches!(&calls[0], ContainerCall::Build { tag, .. } if tag == "autoheal-app"));
    assert_eq!(
        calls[1],
        ContainerCall::Remove { name: "run-app".into(), grace: Duration::from_secs(1) }
    );
    assert_eq!(
        calls[2],
        ContainerCall::Run(RunSpec {
            image: "autoheal-app".into(),
            name: "run-app".into(),
            command: vec!["python".into(), "main.py".into()],
        })
    );
    assert_eq!(calls[3], ContainerCall::Logs { name: "run-app".into() });
    assert_eq!(calls[4], ContainerCall::Tail { name: "run-app".into(), lines: 20 });

    let repairs = h.repair.calls();
    assert_eq!(repairs.len(), 1);
    assert!(repairs[0].error_context.contains("File \"main.py\", line 1"));
    assert!(!repairs[0].error_context.contains("/app/"));
    assert!(pushed(&h.git));
}

/// Wraps an adapter and records the job status each time the pipeline
/// reaches one of its calls.
#[derive(Clone)]
struct Observed<A> {
    inner: A,
    state: Arc<Mutex<Option<JobState<FakeClock>>>>,
    seen: Arc<Mutex<Vec<JobStatus>>>,
}

impl<A> Observed<A> {
    fn new(inner: A, seen: &Arc<Mutex<Vec<JobStatus>>>) -> Self {
        Self { inner, state: Arc::new(Mutex::new(None)), seen: Arc::clone(seen) }
    }

    fn attach(&self, state: &JobState<FakeClock>) {
        *self.state.lock() = Some(state.clone());
    }

    fn status(&self) -> Option<JobStatus> {
        self.state.lock().as_ref().map(|s| s.status())
    }

    fn record(&self) {
        if let Some(status) = self.status() {
            self.seen.lock().push(status);
        }
    }
}

#[async_trait]
impl<C: ContainerAdapter> ContainerAdapter for Observed<C> {
    async fn build(&self, context: &Path, tag: &str) -> Result<(), ContainerError> {
        self.record();
        self.inner.build(context, tag).await
    }

    async fn run(&self, spec: &RunSpec) -> Result<InstanceHandle, ContainerError> {
        self.inner.run(spec).await
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<(), ContainerError> {
        self.inner.remove(name, grace).await
    }

    /// Holds the first line back until the job reports `RUNNING`.
    async fn logs(&self, name: &str) -> Result<LogStream, ContainerError> {
        let mut upstream = self.inner.logs(name).await?;
        let (tx, rx) = mpsc::channel(16);
        let observer = self.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                if observer.status() == Some(JobStatus::Running) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            observer.record();
            while let Some(line) = upstream.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
        Ok(LogStream::from_receiver(rx))
    }

    async fn tail(&self, name: &str, lines: usize) -> Result<Vec<String>, ContainerError> {
        self.record();
        self.inner.tail(name, lines).await
    }
}

#[async_trait]
impl<R: RepairAdapter> RepairAdapter for Observed<R> {
    async fn repair(&self, workspace: &Path, error_context: &str) -> RepairOutcome {
        self.record();
        self.inner.repair(workspace, error_context).await
    }
}

async fn observed_sequence(token: Option<&str>, last: JobStatus) -> Vec<JobStatus> {
    let dir = TempDir::new().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeContainerAdapter::new();
    fake.set_output(CRASH_OUTPUT);
    let container = Observed::new(fake, &seen);
    let repair = Observed::new(FakeRepairAdapter::new(), &seen);
    let orch = Orchestrator::new(
        container.clone(),
        FakeGitAdapter::new(),
        repair.clone(),
        OrchestratorConfig::new(dir.path().join("repos")),
        CredentialResolver::new(None),
        FakeClock::new(),
    );
    container.attach(&orch.inner.state);
    repair.attach(&orch.inner.state);

    orch.deploy(request("https://github.com/o/app", token)).unwrap();
    for _ in 0..500 {
        if orch.status().status == last {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    orch.shutdown().await;

    let mut sequence = seen.lock().clone();
    sequence.push(orch.status().status);
    sequence
}

#[tokio::test]
async fn crash_heal_walks_every_state_in_order() {
    use JobStatus::*;
    assert_eq!(
        observed_sequence(Some("tok"), Success).await,
        vec![Deploying, Running, Crashed, Fixing, Success]
    );
}

#[tokio::test]
async fn crash_heal_without_token_ends_patched() {
    use JobStatus::*;
    assert_eq!(
        observed_sequence(None, Patched).await,
        vec![Deploying, Running, Crashed, Fixing, Patched]
    );
}

#[tokio::test]
async fn crash_without_token_is_patched_locally() {
    let h = harness(None);
    h.container.set_output(CRASH_OUTPUT);

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Patched).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "No token. Skipping push."));
    assert!(!pushed(&h.git));
    assert_eq!(h.repair.calls().len(), 1);
}

#[tokio::test]
async fn administrator_token_is_the_fallback() {
    let h = harness(Some("admin"));
    h.container.set_output(CRASH_OUTPUT);

    h.orch.deploy(request("https://github.com/o/app", Some("  "))).unwrap();
    wait_for(&h.orch, JobStatus::Success).await;
    h.orch.shutdown().await;

    assert!(h.git.calls().contains(&GitCall::Clone {
        url: "https://admin@github.com/o/app".into(),
        dest: h.dir.path().join("repos/app"),
    }));
}

#[tokio::test]
async fn nothing_to_commit_is_patched() {
    let h = harness(Some("tok"));
    h.container.set_output(CRASH_OUTPUT);
    h.git.set_dirty(false);

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Patched).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "Nothing to commit"));
    assert!(!pushed(&h.git));
}

#[tokio::test]
async fn failed_push_is_patched() {
    let h = harness(Some("tok"));
    h.container.set_output(CRASH_OUTPUT);
    h.git.fail_push("rejected");

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Patched).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "Publish failed: git push failed: rejected"));
}

#[tokio::test]
async fn failed_repair_still_publishes() {
    let h = harness(Some("tok"));
    h.container.set_output(CRASH_OUTPUT);
    h.repair.set_outcome(RepairOutcome::Failed("model unavailable".into()));

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Success).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "Repair failed: model unavailable"));
}

#[tokio::test]
async fn tail_failure_uses_monitor_window() {
    let h = harness(None);
    h.container.set_output(CRASH_OUTPUT);
    h.container.fail_tail();

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Patched).await;
    h.orch.shutdown().await;

    let repairs = h.repair.calls();
    assert_eq!(repairs[0].error_context, "booting\nTraceback (most recent call last):");
}

#[tokio::test]
async fn clean_exit_is_exited() {
    let h = harness(None);
    h.container.set_output(["hello", "bye"]);

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Exited).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "[App] bye"));
    assert!(logged(&snap, "Instance output ended."));
    assert!(h.repair.calls().is_empty());
}

#[tokio::test]
async fn build_failure_fails_job() {
    let h = harness(None);
    h.container.fail_build("no space left");

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Failed).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "image build failed: no space left"));
    assert!(!h.container.calls().iter().any(|c| matches!(c, ContainerCall::Run(_))));
}

#[tokio::test]
async fn launch_failure_starts_no_monitor() {
    let h = harness(None);
    h.container.fail_run("port in use");

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Failed).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "instance launch failed: port in use"));
    assert!(!h.container.calls().iter().any(|c| matches!(c, ContainerCall::Logs { .. })));
}

#[tokio::test]
async fn clone_failure_is_redacted() {
    let h = harness(None);
    h.git.fail_clone("denied for s3cret");

    h.orch.deploy(request("https://github.com/o/app", Some("s3cret"))).unwrap();
    wait_for(&h.orch, JobStatus::Failed).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert!(logged(&snap, "clone failed"));
    assert!(!snap.logs.iter().any(|l| l.contains("s3cret")), "{:#?}", snap.logs);
    assert!(h.container.calls().is_empty());
}

#[tokio::test]
async fn invalid_url_is_rejected_without_touching_state() {
    let h = harness(None);
    let before = h.orch.status();

    assert_eq!(h.orch.deploy(request("   ", None)).unwrap_err(), RepoRefError::Empty);
    assert!(h.orch.deploy(request("https://github.com/o/.git", None)).is_err());
    assert_eq!(h.orch.status(), before);
}

#[tokio::test]
async fn stop_while_running() {
    let h = harness(None);
    h.container.set_output(["serving"]);
    h.container.set_hold_open(true);

    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    wait_for(&h.orch, JobStatus::Running).await;

    h.orch.stop().await;
    let snap = h.orch.status();
    assert_eq!(snap.status, JobStatus::Stopped);
    assert!(logged(&snap, "Manual stop signal received."));
    assert!(logged(&snap, "Instance run-app destroyed."));
    assert!(h.container.open_streams().is_empty());

    h.orch.shutdown().await;
    assert_eq!(h.orch.status().status, JobStatus::Stopped);
    assert!(h.repair.calls().is_empty());
}

#[tokio::test]
async fn stop_when_idle() {
    let h = harness(None);
    h.orch.stop().await;
    let snap = h.orch.status();
    assert_eq!(snap.status, JobStatus::Stopped);
    assert!(logged(&snap, "Manual stop signal received."));
    assert!(h.container.calls().is_empty());
}

#[tokio::test]
async fn new_deploy_supersedes_running_job() {
    let h = harness(None);
    h.container.set_output(["first job output"]);
    h.container.set_hold_open(true);
    let first = h.orch.deploy(request("https://github.com/o/alpha", None)).unwrap();
    wait_for(&h.orch, JobStatus::Running).await;

    h.container.set_output(["second job output"]);
    h.container.set_hold_open(false);
    let second = h.orch.deploy(request("https://github.com/o/beta", None)).unwrap();
    assert_ne!(first, second);
    assert_eq!(h.orch.status().job_id, second.to_string());

    wait_for(&h.orch, JobStatus::Exited).await;
    h.orch.shutdown().await;
    let snap = h.orch.status();

    assert_eq!(snap.job_id, second.to_string());
    assert_eq!(snap.instance.as_deref(), Some("run-beta"));
    assert!(!logged(&snap, "first job output"));
    assert!(logged(&snap, "second job output"));

    let calls = h.container.calls();
    let alpha_removed = calls
        .iter()
        .position(|c| matches!(c, ContainerCall::Remove { name, .. } if name == "run-alpha"))
        .unwrap();
    let beta_built = calls
        .iter()
        .position(|c| matches!(c, ContainerCall::Build { tag, .. } if tag == "autoheal-beta"))
        .unwrap();
    assert!(alpha_removed < beta_built, "{:#?}", calls);
}

#[tokio::test]
async fn redeploy_reuses_workspace_and_names() {
    let h = harness(None);
    h.container.set_output(["ok"]);

    h.orch.deploy(request("https://github.com/o/app.git", None)).unwrap();
    let first = wait_for(&h.orch, JobStatus::Exited).await;
    h.orch.deploy(request("https://github.com/o/app", None)).unwrap();
    let second = wait_for(&h.orch, JobStatus::Exited).await;
    h.orch.shutdown().await;

    assert_eq!(first.workspace_path, second.workspace_path);
    assert_eq!(first.instance, second.instance);
}
