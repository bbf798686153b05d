// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ah_core::{FakeClock, JobState};
use std::time::Duration;
use tokio::sync::mpsc;

fn stream_of(lines: &[&str]) -> (LogStream, mpsc::Sender<String>) {
    let (tx, rx) = mpsc::channel(lines.len() + 1);
    for line in lines {
        tx.try_send(line.to_string()).unwrap();
    }
    (LogStream::from_receiver(rx), tx)
}

fn job() -> (JobState<FakeClock>, JobScope<FakeClock>) {
    let state = JobState::new(100, FakeClock::new());
    let scope = state.begin("https://github.com/o/r");
    (state, scope)
}

#[tokio::test]
async fn stops_at_first_crash_line() {
    let (state, scope) = job();
    let (mut stream, _tx) = stream_of(&[
        "starting",
        "Traceback (most recent call last):",
        "  File \"/app/main.py\", line 3",
    ]);
    let mut window = LogBuffer::new(20);

    let (signatures, cancel) = (SignatureSet::default(), CancellationToken::new());
    let exit = watch(&mut stream, &scope, &signatures, &mut window, &cancel).await;

    assert_eq!(
        exit,
        MonitorExit::Crashed {
            signature: "Traceback".into(),
            line: "Traceback (most recent call last):".into()
        }
    );
    let logs = state.snapshot().logs;
    assert_eq!(logs.len(), 2);
    assert!(logs[0].ends_with("[App] starting"));
    assert!(logs[1].ends_with("[App] Traceback (most recent call last):"));
    assert_eq!(window.to_vec(), ["starting", "Traceback (most recent call last):"]);
}

#[tokio::test]
async fn clean_output_ends_stream() {
    let (state, scope) = job();
    let (mut stream, tx) = stream_of(&["hello", "  padded  "]);
    drop(tx);
    let mut window = LogBuffer::new(20);

    let (signatures, cancel) = (SignatureSet::default(), CancellationToken::new());
    let exit = watch(&mut stream, &scope, &signatures, &mut window, &cancel).await;

    assert_eq!(exit, MonitorExit::StreamEnded);
    assert!(state.snapshot().logs[1].ends_with("[App] padded"));
}

#[tokio::test]
async fn cancellation_interrupts_idle_stream() {
    let (_state, scope) = job();
    let (mut stream, _tx) = stream_of(&[]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let mut window = LogBuffer::new(20);

    let exit = watch(&mut stream, &scope, &SignatureSet::default(), &mut window, &cancel).await;
    assert_eq!(exit, MonitorExit::Cancelled);
}

#[tokio::test]
async fn cancellation_wins_over_pending_lines() {
    let (state, scope) = job();
    let (mut stream, _tx) = stream_of(&["Exception: late"]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut window = LogBuffer::new(20);

    let exit = watch(&mut stream, &scope, &SignatureSet::default(), &mut window, &cancel).await;
    assert_eq!(exit, MonitorExit::Cancelled);
    assert!(state.snapshot().logs.is_empty());
}

#[tokio::test]
async fn window_keeps_last_lines() {
    let (_state, scope) = job();
    let lines: Vec<String> = (0..30).map(|i| format!("line {}", i)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (mut stream, tx) = stream_of(&refs);
    drop(tx);
    let mut window = LogBuffer::new(20);

    let signatures = SignatureSet::default();
    watch(&mut stream, &scope, &signatures, &mut window, &CancellationToken::new()).await;
    let kept = window.to_vec();
    assert_eq!(kept.len(), 20);
    assert_eq!(kept[0], "line 10");
}
