//! Integration tests for the subprocess runner
//!
//! These spawn real shells, so they assume a POSIX `sh` on PATH.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use upm_events::{channel, OperationEmitter, OperationEvent};
use upm_process::{run, ProcessSpec};
use upm_types::{LineKind, Uuid};

fn sh(script: &str) -> ProcessSpec {
    ProcessSpec::builder()
        .executable("sh")
        .arguments(["-c", script])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_captures_stdout_and_stderr() {
    let (tx, _rx) = channel();
    let emitter = OperationEmitter::new(Uuid::new_v4(), tx);
    let cancel = CancellationToken::new();

    let outcome = run(
        &sh("echo a meaningful output line; echo an error line >&2"),
        &emitter,
        &cancel,
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.exit_code, 0);
    assert!(outcome
        .lines
        .iter()
        .any(|l| l == "a meaningful output line"));
    assert!(outcome.lines.iter().any(|l| l == "an error line"));
}

#[tokio::test]
async fn test_line_classification() {
    let (tx, mut rx) = channel();
    let emitter = OperationEmitter::new(Uuid::new_v4(), tx);
    let cancel = CancellationToken::new();

    run(
        &sh("echo ok; echo a meaningful output line; echo 'Waiting for another install...'"),
        &emitter,
        &cancel,
        Some("Waiting for another install..."),
    )
    .await
    .unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let OperationEvent::LogLine { line, kind, .. } = event {
            if line.starts_with(">> ") {
                kinds.push((line, kind));
            }
        }
    }

    assert_eq!(kinds[0].1, LineKind::Progress); // "ok" is short
    assert_eq!(kinds[1].1, LineKind::StdOut);
    assert_eq!(kinds[2].1, LineKind::Progress); // waiting phrase
}

#[tokio::test]
async fn test_exit_code_propagates() {
    let (tx, _rx) = channel();
    let emitter = OperationEmitter::new(Uuid::new_v4(), tx);
    let cancel = CancellationToken::new();

    let outcome = run(&sh("exit 7"), &emitter, &cancel, None).await.unwrap();
    assert_eq!(outcome.exit_code, 7);
}

#[tokio::test]
async fn test_cancellation_kills_child() {
    let (tx, _rx) = channel();
    let emitter = OperationEmitter::new(Uuid::new_v4(), tx);
    let cancel = CancellationToken::new();

    let child_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        child_cancel.cancel();
    });

    let started = Instant::now();
    let outcome = run(&sh("sleep 30"), &emitter, &cancel, None).await.unwrap();

    // Killed, not waited out
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_ne!(outcome.exit_code, 0);
}

#[tokio::test]
async fn test_spawn_failure_is_an_error() {
    let (tx, _rx) = channel();
    let emitter = OperationEmitter::new(Uuid::new_v4(), tx);
    let cancel = CancellationToken::new();

    let spec = ProcessSpec::builder()
        .executable("/nonexistent/upm-test-binary")
        .arguments(Vec::<String>::new())
        .build()
        .unwrap();
    assert!(run(&spec, &emitter, &cancel, None).await.is_err());
}
