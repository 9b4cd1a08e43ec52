//! Line-streaming subprocess runner

use crate::spec::ProcessSpec;
use chrono::Local;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use upm_errors::{Error, ProcessError};
use upm_events::EventEmitter;
use upm_types::LineKind;

/// Output lines shorter than this are treated as progress chatter
const PROGRESS_LINE_THRESHOLD: usize = 6;

/// What a finished subprocess left behind
///
/// The runner makes no success judgement; the caller hands the exit code
/// and the captured lines to a verdict resolver.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    /// Every captured line, stdout and stderr, in arrival order
    pub lines: Vec<String>,
}

/// Spawn the process and stream its output until it exits
///
/// Each stdout line is classified as `Progress` (short lines, or the
/// manager's "waiting" phrase) or `StdOut`; stderr lines are `StdErr`.
/// All lines are buffered into the outcome regardless of classification.
///
/// Cancelling the token kills the child immediately and the call still
/// waits for the exit status, so no zombie outlives the operation.
///
/// # Errors
///
/// Returns `ProcessError::SpawnFailed` when the executable cannot be
/// started and `ProcessError::WaitFailed` when the exit status cannot be
/// collected.
pub async fn run<E: EventEmitter>(
    spec: &ProcessSpec,
    emitter: &E,
    cancel: &CancellationToken,
    waiting_phrase: Option<&str>,
) -> Result<ProcessOutcome, Error> {
    let mut command = Command::new(spec.program());
    command
        .args(spec.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = spec.working_dir() {
        command.current_dir(dir);
    }
    for (key, value) in spec.envs() {
        command.env(key, value);
    }

    emitter.emit_line("Executing process:", LineKind::Debug);
    emitter.emit_line(
        format!(" - Executable: \"{}\"", spec.program().display()),
        LineKind::Debug,
    );
    emitter.emit_line(
        format!(" - Arguments: \"{}\"", spec.args().join(" ")),
        LineKind::Debug,
    );
    emitter.emit_line(format!("Start time: {}", Local::now()), LineKind::Debug);

    let mut child = command.spawn().map_err(|e| ProcessError::SpawnFailed {
        program: spec.program().display().to_string(),
        message: e.to_string(),
    })?;

    let stdout = child.stdout.take().ok_or(ProcessError::StreamUnavailable {
        stream: "stdout".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or(ProcessError::StreamUnavailable {
        stream: "stderr".to_string(),
    })?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let waiting = waiting_phrase.map(ToString::to_string);
    spawn_reader(stdout, line_tx.clone(), move |line| {
        if line.len() < PROGRESS_LINE_THRESHOLD
            || waiting.as_deref().is_some_and(|phrase| line.contains(phrase))
        {
            LineKind::Progress
        } else {
            LineKind::StdOut
        }
    });
    spawn_reader(stderr, line_tx, |_| LineKind::StdErr);

    let mut lines = Vec::new();
    let mut killed = false;
    loop {
        tokio::select! {
            received = line_rx.recv() => match received {
                Some((line, kind)) => {
                    emitter.emit_line(format!(">> {line}"), kind);
                    lines.push(line);
                }
                // Both streams closed: the process is done
                None => break,
            },
            () = cancel.cancelled(), if !killed => {
                killed = true;
                // No graceful shutdown: wedged installers only die when killed
                if let Err(e) = child.start_kill() {
                    tracing::warn!("failed to kill child process: {e}");
                }
                emitter.emit_line("Operation was canceled by the user", LineKind::StdErr);
            }
        }
    }

    let status = child.wait().await.map_err(|e| ProcessError::WaitFailed {
        message: e.to_string(),
    })?;
    let exit_code = status.code().unwrap_or(-1);

    emitter.emit_line(format!("End time: {}", Local::now()), LineKind::Debug);
    emitter.emit_line(format!("Process exit code: {exit_code}"), LineKind::Debug);

    Ok(ProcessOutcome { exit_code, lines })
}

fn spawn_reader<R, F>(stream: R, tx: mpsc::UnboundedSender<(String, LineKind)>, classify: F)
where
    R: AsyncRead + Unpin + Send + 'static,
    F: Fn(&str) -> LineKind + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let kind = classify(trimmed);
            if tx.send((trimmed.to_string(), kind)).is_err() {
                break;
            }
        }
    });
}
