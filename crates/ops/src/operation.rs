//! The operation state machine
//!
//! `InQueue -> Running -> {Succeeded | Failed | Canceled}`, with
//! `Running -> InQueue` reserved for user-initiated retries and automatic
//! retries looping inside the run phase without giving up the queue slot.

use crate::action::{OperationAction, SubOperation};
use crate::queue::OperationQueue;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use upm_config::QueueConfig;
use upm_errors::{Error, OperationError, Result};
use upm_events::{channel, EventEmitter, EventReceiver, EventSender, OperationEvent};
use upm_types::{
    BadgeCollection, LineKind, OperationId, OperationMetadata, OperationStatus, RetryMode, Uuid,
    Verdict,
};

/// Automatic retries allowed per run
///
/// Resolvers guard each correction with the tri-state overridden flags,
/// but a cap keeps a misbehaving manager from looping forever.
pub const MAX_AUTO_RETRIES: u32 = 3;

/// One captured log line and its classification
pub type LogEntry = (String, LineKind);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Event emitter that also records every line into the operation's log
#[derive(Debug, Clone)]
pub struct OperationLogger {
    id: OperationId,
    sender: EventSender,
    log: Arc<Mutex<Vec<LogEntry>>>,
}

impl EventEmitter for OperationLogger {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.sender)
    }

    fn operation_id(&self) -> OperationId {
        self.id
    }

    fn emit_line(&self, line: impl Into<String>, kind: LineKind) {
        let line = line.into();
        lock(&self.log).push((line.clone(), kind));
        self.emit(OperationEvent::LogLine {
            id: self.id,
            line,
            kind,
        });
    }
}

struct Content {
    pre: Vec<SubOperation>,
    action: Box<dyn OperationAction>,
    post: Vec<SubOperation>,
}

struct Inner {
    id: OperationId,
    metadata: OperationMetadata,
    queue_enabled: bool,
    queue: Arc<OperationQueue>,
    poll_interval: Duration,
    sender: EventSender,
    log: Arc<Mutex<Vec<LogEntry>>>,
    badges: Mutex<BadgeCollection>,
    status_tx: watch::Sender<OperationStatus>,
    cancel: Mutex<CancellationToken>,
    content: AsyncMutex<Content>,
    running: Mutex<bool>,
}

/// A single trackable unit of work with its own lifecycle and log
///
/// Cloning the handle is cheap; all clones drive the same operation.
#[derive(Clone)]
pub struct Operation {
    inner: Arc<Inner>,
}

impl Operation {
    /// Create an operation around an action
    ///
    /// The returned receiver is the operation's only event stream; hand
    /// it to whatever renders or records progress.
    #[must_use]
    pub fn new(
        metadata: OperationMetadata,
        action: Box<dyn OperationAction>,
        pre: Vec<SubOperation>,
        post: Vec<SubOperation>,
        queue: Arc<OperationQueue>,
        config: &QueueConfig,
        queue_enabled: bool,
    ) -> (Self, EventReceiver) {
        let (sender, receiver) = channel();
        let (status_tx, _) = watch::channel(OperationStatus::InQueue);
        let badges = action.badges();
        let inner = Arc::new(Inner {
            id: Uuid::new_v4(),
            metadata,
            queue_enabled,
            queue,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            sender,
            log: Arc::new(Mutex::new(Vec::new())),
            badges: Mutex::new(badges),
            status_tx,
            cancel: Mutex::new(CancellationToken::new()),
            content: AsyncMutex::new(Content {
                pre,
                action,
                post,
            }),
            running: Mutex::new(false),
        });
        (Self { inner }, receiver)
    }

    #[must_use]
    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    #[must_use]
    pub fn metadata(&self) -> &OperationMetadata {
        &self.inner.metadata
    }

    #[must_use]
    pub fn status(&self) -> OperationStatus {
        *self.inner.status_tx.borrow()
    }

    /// Snapshot of every log line captured so far
    #[must_use]
    pub fn log_snapshot(&self) -> Vec<LogEntry> {
        lock(&self.inner.log).clone()
    }

    #[must_use]
    pub fn badges(&self) -> BadgeCollection {
        *lock(&self.inner.badges)
    }

    /// Position in the global queue, if currently queued
    #[must_use]
    pub fn queue_position(&self) -> Option<usize> {
        self.inner.queue.position(self.inner.id)
    }

    /// Begin executing: enqueue, wait for admission, run
    ///
    /// # Errors
    ///
    /// Returns an error when the operation is already running or has
    /// reached a terminal state (use [`Operation::retry`] instead).
    pub fn start(&self) -> Result<()> {
        let status = self.status();
        if status.is_terminal() {
            return Err(OperationError::RetryNotAllowed {
                status: status.to_string(),
            }
            .into());
        }
        self.start_run()
    }

    /// Request cancellation; idempotent
    ///
    /// A queued operation leaves the queue immediately and never spawns a
    /// process. A running operation keeps its `Running` status until the
    /// subprocess has actually been killed and reaped.
    pub fn cancel(&self) {
        match self.status() {
            OperationStatus::Running => {
                self.inner
                    .emit(OperationEvent::CancelRequested { id: self.inner.id });
                lock(&self.inner.cancel).cancel();
            }
            OperationStatus::InQueue => {
                self.inner
                    .emit(OperationEvent::CancelRequested { id: self.inner.id });
                lock(&self.inner.cancel).cancel();
                self.inner.queue.remove(self.inner.id);
                self.inner
                    .logger()
                    .emit_line("Operation was canceled by the user", LineKind::Progress);
                self.inner.set_status(OperationStatus::Canceled);
            }
            _ => {}
        }
    }

    /// Re-run a finished operation, optionally adjusting its options
    ///
    /// # Errors
    ///
    /// Returns an error unless the operation is in a terminal,
    /// non-canceled state.
    pub fn retry(&self, mode: RetryMode) -> Result<()> {
        let status = self.status();
        if !matches!(
            status,
            OperationStatus::Succeeded | OperationStatus::Failed
        ) {
            return Err(OperationError::RetryNotAllowed {
                status: status.to_string(),
            }
            .into());
        }
        {
            let mut content = self
                .inner
                .content
                .try_lock()
                .map_err(|_| OperationError::AlreadyRunning)?;
            content.action.apply_retry(mode);
            let badges = content.action.badges();
            self.inner.update_badges(&self.inner.logger(), badges);
        }
        self.inner.set_status(OperationStatus::InQueue);
        self.start_run()
    }

    /// Jump to the front of the queue; only meaningful while queued
    pub fn skip_queue(&self) {
        if self.status() == OperationStatus::InQueue {
            self.inner.queue.skip_queue(self.inner.id);
        }
    }

    /// Claim the next free run slot; only meaningful while queued
    pub fn run_next(&self) {
        if self.status() == OperationStatus::InQueue {
            self.inner.queue.run_next(self.inner.id);
        }
    }

    /// Yield to every other queued operation; only meaningful while queued
    pub fn back_of_queue(&self) {
        if self.status() == OperationStatus::InQueue {
            self.inner.queue.back_of_queue(self.inner.id);
        }
    }

    /// Wait until the operation reaches a terminal status
    pub async fn wait(&self) -> OperationStatus {
        let mut rx = self.inner.status_tx.subscribe();
        loop {
            let status = *rx.borrow_and_update();
            if status.is_terminal() {
                return status;
            }
            if rx.changed().await.is_err() {
                return *rx.borrow();
            }
        }
    }

    fn start_run(&self) -> Result<()> {
        {
            let mut running = lock(&self.inner.running);
            if *running {
                return Err(OperationError::AlreadyRunning.into());
            }
            *running = true;
        }

        // Incomplete metadata is a data error caught before anything runs
        if let Err(e) = self.inner.metadata.validate() {
            let logger = self.inner.logger();
            logger.emit_line(e.to_string(), LineKind::StdErr);
            self.inner.queue.remove(self.inner.id);
            self.inner.set_status(OperationStatus::Failed);
            logger.emit(OperationEvent::Failed { id: self.inner.id });
            *lock(&self.inner.running) = false;
            return Err(e.into());
        }

        let token = CancellationToken::new();
        *lock(&self.inner.cancel) = token.clone();

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.clone().run_loop(token).await;
            *lock(&inner.running) = false;
        });
        Ok(())
    }
}

impl EventEmitter for Inner {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.sender)
    }

    fn operation_id(&self) -> OperationId {
        self.id
    }
}

impl Inner {
    fn logger(&self) -> OperationLogger {
        OperationLogger {
            id: self.id,
            sender: self.sender.clone(),
            log: Arc::clone(&self.log),
        }
    }

    fn set_status(&self, status: OperationStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            self.emit(OperationEvent::StatusChanged { id: self.id, status });
        }
    }

    fn update_badges(&self, logger: &OperationLogger, badges: BadgeCollection) {
        let changed = {
            let mut current = lock(&self.badges);
            if *current == badges {
                false
            } else {
                *current = badges;
                true
            }
        };
        if changed {
            logger.emit_badges(badges);
        }
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        let logger = self.logger();

        if self.queue_enabled {
            match self.queue.enqueue(self.id) {
                Ok(position) => {
                    logger.emit(OperationEvent::Enqueued {
                        id: self.id,
                        position,
                    });
                    logger.emit_line(
                        format!("Operation on queue (position {position})..."),
                        LineKind::Progress,
                    );
                }
                Err(e) => {
                    self.fail_with_error(&logger, &e.into());
                    return;
                }
            }

            let mut last_position = None;
            loop {
                if cancel.is_cancelled() {
                    self.queue.remove(self.id);
                    self.set_status(OperationStatus::Canceled);
                    return;
                }
                if self.queue.is_admitted(self.id) {
                    break;
                }
                let position = self.queue.position(self.id);
                if position != last_position {
                    if let Some(position) = position {
                        logger.emit(OperationEvent::QueuePositionChanged {
                            id: self.id,
                            position,
                        });
                        logger.emit_line(
                            format!("Operation on queue (position {position})..."),
                            LineKind::Progress,
                        );
                    }
                    last_position = position;
                }
                tokio::select! {
                    () = tokio::time::sleep(self.poll_interval) => {}
                    () = cancel.cancelled() => {}
                }
            }
        } else {
            logger.emit(OperationEvent::Enqueued {
                id: self.id,
                position: 0,
            });
        }

        if cancel.is_cancelled() {
            self.queue.remove(self.id);
            self.set_status(OperationStatus::Canceled);
            return;
        }

        logger.emit(OperationEvent::Starting { id: self.id });
        self.set_status(OperationStatus::Running);
        logger.emit_line("Starting operation...", LineKind::Progress);
        logger.emit_line(&self.metadata.status_message, LineKind::Progress);

        let verdict = self.perform(&logger, &cancel).await;

        // Leave the queue before any terminal notification, so observers
        // never see a finished operation occupying a slot
        self.queue.remove(self.id);

        if cancel.is_cancelled() || verdict == Verdict::Canceled {
            logger.emit_line("Operation was canceled by the user", LineKind::Progress);
            self.set_status(OperationStatus::Canceled);
            return;
        }

        match verdict {
            Verdict::Success => {
                if self.run_post_operations(&logger, &cancel).await {
                    logger.emit_line(&self.metadata.success_message, LineKind::Progress);
                    self.set_status(OperationStatus::Succeeded);
                    logger.emit(OperationEvent::Succeeded { id: self.id });
                } else {
                    self.fail(&logger);
                }
            }
            _ => self.fail(&logger),
        }
    }

    /// Pre-operations, then the action with its bounded AutoRetry loop
    async fn perform(&self, logger: &OperationLogger, cancel: &CancellationToken) -> Verdict {
        let mut content = self.content.lock().await;

        for sub in &mut content.pre {
            logger.emit_line(
                format!("Running pre-operation: {}", sub.title),
                LineKind::Progress,
            );
            let verdict = match sub.action.run(logger, cancel).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    logger.emit_line(e.to_string(), LineKind::StdErr);
                    Verdict::Failure
                }
            };
            if cancel.is_cancelled() {
                return Verdict::Canceled;
            }
            if verdict != Verdict::Success {
                if sub.must_succeed {
                    logger.emit_line(
                        OperationError::PreOperationFailed {
                            title: sub.title.clone(),
                        }
                        .to_string(),
                        LineKind::StdErr,
                    );
                    return Verdict::Failure;
                }
                logger.emit_line(
                    format!("Pre-operation failed, continuing: {}", sub.title),
                    LineKind::StdErr,
                );
            }
        }

        let mut attempts: u32 = 0;
        loop {
            let verdict = match content.action.run(logger, cancel).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    // Unexpected failure: log in full and force Failed
                    tracing::error!(operation = %self.id, error = %e, "operation action failed");
                    logger.emit_line(e.to_string(), LineKind::StdErr);
                    Verdict::Failure
                }
            };
            logger.emit_finished(verdict);

            if cancel.is_cancelled() {
                return Verdict::Canceled;
            }

            if verdict == Verdict::AutoRetry {
                attempts += 1;
                if attempts > MAX_AUTO_RETRIES {
                    logger.emit_line(
                        OperationError::AutoRetryLimitReached { attempts }.to_string(),
                        LineKind::StdErr,
                    );
                    return Verdict::Failure;
                }
                self.update_badges(logger, content.action.badges());
                logger.emit_line(
                    "Retrying automatically with updated options...",
                    LineKind::Progress,
                );
                continue;
            }

            return verdict;
        }
    }

    /// Post-operations; false when a must-succeed one failed
    async fn run_post_operations(
        &self,
        logger: &OperationLogger,
        cancel: &CancellationToken,
    ) -> bool {
        let mut content = self.content.lock().await;
        for sub in &mut content.post {
            logger.emit_line(
                format!("Running post-operation: {}", sub.title),
                LineKind::Progress,
            );
            let verdict = match sub.action.run(logger, cancel).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    logger.emit_line(e.to_string(), LineKind::StdErr);
                    Verdict::Failure
                }
            };
            if verdict != Verdict::Success {
                if sub.must_succeed {
                    logger.emit_line(
                        OperationError::PostOperationFailed {
                            title: sub.title.clone(),
                        }
                        .to_string(),
                        LineKind::StdErr,
                    );
                    return false;
                }
                logger.emit_line(
                    format!("Post-operation failed, continuing: {}", sub.title),
                    LineKind::StdErr,
                );
            }
        }
        true
    }

    fn fail(&self, logger: &OperationLogger) {
        logger.emit_line(&self.metadata.failure_message, LineKind::StdErr);
        self.set_status(OperationStatus::Failed);
        logger.emit(OperationEvent::Failed { id: self.id });
    }

    fn fail_with_error(&self, logger: &OperationLogger, error: &Error) {
        logger.emit_line(error.to_string(), LineKind::StdErr);
        self.queue.remove(self.id);
        self.fail(logger);
    }
}
