//! The capability an operation executes
//!
//! Operations are composed, not subclassed: the state machine is one
//! concrete type, and everything manager-specific lives behind
//! [`OperationAction`].

use crate::operation::OperationLogger;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use upm_errors::Result;
use upm_types::{BadgeCollection, RetryMode, Verdict};

/// One attempt of an operation's work
///
/// `run` may be called several times on the same action: once per
/// automatic retry and once per user-initiated retry. Actions that wrap a
/// subprocess must observe the cancellation token and make sure the
/// process is gone before returning.
#[async_trait]
pub trait OperationAction: Send {
    /// Execute one attempt and classify its outcome
    ///
    /// Returning [`Verdict::AutoRetry`] implies the action has already
    /// adjusted its own options for the next attempt.
    async fn run(&mut self, logger: &OperationLogger, cancel: &CancellationToken)
        -> Result<Verdict>;

    /// Apply a user-initiated retry mode to the action's options
    fn apply_retry(&mut self, mode: RetryMode);

    /// Capability badges describing how the next attempt will run
    fn badges(&self) -> BadgeCollection;
}

/// A pre- or post-operation attached to a parent operation
pub struct SubOperation {
    pub title: String,
    /// Whether a failure of this sub-operation fails the whole operation
    pub must_succeed: bool,
    pub action: Box<dyn OperationAction>,
}

impl SubOperation {
    pub fn new(
        title: impl Into<String>,
        must_succeed: bool,
        action: Box<dyn OperationAction>,
    ) -> Self {
        Self {
            title: title.into(),
            must_succeed,
            action,
        }
    }
}
