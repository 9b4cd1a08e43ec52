#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in upm
//!
//! Every operation owns one outbound event channel. Whoever constructs an
//! operation receives the matching receiver and renders or forwards the
//! events; the engine itself never prints.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use upm_types::{BadgeCollection, LineKind, OperationId, OperationStatus, Verdict};

/// Everything an operation reports while it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationEvent {
    /// The operation entered the scheduler queue
    Enqueued {
        id: OperationId,
        position: usize,
    },
    /// The operation's queue position changed while waiting
    QueuePositionChanged {
        id: OperationId,
        position: usize,
    },
    /// The operation was admitted and is about to run its action
    Starting {
        id: OperationId,
    },
    StatusChanged {
        id: OperationId,
        status: OperationStatus,
    },
    /// A captured or engine-generated log line
    LogLine {
        id: OperationId,
        line: String,
        kind: LineKind,
    },
    /// The capability badges changed (e.g. elevation was forced on)
    BadgesChanged {
        id: OperationId,
        badges: BadgeCollection,
    },
    CancelRequested {
        id: OperationId,
    },
    /// One action run finished with the given verdict (AutoRetry included)
    Finished {
        id: OperationId,
        verdict: Verdict,
    },
    Succeeded {
        id: OperationId,
    },
    Failed {
        id: OperationId,
    },
}

impl OperationEvent {
    /// The operation this event belongs to
    #[must_use]
    pub fn operation_id(&self) -> OperationId {
        match self {
            Self::Enqueued { id, .. }
            | Self::QueuePositionChanged { id, .. }
            | Self::Starting { id }
            | Self::StatusChanged { id, .. }
            | Self::LogLine { id, .. }
            | Self::BadgesChanged { id, .. }
            | Self::CancelRequested { id }
            | Self::Finished { id, .. }
            | Self::Succeeded { id }
            | Self::Failed { id } => *id,
        }
    }
}

/// Type alias for event sender
pub type EventSender = UnboundedSender<OperationEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<OperationEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout the upm system
///
/// Implemented by anything that carries an `EventSender`, so helpers can
/// be called on the sender itself or on a struct containing one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// The operation id events from this emitter belong to
    fn operation_id(&self) -> OperationId;

    /// Emit an event through this emitter
    fn emit(&self, event: OperationEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if the receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a log line
    fn emit_line(&self, line: impl Into<String>, kind: LineKind) {
        self.emit(OperationEvent::LogLine {
            id: self.operation_id(),
            line: line.into(),
            kind,
        });
    }

    /// Emit a status change
    fn emit_status(&self, status: OperationStatus) {
        self.emit(OperationEvent::StatusChanged {
            id: self.operation_id(),
            status,
        });
    }

    /// Emit a queue admission event
    fn emit_enqueued(&self, position: usize) {
        self.emit(OperationEvent::Enqueued {
            id: self.operation_id(),
            position,
        });
    }

    /// Emit a badge snapshot change
    fn emit_badges(&self, badges: BadgeCollection) {
        self.emit(OperationEvent::BadgesChanged {
            id: self.operation_id(),
            badges,
        });
    }

    /// Emit a per-run verdict
    fn emit_finished(&self, verdict: Verdict) {
        self.emit(OperationEvent::Finished {
            id: self.operation_id(),
            verdict,
        });
    }
}

/// A bare sender paired with the operation it speaks for
#[derive(Debug, Clone)]
pub struct OperationEmitter {
    id: OperationId,
    sender: EventSender,
}

impl OperationEmitter {
    #[must_use]
    pub fn new(id: OperationId, sender: EventSender) -> Self {
        Self { id, sender }
    }
}

impl EventEmitter for OperationEmitter {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.sender)
    }

    fn operation_id(&self) -> OperationId {
        self.id
    }
}
