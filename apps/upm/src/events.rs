//! Event rendering for running operations
//!
//! Every operation ships its own event stream; the handler merges them
//! onto the terminal. Meaningful output and errors always print; progress
//! chatter and engine bookkeeping only with the matching flags.

use std::collections::HashMap;
use upm_events::OperationEvent;
use upm_types::{LineKind, OperationId};

/// Renders operation events to stdout/stderr
pub struct EventHandler {
    titles: HashMap<OperationId, String>,
    show_progress: bool,
    show_debug: bool,
}

impl EventHandler {
    pub fn new(show_progress: bool, show_debug: bool) -> Self {
        Self {
            titles: HashMap::new(),
            show_progress,
            show_debug,
        }
    }

    /// Remember an operation's title for line prefixes
    pub fn register(&mut self, id: OperationId, title: impl Into<String>) {
        self.titles.insert(id, title.into());
    }

    /// Lines are prefixed with the operation title once several
    /// operations share the terminal
    fn prefix(&self, id: OperationId) -> String {
        if self.titles.len() < 2 {
            return String::new();
        }
        match self.titles.get(&id) {
            Some(title) => format!("[{title}] "),
            None => String::new(),
        }
    }

    fn title(&self, id: OperationId) -> &str {
        self.titles.get(&id).map_or("operation", String::as_str)
    }

    /// Handle one incoming event
    pub fn handle(&self, event: &OperationEvent) {
        let prefix = self.prefix(event.operation_id());
        match event {
            OperationEvent::LogLine { line, kind, .. } => match kind {
                LineKind::Debug => {
                    if self.show_debug {
                        eprintln!("{prefix}{line}");
                    }
                }
                LineKind::Progress => {
                    if self.show_progress {
                        println!("{prefix}{line}");
                    }
                }
                LineKind::StdOut => println!("{prefix}{line}"),
                LineKind::StdErr => eprintln!("{prefix}{line}"),
            },
            OperationEvent::BadgesChanged { badges, .. } => {
                if self.show_progress {
                    let mut flags = Vec::new();
                    if badges.run_as_admin {
                        flags.push("administrator".to_string());
                    }
                    if badges.interactive {
                        flags.push("interactive".to_string());
                    }
                    if badges.skip_hash_check {
                        flags.push("no hash checks".to_string());
                    }
                    if let Some(scope) = badges.scope {
                        flags.push(format!("{scope} scope"));
                    }
                    println!("{prefix}Next attempt runs with: {}", flags.join(", "));
                }
            }
            OperationEvent::CancelRequested { .. } => {
                eprintln!("{prefix}Cancel requested");
            }
            OperationEvent::Succeeded { id } => {
                println!("[OK] {}", self.title(*id));
            }
            OperationEvent::Failed { id } => {
                eprintln!("[FAILED] {}", self.title(*id));
            }
            // The run loop already narrates queueing, starting, and
            // per-attempt verdicts through progress log lines
            OperationEvent::Enqueued { .. }
            | OperationEvent::QueuePositionChanged { .. }
            | OperationEvent::Starting { .. }
            | OperationEvent::StatusChanged { .. }
            | OperationEvent::Finished { .. } => {}
        }
    }
}
