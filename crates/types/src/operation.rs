//! Operation statuses, verdicts, and metadata

use crate::PackageScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use upm_errors::OperationError;

/// Unique identifier of an operation
pub type OperationId = uuid::Uuid;

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    InQueue,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Whether the operation has reached a final state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InQueue => write!(f, "in queue"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// What a captured output line represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Engine bookkeeping (executable, arguments, timestamps)
    Debug,
    /// Transient progress chatter a UI may overwrite in place
    Progress,
    StdOut,
    StdErr,
}

/// The kind of work an operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Install,
    Update,
    Uninstall,
    AddSource,
    RemoveSource,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Update => write!(f, "update"),
            Self::Uninstall => write!(f, "uninstall"),
            Self::AddSource => write!(f, "add source"),
            Self::RemoveSource => write!(f, "remove source"),
        }
    }
}

/// Classification of a finished subprocess run
///
/// `AutoRetry` means the resolver has already mutated the operation's
/// overridden options and the run should be repeated without user
/// involvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Success,
    Failure,
    Canceled,
    AutoRetry,
}

/// How a user-initiated retry should modify the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryMode {
    Retry,
    RetryAsAdmin,
    RetryInteractive,
    RetryNoHashCheck,
}

/// Human-readable strings describing an operation
///
/// All fields except `information` must be non-empty before the operation
/// may run; a UI renders them verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub title: String,
    pub status_message: String,
    pub success_title: String,
    pub success_message: String,
    pub failure_title: String,
    pub failure_message: String,
    #[serde(default)]
    pub information: String,
}

impl OperationMetadata {
    /// Check that every required field is non-empty
    ///
    /// # Errors
    ///
    /// Returns `OperationError::MissingMetadata` naming the first empty
    /// field.
    pub fn validate(&self) -> Result<(), OperationError> {
        let fields = [
            ("title", &self.title),
            ("status_message", &self.status_message),
            ("success_title", &self.success_title),
            ("success_message", &self.success_message),
            ("failure_title", &self.failure_title),
            ("failure_message", &self.failure_message),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(OperationError::MissingMetadata {
                    field: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Capability flags describing how an operation will run
///
/// An immutable snapshot recomputed whenever elevation or interactivity
/// requirements change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCollection {
    pub run_as_admin: bool,
    pub interactive: bool,
    pub skip_hash_check: bool,
    pub scope: Option<PackageScope>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_metadata() -> OperationMetadata {
        OperationMetadata {
            title: "7-Zip Installation".into(),
            status_message: "7-Zip is being installed".into(),
            success_title: "Installation succeeded".into(),
            success_message: "7-Zip was installed successfully".into(),
            failure_title: "Installation failed".into(),
            failure_message: "7-Zip could not be installed".into(),
            information: String::new(),
        }
    }

    #[test]
    fn test_metadata_validates_when_complete() {
        assert!(full_metadata().validate().is_ok());
    }

    #[test]
    fn test_metadata_rejects_empty_field() {
        let mut metadata = full_metadata();
        metadata.failure_message = "   ".into();
        let err = metadata.validate().unwrap_err();
        assert!(matches!(
            err,
            OperationError::MissingMetadata { field } if field == "failure_message"
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(OperationStatus::Failed.is_terminal());
        assert!(OperationStatus::Canceled.is_terminal());
        assert!(!OperationStatus::InQueue.is_terminal());
        assert!(!OperationStatus::Running.is_terminal());
    }
}
