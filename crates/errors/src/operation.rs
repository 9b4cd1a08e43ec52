//! Operation state machine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationError {
    #[error("operation metadata field is empty: {field}")]
    MissingMetadata { field: String },

    #[error("operation is already on the queue")]
    AlreadyQueued,

    #[error("operation is already running")]
    AlreadyRunning,

    #[error("retry is not allowed while the operation is {status}")]
    RetryNotAllowed { status: String },

    #[error("required pre-operation failed: {title}")]
    PreOperationFailed { title: String },

    #[error("required post-operation failed: {title}")]
    PostOperationFailed { title: String },

    #[error("automatic retry limit reached after {attempts} attempts")]
    AutoRetryLimitReached { attempts: u32 },

    #[error("operation failed: {message}")]
    OperationFailed { message: String },
}
