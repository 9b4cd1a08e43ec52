//! Subprocess executor error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessError {
    #[error("process executable has not been set")]
    ExecutableNotSet,

    #[error("process arguments have not been set")]
    ArgumentsNotSet,

    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("failed to open {stream} of child process")]
    StreamUnavailable { stream: String },

    #[error("failed to kill child process: {message}")]
    KillFailed { message: String },

    #[error("failed to wait for child process: {message}")]
    WaitFailed { message: String },
}
