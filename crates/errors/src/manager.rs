//! Package-manager adapter error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ManagerError {
    #[error("unknown package manager: {name}")]
    UnknownManager { name: String },

    #[error("executable for {manager} not found: {executable}")]
    ExecutableNotFound { manager: String, executable: String },

    #[error("{manager} does not support {operation}")]
    UnsupportedOperation { manager: String, operation: String },

    #[error("listing {what} with {manager} failed: {message}")]
    ListingFailed {
        manager: String,
        what: String,
        message: String,
    },
}
