//! Table parsing error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseError {
    #[error("no table header found in output")]
    HeaderNotFound,

    #[error("column not found in header: {label}")]
    ColumnNotFound { label: String },

    #[error("malformed table row: {message}")]
    MalformedRow { message: String },
}
