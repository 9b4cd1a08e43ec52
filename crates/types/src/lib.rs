#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the upm operation engine
//!
//! This crate provides the fundamental value types used throughout the
//! system: packages and sources as parsed from manager CLI output,
//! installation options, operation statuses, and verdicts.

pub mod operation;
pub mod options;
pub mod package;
pub mod source;

// Re-export commonly used types
pub use operation::{
    BadgeCollection, LineKind, OperationId, OperationKind, OperationMetadata, OperationStatus,
    RetryMode, Verdict,
};
pub use options::{InstallOptions, OverriddenOptions};
pub use package::Package;
pub use source::ManagerSource;
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Architecture a package can be installed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
    Arm64,
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X86 => write!(f, "x86"),
            Self::X64 => write!(f, "x64"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}

/// Installation scope of a package
///
/// Managers that distinguish per-user from machine-wide installs map both
/// their "local"/"user" and "global"/"machine" notions onto these two
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageScope {
    User,
    Global,
}

impl std::fmt::Display for PackageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Global => write!(f, "global"),
        }
    }
}
