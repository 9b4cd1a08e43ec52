//! CLI error handling

use std::fmt;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(upm_errors::ConfigError),
    /// Engine error
    Engine(upm_errors::Error),
    /// Manager selection error
    Manager(upm_errors::ManagerError),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Engine(e) => write!(f, "{e}"),
            CliError::Manager(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Manager(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<upm_errors::ConfigError> for CliError {
    fn from(e: upm_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<upm_errors::Error> for CliError {
    fn from(e: upm_errors::Error) -> Self {
        CliError::Engine(e)
    }
}

impl From<upm_errors::ManagerError> for CliError {
    fn from(e: upm_errors::ManagerError) -> Self {
        CliError::Manager(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
