//! Manager source (repository/bucket/feed) records

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named package repository scoped to one manager
///
/// The name is the identity and never changes; the URL of a source
/// discovered from package listings may start out as a placeholder and be
/// replaced once a source listing reveals the real one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSource {
    pub manager: String,
    pub name: String,
    pub url: String,
    pub package_count: Option<u64>,
    pub last_updated: Option<String>,
}

impl ManagerSource {
    pub fn new(manager: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            manager: manager.into(),
            name: name.into(),
            url: url.into(),
            package_count: None,
            last_updated: None,
        }
    }

    #[must_use]
    pub fn with_package_count(mut self, count: u64) -> Self {
        self.package_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_last_updated(mut self, when: impl Into<String>) -> Self {
        self.last_updated = Some(when.into());
        self
    }

    /// Replace the URL in place, keeping the identity
    pub fn replace_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }
}

impl fmt::Display for ManagerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.manager, self.name, self.url)
    }
}
