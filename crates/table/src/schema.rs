//! Table schemas: column labels, search-mode aliases, and sentinel rows

use serde::{Deserialize, Serialize};

/// Labels of the columns a manager prints, in table order
///
/// `Name` is implicit: it is everything before the Id column. `available`
/// and `source` are optional because some tables (e.g. installed-package
/// listings) omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabels {
    pub id: String,
    pub version: String,
    pub available: Option<String>,
    pub source: Option<String>,
}

impl ColumnLabels {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            available: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_available(mut self, label: impl Into<String>) -> Self {
        self.available = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, label: impl Into<String>) -> Self {
        self.source = Some(label.into());
        self
    }
}

/// Everything the parser needs to know about one manager's tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Labels as printed in normal mode
    pub labels: Option<ColumnLabels>,
    /// Alternative labels printed in search mode; detected by the presence
    /// of the alias Id label in the header
    pub search_labels: Option<ColumnLabels>,
    /// Lines containing any of these phrases are skipped entirely
    pub noise_phrases: Vec<String>,
    /// Rows whose Id matches one of these placeholders are dropped
    pub sentinel_ids: Vec<String>,
    /// Rows whose version (or available version) matches one of these
    /// placeholders are dropped
    pub sentinel_versions: Vec<String>,
}

impl TableSchema {
    pub fn new(labels: ColumnLabels) -> Self {
        Self {
            labels: Some(labels),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search_labels(mut self, labels: ColumnLabels) -> Self {
        self.search_labels = Some(labels);
        self
    }

    #[must_use]
    pub fn with_noise_phrases(mut self, phrases: &[&str]) -> Self {
        self.noise_phrases = phrases.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_sentinels(mut self, ids: &[&str], versions: &[&str]) -> Self {
        self.sentinel_ids = ids.iter().map(ToString::to_string).collect();
        self.sentinel_versions = versions.iter().map(ToString::to_string).collect();
        self
    }

    /// Whether a parsed row is a placeholder the manager printed instead
    /// of real data ("No", "Matches", ...)
    #[must_use]
    pub fn is_sentinel_row(&self, id: &str, version: &str, available: Option<&str>) -> bool {
        if self.sentinel_ids.iter().any(|s| s == id) {
            return true;
        }
        if self.sentinel_versions.iter().any(|s| s == version) {
            return true;
        }
        if let Some(available) = available {
            if self.sentinel_versions.iter().any(|s| s == available) {
                return true;
            }
        }
        false
    }

    /// Whether the line is noise that must not disturb table detection
    #[must_use]
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise_phrases.iter().any(|p| line.contains(p.as_str()))
    }
}

/// One data row sliced out of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub id: String,
    pub version: String,
    pub available: Option<String>,
    pub source: Option<String>,
}
