//! Package records as parsed from manager CLI output

use crate::PackageScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A package known to one manager, installed or upgradable
///
/// Versions are opaque strings: manager CLIs print whatever their
/// ecosystem uses and the engine never compares them numerically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub id: String,
    pub installed_version: String,
    /// Available version, set only for upgradable packages
    pub new_version: Option<String>,
    /// Name of the source this package came from
    pub source_name: String,
    /// Name of the manager that owns this package
    pub manager: String,
    /// Scope the package is installed in, when the listing reveals it
    #[serde(default)]
    pub scope: Option<PackageScope>,
}

impl Package {
    /// Create an installed package record
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        installed_version: impl Into<String>,
        source_name: impl Into<String>,
        manager: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            installed_version: installed_version.into(),
            new_version: None,
            source_name: source_name.into(),
            manager: manager.into(),
            scope: None,
        }
    }

    /// Create an upgradable package record carrying the available version
    pub fn upgradable(
        name: impl Into<String>,
        id: impl Into<String>,
        installed_version: impl Into<String>,
        new_version: impl Into<String>,
        source_name: impl Into<String>,
        manager: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            installed_version: installed_version.into(),
            new_version: Some(new_version.into()),
            source_name: source_name.into(),
            manager: manager.into(),
            scope: None,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: PackageScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn is_upgradable(&self) -> bool {
        self.new_version.is_some()
    }
}

// Identity is (manager, id, installed_version); name, source and the
// available version do not participate.
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.manager == other.manager
            && self.id == other.id
            && self.installed_version == other.installed_version
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.manager.hash(state);
        self.id.hash(state);
        self.installed_version.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.new_version {
            Some(new) => write!(
                f,
                "{}/{} {} -> {}",
                self.manager, self.id, self.installed_version, new
            ),
            None => write!(f, "{}/{} {}", self.manager, self.id, self.installed_version),
        }
    }
}
