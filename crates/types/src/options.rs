//! Installation options and per-run overrides

use crate::{Architecture, OperationKind, PackageScope};
use serde::{Deserialize, Serialize};

/// Options a caller configures for a package operation
///
/// One instance belongs to exactly one operation; concurrent operations on
/// different packages never share an options value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallOptions {
    #[serde(default)]
    pub run_as_administrator: bool,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub skip_hash_check: bool,
    #[serde(default)]
    pub pre_release: bool,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default)]
    pub scope: Option<PackageScope>,
    #[serde(default)]
    pub custom_install_location: Option<String>,
    /// Pin to a specific version on install
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub custom_parameters_install: Vec<String>,
    #[serde(default)]
    pub custom_parameters_update: Vec<String>,
    #[serde(default)]
    pub custom_parameters_uninstall: Vec<String>,
}

impl InstallOptions {
    /// Custom parameters for the given operation kind
    #[must_use]
    pub fn custom_parameters(&self, kind: OperationKind) -> &[String] {
        match kind {
            OperationKind::Update => &self.custom_parameters_update,
            OperationKind::Uninstall => &self.custom_parameters_uninstall,
            _ => &self.custom_parameters_install,
        }
    }
}

/// Per-run overrides a verdict resolver may force onto an operation
///
/// Each flag is tri-state: `None` means "not forced either way", which is
/// what allows a resolver to force it exactly once. A resolver must check
/// the current value before forcing, so the same correction is never
/// applied twice in a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverriddenOptions {
    pub run_as_administrator: Option<bool>,
    pub scope: Option<PackageScope>,
    /// Whether to pass an explicit version to the manager (uninstall only)
    pub specify_version: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_parameters_follow_kind() {
        let options = InstallOptions {
            custom_parameters_install: vec!["--a".into()],
            custom_parameters_update: vec!["--b".into()],
            custom_parameters_uninstall: vec!["--c".into()],
            ..InstallOptions::default()
        };
        assert_eq!(options.custom_parameters(OperationKind::Install), ["--a"]);
        assert_eq!(options.custom_parameters(OperationKind::Update), ["--b"]);
        assert_eq!(options.custom_parameters(OperationKind::Uninstall), ["--c"]);
    }

    #[test]
    fn test_overrides_default_to_unset() {
        let overridden = OverriddenOptions::default();
        assert_eq!(overridden.run_as_administrator, None);
        assert_eq!(overridden.scope, None);
    }
}
