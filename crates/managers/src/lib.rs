#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package-manager adapters for upm
//!
//! Every supported CLI tool is wrapped by one [`PackageManager`]
//! implementation that knows the tool's argument syntax, how to read its
//! console tables, and how to judge a finished run. The engine never
//! branches on a concrete manager; everything flows through this trait.

pub mod factory;
pub mod listing;
pub mod scoop;
pub mod winget;

pub use factory::SourceFactory;
pub use listing::{list_installed, list_sources, list_updates};
pub use scoop::Scoop;
pub use winget::WinGet;

use std::sync::Arc;
use upm_errors::ManagerError;
use upm_table::TableSchema;
use upm_types::{
    InstallOptions, ManagerSource, OperationKind, OverriddenOptions, Package, Verdict,
};

/// Static facts about one manager
#[derive(Debug, Clone)]
pub struct ManagerProperties {
    pub name: &'static str,
    pub display_name: &'static str,
    /// Executable looked up on PATH unless overridden by configuration
    pub executable: &'static str,
    /// Arguments always prefixed to any invocation of the executable
    pub call_args: Vec<String>,
    pub install_verb: &'static str,
    pub update_verb: &'static str,
    pub uninstall_verb: &'static str,
}

/// What a manager can do beyond plain install/update/uninstall
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerCapabilities {
    pub can_run_as_admin: bool,
    pub can_skip_integrity_checks: bool,
    pub can_run_interactively: bool,
    pub supports_custom_versions: bool,
    pub supports_custom_scopes: bool,
    pub supports_custom_architectures: bool,
    pub supports_custom_locations: bool,
    pub supports_custom_sources: bool,
    pub supports_prerelease: bool,
}

/// Uniform interface over one package-manager CLI
///
/// Verdict resolvers are pure up to the `overridden` parameter: they may
/// force an option (elevation, scope) as a side effect and return
/// [`Verdict::AutoRetry`], but must never force a flag that is already
/// set, so the same correction cannot repeat.
pub trait PackageManager: Send + Sync {
    fn properties(&self) -> &ManagerProperties;

    fn capabilities(&self) -> &ManagerCapabilities;

    /// The source assumed for packages whose listing did not name one
    fn default_source(&self) -> ManagerSource;

    /// Sources this manager ships with, before any discovery
    fn known_sources(&self) -> Vec<ManagerSource>;

    /// Schema of this manager's package tables
    fn package_schema(&self) -> TableSchema;

    /// Phrase marking transient "waiting" output, for line classification
    fn waiting_phrase(&self) -> Option<&str> {
        None
    }

    /// Arguments for a package operation, excluding the call-args prefix
    fn operation_parameters(
        &self,
        package: &Package,
        options: &InstallOptions,
        overridden: &OverriddenOptions,
        kind: OperationKind,
    ) -> Vec<String>;

    /// Arguments for a source operation, excluding the call-args prefix
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::UnsupportedOperation` for kinds that are not
    /// source operations or that this manager cannot perform.
    fn source_parameters(
        &self,
        source: &ManagerSource,
        kind: OperationKind,
    ) -> Result<Vec<String>, ManagerError>;

    /// Judge a finished package operation
    fn package_verdict(
        &self,
        package: &Package,
        kind: OperationKind,
        exit_code: i32,
        output: &[String],
        options: &InstallOptions,
        overridden: &mut OverriddenOptions,
        process_elevated: bool,
    ) -> Verdict;

    /// Judge a finished source operation
    fn source_verdict(
        &self,
        source: &ManagerSource,
        kind: OperationKind,
        exit_code: i32,
        output: &[String],
    ) -> Verdict;

    /// Arguments that list installed packages
    fn list_installed_parameters(&self) -> Vec<String>;

    /// Arguments that list available updates
    fn list_updates_parameters(&self) -> Vec<String>;

    /// Arguments that list configured sources
    fn list_sources_parameters(&self) -> Vec<String>;

    /// Parse a full installed-packages listing
    fn parse_installed(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package>;

    /// Parse a full updates listing
    fn parse_updates(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package>;

    /// Parse a full sources listing
    fn parse_sources(&self, lines: &[String]) -> Vec<ManagerSource>;
}

/// Look up a bundled manager by name
///
/// # Errors
///
/// Returns `ManagerError::UnknownManager` for names no adapter claims.
pub fn manager_by_name(name: &str) -> Result<Arc<dyn PackageManager>, ManagerError> {
    match name {
        "winget" => Ok(Arc::new(WinGet::new())),
        "scoop" => Ok(Arc::new(Scoop::new())),
        other => Err(ManagerError::UnknownManager {
            name: other.to_string(),
        }),
    }
}

/// Turn a raw package id into a presentable name ("nerd-fonts" -> "Nerd Fonts")
#[must_use]
pub fn format_as_name(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_as_name() {
        assert_eq!(format_as_name("7zip"), "7zip");
        assert_eq!(format_as_name("nerd-fonts"), "Nerd Fonts");
        assert_eq!(format_as_name("my_cool-tool"), "My Cool Tool");
    }

    #[test]
    fn test_manager_by_name() {
        assert!(manager_by_name("scoop").is_ok());
        assert!(manager_by_name("winget").is_ok());
        assert!(manager_by_name("apt-get").is_err());
    }
}
