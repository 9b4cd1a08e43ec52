//! WinGet adapter
//!
//! The reference fixed-width manager: tables are parsed by header
//! offsets, verdicts are decided by WinGet's documented return codes.

use crate::{ManagerCapabilities, ManagerProperties, PackageManager, SourceFactory};
use upm_errors::ManagerError;
use upm_table::{ColumnLabels, TableParser, TableSchema, WhitespaceParser};
use upm_types::{
    Architecture, InstallOptions, ManagerSource, OperationKind, OverriddenOptions, Package,
    PackageScope, Verdict,
};

// Return codes from winget-cli's documented list
const RC_RESTART_REQUIRED: u32 = 0x8A15_0109;
const RC_CANCELED: [u32; 3] = [0x8A15_0077, 0x8A15_010C, 0x8A15_0005];
const RC_NO_MANIFEST_FOUND: u32 = 0x8A15_0017;
const RC_INTEGRITY_FAILED: u32 = 0x8A15_0011;
const RC_ALREADY_INSTALLED: [u32; 3] = [0x8A15_010D, 0x8A15_004F, 0x8A15_010E];
const RC_ELEVATION_PROHIBITED: u32 = 0x8A15_0056;
const RC_ELEVATION_REQUIRED: [u32; 2] = [0x8A15_0019, 0x8007_3D28];
const RC_SOURCE_ALREADY_EXISTS: u32 = 0x8A15_000C;

/// Ids truncated by winget's console output end in an ellipsis
const TRUNCATION_MARK: char = '…';

pub struct WinGet {
    properties: ManagerProperties,
    capabilities: ManagerCapabilities,
}

impl WinGet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: ManagerProperties {
                name: "winget",
                display_name: "WinGet",
                executable: "winget",
                call_args: Vec::new(),
                install_verb: "install",
                update_verb: "update",
                uninstall_verb: "uninstall",
            },
            capabilities: ManagerCapabilities {
                can_run_as_admin: true,
                can_skip_integrity_checks: true,
                can_run_interactively: true,
                supports_custom_versions: true,
                supports_custom_scopes: true,
                supports_custom_architectures: true,
                supports_custom_locations: true,
                supports_custom_sources: true,
                supports_prerelease: false,
            },
        }
    }

    /// Identify the package to the CLI, working around truncated ids
    fn id_name_piece(package: &Package) -> Vec<String> {
        if !package.id.ends_with(TRUNCATION_MARK) {
            return vec!["--id".into(), package.id.clone(), "--exact".into()];
        }
        if !package.name.ends_with(TRUNCATION_MARK) {
            return vec!["--name".into(), package.name.clone(), "--exact".into()];
        }
        vec![
            "--id".into(),
            package.id.trim_end_matches(TRUNCATION_MARK).to_string(),
        ]
    }
}

impl Default for WinGet {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for WinGet {
    fn properties(&self) -> &ManagerProperties {
        &self.properties
    }

    fn capabilities(&self) -> &ManagerCapabilities {
        &self.capabilities
    }

    fn default_source(&self) -> ManagerSource {
        ManagerSource::new("winget", "winget", "https://cdn.winget.microsoft.com/cache")
    }

    fn known_sources(&self) -> Vec<ManagerSource> {
        vec![
            self.default_source(),
            ManagerSource::new("winget", "msstore", "https://storeedgefd.dsx.mp.microsoft.com/v9.0"),
        ]
    }

    fn package_schema(&self) -> TableSchema {
        TableSchema::new(
            ColumnLabels::new("Id", "Version")
                .with_available("Available")
                .with_source("Source"),
        )
        .with_search_labels(
            ColumnLabels::new("SearchId", "SearchVersion")
                .with_available("AvailableHeader")
                .with_source("SearchSource"),
        )
        .with_noise_phrases(&["have pins"])
    }

    fn waiting_phrase(&self) -> Option<&str> {
        Some("Waiting for another install...")
    }

    fn operation_parameters(
        &self,
        package: &Package,
        options: &InstallOptions,
        overridden: &OverriddenOptions,
        kind: OperationKind,
    ) -> Vec<String> {
        let mut parameters: Vec<String> = vec![match kind {
            OperationKind::Install => self.properties.install_verb.into(),
            OperationKind::Update => self.properties.update_verb.into(),
            OperationKind::Uninstall => self.properties.uninstall_verb.into(),
            OperationKind::AddSource | OperationKind::RemoveSource => {
                unreachable!("source operations use source_parameters")
            }
        }];

        parameters.extend(Self::id_name_piece(package));
        parameters.extend(["--source".into(), package.source_name.clone()]);
        parameters.extend([
            "--accept-source-agreements".into(),
            "--disable-interactivity".into(),
        ]);

        match overridden.scope.or(options.scope) {
            Some(PackageScope::User) => parameters.extend(["--scope".into(), "user".into()]),
            Some(PackageScope::Global) => parameters.extend(["--scope".into(), "machine".into()]),
            None => {}
        }

        if kind == OperationKind::Uninstall
            && package.installed_version != "Unknown"
            && overridden.specify_version != Some(false)
        {
            parameters.extend(["--version".into(), package.installed_version.clone()]);
        } else if kind == OperationKind::Install {
            if let Some(version) = &options.version {
                parameters.extend(["--version".into(), version.clone()]);
            }
        }

        parameters.push(if options.interactive {
            "--interactive".into()
        } else {
            "--silent".into()
        });

        if kind == OperationKind::Update {
            parameters.push("--include-unknown".into());
        }

        if kind != OperationKind::Uninstall {
            parameters.extend(["--accept-package-agreements".into(), "--force".into()]);

            if options.skip_hash_check {
                parameters.push("--ignore-security-hash".into());
            }

            if let Some(location) = &options.custom_install_location {
                parameters.extend(["--location".into(), location.clone()]);
            }

            match options.architecture {
                Some(Architecture::X86) => {
                    parameters.extend(["--architecture".into(), "x86".into()]);
                }
                Some(Architecture::X64) => {
                    parameters.extend(["--architecture".into(), "x64".into()]);
                }
                Some(Architecture::Arm64) => {
                    parameters.extend(["--architecture".into(), "arm64".into()]);
                }
                None => {}
            }
        }

        parameters.extend(options.custom_parameters(kind).iter().cloned());
        parameters
    }

    fn source_parameters(
        &self,
        source: &ManagerSource,
        kind: OperationKind,
    ) -> Result<Vec<String>, ManagerError> {
        match kind {
            OperationKind::AddSource => Ok(vec![
                "source".into(),
                "add".into(),
                "--name".into(),
                source.name.clone(),
                "--arg".into(),
                source.url.clone(),
                "--accept-source-agreements".into(),
                "--disable-interactivity".into(),
            ]),
            OperationKind::RemoveSource => Ok(vec![
                "source".into(),
                "remove".into(),
                "--name".into(),
                source.name.clone(),
                "--disable-interactivity".into(),
            ]),
            _ => Err(ManagerError::UnsupportedOperation {
                manager: self.properties.name.to_string(),
                operation: kind.to_string(),
            }),
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn package_verdict(
        &self,
        _package: &Package,
        kind: OperationKind,
        exit_code: i32,
        _output: &[String],
        _options: &InstallOptions,
        overridden: &mut OverriddenOptions,
        process_elevated: bool,
    ) -> Verdict {
        let code = exit_code as u32;

        if code == RC_RESTART_REQUIRED {
            // A reboot finishes the install; the operation itself is done
            return Verdict::Success;
        }

        if RC_CANCELED.contains(&code) {
            return Verdict::Canceled;
        }

        if kind == OperationKind::Uninstall
            && code == RC_NO_MANIFEST_FOUND
            && overridden.specify_version != Some(false)
        {
            // No manifest matches the pinned version; drop the pin and retry
            overridden.specify_version = Some(false);
            return Verdict::AutoRetry;
        }

        if code == RC_INTEGRITY_FAILED {
            return Verdict::Failure;
        }

        if RC_ALREADY_INSTALLED.contains(&code) || exit_code == 0 {
            return Verdict::Success;
        }

        if code == RC_ELEVATION_PROHIBITED
            && overridden.run_as_administrator != Some(false)
            && !process_elevated
        {
            // The installer refuses to run elevated; force elevation off
            overridden.run_as_administrator = Some(false);
            return Verdict::AutoRetry;
        }

        if RC_ELEVATION_REQUIRED.contains(&code) && overridden.run_as_administrator != Some(true) {
            overridden.run_as_administrator = Some(true);
            return Verdict::AutoRetry;
        }

        Verdict::Failure
    }

    #[allow(clippy::cast_sign_loss)]
    fn source_verdict(
        &self,
        _source: &ManagerSource,
        kind: OperationKind,
        exit_code: i32,
        _output: &[String],
    ) -> Verdict {
        match kind {
            // Adding a source that already exists counts as success
            OperationKind::AddSource
                if exit_code == 0 || exit_code as u32 == RC_SOURCE_ALREADY_EXISTS =>
            {
                Verdict::Success
            }
            OperationKind::RemoveSource if exit_code == 0 => Verdict::Success,
            _ => Verdict::Failure,
        }
    }

    fn list_installed_parameters(&self) -> Vec<String> {
        vec![
            "list".into(),
            "--accept-source-agreements".into(),
            "--disable-interactivity".into(),
        ]
    }

    fn list_updates_parameters(&self) -> Vec<String> {
        vec![
            "update".into(),
            "--include-unknown".into(),
            "--accept-source-agreements".into(),
            "--disable-interactivity".into(),
        ]
    }

    fn list_sources_parameters(&self) -> Vec<String> {
        vec!["source".into(), "list".into(), "--disable-interactivity".into()]
    }

    fn parse_installed(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package> {
        let schema = self.package_schema();
        let mut parser = TableParser::new(&schema);
        let mut packages = Vec::new();
        for line in lines {
            if let Some(row) = parser.feed(line) {
                let source = match row.source.as_deref() {
                    Some(name) => factory.get_source_or_default(name),
                    None => self.default_source(),
                };
                packages.push(Package::new(
                    row.name,
                    row.id,
                    row.version,
                    source.name,
                    self.properties.name,
                ));
            }
        }
        packages
    }

    fn parse_updates(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package> {
        let schema = self.package_schema();
        let mut parser = TableParser::new(&schema);
        let mut packages = Vec::new();
        for line in lines {
            if let Some(row) = parser.feed(line) {
                let Some(available) = row.available.filter(|a| !a.is_empty()) else {
                    continue;
                };
                let source = match row.source.as_deref() {
                    Some(name) => factory.get_source_or_default(name),
                    None => self.default_source(),
                };
                packages.push(Package::upgradable(
                    row.name,
                    row.id,
                    row.version,
                    available,
                    source.name,
                    self.properties.name,
                ));
            }
        }
        packages
    }

    fn parse_sources(&self, lines: &[String]) -> Vec<ManagerSource> {
        // `winget source list` prints a Name/Argument table
        let schema = TableSchema::default();
        let mut parser = WhitespaceParser::new(&schema);
        let mut sources = Vec::new();
        for line in lines {
            if let Some(columns) = parser.feed(line, 2) {
                sources.push(ManagerSource::new(
                    self.properties.name,
                    &columns[0],
                    &columns[1],
                ));
            }
        }
        sources
    }
}
