//! Scoop adapter
//!
//! The reference whitespace-table manager: output columns are separated
//! by runs of spaces, and verdicts are decided by phrases in the output
//! rather than by exit codes.

use crate::{
    format_as_name, ManagerCapabilities, ManagerProperties, PackageManager, SourceFactory,
};
use upm_errors::ManagerError;
use upm_table::{TableSchema, WhitespaceParser};
use upm_types::{
    Architecture, InstallOptions, ManagerSource, OperationKind, OverriddenOptions, Package,
    PackageScope, Verdict,
};

const FALSE_PACKAGE_IDS: [&str; 1] = ["No"];
const FALSE_PACKAGE_VERSIONS: [&str; 7] = [
    "Matches", "Install", "failed", "failed,", "Manifest", "removed", "removed,",
];

/// Phrases scoop prints when an operation needed admin rights
const ELEVATION_PHRASES: [&str; 3] = [
    "requires admin rights",
    "requires administrator rights",
    "you need admin rights to install global apps",
];

const GLOBAL_SCOPE_HINT: &str = "Try again with the --global (or -g) flag instead";

pub struct Scoop {
    properties: ManagerProperties,
    capabilities: ManagerCapabilities,
}

impl Scoop {
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: ManagerProperties {
                name: "scoop",
                display_name: "Scoop",
                executable: "scoop",
                call_args: Vec::new(),
                install_verb: "install",
                update_verb: "update",
                uninstall_verb: "uninstall",
            },
            capabilities: ManagerCapabilities {
                can_run_as_admin: true,
                can_skip_integrity_checks: true,
                can_run_interactively: false,
                supports_custom_versions: false,
                supports_custom_scopes: true,
                supports_custom_architectures: true,
                supports_custom_locations: false,
                supports_custom_sources: true,
                supports_prerelease: false,
            },
        }
    }
}

impl Default for Scoop {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for Scoop {
    fn properties(&self) -> &ManagerProperties {
        &self.properties
    }

    fn capabilities(&self) -> &ManagerCapabilities {
        &self.capabilities
    }

    fn default_source(&self) -> ManagerSource {
        ManagerSource::new("scoop", "main", "https://github.com/ScoopInstaller/Main")
    }

    fn known_sources(&self) -> Vec<ManagerSource> {
        [
            ("main", "https://github.com/ScoopInstaller/Main"),
            ("extras", "https://github.com/ScoopInstaller/Extras"),
            ("versions", "https://github.com/ScoopInstaller/Versions"),
            ("nirsoft", "https://github.com/kodybrown/scoop-nirsoft"),
            ("sysinternals", "https://github.com/niheaven/scoop-sysinternals"),
            ("php", "https://github.com/ScoopInstaller/PHP"),
            ("nerd-fonts", "https://github.com/matthewjberger/scoop-nerd-fonts"),
            ("nonportable", "https://github.com/ScoopInstaller/Nonportable"),
            ("java", "https://github.com/ScoopInstaller/Java"),
            ("games", "https://github.com/Calinou/scoop-games"),
        ]
        .into_iter()
        .map(|(name, url)| ManagerSource::new("scoop", name, url))
        .collect()
    }

    fn package_schema(&self) -> TableSchema {
        TableSchema::default().with_sentinels(&FALSE_PACKAGE_IDS, &FALSE_PACKAGE_VERSIONS)
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

        // Unknown buckets are left implicit so scoop can resolve the id
        if package.source_name.contains("...") {
            parameters.push(package.id.clone());
        } else {
            parameters.push(format!("{}/{}", package.source_name, package.id));
        }

        let scope = overridden.scope.or(options.scope).or(package.scope);
        if scope == Some(PackageScope::Global) {
            parameters.push("--global".into());
        }

        parameters.extend(options.custom_parameters(kind).iter().cloned());

        if kind == OperationKind::Uninstall {
            parameters.push("--purge".into());
        } else if options.skip_hash_check {
            parameters.push("--skip-hash-check".into());
        }

        if kind == OperationKind::Install {
            match options.architecture {
                Some(Architecture::X64) => parameters.extend(["--arch".into(), "64bit".into()]),
                Some(Architecture::X86) => parameters.extend(["--arch".into(), "32bit".into()]),
                Some(Architecture::Arm64) => parameters.extend(["--arch".into(), "arm64".into()]),
                None => {}
            }
        }

        parameters
    }

    fn source_parameters(
        &self,
        source: &ManagerSource,
        kind: OperationKind,
    ) -> Result<Vec<String>, ManagerError> {
        match kind {
            OperationKind::AddSource => Ok(vec![
                "bucket".into(),
                "add".into(),
                source.name.clone(),
                source.url.clone(),
            ]),
            OperationKind::RemoveSource => {
                Ok(vec!["bucket".into(), "rm".into(), source.name.clone()])
            }
            _ => Err(ManagerError::UnsupportedOperation {
                manager: self.properties.name.to_string(),
                operation: kind.to_string(),
            }),
        }
    }

    fn package_verdict(
        &self,
        _package: &Package,
        _kind: OperationKind,
        exit_code: i32,
        output: &[String],
        _options: &InstallOptions,
        overridden: &mut OverriddenOptions,
        _process_elevated: bool,
    ) -> Verdict {
        let output_text = output.join("\n");

        if overridden.scope != Some(PackageScope::Global) && output_text.contains(GLOBAL_SCOPE_HINT)
        {
            // Global apps live elsewhere and need elevation
            overridden.scope = Some(PackageScope::Global);
            overridden.run_as_administrator = Some(true);
            return Verdict::AutoRetry;
        }

        if overridden.run_as_administrator != Some(true)
            && ELEVATION_PHRASES
                .iter()
                .any(|phrase| output_text.contains(phrase))
        {
            overridden.run_as_administrator = Some(true);
            return Verdict::AutoRetry;
        }

        if output_text.contains("ERROR") || exit_code != 0 {
            return Verdict::Failure;
        }

        Verdict::Success
    }

    fn source_verdict(
        &self,
        _source: &ManagerSource,
        kind: OperationKind,
        exit_code: i32,
        output: &[String],
    ) -> Verdict {
        let output_text = output.join("\n");
        match kind {
            // Re-adding an existing bucket counts as success
            OperationKind::AddSource
                if exit_code == 0 || output_text.contains("bucket already exists") =>
            {
                Verdict::Success
            }
            OperationKind::RemoveSource if exit_code == 0 => Verdict::Success,
            _ => Verdict::Failure,
        }
    }

    fn list_installed_parameters(&self) -> Vec<String> {
        vec!["list".into()]
    }

    fn list_updates_parameters(&self) -> Vec<String> {
        vec!["status".into()]
    }

    fn list_sources_parameters(&self) -> Vec<String> {
        vec!["bucket".into(), "list".into()]
    }

    fn parse_installed(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package> {
        let schema = self.package_schema();
        let mut parser = WhitespaceParser::new(&schema);
        let mut packages = Vec::new();
        for line in lines {
            let Some(columns) = parser.feed(line, 3) else {
                continue;
            };
            let source = factory.get_source_or_default(&columns[2]);
            let mut package = Package::new(
                format_as_name(&columns[0]),
                &columns[0],
                &columns[1],
                source.name,
                self.properties.name,
            );
            // The Info column marks machine-wide installs with "Global install"
            if columns.iter().skip(3).any(|column| column == "Global") {
                package = package.with_scope(PackageScope::Global);
            }
            packages.push(package);
        }
        packages
    }

    fn parse_updates(&self, lines: &[String], factory: &mut SourceFactory) -> Vec<Package> {
        let schema = self.package_schema();
        let mut parser = WhitespaceParser::new(&schema);
        let mut packages = Vec::new();
        for line in lines {
            let Some(columns) = parser.feed(line, 3) else {
                continue;
            };
            // `scoop status` does not print buckets; assume the default
            let source = factory.get_source_or_default("main");
            packages.push(Package::upgradable(
                format_as_name(&columns[0]),
                &columns[0],
                &columns[1],
                &columns[2],
                source.name,
                self.properties.name,
            ));
        }
        packages
    }

    fn parse_sources(&self, lines: &[String]) -> Vec<ManagerSource> {
        let schema = TableSchema::default();
        let mut parser = WhitespaceParser::new(&schema);
        let mut sources = Vec::new();
        for line in lines {
            let Some(columns) = parser.feed(line, 2) else {
                continue;
            };
            let mut source = ManagerSource::new(self.properties.name, &columns[0], &columns[1]);
            // `scoop bucket list` prints "Name Source Updated Manifests",
            // the update stamp being a date and a time token
            if columns.len() >= 4 {
                source = source.with_last_updated(format!("{} {}", columns[2], columns[3]));
            }
            if let Some(count) = columns.get(4).and_then(|c| c.parse().ok()) {
                source = source.with_package_count(count);
            }
            sources.push(source);
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> Package {
        Package::new("7zip", "7zip", "23.01", "main", "scoop")
    }

    #[test]
    fn test_install_parameters_include_bucket() {
        let scoop = Scoop::new();
        let parameters = scoop.operation_parameters(
            &package(),
            &InstallOptions::default(),
            &OverriddenOptions::default(),
            OperationKind::Install,
        );
        assert_eq!(parameters, ["install", "main/7zip"]);
    }

    #[test]
    fn test_global_scope_adds_flag() {
        let scoop = Scoop::new();
        let overridden = OverriddenOptions {
            scope: Some(PackageScope::Global),
            ..OverriddenOptions::default()
        };
        let parameters = scoop.operation_parameters(
            &package(),
            &InstallOptions::default(),
            &overridden,
            OperationKind::Install,
        );
        assert!(parameters.contains(&"--global".to_string()));
    }

    #[test]
    fn test_admin_phrase_forces_elevation_once() {
        let scoop = Scoop::new();
        let mut overridden = OverriddenOptions::default();
        let output = vec!["ERROR something".to_string(), "requires admin rights".to_string()];

        let verdict = scoop.package_verdict(
            &package(),
            OperationKind::Install,
            1,
            &output,
            &InstallOptions::default(),
            &mut overridden,
            false,
        );
        assert_eq!(verdict, Verdict::AutoRetry);
        assert_eq!(overridden.run_as_administrator, Some(true));

        // The same output with elevation already forced no longer retries
        let verdict = scoop.package_verdict(
            &package(),
            OperationKind::Install,
            1,
            &output,
            &InstallOptions::default(),
            &mut overridden,
            false,
        );
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_global_hint_switches_scope() {
        let scoop = Scoop::new();
        let mut overridden = OverriddenOptions::default();
        let output = vec![
            "ERROR the app is installed globally".to_string(),
            "Try again with the --global (or -g) flag instead".to_string(),
        ];

        let verdict = scoop.package_verdict(
            &package(),
            OperationKind::Uninstall,
            1,
            &output,
            &InstallOptions::default(),
            &mut overridden,
            false,
        );
        assert_eq!(verdict, Verdict::AutoRetry);
        assert_eq!(overridden.scope, Some(PackageScope::Global));
        assert_eq!(overridden.run_as_administrator, Some(true));
    }

    #[test]
    fn test_error_marker_fails_even_with_zero_exit() {
        let scoop = Scoop::new();
        let mut overridden = OverriddenOptions::default();
        let output = vec!["ERROR hash check failed".to_string()];
        let verdict = scoop.package_verdict(
            &package(),
            OperationKind::Install,
            0,
            &output,
            &InstallOptions::default(),
            &mut overridden,
            false,
        );
        assert_eq!(verdict, Verdict::Failure);
    }

    #[test]
    fn test_clean_run_succeeds() {
        let scoop = Scoop::new();
        let mut overridden = OverriddenOptions::default();
        let output = vec!["'7zip' (23.01) was installed successfully!".to_string()];
        let verdict = scoop.package_verdict(
            &package(),
            OperationKind::Install,
            0,
            &output,
            &InstallOptions::default(),
            &mut overridden,
            false,
        );
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn test_parse_installed_drops_sentinels() {
        let scoop = Scoop::new();
        let mut factory = SourceFactory::new("scoop", "https://github.com/ScoopInstaller/Main");
        let lines: Vec<String> = [
            "Installed apps:",
            "",
            "Name    Version  Source   Updated",
            "----    -------  ------   -------",
            "7zip    23.01    main     2024-01-02",
            "No      Matches  found",
            "git     2.44.0   main     2024-01-03",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let packages = scoop.parse_installed(&lines, &mut factory);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].id, "7zip");
        assert_eq!(packages[1].id, "git");
    }

    #[test]
    fn test_parse_installed_marks_global_installs() {
        let scoop = Scoop::new();
        let mut factory = SourceFactory::new("scoop", "https://github.com/ScoopInstaller/Main");
        let lines: Vec<String> = [
            "Name    Version  Source   Updated              Info",
            "----    -------  ------   -------              ----",
            "7zip    23.01    main     2024-01-02 10:11:12  Global install",
            "git     2.44.0   main     2024-01-03 08:09:10",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let packages = scoop.parse_installed(&lines, &mut factory);
        assert_eq!(packages[0].scope, Some(PackageScope::Global));
        assert_eq!(packages[1].scope, None);

        // Operating on a global install adds the flag without any override
        let parameters = scoop.operation_parameters(
            &packages[0],
            &InstallOptions::default(),
            &OverriddenOptions::default(),
            OperationKind::Uninstall,
        );
        assert!(parameters.contains(&"--global".to_string()));
    }

    #[test]
    fn test_parse_sources_with_counts() {
        let scoop = Scoop::new();
        let lines: Vec<String> = [
            "Name    Source                                   Updated              Manifests",
            "----    ------                                   -------              ---------",
            "main    https://github.com/ScoopInstaller/Main   2024-01-02 10:11:12  1200",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let sources = scoop.parse_sources(&lines);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "main");
        assert_eq!(sources[0].url, "https://github.com/ScoopInstaller/Main");
        assert_eq!(sources[0].package_count, Some(1200));
        assert_eq!(sources[0].last_updated.as_deref(), Some("2024-01-02 10:11:12"));
    }

    #[test]
    fn test_bucket_parameters() {
        let scoop = Scoop::new();
        let source = ManagerSource::new("scoop", "extras", "https://github.com/ScoopInstaller/Extras");
        assert_eq!(
            scoop.source_parameters(&source, OperationKind::AddSource).unwrap(),
            ["bucket", "add", "extras", "https://github.com/ScoopInstaller/Extras"]
        );
        assert_eq!(
            scoop.source_parameters(&source, OperationKind::RemoveSource).unwrap(),
            ["bucket", "rm", "extras"]
        );
        assert!(scoop.source_parameters(&source, OperationKind::Install).is_err());
    }
}
