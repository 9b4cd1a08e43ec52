//! Command line interface definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use upm_types::{Architecture, InstallOptions, PackageScope};

/// upm - one command line over many package managers
#[derive(Parser)]
#[command(name = "upm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "One command line over many package managers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Args)]
pub struct GlobalArgs {
    /// Package manager to operate with
    #[arg(short, long, global = true, default_value = "winget")]
    pub manager: String,

    /// Output listings in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show progress chatter in addition to meaningful output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured concurrency ceiling
    #[arg(long, global = true, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Override the configured elevation helper
    #[arg(long, global = true, value_name = "PATH")]
    pub elevator: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install packages
    #[command(alias = "i")]
    Install {
        /// Package ids to install
        #[arg(required = true)]
        packages: Vec<String>,

        #[command(flatten)]
        options: OperationArgs,
    },

    /// Update packages to their available versions
    #[command(alias = "up")]
    Update {
        /// Specific packages to update (empty = all upgradable packages)
        packages: Vec<String>,

        #[command(flatten)]
        options: OperationArgs,
    },

    /// Uninstall packages
    #[command(alias = "rm")]
    Uninstall {
        /// Package ids to uninstall
        #[arg(required = true)]
        packages: Vec<String>,

        #[command(flatten)]
        options: OperationArgs,
    },

    /// List installed packages
    #[command(alias = "ls")]
    List,

    /// List available updates
    Updates,

    /// Manage package sources
    #[command(subcommand)]
    Source(SourceCommands),
}

/// Source management subcommands
#[derive(Subcommand)]
pub enum SourceCommands {
    /// Register a source with the manager
    Add {
        /// Source name (bucket name, feed name, ...)
        name: String,
        /// Source URL
        url: String,
    },

    /// Remove a source from the manager
    Remove {
        /// Source name
        name: String,
    },

    /// List the manager's configured sources
    List,
}

/// Options shared by package operations
#[derive(Args)]
pub struct OperationArgs {
    /// Run the manager elevated
    #[arg(long)]
    pub admin: bool,

    /// Let the installer show its own interface
    #[arg(long)]
    pub interactive: bool,

    /// Skip integrity checks
    #[arg(long)]
    pub skip_hash_check: bool,

    /// Installation scope
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Target architecture
    #[arg(long, value_enum)]
    pub arch: Option<ArchArg>,

    /// Install this exact version
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Custom install location
    #[arg(long, value_name = "PATH")]
    pub location: Option<String>,

    /// Source to install from (defaults to the manager's default source)
    #[arg(long, value_name = "NAME")]
    pub source: Option<String>,
}

impl OperationArgs {
    /// Map the CLI flags onto engine options
    pub fn to_install_options(&self) -> InstallOptions {
        InstallOptions {
            run_as_administrator: self.admin,
            interactive: self.interactive,
            skip_hash_check: self.skip_hash_check,
            scope: self.scope.map(Into::into),
            architecture: self.arch.map(Into::into),
            version: self.version.clone(),
            custom_install_location: self.location.clone(),
            ..InstallOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    User,
    Global,
}

impl From<ScopeArg> for PackageScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::User => Self::User,
            ScopeArg::Global => Self::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArchArg {
    X86,
    X64,
    Arm64,
}

impl From<ArchArg> for Architecture {
    fn from(arch: ArchArg) -> Self {
        match arch {
            ArchArg::X86 => Self::X86,
            ArchArg::X64 => Self::X64,
            ArchArg::Arm64 => Self::Arm64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_operation_args_map_onto_options() {
        let cli = Cli::parse_from([
            "upm", "install", "7zip.7zip", "--admin", "--scope", "global", "--arch", "x64",
        ]);
        let Commands::Install { options, .. } = cli.command else {
            panic!("expected install");
        };
        let options = options.to_install_options();
        assert!(options.run_as_administrator);
        assert_eq!(options.scope, Some(PackageScope::Global));
        assert_eq!(options.architecture, Some(Architecture::X64));
        assert!(!options.interactive);
    }
}
