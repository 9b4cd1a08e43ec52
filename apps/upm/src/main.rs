//! upm - one command line over many package managers
//!
//! This is the CLI shell around the operation engine: it turns commands
//! into operations, drives them through the global queue, and renders
//! their event streams.

mod cli;
mod display;
mod error;
mod events;

use crate::cli::{Cli, Commands, OperationArgs, SourceCommands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use upm_config::Config;
use upm_events::{channel, EventReceiver, OperationEmitter, OperationEvent};
use upm_managers::{
    format_as_name, list_installed, list_sources, list_updates, manager_by_name, PackageManager,
};
use upm_ops::{EngineContext, Operation};
use upm_types::{LineKind, ManagerSource, OperationStatus, Package, Uuid};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("application error: {e}");
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Main application logic; the returned flag is whether every operation
/// succeeded
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("starting upm v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file, then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global)?;

    let manager = manager_by_name(&cli.global.manager)?;
    let verbose = cli.global.verbose || cli.global.debug;
    let mut handler = EventHandler::new(verbose, cli.global.debug);
    let renderer = OutputRenderer::new(cli.global.json);
    let ctx = EngineContext::new(config);

    match cli.command {
        Commands::Install { packages, options } => {
            let install_options = options.to_install_options();
            let operations = packages
                .iter()
                .map(|id| {
                    let package = package_from_id(manager.as_ref(), id, &options);
                    ctx.install(&manager, package, install_options.clone())
                })
                .collect();
            drive_operations(operations, &mut handler).await
        }

        Commands::Update { packages, options } => {
            let upgradable = list_for_command(&ctx, &manager, verbose, ListKind::Updates).await?;
            let selected = select_packages(upgradable, &packages, "upgradable")?;
            if selected.is_empty() {
                println!("Everything is up to date.");
                return Ok(true);
            }
            let install_options = options.to_install_options();
            let operations = selected
                .into_iter()
                .map(|package| ctx.update(&manager, package, install_options.clone()))
                .collect();
            drive_operations(operations, &mut handler).await
        }

        Commands::Uninstall { packages, options } => {
            let installed = list_for_command(&ctx, &manager, verbose, ListKind::Installed).await?;
            let selected = select_packages(installed, &packages, "installed")?;
            let install_options = options.to_install_options();
            let operations = selected
                .into_iter()
                .map(|package| ctx.uninstall(&manager, package, install_options.clone()))
                .collect();
            drive_operations(operations, &mut handler).await
        }

        Commands::List => {
            let packages = list_for_command(&ctx, &manager, verbose, ListKind::Installed).await?;
            renderer.render_packages(&packages)?;
            Ok(true)
        }

        Commands::Updates => {
            let packages = list_for_command(&ctx, &manager, verbose, ListKind::Updates).await?;
            renderer.render_updates(&packages)?;
            Ok(true)
        }

        Commands::Source(SourceCommands::Add { name, url }) => {
            let source = ManagerSource::new(manager.properties().name, name, url);
            drive_operations(vec![ctx.add_source(&manager, source)], &mut handler).await
        }

        Commands::Source(SourceCommands::Remove { name }) => {
            // Removal only needs the name; a known URL is cosmetic
            let url = manager
                .known_sources()
                .into_iter()
                .find(|source| source.name == name)
                .map(|source| source.url)
                .unwrap_or_default();
            let source = ManagerSource::new(manager.properties().name, name, url);
            drive_operations(vec![ctx.remove_source(&manager, source)], &mut handler).await
        }

        Commands::Source(SourceCommands::List) => {
            let executable = ctx
                .config()
                .manager_overrides(manager.properties().name)
                .executable_path;
            let (emitter, cancel) = listing_emitter(verbose);
            let sources =
                list_sources(manager.as_ref(), executable.as_deref(), &emitter, &cancel).await?;
            renderer.render_sources(&sources)?;
            Ok(true)
        }
    }
}

/// A package record built from nothing but a CLI-supplied id
fn package_from_id(manager: &dyn PackageManager, id: &str, options: &OperationArgs) -> Package {
    let source = options
        .source
        .clone()
        .unwrap_or_else(|| manager.default_source().name);
    let version = options.version.clone().unwrap_or_else(|| "Unknown".into());
    Package::new(
        format_as_name(id),
        id,
        version,
        source,
        manager.properties().name,
    )
}

enum ListKind {
    Installed,
    Updates,
}

async fn list_for_command(
    ctx: &EngineContext,
    manager: &Arc<dyn PackageManager>,
    verbose: bool,
    kind: ListKind,
) -> Result<Vec<Package>, CliError> {
    let executable = ctx
        .config()
        .manager_overrides(manager.properties().name)
        .executable_path;
    let (emitter, cancel) = listing_emitter(verbose);
    let packages = match kind {
        ListKind::Installed => {
            list_installed(manager.as_ref(), executable.as_deref(), &emitter, &cancel).await?
        }
        ListKind::Updates => {
            list_updates(manager.as_ref(), executable.as_deref(), &emitter, &cancel).await?
        }
    };
    Ok(packages)
}

/// Emitter for listing runs; their output only matters when verbose
fn listing_emitter(verbose: bool) -> (OperationEmitter, CancellationToken) {
    let (tx, mut rx) = channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if verbose {
                if let OperationEvent::LogLine { line, kind, .. } = event {
                    if kind != LineKind::Progress {
                        eprintln!("{line}");
                    }
                }
            }
        }
    });
    (
        OperationEmitter::new(Uuid::new_v4(), tx),
        CancellationToken::new(),
    )
}

/// Pick the listed packages matching the requested ids
///
/// An empty request selects everything. Requested ids nothing matches are
/// reported; matching none at all is an argument error.
fn select_packages(
    available: Vec<Package>,
    requested: &[String],
    what: &str,
) -> Result<Vec<Package>, CliError> {
    if requested.is_empty() {
        return Ok(available);
    }

    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for id in requested {
        match available
            .iter()
            .find(|package| package.id.eq_ignore_ascii_case(id))
        {
            Some(package) => selected.push(package.clone()),
            None => missing.push(id.clone()),
        }
    }

    for id in &missing {
        eprintln!("Warning: {id} is not {what}, skipping");
    }
    if selected.is_empty() {
        return Err(CliError::InvalidArguments(format!(
            "no {what} package matches {}",
            requested.join(", ")
        )));
    }
    Ok(selected)
}

/// Start every operation and render events until all reach a terminal
/// state
async fn drive_operations(
    operations: Vec<(Operation, EventReceiver)>,
    handler: &mut EventHandler,
) -> Result<bool, CliError> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut running = Vec::new();
    for (operation, mut events) in operations {
        handler.register(operation.id(), operation.metadata().title.clone());
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        operation.start().map_err(CliError::from)?;
        running.push(operation);
    }
    drop(tx);

    let mut all_finished = Box::pin(async {
        let mut ok = true;
        for operation in &running {
            ok &= operation.wait().await == OperationStatus::Succeeded;
        }
        ok
    });

    // Render events concurrently with the operations themselves, the
    // terminal verdict ending the loop
    loop {
        select! {
            ok = &mut all_finished => {
                while let Ok(event) = rx.try_recv() {
                    handler.handle(&event);
                }
                return Ok(ok);
            }
            event = rx.recv() => {
                if let Some(event) = event {
                    handler.handle(&event);
                }
            }
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) -> Result<(), CliError> {
    if let Some(max_parallel) = global.max_parallel {
        config.queue.max_parallel_operations = max_parallel;
    }
    if let Some(elevator) = &global.elevator {
        config.elevation.elevator = elevator.clone();
    }
    config.validate()?;
    Ok(())
}

/// Initialize tracing; everything goes to stderr so listings stay clean
fn init_tracing(debug: bool) {
    let default_filter = if debug { "info,upm=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}
