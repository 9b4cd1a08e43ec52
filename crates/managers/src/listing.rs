//! Discovery operations: installed packages, updates, sources
//!
//! These drive the manager executable once and feed the captured output
//! through the adapter's parser. A non-zero exit does not abort parsing;
//! several managers exit non-zero while still printing a usable table.

use crate::{PackageManager, SourceFactory};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use upm_errors::{Error, Result};
use upm_events::EventEmitter;
use upm_process::{run, ProcessSpec};
use upm_types::{ManagerSource, Package};

fn listing_spec(
    manager: &dyn PackageManager,
    executable_override: Option<&Path>,
    parameters: Vec<String>,
) -> Result<ProcessSpec> {
    let properties = manager.properties();
    let executable = executable_override
        .map_or_else(|| PathBuf::from(properties.executable), Path::to_path_buf);

    let mut args = properties.call_args.clone();
    args.extend(parameters);

    ProcessSpec::builder()
        .executable(executable)
        .arguments(args)
        .build()
        .map_err(Error::from)
}

async fn capture<E: EventEmitter>(
    manager: &dyn PackageManager,
    executable_override: Option<&Path>,
    parameters: Vec<String>,
    emitter: &E,
    cancel: &CancellationToken,
) -> Result<Vec<String>> {
    let spec = listing_spec(manager, executable_override, parameters)?;
    let outcome = run(&spec, emitter, cancel, manager.waiting_phrase()).await?;
    if outcome.exit_code != 0 {
        tracing::warn!(
            manager = manager.properties().name,
            exit_code = outcome.exit_code,
            "listing exited non-zero; parsing output anyway"
        );
    }
    Ok(outcome.lines)
}

/// List the packages this manager reports as installed
///
/// # Errors
///
/// Returns an error when the manager executable cannot be spawned.
pub async fn list_installed<E: EventEmitter>(
    manager: &dyn PackageManager,
    executable_override: Option<&Path>,
    emitter: &E,
    cancel: &CancellationToken,
) -> Result<Vec<Package>> {
    let lines = capture(
        manager,
        executable_override,
        manager.list_installed_parameters(),
        emitter,
        cancel,
    )
    .await?;
    let mut factory = SourceFactory::new(
        manager.properties().name,
        manager.default_source().url,
    );
    Ok(manager.parse_installed(&lines, &mut factory))
}

/// List the packages this manager can upgrade
///
/// # Errors
///
/// Returns an error when the manager executable cannot be spawned.
pub async fn list_updates<E: EventEmitter>(
    manager: &dyn PackageManager,
    executable_override: Option<&Path>,
    emitter: &E,
    cancel: &CancellationToken,
) -> Result<Vec<Package>> {
    let lines = capture(
        manager,
        executable_override,
        manager.list_updates_parameters(),
        emitter,
        cancel,
    )
    .await?;
    let mut factory = SourceFactory::new(
        manager.properties().name,
        manager.default_source().url,
    );
    Ok(manager.parse_updates(&lines, &mut factory))
}

/// List the sources configured for this manager
///
/// Discovered sources are merged with the adapter's known sources through
/// a [`SourceFactory`], so placeholder URLs picked up from package
/// listings get upgraded to the real ones.
///
/// # Errors
///
/// Returns an error when the manager executable cannot be spawned.
pub async fn list_sources<E: EventEmitter>(
    manager: &dyn PackageManager,
    executable_override: Option<&Path>,
    emitter: &E,
    cancel: &CancellationToken,
) -> Result<Vec<ManagerSource>> {
    let lines = capture(
        manager,
        executable_override,
        manager.list_sources_parameters(),
        emitter,
        cancel,
    )
    .await?;
    let mut factory = SourceFactory::new(
        manager.properties().name,
        manager.default_source().url,
    );
    for source in manager.parse_sources(&lines) {
        factory.add_source(source);
    }
    Ok(factory.available_sources())
}
