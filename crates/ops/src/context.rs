//! Engine context: one queue, one configuration, operation constructors
//!
//! The context is created once at startup and handed to whoever builds
//! operations; it owns the global queue every queue-enabled operation
//! shares.

use crate::actions::{ExecutionEnv, PackageAction, SourceAction};
use crate::operation::Operation;
use crate::queue::OperationQueue;
use std::sync::Arc;
use upm_config::Config;
use upm_events::EventReceiver;
use upm_managers::PackageManager;
use upm_types::{InstallOptions, ManagerSource, OperationKind, OperationMetadata, Package};

/// Shared engine state
#[derive(Clone)]
pub struct EngineContext {
    config: Arc<Config>,
    queue: Arc<OperationQueue>,
}

impl EngineContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let queue = Arc::new(OperationQueue::new(config.queue.max_parallel_operations));
        Self {
            config: Arc::new(config),
            queue,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    fn execution_env(&self, manager: &dyn PackageManager) -> ExecutionEnv {
        let overrides = self.config.manager_overrides(manager.properties().name);
        ExecutionEnv {
            executable_override: overrides.executable_path,
            elevator: self.config.elevation.elevator.clone(),
            always_elevate: overrides.always_elevate,
        }
    }

    fn queue_enabled(&self, manager: &dyn PackageManager) -> bool {
        !self
            .config
            .manager_overrides(manager.properties().name)
            .allow_parallel_operations
    }

    fn package_operation(
        &self,
        manager: &Arc<dyn PackageManager>,
        package: Package,
        options: InstallOptions,
        kind: OperationKind,
        metadata: OperationMetadata,
    ) -> (Operation, EventReceiver) {
        let env = self.execution_env(manager.as_ref());
        let queue_enabled = self.queue_enabled(manager.as_ref());
        let action = PackageAction::new(Arc::clone(manager), package, kind, options, env);
        Operation::new(
            metadata,
            Box::new(action),
            Vec::new(),
            Vec::new(),
            Arc::clone(&self.queue),
            &self.config.queue,
            queue_enabled,
        )
    }

    /// Build an install operation for one package
    #[must_use]
    pub fn install(
        &self,
        manager: &Arc<dyn PackageManager>,
        package: Package,
        options: InstallOptions,
    ) -> (Operation, EventReceiver) {
        let metadata = OperationMetadata {
            title: format!("{} Installation", package.name),
            status_message: format!("{} is being installed", package.name),
            success_title: "Installation succeeded".to_string(),
            success_message: format!("{} was installed successfully", package.name),
            failure_title: "Installation failed".to_string(),
            failure_message: format!("{} could not be installed", package.name),
            information: format!(
                "Package install operation for package={} with manager={}",
                package.id, package.manager
            ),
        };
        self.package_operation(manager, package, options, OperationKind::Install, metadata)
    }

    /// Build an update operation for one package
    #[must_use]
    pub fn update(
        &self,
        manager: &Arc<dyn PackageManager>,
        package: Package,
        options: InstallOptions,
    ) -> (Operation, EventReceiver) {
        let new_version = package.new_version.clone().unwrap_or_default();
        let metadata = OperationMetadata {
            title: format!("{} Update", package.name),
            status_message: format!(
                "{} is being updated to version {new_version}",
                package.name
            ),
            success_title: "Update succeeded".to_string(),
            success_message: format!("{} was updated successfully", package.name),
            failure_title: "Update failed".to_string(),
            failure_message: format!("{} could not be updated", package.name),
            information: format!(
                "Package update operation for package={} with manager={}",
                package.id, package.manager
            ),
        };
        self.package_operation(manager, package, options, OperationKind::Update, metadata)
    }

    /// Build an uninstall operation for one package
    #[must_use]
    pub fn uninstall(
        &self,
        manager: &Arc<dyn PackageManager>,
        package: Package,
        options: InstallOptions,
    ) -> (Operation, EventReceiver) {
        let metadata = OperationMetadata {
            title: format!("{} Uninstall", package.name),
            status_message: format!("{} is being uninstalled", package.name),
            success_title: "Uninstall succeeded".to_string(),
            success_message: format!("{} was uninstalled successfully", package.name),
            failure_title: "Uninstall failed".to_string(),
            failure_message: format!("{} could not be uninstalled", package.name),
            information: format!(
                "Package uninstall operation for package={} with manager={}",
                package.id, package.manager
            ),
        };
        self.package_operation(manager, package, options, OperationKind::Uninstall, metadata)
    }

    fn source_operation(
        &self,
        manager: &Arc<dyn PackageManager>,
        source: ManagerSource,
        kind: OperationKind,
        metadata: OperationMetadata,
    ) -> (Operation, EventReceiver) {
        let env = self.execution_env(manager.as_ref());
        let queue_enabled = self.queue_enabled(manager.as_ref());
        let action = SourceAction::new(Arc::clone(manager), source, kind, env);
        Operation::new(
            metadata,
            Box::new(action),
            Vec::new(),
            Vec::new(),
            Arc::clone(&self.queue),
            &self.config.queue,
            queue_enabled,
        )
    }

    /// Build an operation that registers a source with its manager
    #[must_use]
    pub fn add_source(
        &self,
        manager: &Arc<dyn PackageManager>,
        source: ManagerSource,
    ) -> (Operation, EventReceiver) {
        let metadata = OperationMetadata {
            title: format!("Adding source {}", source.name),
            status_message: format!("Source {} is being added to {}", source.name, source.manager),
            success_title: "Source added".to_string(),
            success_message: format!("Source {} was added successfully", source.name),
            failure_title: "Could not add source".to_string(),
            failure_message: format!("Source {} could not be added", source.name),
            information: format!(
                "Add source operation for source={} with manager={}",
                source.name, source.manager
            ),
        };
        self.source_operation(manager, source, OperationKind::AddSource, metadata)
    }

    /// Build an operation that removes a source from its manager
    #[must_use]
    pub fn remove_source(
        &self,
        manager: &Arc<dyn PackageManager>,
        source: ManagerSource,
    ) -> (Operation, EventReceiver) {
        let metadata = OperationMetadata {
            title: format!("Removing source {}", source.name),
            status_message: format!(
                "Source {} is being removed from {}",
                source.name, source.manager
            ),
            success_title: "Source removed".to_string(),
            success_message: format!("Source {} was removed successfully", source.name),
            failure_title: "Could not remove source".to_string(),
            failure_message: format!("Source {} could not be removed", source.name),
            information: format!(
                "Remove source operation for source={} with manager={}",
                source.name, source.manager
            ),
        };
        self.source_operation(manager, source, OperationKind::RemoveSource, metadata)
    }
}
