//! Process-backed actions for package and source operations

use crate::action::OperationAction;
use crate::operation::OperationLogger;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use upm_errors::Result;
use upm_events::EventEmitter;
use upm_managers::PackageManager;
use upm_process::{current_process_elevated, run, ProcessSpec};
use upm_types::{
    BadgeCollection, InstallOptions, LineKind, ManagerSource, OperationKind, OverriddenOptions,
    Package, RetryMode, Verdict,
};

/// How a manager invocation is assembled, shared by both action kinds
#[derive(Debug, Clone)]
pub struct ExecutionEnv {
    /// Use this executable instead of the manager's PATH lookup
    pub executable_override: Option<PathBuf>,
    /// Helper binary prefixed to elevated invocations
    pub elevator: PathBuf,
    /// Force elevation for every operation of this manager
    pub always_elevate: bool,
}

impl ExecutionEnv {
    fn executable(&self, manager: &dyn PackageManager) -> PathBuf {
        self.executable_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(manager.properties().executable))
    }
}

/// Install, update, or uninstall one package through its manager
pub struct PackageAction {
    manager: Arc<dyn PackageManager>,
    package: Package,
    kind: OperationKind,
    options: InstallOptions,
    overridden: OverriddenOptions,
    env: ExecutionEnv,
}

impl PackageAction {
    #[must_use]
    pub fn new(
        manager: Arc<dyn PackageManager>,
        package: Package,
        kind: OperationKind,
        options: InstallOptions,
        env: ExecutionEnv,
    ) -> Self {
        Self {
            manager,
            package,
            kind,
            options,
            overridden: OverriddenOptions::default(),
            env,
        }
    }

    fn wants_elevation(&self) -> bool {
        self.overridden.run_as_administrator == Some(true)
            || (self.options.run_as_administrator
                && self.overridden.run_as_administrator != Some(false))
            || (self.env.always_elevate && self.overridden.run_as_administrator != Some(false))
    }
}

#[async_trait]
impl OperationAction for PackageAction {
    async fn run(
        &mut self,
        logger: &OperationLogger,
        cancel: &CancellationToken,
    ) -> Result<Verdict> {
        let mut args = self.manager.properties().call_args.clone();
        args.extend(self.manager.operation_parameters(
            &self.package,
            &self.options,
            &self.overridden,
            self.kind,
        ));

        let mut spec = ProcessSpec::builder()
            .executable(self.env.executable(self.manager.as_ref()))
            .arguments(args)
            .build()?;

        let elevated = current_process_elevated();
        if self.wants_elevation() && !elevated {
            spec = spec.elevated(&self.env.elevator);
        }

        let outcome = run(&spec, logger, cancel, self.manager.waiting_phrase()).await?;
        if cancel.is_cancelled() {
            return Ok(Verdict::Canceled);
        }

        Ok(self.manager.package_verdict(
            &self.package,
            self.kind,
            outcome.exit_code,
            &outcome.lines,
            &self.options,
            &mut self.overridden,
            elevated,
        ))
    }

    fn apply_retry(&mut self, mode: RetryMode) {
        match mode {
            RetryMode::Retry => {}
            RetryMode::RetryAsAdmin => self.options.run_as_administrator = true,
            RetryMode::RetryInteractive => self.options.interactive = true,
            RetryMode::RetryNoHashCheck => self.options.skip_hash_check = true,
        }
    }

    fn badges(&self) -> BadgeCollection {
        BadgeCollection {
            run_as_admin: self.wants_elevation(),
            interactive: self.options.interactive,
            skip_hash_check: self.options.skip_hash_check && self.kind != OperationKind::Uninstall,
            scope: self
                .overridden
                .scope
                .or(self.options.scope)
                .or(self.package.scope),
        }
    }
}

/// Add or remove one source of a manager
pub struct SourceAction {
    manager: Arc<dyn PackageManager>,
    source: ManagerSource,
    kind: OperationKind,
    run_as_administrator: bool,
    env: ExecutionEnv,
}

impl SourceAction {
    #[must_use]
    pub fn new(
        manager: Arc<dyn PackageManager>,
        source: ManagerSource,
        kind: OperationKind,
        env: ExecutionEnv,
    ) -> Self {
        Self {
            manager,
            source,
            kind,
            run_as_administrator: false,
            env,
        }
    }
}

#[async_trait]
impl OperationAction for SourceAction {
    async fn run(
        &mut self,
        logger: &OperationLogger,
        cancel: &CancellationToken,
    ) -> Result<Verdict> {
        let mut args = self.manager.properties().call_args.clone();
        match self.manager.source_parameters(&self.source, self.kind) {
            Ok(parameters) => args.extend(parameters),
            Err(e) => {
                // A source operation on a manager without custom sources
                // is a configuration error, not a process failure
                logger.emit_line(e.to_string(), LineKind::StdErr);
                return Err(e.into());
            }
        }

        let mut spec = ProcessSpec::builder()
            .executable(self.env.executable(self.manager.as_ref()))
            .arguments(args)
            .build()?;

        if (self.run_as_administrator || self.env.always_elevate) && !current_process_elevated() {
            spec = spec.elevated(&self.env.elevator);
        }

        let outcome = run(&spec, logger, cancel, self.manager.waiting_phrase()).await?;
        if cancel.is_cancelled() {
            return Ok(Verdict::Canceled);
        }

        Ok(self
            .manager
            .source_verdict(&self.source, self.kind, outcome.exit_code, &outcome.lines))
    }

    fn apply_retry(&mut self, mode: RetryMode) {
        if mode == RetryMode::RetryAsAdmin {
            self.run_as_administrator = true;
        }
    }

    fn badges(&self) -> BadgeCollection {
        BadgeCollection {
            run_as_admin: self.run_as_administrator || self.env.always_elevate,
            ..BadgeCollection::default()
        }
    }
}
