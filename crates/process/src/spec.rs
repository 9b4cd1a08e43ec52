//! Process specifications
//!
//! A [`ProcessSpec`] can only be obtained through the builder, and the
//! builder refuses to produce one until the executable and the argument
//! list have both been set explicitly. Forgetting to configure a
//! manager-specific command is a construction error, caught before any
//! process is spawned.

use std::path::{Path, PathBuf};
use upm_errors::ProcessError;

/// A fully configured subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl ProcessSpec {
    #[must_use]
    pub fn builder() -> ProcessSpecBuilder {
        ProcessSpecBuilder::default()
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    #[must_use]
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// The full command line, for log headers
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Rewrite the invocation to run through an elevation helper
    ///
    /// The original program becomes the helper's first argument.
    #[must_use]
    pub fn elevated(self, elevator: &Path) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program.display().to_string());
        args.extend(self.args);
        Self {
            program: elevator.to_path_buf(),
            args,
            working_dir: self.working_dir,
            envs: self.envs,
        }
    }
}

/// Builder for [`ProcessSpec`]
#[derive(Debug, Clone, Default)]
pub struct ProcessSpecBuilder {
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
    working_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl ProcessSpecBuilder {
    #[must_use]
    pub fn executable(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Set the argument list; an empty list is valid but must be explicit
    #[must_use]
    pub fn arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Produce the spec
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::ExecutableNotSet` or
    /// `ProcessError::ArgumentsNotSet` when the corresponding setter was
    /// never called.
    pub fn build(self) -> Result<ProcessSpec, ProcessError> {
        let program = self.program.ok_or(ProcessError::ExecutableNotSet)?;
        let args = self.args.ok_or(ProcessError::ArgumentsNotSet)?;
        Ok(ProcessSpec {
            program,
            args,
            working_dir: self.working_dir,
            envs: self.envs,
        })
    }
}

/// Whether the current process already has elevated privileges
#[must_use]
pub fn current_process_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_executable() {
        let err = ProcessSpec::builder()
            .arguments(["install", "7zip"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ProcessError::ExecutableNotSet));
    }

    #[test]
    fn test_build_requires_arguments() {
        let err = ProcessSpec::builder()
            .executable("/usr/bin/scoop")
            .build()
            .unwrap_err();
        assert!(matches!(err, ProcessError::ArgumentsNotSet));
    }

    #[test]
    fn test_empty_argument_list_is_explicit() {
        let spec = ProcessSpec::builder()
            .executable("/usr/bin/scoop")
            .arguments(Vec::<String>::new())
            .build()
            .unwrap();
        assert!(spec.args().is_empty());
    }

    #[test]
    fn test_elevated_prefixes_helper() {
        let spec = ProcessSpec::builder()
            .executable("/usr/bin/scoop")
            .arguments(["install", "7zip"])
            .build()
            .unwrap()
            .elevated(Path::new("/usr/bin/sudo"));

        assert_eq!(spec.program(), Path::new("/usr/bin/sudo"));
        assert_eq!(spec.args(), ["/usr/bin/scoop", "install", "7zip"]);
    }

    #[test]
    fn test_command_line() {
        let spec = ProcessSpec::builder()
            .executable("scoop")
            .arguments(["install", "7zip"])
            .build()
            .unwrap();
        assert_eq!(spec.command_line(), "scoop install 7zip");
    }
}
