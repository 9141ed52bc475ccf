//! `build_runner` command line construction

use std::path::PathBuf;

use brdemon_core::{BuildMode, ShellCommand};

use crate::tool_availability::resolve_executable;

/// One `build_runner` invocation
///
/// Produces `<front end> [pub] run build_runner <build|watch>` followed by
/// the optional flags, e.g. `flutter pub run build_runner build
/// --delete-conflicting-outputs --build-filter lib/models/*.g.dart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRunnerCommand {
    pub shell: ShellCommand,
    pub mode: BuildMode,
    pub delete_conflicting_outputs: bool,
    /// Output globs, each passed as a separate `--build-filter`
    pub build_filters: Vec<String>,
    /// Explicit executable, overriding the `PATH` lookup
    pub executable: Option<PathBuf>,
}

impl BuildRunnerCommand {
    pub fn new(shell: ShellCommand, mode: BuildMode) -> Self {
        Self {
            shell,
            mode,
            delete_conflicting_outputs: false,
            build_filters: Vec::new(),
            executable: None,
        }
    }

    pub fn with_delete_conflicting_outputs(mut self, enabled: bool) -> Self {
        self.delete_conflicting_outputs = enabled;
        self
    }

    pub fn with_build_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    /// Argument list, without the program itself
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .shell
            .pub_prefix()
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push("build_runner".to_string());
        args.push(self.mode.as_arg().to_string());

        if self.delete_conflicting_outputs {
            args.push("--delete-conflicting-outputs".to_string());
        }

        for filter in &self.build_filters {
            args.push("--build-filter".to_string());
            args.push(filter.clone());
        }

        args
    }

    /// Program to spawn
    pub fn program(&self) -> PathBuf {
        resolve_executable(self.shell, self.executable.as_deref())
    }

    /// Human readable form used in logs and host messages
    pub fn display_line(&self) -> String {
        let program = self
            .executable
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| self.shell.executable_name().to_string());
        format!("{} {}", program, self.args().join(" "))
    }
}
