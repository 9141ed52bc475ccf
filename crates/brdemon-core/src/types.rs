//! Domain types shared by every layer

use serde::{Deserialize, Serialize};

/// Front end used to run `build_runner`
///
/// Chosen once per invocation from configuration or from the project manifest
/// and never changed while that invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellCommand {
    Dart,
    #[default]
    Flutter,
}

impl ShellCommand {
    /// Executable name looked up on `PATH`
    pub fn executable_name(&self) -> &'static str {
        match self {
            ShellCommand::Dart => "dart",
            ShellCommand::Flutter => "flutter",
        }
    }

    /// Arguments that precede `build_runner`
    pub fn pub_prefix(&self) -> &'static [&'static str] {
        match self {
            ShellCommand::Dart => &["run"],
            ShellCommand::Flutter => &["pub", "run"],
        }
    }

    /// The other variant, offered when one front end fails
    pub fn alternative(&self) -> ShellCommand {
        match self {
            ShellCommand::Dart => ShellCommand::Flutter,
            ShellCommand::Flutter => ShellCommand::Dart,
        }
    }
}

impl std::fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.executable_name())
    }
}

impl std::str::FromStr for ShellCommand {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dart" => Ok(ShellCommand::Dart),
            "flutter" => Ok(ShellCommand::Flutter),
            other => Err(crate::Error::config_invalid(format!(
                "unknown command '{}', expected 'dart' or 'flutter'",
                other
            ))),
        }
    }
}

/// `build_runner` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// One-shot build that exits when done
    Build,
    /// Long-lived watcher that rebuilds on source changes
    Watch,
}

impl BuildMode {
    pub fn as_arg(&self) -> &'static str {
        match self {
            BuildMode::Build => "build",
            BuildMode::Watch => "watch",
        }
    }
}

/// Watch session lifecycle
///
/// `Idle → Initializing → Watching → Idle`. The transition into `Watching`
/// happens on the first stdout chunk and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    #[default]
    Idle,
    Initializing,
    Watching,
}

impl WatchState {
    /// Status indicator text for the host
    pub fn label(&self) -> &'static str {
        match self {
            WatchState::Idle => "Watch",
            WatchState::Initializing => "Initializing",
            WatchState::Watching => "Remove watch",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        "Watch with build_runner"
    }

    /// A process handle exists in this state
    pub fn has_process(&self) -> bool {
        matches!(self, WatchState::Initializing | WatchState::Watching)
    }
}
