//! Tool availability checking for the `dart` and `flutter` front ends
//!
//! Resolves the executables used to run `build_runner`. On Windows both tools
//! ship as batch wrappers (`flutter.bat`), which `which` finds via `PATHEXT`.

use std::path::{Path, PathBuf};

use brdemon_core::ShellCommand;

/// Cached availability of the Dart and Flutter executables
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    /// Resolved path of `dart`, if found on PATH
    pub dart: Option<PathBuf>,

    /// Resolved path of `flutter`, if found on PATH
    pub flutter: Option<PathBuf>,
}

impl ToolAvailability {
    /// Check tool availability (run once at startup)
    pub fn check() -> Self {
        Self {
            dart: Self::lookup(ShellCommand::Dart.executable_name()),
            flutter: Self::lookup(ShellCommand::Flutter.executable_name()),
        }
    }

    fn lookup(name: &str) -> Option<PathBuf> {
        which::which(name)
            .inspect_err(|e| tracing::debug!("{} not found on PATH: {}", name, e))
            .ok()
            .map(|path| dunce::simplified(&path).to_path_buf())
    }

    /// Whether the front end can be spawned without an explicit path
    pub fn is_available(&self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Dart => self.dart.is_some(),
            ShellCommand::Flutter => self.flutter.is_some(),
        }
    }

    /// Get user-friendly message for a missing front end
    pub fn unavailable_message(&self, command: ShellCommand) -> Option<String> {
        if self.is_available(command) {
            None
        } else {
            Some(format!(
                "'{}' was not found on PATH. Install the SDK or set its path in .brdemon/config.toml.",
                command
            ))
        }
    }
}

/// Resolve the program to spawn for a front end
///
/// An explicit path from configuration wins. Otherwise `PATH` is searched;
/// if that fails the bare name is returned (with `.bat` on Windows) so the
/// spawn error names the missing tool.
pub fn resolve_executable(command: ShellCommand, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    let name = command.executable_name();
    ToolAvailability::lookup(name).unwrap_or_else(|| PathBuf::from(batch_command(name)))
}

/// Launcher name as spawned on this platform
pub fn batch_command(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.bat", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_availability_default() {
        let availability = ToolAvailability::default();
        assert!(availability.dart.is_none());
        assert!(availability.flutter.is_none());
        assert!(!availability.is_available(ShellCommand::Dart));
    }

    #[test]
    fn test_unavailable_message() {
        let availability = ToolAvailability::default();
        let msg = availability
            .unavailable_message(ShellCommand::Flutter)
            .unwrap();
        assert!(msg.contains("'flutter'"));
    }

    #[test]
    fn test_available_no_message() {
        let availability = ToolAvailability {
            dart: Some(PathBuf::from("/usr/lib/dart/bin/dart")),
            flutter: None,
        };
        assert!(availability.unavailable_message(ShellCommand::Dart).is_none());
        assert!(availability
            .unavailable_message(ShellCommand::Flutter)
            .is_some());
    }

    #[test]
    fn test_configured_path_wins() {
        let configured = PathBuf::from("/opt/flutter/bin/flutter");
        assert_eq!(
            resolve_executable(ShellCommand::Flutter, Some(&configured)),
            configured
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_command_unix() {
        assert_eq!(batch_command("flutter"), "flutter");
    }

    #[cfg(windows)]
    #[test]
    fn test_batch_command_windows() {
        assert_eq!(batch_command("flutter"), "flutter.bat");
    }
}
