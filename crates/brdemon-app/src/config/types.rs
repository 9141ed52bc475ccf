//! Configuration types for Build Runner Demon
//!
//! Defines `Settings` (`.brdemon/config.toml`) and its sections.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use brdemon_core::{infer_shell_command, BuildMode, ShellCommand};
use brdemon_daemon::{BuildRunnerCommand, CompanionBinary, DEFAULT_COMPANION_URL};

/// Application settings (.brdemon/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub command: CommandSettings,

    #[serde(default)]
    pub delete_conflicting_outputs: DeleteConflictingOutputs,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub companion: CompanionSettings,
}

/// Which front end runs `build_runner`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandSettings {
    /// Front end used when inference is off or inconclusive
    #[serde(default)]
    pub command_to_use: ShellCommand,

    /// Derive the front end from `pubspec.yaml`
    #[serde(default = "default_true")]
    pub infer_command_to_use: bool,

    /// Explicit `flutter` executable; empty means look it up on PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flutter_path: Option<PathBuf>,

    /// Explicit `dart` executable; empty means look it up on PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dart_path: Option<PathBuf>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            command_to_use: ShellCommand::default(),
            infer_command_to_use: true,
            flutter_path: None,
            dart_path: None,
        }
    }
}

/// `--delete-conflicting-outputs`, gated separately per mode
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeleteConflictingOutputs {
    #[serde(default)]
    pub build: bool,

    #[serde(default)]
    pub watch: bool,
}

impl DeleteConflictingOutputs {
    pub fn for_mode(&self, mode: BuildMode) -> bool {
        match mode {
            BuildMode::Build => self.build,
            BuildMode::Watch => self.watch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatchSettings {
    /// How long `stop` waits for the watch to exit after the interrupt
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Ask before starting a watch that cannot be interrupted later
    #[serde(default = "default_true")]
    pub warn_when_unstoppable: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            stop_timeout_ms: default_stop_timeout_ms(),
            warn_when_unstoppable: true,
        }
    }
}

impl WatchSettings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Where the Windows interrupt helper comes from and where it is cached
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompanionSettings {
    #[serde(default = "default_companion_url")]
    pub url: String,

    /// Cache directory; empty means the per-user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Default for CompanionSettings {
    fn default() -> Self {
        Self {
            url: default_companion_url(),
            storage_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stop_timeout_ms() -> u64 {
    2500
}

fn default_companion_url() -> String {
    DEFAULT_COMPANION_URL.to_string()
}

/// Treat `""` in TOML as "not set"
fn non_empty(path: Option<&PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty()).cloned()
}

impl Settings {
    /// Front end for a project: the manifest decides when inference is on
    pub fn resolve_shell_command(&self, project: &Path) -> ShellCommand {
        if self.command.infer_command_to_use {
            infer_shell_command(project).unwrap_or(self.command.command_to_use)
        } else {
            self.command.command_to_use
        }
    }

    /// Configured executable for a front end, if any
    pub fn executable_for(&self, shell: ShellCommand) -> Option<PathBuf> {
        match shell {
            ShellCommand::Dart => non_empty(self.command.dart_path.as_ref()),
            ShellCommand::Flutter => non_empty(self.command.flutter_path.as_ref()),
        }
    }

    /// The full `build_runner` invocation for `mode` with `shell`
    pub fn build_runner_command(
        &self,
        shell: ShellCommand,
        mode: BuildMode,
        filters: &[String],
    ) -> BuildRunnerCommand {
        BuildRunnerCommand::new(shell, mode)
            .with_delete_conflicting_outputs(self.delete_conflicting_outputs.for_mode(mode))
            .with_build_filters(filters.iter().cloned())
            .with_executable(self.executable_for(shell))
    }

    pub fn companion_binary(&self) -> CompanionBinary {
        let storage_dir = non_empty(self.companion.storage_dir.as_ref())
            .unwrap_or_else(CompanionBinary::default_storage_dir);
        CompanionBinary::new(self.companion.url.clone(), storage_dir)
    }

    /// Copy with a fixed front end and inference turned off
    pub fn with_command(&self, shell: ShellCommand) -> Settings {
        let mut settings = self.clone();
        settings.command.command_to_use = shell;
        settings.command.infer_command_to_use = false;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.command.command_to_use, ShellCommand::Flutter);
        assert!(settings.command.infer_command_to_use);
        assert!(!settings.delete_conflicting_outputs.build);
        assert!(!settings.delete_conflicting_outputs.watch);
        assert_eq!(settings.watch.stop_timeout(), Duration::from_millis(2500));
        assert_eq!(settings.companion.url, DEFAULT_COMPANION_URL);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[command]
command_to_use = "dart"

[delete_conflicting_outputs]
watch = true
"#,
        )
        .unwrap();

        assert_eq!(settings.command.command_to_use, ShellCommand::Dart);
        assert!(settings.command.infer_command_to_use);
        assert!(settings.delete_conflicting_outputs.watch);
        assert!(!settings.delete_conflicting_outputs.build);
        assert_eq!(settings.watch.stop_timeout_ms, 2500);
    }

    #[test]
    fn test_empty_paths_mean_unset() {
        let settings: Settings = toml::from_str(
            r#"
[command]
flutter_path = ""
dart_path = "/sdk/bin/dart"

[companion]
storage_dir = ""
"#,
        )
        .unwrap();

        assert_eq!(settings.executable_for(ShellCommand::Flutter), None);
        assert_eq!(
            settings.executable_for(ShellCommand::Dart),
            Some(PathBuf::from("/sdk/bin/dart"))
        );
        assert_eq!(
            settings.companion_binary().file_path().parent(),
            Some(CompanionBinary::default_storage_dir().as_path())
        );
    }

    #[test]
    fn test_build_runner_command_uses_mode_gate() {
        let mut settings = Settings::default();
        settings.delete_conflicting_outputs.watch = true;

        let watch = settings.build_runner_command(ShellCommand::Dart, BuildMode::Watch, &[]);
        assert!(watch.delete_conflicting_outputs);

        let filters = vec!["lib/a.g.dart".to_string()];
        let build = settings.build_runner_command(ShellCommand::Dart, BuildMode::Build, &filters);
        assert!(!build.delete_conflicting_outputs);
        assert_eq!(build.build_filters, filters);
    }

    #[test]
    fn test_resolve_shell_command_infers_from_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("pubspec.yaml"),
            "name: pkg\ndev_dependencies:\n  build_runner: any\n",
        )
        .unwrap();

        let settings = Settings::default();
        assert_eq!(settings.resolve_shell_command(temp.path()), ShellCommand::Dart);

        let fixed = settings.with_command(ShellCommand::Flutter);
        assert!(!fixed.command.infer_command_to_use);
        assert_eq!(fixed.resolve_shell_command(temp.path()), ShellCommand::Flutter);
    }

    #[test]
    fn test_resolve_shell_command_falls_back_without_manifest() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.command.command_to_use = ShellCommand::Dart;
        assert_eq!(settings.resolve_shell_command(temp.path()), ShellCommand::Dart);
    }
}
