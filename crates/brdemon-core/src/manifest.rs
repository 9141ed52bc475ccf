//! Dart project manifest inspection
//!
//! Reads `pubspec.yaml` to decide between the `dart` and `flutter` front ends
//! and locates the project root that `build_runner` must run in.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::types::ShellCommand;

/// Manifest file that marks a Dart project root
pub const PUBSPEC_FILENAME: &str = "pubspec.yaml";

/// The parts of `pubspec.yaml` this tool cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pubspec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, serde_yaml_ng::Value>>,

    #[serde(default)]
    pub dev_dependencies: Option<BTreeMap<String, serde_yaml_ng::Value>>,
}

impl Pubspec {
    /// Whether any dependency is declared as `sdk: flutter`
    pub fn depends_on_flutter_sdk(&self) -> bool {
        [&self.dependencies, &self.dev_dependencies]
            .into_iter()
            .flatten()
            .flat_map(|deps| deps.values())
            .any(is_flutter_sdk_entry)
    }
}

fn is_flutter_sdk_entry(value: &serde_yaml_ng::Value) -> bool {
    value
        .get("sdk")
        .and_then(|sdk| sdk.as_str())
        .map(|sdk| sdk == "flutter")
        .unwrap_or(false)
}

/// Parse manifest content
pub fn parse_pubspec(content: &str) -> crate::Result<Pubspec> {
    // An empty document deserializes as null; treat it as an empty manifest
    if content.trim().is_empty() {
        return Ok(Pubspec::default());
    }
    serde_yaml_ng::from_str(content)
        .map_err(|e| crate::Error::config_invalid(format!("invalid pubspec.yaml: {}", e)))
}

/// Check manifest content for a Flutter SDK dependency
///
/// Falls back to a plain `sdk: flutter` text search when the YAML does not
/// parse, so a half-edited manifest still selects the right front end.
pub fn has_flutter_sdk_dependency(content: &str) -> bool {
    match parse_pubspec(content) {
        Ok(pubspec) => pubspec.depends_on_flutter_sdk(),
        Err(e) => {
            warn!("{}; falling back to text search", e);
            content.contains("sdk: flutter")
        }
    }
}

/// Check whether a directory holds a `pubspec.yaml`
pub fn has_pubspec(dir: &Path) -> bool {
    dir.join(PUBSPEC_FILENAME).is_file()
}

/// Pick the front end for a project from its manifest
///
/// Returns `None` when the directory has no readable manifest.
pub fn infer_shell_command(project_dir: &Path) -> Option<ShellCommand> {
    let content = fs::read_to_string(project_dir.join(PUBSPEC_FILENAME)).ok()?;
    let command = if has_flutter_sdk_dependency(&content) {
        ShellCommand::Flutter
    } else {
        ShellCommand::Dart
    };
    debug!("Inferred '{}' for {}", command, project_dir.display());
    Some(command)
}

/// Locate the project root for an active file or directory
///
/// With a workspace root, walks from the workspace root down towards the
/// active path and returns the outermost directory containing a manifest.
/// Without one, walks upward from the active path and returns the nearest.
pub fn find_project_root(active: &Path, workspace_root: Option<&Path>) -> Option<PathBuf> {
    let start = if active.is_file() {
        active.parent()?.to_path_buf()
    } else {
        active.to_path_buf()
    };

    if let Some(root) = workspace_root {
        if let Ok(relative) = start.strip_prefix(root) {
            let mut candidate = root.to_path_buf();
            trace!("Looking for {} in {}", PUBSPEC_FILENAME, candidate.display());
            if has_pubspec(&candidate) {
                return Some(candidate);
            }
            for segment in relative.components() {
                candidate.push(segment);
                trace!("Looking for {} in {}", PUBSPEC_FILENAME, candidate.display());
                if has_pubspec(&candidate) {
                    return Some(candidate);
                }
            }
            return None;
        }
        debug!(
            "{} is outside workspace {}, searching upward",
            start.display(),
            root.display()
        );
    }

    start
        .ancestors()
        .find(|dir| has_pubspec(dir))
        .map(Path::to_path_buf)
}
