//! Settings loader for .brdemon/config.toml

use std::path::{Path, PathBuf};

use brdemon_core::prelude::*;
use brdemon_core::ShellCommand;

use super::types::Settings;

pub const CONFIG_DIR: &str = ".brdemon";
pub const CONFIG_FILENAME: &str = "config.toml";

const ENV_COMMAND: &str = "BRDEMON_COMMAND";
const ENV_FLUTTER_PATH: &str = "BRDEMON_FLUTTER_PATH";
const ENV_DART_PATH: &str = "BRDEMON_DART_PATH";

/// Location of the config file under `root`
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.brdemon/config.toml`
///
/// A missing or unreadable file yields the defaults. Environment overrides
/// are applied on top either way.
pub fn load_settings(root: &Path) -> Settings {
    let mut settings = read_settings_file(&config_path(root));
    apply_env_overrides(&mut settings);
    settings
}

fn read_settings_file(path: &Path) -> Settings {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}

/// Apply `BRDEMON_*` environment overrides
///
/// `BRDEMON_COMMAND` pins the front end and disables inference; an
/// unrecognised value is logged and ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(value) = env_value(ENV_COMMAND) {
        match value.parse::<ShellCommand>() {
            Ok(command) => {
                debug!("{} overrides command to '{}'", ENV_COMMAND, command);
                settings.command.command_to_use = command;
                settings.command.infer_command_to_use = false;
            }
            Err(e) => warn!("Ignoring {}: {}", ENV_COMMAND, e),
        }
    }

    if let Some(path) = env_value(ENV_FLUTTER_PATH) {
        settings.command.flutter_path = Some(PathBuf::from(path));
    }

    if let Some(path) = env_value(ENV_DART_PATH) {
        settings.command.dart_path = Some(PathBuf::from(path));
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
