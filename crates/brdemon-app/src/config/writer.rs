//! Configuration writer for .brdemon/config.toml
//!
//! Only the `[command]` section is ever written. Other keys and values in the
//! file are kept, but comments and formatting are not.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;

use brdemon_core::prelude::*;
use brdemon_core::ShellCommand;

use super::settings::config_path;

/// Persist the user's front-end choice and turn inference off
pub fn save_command_choice(root: &Path, command: ShellCommand) -> Result<()> {
    let path = config_path(root);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::config(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| Error::config(format!("Failed to open config.toml: {}", e)))?;

    // Blocks if another process holds the lock; released when `file` drops
    file.lock_exclusive()
        .map_err(|e| Error::config(format!("Failed to lock config.toml: {}", e)))?;

    let mut existing = String::new();
    file.read_to_string(&mut existing)
        .map_err(|e| Error::config(format!("Failed to read config.toml: {}", e)))?;

    let content = update_command_section(&existing, command)?;

    file.set_len(0)
        .and_then(|_| file.seek(SeekFrom::Start(0)).map(|_| ()))
        .and_then(|_| file.write_all(content.as_bytes()))
        .and_then(|_| file.flush())
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;

    info!("Saved command_to_use = \"{}\" to {:?}", command, path);
    Ok(())
}

fn update_command_section(existing: &str, command: ShellCommand) -> Result<String> {
    let mut document: toml::Table = if existing.trim().is_empty() {
        toml::Table::new()
    } else {
        existing
            .parse()
            .map_err(|e| Error::config_invalid(format!("config.toml does not parse: {}", e)))?
    };

    let section = document
        .entry("command")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let table = section
        .as_table_mut()
        .ok_or_else(|| Error::config_invalid("[command] is not a table"))?;

    table.insert(
        "command_to_use".to_string(),
        toml::Value::String(command.to_string()),
    );
    table.insert(
        "infer_command_to_use".to_string(),
        toml::Value::Boolean(false),
    );

    toml::to_string_pretty(&document)
        .map_err(|e| Error::config(format!("Failed to serialize config.toml: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CONFIG_DIR;
    use crate::config::Settings;
    use tempfile::tempdir;

    fn read_back(root: &Path) -> Settings {
        let content = std::fs::read_to_string(config_path(root)).unwrap();
        toml::from_str(&content).unwrap()
    }

    #[test]
    fn test_creates_file_when_missing() {
        let temp = tempdir().unwrap();
        save_command_choice(temp.path(), ShellCommand::Flutter).unwrap();

        let settings = read_back(temp.path());
        assert_eq!(settings.command.command_to_use, ShellCommand::Flutter);
        assert!(!settings.command.infer_command_to_use);
    }

    #[test]
    fn test_preserves_other_sections() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            config_path(temp.path()),
            r#"
[command]
command_to_use = "dart"
dart_path = "/sdk/bin/dart"

[watch]
stop_timeout_ms = 5000
"#,
        )
        .unwrap();

        save_command_choice(temp.path(), ShellCommand::Flutter).unwrap();

        let settings = read_back(temp.path());
        assert_eq!(settings.command.command_to_use, ShellCommand::Flutter);
        assert!(!settings.command.infer_command_to_use);
        assert_eq!(
            settings.command.dart_path,
            Some(std::path::PathBuf::from("/sdk/bin/dart"))
        );
        assert_eq!(settings.watch.stop_timeout_ms, 5000);
    }

    #[test]
    fn test_rewrite_keeps_values_but_drops_comments() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            config_path(temp.path()),
            "# pinned by the team\n[watch]\nstop_timeout_ms = 7000 # slow CI\n",
        )
        .unwrap();

        save_command_choice(temp.path(), ShellCommand::Dart).unwrap();

        let content = std::fs::read_to_string(config_path(temp.path())).unwrap();
        assert!(!content.contains('#'));
        assert_eq!(read_back(temp.path()).watch.stop_timeout_ms, 7000);
    }

    #[test]
    fn test_overwrite_is_not_appended() {
        let temp = tempdir().unwrap();
        save_command_choice(temp.path(), ShellCommand::Dart).unwrap();
        save_command_choice(temp.path(), ShellCommand::Flutter).unwrap();

        let content = std::fs::read_to_string(config_path(temp.path())).unwrap();
        let keys = content
            .lines()
            .filter(|line| line.trim_start().starts_with("command_to_use"))
            .count();
        assert_eq!(keys, 1);
        let document: toml::Table = content.parse().unwrap();
        assert_eq!(
            document["command"]["command_to_use"].as_str(),
            Some(ShellCommand::Flutter.to_string().as_str())
        );
        assert_eq!(
            read_back(temp.path()).command.command_to_use,
            ShellCommand::Flutter
        );
    }

    #[test]
    fn test_invalid_existing_file_is_left_alone() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(config_path(temp.path()), "[command\n").unwrap();

        let result = save_command_choice(temp.path(), ShellCommand::Flutter);
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
        assert_eq!(
            std::fs::read_to_string(config_path(temp.path())).unwrap(),
            "[command\n"
        );
    }
}
