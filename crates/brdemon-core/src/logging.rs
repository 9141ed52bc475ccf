//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Directory name shared by logs and cached binaries
pub const APP_DIR_NAME: &str = "build-runner-demon";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/build-runner-demon/logs/` so stdout
/// stays free for the serve protocol.
/// Log level is controlled by `BRDEMON_LOG` environment variable.
///
/// # Examples
/// ```bash
/// BRDEMON_LOG=debug brdemon serve
/// BRDEMON_LOG=trace brdemon watch
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "brdemon.log");

    // Default to info, allow override via BRDEMON_LOG
    let env_filter = EnvFilter::try_from_env("BRDEMON_LOG")
        .unwrap_or_else(|_| EnvFilter::new("brdemon=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Build Runner Demon starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Per-installation data directory (logs, cached companion binary)
pub fn data_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME)
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    Ok(data_directory().join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join("brdemon.log"))
}
