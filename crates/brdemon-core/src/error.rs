//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No Dart project (pubspec.yaml) found in: {path}")]
    NoProject { path: PathBuf },

    #[error("Folder selection was cancelled by user")]
    SelectionCancelled,

    #[error("Could not find the build_runner worker process under PID {parent_pid}")]
    WorkerNotFound { parent_pid: u32 },

    #[error("Process table query failed: {message}")]
    ProcessTable { message: String },

    // ─────────────────────────────────────────────────────────────
    // Spawn/Exit Errors
    // ─────────────────────────────────────────────────────────────
    #[error("'{command}' not found. Ensure it is in your PATH or configure its path.")]
    ToolNotFound { command: String },

    #[error("Failed to spawn build_runner: {reason}")]
    ProcessSpawn { reason: String },

    #[error("build_runner exited with code: {code:?}")]
    ProcessExit { code: Option<i32> },

    // ─────────────────────────────────────────────────────────────
    // Signal Delivery Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to deliver interrupt: {message}")]
    SignalDelivery { message: String },

    #[error("Failed to fetch companion binary from {url}: {message}")]
    CompanionFetch { url: String, message: String },

    #[error("Watch process did not exit within {timeout_ms}ms")]
    StopTimeout { timeout_ms: u64 },

    #[error("Interrupting processes is not supported on this platform")]
    UnsupportedPlatform,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/State Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Invalid watch state: {message}")]
    InvalidState { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn no_project(path: impl Into<PathBuf>) -> Self {
        Self::NoProject { path: path.into() }
    }

    pub fn process_table(message: impl Into<String>) -> Self {
        Self::ProcessTable {
            message: message.into(),
        }
    }

    pub fn tool_not_found(command: impl Into<String>) -> Self {
        Self::ToolNotFound {
            command: command.into(),
        }
    }

    pub fn process_spawn(reason: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            reason: reason.into(),
        }
    }

    pub fn signal_delivery(message: impl Into<String>) -> Self {
        Self::SignalDelivery {
            message: message.into(),
        }
    }

    pub fn companion_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CompanionFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors leave the watch session usable; the user may retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::WorkerNotFound { .. }
                | Error::ProcessTable { .. }
                | Error::SignalDelivery { .. }
                | Error::CompanionFetch { .. }
                | Error::StopTimeout { .. }
                | Error::ChannelSend { .. }
                | Error::InvalidState { .. }
                | Error::SelectionCancelled // User chose to cancel
        )
    }

    /// Check if this error should end the current invocation
    ///
    /// Nothing is fatal to the host itself; fatal errors only abort the
    /// build or watch invocation that raised them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ToolNotFound { .. }
                | Error::NoProject { .. }
                | Error::ProcessSpawn { .. }
                | Error::ConfigInvalid { .. }
        )
    }
}
