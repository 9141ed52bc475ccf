//! Serve mode - NDJSON host protocol for editor integration
//!
//! An editor extension spawns `brdemon serve` and talks to it over stdio.
//! Commands arrive on stdin, one per line (see [`protocol`]). Everything the
//! supervisor or a build wants to show is written to stdout as NDJSON, one
//! event per line, each carrying an `"event"` tag and a millisecond
//! `timestamp`.
//!
//! # Example Output
//!
//! ```json
//! {"event":"output_cleared","timestamp":1704700001000}
//! {"event":"output","text":"Spawning `dart run build_runner watch` in /work/app","timestamp":1704700001002}
//! {"event":"status","state":"initializing","label":"Initializing","tooltip":"Watch with build_runner","timestamp":1704700001010}
//! {"event":"progress","message":"[INFO] 12/50 actions completed.","percent":24,"increment":24,"timestamp":1704700003000}
//! {"event":"prompt","id":1,"kind":"offer","message":"...","action":"Switch to flutter","timestamp":1704700004000}
//! ```

pub mod host;
pub mod protocol;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use brdemon_app::NotificationLevel;
use brdemon_core::{ProgressUpdate, WatchState};

/// Kind of a prompt awaiting an `answer` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Offer,
    PickFolder,
}

/// Events emitted on stdout in serve mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// Watch status indicator changed
    Status {
        state: WatchState,
        label: String,
        tooltip: String,
        timestamp: i64,
    },

    /// Text appended to the output channel
    Output { text: String, timestamp: i64 },

    OutputCleared { timestamp: i64 },

    /// The output channel should be brought to the front
    OutputShown { timestamp: i64 },

    Progress {
        message: String,
        percent: Option<u32>,
        increment: Option<u32>,
        timestamp: i64,
    },

    Notification {
        level: NotificationLevel,
        message: String,
        timestamp: i64,
    },

    /// A question the editor must answer with `answer <id> <text>`
    Prompt {
        id: u64,
        kind: PromptKind,
        message: String,
        action: Option<String>,
        timestamp: i64,
    },

    /// Error that did not go through a notification
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HostEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize host event: {}", e);
                return;
            }
        };

        // One event per line; the lock keeps concurrent writers from interleaving
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write host event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn status(state: WatchState) -> Self {
        Self::Status {
            state,
            label: state.label().to_string(),
            tooltip: state.tooltip().to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn output(text: &str) -> Self {
        Self::Output {
            text: text.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn output_cleared() -> Self {
        Self::OutputCleared {
            timestamp: Self::now(),
        }
    }

    pub fn output_shown() -> Self {
        Self::OutputShown {
            timestamp: Self::now(),
        }
    }

    pub fn progress(update: &ProgressUpdate) -> Self {
        Self::Progress {
            message: update.message.clone(),
            percent: update.percent,
            increment: update.increment,
            timestamp: Self::now(),
        }
    }

    pub fn notification(level: NotificationLevel, message: &str) -> Self {
        Self::Notification {
            level,
            message: message.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn prompt(id: u64, kind: PromptKind, message: &str, action: Option<&str>) -> Self {
        Self::Prompt {
            id,
            kind,
            message: message.to_string(),
            action: action.map(str::to_string),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}
