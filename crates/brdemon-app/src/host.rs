//! The host collaborator
//!
//! Whatever drives `brdemon` (an editor over the `serve` protocol, or a human
//! in a terminal) implements [`HostUi`]. The supervisor and the build runner
//! only talk to the outside world through it.

use std::path::PathBuf;

use serde::Serialize;

use brdemon_core::{ProgressUpdate, WatchState};

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Output sink, status indicator, notifications and prompts of the host
#[trait_variant::make(HostUi: Send)]
pub trait LocalHostUi {
    /// Append text to the persistent output channel
    fn append_output(&self, text: &str);

    /// Bring the output channel to the front
    fn show_output(&self);

    fn clear_output(&self);

    /// Update the watch status indicator
    fn set_watch_status(&self, state: WatchState);

    fn report_progress(&self, update: &ProgressUpdate);

    fn notify(&self, level: NotificationLevel, message: &str);

    /// Offer `action` to the user; `true` when accepted
    async fn offer(&self, message: &str, action: &str) -> bool;

    /// Ask the user for a folder; `None` when dismissed
    async fn pick_folder(&self, prompt: &str) -> Option<PathBuf>;
}
