//! Progress parsing for `build_runner` output
//!
//! `build_runner` periodically prints lines such as
//! `[INFO] 34.6s elapsed, 327/343 actions completed.` which are turned into
//! a percentage for the host's progress indicator.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ACTIONS_COMPLETED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*/\s*(\d+)\s+actions\s+completed")
        .expect("Invalid actions completed regex")
});

/// Parse `<completed>/<total> actions completed` into a whole percentage.
///
/// Returns `None` when the text carries no progress information or the
/// total is zero.
pub fn parse_progress(text: &str) -> Option<u32> {
    let caps = ACTIONS_COMPLETED_REGEX.captures(text)?;
    let completed: u64 = caps.get(1)?.as_str().parse().ok()?;
    let total: u64 = caps.get(2)?.as_str().parse().ok()?;
    if total == 0 {
        return None;
    }
    let percent = (completed.saturating_mul(100) / total).min(100);
    Some(percent as u32)
}

/// A progress report derived from one chunk of output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub message: String,
    /// Absolute percentage, present only when the chunk carried one
    pub percent: Option<u32>,
    /// Difference to the previously reported percentage
    pub increment: Option<u32>,
}

/// Tracks the last known percentage across output chunks
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_percent: Option<u32>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last percentage seen, unchanged by chunks without progress
    pub fn percent(&self) -> Option<u32> {
        self.last_percent
    }

    /// Turn an output chunk into a progress update
    pub fn observe(&mut self, text: &str) -> ProgressUpdate {
        let message = text.trim().to_string();
        match parse_progress(text) {
            Some(percent) => {
                let increment = percent.saturating_sub(self.last_percent.unwrap_or(0));
                self.last_percent = Some(percent.max(self.last_percent.unwrap_or(0)));
                ProgressUpdate {
                    message,
                    percent: Some(percent),
                    increment: Some(increment),
                }
            }
            None => ProgressUpdate {
                message,
                percent: None,
                increment: None,
            },
        }
    }
}
