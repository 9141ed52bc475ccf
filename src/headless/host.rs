//! [`HostUi`] over the serve protocol

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use brdemon_app::{HostUi, NotificationLevel};
use brdemon_core::{ProgressUpdate, WatchState};

use super::{HostEvent, PromptKind};

/// Pending prompts keyed by id
///
/// The task that asked waits on a oneshot; the stdin reader resolves it when
/// the matching `answer` line arrives.
#[derive(Debug, Default)]
pub struct PromptBroker {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<String>>>,
}

impl PromptBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt and get its id plus the answer receiver
    pub fn register(&self) -> (u64, oneshot::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(id, tx);
        }
        (id, rx)
    }

    /// Deliver an answer; `false` when no prompt with `id` is pending
    pub fn answer(&self, id: u64, text: String) -> bool {
        let sender = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        match sender {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    /// Decline everything still pending
    pub fn cancel_all(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            // Dropping the senders wakes the waiters with an error
            pending.clear();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

/// `yes`, `y` or the action text (any case) accept an offer
pub fn accepts_offer(answer: &str, action: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case(action)
}

/// A folder answer; empty or `no` dismisses the picker
pub fn folder_answer(answer: &str) -> Option<PathBuf> {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("no") {
        None
    } else {
        Some(PathBuf::from(answer))
    }
}

/// Host that writes NDJSON events to stdout
#[derive(Debug, Default)]
pub struct StdioHost {
    prompts: PromptBroker,
}

impl StdioHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> &PromptBroker {
        &self.prompts
    }

    async fn ask(&self, kind: PromptKind, message: &str, action: Option<&str>) -> Option<String> {
        let (id, rx) = self.prompts.register();
        HostEvent::prompt(id, kind, message, action).emit();
        match rx.await {
            Ok(answer) => {
                debug!("Prompt {} answered: {:?}", id, answer);
                Some(answer)
            }
            Err(_) => {
                warn!("Prompt {} was abandoned", id);
                None
            }
        }
    }
}

impl HostUi for StdioHost {
    fn append_output(&self, text: &str) {
        HostEvent::output(text).emit();
    }

    fn show_output(&self) {
        HostEvent::output_shown().emit();
    }

    fn clear_output(&self) {
        HostEvent::output_cleared().emit();
    }

    fn set_watch_status(&self, state: WatchState) {
        HostEvent::status(state).emit();
    }

    fn report_progress(&self, update: &ProgressUpdate) {
        HostEvent::progress(update).emit();
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        HostEvent::notification(level, message).emit();
    }

    async fn offer(&self, message: &str, action: &str) -> bool {
        self.ask(PromptKind::Offer, message, Some(action))
            .await
            .is_some_and(|answer| accepts_offer(&answer, action))
    }

    async fn pick_folder(&self, prompt: &str) -> Option<PathBuf> {
        self.ask(PromptKind::PickFolder, prompt, None)
            .await
            .and_then(|answer| folder_answer(&answer))
    }
}
