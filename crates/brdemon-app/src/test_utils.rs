//! Test utilities for supervisor and build tests
//!
//! Provides [`RecordingHost`], a [`HostUi`] that records every call and
//! answers prompts from canned values.

use std::path::PathBuf;
use std::sync::Mutex;

use brdemon_core::{ProgressUpdate, WatchState};

use crate::host::{HostUi, NotificationLevel};

/// One recorded host call
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Output(String),
    ShowOutput,
    ClearOutput,
    Status(WatchState),
    Progress(ProgressUpdate),
    Notify(NotificationLevel, String),
    Offer { message: String, action: String },
    PickFolder(String),
}

/// Host that records calls for later assertions
#[derive(Debug)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    offer_answer: bool,
    folder: Option<PathBuf>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    /// Accepts every offer and dismisses folder pickers
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            offer_answer: true,
            folder: None,
        }
    }

    pub fn with_offer_answer(mut self, accept: bool) -> Self {
        self.offer_answer = accept;
        self
    }

    pub fn with_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.folder = folder;
        self
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().expect("host lock poisoned").push(call);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().expect("host lock poisoned").clone()
    }

    /// Everything appended to the output sink, in order
    pub fn output(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Output(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<WatchState> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Status(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(NotificationLevel, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Notify(level, message) => Some((level, message)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|(level, _)| *level == NotificationLevel::Error)
            .map(|(_, message)| message)
            .collect()
    }

    /// Offers and folder pickers, in order
    pub fn prompts(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::Offer { .. } | HostCall::PickFolder(_)))
            .collect()
    }

    pub fn progress(&self) -> Vec<ProgressUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Progress(update) => Some(update),
                _ => None,
            })
            .collect()
    }
}

impl HostUi for RecordingHost {
    fn append_output(&self, text: &str) {
        self.record(HostCall::Output(text.to_string()));
    }

    fn show_output(&self) {
        self.record(HostCall::ShowOutput);
    }

    fn clear_output(&self) {
        self.record(HostCall::ClearOutput);
    }

    fn set_watch_status(&self, state: WatchState) {
        self.record(HostCall::Status(state));
    }

    fn report_progress(&self, update: &ProgressUpdate) {
        self.record(HostCall::Progress(update.clone()));
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        self.record(HostCall::Notify(level, message.to_string()));
    }

    async fn offer(&self, message: &str, action: &str) -> bool {
        self.record(HostCall::Offer {
            message: message.to_string(),
            action: action.to_string(),
        });
        self.offer_answer
    }

    async fn pick_folder(&self, prompt: &str) -> Option<PathBuf> {
        self.record(HostCall::PickFolder(prompt.to_string()));
        self.folder.clone()
    }
}
