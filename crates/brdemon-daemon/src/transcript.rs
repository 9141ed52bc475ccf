//! Output capture for one-shot builds

use brdemon_core::{ExitOutcome, ProcessEvent};

/// Accumulates the output of a one-shot `build_runner build`
///
/// Only the most recent stdout line is kept (it carries the summary, e.g.
/// `Succeeded after 4.1s with 12 outputs`); stderr is kept in full for the
/// failure report.
#[derive(Debug, Clone, Default)]
pub struct BuildTranscript {
    last_stdout: Option<String>,
    stderr: Vec<String>,
    exit: Option<ExitOutcome>,
}

impl BuildTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &ProcessEvent) {
        match event {
            ProcessEvent::Stdout(line) => {
                if !line.trim().is_empty() {
                    self.last_stdout = Some(line.clone());
                }
            }
            ProcessEvent::Stderr(line) => self.stderr.push(line.clone()),
            ProcessEvent::Exited(outcome) => self.exit = Some(outcome.clone()),
        }
    }

    pub fn last_stdout(&self) -> Option<&str> {
        self.last_stdout.as_deref()
    }

    /// Captured stderr joined with newlines
    pub fn stderr(&self) -> String {
        self.stderr.join("\n")
    }

    pub fn exit(&self) -> Option<&ExitOutcome> {
        self.exit.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.exit.as_ref().is_some_and(ExitOutcome::success)
    }
}
