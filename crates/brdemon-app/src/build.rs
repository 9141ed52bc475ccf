//! One-shot and filtered builds
//!
//! A build streams its stdout into progress reports and ends with one
//! notification: the last stdout line on success, `Failed: <stderr>` on
//! failure. When `dart` fails because it cannot find the project manifest,
//! the host is offered to switch to `flutter`; accepting persists the choice
//! and retries once.

use std::path::PathBuf;

use tokio::sync::mpsc;

use brdemon_core::prelude::*;
use brdemon_core::{BuildMode, ProcessEvent, ProgressTracker, ProgressUpdate, ShellCommand};
use brdemon_daemon::{BuildRunnerProcess, BuildTranscript};

use crate::config::{save_command_choice, Settings};
use crate::host::{HostUi, NotificationLevel};

const REMEDIATION_MESSAGE: &str =
    "You seem to have an issue with dart, do you want to try to use flutter instead?";
const REMEDIATION_ACTION: &str = "Switch to flutter";

/// Stderr fragments that point at `dart` being the wrong front end
const MANIFEST_ERROR_MARKERS: &[&str] = &["Could not find a file", "pubspec.yaml"];

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// What to build and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Project root containing `pubspec.yaml`
    pub project: PathBuf,
    /// `--build-filter` globs, in order; empty for a full build
    pub filters: Vec<String>,
    /// Where a front-end switch is persisted
    pub config_root: PathBuf,
}

impl BuildRequest {
    pub fn new(project: PathBuf, filters: Vec<String>, config_root: PathBuf) -> Self {
        Self {
            project,
            filters,
            config_root,
        }
    }
}

/// Result of [`run_build`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    /// Last stdout line of the final attempt
    pub summary: Option<String>,
    /// Stderr of the final attempt
    pub stderr: String,
    /// Set when the user switched front ends during this build
    pub switched_to: Option<ShellCommand>,
}

/// Run `build_runner build` for `request`, reporting to `host`
///
/// A failing build is an `Ok` outcome with `success == false`; `Err` means
/// the build could not be spawned at all.
pub async fn run_build<H: HostUi>(
    settings: &Settings,
    host: &H,
    request: &BuildRequest,
) -> Result<BuildOutcome> {
    let mut shell = settings.resolve_shell_command(&request.project);
    let mut active = settings.clone();
    let mut switched_to = None;

    loop {
        let transcript = match run_once(&active, shell, host, request).await {
            Ok(transcript) => transcript,
            Err(e) => {
                error!("Build could not start: {}", e);
                host.notify(NotificationLevel::Error, &format!("Failed: {}", e));
                return Err(e);
            }
        };

        if transcript.succeeded() {
            let summary = transcript.last_stdout().map(str::to_string);
            info!("Build succeeded: {:?}", summary);
            host.notify(
                NotificationLevel::Info,
                summary.as_deref().unwrap_or("build_runner finished"),
            );
            return Ok(BuildOutcome {
                success: true,
                summary,
                stderr: transcript.stderr(),
                switched_to,
            });
        }

        let stderr = transcript.stderr();
        let detail = if stderr.trim().is_empty() {
            match transcript.exit() {
                Some(exit) => format!("build_runner exited with {}", exit),
                None => "build_runner exited unexpectedly".to_string(),
            }
        } else {
            stderr.clone()
        };
        warn!("Build failed with {}: {}", shell, detail);
        host.notify(NotificationLevel::Error, &format!("Failed: {}", detail));

        let retry = switched_to.is_none()
            && shell == ShellCommand::Dart
            && suggests_flutter(&stderr)
            && host.offer(REMEDIATION_MESSAGE, REMEDIATION_ACTION).await;

        if !retry {
            return Ok(BuildOutcome {
                success: false,
                summary: transcript.last_stdout().map(str::to_string),
                stderr,
                switched_to,
            });
        }

        info!("Switching to flutter and retrying the build");
        if let Err(e) = save_command_choice(&request.config_root, ShellCommand::Flutter) {
            warn!("Could not persist the switch to flutter: {}", e);
            host.notify(
                NotificationLevel::Warning,
                &format!("Could not save the switch to flutter: {}", e),
            );
        }
        active = active.with_command(ShellCommand::Flutter);
        shell = ShellCommand::Flutter;
        switched_to = Some(ShellCommand::Flutter);
    }
}

fn suggests_flutter(stderr: &str) -> bool {
    MANIFEST_ERROR_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

async fn run_once<H: HostUi>(
    settings: &Settings,
    shell: ShellCommand,
    host: &H,
    request: &BuildRequest,
) -> Result<BuildTranscript> {
    let command = settings.build_runner_command(shell, BuildMode::Build, &request.filters);
    let line = format!(
        "Spawning `{}` in {}",
        command.display_line(),
        request.project.display()
    );
    info!("{}", line);
    host.append_output(&line);
    host.report_progress(&ProgressUpdate {
        message: "Initializing ...".to_string(),
        percent: None,
        increment: None,
    });

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let _process = BuildRunnerProcess::spawn(&command, &request.project, event_tx).await?;

    let mut transcript = BuildTranscript::new();
    let mut tracker = ProgressTracker::new();
    while let Some(event) = event_rx.recv().await {
        transcript.record(&event);
        match event {
            ProcessEvent::Stdout(text) => host.report_progress(&tracker.observe(&text)),
            ProcessEvent::Stderr(text) => trace!("build stderr: {}", text),
            ProcessEvent::Exited(outcome) => {
                debug!("Build exited: {}", outcome);
                break;
            }
        }
    }

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggests_flutter() {
        assert!(suggests_flutter(
            "Could not find a file named \"pubspec.yaml\" in \"/work\"."
        ));
        assert!(suggests_flutter("Error reading pubspec.yaml"));
        assert!(!suggests_flutter("[SEVERE] Conflicting outputs"));
    }
}
