use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use brdemon_core::{ProcessEvent, WatchState};
use brdemon_daemon::BuildRunnerProcess;

use super::state::{transition, WatchInput};

/// The in-memory watch session
///
/// Holds a process handle exactly while the state is `Initializing` or
/// `Watching`. The mutators below are the only way to change either.
#[derive(Default)]
pub struct WatchSession {
    state: WatchState,
    process: Option<BuildRunnerProcess>,
    events: Option<mpsc::Receiver<ProcessEvent>>,
    working_directory: Option<PathBuf>,
}

impl WatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn process(&self) -> Option<&BuildRunnerProcess> {
        self.process.as_ref()
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    /// Take ownership of a freshly spawned process (`Idle → Initializing`)
    pub fn begin(
        &mut self,
        process: BuildRunnerProcess,
        events: mpsc::Receiver<ProcessEvent>,
        working_directory: PathBuf,
    ) {
        self.state = transition(self.state, WatchInput::Spawned).next;
        self.process = Some(process);
        self.events = Some(events);
        self.working_directory = Some(working_directory);
    }

    /// Record a stdout chunk; returns `true` when this moved the state
    pub fn mark_output(&mut self) -> bool {
        let next = transition(self.state, WatchInput::Output).next;
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Drop the handle and return to `Idle`
    pub fn finish(&mut self) {
        self.state = transition(self.state, WatchInput::Closed).next;
        self.process = None;
        self.events = None;
        self.working_directory = None;
    }

    /// Next event of the active process, `None` when idle or drained
    pub async fn recv(&mut self) -> Option<ProcessEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn has_receiver(&self) -> bool {
        self.events.is_some()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use brdemon_core::{BuildMode, ShellCommand};
    use brdemon_daemon::test_utils::{write_fake_tool, write_pubspec};
    use brdemon_daemon::BuildRunnerCommand;
    use serial_test::serial;
    use tempfile::TempDir;

    async fn spawn_sleeper(dir: &Path) -> (BuildRunnerProcess, mpsc::Receiver<ProcessEvent>) {
        write_pubspec(dir, false);
        let tool = write_fake_tool(dir, "dart", "sleep 5\n");
        let cmd = BuildRunnerCommand::new(ShellCommand::Dart, BuildMode::Watch)
            .with_executable(Some(tool));
        let (tx, rx) = mpsc::channel(16);
        let process = BuildRunnerProcess::spawn(&cmd, dir, tx).await.unwrap();
        (process, rx)
    }

    #[tokio::test]
    #[serial]
    async fn test_handle_present_iff_active() {
        let temp = TempDir::new().unwrap();
        let mut session = WatchSession::new();
        assert_eq!(session.state(), WatchState::Idle);
        assert!(session.process().is_none());

        let (process, rx) = spawn_sleeper(temp.path()).await;
        session.begin(process, rx, temp.path().to_path_buf());
        assert_eq!(session.state(), WatchState::Initializing);
        assert!(session.process().is_some());
        assert_eq!(session.working_directory(), Some(temp.path()));

        assert!(session.mark_output());
        assert!(!session.mark_output());
        assert_eq!(session.state(), WatchState::Watching);
        assert!(session.process().is_some());

        session.finish();
        assert_eq!(session.state(), WatchState::Idle);
        assert!(session.process().is_none());
        assert!(!session.has_receiver());
    }

    #[tokio::test]
    async fn test_recv_when_idle_is_none() {
        let mut session = WatchSession::new();
        assert_eq!(session.recv().await, None);
    }
}
