//! ProcessSupervisor - owns the watch session and drives its lifecycle

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use brdemon_core::prelude::*;
use brdemon_core::{BuildMode, ExitOutcome, ProcessEvent, WatchState};
use brdemon_daemon::{BuildRunnerProcess, SignalDispatcher};

use super::session::WatchSession;
use super::state::{transition, WatchAction, WatchInput};
use crate::config::Settings;
use crate::host::{HostUi, NotificationLevel};
use crate::resolve::{resolve_working_directory, ProjectRoots};

/// Appended to the output once a stop is confirmed
pub const STOPPED_MESSAGE: &str = "Stopped watching";

/// Shown when a stop could not be confirmed
pub const STOP_FAILED_MESSAGE: &str =
    "Failed to remove the watch! Try again. If it still doesn't work, restart the editor.";

const UNSTOPPABLE_WARNING: &str = "This platform cannot interrupt `build_runner watch`. \
Starting it works fine, but you won't be able to stop it from here.";
const UNSTOPPABLE_ACTION: &str = "I take the risk";

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Supervises the single watch session of a host
///
/// Owned by one loop, which feeds it user toggles and the process events
/// returned by [`next_event`](Self::next_event).
pub struct ProcessSupervisor<D, H> {
    session: WatchSession,
    dispatcher: D,
    host: Arc<H>,
    settings: Arc<Settings>,
    roots: ProjectRoots,
}

impl<D: SignalDispatcher, H: HostUi> ProcessSupervisor<D, H> {
    pub fn new(dispatcher: D, host: Arc<H>, settings: Arc<Settings>, roots: ProjectRoots) -> Self {
        Self {
            session: WatchSession::new(),
            dispatcher,
            host,
            settings,
            roots,
        }
    }

    pub fn state(&self) -> WatchState {
        self.session.state()
    }

    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    /// Replace the settings snapshot; takes effect on the next start
    pub fn set_settings(&mut self, settings: Arc<Settings>) {
        self.settings = settings;
    }

    pub fn publish_status(&self) {
        self.host.set_watch_status(self.state());
    }

    /// Start when idle, stop when watching, ignore while initializing
    pub async fn toggle(&mut self) -> Result<()> {
        match transition(self.state(), WatchInput::Toggle).action {
            Some(WatchAction::Start) => {
                self.host.show_output();
                let dir = resolve_working_directory(&self.roots, self.host.as_ref())
                    .await
                    .inspect_err(|e| info!("Watch not started: {}", e))?;
                self.start(&dir).await
            }
            Some(WatchAction::Stop) => {
                self.host.show_output();
                self.stop().await
            }
            _ => {
                debug!("Toggle ignored while {:?}", self.state());
                Ok(())
            }
        }
    }

    /// Spawn `build_runner watch` in `working_directory`
    pub async fn start(&mut self, working_directory: &Path) -> Result<()> {
        if self.state() != WatchState::Idle {
            return Err(Error::invalid_state(format!(
                "cannot start a watch while {:?}",
                self.state()
            )));
        }

        self.host.clear_output();

        if !self.dispatcher.can_interrupt() && self.settings.watch.warn_when_unstoppable {
            let accepted = self
                .host
                .offer(UNSTOPPABLE_WARNING, UNSTOPPABLE_ACTION)
                .await;
            if !accepted {
                info!("Watch start declined: it could not be stopped later");
                return Ok(());
            }
        }

        let shell = self.settings.resolve_shell_command(working_directory);
        let command = self
            .settings
            .build_runner_command(shell, BuildMode::Watch, &[]);
        let line = format!(
            "Spawning `{}` in {}",
            command.display_line(),
            working_directory.display()
        );
        info!("{}", line);
        self.host.append_output(&line);

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        match BuildRunnerProcess::spawn(&command, working_directory, event_tx).await {
            Ok(process) => {
                self.session
                    .begin(process, event_rx, working_directory.to_path_buf());
                self.publish_status();
                Ok(())
            }
            Err(e) => {
                error!("Failed to start watch: {}", e);
                self.host.append_output(&e.to_string());
                self.host
                    .notify(NotificationLevel::Error, &format!("Failed to start watch: {}", e));
                Err(e)
            }
        }
    }

    /// Wait for the next event of the active process
    ///
    /// Pending forever while idle, so it can sit in a `select!` next to the
    /// host's command stream. A channel that closes without an exit event is
    /// reported as an exit with unknown status.
    pub async fn next_event(&mut self) -> ProcessEvent {
        if !self.session.has_receiver() {
            return std::future::pending().await;
        }
        match self.session.recv().await {
            Some(event) => event,
            None => {
                warn!("Watch event channel closed without an exit event");
                ProcessEvent::Exited(ExitOutcome::default())
            }
        }
    }

    /// Apply one process event
    pub fn handle_event(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Stdout(text) => {
                self.host.append_output(&text);
                if self.session.mark_output() {
                    debug!("First output, now watching");
                    self.publish_status();
                }
            }
            // build_runner warns on stderr without failing the watch
            ProcessEvent::Stderr(text) => self.host.append_output(&text),
            ProcessEvent::Exited(outcome) => self.on_closed(outcome),
        }
    }

    fn on_closed(&mut self, outcome: ExitOutcome) {
        let t = transition(self.state(), WatchInput::Closed);
        if t.action.is_none() {
            debug!("Exit {} with no active watch", outcome);
            return;
        }

        info!("Watch exited: {}", outcome);
        self.session.finish();
        self.publish_status();

        if !outcome.success() {
            let code = exit_code_text(&outcome);
            self.host
                .append_output(&format!("Command exited with code {}", code));
            self.host.notify(
                NotificationLevel::Error,
                &format!("build_runner watch exited with code {}", code),
            );
        }
    }

    /// Interrupt the worker and wait for the watch to exit
    ///
    /// The session is only released when the exit is observed inside the
    /// configured window. On timeout the session stays `Watching` and no
    /// kill is attempted.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state() != WatchState::Watching {
            return Err(Error::invalid_state(format!(
                "cannot stop a watch while {:?}",
                self.state()
            )));
        }

        let parent_pid = self
            .session
            .process()
            .and_then(BuildRunnerProcess::id)
            .ok_or_else(|| Error::invalid_state("watch process has no PID"))?;

        let worker = match self.dispatcher.find_worker(parent_pid).await {
            Ok(Some(pid)) => pid,
            Ok(None) => return Err(self.stop_failed(Error::WorkerNotFound { parent_pid })),
            Err(e) => return Err(self.stop_failed(e)),
        };
        info!("Stopping watch: launcher {}, worker {}", parent_pid, worker);

        // Answers "Terminate batch job (Y/N)?" when the launcher is a batch file
        if let Some(process) = self.session.process() {
            if let Err(e) = process.send_line("y").await {
                debug!("Could not write to the launcher's stdin: {}", e);
            }
        }

        if let Err(e) = self.dispatcher.interrupt(worker).await {
            return Err(self.stop_failed(e));
        }

        let window = self.settings.watch.stop_timeout();
        match tokio::time::timeout(window, self.drain_until_exit()).await {
            Ok(outcome) if outcome.success() => {
                info!("Watch stopped: {}", outcome);
                self.session.finish();
                self.host.append_output(STOPPED_MESSAGE);
                self.publish_status();
                Ok(())
            }
            Ok(outcome) => {
                let code = outcome.code;
                self.on_closed(outcome);
                Err(Error::ProcessExit { code })
            }
            Err(_) => {
                warn!("Watch did not exit within {:?} after the interrupt", window);
                self.host.notify(NotificationLevel::Error, STOP_FAILED_MESSAGE);
                Err(Error::StopTimeout {
                    timeout_ms: self.settings.watch.stop_timeout_ms,
                })
            }
        }
    }

    /// Forward output until the exit event arrives
    async fn drain_until_exit(&mut self) -> ExitOutcome {
        loop {
            match self.session.recv().await {
                Some(ProcessEvent::Exited(outcome)) => return outcome,
                Some(event) => self.handle_event(event),
                None => return ExitOutcome::default(),
            }
        }
    }

    fn stop_failed(&self, error: Error) -> Error {
        warn!("Stop aborted: {}", error);
        self.host
            .append_output(&format!("Failed to stop the watch: {}", error));
        self.host.notify(NotificationLevel::Error, STOP_FAILED_MESSAGE);
        error
    }

    /// Stop a running watch on host exit
    ///
    /// Whatever is left afterwards is dropped, which kills the launcher.
    pub async fn shutdown(&mut self) {
        match self.state() {
            WatchState::Watching => {
                if let Err(e) = self.stop().await {
                    warn!("Watch did not stop cleanly on shutdown: {}", e);
                }
            }
            WatchState::Initializing => info!("Dropping a watch that is still initializing"),
            WatchState::Idle => {}
        }
        self.session.finish();
    }
}

fn exit_code_text(outcome: &ExitOutcome) -> String {
    match (&outcome.code, &outcome.signal) {
        (Some(code), _) => code.to_string(),
        (None, Some(signal)) => format!("null ({})", signal),
        (None, None) => "null".to_string(),
    }
}
