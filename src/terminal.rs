//! Terminal mode - `brdemon build` and `brdemon watch` for humans
//!
//! Output goes to stdout, notifications and prompts to stderr. Prompts read
//! one line from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use brdemon_app::{
    load_settings, resolve_working_directory, run_build, BuildRequest, HostUi, NotificationLevel,
    PlatformDispatcher, ProcessSupervisor, ProjectRoots,
};
use brdemon_core::prelude::*;
use brdemon_core::{ProgressUpdate, WatchState};

/// Interrupts after which a watch that refuses to stop is dropped
const MAX_STOP_ATTEMPTS: u32 = 2;

/// Host for an interactive terminal
#[derive(Debug, Default)]
pub struct TerminalHost;

impl TerminalHost {
    pub fn new() -> Self {
        Self
    }
}

fn read_answer(question: String) -> Option<String> {
    let mut stderr = io::stderr().lock();
    let _ = write!(stderr, "{} ", question);
    let _ = stderr.flush();
    drop(stderr);

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

async fn ask(question: String) -> Option<String> {
    match tokio::task::spawn_blocking(move || read_answer(question)).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Prompt reader failed: {}", e);
            None
        }
    }
}

impl HostUi for TerminalHost {
    fn append_output(&self, text: &str) {
        println!("{}", text);
    }

    fn show_output(&self) {}

    fn clear_output(&self) {}

    fn set_watch_status(&self, state: WatchState) {
        eprintln!("● {}", state.label());
    }

    fn report_progress(&self, update: &ProgressUpdate) {
        match update.percent {
            Some(percent) => println!("[{:>3}%] {}", percent, update.message),
            None => println!("{}", update.message),
        }
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        let prefix = match level {
            NotificationLevel::Info => "✅",
            NotificationLevel::Warning => "⚠️ ",
            NotificationLevel::Error => "❌",
        };
        eprintln!("{} {}", prefix, message);
    }

    async fn offer(&self, message: &str, action: &str) -> bool {
        let answer = ask(format!("{}\n{}? [y/N]", message, action)).await;
        answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"))
    }

    async fn pick_folder(&self, prompt: &str) -> Option<PathBuf> {
        let answer = ask(format!("{}\nProject folder (empty to cancel):", prompt)).await?;
        if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        }
    }
}

/// Run one build; `Ok(false)` when it failed
pub async fn run_build_once(roots: ProjectRoots, filters: Vec<String>) -> Result<bool> {
    let settings = load_settings(&roots.config_root());
    let host = TerminalHost::new();

    let project = resolve_working_directory(&roots, &host).await?;
    let request = BuildRequest::new(project, filters, roots.config_root());
    let outcome = run_build(&settings, &host, &request).await?;
    Ok(outcome.success)
}

/// Start a watch and supervise it until it exits or Ctrl+C stops it
pub async fn run_watch(roots: ProjectRoots) -> Result<()> {
    let settings = Arc::new(load_settings(&roots.config_root()));
    let host = Arc::new(TerminalHost::new());
    let dispatcher = PlatformDispatcher::detect(settings.companion_binary());
    info!("Signal dispatcher: {}", dispatcher.name());

    let mut supervisor = ProcessSupervisor::new(dispatcher, host, settings, roots);
    supervisor.toggle().await?;
    if supervisor.state() == WatchState::Idle {
        return Ok(());
    }

    let mut attempts = 0;
    loop {
        tokio::select! {
            event = supervisor.next_event() => {
                supervisor.handle_event(event);
                if supervisor.state() == WatchState::Idle {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    break;
                }
                attempts += 1;
                if supervisor.state() != WatchState::Watching || attempts >= MAX_STOP_ATTEMPTS {
                    break;
                }
                match supervisor.stop().await {
                    Ok(()) => break,
                    Err(e) if supervisor.state() == WatchState::Idle => {
                        debug!("Watch ended while stopping: {}", e);
                        break;
                    }
                    Err(e) if e.is_recoverable() => {
                        eprintln!("{} (press Ctrl+C again to force it)", e);
                    }
                    Err(e) => {
                        error!("Stopping the watch failed: {}", e);
                        break;
                    }
                }
            }
        }
    }

    supervisor.shutdown().await;
    Ok(())
}
