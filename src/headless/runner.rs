//! Serve mode runner - main event loop for editor hosts
//!
//! A blocking stdin reader parses commands. Answers go straight to the
//! prompt broker so a prompt can be answered while the loop is busy inside
//! a toggle; everything else is queued for the loop. The loop itself owns
//! the [`ProcessSupervisor`] and interleaves host commands with watch
//! events. Builds run on their own tasks.

use std::sync::Arc;

use tokio::sync::mpsc;

use brdemon_app::{
    load_settings, resolve_working_directory, run_build, BuildOutcome, BuildRequest, HostUi,
    PlatformDispatcher, ProcessSupervisor, ProjectRoots, Settings, ToolAvailability,
};
use brdemon_core::prelude::*;
use brdemon_core::ShellCommand;

use super::host::StdioHost;
use super::protocol::HostCommand;
use super::HostEvent;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Run the NDJSON protocol until `quit` or end of input
pub async fn run_serve(roots: ProjectRoots) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Build Runner Demon starting in SERVE mode");
    info!("Active path: {}", roots.active.display());
    info!("═══════════════════════════════════════════════════════");

    let mut settings = Arc::new(load_settings(&roots.config_root()));
    let host = Arc::new(StdioHost::new());

    report_missing_tools(&settings);

    let dispatcher = PlatformDispatcher::detect(settings.companion_binary());
    info!("Signal dispatcher: {}", dispatcher.name());

    let mut supervisor =
        ProcessSupervisor::new(dispatcher, host.clone(), settings.clone(), roots.clone());
    supervisor.publish_status();

    let (cmd_tx, mut cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let reader_host = host.clone();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(cmd_tx, reader_host);
    });

    let (build_tx, mut build_rx) = mpsc::channel::<BuildOutcome>(COMMAND_CHANNEL_CAPACITY);

    loop {
        tokio::select! {
            command = cmd_rx.recv() => match command {
                Some(HostCommand::Toggle) => {
                    if let Err(e) = supervisor.toggle().await {
                        // The supervisor already notified the host where it matters
                        warn!("Toggle failed: {}", e);
                    }
                }
                Some(HostCommand::Build { filters }) => {
                    spawn_build(
                        settings.clone(),
                        host.clone(),
                        roots.clone(),
                        filters,
                        build_tx.clone(),
                    );
                }
                Some(HostCommand::Answer { .. }) => {
                    // Routed to the broker by the reader
                }
                Some(HostCommand::Quit) | None => {
                    info!("Quit requested");
                    break;
                }
            },
            event = supervisor.next_event() => {
                supervisor.handle_event(event);
            }
            Some(outcome) = build_rx.recv() => {
                if let Some(shell) = outcome.switched_to {
                    settings = Arc::new(switch_command(&settings, shell));
                    supervisor.set_settings(settings.clone());
                }
            }
        }
    }

    host.prompts().cancel_all();
    supervisor.shutdown().await;

    info!("Build Runner Demon serve mode exiting");
    Ok(())
}

/// Settings snapshot after the user switched front ends during a build
fn switch_command(settings: &Settings, shell: ShellCommand) -> Settings {
    info!("Using {} from now on", shell);
    settings.with_command(shell)
}

fn report_missing_tools(settings: &Settings) {
    let tools = ToolAvailability::check();
    for shell in [ShellCommand::Dart, ShellCommand::Flutter] {
        if settings.executable_for(shell).is_some() {
            continue;
        }
        if let Some(message) = tools.unavailable_message(shell) {
            warn!("{}", message);
        }
    }
}

fn spawn_build(
    settings: Arc<Settings>,
    host: Arc<StdioHost>,
    roots: ProjectRoots,
    filters: Vec<String>,
    outcome_tx: mpsc::Sender<BuildOutcome>,
) {
    tokio::spawn(async move {
        host.show_output();
        let project = match resolve_working_directory(&roots, host.as_ref()).await {
            Ok(project) => project,
            Err(e) => {
                info!("Build not started: {}", e);
                if !matches!(e, Error::SelectionCancelled) {
                    HostEvent::error(e.to_string(), e.is_fatal()).emit();
                }
                return;
            }
        };

        let request = BuildRequest::new(project, filters, roots.config_root());
        match run_build(&settings, host.as_ref(), &request).await {
            Ok(outcome) => {
                let _ = outcome_tx.send(outcome).await;
            }
            Err(e) => error!("Build failed to start: {}", e),
        }
    });
}

/// Read commands from stdin until `quit` or end of input
fn spawn_stdin_reader_blocking(cmd_tx: mpsc::Sender<HostCommand>, host: Arc<StdioHost>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        match HostCommand::parse(&line) {
            Ok(Some(HostCommand::Answer { id, text })) => {
                if !host.prompts().answer(id, text) {
                    warn!("Answer for unknown prompt {}", id);
                    HostEvent::error(format!("No pending prompt with id {}", id), false).emit();
                }
            }
            Ok(Some(HostCommand::Quit)) => {
                let _ = cmd_tx.blocking_send(HostCommand::Quit);
                break;
            }
            Ok(Some(command)) => {
                if cmd_tx.blocking_send(command).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{}", e);
                HostEvent::error(e.to_string(), false).emit();
            }
        }
    }

    // Nobody is left to answer; dropping the sender ends the main loop
    host.prompts().cancel_all();
    info!("Stdin reader exiting");
}
