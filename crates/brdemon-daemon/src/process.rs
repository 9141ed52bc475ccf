//! `build_runner` process management

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use brdemon_core::prelude::*;
use brdemon_core::{ExitOutcome, ProcessEvent, PUBSPEC_FILENAME};

use crate::command::BuildRunnerCommand;

const READER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Manages a `dart`/`flutter` child process running `build_runner`.
///
/// The `Child` handle is moved into a dedicated `wait_for_exit` task, which
/// emits exactly one [`ProcessEvent::Exited`] carrying the real exit code and
/// terminating signal.
///
/// The launcher PID exposed by [`id`](Self::id) is usually *not* the process
/// doing the work: `flutter pub run` starts a Dart worker beneath it, and that
/// worker is what has to be interrupted to stop a watch.
pub struct BuildRunnerProcess {
    /// Sender for stdin lines
    stdin_tx: mpsc::Sender<String>,
    /// Launcher process ID
    pid: Option<u32>,
    /// Tells the wait task to force-kill the child. Consumed on first use.
    kill_tx: Option<oneshot::Sender<()>>,
    /// Set by the wait task once the child has exited
    exited: Arc<AtomicBool>,
}

impl BuildRunnerProcess {
    /// Spawn `command` in `project_path`
    ///
    /// Output lines and the final exit are sent to `event_tx`.
    pub async fn spawn(
        command: &BuildRunnerCommand,
        project_path: &Path,
        event_tx: mpsc::Sender<ProcessEvent>,
    ) -> Result<Self> {
        let program = command.program();
        Self::spawn_internal(&program, &command.args(), project_path, event_tx)
    }

    fn spawn_internal(
        program: &Path,
        args: &[String],
        project_path: &Path,
        event_tx: mpsc::Sender<ProcessEvent>,
    ) -> Result<Self> {
        if !project_path.join(PUBSPEC_FILENAME).exists() {
            return Err(Error::no_project(project_path));
        }

        info!("Spawning: {} {}", program.display(), args.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(project_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // A terminal Ctrl+C must not reach the launcher or its worker; only
        // the supervised stop path interrupts them
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(program.display().to_string())
                } else {
                    Error::process_spawn(e.to_string())
                }
            })?;

        let pid = child.id();
        info!("build_runner launcher started with PID: {:?}", pid);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::process_spawn("stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process_spawn("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process_spawn("stderr was not captured"))?;

        let (stdin_tx, stdin_rx) = mpsc::channel::<String>(8);
        tokio::spawn(Self::stdin_writer(stdin, stdin_rx));
        let readers = vec![
            tokio::spawn(forward_lines(stdout, event_tx.clone(), ProcessEvent::Stdout, "stdout")),
            tokio::spawn(forward_lines(stderr, event_tx.clone(), ProcessEvent::Stderr, "stderr")),
        ];

        let exited = Arc::new(AtomicBool::new(false));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(Self::wait_for_exit(
            child,
            readers,
            kill_rx,
            event_tx,
            Arc::clone(&exited),
        ));

        Ok(Self {
            stdin_tx,
            pid,
            kill_tx: Some(kill_tx),
            exited,
        })
    }

    /// Background task: owns `child`, waits for it, emits `ProcessEvent::Exited`.
    ///
    /// The readers get a short grace period to forward the remaining output
    /// first, so `Exited` is the last event. A grandchild that inherited the
    /// pipes can keep them open after the launcher died, hence the bound.
    async fn wait_for_exit(
        mut child: Child,
        readers: Vec<JoinHandle<()>>,
        kill_rx: oneshot::Receiver<()>,
        event_tx: mpsc::Sender<ProcessEvent>,
        exited: Arc<AtomicBool>,
    ) {
        let outcome = tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => {
                        info!("build_runner exited with status: {:?}", status);
                        ExitOutcome::from_status(status)
                    }
                    Err(e) => {
                        error!("Error waiting for build_runner: {}", e);
                        ExitOutcome::default()
                    }
                }
            }
            _ = kill_rx => {
                info!("Kill requested, force-killing build_runner launcher");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill build_runner: {}", e);
                }
                match child.wait().await {
                    Ok(status) => ExitOutcome::from_status(status),
                    Err(e) => {
                        error!("Error waiting after kill: {}", e);
                        ExitOutcome::default()
                    }
                }
            }
        };

        if tokio::time::timeout(READER_DRAIN_TIMEOUT, join_all(readers))
            .await
            .is_err()
        {
            debug!("Output pipes still open after exit, not waiting for them");
        }

        // has_exited() must be true before anyone observes the event
        exited.store(true, Ordering::Release);

        debug!("Sending ProcessEvent::Exited {}", outcome);
        let _ = event_tx.send(ProcessEvent::Exited(outcome)).await;
    }

    async fn stdin_writer(mut stdin: tokio::process::ChildStdin, mut rx: mpsc::Receiver<String>) {
        while let Some(line) = rx.recv().await {
            debug!("Writing to build_runner stdin: {:?}", line);

            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                // Closed pipe: the child stopped reading, which is not an error for us
                debug!("Failed to write to stdin: {}", e);
                break;
            }
            if let Err(e) = stdin.write_all(b"\n").await {
                debug!("Failed to write newline: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                debug!("Failed to flush stdin: {}", e);
                break;
            }
        }

        debug!("stdin writer finished");
    }

    /// Write one line to the child's stdin
    ///
    /// `build_runner` asks `y/n` questions (e.g. whether to delete conflicting
    /// outputs); answering ahead of time keeps it from blocking on them.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        self.stdin_tx
            .send(line.to_string())
            .await
            .map_err(|_| Error::channel_send("stdin channel closed"))
    }

    /// Force kill the launcher by signalling the wait task
    pub fn force_kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            warn!("Force killing build_runner launcher");
            let _ = tx.send(());
        }
    }

    /// Non-blocking check backed by an atomic flag set by the wait task
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Launcher process ID
    pub fn id(&self) -> Option<u32> {
        self.pid
    }
}

/// Forward one output stream line by line until EOF
///
/// Bytes that are not UTF-8 are replaced rather than ending the stream. The
/// pipe is read to the end even when nobody listens anymore, so the child
/// never writes into a closed pipe.
async fn forward_lines<R>(
    stream: R,
    tx: mpsc::Sender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
    name: &'static str,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut forwarding = true;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if !forwarding {
                    continue;
                }
                let line = decode_line(&buf);
                trace!("{}: {}", name, line);
                if tx.send(wrap(line)).await.is_err() {
                    debug!("{} channel closed, discarding the rest", name);
                    forwarding = false;
                }
            }
            Err(e) => {
                warn!("Failed to read {}: {}", name, e);
                break;
            }
        }
    }

    debug!("{} reader finished", name);
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

impl Drop for BuildRunnerProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            warn!("BuildRunnerProcess dropped while the launcher may still be running");
            self.force_kill();
        }
        debug!("BuildRunnerProcess dropped");
    }
}
