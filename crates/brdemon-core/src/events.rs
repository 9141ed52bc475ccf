//! Process event definitions

use serde::Serialize;

/// Result of a terminated child process
///
/// Produced exactly once per process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    /// Signal name (e.g. `SIGINT`) when the child was terminated by a signal
    pub signal: Option<String>,
}

impl ExitOutcome {
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Build from a std exit status, resolving the terminating signal on unix
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: signal_name(&status),
        }
    }
}

#[cfg(unix)]
fn signal_name(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| match sig {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        3 => "SIGQUIT".to_string(),
        9 => "SIGKILL".to_string(),
        13 => "SIGPIPE".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("signal {}", other),
    })
}

#[cfg(not(unix))]
fn signal_name(_status: &std::process::ExitStatus) -> Option<String> {
    None
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "null".to_string());
        let signal = self.signal.as_deref().unwrap_or("null");
        write!(f, "{{code: {}, signal: {}}}", code, signal)
    }
}

/// Event emitted by a spawned `build_runner` process
///
/// Output events arrive in order per stream; `Exited` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    Exited(ExitOutcome),
}
