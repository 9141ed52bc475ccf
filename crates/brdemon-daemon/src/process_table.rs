//! Process-table snapshots and worker selection
//!
//! The launcher spawned for `build_runner watch` delegates to a Dart worker.
//! Stopping the watch means interrupting that worker, so its PID is looked up
//! among the launcher's direct children.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use brdemon_core::prelude::*;

/// One row of the process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    /// Executable name, e.g. `dart.exe`
    pub name: String,
    /// Full command line joined with spaces (may be empty without permission)
    pub command_line: String,
}

/// Which children of the launcher qualify as the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerFilter {
    /// Any direct child
    AnyChild,
    /// A child with one of `names`, or whose command line contains `command_contains`
    Matching {
        names: Vec<String>,
        command_contains: String,
    },
}

impl WorkerFilter {
    /// The Dart VM running `build_runner watch`
    pub fn build_runner_worker() -> Self {
        WorkerFilter::Matching {
            names: vec!["dart.exe".to_string(), "dart".to_string()],
            command_contains: "build_runner watch".to_string(),
        }
    }

    pub fn matches(&self, entry: &ProcessEntry) -> bool {
        match self {
            WorkerFilter::AnyChild => true,
            WorkerFilter::Matching {
                names,
                command_contains,
            } => {
                names.iter().any(|n| n.eq_ignore_ascii_case(&entry.name))
                    || entry.command_line.contains(command_contains.as_str())
            }
        }
    }
}

/// Pick the worker among the direct children of `parent_pid`
///
/// With several candidates the lowest PID wins. A launcher forks a single
/// worker, so the tie-break only matters for unusual wrappers.
pub fn select_worker(entries: &[ProcessEntry], parent_pid: u32, filter: &WorkerFilter) -> Option<u32> {
    entries
        .iter()
        .filter(|e| e.parent_pid == Some(parent_pid) && e.pid != parent_pid)
        .filter(|e| filter.matches(e))
        .map(|e| e.pid)
        .min()
}

/// Capture the current process table
pub async fn snapshot() -> Result<Vec<ProcessEntry>> {
    tokio::task::spawn_blocking(snapshot_blocking)
        .await
        .map_err(|e| Error::process_table(format!("process table task failed: {}", e)))
}

fn snapshot_blocking() -> Vec<ProcessEntry> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
    );

    let entries: Vec<ProcessEntry> = system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessEntry {
            pid: pid.as_u32(),
            parent_pid: process.parent().map(|p| p.as_u32()),
            name: process.name().to_string_lossy().into_owned(),
            command_line: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect();

    trace!("Process table snapshot: {} entries", entries.len());
    entries
}
