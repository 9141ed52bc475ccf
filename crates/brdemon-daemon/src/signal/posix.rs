use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use brdemon_core::prelude::*;

use super::SignalDispatcher;
use crate::process_table::{self, select_worker, WorkerFilter};

/// Sends `SIGINT` to the first child of the launcher
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixDispatcher;

impl SignalDispatcher for PosixDispatcher {
    fn can_interrupt(&self) -> bool {
        true
    }

    async fn find_worker(&self, parent_pid: u32) -> Result<Option<u32>> {
        let entries = process_table::snapshot().await?;
        let worker = select_worker(&entries, parent_pid, &WorkerFilter::AnyChild);
        debug!("Worker of {}: {:?}", parent_pid, worker);
        Ok(worker)
    }

    async fn interrupt(&self, pid: u32) -> Result<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| Error::signal_delivery(format!("pid {} out of range", pid)))?;
        info!("Sending SIGINT to {}", pid);
        kill(Pid::from_raw(raw), Signal::SIGINT)
            .map_err(|e| Error::signal_delivery(format!("kill -INT {} failed: {}", pid, e)))
    }
}
