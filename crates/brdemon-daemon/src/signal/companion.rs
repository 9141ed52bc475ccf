use brdemon_core::prelude::*;

use super::SignalDispatcher;
use crate::companion::CompanionBinary;
use crate::process_table::{self, select_worker, WorkerFilter};

/// Interrupts the worker through the companion helper binary
///
/// The worker is the Dart VM child of the launcher; other children (console
/// hosts and the like) are skipped.
#[derive(Debug, Clone)]
pub struct CompanionDispatcher {
    binary: CompanionBinary,
    filter: WorkerFilter,
}

impl CompanionDispatcher {
    pub fn new(binary: CompanionBinary) -> Self {
        Self {
            binary,
            filter: WorkerFilter::build_runner_worker(),
        }
    }

    pub fn binary(&self) -> &CompanionBinary {
        &self.binary
    }
}

impl SignalDispatcher for CompanionDispatcher {
    fn can_interrupt(&self) -> bool {
        true
    }

    async fn find_worker(&self, parent_pid: u32) -> Result<Option<u32>> {
        let entries = process_table::snapshot().await?;
        let worker = select_worker(&entries, parent_pid, &self.filter);
        debug!("Worker of {}: {:?}", parent_pid, worker);
        Ok(worker)
    }

    async fn interrupt(&self, pid: u32) -> Result<()> {
        self.binary.send(pid).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::companion::COMPANION_FILENAME;
    use crate::test_utils::write_fake_tool;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_interrupt_runs_cached_helper_with_pid() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("sent");
        write_fake_tool(
            temp.path(),
            COMPANION_FILENAME,
            &format!("echo \"$1\" > '{}'\n", marker.display()),
        );
        let dispatcher = CompanionDispatcher::new(CompanionBinary::new(
            "http://127.0.0.1:9/unused",
            temp.path(),
        ));

        dispatcher.interrupt(4321).await.unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "4321");
    }

    #[tokio::test]
    async fn test_helper_failure_is_signal_delivery_error() {
        let temp = TempDir::new().unwrap();
        write_fake_tool(temp.path(), COMPANION_FILENAME, "exit 1\n");
        let dispatcher = CompanionDispatcher::new(CompanionBinary::new(
            "http://127.0.0.1:9/unused",
            temp.path(),
        ));

        let result = dispatcher.interrupt(4321).await;
        assert!(matches!(result, Err(Error::SignalDelivery { .. })));
    }
}
