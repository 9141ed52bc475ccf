use brdemon_core::prelude::*;

use super::SignalDispatcher;

/// Placeholder for platforms without an interrupt mechanism
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDispatcher;

impl SignalDispatcher for UnsupportedDispatcher {
    fn can_interrupt(&self) -> bool {
        false
    }

    async fn find_worker(&self, parent_pid: u32) -> Result<Option<u32>> {
        warn!("Cannot look up the worker of {} on this platform", parent_pid);
        Ok(None)
    }

    async fn interrupt(&self, _pid: u32) -> Result<()> {
        Err(Error::UnsupportedPlatform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_never_interrupts() {
        let dispatcher = UnsupportedDispatcher;
        assert!(!dispatcher.can_interrupt());
        assert_eq!(dispatcher.find_worker(42).await.unwrap(), None);
        assert!(matches!(
            dispatcher.interrupt(42).await,
            Err(Error::UnsupportedPlatform)
        ));
    }
}
