//! Worker discovery and interrupt delivery
//!
//! Stopping a watch gracefully means sending the `build_runner` worker the
//! equivalent of Ctrl+C so it can clean up its lock files. How that works
//! depends on the platform:
//!
//! - [`PosixDispatcher`] - `SIGINT` to the launcher's child (unix)
//! - [`CompanionDispatcher`] - a downloaded helper attaches to the worker's
//!   console and raises Ctrl+C (Windows)
//! - [`UnsupportedDispatcher`] - no way to interrupt; the host is told so

mod companion;
#[cfg(unix)]
mod posix;
mod unsupported;

pub use companion::CompanionDispatcher;
#[cfg(unix)]
pub use posix::PosixDispatcher;
pub use unsupported::UnsupportedDispatcher;

use brdemon_core::prelude::*;

use crate::companion::CompanionBinary;

/// Finds the worker process beneath a launcher and interrupts it
#[trait_variant::make(SignalDispatcher: Send)]
pub trait LocalSignalDispatcher {
    /// Whether [`interrupt`](Self::interrupt) can work on this platform
    fn can_interrupt(&self) -> bool;

    /// Find the worker among the direct children of `parent_pid`
    async fn find_worker(&self, parent_pid: u32) -> Result<Option<u32>>;

    /// Deliver the interrupt to `pid`
    async fn interrupt(&self, pid: u32) -> Result<()>;
}

/// The dispatcher variant for the running platform, chosen once at startup
pub enum PlatformDispatcher {
    #[cfg(unix)]
    Posix(PosixDispatcher),
    Companion(CompanionDispatcher),
    Unsupported(UnsupportedDispatcher),
}

impl PlatformDispatcher {
    /// Select the native variant; `companion` is only used on Windows
    pub fn detect(companion: CompanionBinary) -> Self {
        let dispatcher = Self::native(companion);
        info!("Using {} signal dispatcher", dispatcher.name());
        dispatcher
    }

    #[cfg(unix)]
    fn native(_companion: CompanionBinary) -> Self {
        PlatformDispatcher::Posix(PosixDispatcher)
    }

    #[cfg(windows)]
    fn native(companion: CompanionBinary) -> Self {
        PlatformDispatcher::Companion(CompanionDispatcher::new(companion))
    }

    #[cfg(not(any(unix, windows)))]
    fn native(_companion: CompanionBinary) -> Self {
        PlatformDispatcher::Unsupported(UnsupportedDispatcher)
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(unix)]
            PlatformDispatcher::Posix(_) => "posix",
            PlatformDispatcher::Companion(_) => "companion",
            PlatformDispatcher::Unsupported(_) => "unsupported",
        }
    }
}

// Both trait variants are in scope here, so the delegating calls are qualified
impl SignalDispatcher for PlatformDispatcher {
    fn can_interrupt(&self) -> bool {
        match self {
            #[cfg(unix)]
            PlatformDispatcher::Posix(d) => SignalDispatcher::can_interrupt(d),
            PlatformDispatcher::Companion(d) => SignalDispatcher::can_interrupt(d),
            PlatformDispatcher::Unsupported(d) => SignalDispatcher::can_interrupt(d),
        }
    }

    async fn find_worker(&self, parent_pid: u32) -> Result<Option<u32>> {
        match self {
            #[cfg(unix)]
            PlatformDispatcher::Posix(d) => SignalDispatcher::find_worker(d, parent_pid).await,
            PlatformDispatcher::Companion(d) => SignalDispatcher::find_worker(d, parent_pid).await,
            PlatformDispatcher::Unsupported(d) => SignalDispatcher::find_worker(d, parent_pid).await,
        }
    }

    async fn interrupt(&self, pid: u32) -> Result<()> {
        match self {
            #[cfg(unix)]
            PlatformDispatcher::Posix(d) => SignalDispatcher::interrupt(d, pid).await,
            PlatformDispatcher::Companion(d) => SignalDispatcher::interrupt(d, pid).await,
            PlatformDispatcher::Unsupported(d) => SignalDispatcher::interrupt(d, pid).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_native_variant() {
        let temp = tempfile::TempDir::new().unwrap();
        let dispatcher = PlatformDispatcher::detect(CompanionBinary::new(
            crate::DEFAULT_COMPANION_URL,
            temp.path(),
        ));

        if cfg!(unix) {
            assert_eq!(dispatcher.name(), "posix");
        } else if cfg!(windows) {
            assert_eq!(dispatcher.name(), "companion");
        } else {
            assert_eq!(dispatcher.name(), "unsupported");
        }
        assert_eq!(
            SignalDispatcher::can_interrupt(&dispatcher),
            cfg!(any(unix, windows))
        );
    }
}
