//! brdemon-app - Watch supervision and build orchestration for Build Runner Demon
//!
//! This crate holds the application layer: configuration loading, the host
//! collaborator trait, the watch state machine with its [`ProcessSupervisor`],
//! one-shot builds with the Dart to Flutter remediation, and working
//! directory resolution.

pub mod build;
pub mod config;
pub mod host;
pub mod resolve;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod watch;

pub use build::{run_build, BuildOutcome, BuildRequest};
pub use config::{load_settings, save_command_choice, Settings};
pub use host::{HostUi, LocalHostUi, NotificationLevel};
pub use resolve::{resolve_working_directory, ProjectRoots};
pub use watch::{transition, ProcessSupervisor, Transition, WatchAction, WatchInput, WatchSession};

// Re-export daemon types used by the binary
pub use brdemon_daemon::{CompanionBinary, PlatformDispatcher, SignalDispatcher, ToolAvailability};
