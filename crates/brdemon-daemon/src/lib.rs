//! # brdemon-daemon - build_runner Process Management
//!
//! Spawns and supervises `dart`/`flutter` child processes running
//! `build_runner`, finds the real worker process beneath the launcher, and
//! delivers interrupt signals to it on every supported platform.
//!
//! Depends on [`brdemon_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Process Management
//! - [`BuildRunnerCommand`] - Argument list and executable for one invocation
//! - [`BuildRunnerProcess`] - Spawn a child and stream its [`ProcessEvent`]s
//! - [`BuildTranscript`] - Collect stdout/stderr of a one-shot build
//!
//! ### Worker Discovery & Signalling
//! - [`SignalDispatcher`] - Find the worker and interrupt it
//! - [`PlatformDispatcher`] - The dispatcher variant for this platform
//! - [`CompanionBinary`] - Download-once helper that delivers Ctrl+C on Windows
//! - [`process_table`] - Structured process-table snapshots
//!
//! ### Tooling
//! - [`ToolAvailability`] - Resolve `dart` / `flutter` executables
//!
//! [`ProcessEvent`]: brdemon_core::ProcessEvent

pub mod command;
pub mod companion;
pub mod process;
pub mod process_table;
pub mod signal;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod tool_availability;
pub mod transcript;

// Public API re-exports
pub use command::BuildRunnerCommand;
pub use companion::{CompanionBinary, COMPANION_FILENAME, DEFAULT_COMPANION_URL};
pub use process::BuildRunnerProcess;
pub use process_table::{select_worker, ProcessEntry, WorkerFilter};
#[cfg(unix)]
pub use signal::PosixDispatcher;
pub use signal::{
    CompanionDispatcher, LocalSignalDispatcher, PlatformDispatcher, SignalDispatcher,
    UnsupportedDispatcher,
};
pub use tool_availability::ToolAvailability;
pub use transcript::BuildTranscript;
