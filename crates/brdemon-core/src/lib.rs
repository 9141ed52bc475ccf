//! # brdemon-core - Core Domain Types
//!
//! Foundation crate for Build Runner Demon. Provides domain types, error handling,
//! process event definitions, pubspec inspection, and progress parsing.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ShellCommand`] - `dart` or `flutter` front end used to invoke `build_runner`
//! - [`BuildMode`] - `build` (one-shot) or `watch` (long-lived)
//! - [`WatchState`] - Watch session lifecycle (Idle, Initializing, Watching)
//!
//! ### Events (`events`)
//! - [`ProcessEvent`] - stdout/stderr/exit events of a spawned child
//! - [`ExitOutcome`] - Exit code and terminating signal of a child
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ### Manifest (`manifest`)
//! - [`infer_shell_command()`] - Pick `dart` or `flutter` from `pubspec.yaml`
//! - [`find_project_root()`] - Locate the Dart project around an active path
//!
//! ### Progress (`progress`)
//! - [`parse_progress()`] - Parse `N/M actions completed` into a percentage
//! - [`ProgressTracker`] - Track the last percentage across output chunks
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use brdemon_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod manifest;
pub mod progress;
pub mod types;

/// Prelude for common imports used throughout all Build Runner Demon crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
pub use events::{ExitOutcome, ProcessEvent};
pub use manifest::{
    find_project_root, has_flutter_sdk_dependency, has_pubspec, infer_shell_command,
    parse_pubspec, Pubspec, PUBSPEC_FILENAME,
};
pub use progress::{parse_progress, ProgressTracker, ProgressUpdate};
pub use types::{BuildMode, ShellCommand, WatchState};
