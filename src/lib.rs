//! Build Runner Demon
//!
//! Binary-side hosts for the `brdemon` CLI: the NDJSON `serve` protocol used
//! by editor extensions and the interactive terminal host.

pub mod headless;
pub mod terminal;

// Re-export main entry points
pub use headless::runner::run_serve;
pub use terminal::{run_build_once, run_watch, TerminalHost};
