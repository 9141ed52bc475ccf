//! Configuration for Build Runner Demon
//!
//! Settings live in `.brdemon/config.toml` at the project (or workspace)
//! root. They are loaded once per invocation; `serve` mode swaps the whole
//! snapshot when the user switches front ends.

pub mod settings;
pub mod types;
pub mod writer;

pub use settings::{apply_env_overrides, config_path, load_settings, CONFIG_DIR, CONFIG_FILENAME};
pub use types::*;
pub use writer::save_command_choice;
