//! Watch session supervision
//!
//! - `state`: the pure transition table
//! - `session`: the owned process handle and its invariant
//! - `supervisor`: toggle/start/stop orchestration against the host

pub mod session;
pub mod state;
pub mod supervisor;

pub use session::WatchSession;
pub use state::{transition, Transition, WatchAction, WatchInput};
pub use supervisor::{ProcessSupervisor, STOPPED_MESSAGE, STOP_FAILED_MESSAGE};
