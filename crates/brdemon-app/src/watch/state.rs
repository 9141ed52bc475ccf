//! Watch state transitions
//!
//! Every state change of a watch session goes through [`transition`], which
//! returns the next state and the side effect the supervisor must perform.
//! Keeping it free of I/O makes the whole lifecycle testable as a table.

use brdemon_core::WatchState;

/// Something that happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchInput {
    /// User pressed the watch toggle
    Toggle,
    /// The watch process was spawned
    Spawned,
    /// A stdout chunk arrived
    Output,
    /// The process exited, or a stop was confirmed
    Closed,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Resolve the project and spawn the watch
    Start,
    /// Interrupt the worker and wait for the exit
    Stop,
    /// Push the new state to the host's status indicator
    PublishStatus,
}

/// Result of applying an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: WatchState,
    pub action: Option<WatchAction>,
}

impl Transition {
    fn stay(state: WatchState) -> Self {
        Self {
            next: state,
            action: None,
        }
    }

    fn to(next: WatchState, action: WatchAction) -> Self {
        Self {
            next,
            action: Some(action),
        }
    }
}

/// The watch lifecycle table
///
/// `Toggle` never changes the state by itself: `Start` only becomes
/// `Initializing` once the spawn succeeded (`Spawned`), and `Stop` only
/// becomes `Idle` once the exit is observed (`Closed`). A toggle while
/// `Initializing` is ignored.
pub fn transition(state: WatchState, input: WatchInput) -> Transition {
    use WatchInput::*;
    use WatchState::*;

    match (state, input) {
        (Idle, Toggle) => Transition::to(Idle, WatchAction::Start),
        (Watching, Toggle) => Transition::to(Watching, WatchAction::Stop),
        (Initializing, Toggle) => Transition::stay(Initializing),

        (Idle, Spawned) => Transition::to(Initializing, WatchAction::PublishStatus),
        (current, Spawned) => Transition::stay(current),

        (Initializing, Output) => Transition::to(Watching, WatchAction::PublishStatus),
        (current, Output) => Transition::stay(current),

        (Idle, Closed) => Transition::stay(Idle),
        (_, Closed) => Transition::to(Idle, WatchAction::PublishStatus),
    }
}
