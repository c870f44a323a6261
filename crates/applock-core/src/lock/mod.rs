//! Lock state machine: pure state definitions and transition rules.
//!
//! Runtime concerns (clock reads, storage, crypto, the observable channel)
//! are handled by the application layer; only instants produced there are
//! injected into the transitions.

pub mod machine;
pub mod state;

pub use machine::{LockEvent, LockMachine};
pub use state::LockState;
