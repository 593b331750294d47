//! Session state for the generate/execute/feedback/refine loop.
//!
//! The state machine is split into a pure transition table ([`transition`])
//! and a mutable aggregate ([`SessionState`]) that owns the current
//! question, candidate queries, retained execution error, and the
//! feedback-given flag. Only the orchestration layer mutates it.

mod phase;
mod state;

pub use phase::{transition, Event, Phase};
pub use state::{ExecutionFailure, QuerySlot, SessionState};
