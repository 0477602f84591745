//! Runtime state machines.
//!
//! A [`StateMachine`] holds the current state of one logical machine, its
//! shared [`Definition`](crate::core::Definition), the controller running the
//! phases, and the strategy serializing concurrent `process_event` calls.
//!
//! # Key Concepts
//!
//! - **Commit point**: the current state changes right after the transition
//!   phase returns, before the enter phase runs
//! - **Chaining**: a follow-up event returned by the enter phase is processed
//!   next, inline or through the queue depending on the strategy
//! - **Non-atomicity**: a failure in the enter phase leaves the committed
//!   state in place

mod error;
mod handle;
mod runtime;

pub use error::StateMachineError;
pub use handle::{Outcome, StateMachine, WeakStateMachine};

pub(crate) use runtime::{Runtime, RuntimeParts};
