//! Core definition types.
//!
//! This module contains the static side of a state machine:
//! - the `Definition` registry of states, events and transitions
//! - `StateDef` entries owning each state's outgoing transitions
//! - `StateHistory` records of committed transitions
//!
//! Nothing here is synchronized. A definition is built on one thread and then
//! shared read-only by the runtime.

mod definition;
mod error;
mod history;
mod state;

pub use definition::Definition;
pub use error::DefinitionError;
pub use history::{StateHistory, StateTransition};
pub use state::StateDef;
