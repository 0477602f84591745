//! Builder API for definitions and machines.
//!
//! - [`DefinitionBuilder`]: fluent, typed registration that stops at the
//!   first error
//! - [`DefinitionTable`]: serde-deserializable description, validated as a
//!   whole so every violation is reported at once
//! - [`MachineBuilder`]: assembles a running [`StateMachine`](crate::machine::StateMachine)
//!   from a definition, a strategy and a controller

pub mod definition;
pub mod error;
pub mod machine;
pub mod table;

pub use definition::DefinitionBuilder;
pub use error::{BuildError, TableError};
pub use machine::MachineBuilder;
pub use table::{DefinitionTable, StateEntry, TransitionEntry};
