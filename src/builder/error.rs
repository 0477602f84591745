//! Errors raised while assembling definitions and machines.

use crate::core::DefinitionError;
use std::io;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No definition provided. Call .definition(definition) before .build()")]
    MissingDefinition,

    #[error("Definition has no start state. Register one with define_start_state")]
    MissingStartState,

    #[error("No transition controller provided. Call .controller(controller) before .build()")]
    MissingController,

    #[error("Failed to spawn queue worker: {0}")]
    WorkerSpawn(#[from] io::Error),
}

/// Errors that can occur when loading a [`DefinitionTable`](super::DefinitionTable).
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Malformed definition table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Definition table has {} violation(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<DefinitionError>),
}

impl TableError {
    /// Every violation found, when the table parsed but did not validate.
    pub fn violations(&self) -> &[DefinitionError] {
        match self {
            Self::Invalid(errors) => errors,
            Self::Parse(_) => &[],
        }
    }
}

fn summarize(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
