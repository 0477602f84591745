//! Errors raised while registering or querying a machine definition.

use thiserror::Error;

/// Errors that can occur when building or querying a [`Definition`](super::Definition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("State '{0}' already defined")]
    StateAlreadyDefined(String),

    #[error("Event '{0}' already defined")]
    EventAlreadyDefined(String),

    #[error("State '{0}' not defined")]
    StateNotDefined(String),

    #[error("Event '{0}' not defined")]
    EventNotDefined(String),

    #[error("Transition from state '{state}' with event '{event}' not defined")]
    TransitionNotDefined { state: String, event: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}
