//! Errors raised while processing events.

use crate::core::DefinitionError;
use crate::phase::{Phase, PhaseError};
use thiserror::Error;

/// Errors returned by [`StateMachine::process_event`](super::StateMachine::process_event).
#[derive(Debug, Error)]
pub enum StateMachineError {
    /// Unknown event, or no transition for the current state.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("Reentrant transition not allowed: event '{event}' submitted from the thread already transitioning out of '{state}'")]
    ReentrantTransitionNotAllowed { state: String, event: String },

    #[error("{phase} phase failed for event '{event}': {source}")]
    Phase {
        phase: Phase,
        event: String,
        #[source]
        source: PhaseError,
    },

    #[error("State machine is shut down")]
    ShutDown,
}

impl StateMachineError {
    pub(crate) fn phase(phase: Phase, event: &str, source: PhaseError) -> Self {
        Self::Phase {
            phase,
            event: event.to_owned(),
            source,
        }
    }

    /// Whether this is a same-thread reentry rejected by the non-reentrant strategy.
    pub fn is_reentrant(&self) -> bool {
        matches!(self, Self::ReentrantTransitionNotAllowed { .. })
    }
}
