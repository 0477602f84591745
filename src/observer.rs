//! Lifecycle callbacks for a running machine.
//!
//! Observers see every committed transition, every veto, and every failure
//! the queued worker swallows. The queued strategy returns to the caller
//! before the transition runs, so an observer is the only place its failures
//! can be handled by the application.

use crate::core::StateTransition;
use crate::machine::StateMachineError;
use uuid::Uuid;

/// Receives notifications from a [`StateMachine`](crate::machine::StateMachine).
///
/// Callbacks run on the thread executing the transition, while the
/// machine's serialization is held. They must not block for long and must not
/// submit events to the same machine under the non-reentrant strategy.
pub trait TransitionObserver: Send + Sync {
    /// A transition was committed.
    fn on_transition(&self, _machine: Uuid, _record: &StateTransition) {}

    /// The exit phase refused `source --event--> target`.
    fn on_vetoed(&self, _machine: Uuid, _source: &str, _target: &str, _event: &str) {}

    /// Processing `event` failed on the queued worker.
    fn on_error(&self, _machine: Uuid, _event: &str, _error: &StateMachineError) {}
}
