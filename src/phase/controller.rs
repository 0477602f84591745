//! The three-phase contract implemented by applications.

use super::info::{EventInfo, TransitionInfo};
use std::error::Error;

/// Domain failure raised from inside a phase.
pub type PhaseError = Box<dyn Error + Send + Sync>;

/// Handler invoked for every transition attempt.
///
/// Phases run strictly in order, each only if the previous one succeeded:
///
/// 1. [`exit_state`](Self::exit_state) may veto by returning `Ok(false)`.
///    The current state is left untouched and nothing else runs.
/// 2. [`transition`](Self::transition) performs the business action. The
///    machine commits the target state only after it returns `Ok`.
/// 3. [`enter_state`](Self::enter_state) runs after the commit and may
///    return a follow-up event to chain.
///
/// An `Err` from any phase skips the remaining phases and surfaces as
/// [`StateMachineError::Phase`](crate::machine::StateMachineError::Phase).
/// A failure in the enter phase does not roll back the commit.
///
/// Every method has a pass-through default.
///
/// # Example
///
/// ```rust
/// use phaselock::phase::{PhaseError, TransitionController, TransitionInfo};
///
/// struct RefuseOnSunday;
///
/// impl TransitionController<bool> for RefuseOnSunday {
///     fn exit_state(&self, info: &TransitionInfo<bool>) -> Result<bool, PhaseError> {
///         Ok(!*info.payload())
///     }
/// }
///
/// let info = TransitionInfo::new("Open", "Closed", "close", true);
/// assert!(!RefuseOnSunday.exit_state(&info).unwrap());
/// ```
pub trait TransitionController<P>: Send + Sync {
    /// Leave the source state. Returning `Ok(false)` cancels the transition.
    fn exit_state(&self, _info: &TransitionInfo<P>) -> Result<bool, PhaseError> {
        Ok(true)
    }

    /// Perform the transition's business action.
    fn transition(&self, _info: &TransitionInfo<P>) -> Result<(), PhaseError> {
        Ok(())
    }

    /// Enter the target state, optionally chaining another event.
    fn enter_state(&self, _info: &TransitionInfo<P>) -> Result<Option<EventInfo<P>>, PhaseError> {
        Ok(None)
    }
}
