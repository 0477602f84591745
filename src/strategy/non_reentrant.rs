//! Exclusive, non-reentrant serialization.

use super::{run_chain, run_step, Step, Strategy, StrategyKind};
use crate::machine::{Outcome, Runtime, StateMachineError};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{trace, warn};

/// One exclusive lock per machine, wrapping the phases and the whole chain.
///
/// The owning thread is recorded so that a second call from the same thread,
/// typically a handler calling back into its own machine, fails with
/// `ReentrantTransitionNotAllowed` instead of deadlocking. Chained follow-up
/// events run inside [`run_chain`]'s loop and never touch the lock again.
pub(crate) struct NonReentrant {
    lock: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

/// Held for the duration of a transition. Clears the owner before the
/// exclusive lock is released.
struct OwnerGuard<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        *self.owner.lock() = None;
    }
}

impl NonReentrant {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    fn acquire<P>(
        &self,
        runtime: &Runtime<P>,
        event: &str,
    ) -> Result<OwnerGuard<'_>, StateMachineError> {
        let me = thread::current().id();

        // Only the owning thread can observe its own id here.
        if *self.owner.lock() == Some(me) {
            let state = runtime.current_state();
            warn!(machine = %runtime.id(), state = %state, event, "rejected reentrant transition");
            return Err(StateMachineError::ReentrantTransitionNotAllowed {
                state,
                event: event.to_owned(),
            });
        }

        trace!(machine = %runtime.id(), event, "waiting for transition lock");
        let lock = self.lock.lock();
        *self.owner.lock() = Some(me);
        trace!(machine = %runtime.id(), event, "transition lock acquired");

        Ok(OwnerGuard {
            owner: &self.owner,
            _lock: lock,
        })
    }

    /// Run a single step under the lock, handing any follow-up back to the
    /// caller instead of chaining it.
    pub(crate) fn process_step<P>(
        &self,
        runtime: &Runtime<P>,
        event: &str,
        payload: P,
    ) -> Result<Step<P>, StateMachineError> {
        let _guard = self.acquire(runtime, event)?;
        run_step(runtime, event, payload)
    }
}

impl<P> Strategy<P> for NonReentrant {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NonReentrant
    }

    fn process_event(
        &self,
        runtime: &Arc<Runtime<P>>,
        event: &str,
        payload: P,
    ) -> Result<Outcome, StateMachineError> {
        let _guard = self.acquire(runtime, event)?;
        run_chain(runtime, event, payload)
    }
}
