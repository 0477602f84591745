//! Concurrency strategies.
//!
//! A strategy decides when, and on which thread, the phases of a submitted
//! event run against the machine's single current state.
//!
//! | Strategy       | Runs phases on    | Same-thread reentry          | Chaining         |
//! |----------------|-------------------|------------------------------|------------------|
//! | `NonReentrant` | caller            | rejected                     | inline loop      |
//! | `Reentrant`    | caller            | allowed, runs nested         | inline loop      |
//! | `Queued`       | one worker thread | impossible, calls just queue | appended to FIFO |
//!
//! The synchronous strategies hold one lock per machine across the full
//! exit → transition → enter sequence and any chained events.

mod non_reentrant;
mod queued;
mod reentrant;

use crate::core::DefinitionError;
use crate::machine::{Outcome, Runtime, StateMachineError};
use crate::phase::{EventInfo, Phase, TransitionInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::debug;

pub(crate) use non_reentrant::NonReentrant;
pub(crate) use queued::Queued;
pub(crate) use reentrant::Reentrant;

/// Strategy selected when a machine is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One exclusive lock; same-thread reentry fails fast.
    #[default]
    NonReentrant,

    /// Lock re-entrant by its owning thread. Nested calls recurse, without a
    /// depth limit: unbounded self-triggering exhausting the stack is the
    /// caller's responsibility.
    Reentrant,

    /// Single background worker consuming an unbounded FIFO.
    Queued,
}

impl StrategyKind {
    pub(crate) fn instantiate<P: Send + 'static>(
        self,
        worker_name: &str,
    ) -> io::Result<Box<dyn Strategy<P>>> {
        let strategy: Box<dyn Strategy<P>> = match self {
            Self::NonReentrant => Box::new(NonReentrant::new()),
            Self::Reentrant => Box::new(Reentrant::new()),
            Self::Queued => Box::new(Queued::<P>::new(worker_name)?),
        };
        Ok(strategy)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NonReentrant => "non_reentrant",
            Self::Reentrant => "reentrant",
            Self::Queued => "queued",
        };
        f.write_str(name)
    }
}

/// What happens to queued events on shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Stop accepting new submissions, then process everything already
    /// queued, including follow-ups those events produce.
    #[default]
    Graceful,

    /// Stop accepting new submissions and drop everything not yet started.
    /// The event in flight, if any, still completes.
    Immediate,
}

/// Serialization policy for `process_event`.
pub(crate) trait Strategy<P>: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Process `event`, already known to be a registered event.
    fn process_event(
        &self,
        runtime: &Arc<Runtime<P>>,
        event: &str,
        payload: P,
    ) -> Result<Outcome, StateMachineError>;

    /// Stop accepting work. Returns the number of discarded events.
    fn shutdown(&self, _mode: ShutdownMode) -> usize {
        0
    }
}

/// Result of running the phases for one event.
pub(crate) enum Step<P> {
    Vetoed,
    Committed { follow_up: Option<EventInfo<P>> },
}

/// Run exit, transition and enter for `event` from the current state.
///
/// Callers must hold the strategy's serialization.
pub(crate) fn run_step<P>(
    runtime: &Runtime<P>,
    event: &str,
    payload: P,
) -> Result<Step<P>, StateMachineError> {
    let source = runtime.current_state();
    let target = runtime.definition().get_target_state(&source, event)?;
    let info = TransitionInfo::new(source.as_str(), target, event, payload);
    let controller = runtime.controller();

    debug!(machine = %runtime.id(), transition = %info, "running exit phase");
    let proceed = controller
        .exit_state(&info)
        .map_err(|err| StateMachineError::phase(Phase::Exit, event, err))?;
    if !proceed {
        debug!(machine = %runtime.id(), transition = %info, "transition vetoed");
        runtime.notify_vetoed(&info);
        return Ok(Step::Vetoed);
    }

    debug!(machine = %runtime.id(), transition = %info, "running transition phase");
    controller
        .transition(&info)
        .map_err(|err| StateMachineError::phase(Phase::Transition, event, err))?;

    runtime.commit(&info);

    debug!(machine = %runtime.id(), transition = %info, "running enter phase");
    let follow_up = controller
        .enter_state(&info)
        .map_err(|err| StateMachineError::phase(Phase::Enter, event, err))?;

    Ok(Step::Committed { follow_up })
}

/// Run `event` and every follow-up it chains, in a loop.
///
/// The loop never re-enters the strategy, so a lock held by the caller stays
/// held, and is not acquired again, for the whole chain.
pub(crate) fn run_chain<P>(
    runtime: &Runtime<P>,
    event: &str,
    payload: P,
) -> Result<Outcome, StateMachineError> {
    let mut steps = 0;
    let mut next = Some(EventInfo::new(event, payload));

    while let Some(EventInfo { event, payload }) = next.take() {
        if !runtime.definition().is_event(&event) {
            return Err(DefinitionError::EventNotDefined(event).into());
        }

        match run_step(runtime, &event, payload)? {
            Step::Vetoed if steps == 0 => {
                return Ok(Outcome::Vetoed {
                    state: runtime.current_state(),
                });
            }
            Step::Vetoed => break,
            Step::Committed { follow_up } => {
                steps += 1;
                if let Some(chained) = &follow_up {
                    debug!(
                        machine = %runtime.id(),
                        event = %chained.event,
                        "chaining follow-up event"
                    );
                }
                next = follow_up;
            }
        }
    }

    Ok(Outcome::Transitioned {
        state: runtime.current_state(),
        steps,
    })
}
