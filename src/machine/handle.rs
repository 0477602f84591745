//! Public handle over a runtime instance.

use crate::builder::{BuildError, MachineBuilder};
use crate::core::{Definition, DefinitionError, StateHistory};
use crate::machine::runtime::Runtime;
use crate::machine::StateMachineError;
use crate::phase::TransitionController;
use crate::strategy::{ShutdownMode, StrategyKind};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Result of a successful `process_event` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// At least one transition was committed.
    ///
    /// `state` is where the chain of follow-up events ended and `steps` the
    /// number of transitions committed along the way.
    Transitioned { state: String, steps: usize },

    /// The exit phase refused the transition; `state` is unchanged.
    Vetoed { state: String },

    /// Accepted by the queued strategy. Transitions run later, in
    /// `sequence` order.
    Enqueued { sequence: u64 },
}

impl Outcome {
    /// State reached or kept, when known at return time.
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Transitioned { state, .. } | Self::Vetoed { state } => Some(state),
            Self::Enqueued { .. } => None,
        }
    }

    pub fn is_vetoed(&self) -> bool {
        matches!(self, Self::Vetoed { .. })
    }
}

/// A running state machine.
///
/// Cloning is cheap: clones share the same runtime, current state and
/// strategy. Controllers that need to submit events back to their own machine
/// should hold a [`WeakStateMachine`] to avoid a reference cycle.
///
/// # Example
///
/// ```rust
/// use phaselock::builder::DefinitionBuilder;
/// use phaselock::machine::{Outcome, StateMachine};
/// use phaselock::phase::PhaseTable;
/// use phaselock::strategy::StrategyKind;
///
/// let definition = DefinitionBuilder::new()
///     .start_state("A")
///     .state("B")
///     .event("go")
///     .transition("A", "B", "go")
///     .build()
///     .unwrap();
///
/// let machine: StateMachine<()> =
///     StateMachine::new(definition, StrategyKind::NonReentrant, PhaseTable::new()).unwrap();
///
/// let outcome = machine.process_event("go", ()).unwrap();
/// assert_eq!(outcome, Outcome::Transitioned { state: "B".to_string(), steps: 1 });
/// assert_eq!(machine.current_state(), "B");
/// ```
pub struct StateMachine<P = ()> {
    runtime: Arc<Runtime<P>>,
}

impl<P: Send + 'static> StateMachine<P> {
    /// Start building a machine.
    pub fn builder() -> MachineBuilder<P> {
        MachineBuilder::new()
    }

    /// Build a machine from a definition, a strategy and a controller.
    pub fn new<C>(
        definition: Definition,
        strategy: StrategyKind,
        controller: C,
    ) -> Result<Self, BuildError>
    where
        C: TransitionController<P> + 'static,
    {
        MachineBuilder::new()
            .definition(definition)
            .strategy(strategy)
            .controller(controller)
            .build()
    }

    pub(crate) fn from_runtime(runtime: Runtime<P>) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }

    /// Submit `event` with `payload`.
    ///
    /// Unknown events are rejected on the calling thread whatever the
    /// strategy. What happens next is up to the strategy: the synchronous
    /// strategies run the whole chain before returning, the queued strategy
    /// returns [`Outcome::Enqueued`] immediately.
    pub fn process_event(&self, event: &str, payload: P) -> Result<Outcome, StateMachineError> {
        if !self.runtime.definition().is_event(event) {
            return Err(DefinitionError::EventNotDefined(event.to_owned()).into());
        }
        self.runtime.dispatch(event, payload)
    }

    /// Stop the machine's strategy. Returns the number of discarded events.
    ///
    /// Only the queued strategy holds pending work; the synchronous
    /// strategies have nothing to stop and return `0`.
    pub fn shutdown(&self, mode: ShutdownMode) -> usize {
        self.runtime.shutdown(mode)
    }
}

impl<P> StateMachine<P> {
    /// Last committed state.
    pub fn current_state(&self) -> String {
        self.runtime.current_state()
    }

    /// Whether the current state is final.
    pub fn is_final(&self) -> bool {
        let current = self.runtime.current_state();
        self.runtime
            .definition()
            .state(&current)
            .is_some_and(|state| state.is_final())
    }

    pub fn definition(&self) -> &Definition {
        self.runtime.definition()
    }

    pub fn id(&self) -> Uuid {
        self.runtime.id()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.runtime.strategy_kind()
    }

    /// Snapshot of the committed transitions, when history is enabled.
    pub fn history(&self) -> Option<StateHistory> {
        self.runtime.history()
    }

    pub fn downgrade(&self) -> WeakStateMachine<P> {
        WeakStateMachine {
            runtime: Arc::downgrade(&self.runtime),
        }
    }
}

impl<P> Clone for StateMachine<P> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<P> fmt::Debug for StateMachine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.runtime.id())
            .field("current", &self.runtime.current_state())
            .field("strategy", &self.runtime.strategy_kind())
            .finish()
    }
}

/// Non-owning reference to a [`StateMachine`].
pub struct WeakStateMachine<P = ()> {
    runtime: Weak<Runtime<P>>,
}

impl<P> WeakStateMachine<P> {
    /// The machine, if any handle is still alive.
    pub fn upgrade(&self) -> Option<StateMachine<P>> {
        self.runtime
            .upgrade()
            .map(|runtime| StateMachine { runtime })
    }
}

impl<P> Clone for WeakStateMachine<P> {
    fn clone(&self) -> Self {
        Self {
            runtime: Weak::clone(&self.runtime),
        }
    }
}
