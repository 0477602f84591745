//! Builder for running state machines.

use crate::builder::error::BuildError;
use crate::core::Definition;
use crate::machine::{Runtime, RuntimeParts, StateMachine};
use crate::observer::TransitionObserver;
use crate::phase::TransitionController;
use crate::strategy::StrategyKind;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DEFAULT_WORKER_PREFIX: &str = "phaselock-queue";

/// Builder for a [`StateMachine`] with a fluent API.
///
/// A definition and a controller are required. The strategy defaults to
/// [`StrategyKind::NonReentrant`]; history and observer are off unless set.
pub struct MachineBuilder<P> {
    definition: Option<Definition>,
    strategy: StrategyKind,
    controller: Option<Arc<dyn TransitionController<P>>>,
    observer: Option<Arc<dyn TransitionObserver>>,
    history_limit: Option<usize>,
    worker_prefix: String,
}

impl<P> MachineBuilder<P> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            definition: None,
            strategy: StrategyKind::default(),
            controller: None,
            observer: None,
            history_limit: None,
            worker_prefix: DEFAULT_WORKER_PREFIX.to_owned(),
        }
    }

    /// Set the definition (required).
    pub fn definition(mut self, definition: Definition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the controller running the phases (required).
    pub fn controller<C>(mut self, controller: C) -> Self
    where
        C: TransitionController<P> + 'static,
    {
        self.controller = Some(Arc::new(controller));
        self
    }

    /// Set a controller the caller keeps a handle on, typically to hand it a
    /// [`WeakStateMachine`](crate::machine::WeakStateMachine) after the build.
    pub fn shared_controller(mut self, controller: Arc<dyn TransitionController<P>>) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Record committed transitions, keeping at most `limit` of them.
    pub fn history(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Record every committed transition.
    pub fn unbounded_history(mut self) -> Self {
        self.history_limit = Some(usize::MAX);
        self
    }

    /// Prefix of the queue worker's thread name. The machine id is appended.
    pub fn worker_name(mut self, prefix: &str) -> Self {
        self.worker_prefix = prefix.to_owned();
        self
    }
}

impl<P: Send + 'static> MachineBuilder<P> {
    /// Build the machine. For the queued strategy this starts its worker.
    pub fn build(self) -> Result<StateMachine<P>, BuildError> {
        let definition = self.definition.ok_or(BuildError::MissingDefinition)?;
        let start_state = definition
            .start_state()
            .ok_or(BuildError::MissingStartState)?
            .to_owned();
        let controller = self.controller.ok_or(BuildError::MissingController)?;

        let id = Uuid::new_v4();
        let worker_name = format!("{}-{}", self.worker_prefix, id.simple());
        let strategy = self.strategy.instantiate::<P>(&worker_name)?;

        info!(
            machine = %id,
            strategy = %self.strategy,
            start = %start_state,
            "state machine built"
        );

        let runtime = Runtime::new(RuntimeParts {
            id,
            definition: Arc::new(definition),
            start_state,
            controller,
            observer: self.observer,
            history_limit: self.history_limit,
            strategy,
        });
        Ok(StateMachine::from_runtime(runtime))
    }
}

impl<P> Default for MachineBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
