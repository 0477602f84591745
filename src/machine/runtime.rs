//! Shared state behind every `StateMachine` handle.

use crate::core::{Definition, StateHistory, StateTransition};
use crate::machine::{Outcome, StateMachineError};
use crate::observer::TransitionObserver;
use crate::phase::{TransitionController, TransitionInfo};
use crate::strategy::{ShutdownMode, Strategy, StrategyKind};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Runtime instance of one logical machine.
///
/// `current` is the only mutable shared state. It is written exclusively by
/// the active strategy, under that strategy's serialization, and read through
/// the lock so readers never see a partial value.
pub(crate) struct Runtime<P> {
    id: Uuid,
    definition: Arc<Definition>,
    current: RwLock<String>,
    controller: Arc<dyn TransitionController<P>>,
    observer: Option<Arc<dyn TransitionObserver>>,
    history: Option<Mutex<StateHistory>>,
    strategy: Box<dyn Strategy<P>>,
}

pub(crate) struct RuntimeParts<P> {
    pub id: Uuid,
    pub definition: Arc<Definition>,
    pub start_state: String,
    pub controller: Arc<dyn TransitionController<P>>,
    pub observer: Option<Arc<dyn TransitionObserver>>,
    pub history_limit: Option<usize>,
    pub strategy: Box<dyn Strategy<P>>,
}

impl<P> Runtime<P> {
    pub(crate) fn new(parts: RuntimeParts<P>) -> Self {
        Self {
            id: parts.id,
            definition: parts.definition,
            current: RwLock::new(parts.start_state),
            controller: parts.controller,
            observer: parts.observer,
            history: parts
                .history_limit
                .map(|limit| Mutex::new(StateHistory::with_limit(limit))),
            strategy: parts.strategy,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn definition(&self) -> &Definition {
        &self.definition
    }

    pub(crate) fn controller(&self) -> &dyn TransitionController<P> {
        self.controller.as_ref()
    }

    pub(crate) fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub(crate) fn current_state(&self) -> String {
        self.current.read().clone()
    }

    pub(crate) fn history(&self) -> Option<StateHistory> {
        self.history.as_ref().map(|history| history.lock().clone())
    }

    /// Hand an event to the active strategy.
    pub(crate) fn dispatch(
        self: &Arc<Self>,
        event: &str,
        payload: P,
    ) -> Result<Outcome, StateMachineError> {
        self.strategy.process_event(self, event, payload)
    }

    pub(crate) fn shutdown(&self, mode: ShutdownMode) -> usize {
        self.strategy.shutdown(mode)
    }

    /// Make `info.target()` the current state.
    ///
    /// Only called by strategies, after the transition phase returned.
    pub(crate) fn commit(&self, info: &TransitionInfo<P>) {
        *self.current.write() = info.target().to_owned();
        debug!(machine = %self.id, transition = %info, "transition committed");

        if self.history.is_none() && self.observer.is_none() {
            return;
        }

        let record = StateTransition {
            from: info.source().to_owned(),
            to: info.target().to_owned(),
            event: info.event().to_owned(),
            timestamp: Utc::now(),
        };
        if let Some(history) = &self.history {
            history.lock().record(record.clone());
        }
        if let Some(observer) = &self.observer {
            observer.on_transition(self.id, &record);
        }
    }

    pub(crate) fn notify_vetoed(&self, info: &TransitionInfo<P>) {
        if let Some(observer) = &self.observer {
            observer.on_vetoed(self.id, info.source(), info.target(), info.event());
        }
    }

    pub(crate) fn notify_error(&self, event: &str, error: &StateMachineError) {
        if let Some(observer) = &self.observer {
            observer.on_error(self.id, event, error);
        }
    }
}
