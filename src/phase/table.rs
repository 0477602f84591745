//! Table-driven transition controller.

use super::controller::{PhaseError, TransitionController};
use super::info::{EventInfo, Phase, TransitionInfo};
use tracing::trace;

type ExitHandler<P> = Box<dyn Fn(&TransitionInfo<P>) -> Result<bool, PhaseError> + Send + Sync>;
type TransitionHandler<P> = Box<dyn Fn(&TransitionInfo<P>) -> Result<(), PhaseError> + Send + Sync>;
type EnterHandler<P> =
    Box<dyn Fn(&TransitionInfo<P>) -> Result<Option<EventInfo<P>>, PhaseError> + Send + Sync>;

enum Handler<P> {
    Exit(ExitHandler<P>),
    Transition(TransitionHandler<P>),
    Enter(EnterHandler<P>),
}

impl<P> Handler<P> {
    fn phase(&self) -> Phase {
        match self {
            Self::Exit(_) => Phase::Exit,
            Self::Transition(_) => Phase::Transition,
            Self::Enter(_) => Phase::Enter,
        }
    }
}

struct Entry<P> {
    source: String,
    target: String,
    event: String,
    handler: Handler<P>,
}

impl<P> Entry<P> {
    fn matches(&self, info: &TransitionInfo<P>, phase: Phase) -> bool {
        self.handler.phase() == phase
            && self.source == info.source()
            && self.target == info.target()
            && self.event == info.event()
    }
}

/// Controller dispatching each phase to a registered closure.
///
/// Handlers are keyed by `(source, target, event, phase)` and resolved by
/// exact match in registration order: the first matching entry wins. A phase
/// without a handler falls back to the pass-through default (exit allows,
/// transition does nothing, enter chains nothing).
///
/// # Example
///
/// ```rust
/// use phaselock::phase::{EventInfo, PhaseTable, TransitionController, TransitionInfo};
///
/// let table = PhaseTable::<()>::new()
///     .on_exit("A", "B", "go", |_| Ok(true))
///     .on_enter("A", "B", "go", |_| Ok(Some(EventInfo::new("next", ()))));
///
/// let info = TransitionInfo::new("A", "B", "go", ());
/// let follow_up = table.enter_state(&info).unwrap();
/// assert_eq!(follow_up.map(|e| e.event), Some("next".to_string()));
/// ```
pub struct PhaseTable<P> {
    entries: Vec<Entry<P>>,
}

impl<P> PhaseTable<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an exit handler for `source --event--> target`.
    pub fn on_exit<F>(self, source: &str, target: &str, event: &str, handler: F) -> Self
    where
        F: Fn(&TransitionInfo<P>) -> Result<bool, PhaseError> + Send + Sync + 'static,
    {
        self.push(source, target, event, Handler::Exit(Box::new(handler)))
    }

    /// Register a transition handler for `source --event--> target`.
    pub fn on_transition<F>(self, source: &str, target: &str, event: &str, handler: F) -> Self
    where
        F: Fn(&TransitionInfo<P>) -> Result<(), PhaseError> + Send + Sync + 'static,
    {
        self.push(source, target, event, Handler::Transition(Box::new(handler)))
    }

    /// Register an enter handler for `source --event--> target`.
    pub fn on_enter<F>(self, source: &str, target: &str, event: &str, handler: F) -> Self
    where
        F: Fn(&TransitionInfo<P>) -> Result<Option<EventInfo<P>>, PhaseError>
            + Send
            + Sync
            + 'static,
    {
        self.push(source, target, event, Handler::Enter(Box::new(handler)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(mut self, source: &str, target: &str, event: &str, handler: Handler<P>) -> Self {
        self.entries.push(Entry {
            source: source.to_owned(),
            target: target.to_owned(),
            event: event.to_owned(),
            handler,
        });
        self
    }

    fn find(&self, info: &TransitionInfo<P>, phase: Phase) -> Option<&Handler<P>> {
        let handler = self
            .entries
            .iter()
            .find(|entry| entry.matches(info, phase))
            .map(|entry| &entry.handler);

        if handler.is_some() {
            trace!(%phase, transition = %info, "phase handler found");
        }
        handler
    }
}

impl<P> Default for PhaseTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> TransitionController<P> for PhaseTable<P> {
    fn exit_state(&self, info: &TransitionInfo<P>) -> Result<bool, PhaseError> {
        match self.find(info, Phase::Exit) {
            Some(Handler::Exit(handler)) => handler(info),
            _ => Ok(true),
        }
    }

    fn transition(&self, info: &TransitionInfo<P>) -> Result<(), PhaseError> {
        match self.find(info, Phase::Transition) {
            Some(Handler::Transition(handler)) => handler(info),
            _ => Ok(()),
        }
    }

    fn enter_state(&self, info: &TransitionInfo<P>) -> Result<Option<EventInfo<P>>, PhaseError> {
        match self.find(info, Phase::Enter) {
            Some(Handler::Enter(handler)) => handler(info),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn empty_table_passes_through() {
        let table = PhaseTable::<()>::new();
        let info = TransitionInfo::new("A", "B", "go", ());

        assert!(table.is_empty());
        assert!(table.exit_state(&info).unwrap());
        assert!(table.transition(&info).is_ok());
        assert!(table.enter_state(&info).unwrap().is_none());
    }

    #[test]
    fn first_exact_match_wins() {
        let table = PhaseTable::<()>::new()
            .on_exit("A", "B", "go", |_| Ok(false))
            .on_exit("A", "B", "go", |_| Ok(true));

        let info = TransitionInfo::new("A", "B", "go", ());
        assert!(!table.exit_state(&info).unwrap());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn handlers_match_on_every_key_field() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let table = PhaseTable::<()>::new().on_transition("A", "B", "go", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        table
            .transition(&TransitionInfo::new("A", "C", "go", ()))
            .unwrap();
        table
            .transition(&TransitionInfo::new("B", "B", "go", ()))
            .unwrap();
        table
            .transition(&TransitionInfo::new("A", "B", "stop", ()))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        table
            .transition(&TransitionInfo::new("A", "B", "go", ()))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_of_other_phase_is_ignored() {
        let table = PhaseTable::<()>::new().on_exit("A", "B", "go", |_| Ok(false));
        let info = TransitionInfo::new("A", "B", "go", ());

        assert!(table.enter_state(&info).unwrap().is_none());
        assert!(table.transition(&info).is_ok());
    }

    #[test]
    fn handler_errors_propagate() {
        let table = PhaseTable::<u8>::new().on_transition("A", "B", "go", |info| {
            Err(format!("payload {} rejected", info.payload()).into())
        });

        let error = table
            .transition(&TransitionInfo::new("A", "B", "go", 3))
            .unwrap_err();
        assert_eq!(error.to_string(), "payload 3 rejected");
    }
}
