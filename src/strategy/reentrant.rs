//! Serialization re-entrant by the owning thread.

use super::{run_chain, Strategy, StrategyKind};
use crate::machine::{Outcome, Runtime, StateMachineError};
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::sync::Arc;
use tracing::trace;

/// One lock per machine that its owning thread may take again.
///
/// A handler may call `process_event` on its own machine from any phase. The
/// nested call runs to completion, chain included, before the handler
/// continues. Nothing bounds the nesting depth.
pub(crate) struct Reentrant {
    lock: ReentrantMutex<Cell<usize>>,
}

impl Reentrant {
    pub(crate) fn new() -> Self {
        Self {
            lock: ReentrantMutex::new(Cell::new(0)),
        }
    }
}

impl<P> Strategy<P> for Reentrant {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Reentrant
    }

    fn process_event(
        &self,
        runtime: &Arc<Runtime<P>>,
        event: &str,
        payload: P,
    ) -> Result<Outcome, StateMachineError> {
        let depth = self.lock.lock();
        depth.set(depth.get() + 1);
        trace!(machine = %runtime.id(), event, depth = depth.get(), "transition lock acquired");

        let result = run_chain(runtime, event, payload);

        depth.set(depth.get() - 1);
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::DefinitionBuilder;
    use crate::core::Definition;
    use crate::machine::{Outcome, StateMachine, WeakStateMachine};
    use crate::phase::{EventInfo, PhaseError, TransitionController, TransitionInfo};
    use crate::strategy::StrategyKind;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, OnceLock};

    fn ring() -> Definition {
        DefinitionBuilder::new()
            .start_state("A")
            .state("B")
            .state("C")
            .event("next")
            .transition("A", "B", "next")
            .transition("B", "C", "next")
            .transition("C", "A", "next")
            .build()
            .unwrap()
    }

    /// Records phase entries and nests one call from the first transition phase.
    struct Nesting {
        machine: OnceLock<WeakStateMachine<()>>,
        nested: AtomicBool,
        log: Mutex<Vec<String>>,
    }

    impl TransitionController<()> for Nesting {
        fn transition(&self, info: &TransitionInfo<()>) -> Result<(), PhaseError> {
            self.log.lock().push(format!("transition {info}"));
            if info.source() == "A" && !self.nested.swap(true, Ordering::SeqCst) {
                let machine = self
                    .machine
                    .get()
                    .and_then(WeakStateMachine::upgrade)
                    .ok_or("machine dropped")?;
                let nested = machine.process_event("next", ())?;
                self.log.lock().push(format!("nested {nested:?}"));
            }
            Ok(())
        }
    }

    #[test]
    fn nested_call_from_transition_phase_runs_inline() {
        let controller = Arc::new(Nesting {
            machine: OnceLock::new(),
            nested: AtomicBool::new(false),
            log: Mutex::new(Vec::new()),
        });
        let machine = StateMachine::<()>::builder()
            .definition(ring())
            .strategy(StrategyKind::Reentrant)
            .shared_controller(controller.clone())
            .build()
            .unwrap();
        controller.machine.set(machine.downgrade()).ok();

        let outcome = machine.process_event("next", ()).unwrap();

        // The nested call ran from A (the outer transition had not committed
        // yet), then the outer transition committed its own target.
        assert_eq!(outcome.state(), Some("B"));
        let log = controller.log.lock();
        assert_eq!(
            *log,
            vec![
                "transition A + next -> B".to_string(),
                "transition A + next -> B".to_string(),
                "nested Transitioned { state: \"B\", steps: 1 }".to_string(),
            ]
        );
    }

    #[test]
    fn chained_events_run_before_returning() {
        struct Twice;

        impl TransitionController<()> for Twice {
            fn enter_state(
                &self,
                info: &TransitionInfo<()>,
            ) -> Result<Option<EventInfo<()>>, PhaseError> {
                Ok((info.target() != "C").then(|| EventInfo::new("next", ())))
            }
        }

        let machine = StateMachine::<()>::new(ring(), StrategyKind::Reentrant, Twice).unwrap();

        assert_eq!(
            machine.process_event("next", ()).unwrap(),
            Outcome::Transitioned {
                state: "C".to_string(),
                steps: 2
            }
        );
    }
}
