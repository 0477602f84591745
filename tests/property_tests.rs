//! Property-based tests for definitions and runtime strategies.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use parking_lot::Mutex;
use phaselock::builder::DefinitionBuilder;
use phaselock::core::{Definition, StateHistory, StateTransition};
use phaselock::machine::{Outcome, StateMachine};
use phaselock::phase::{PhaseError, TransitionController, TransitionInfo};
use phaselock::strategy::{ShutdownMode, StrategyKind};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const TARGETS: [&str; 4] = ["B", "C", "D", "E"];

fn self_loop() -> Definition {
    DefinitionBuilder::new()
        .start_state("A")
        .state("B")
        .event("x")
        .event("flip")
        .event("flop")
        .transition("A", "A", "x")
        .transition("A", "B", "flip")
        .transition("B", "A", "flop")
        .build()
        .unwrap()
}

/// Counter updated with a separate read and write, so that unserialized
/// callers would lose updates.
#[derive(Default)]
struct RacyCounter {
    value: Mutex<u64>,
}

impl TransitionController<()> for RacyCounter {
    fn transition(&self, _info: &TransitionInfo<()>) -> Result<(), PhaseError> {
        let current = *self.value.lock();
        thread::yield_now();
        *self.value.lock() = current + 1;
        Ok(())
    }
}

/// Vetoes according to the payload and counts phase calls.
#[derive(Default)]
struct VetoByPayload {
    exits: AtomicUsize,
    transitions: AtomicUsize,
    enters: AtomicUsize,
}

impl TransitionController<bool> for VetoByPayload {
    fn exit_state(&self, info: &TransitionInfo<bool>) -> Result<bool, PhaseError> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(*info.payload())
    }

    fn transition(&self, _info: &TransitionInfo<bool>) -> Result<(), PhaseError> {
        self.transitions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn enter_state(
        &self,
        _info: &TransitionInfo<bool>,
    ) -> Result<Option<phaselock::phase::EventInfo<bool>>, PhaseError> {
        self.enters.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

/// Records payloads in the order the worker runs them.
#[derive(Default)]
struct Order {
    seen: Mutex<Vec<(usize, usize)>>,
}

impl TransitionController<(usize, usize)> for Order {
    fn transition(&self, info: &TransitionInfo<(usize, usize)>) -> Result<(), PhaseError> {
        self.seen.lock().push(*info.payload());
        Ok(())
    }
}

proptest! {
    #[test]
    fn first_registered_transition_wins(order in proptest::collection::vec(0..4usize, 1..8)) {
        let mut definition = Definition::new();
        definition.define_start_state("A").unwrap();
        for target in TARGETS {
            definition.define_state(target, false, false).unwrap();
        }
        definition.define_event("go").unwrap();

        let mut inserted = Vec::new();
        for &index in &order {
            inserted.push(definition.define_transition("A", TARGETS[index], "go").unwrap());
        }

        prop_assert_eq!(definition.get_target_state("A", "go").unwrap(), TARGETS[order[0]]);
        prop_assert!(inserted[0]);
        prop_assert!(inserted[1..].iter().all(|fresh| !fresh));
    }

    #[test]
    fn history_keeps_newest_within_limit(count in 0..40usize, limit in 1..10usize) {
        let mut history = StateHistory::with_limit(limit);
        for step in 0..count {
            history.record(StateTransition {
                from: format!("S{step}"),
                to: format!("S{}", step + 1),
                event: "next".to_string(),
                timestamp: Utc::now(),
            });
        }

        prop_assert_eq!(history.len(), count.min(limit));
        if count > 0 {
            let expected = format!("S{count}");
            prop_assert_eq!(history.last().map(|t| t.to.as_str()), Some(expected.as_str()));
        }
    }

    #[test]
    fn exit_veto_leaves_state_and_later_phases_untouched(
        decisions in proptest::collection::vec(any::<bool>(), 1..20)
    ) {
        let controller = Arc::new(VetoByPayload::default());
        let machine = StateMachine::<bool>::builder()
            .definition(self_loop())
            .shared_controller(controller.clone())
            .build()
            .unwrap();

        let mut expected = "A";
        for &allow in &decisions {
            let event = if expected == "A" { "flip" } else { "flop" };
            let outcome = machine.process_event(event, allow).unwrap();
            if allow {
                expected = if expected == "A" { "B" } else { "A" };
            } else {
                prop_assert_eq!(outcome, Outcome::Vetoed { state: expected.to_string() });
            }
            prop_assert_eq!(machine.current_state(), expected);
        }

        let allowed = decisions.iter().filter(|allow| **allow).count();
        prop_assert_eq!(controller.exits.load(Ordering::SeqCst), decisions.len());
        prop_assert_eq!(controller.transitions.load(Ordering::SeqCst), allowed);
        prop_assert_eq!(controller.enters.load(Ordering::SeqCst), allowed);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn non_reentrant_callers_never_lose_updates(threads in 1..6usize, per_thread in 1..25usize) {
        let controller = Arc::new(RacyCounter::default());
        let machine = StateMachine::<()>::builder()
            .definition(self_loop())
            .strategy(StrategyKind::NonReentrant)
            .shared_controller(controller.clone())
            .build()
            .unwrap();

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let machine = machine.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        machine.process_event("x", ()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        prop_assert_eq!(*controller.value.lock(), (threads * per_thread) as u64);
        prop_assert_eq!(machine.current_state(), "A");
    }

    #[test]
    fn queued_events_run_in_sequence_order(producers in 1..5usize, per_producer in 1..20usize) {
        let controller = Arc::new(Order::default());
        let machine = StateMachine::<(usize, usize)>::builder()
            .definition(self_loop())
            .strategy(StrategyKind::Queued)
            .shared_controller(controller.clone())
            .build()
            .unwrap();

        let handles: Vec<_> = (0..producers)
            .map(|producer| {
                let machine = machine.clone();
                thread::spawn(move || {
                    (0..per_producer)
                        .map(|index| match machine.process_event("x", (producer, index)) {
                            Ok(Outcome::Enqueued { sequence }) => (sequence, (producer, index)),
                            other => panic!("unexpected outcome: {other:?}"),
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut stamped = Vec::new();
        for handle in handles {
            stamped.extend(handle.join().unwrap());
        }
        prop_assert_eq!(machine.shutdown(ShutdownMode::Graceful), 0);

        stamped.sort_by_key(|(sequence, _)| *sequence);
        let expected: Vec<_> = stamped.into_iter().map(|(_, payload)| payload).collect();
        prop_assert_eq!(&*controller.seen.lock(), &expected);
    }
}
