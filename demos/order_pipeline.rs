//! Orders moving through a pipeline on queued machines.
//!
//! Each order gets its own machine with the queued strategy. Submitting an
//! order returns immediately; the enter phase of each stage chains the next
//! one onto the worker's queue until the order is shipped or rejected.
//!
//! Run with `cargo run --example order_pipeline`.

use phaselock::builder::DefinitionTable;
use phaselock::core::StateTransition;
use phaselock::machine::{StateMachine, StateMachineError};
use phaselock::observer::TransitionObserver;
use phaselock::phase::{EventInfo, PhaseError, TransitionController, TransitionInfo};
use phaselock::strategy::{ShutdownMode, StrategyKind};
use std::error::Error;
use std::sync::Arc;
use tracing::{info, warn, Level};
use uuid::Uuid;

const PIPELINE: &str = r#"{
    "states": [
        { "name": "Received", "start": true },
        { "name": "Validated" },
        { "name": "Charged" },
        { "name": "Shipped", "final": true },
        { "name": "Rejected", "final": true }
    ],
    "events": ["validate", "charge", "ship", "reject"],
    "transitions": [
        { "source": "Received", "target": "Validated", "event": "validate" },
        { "source": "Received", "target": "Rejected", "event": "reject" },
        { "source": "Validated", "target": "Charged", "event": "charge" },
        { "source": "Validated", "target": "Rejected", "event": "reject" },
        { "source": "Charged", "target": "Shipped", "event": "ship" }
    ]
}"#;

#[derive(Clone, Debug)]
struct Order {
    id: u32,
    amount: u32,
    in_stock: bool,
}

struct Fulfilment {
    credit_limit: u32,
}

impl TransitionController<Order> for Fulfilment {
    fn exit_state(&self, info: &TransitionInfo<Order>) -> Result<bool, PhaseError> {
        // Out-of-stock orders are never validated.
        Ok(info.event() != "validate" || info.payload().in_stock)
    }

    fn transition(&self, info: &TransitionInfo<Order>) -> Result<(), PhaseError> {
        let order = info.payload();
        if info.event() == "charge" && order.amount > self.credit_limit {
            return Err(format!("order {} exceeds the credit limit", order.id).into());
        }
        info!(order = order.id, transition = %info, "stage done");
        Ok(())
    }

    fn enter_state(
        &self,
        info: &TransitionInfo<Order>,
    ) -> Result<Option<EventInfo<Order>>, PhaseError> {
        let next = match info.target() {
            "Validated" => "charge",
            "Charged" => "ship",
            _ => return Ok(None),
        };
        Ok(Some(EventInfo::new(next, info.payload().clone())))
    }
}

struct Audit;

impl TransitionObserver for Audit {
    fn on_transition(&self, machine: Uuid, record: &StateTransition) {
        info!(%machine, from = %record.from, to = %record.to, "order moved");
    }

    fn on_vetoed(&self, machine: Uuid, source: &str, _target: &str, event: &str) {
        warn!(%machine, source, event, "stage refused");
    }

    fn on_error(&self, machine: Uuid, event: &str, error: &StateMachineError) {
        warn!(%machine, event, %error, "stage failed");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let definition = DefinitionTable::from_json(PIPELINE)?.build()?;
    let controller = Arc::new(Fulfilment { credit_limit: 500 });
    let audit = Arc::new(Audit);

    let orders = [
        Order { id: 1, amount: 120, in_stock: true },
        Order { id: 2, amount: 80, in_stock: false },
        Order { id: 3, amount: 900, in_stock: true },
    ];

    let mut machines = Vec::new();
    for order in orders {
        let machine = StateMachine::<Order>::builder()
            .definition(definition.clone())
            .strategy(StrategyKind::Queued)
            .shared_controller(controller.clone())
            .observer(audit.clone())
            .worker_name(&format!("order-{}", order.id))
            .history(16)
            .build()?;
        let id = order.id;
        machine.process_event("validate", order)?;
        machines.push((id, machine));
    }

    for (id, machine) in &machines {
        machine.shutdown(ShutdownMode::Graceful);
        let path = machine
            .history()
            .map(|history| history.get_path().join(" -> "))
            .unwrap_or_default();
        println!("order {id}: {} [{path}]", machine.current_state());
    }
    Ok(())
}
