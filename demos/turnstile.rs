//! Coin-operated turnstile driven by a phase table.
//!
//! Run with `cargo run --example turnstile`.

use phaselock::builder::DefinitionBuilder;
use phaselock::machine::StateMachine;
use phaselock::phase::PhaseTable;
use phaselock::strategy::StrategyKind;
use std::error::Error;
use tracing::Level;

const FARE: u32 = 25;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let definition = DefinitionBuilder::new()
        .start_state("Locked")
        .state("Unlocked")
        .event("coin")
        .event("push")
        .transition("Locked", "Unlocked", "coin")
        .transition("Unlocked", "Locked", "push")
        .build()?;
    println!("{definition}");

    let controller = PhaseTable::<u32>::new()
        .on_exit("Locked", "Unlocked", "coin", |info| {
            let paid = *info.payload() >= FARE;
            if !paid {
                println!("  {} cents is not enough", info.payload());
            }
            Ok(paid)
        })
        .on_transition("Locked", "Unlocked", "coin", |info| {
            println!("  accepted {} cents", info.payload());
            Ok(())
        })
        .on_enter("Unlocked", "Locked", "push", |_| {
            println!("  click");
            Ok(None)
        });

    let turnstile = StateMachine::<u32>::builder()
        .definition(definition)
        .strategy(StrategyKind::NonReentrant)
        .controller(controller)
        .history(32)
        .build()?;

    for (event, payload) in [("coin", 10), ("coin", 25), ("push", 0), ("push", 0)] {
        match turnstile.process_event(event, payload) {
            Ok(outcome) => println!("{event}: {outcome:?}"),
            Err(err) => println!("{event}: rejected ({err})"),
        }
    }

    if let Some(history) = turnstile.history() {
        println!("path: {}", history.get_path().join(" -> "));
    }
    Ok(())
}
