//! Phaselock: a three-phase finite state machine engine
//!
//! A machine is described once by a [`Definition`]: named states, named
//! events, and a transition table mapping `(source, event)` to a target. At
//! runtime every event goes through three phases supplied by a
//! [`TransitionController`]:
//!
//! 1. **exit** the source state, which may veto the transition
//! 2. **transition**, the business action; the machine commits the target
//!    state once it succeeds
//! 3. **enter** the target state, which may chain a follow-up event
//!
//! Concurrent `process_event` calls are serialized by one of three
//! strategies, picked per machine with [`StrategyKind`]:
//!
//! - **NonReentrant**: exclusive lock, same-thread reentry fails fast
//! - **Reentrant**: the owning thread may call back into its own machine
//! - **Queued**: events run one by one on a dedicated worker thread
//!
//! # Example
//!
//! ```rust
//! use phaselock::builder::DefinitionBuilder;
//! use phaselock::machine::{Outcome, StateMachine};
//! use phaselock::phase::PhaseTable;
//! use phaselock::strategy::StrategyKind;
//!
//! let definition = DefinitionBuilder::new()
//!     .start_state("Locked")
//!     .state("Unlocked")
//!     .event("coin")
//!     .event("push")
//!     .transition("Locked", "Unlocked", "coin")
//!     .transition("Unlocked", "Locked", "push")
//!     .build()
//!     .unwrap();
//!
//! let controller = PhaseTable::<u32>::new()
//!     .on_exit("Locked", "Unlocked", "coin", |info| Ok(*info.payload() >= 25));
//!
//! let machine: StateMachine<u32> =
//!     StateMachine::new(definition, StrategyKind::NonReentrant, controller).unwrap();
//!
//! assert!(machine.process_event("coin", 10).unwrap().is_vetoed());
//! assert_eq!(
//!     machine.process_event("coin", 25).unwrap(),
//!     Outcome::Transitioned { state: "Unlocked".to_string(), steps: 1 }
//! );
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod observer;
pub mod phase;
pub mod strategy;

// Re-export commonly used types
pub use builder::{BuildError, DefinitionBuilder, DefinitionTable, MachineBuilder, TableError};
pub use core::{Definition, DefinitionError, StateHistory, StateTransition};
pub use machine::{Outcome, StateMachine, StateMachineError, WeakStateMachine};
pub use observer::TransitionObserver;
pub use phase::{EventInfo, PhaseError, PhaseTable, TransitionController, TransitionInfo};
pub use strategy::{ShutdownMode, StrategyKind};
