//! The transition phase protocol.
//!
//! Every transition attempt runs three phases against a caller-supplied
//! [`TransitionController`]:
//!
//! - **exit**: may veto the transition
//! - **transition**: the business action, after which the state is committed
//! - **enter**: may chain a follow-up event
//!
//! [`PhaseTable`] implements the contract from closures registered per
//! `(source, target, event, phase)`.

mod controller;
mod info;
mod table;

pub use controller::{PhaseError, TransitionController};
pub use info::{EventInfo, Phase, TransitionInfo};
pub use table::PhaseTable;
