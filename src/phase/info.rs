//! Values passed through the transition phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three phases run for every transition attempt, in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Exit,
    Transition,
    Enter,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Enter => "enter",
        };
        f.write_str(name)
    }
}

/// Input shared by the three phases of a single transition attempt.
///
/// Built once, from the state current when the attempt started, and passed
/// unchanged to exit, transition and enter.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionInfo<P> {
    source: String,
    target: String,
    event: String,
    payload: P,
}

impl<P> TransitionInfo<P> {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        event: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            event: event.into(),
            payload,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Caller-supplied payload given to `process_event`.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Whether source and target are the same state.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl<P> fmt::Display for TransitionInfo<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} -> {}", self.source, self.event, self.target)
    }
}

/// Follow-up event requested by an enter phase.
///
/// Returning one from [`enter_state`](super::TransitionController::enter_state)
/// asks the engine to process `event` next, without the original caller
/// issuing another call.
#[derive(Clone, Debug, PartialEq)]
pub struct EventInfo<P> {
    pub event: String,
    pub payload: P,
}

impl<P> EventInfo<P> {
    pub fn new(event: impl Into<String>, payload: P) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_info_exposes_fields() {
        let info = TransitionInfo::new("A", "B", "go", 7u32);

        assert_eq!(info.source(), "A");
        assert_eq!(info.target(), "B");
        assert_eq!(info.event(), "go");
        assert_eq!(*info.payload(), 7);
        assert!(!info.is_self_loop());
        assert_eq!(info.to_string(), "A + go -> B");
    }

    #[test]
    fn phase_names_are_lowercase() {
        assert_eq!(Phase::Exit.to_string(), "exit");
        assert_eq!(Phase::Transition.to_string(), "transition");
        assert_eq!(Phase::Enter.to_string(), "enter");
    }
}
