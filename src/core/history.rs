//! Committed transition history.
//!
//! A machine built with a history limit records every committed transition
//! here, oldest records being evicted first once the limit is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use phaselock::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: "Pending".to_string(),
///     to: "Running".to_string(),
///     event: "start".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, "Running");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being transitioned from
    pub from: String,
    /// The state being transitioned to
    pub to: String,
    /// The event that caused the transition
    pub event: String,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, optionally bounded history of committed transitions.
///
/// # Example
///
/// ```rust
/// use phaselock::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition {
///     from: "Start".to_string(),
///     to: "Middle".to_string(),
///     event: "next".to_string(),
///     timestamp: Utc::now(),
/// });
/// history.record(StateTransition {
///     from: "Middle".to_string(),
///     to: "End".to_string(),
///     event: "next".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec!["Start", "Middle", "End"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create an unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history keeping at most `limit` records.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    /// Append a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == Some(0) {
            return;
        }
        if let Some(limit) = self.limit {
            while self.transitions.len() >= limit {
                self.transitions.pop_front();
            }
        }
        self.transitions.push_back(transition);
    }

    /// States traversed: the first recorded source, then every target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last recorded transitions.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(from: &str, to: &str) -> StateTransition {
        StateTransition {
            from: from.to_string(),
            to: to.to_string(),
            event: "next".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut history = StateHistory::new();
        history.record(step("Initial", "Processing"));
        history.record(step("Processing", "Complete"));

        assert_eq!(history.get_path(), vec!["Initial", "Processing", "Complete"]);
        assert_eq!(history.last().map(|t| t.to.as_str()), Some("Complete"));
    }

    #[test]
    fn limit_evicts_oldest_records() {
        let mut history = StateHistory::with_limit(2);
        history.record(step("A", "B"));
        history.record(step("B", "C"));
        history.record(step("C", "D"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get_path(), vec!["B", "C", "D"]);
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut history = StateHistory::with_limit(0);
        history.record(step("A", "B"));
        assert!(history.is_empty());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::new();
        history.record(step("Initial", "Processing"));

        std::thread::sleep(Duration::from_millis(10));
        history.record(step("Processing", "Complete"));

        let duration = history.duration().unwrap();
        assert!(duration >= Duration::from_millis(10));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::with_limit(8);
        history.record(step("Initial", "Processing"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history.len(), deserialized.len());
        assert_eq!(history.last(), deserialized.last());
    }
}
