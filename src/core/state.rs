//! Registered states and their outgoing transitions.

use serde::Serialize;
use std::collections::BTreeMap;

/// A state registered in a [`Definition`](super::Definition).
///
/// Each state owns its outgoing transitions, keyed by event name. A final
/// state never owns any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateDef {
    name: String,
    is_final: bool,
    transitions: BTreeMap<String, String>,
}

impl StateDef {
    pub(crate) fn new(name: impl Into<String>, is_final: bool) -> Self {
        Self {
            name: name.into(),
            is_final,
            transitions: BTreeMap::new(),
        }
    }

    /// Name of the state.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the state is terminal.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Target reached from this state on `event`, if mapped.
    pub fn target(&self, event: &str) -> Option<&str> {
        self.transitions.get(event).map(String::as_str)
    }

    /// Outgoing `(event, target)` pairs, ordered by event name.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.transitions
            .iter()
            .map(|(event, target)| (event.as_str(), target.as_str()))
    }

    /// Map `event` to `target` unless the event is already mapped.
    ///
    /// Returns `true` when the mapping was inserted. The first registration
    /// for an event always wins.
    pub(crate) fn insert_transition(&mut self, event: &str, target: &str) -> bool {
        if self.transitions.contains_key(event) {
            return false;
        }
        self.transitions.insert(event.to_owned(), target.to_owned());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() {
        let mut state = StateDef::new("Idle", false);

        assert!(state.insert_transition("start", "Running"));
        assert!(!state.insert_transition("start", "Stopped"));

        assert_eq!(state.target("start"), Some("Running"));
    }

    #[test]
    fn transitions_are_ordered_by_event() {
        let mut state = StateDef::new("Idle", false);
        state.insert_transition("stop", "Stopped");
        state.insert_transition("run", "Running");

        let events: Vec<_> = state.transitions().map(|(event, _)| event).collect();
        assert_eq!(events, vec!["run", "stop"]);
    }

    #[test]
    fn unknown_event_has_no_target() {
        let state = StateDef::new("Done", true);
        assert!(state.is_final());
        assert_eq!(state.target("anything"), None);
    }
}
