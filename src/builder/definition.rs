//! Fluent construction of a [`Definition`].

use crate::core::{Definition, DefinitionError};

struct StateDecl {
    name: String,
    is_start: bool,
    is_final: bool,
}

/// Collects states, events and transitions, then registers them in one go.
///
/// Registration happens in `build`, states first, then events, then
/// transitions, so declarations may come in any order. The first error stops
/// the build.
///
/// # Example
///
/// ```rust
/// use phaselock::builder::DefinitionBuilder;
///
/// let definition = DefinitionBuilder::new()
///     .start_state("Locked")
///     .state("Unlocked")
///     .event("coin")
///     .event("push")
///     .transition("Locked", "Unlocked", "coin")
///     .transition("Unlocked", "Locked", "push")
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.list_events_for("Locked"), vec!["coin"]);
/// ```
#[derive(Default)]
pub struct DefinitionBuilder {
    states: Vec<StateDecl>,
    events: Vec<String>,
    transitions: Vec<(String, String, String)>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the start state.
    pub fn start_state(self, name: &str) -> Self {
        self.with_state(name, true, false)
    }

    /// Declare an ordinary state.
    pub fn state(self, name: &str) -> Self {
        self.with_state(name, false, false)
    }

    /// Declare a final state. No transition may leave it.
    pub fn final_state(self, name: &str) -> Self {
        self.with_state(name, false, true)
    }

    pub fn event(mut self, name: &str) -> Self {
        self.events.push(name.to_owned());
        self
    }

    /// Declare `source --event--> target`.
    pub fn transition(mut self, source: &str, target: &str, event: &str) -> Self {
        self.transitions
            .push((source.to_owned(), target.to_owned(), event.to_owned()));
        self
    }

    /// Register everything and return the definition.
    pub fn build(self) -> Result<Definition, DefinitionError> {
        let mut definition = Definition::new();

        for state in &self.states {
            definition.define_state(&state.name, state.is_start, state.is_final)?;
        }
        for event in &self.events {
            definition.define_event(event)?;
        }
        for (source, target, event) in &self.transitions {
            definition.define_transition(source, target, event)?;
        }

        Ok(definition)
    }

    fn with_state(mut self, name: &str, is_start: bool, is_final: bool) -> Self {
        self.states.push(StateDecl {
            name: name.to_owned(),
            is_start,
            is_final,
        });
        self
    }
}
