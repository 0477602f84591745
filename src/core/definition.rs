//! Registry of states, events and transitions.

use super::error::DefinitionError;
use super::state::StateDef;
use crate::builder::{DefinitionTable, TableError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// The static description of a state machine.
///
/// A definition is mutated only while it is being built, on a single thread.
/// Once handed to a [`StateMachine`](crate::machine::StateMachine) it is shared
/// read-only and needs no synchronization.
///
/// Invariants upheld by the registration methods:
///
/// - at most one start state exists
/// - the start state is never final
/// - transitions only reference registered states and events
/// - no transition originates from a final state
///
/// # Example
///
/// ```rust
/// use phaselock::core::Definition;
///
/// let mut definition = Definition::new();
/// definition.define_state("Locked", true, false).unwrap();
/// definition.define_state("Unlocked", false, false).unwrap();
/// definition.define_event("coin").unwrap();
/// definition.define_transition("Locked", "Unlocked", "coin").unwrap();
///
/// assert_eq!(definition.get_target_state("Locked", "coin").unwrap(), "Unlocked");
/// ```
///
/// Serialized, a definition takes the [`DefinitionTable`] form. Deserializing
/// goes through [`DefinitionTable::build`], so the invariants above hold for
/// definitions read from data as well.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DefinitionTable", into = "DefinitionTable")]
pub struct Definition {
    start_state: Option<String>,
    states: BTreeMap<String, StateDef>,
    events: BTreeSet<String>,
}

impl Definition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state.
    ///
    /// Fails with `ConstraintViolation` when `is_start` is requested while a
    /// start state already exists, or when a state is both start and final.
    pub fn define_state(
        &mut self,
        name: &str,
        is_start: bool,
        is_final: bool,
    ) -> Result<(), DefinitionError> {
        if is_start {
            if let Some(existing) = &self.start_state {
                return Err(DefinitionError::ConstraintViolation(format!(
                    "cannot define state '{name}' as start state because '{existing}' already is"
                )));
            }
        }

        if is_start && is_final {
            return Err(DefinitionError::ConstraintViolation(format!(
                "state '{name}' cannot be both start and final"
            )));
        }

        if self.states.contains_key(name) {
            return Err(DefinitionError::StateAlreadyDefined(name.to_owned()));
        }

        self.states
            .insert(name.to_owned(), StateDef::new(name, is_final));
        if is_start {
            self.start_state = Some(name.to_owned());
        }

        debug!(state = name, is_start, is_final, "state defined");
        Ok(())
    }

    /// Register the start state.
    pub fn define_start_state(&mut self, name: &str) -> Result<(), DefinitionError> {
        self.define_state(name, true, false)
    }

    /// Register a final state.
    pub fn define_final_state(&mut self, name: &str) -> Result<(), DefinitionError> {
        self.define_state(name, false, true)
    }

    /// Register an event.
    pub fn define_event(&mut self, name: &str) -> Result<(), DefinitionError> {
        if !self.events.insert(name.to_owned()) {
            return Err(DefinitionError::EventAlreadyDefined(name.to_owned()));
        }

        debug!(event = name, "event defined");
        Ok(())
    }

    /// Map `(source, event)` to `target`.
    ///
    /// Registering an already mapped `(source, event)` pair is not an error:
    /// the first target is kept and `Ok(false)` is returned.
    pub fn define_transition(
        &mut self,
        source: &str,
        target: &str,
        event: &str,
    ) -> Result<bool, DefinitionError> {
        if !self.is_state(source) {
            return Err(DefinitionError::StateNotDefined(source.to_owned()));
        }

        if !self.is_state(target) {
            return Err(DefinitionError::StateNotDefined(target.to_owned()));
        }

        if !self.is_event(event) {
            return Err(DefinitionError::EventNotDefined(event.to_owned()));
        }

        let state = self
            .states
            .get_mut(source)
            .ok_or_else(|| DefinitionError::StateNotDefined(source.to_owned()))?;

        if state.is_final() {
            return Err(DefinitionError::ConstraintViolation(format!(
                "cannot create transitions from final state '{source}'"
            )));
        }

        let inserted = state.insert_transition(event, target);
        if inserted {
            debug!(source, target, event, "transition defined");
        } else {
            debug!(source, target, event, "transition already mapped, keeping first");
        }
        Ok(inserted)
    }

    pub fn is_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.events.contains(name)
    }

    /// Look up a registered state.
    pub fn state(&self, name: &str) -> Option<&StateDef> {
        self.states.get(name)
    }

    /// The designated start state, if any.
    pub fn start_state(&self) -> Option<&str> {
        self.start_state.as_deref()
    }

    /// Resolve the target of `event` from `source`.
    pub fn get_target_state(&self, source: &str, event: &str) -> Result<&str, DefinitionError> {
        let state = self
            .states
            .get(source)
            .ok_or_else(|| DefinitionError::StateNotDefined(source.to_owned()))?;

        state
            .target(event)
            .ok_or_else(|| DefinitionError::TransitionNotDefined {
                state: source.to_owned(),
                event: event.to_owned(),
            })
    }

    /// All state names, sorted.
    pub fn list_states(&self) -> Vec<&str> {
        self.states.keys().map(String::as_str).collect()
    }

    /// All event names, sorted.
    pub fn list_events(&self) -> Vec<&str> {
        self.events.iter().map(String::as_str).collect()
    }

    /// Events accepted by `state`, sorted. Unknown states accept nothing.
    pub fn list_events_for(&self, state: &str) -> Vec<&str> {
        self.states
            .get(state)
            .map(|s| s.transitions().map(|(event, _)| event).collect())
            .unwrap_or_default()
    }

    pub(crate) fn states(&self) -> impl Iterator<Item = &StateDef> {
        self.states.values()
    }
}

impl TryFrom<DefinitionTable> for Definition {
    type Error = TableError;

    fn try_from(table: DefinitionTable) -> Result<Self, Self::Error> {
        table.build()
    }
}

/// Human-readable listing, intended for diagnostics only.
impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "start: {}",
            self.start_state.as_deref().unwrap_or("<none>")
        )?;

        writeln!(f, "states:")?;
        for state in self.states.values() {
            if state.is_final() {
                writeln!(f, "  {} (final)", state.name())?;
            } else {
                writeln!(f, "  {}", state.name())?;
            }
        }

        writeln!(f, "events:")?;
        for event in &self.events {
            writeln!(f, "  {event}")?;
        }

        writeln!(f, "transitions:")?;
        for state in self.states.values() {
            for (event, target) in state.transitions() {
                writeln!(f, "  {} --{}--> {}", state.name(), event, target)?;
            }
        }
        Ok(())
    }
}
