//! Data-driven definitions loaded from JSON.

use crate::builder::error::TableError;
use crate::core::{Definition, DefinitionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

/// One state row of a [`DefinitionTable`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub name: String,
    #[serde(default)]
    pub start: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

/// One `source --event--> target` row of a [`DefinitionTable`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub source: String,
    pub target: String,
    pub event: String,
}

/// Serializable description of a definition.
///
/// Unlike [`DefinitionBuilder`](super::DefinitionBuilder), which stops at the
/// first registration error, a table is validated as a whole before anything
/// is registered and reports every violation it finds.
///
/// # Example
///
/// ```rust
/// use phaselock::builder::DefinitionTable;
///
/// let table = DefinitionTable::from_json(r#"{
///     "states": [
///         { "name": "Locked", "start": true },
///         { "name": "Unlocked" }
///     ],
///     "events": ["coin", "push"],
///     "transitions": [
///         { "source": "Locked", "target": "Unlocked", "event": "coin" },
///         { "source": "Unlocked", "target": "Locked", "event": "push" }
///     ]
/// }"#).unwrap();
///
/// let definition = table.build().unwrap();
/// assert_eq!(definition.get_target_state("Locked", "coin").unwrap(), "Unlocked");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionTable {
    #[serde(default)]
    pub states: Vec<StateEntry>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,
}

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

fn check(ok: bool, error: impl FnOnce() -> DefinitionError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

impl DefinitionTable {
    /// Parse a table from JSON. The result is not validated yet.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the whole table, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let mut checks: Vec<Check> = Vec::new();

        let mut states = BTreeSet::new();
        let mut start: Option<&str> = None;
        let mut finals = BTreeSet::new();
        for entry in &self.states {
            let name = entry.name.as_str();
            checks.push(check(states.insert(name), || {
                DefinitionError::StateAlreadyDefined(name.to_owned())
            }));

            if entry.start {
                checks.push(check(start.is_none(), || {
                    DefinitionError::ConstraintViolation(format!(
                        "cannot define state '{name}' as start state because '{}' already is",
                        start.unwrap_or_default()
                    ))
                }));
                start.get_or_insert(name);
            }

            checks.push(check(!(entry.start && entry.is_final), || {
                DefinitionError::ConstraintViolation(format!(
                    "state '{name}' cannot be both start and final"
                ))
            }));

            if entry.is_final {
                finals.insert(name);
            }
        }

        let mut events = BTreeSet::new();
        for event in &self.events {
            checks.push(check(events.insert(event.as_str()), || {
                DefinitionError::EventAlreadyDefined(event.clone())
            }));
        }

        for entry in &self.transitions {
            checks.push(check(states.contains(entry.source.as_str()), || {
                DefinitionError::StateNotDefined(entry.source.clone())
            }));
            checks.push(check(states.contains(entry.target.as_str()), || {
                DefinitionError::StateNotDefined(entry.target.clone())
            }));
            checks.push(check(events.contains(entry.event.as_str()), || {
                DefinitionError::EventNotDefined(entry.event.clone())
            }));
            checks.push(check(!finals.contains(entry.source.as_str()), || {
                DefinitionError::ConstraintViolation(format!(
                    "cannot create transitions from final state '{}'",
                    entry.source
                ))
            }));
        }

        if checks.is_empty() {
            return Validation::success(());
        }
        Validation::all_vec(checks).map(|_| ())
    }

    /// Validate, then register everything into a new [`Definition`].
    pub fn build(&self) -> Result<Definition, TableError> {
        if let Validation::Failure(errors) = self.validate() {
            let errors: Vec<DefinitionError> = errors.iter().cloned().collect();
            debug!(violations = errors.len(), "definition table rejected");
            return Err(TableError::Invalid(errors));
        }

        let mut definition = Definition::new();
        self.register(&mut definition)
            .map_err(|error| TableError::Invalid(vec![error]))?;
        Ok(definition)
    }

    fn register(&self, definition: &mut Definition) -> Result<(), DefinitionError> {
        for entry in &self.states {
            definition.define_state(&entry.name, entry.start, entry.is_final)?;
        }
        for event in &self.events {
            definition.define_event(event)?;
        }
        for entry in &self.transitions {
            definition.define_transition(&entry.source, &entry.target, &entry.event)?;
        }
        Ok(())
    }
}

impl From<Definition> for DefinitionTable {
    fn from(definition: Definition) -> Self {
        Self::from(&definition)
    }
}

impl From<&Definition> for DefinitionTable {
    fn from(definition: &Definition) -> Self {
        let start = definition.start_state();
        let states = definition
            .states()
            .map(|state| StateEntry {
                name: state.name().to_owned(),
                start: start == Some(state.name()),
                is_final: state.is_final(),
            })
            .collect();
        let events = definition
            .list_events()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let transitions = definition
            .states()
            .flat_map(|state| {
                state.transitions().map(move |(event, target)| TransitionEntry {
                    source: state.name().to_owned(),
                    target: target.to_owned(),
                    event: event.to_owned(),
                })
            })
            .collect();

        Self {
            states,
            events,
            transitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: &str = r#"{
        "states": [
            { "name": "Pending", "start": true },
            { "name": "Paid" },
            { "name": "Shipped", "final": true }
        ],
        "events": ["pay", "ship"],
        "transitions": [
            { "source": "Pending", "target": "Paid", "event": "pay" },
            { "source": "Paid", "target": "Shipped", "event": "ship" }
        ]
    }"#;

    #[test]
    fn valid_table_builds_definition() {
        let definition = DefinitionTable::from_json(ORDER).unwrap().build().unwrap();

        assert_eq!(definition.start_state(), Some("Pending"));
        assert_eq!(definition.get_target_state("Paid", "ship").unwrap(), "Shipped");
        assert!(definition.state("Shipped").unwrap().is_final());
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let table = DefinitionTable::from_json(
            r#"{
                "states": [
                    { "name": "A", "start": true },
                    { "name": "B", "start": true },
                    { "name": "Done", "final": true },
                    { "name": "A" }
                ],
                "events": ["go", "go"],
                "transitions": [
                    { "source": "A", "target": "Missing", "event": "go" },
                    { "source": "Done", "target": "A", "event": "jump" }
                ]
            }"#,
        )
        .unwrap();

        match table.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 6);

                let has = |expected: &DefinitionError| errors.iter().any(|e| e == expected);
                assert!(has(&DefinitionError::StateAlreadyDefined("A".to_string())));
                assert!(has(&DefinitionError::EventAlreadyDefined("go".to_string())));
                assert!(has(&DefinitionError::StateNotDefined("Missing".to_string())));
                assert!(has(&DefinitionError::EventNotDefined("jump".to_string())));
                let constraints = errors
                    .iter()
                    .filter(|e| matches!(e, DefinitionError::ConstraintViolation(_)))
                    .count();
                assert_eq!(constraints, 2);
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn build_reports_violations_without_registering() {
        let table = DefinitionTable {
            states: vec![StateEntry {
                name: "Only".to_string(),
                start: true,
                is_final: true,
            }],
            ..DefinitionTable::default()
        };

        let error = table.build().unwrap_err();

        assert_eq!(error.violations().len(), 1);
        assert!(error.to_string().contains("cannot be both start and final"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = DefinitionTable::from_json(r#"{ "states": [ { "start": true } ] }"#);
        assert!(matches!(result, Err(TableError::Parse(_))));
    }

    #[test]
    fn empty_table_is_valid() {
        assert!(DefinitionTable::default().validate().is_success());
    }

    #[test]
    fn table_round_trips_through_definition() {
        let definition = DefinitionTable::from_json(ORDER).unwrap().build().unwrap();

        let rebuilt = DefinitionTable::from(&definition).build().unwrap();

        assert_eq!(rebuilt, definition);
    }
}
