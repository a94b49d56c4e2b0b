/* Reading and writing automaton documents as JSON. A document is only accepted when it is
 * structurally sound; nothing is handed out from a document which failed validation. */

use color_eyre::eyre::{Report, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::fa::{is_epsilon, Automaton};

/// List of reasons a document is rejected
#[derive(Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// The text is not JSON or does not have the shape of an automaton
    MalformedDocument(String),
    /// Two states share an id
    DuplicateStateId(String),
    /// Two transitions share an id
    DuplicateTransitionId(String),
    /// A transition starts or ends at a state which is not part of the document
    UnknownStateReference { transition: String, state: String },
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::MalformedDocument(reason) => {
                write!(f, "Error: Malformed automaton document! {}", reason)
            }
            DocumentError::DuplicateStateId(id) => {
                write!(f, "Error: State id {} is used more than once!", id)
            }
            DocumentError::DuplicateTransitionId(id) => {
                write!(f, "Error: Transition id {} is used more than once!", id)
            }
            DocumentError::UnknownStateReference { transition, state } => write!(
                f,
                "Error: Transition {} refers to state {} which does not exist!",
                transition, state
            ),
        }
    }
}

impl std::error::Error for DocumentError {}

fn validate(automaton: &Automaton) -> Result<(), DocumentError> {
    let mut state_ids: HashSet<&str> = HashSet::new();
    for state in &automaton.states {
        if !state_ids.insert(&state.id) {
            return Err(DocumentError::DuplicateStateId(state.id.clone()));
        }
    }

    let mut transition_ids: HashSet<&str> = HashSet::new();
    for transition in &automaton.transitions {
        if !transition_ids.insert(&transition.id) {
            return Err(DocumentError::DuplicateTransitionId(
                transition.id.clone(),
            ));
        }

        for endpoint in [&transition.from, &transition.to] {
            if !state_ids.contains(endpoint.as_str()) {
                return Err(DocumentError::UnknownStateReference {
                    transition: transition.id.clone(),
                    state: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}

// Drops epsilon and repeated entries from the alphabet, keeping the first occurrence of each
// symbol. Symbols used on transitions but missing from the alphabet are appended in the order
// they appear.
fn normalize_alphabet(automaton: &mut Automaton) {
    let mut seen: HashSet<String> = HashSet::new();
    automaton
        .alphabet
        .retain(|symbol| !is_epsilon(symbol) && seen.insert(symbol.clone()));

    for transition in &automaton.transitions {
        if !transition.is_epsilon() && seen.insert(transition.symbol.clone()) {
            tracing::debug!(symbol = %transition.symbol, "symbol added to the alphabet");
            automaton.alphabet.push(transition.symbol.clone());
        }
    }
}

/// Parse and validate an automaton document
pub fn parse_automaton(text: &str) -> Result<Automaton, DocumentError> {
    let mut automaton: Automaton = serde_json::from_str(text)
        .map_err(|error| DocumentError::MalformedDocument(error.to_string()))?;

    validate(&automaton)?;
    normalize_alphabet(&mut automaton);

    Ok(automaton)
}

/// Render any serializable value, usually an automaton, a conversion or its steps, as pretty JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let json_string = serde_json::to_string_pretty(value)?;
    Ok(json_string)
}

/// Load an automaton document from a file
pub fn load_automaton<P: AsRef<Path>>(file_path: P) -> Result<Automaton> {
    let file = File::open(file_path.as_ref())?;

    let mut buf_reader = BufReader::new(file);
    let mut text = String::new();
    buf_reader.read_to_string(&mut text)?;

    parse_automaton(&text).map_err(Report::new)
}

/// Save any serializable value as pretty JSON in the given file
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, file_path: P) -> Result<()> {
    let json_string = to_json(value)?;

    let mut file = File::create(file_path.as_ref())?;

    writeln!(file, "{}", json_string)?;
    tracing::info!(file = %file_path.as_ref().display(), "saved json document");
    Ok(())
}

#[cfg(test)]
mod document_tests {
    use super::*;
    use crate::fa::AutomatonType;

    const VALID: &str = r#"{
        "states": [
            {"id": "q0", "label": "q0", "position": {"x": 10, "y": 20}, "isInitial": true, "isAccepting": false, "isSelected": false},
            {"id": "q1", "label": "q1", "position": {"x": 160, "y": 20}, "isInitial": false, "isAccepting": true}
        ],
        "transitions": [
            {"id": "t0", "from": "q0", "to": "q1", "symbol": "a", "isSelected": false},
            {"id": "t1", "from": "q1", "to": "q1", "symbol": "ε", "isSelected": false}
        ],
        "alphabet": ["a", "ε", "a"],
        "type": "NFA"
    }"#;

    #[test]
    fn test_parse_valid_document() {
        let automaton = parse_automaton(VALID).unwrap();
        assert_eq!(automaton.states.len(), 2);
        assert_eq!(automaton.transitions.len(), 2);
        assert_eq!(automaton.kind, AutomatonType::NFA);
        assert_eq!(automaton.alphabet, vec!["a"]);
        assert!(!automaton.states[1].is_selected);
        assert_eq!(automaton.states[0].position.x, 10.0);
    }

    #[test]
    fn test_transition_symbols_join_the_alphabet() {
        let text = r#"{
            "states": [
                {"id": "q0", "label": "q0", "position": {"x": 0, "y": 0}, "isInitial": true, "isAccepting": false},
                {"id": "q1", "label": "q1", "position": {"x": 150, "y": 0}, "isInitial": false, "isAccepting": true}
            ],
            "transitions": [
                {"id": "t0", "from": "q0", "to": "q1", "symbol": "b"},
                {"id": "t1", "from": "q1", "to": "q1", "symbol": "epsilon"},
                {"id": "t2", "from": "q0", "to": "q1", "symbol": "a"},
                {"id": "t3", "from": "q1", "to": "q0", "symbol": "b"}
            ],
            "alphabet": ["a"],
            "type": "NFA"
        }"#;
        let automaton = parse_automaton(text).unwrap();
        assert_eq!(automaton.alphabet, vec!["a", "b"]);

        let empty = text.replace(r#""alphabet": ["a"]"#, r#""alphabet": []"#);
        let automaton = parse_automaton(&empty).unwrap();
        assert_eq!(automaton.alphabet, vec!["b", "a"]);

        let conversion = crate::dfa::construct_dfa(&automaton).unwrap();
        for word in [vec!["a"], vec!["b"], vec!["b", "b", "a"]] {
            assert_eq!(automaton.accepts(&word), conversion.accepts(&word), "{:?}", word);
        }
        assert!(conversion.accepts(&["a"]));
    }

    #[test]
    fn test_round_trip() {
        let automaton = parse_automaton(VALID).unwrap();
        let json = to_json(&automaton).unwrap();
        assert_eq!(parse_automaton(&json).unwrap(), automaton);
    }

    #[test]
    fn test_reject_invalid_json() {
        let err = parse_automaton("{ not json").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedDocument(_)));
    }

    #[test]
    fn test_reject_missing_fields() {
        let err = parse_automaton(r#"{"states": [], "transitions": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MalformedDocument(_)));
    }

    #[test]
    fn test_reject_unknown_type() {
        let text = r#"{"states": [], "transitions": [], "alphabet": [], "type": "PDA"}"#;
        assert!(matches!(
            parse_automaton(text),
            Err(DocumentError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_reject_duplicate_state() {
        let text = VALID.replace(r#""id": "q1""#, r#""id": "q0""#);
        assert_eq!(
            parse_automaton(&text),
            Err(DocumentError::DuplicateStateId("q0".to_string()))
        );
    }

    #[test]
    fn test_reject_duplicate_transition() {
        let text = VALID.replace(r#""id": "t1""#, r#""id": "t0""#);
        assert_eq!(
            parse_automaton(&text),
            Err(DocumentError::DuplicateTransitionId("t0".to_string()))
        );
    }

    #[test]
    fn test_reject_dangling_transition() {
        let text = VALID.replace(r#""to": "q1", "symbol": "a""#, r#""to": "q7", "symbol": "a""#);
        assert_eq!(
            parse_automaton(&text),
            Err(DocumentError::UnknownStateReference {
                transition: "t0".to_string(),
                state: "q7".to_string(),
            })
        );
    }
}
