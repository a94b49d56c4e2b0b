use std::fmt;

use crate::dfa::{construct_dfa, Conversion, ConversionError};
use crate::document::{parse_automaton, to_json, DocumentError};
use crate::fa::{is_epsilon, Automaton, AutomatonType, Position, State, Transition, EPSILON};
use color_eyre::eyre::Result;

#[derive(Debug, PartialEq, Eq)]
pub enum EditorError {
    UnknownState(String),
    UnknownTransition(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::UnknownState(id) => write!(f, "Error: No state with id {} exists!", id),
            EditorError::UnknownTransition(id) => {
                write!(f, "Error: No transition with id {} exists!", id)
            }
        }
    }
}

impl std::error::Error for EditorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyAutomaton,
    NoInitialState,
    MultipleInitialStates,
    NoAcceptingStates,
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::EmptyAutomaton
            | ValidationIssue::NoInitialState
            | ValidationIssue::MultipleInitialStates => Severity::Error,
            ValidationIssue::NoAcceptingStates => Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyAutomaton => write!(f, "No automaton to validate"),
            ValidationIssue::NoInitialState => write!(f, "No initial state defined"),
            ValidationIssue::MultipleInitialStates => {
                write!(f, "DFA cannot have multiple initial states")
            }
            ValidationIssue::NoAcceptingStates => write!(f, "No accepting states defined"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity() == Severity::Error)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "Automaton is valid!");
        }
        let issues: Vec<String> = self.issues.iter().map(|issue| issue.to_string()).collect();
        write!(f, "Issues found: {}", issues.join(", "))
    }
}

/// An editing session over one automaton. State and transition ids are handed out from counters
/// which only ever grow, so an id is never reused within the session.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    automaton: Automaton,
    next_state_id: usize,
    next_transition_id: usize,
}

// Numeric suffix of ids shaped like the ones the editor hands out, e.g. 12 for q12
fn id_number(id: &str, prefix: char) -> Option<usize> {
    id.strip_prefix(prefix)?.parse().ok()
}

impl Editor {
    pub fn new() -> Self {
        Editor::default()
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    fn state_mut(&mut self, id: &str) -> Result<&mut State, EditorError> {
        self.automaton
            .states
            .iter_mut()
            .find(|state| state.id == id)
            .ok_or_else(|| EditorError::UnknownState(id.to_string()))
    }

    /// Add a state at the position. The first state of an automaton is its initial state.
    pub fn add_state(&mut self, position: Position) -> String {
        let id = format!("q{}", self.next_state_id);
        self.next_state_id += 1;

        let mut state = State::new(&id, position);
        state.is_initial = self.automaton.states.is_empty();
        self.automaton.states.push(state);

        tracing::debug!(state = %id, "added state");
        id
    }

    /// Add a transition between two existing states. A missing or empty symbol means epsilon.
    pub fn add_transition(
        &mut self,
        from: &str,
        to: &str,
        symbol: Option<&str>,
    ) -> Result<String, EditorError> {
        for endpoint in [from, to] {
            if self.automaton.get_state(endpoint).is_none() {
                return Err(EditorError::UnknownState(endpoint.to_string()));
            }
        }

        let symbol = match symbol {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ => EPSILON,
        };

        let id = format!("t{}", self.next_transition_id);
        self.next_transition_id += 1;

        self.automaton
            .transitions
            .push(Transition::new(&id, from, to, symbol));

        if !is_epsilon(symbol) && !self.automaton.alphabet.iter().any(|s| s == symbol) {
            self.automaton.alphabet.push(symbol.to_string());
        }

        tracing::debug!(transition = %id, from, to, symbol, "added transition");
        Ok(id)
    }

    pub fn move_state(&mut self, id: &str, position: Position) -> Result<(), EditorError> {
        self.state_mut(id)?.position = position;
        Ok(())
    }

    /// Select the state and deselect everything else
    pub fn select_state(&mut self, id: &str) -> Result<(), EditorError> {
        if self.automaton.get_state(id).is_none() {
            return Err(EditorError::UnknownState(id.to_string()));
        }
        for state in self.automaton.states.iter_mut() {
            state.is_selected = state.id == id;
        }
        for transition in self.automaton.transitions.iter_mut() {
            transition.is_selected = false;
        }
        Ok(())
    }

    /// Select the transition and deselect everything else
    pub fn select_transition(&mut self, id: &str) -> Result<(), EditorError> {
        if self.automaton.get_transition(id).is_none() {
            return Err(EditorError::UnknownTransition(id.to_string()));
        }
        for transition in self.automaton.transitions.iter_mut() {
            transition.is_selected = transition.id == id;
        }
        for state in self.automaton.states.iter_mut() {
            state.is_selected = false;
        }
        Ok(())
    }

    pub fn toggle_initial(&mut self, id: &str) -> Result<bool, EditorError> {
        let state = self.state_mut(id)?;
        state.is_initial = !state.is_initial;
        Ok(state.is_initial)
    }

    pub fn toggle_accepting(&mut self, id: &str) -> Result<bool, EditorError> {
        let state = self.state_mut(id)?;
        state.is_accepting = !state.is_accepting;
        Ok(state.is_accepting)
    }

    /// Remove the state together with every transition entering or leaving it
    pub fn remove_state(&mut self, id: &str) -> Result<(), EditorError> {
        if self.automaton.get_state(id).is_none() {
            return Err(EditorError::UnknownState(id.to_string()));
        }
        self.automaton.states.retain(|state| state.id != id);
        self.automaton
            .transitions
            .retain(|transition| transition.from != id && transition.to != id);

        tracing::debug!(state = %id, "removed state");
        Ok(())
    }

    pub fn remove_transition(&mut self, id: &str) -> Result<(), EditorError> {
        if self.automaton.get_transition(id).is_none() {
            return Err(EditorError::UnknownTransition(id.to_string()));
        }
        self.automaton
            .transitions
            .retain(|transition| transition.id != id);
        Ok(())
    }

    pub fn set_type(&mut self, kind: AutomatonType) {
        self.automaton.kind = kind;
    }

    /// Start over with an empty NFA
    pub fn clear(&mut self) {
        *self = Editor::new();
    }

    /// Report what keeps the automaton from being usable. An automaton without states only
    /// reports that it is empty.
    pub fn validate(&self) -> ValidationReport {
        if self.automaton.states.is_empty() {
            tracing::warn!("no automaton to validate");
            return ValidationReport {
                issues: vec![ValidationIssue::EmptyAutomaton],
            };
        }

        let initial_count = self
            .automaton
            .states
            .iter()
            .filter(|state| state.is_initial)
            .count();

        let mut issues = Vec::new();

        if initial_count == 0 {
            issues.push(ValidationIssue::NoInitialState);
        }
        if self.automaton.kind == AutomatonType::DFA && initial_count > 1 {
            issues.push(ValidationIssue::MultipleInitialStates);
        }
        if !self.automaton.states.iter().any(|state| state.is_accepting) {
            issues.push(ValidationIssue::NoAcceptingStates);
        }

        for issue in &issues {
            tracing::warn!(severity = ?issue.severity(), "{}", issue);
        }

        ValidationReport { issues }
    }

    /// Convert a snapshot of the automaton. An automaton without states is refused.
    pub fn convert(&self) -> Result<Conversion, ConversionError> {
        let snapshot = self.automaton.clone();
        construct_dfa(&snapshot)
    }

    /// Replace the automaton with the one in the document. If the document is rejected the
    /// session is left exactly as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), DocumentError> {
        let automaton = match parse_automaton(text) {
            Ok(automaton) => automaton,
            Err(error) => {
                tracing::warn!("import refused: {}", error);
                return Err(error);
            }
        };

        let next_state_id = automaton
            .states
            .iter()
            .filter_map(|state| id_number(&state.id, 'q'))
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        let next_transition_id = automaton
            .transitions
            .iter()
            .filter_map(|transition| id_number(&transition.id, 't'))
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);

        self.next_state_id = self.next_state_id.max(next_state_id);
        self.next_transition_id = self.next_transition_id.max(next_transition_id);
        self.automaton = automaton;
        Ok(())
    }

    pub fn export_json(&self) -> Result<String> {
        to_json(&self.automaton)
    }
}

#[cfg(test)]
mod editor_tests {
    use super::*;

    fn origin() -> Position {
        Position::new(0.0, 0.0)
    }

    #[test]
    fn test_first_state_is_initial() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        let q1 = editor.add_state(Position::new(150.0, 0.0));

        assert_eq!((q0.as_str(), q1.as_str()), ("q0", "q1"));
        let automaton = editor.automaton();
        assert!(automaton.states[0].is_initial);
        assert!(!automaton.states[1].is_initial);
        assert_eq!(automaton.states[1].label, "q1");
    }

    #[test]
    fn test_alphabet_has_no_duplicates_or_epsilon() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        let q1 = editor.add_state(origin());

        editor.add_transition(&q0, &q1, Some("a")).unwrap();
        editor.add_transition(&q1, &q0, Some("a")).unwrap();
        editor.add_transition(&q1, &q1, Some("b")).unwrap();
        editor.add_transition(&q0, &q1, None).unwrap();
        editor.add_transition(&q0, &q0, Some("")).unwrap();
        editor.add_transition(&q0, &q0, Some("epsilon")).unwrap();

        let automaton = editor.automaton();
        assert_eq!(automaton.alphabet, vec!["a", "b"]);
        assert_eq!(automaton.transitions[3].symbol, "ε");
        assert_eq!(automaton.transitions[4].symbol, "ε");
        assert_eq!(automaton.transitions.len(), 6);
    }

    #[test]
    fn test_transition_to_unknown_state() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        assert_eq!(
            editor.add_transition(&q0, "q5", Some("a")),
            Err(EditorError::UnknownState("q5".to_string()))
        );
        assert!(editor.automaton().transitions.is_empty());
    }

    #[test]
    fn test_remove_state_cascades_and_ids_are_not_reused() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        let q1 = editor.add_state(origin());
        let q2 = editor.add_state(origin());
        editor.add_transition(&q0, &q1, Some("a")).unwrap();
        editor.add_transition(&q1, &q2, Some("b")).unwrap();
        let t2 = editor.add_transition(&q0, &q2, Some("c")).unwrap();

        editor.remove_state(&q1).unwrap();
        let automaton = editor.automaton();
        assert_eq!(automaton.states.len(), 2);
        assert_eq!(automaton.transitions.len(), 1);
        assert_eq!(automaton.transitions[0].id, t2);

        assert_eq!(editor.add_state(origin()), "q3");
        assert_eq!(editor.add_transition(&q0, &q2, Some("a")).unwrap(), "t3");
        assert!(editor.remove_state("q1").is_err());
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        let q1 = editor.add_state(origin());
        let t0 = editor.add_transition(&q0, &q1, Some("a")).unwrap();

        editor.select_state(&q1).unwrap();
        editor.select_transition(&t0).unwrap();
        let automaton = editor.automaton();
        assert!(automaton.states.iter().all(|state| !state.is_selected));
        assert!(automaton.transitions[0].is_selected);

        editor.select_state(&q0).unwrap();
        let automaton = editor.automaton();
        assert!(automaton.states[0].is_selected);
        assert!(!automaton.states[1].is_selected);
        assert!(!automaton.transitions[0].is_selected);
    }

    #[test]
    fn test_toggles_and_move() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());

        assert_eq!(editor.toggle_accepting(&q0), Ok(true));
        assert_eq!(editor.toggle_initial(&q0), Ok(false));
        editor.move_state(&q0, Position::new(5.0, 7.0)).unwrap();

        let state = &editor.automaton().states[0];
        assert!(state.is_accepting);
        assert!(!state.is_initial);
        assert_eq!(state.position, Position::new(5.0, 7.0));
        assert!(editor.toggle_accepting("nope").is_err());
    }

    #[test]
    fn test_validate() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        editor.toggle_initial(&q0).unwrap();
        assert_eq!(
            editor.validate().issues,
            vec![
                ValidationIssue::NoInitialState,
                ValidationIssue::NoAcceptingStates
            ]
        );
        editor.toggle_initial(&q0).unwrap();

        let q1 = editor.add_state(origin());
        editor.toggle_initial(&q1).unwrap();
        let report = editor.validate();
        assert_eq!(report.issues, vec![ValidationIssue::NoAcceptingStates]);
        assert!(!report.has_errors());

        editor.set_type(AutomatonType::DFA);
        editor.toggle_accepting(&q0).unwrap();
        let report = editor.validate();
        assert_eq!(report.issues, vec![ValidationIssue::MultipleInitialStates]);
        assert!(report.has_errors());
        assert_eq!(
            report.to_string(),
            "Issues found: DFA cannot have multiple initial states"
        );

        editor.toggle_initial(&q1).unwrap();
        let report = editor.validate();
        assert!(report.is_valid());
        assert_eq!(report.to_string(), "Automaton is valid!");
    }

    #[test]
    fn test_validate_empty_automaton() {
        let mut editor = Editor::new();
        let report = editor.validate();
        assert_eq!(report.issues, vec![ValidationIssue::EmptyAutomaton]);
        assert!(report.has_errors());
        assert_eq!(report.to_string(), "Issues found: No automaton to validate");

        let q0 = editor.add_state(origin());
        editor.remove_state(&q0).unwrap();
        assert_eq!(
            editor.validate().issues,
            vec![ValidationIssue::EmptyAutomaton]
        );
    }

    #[test]
    fn test_convert_refuses_empty() {
        let editor = Editor::new();
        assert_eq!(editor.convert().unwrap_err(), ConversionError::EmptyInput);
    }

    #[test]
    fn test_convert() {
        let mut editor = Editor::new();
        let q0 = editor.add_state(origin());
        let q1 = editor.add_state(origin());
        editor.toggle_accepting(&q1).unwrap();
        editor.add_transition(&q0, &q1, Some("a")).unwrap();

        let conversion = editor.convert().unwrap();
        assert_eq!(conversion.dfa_states.len(), 2);
        assert_eq!(conversion.steps.len(), 2);
    }

    #[test]
    fn test_import_failure_keeps_prior_automaton() {
        let mut editor = Editor::new();
        editor.add_state(origin());
        let before = editor.automaton().clone();

        assert!(editor.import_json("{\"states\": 1}").is_err());
        assert_eq!(editor.automaton(), &before);
        assert_eq!(editor.add_state(origin()), "q1");
    }

    #[test]
    fn test_import_then_export() {
        let mut source = Editor::new();
        let q0 = source.add_state(origin());
        let q1 = source.add_state(origin());
        source.add_transition(&q0, &q1, Some("a")).unwrap();
        source.add_transition(&q1, &q0, Some("b")).unwrap();
        let json = source.export_json().unwrap();

        let mut editor = Editor::new();
        editor.import_json(&json).unwrap();
        assert_eq!(editor.automaton(), source.automaton());

        // Counters continue after the imported ids
        assert_eq!(editor.add_state(origin()), "q2");
        assert_eq!(editor.add_transition("q2", "q0", Some("a")).unwrap(), "t2");
    }

    #[test]
    fn test_clear() {
        let mut editor = Editor::new();
        editor.add_state(origin());
        editor.set_type(AutomatonType::DFA);
        editor.clear();
        assert!(editor.automaton().states.is_empty());
        assert_eq!(editor.automaton().kind, AutomatonType::NFA);
        assert_eq!(editor.add_state(origin()), "q0");
    }
}
