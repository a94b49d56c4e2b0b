/* Perform subset construction to convert an NFA into a DFA, recording every derivation as a step
 * which can be replayed later. */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::fa::{
    is_epsilon, Automaton, AutomatonType, Position, ResultAutomaton, State, Transition, EPSILON,
};
use crate::nfa::{delta, get_epsilon_closure, StateSet};

/// List of reasons a conversion can be refused
#[derive(Debug, PartialEq, Eq)]
pub enum ConversionError {
    /// The automaton has no states, there is nothing to convert
    EmptyInput,
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::EmptyInput => {
                write!(f, "Error: The automaton has no states, nothing to convert!")
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// The raw mapping considered at a step: the deterministic source state, the symbol and the
/// original states reached before the epsilon closure was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransition {
    pub from: String,
    pub symbol: String,
    pub to: Vec<String>,
}

/// One derivation event of the subset construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStep {
    pub step: usize,
    pub description: String,
    pub current_states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<String>,
    pub transitions: Vec<RawTransition>,
    pub result_automaton: ResultAutomaton,
}

/// The deterministic automaton built by the subset construction along with the steps taken to
/// build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub dfa_states: Vec<State>,
    pub dfa_transitions: Vec<Transition>,
    pub steps: Vec<ConversionStep>,
    pub alphabet: Vec<String>,
}

impl Conversion {
    pub fn get_initial_state(&self) -> Option<&State> {
        self.dfa_states.iter().find(|state| state.is_initial)
    }

    /// Follow the transition leaving the state on the symbol, if there is one
    pub fn next_state(&self, from: &str, symbol: &str) -> Option<&State> {
        let transition = self
            .dfa_transitions
            .iter()
            .find(|transition| transition.from == from && transition.symbol == symbol)?;

        self.dfa_states.iter().find(|state| state.id == transition.to)
    }

    /// Walk the word through the DFA from its initial state. A missing transition rejects.
    /// Epsilon symbols in the word are ignored, the same as in the NFA simulation.
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let mut current = match self.get_initial_state() {
            Some(state) => state,
            None => return false,
        };

        for symbol in word {
            let symbol = symbol.as_ref();
            if is_epsilon(symbol) {
                continue;
            }

            current = match self.next_state(&current.id, symbol) {
                Some(state) => state,
                None => return false,
            };
        }
        current.is_accepting
    }

    /// The converted automaton as a document of its own
    pub fn to_automaton(&self) -> Automaton {
        Automaton {
            states: self.dfa_states.clone(),
            transitions: self.dfa_transitions.clone(),
            alphabet: self.alphabet.clone(),
            kind: AutomatonType::DFA,
        }
    }
}

/// State of one conversion run. Counters and accumulators live here so separate runs never share
/// anything.
struct SubsetConstruction<'a> {
    nfa: &'a Automaton,
    alphabet: Vec<&'a str>,
    dfa_states: Vec<State>,
    dfa_transitions: Vec<Transition>,
    steps: Vec<ConversionStep>,
    q_list: HashMap<StateSet, String>, // Mapping from nfa state set to dfa state id
    work_list: VecDeque<(StateSet, String)>,
    state_counter: usize,
}

impl<'a> SubsetConstruction<'a> {
    fn new(nfa: &'a Automaton) -> Self {
        SubsetConstruction {
            nfa,
            alphabet: nfa.input_symbols(),
            dfa_states: Vec::new(),
            dfa_transitions: Vec::new(),
            steps: Vec::new(),
            q_list: HashMap::new(),
            work_list: VecDeque::new(),
            state_counter: 0,
        }
    }

    fn add_state(&mut self, nfa_states: &StateSet, is_initial: bool) -> String {
        let id = format!("q{}", self.state_counter);
        self.state_counter += 1;

        let position = Position::new(100.0 + (self.dfa_states.len() as f64) * 150.0, 100.0);

        let state = State {
            id: id.clone(),
            label: nfa_states.to_string(),
            position,
            is_initial,
            is_accepting: self.nfa.any_accepting(nfa_states),
            is_selected: false,
        };

        tracing::debug!(
            dfa_state = %id,
            nfa_states = %nfa_states,
            accepting = state.is_accepting,
            "minted deterministic state"
        );

        self.dfa_states.push(state);
        self.q_list.insert(nfa_states.clone(), id.clone());
        self.work_list.push_back((nfa_states.clone(), id.clone()));
        id
    }

    fn add_transition(&mut self, from: &str, symbol: &str, to: &str) {
        let id = format!("t{}", self.dfa_transitions.len());
        self.dfa_transitions
            .push(Transition::new(&id, from, to, symbol));
    }

    // Copies, so that later steps never alter what an earlier step recorded
    fn snapshot(&self) -> ResultAutomaton {
        ResultAutomaton {
            states: self.dfa_states.clone(),
            transitions: self.dfa_transitions.clone(),
        }
    }

    fn record_step(
        &mut self,
        description: String,
        current_states: &StateSet,
        new_state: Option<String>,
        transitions: Vec<RawTransition>,
    ) {
        let step = ConversionStep {
            step: self.steps.len() + 1,
            description,
            current_states: current_states.ids().to_vec(),
            new_state,
            transitions,
            result_automaton: self.snapshot(),
        };

        tracing::debug!(step = step.step, "{}", step.description);
        self.steps.push(step);
    }

    fn start(&mut self) {
        let initial_states = self.nfa.initial_state_ids();
        let q0 = get_epsilon_closure(self.nfa, &initial_states);

        let d0 = self.add_state(&q0, true);

        let description = format!(
            "Initial state: {}-closure({{{}}}) = {}",
            EPSILON,
            initial_states.join(", "),
            q0
        );
        self.record_step(description, &q0, Some(d0), Vec::new());
    }

    fn run(&mut self) {
        let alphabet = self.alphabet.clone();

        while let Some((q, dq)) = self.work_list.pop_front() {
            for &symbol in alphabet.iter() {
                let end_states = delta(self.nfa, &q, symbol);
                if end_states.is_empty() {
                    continue;
                }

                let t = get_epsilon_closure(self.nfa, &end_states);

                let (dt, new_state) = match self.q_list.get(&t) {
                    Some(existing) => (existing.clone(), None),
                    None => {
                        let dt = self.add_state(&t, false);
                        (dt.clone(), Some(dt))
                    }
                };

                self.add_transition(&dq, symbol, &dt);

                let description = format!(
                    "From {} on '{}' → {}-closure({{{}}}) = {}",
                    q,
                    symbol,
                    EPSILON,
                    end_states.join(", "),
                    t
                );
                let raw = RawTransition {
                    from: dq.clone(),
                    symbol: symbol.to_string(),
                    to: end_states,
                };
                self.record_step(description, &t, new_state, vec![raw]);
            }
        }
    }

    fn finish(self) -> Conversion {
        Conversion {
            dfa_states: self.dfa_states,
            dfa_transitions: self.dfa_transitions,
            steps: self.steps,
            alphabet: self.alphabet.iter().map(|symbol| symbol.to_string()).collect(),
        }
    }
}

/// Apply the subset construction algorithm on an NFA to build a DFA. Every derivation is recorded
/// as a step, and the last step's result automaton always equals the returned DFA. The input is
/// never modified.
pub fn construct_dfa(nfa: &Automaton) -> Result<Conversion, ConversionError> {
    if nfa.states.is_empty() {
        return Err(ConversionError::EmptyInput);
    }

    let mut construction = SubsetConstruction::new(nfa);
    construction.start();
    construction.run();
    let conversion = construction.finish();

    tracing::info!(
        states = conversion.dfa_states.len(),
        transitions = conversion.dfa_transitions.len(),
        steps = conversion.steps.len(),
        "subset construction finished"
    );

    Ok(conversion)
}
