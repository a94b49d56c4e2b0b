use bitvec::prelude::*;
use color_eyre::eyre::Result;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::prelude::StableGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::process::Command;

/// The canonical epsilon literal
pub const EPSILON: &str = "ε";
/// The spelled out epsilon literal, accepted everywhere the canonical one is
pub const EPSILON_WORD: &str = "epsilon";

/// Returns true if the symbol is one of the two accepted epsilon literals
pub fn is_epsilon(symbol: &str) -> bool {
    symbol == EPSILON || symbol == EPSILON_WORD
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: String,
    pub label: String,
    pub position: Position,
    pub is_initial: bool,
    pub is_accepting: bool,
    #[serde(default)]
    pub is_selected: bool, // Transient UI state, never part of the automaton semantics
}

impl State {
    pub fn new(id: &str, position: Position) -> Self {
        State {
            id: id.to_string(),
            label: id.to_string(),
            position,
            is_initial: false,
            is_accepting: false,
            is_selected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: String,
    pub from: String,
    pub to: String,
    pub symbol: String,
    #[serde(default)]
    pub is_selected: bool,
}

impl Transition {
    pub fn new(id: &str, from: &str, to: &str, symbol: &str) -> Self {
        Transition {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            symbol: symbol.to_string(),
            is_selected: false,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        is_epsilon(&self.symbol)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomatonType {
    #[default]
    NFA,
    DFA,
}

impl fmt::Display for AutomatonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonType::NFA => write!(f, "NFA"),
            AutomatonType::DFA => write!(f, "DFA"),
        }
    }
}

/// The automaton document edited by the user. Both NFAs and DFAs share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Automaton {
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub alphabet: Vec<String>, // Logically a set, kept in insertion order
    #[serde(rename = "type")]
    pub kind: AutomatonType,
}

impl Automaton {
    pub fn new(kind: AutomatonType) -> Self {
        Automaton {
            kind,
            ..Default::default()
        }
    }

    pub fn get_state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|state| state.id == id)
    }

    pub fn get_transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.iter().find(|transition| transition.id == id)
    }

    /// Ids of every state flagged as initial, in document order
    pub fn initial_state_ids(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|state| state.is_initial)
            .map(|state| state.id.as_str())
            .collect()
    }

    /// Missing ids are treated as non accepting
    pub fn is_accepting(&self, id: &str) -> bool {
        self.get_state(id).is_some_and(|state| state.is_accepting)
    }
}

/// The partial deterministic automaton accumulated up to a conversion step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultAutomaton {
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
}

/// Anything made of states and transitions which can be drawn.
pub trait FA {
    fn get_states(&self) -> &[State];
    fn get_transitions(&self) -> &[Transition];

    fn get_num_states(&self) -> usize {
        self.get_states().len()
    }

    fn get_state_index(&self, id: &str) -> Option<usize> {
        self.get_states().iter().position(|state| state.id == id)
    }

    /// Bit i is set if the i-th state is an initial state
    fn get_start_states(&self) -> BitVec<u8> {
        self.get_states().iter().map(|state| state.is_initial).collect()
    }

    /// Bit i is set if the i-th state is an accepting state
    fn get_acceptor_states(&self) -> BitVec<u8> {
        self.get_states()
            .iter()
            .map(|state| state.is_accepting)
            .collect()
    }

    /// Outgoing transitions of the state at the given index as (symbol, target index) pairs.
    /// Transitions pointing at states which do not exist are left out.
    fn get_state_transitions(&self, state_idx: usize) -> Vec<(&str, usize)> {
        let state = match self.get_states().get(state_idx) {
            Some(state) => state,
            None => return Vec::new(),
        };

        self.get_transitions()
            .iter()
            .filter(|transition| transition.from == state.id)
            .filter_map(|transition| {
                self.get_state_index(&transition.to)
                    .map(|target| (transition.symbol.as_str(), target))
            })
            .collect()
    }
}

impl FA for Automaton {
    fn get_states(&self) -> &[State] {
        &self.states
    }

    fn get_transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

impl FA for ResultAutomaton {
    fn get_states(&self) -> &[State] {
        &self.states
    }

    fn get_transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

#[derive(Debug)]
pub enum RenderError {
    /// Graphviz could not be executed or exited unsuccessfully
    GraphvizFailed(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::GraphvizFailed(reason) => {
                write!(f, "Error: Failed to render with Graphviz! {}", reason)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Render the automaton in the dot language. Parallel edges between the same pair of states are
/// merged into one edge whose label lists every symbol.
pub fn to_dot<T: FA>(fa: &T) -> String {
    let mut stable_graph: StableGraph<String, String> = StableGraph::new();

    let num_states = fa.get_num_states();

    let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

    let start_states = fa.get_start_states();
    let accept_states = fa.get_acceptor_states();

    for (state_idx, state) in fa.get_states().iter().enumerate() {
        let mut node_label = state.label.clone();
        if accept_states[state_idx] {
            node_label = format!("Accept\n{}", node_label);
        }
        if start_states[state_idx] {
            node_label = format!("Start\n{}", node_label);
        }
        stable_graph.add_node(node_label);
    }

    for state_idx in 0..num_states {
        for (symbol, target) in fa.get_state_transitions(state_idx) {
            let key = (NodeIndex::new(state_idx), NodeIndex::new(target));

            match edge_map.get(&key) {
                Some(edge_idx) => {
                    let old_label = &stable_graph[*edge_idx];
                    let new_label = format!("{}, {}", old_label, symbol);
                    stable_graph[*edge_idx] = new_label;
                }
                None => {
                    let edge_idx = stable_graph.add_edge(key.0, key.1, symbol.to_string());
                    edge_map.insert(key, edge_idx);
                }
            }
        }
    }

    Dot::new(&stable_graph).to_string()
}

/// Ask Graphviz to render the dot file as a jpg image
pub fn render_jpg(dot_filename: &str, jpg_filename: &str) -> Result<(), RenderError> {
    let output = Command::new("dot")
        .args(["-Tjpg", dot_filename, "-o", jpg_filename])
        .output();

    match output {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(RenderError::GraphvizFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        )),
        Err(error) => Err(RenderError::GraphvizFailed(error.to_string())),
    }
}

/// Save the automaton as `<filename>.dot`. If render is set, Graphviz is asked to produce
/// `<filename>.jpg` as well. A failed render is only logged, the dot file is kept either way.
pub fn show_fa<T: FA>(fa: &T, filename: &str, render: bool) -> Result<()> {
    let dot_filename = format!("{}.dot", filename);
    let mut dot_file = File::create(&dot_filename)?;

    dot_file.write_all(to_dot(fa).as_bytes())?;

    tracing::info!(file = %dot_filename, "automaton saved as dot");

    if !render {
        return Ok(());
    }

    let jpg_filename = format!("{}.jpg", filename);
    match render_jpg(&dot_filename, &jpg_filename) {
        Ok(()) => tracing::info!("automaton visualization saved as {jpg_filename}"),
        Err(error) => tracing::warn!("skipped {jpg_filename}: {error}"),
    }
    Ok(())
}
