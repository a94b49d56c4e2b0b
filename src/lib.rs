//! # automataviz
//!
//! A finite automata workbench whose centre piece is the conversion of a nondeterministic
//! automaton into an equivalent deterministic one by subset construction, recorded step by step so
//! the conversion can be replayed.
//!
//! This library provides functionality to:
//! - Edit an automaton: add, move, select and delete states and transitions
//! - Import and export automata as JSON documents
//! - Compute epsilon closures and simulate NFAs
//! - Convert NFAs to DFAs using Subset Construction, keeping a trace of every step
//! - Page through the trace and lay out the transition table of each step
//! - Visualize the automata and the conversion steps

// Re-export the modules
pub mod dfa;
pub mod document;
pub mod editor;
pub mod fa;
pub mod nfa;
pub mod replay;
pub mod visualizer;

// Re-export commonly used functions for convenience
pub use dfa::{construct_dfa, Conversion, ConversionError, ConversionStep};
pub use document::{load_automaton, parse_automaton};
pub use editor::Editor;
pub use fa::{Automaton, State, Transition};
pub use nfa::{get_epsilon_closure, StateSet};
pub use replay::{StepNavigator, TransitionTable};
pub use visualizer::{visualize, visualize_steps};
