/* Paging through a conversion trace and laying out the transition table of a step. */

use std::fmt;

use crate::dfa::ConversionStep;
use crate::fa::ResultAutomaton;

/// Shown in a transition table cell when the state has no transition on the symbol
pub const NO_TRANSITION: &str = "∅";

#[derive(Debug, PartialEq, Eq)]
pub enum ReplayError {
    /// The requested step does not exist in the trace
    StepOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::StepOutOfRange { index, len } => write!(
                f,
                "Error: Step index {} is out of range, the trace has {} steps!",
                index, len
            ),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Keeps track of which step of a trace is being looked at. Indices are zero based.
#[derive(Debug, Clone)]
pub struct StepNavigator {
    steps: Vec<ConversionStep>,
    current: usize,
}

impl StepNavigator {
    pub fn new(steps: Vec<ConversionStep>) -> Self {
        StepNavigator { steps, current: 0 }
    }

    pub fn steps(&self) -> &[ConversionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&ConversionStep> {
        self.steps.get(self.current)
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// Move one step forward. Returns false when already at the last step.
    pub fn next_step(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Move one step back. Returns false when already at the first step.
    pub fn prev_step(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn jump_to(&mut self, index: usize) -> Result<&ConversionStep, ReplayError> {
        if index >= self.steps.len() {
            return Err(ReplayError::StepOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        self.current = index;
        Ok(&self.steps[index])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub state_id: String,
    pub label: String,
    pub is_initial: bool,
    pub is_accepting: bool,
    /// One cell per symbol, holding the label of the target state if there is a transition
    pub cells: Vec<Option<String>>,
}

/// The transition table of a (partial) deterministic automaton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    pub symbols: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TransitionTable {
    pub fn new<S: AsRef<str>>(dfa: &ResultAutomaton, alphabet: &[S]) -> Self {
        let symbols: Vec<String> = alphabet
            .iter()
            .map(|symbol| symbol.as_ref().to_string())
            .collect();

        let rows = dfa
            .states
            .iter()
            .map(|state| {
                let cells = symbols
                    .iter()
                    .map(|symbol| {
                        dfa.transitions
                            .iter()
                            .find(|t| t.from == state.id && t.symbol == *symbol)
                            .and_then(|t| dfa.states.iter().find(|s| s.id == t.to))
                            .map(|target| target.label.clone())
                    })
                    .collect();

                TableRow {
                    state_id: state.id.clone(),
                    label: state.label.clone(),
                    is_initial: state.is_initial,
                    is_accepting: state.is_accepting,
                    cells,
                }
            })
            .collect();

        TransitionTable { symbols, rows }
    }

    pub fn for_step<S: AsRef<str>>(step: &ConversionStep, alphabet: &[S]) -> Self {
        TransitionTable::new(&step.result_automaton, alphabet)
    }

    /// The text shown in the cell, the empty set marker if there is no transition
    pub fn cell_text(cell: &Option<String>) -> &str {
        match cell {
            Some(label) => label.as_str(),
            None => NO_TRANSITION,
        }
    }
}

impl fmt::Display for TransitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<Vec<String>> = Vec::new();

        let mut header = vec!["State".to_string()];
        header.extend(self.symbols.iter().cloned());
        lines.push(header);

        for row in &self.rows {
            let marker = match (row.is_initial, row.is_accepting) {
                (true, true) => "→*",
                (true, false) => "→ ",
                (false, true) => " *",
                (false, false) => "  ",
            };
            let mut line = vec![format!("{} {}", marker, row.label)];
            line.extend(
                row.cells
                    .iter()
                    .map(|cell| TransitionTable::cell_text(cell).to_string()),
            );
            lines.push(line);
        }

        let num_cols = self.symbols.len() + 1;
        let widths: Vec<usize> = (0..num_cols)
            .map(|col| {
                lines
                    .iter()
                    .map(|line| line[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for line in lines {
            let padded: Vec<String> = line
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| {
                    let padding = width - cell.chars().count();
                    format!("{}{}", cell, " ".repeat(padding))
                })
                .collect();
            writeln!(f, "{}", padded.join(" | ").trim_end())?;
        }
        Ok(())
    }
}
