/* Operations on the nondeterministic side of the conversion: epsilon closures, moves on a
 * symbol and plain NFA simulation. */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::fa::{is_epsilon, Automaton};

/// A set of state ids of the original automaton. The ids are kept sorted and without duplicates
/// so two sets holding the same members are always equal and hash alike, no matter the order in
/// which the members were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateSet(Vec<String>);

impl StateSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        StateSet(ids)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.binary_search_by(|member| member.as_str().cmp(id)).is_ok()
    }

    /// The canonical key of the set, its sorted members joined by commas
    pub fn key(&self) -> String {
        self.0.join(",")
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for StateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StateSet::new(iter)
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Compute the epsilon closure of the given ids. The ids themselves are always part of the
/// closure, even when no state carries them.
pub fn get_epsilon_closure<S: AsRef<str>>(nfa: &Automaton, state_ids: &[S]) -> StateSet {
    let mut closure: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for id in state_ids {
        let id = id.as_ref().to_string();
        if closure.insert(id.clone()) {
            stack.push(id);
        }
    }

    while let Some(current) = stack.pop() {
        let eps_targets = nfa
            .transitions
            .iter()
            .filter(|transition| transition.from == current && transition.is_epsilon());

        for transition in eps_targets {
            if closure.insert(transition.to.clone()) {
                stack.push(transition.to.clone());
            }
        }
    }

    StateSet::new(closure)
}

// Returns the targets reachable on the symbol from any member of q, before any closure is taken.
// Targets are listed in the order they are first found.
pub fn delta(nfa: &Automaton, q: &StateSet, symbol: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for id in q.ids() {
        let targets = nfa
            .transitions
            .iter()
            .filter(|transition| transition.from == *id && transition.symbol == symbol);

        for transition in targets {
            if !result.contains(&transition.to) {
                result.push(transition.to.clone());
            }
        }
    }
    result
}

impl Automaton {
    /// The distinct non epsilon symbols of the alphabet in the order they were first seen
    pub fn input_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for symbol in &self.alphabet {
            if !is_epsilon(symbol) && !symbols.contains(&symbol.as_str()) {
                symbols.push(symbol.as_str());
            }
        }
        symbols
    }

    /// True if any member of the set is an accepting state
    pub fn any_accepting(&self, set: &StateSet) -> bool {
        set.ids().iter().any(|id| self.is_accepting(id))
    }

    /// Run the word through the automaton using the standard NFA simulation. Every element of the
    /// word is one symbol; epsilon symbols in the word are ignored.
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let mut current = get_epsilon_closure(self, &self.initial_state_ids());

        for symbol in word {
            let symbol = symbol.as_ref();
            if is_epsilon(symbol) {
                continue;
            }

            let next = delta(self, &current, symbol);
            if next.is_empty() {
                return false;
            }
            current = get_epsilon_closure(self, &next);
        }

        self.any_accepting(&current)
    }
}

#[cfg(test)]
mod nfa_tests {
    use super::*;
    use crate::fa::{AutomatonType, Position, State, Transition};

    fn state(id: &str, initial: bool, accepting: bool) -> State {
        let mut state = State::new(id, Position::default());
        state.is_initial = initial;
        state.is_accepting = accepting;
        state
    }

    // (a|b)*ab over an NFA with epsilon moves
    fn ends_with_ab() -> Automaton {
        let mut nfa = Automaton::new(AutomatonType::NFA);
        nfa.states = vec![
            state("q0", true, false),
            state("q1", false, false),
            state("q2", false, false),
            state("q3", false, true),
        ];
        nfa.transitions = vec![
            Transition::new("t0", "q0", "q0", "a"),
            Transition::new("t1", "q0", "q0", "b"),
            Transition::new("t2", "q0", "q1", "ε"),
            Transition::new("t3", "q1", "q2", "a"),
            Transition::new("t4", "q2", "q3", "b"),
        ];
        nfa.alphabet = vec!["a".to_string(), "b".to_string()];
        nfa
    }

    #[test]
    fn test_state_set_is_canonical() {
        let s1 = StateSet::new(vec!["q2", "q0", "q1", "q0"]);
        let s2: StateSet = vec!["q1", "q2", "q0"].into_iter().collect();
        assert_eq!(s1, s2);
        assert_eq!(s1.key(), "q0,q1,q2");
        assert_eq!(s1.to_string(), "{q0, q1, q2}");
        assert_eq!(s1.len(), 3);
        assert!(s1.contains("q1"));
        assert!(!s1.contains("q3"));
        assert_eq!(StateSet::default().to_string(), "{}");
    }

    #[test]
    fn test_epsilon_closure() {
        let nfa = ends_with_ab();
        let closure = get_epsilon_closure(&nfa, &["q0"]);
        assert_eq!(closure.ids(), ["q0", "q1"]);

        let closure = get_epsilon_closure(&nfa, &["q2"]);
        assert_eq!(closure.ids(), ["q2"]);
    }

    #[test]
    fn test_epsilon_closure_follows_chains_and_both_spellings() {
        let mut nfa = Automaton::new(AutomatonType::NFA);
        nfa.states = vec![
            state("a", true, false),
            state("b", false, false),
            state("c", false, false),
            state("d", false, true),
        ];
        nfa.transitions = vec![
            Transition::new("t0", "a", "b", "ε"),
            Transition::new("t1", "b", "c", "epsilon"),
            Transition::new("t2", "c", "a", "ε"),
            Transition::new("t3", "c", "d", "x"),
        ];

        let closure = get_epsilon_closure(&nfa, &["a"]);
        assert_eq!(closure.ids(), ["a", "b", "c"]);
    }

    #[test]
    fn test_epsilon_closure_of_empty_set() {
        let nfa = ends_with_ab();
        let empty: [&str; 0] = [];
        assert!(get_epsilon_closure(&nfa, &empty).is_empty());
    }

    #[test]
    fn test_epsilon_closure_keeps_unknown_ids() {
        let nfa = ends_with_ab();
        let closure = get_epsilon_closure(&nfa, &["ghost"]);
        assert_eq!(closure.ids(), ["ghost"]);
    }

    #[test]
    fn test_epsilon_closure_is_idempotent() {
        let nfa = ends_with_ab();
        let once = get_epsilon_closure(&nfa, &["q0", "q2"]);
        let twice = get_epsilon_closure(&nfa, once.ids());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_delta_keeps_first_seen_order() {
        let mut nfa = ends_with_ab();
        nfa.transitions
            .push(Transition::new("t5", "q1", "q0", "a"));

        let q = StateSet::new(vec!["q0", "q1"]);
        assert_eq!(delta(&nfa, &q, "a"), vec!["q0", "q2"]);
        assert_eq!(delta(&nfa, &q, "b"), vec!["q0"]);
        assert!(delta(&nfa, &q, "c").is_empty());
    }

    #[test]
    fn test_input_symbols() {
        let mut nfa = ends_with_ab();
        nfa.alphabet = vec![
            "b".to_string(),
            "ε".to_string(),
            "a".to_string(),
            "b".to_string(),
            "epsilon".to_string(),
        ];
        assert_eq!(nfa.input_symbols(), vec!["b", "a"]);
    }

    #[test]
    fn test_nfa_accepts() {
        let nfa = ends_with_ab();
        assert!(nfa.accepts(&["a", "b"]));
        assert!(nfa.accepts(&["b", "b", "a", "b"]));
        assert!(!nfa.accepts(&["a", "b", "a"]));
        assert!(!nfa.accepts::<&str>(&[]));
        assert!(!nfa.accepts(&["c"]));
    }
}
