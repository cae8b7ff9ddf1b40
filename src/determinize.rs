//! Component G: NFA→DFA subset construction and Hopcroft-style minimization.
//!
//! `SimplifiableAutomaton`'s loop-a-simplification-step-to-a-fixed-point
//! shape (`model_checking/simplification.rs`) over `GBA`/`BA` automata gives
//! [`minimize`] its "loop a refinement step to a fixed point" structure,
//! adapted from Büchi-style state removal to DFA partition refinement.
//!
//! Because the builder in [`crate::automaton::build_dfa`] already performs
//! subset construction as it closes over reachable macro-states, the only
//! realistic input to [`determinize`] is an automaton built in
//! [`crate::automaton::BuildMode::Nfa`] — on a degenerate NFA whose every
//! macro-state already has exactly one successor per letter, `determinize`
//! is the identity up to the representative-selection renaming described
//! below (exercised in this module's tests).

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    automaton::{dead_state, explore, full_alphabet, Automaton, BuildMode, MacroState},
    error::FormulaError,
    formula::Ltlf,
    symbol::{Interpretation, Symbol},
};

/// A possibly-nondeterministic automaton: zero or more successors per
/// `(state, letter)` pair.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub alphabet: BTreeSet<Symbol>,
    pub initial: MacroState,
    pub states: BTreeSet<MacroState>,
    pub accepting: BTreeSet<MacroState>,
    pub transitions: BTreeMap<(MacroState, Interpretation), BTreeSet<MacroState>>,
}

/// Build the NFA-mode automaton of §4.F: successors kept as alternatives
/// instead of unioned into one macro-state.
pub fn build_nfa(phi: &Ltlf, labels: &BTreeSet<Symbol>) -> Result<Nfa, FormulaError> {
    let (initial, states, transitions, accepting) = explore(phi, labels, BuildMode::Nfa)?;
    Ok(Nfa {
        alphabet: full_alphabet(labels),
        initial,
        states,
        accepting,
        transitions,
    })
}

/// A group of NFA macro-states reachable together; the subset-construction
/// state. Each group is renamed to one of its own members (the
/// lexicographically smallest) in the final [`Automaton`], so the output
/// stays expressed in the crate's one `MacroState` type instead of
/// introducing a second, nested state representation.
type Group = BTreeSet<MacroState>;

fn representative(group: &Group) -> MacroState {
    group.iter().next().cloned().unwrap_or_else(dead_state)
}

/// Classical subset construction over `nfa`.
pub fn determinize(nfa: &Nfa) -> Automaton {
    let letters: BTreeSet<Interpretation> = nfa.transitions.keys().map(|(_, l)| l.clone()).collect();
    let initial_group: Group = BTreeSet::from([nfa.initial.clone()]);

    let mut frontier = vec![initial_group.clone()];
    let mut seen: BTreeSet<Group> = BTreeSet::new();
    let mut transitions: BTreeMap<(Group, Interpretation), Group> = BTreeMap::new();
    let mut accepting_groups: BTreeSet<Group> = BTreeSet::new();

    while let Some(group) = frontier.pop() {
        if seen.contains(&group) {
            continue;
        }
        seen.insert(group.clone());
        if group.iter().any(|s| nfa.accepting.contains(s)) {
            accepting_groups.insert(group.clone());
        }
        for letter in &letters {
            let mut next_group: Group = BTreeSet::new();
            for member in &group {
                if let Some(succs) = nfa.transitions.get(&(member.clone(), letter.clone())) {
                    next_group.extend(succs.iter().cloned());
                }
            }
            if next_group.is_empty() {
                next_group.insert(dead_state());
            }
            if !seen.contains(&next_group) {
                frontier.push(next_group.clone());
            }
            transitions.insert((group.clone(), letter.clone()), next_group);
        }
    }

    tracing::info!(
        nfa_states = nfa.states.len(),
        dfa_states = seen.len(),
        "determinized"
    );

    let states: BTreeSet<MacroState> = seen.iter().map(representative).collect();
    let accepting: BTreeSet<MacroState> = accepting_groups.iter().map(representative).collect();
    let transitions = transitions
        .into_iter()
        .map(|((g, l), next)| ((representative(&g), l), representative(&next)))
        .collect();

    Automaton {
        alphabet: nfa.alphabet.clone(),
        initial: representative(&initial_group),
        states,
        accepting,
        transitions,
    }
}

/// Partition-refinement minimization: start from the accepting/non-accepting
/// split and repeatedly refine by per-letter successor-class membership
/// until the partition stops changing, the same `simplify()`-style
/// fixed-point loop used above for determinization.
pub fn minimize(automaton: &Automaton) -> Automaton {
    let letters: BTreeSet<Interpretation> =
        automaton.transitions.keys().map(|(_, l)| l.clone()).collect();

    let (accepting, rejecting): (BTreeSet<MacroState>, BTreeSet<MacroState>) = automaton
        .states
        .iter()
        .cloned()
        .partition(|s| automaton.accepting.contains(s));
    let mut classes: BTreeSet<BTreeSet<MacroState>> = BTreeSet::new();
    if !accepting.is_empty() {
        classes.insert(accepting);
    }
    if !rejecting.is_empty() {
        classes.insert(rejecting);
    }

    loop {
        let class_of = |state: &MacroState| -> BTreeSet<MacroState> {
            classes
                .iter()
                .find(|class| class.contains(state))
                .cloned()
                .expect("every state belongs to exactly one class")
        };
        let mut refined: BTreeMap<(BTreeSet<MacroState>, Vec<BTreeSet<MacroState>>), BTreeSet<MacroState>> =
            BTreeMap::new();
        for state in &automaton.states {
            let successor_classes: Vec<BTreeSet<MacroState>> = letters
                .iter()
                .map(|letter| {
                    let successor = automaton
                        .transitions
                        .get(&(state.clone(), letter.clone()))
                        .cloned()
                        .unwrap_or_else(dead_state);
                    class_of(&successor)
                })
                .collect();
            let signature = (class_of(state), successor_classes);
            refined.entry(signature).or_default().insert(state.clone());
        }
        let new_classes: BTreeSet<BTreeSet<MacroState>> = refined.into_values().collect();
        if new_classes == classes {
            break;
        }
        classes = new_classes;
    }

    let representative_of = |state: &MacroState| -> MacroState {
        classes
            .iter()
            .find(|class| class.contains(state))
            .and_then(|class| class.iter().next())
            .cloned()
            .unwrap_or_else(dead_state)
    };

    let states: BTreeSet<MacroState> = classes
        .iter()
        .filter_map(|class| class.iter().next().cloned())
        .collect();
    let accepting: BTreeSet<MacroState> = classes
        .iter()
        .filter(|class| class.iter().any(|s| automaton.accepting.contains(s)))
        .filter_map(|class| class.iter().next().cloned())
        .collect();
    let mut transitions = BTreeMap::new();
    for class in &classes {
        let Some(rep) = class.iter().next().cloned() else {
            continue;
        };
        for letter in &letters {
            let successor = automaton
                .transitions
                .get(&(rep.clone(), letter.clone()))
                .cloned()
                .unwrap_or_else(dead_state);
            transitions.insert((rep.clone(), letter.clone()), representative_of(&successor));
        }
    }

    tracing::info!(
        states_before = automaton.states.len(),
        states_after = states.len(),
        "minimized"
    );

    Automaton {
        alphabet: automaton.alphabet.clone(),
        initial: representative_of(&automaton.initial),
        states,
        accepting,
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{accepts, build_dfa};
    use crate::symbol::Symbol;

    fn atom(name: &str) -> Ltlf {
        Ltlf::atomic(name)
    }

    fn letter(symbols: &[&str]) -> Interpretation {
        Interpretation::new(symbols.iter().map(|s| Symbol::new(*s)))
    }

    /// Re-express a deterministic [`Automaton`] as a degenerate [`Nfa`] whose
    /// every transition set is a singleton, the shape `determinize` is an
    /// identity over (§4.G's closing paragraph).
    fn as_degenerate_nfa(automaton: &Automaton) -> Nfa {
        Nfa {
            alphabet: automaton.alphabet.clone(),
            initial: automaton.initial.clone(),
            states: automaton.states.clone(),
            accepting: automaton.accepting.clone(),
            transitions: automaton
                .transitions
                .iter()
                .map(|(k, v)| (k.clone(), BTreeSet::from([v.clone()])))
                .collect(),
        }
    }

    #[test]
    fn determinize_is_idempotent_over_an_already_deterministic_automaton() {
        let phi = Ltlf::until(vec![atom("a"), atom("b")]).unwrap();
        let labels = phi.find_labels();
        let dfa = build_dfa(&phi, &labels).unwrap();
        let redetermined = determinize(&as_degenerate_nfa(&dfa));

        assert_eq!(dfa.states.len(), redetermined.states.len());
        let trace = [letter(&["a"]), letter(&["a"]), letter(&["b"])];
        assert_eq!(
            accepts(&dfa, &trace).unwrap(),
            accepts(&redetermined, &trace).unwrap()
        );
    }

    #[test]
    fn nfa_mode_builder_agrees_with_dfa_mode_after_determinizing() {
        let phi = Ltlf::eventually(atom("a"));
        let labels = phi.find_labels();
        let nfa = build_nfa(&phi, &labels).unwrap();
        let determinized = determinize(&nfa);
        let dfa = build_dfa(&phi, &labels).unwrap();

        for trace in [
            vec![letter(&[]), letter(&["a"])],
            vec![letter(&["b"]), letter(&["b"])],
        ] {
            assert_eq!(
                accepts(&determinized, &trace).unwrap(),
                accepts(&dfa, &trace).unwrap()
            );
        }
    }

    #[test]
    fn minimize_never_increases_state_count_and_preserves_acceptance() {
        let phi = Ltlf::always(atom("a"));
        let labels = phi.find_labels();
        let dfa = build_dfa(&phi, &labels).unwrap();
        let minimized = minimize(&dfa);

        assert!(minimized.states.len() <= dfa.states.len());
        for trace in [
            vec![letter(&["a"]), letter(&["a"])],
            vec![letter(&["a"]), letter(&[])],
        ] {
            assert_eq!(
                accepts(&dfa, &trace).unwrap(),
                accepts(&minimized, &trace).unwrap()
            );
        }
    }

    #[test]
    fn minimize_collapses_equivalent_states() {
        // `a && a` collapses to `a` at construction (§3 invariant 5), so
        // minimizing its automaton must match the automaton for `a` alone
        // in state count.
        let phi = Ltlf::and([atom("a"), atom("a")]).unwrap();
        let labels = phi.find_labels();
        let dfa = build_dfa(&phi, &labels).unwrap();
        let minimized = minimize(&dfa);
        let baseline = build_dfa(&atom("a"), &labels).unwrap();
        assert_eq!(minimized.states.len(), baseline.states.len());
    }
}
