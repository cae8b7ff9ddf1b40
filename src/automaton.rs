//! Component F: fixed-point subset construction over [`crate::delta::delta`]
//! and [`crate::nnf::to_nnf`].
//!
//! A macro-state is a set of NNF subformulas interpreted conjunctively (§3).
//! Successors are extracted from delta's residual PL formula by enumerating
//! its *minimal models* over the subformula-atom namespace and, in DFA mode,
//! unioning them into the single next macro-state (§4.F step 2).

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    delta::delta,
    error::{AutomatonError, FormulaError},
    formula::Ltlf,
    nnf::to_nnf,
    pl::{self, Atom, Pl},
    symbol::{last_symbol, Interpretation, Symbol},
};

/// A set of NNF subformulas interpreted conjunctively.
pub type MacroState = BTreeSet<Ltlf>;

/// The canonical non-accepting absorbing state used whenever a letter has no
/// satisfying successor (`delta` collapsed to `PLFalse`).
pub(crate) fn dead_state() -> MacroState {
    BTreeSet::from([Ltlf::False])
}

/// `conj(S)`: the single formula a macro-state stands for.
pub fn conj(state: &MacroState) -> Ltlf {
    Ltlf::and(state.iter().cloned()).expect("And has no arity precondition")
}

/// Whether `conj(S)` holds at end-of-trace: `delta(conj(S), _, ε=true)`
/// collapses to only `PLTrue`/`PLFalse` (the epsilon collapse design note),
/// so which interpretation is passed does not matter.
pub fn is_accepting(state: &MacroState) -> Result<bool, FormulaError> {
    let residual = delta(&conj(state), &Interpretation::empty(), true)?;
    Ok(pl::truth(&residual, &pl::Valuation::AllFalse))
}

/// Every distinct subformula atom appearing in `q`, i.e. the candidate
/// variables for model enumeration.
fn subformula_atoms(q: &Pl) -> Vec<Ltlf> {
    q.atoms()
        .into_iter()
        .filter_map(|a| match a {
            Atom::Subformula(f) => Some(f),
            Atom::Symbol(_) => None,
        })
        .collect()
}

/// Every satisfying assignment of `q` over its subformula atoms, filtered to
/// those minimal under set inclusion (the prime implicants of `q`, which is
/// monotone since `delta` on NNF input never introduces `PLNot`).
fn minimal_models(q: &Pl) -> Vec<BTreeSet<Ltlf>> {
    let atoms = subformula_atoms(q);
    let models: Vec<BTreeSet<Ltlf>> = atoms
        .into_iter()
        .powerset()
        .map(BTreeSet::from_iter)
        .filter(|chosen| {
            pl::eval(q, &|atom| match atom {
                Atom::Subformula(f) => chosen.contains(f),
                Atom::Symbol(_) => false,
            })
        })
        .collect();
    models
        .iter()
        .enumerate()
        .filter(|(i, m)| {
            !models
                .iter()
                .enumerate()
                .any(|(j, other)| j != *i && other.len() < m.len() && other.is_subset(m))
        })
        .map(|(_, m)| m.clone())
        .collect()
}

/// Whether successors fold into a single macro-state (DFA) or stay as
/// separate alternatives (NFA) — §4.F's two construction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Dfa,
    Nfa,
}

fn successors(
    state: &MacroState,
    letter: &Interpretation,
    mode: BuildMode,
) -> Result<BTreeSet<MacroState>, FormulaError> {
    let q = delta(&conj(state), letter, false)?;
    let models = minimal_models(&q);
    Ok(match mode {
        BuildMode::Dfa => {
            let union: MacroState = if models.is_empty() {
                dead_state()
            } else {
                models.into_iter().flatten().collect()
            };
            BTreeSet::from([union])
        }
        BuildMode::Nfa => {
            if models.is_empty() {
                BTreeSet::from([dead_state()])
            } else {
                models.into_iter().collect()
            }
        }
    })
}

/// A fully materialized, deterministic automaton: one successor per
/// `(state, letter)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automaton {
    pub alphabet: BTreeSet<Symbol>,
    pub initial: MacroState,
    pub states: BTreeSet<MacroState>,
    pub accepting: BTreeSet<MacroState>,
    pub transitions: BTreeMap<(MacroState, Interpretation), MacroState>,
}

impl Automaton {
    pub fn initial(&self) -> &MacroState {
        &self.initial
    }

    pub fn successors(&self, state: &MacroState, letter: &Interpretation) -> Option<&MacroState> {
        self.transitions.get(&(state.clone(), letter.clone()))
    }

    pub fn is_accepting(&self, state: &MacroState) -> bool {
        self.accepting.contains(state)
    }

    pub fn states(&self) -> &BTreeSet<MacroState> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }
}

/// Alphabet `labels ∪ {LAST}`, the one the builder always closes over.
pub(crate) fn full_alphabet(labels: &BTreeSet<Symbol>) -> BTreeSet<Symbol> {
    labels.iter().cloned().chain([last_symbol()]).collect()
}

/// The closure loop of §4.F, generic over [`BuildMode`]. Returns the
/// reachable states, the transition relation (one or more successors per
/// letter depending on mode) and the accepting set.
#[allow(clippy::type_complexity)]
pub(crate) fn explore(
    phi: &Ltlf,
    labels: &BTreeSet<Symbol>,
    mode: BuildMode,
) -> Result<
    (
        MacroState,
        BTreeSet<MacroState>,
        BTreeMap<(MacroState, Interpretation), BTreeSet<MacroState>>,
        BTreeSet<MacroState>,
    ),
    FormulaError,
> {
    let alphabet = full_alphabet(labels);
    let letters = pl::models(&Pl::True, &alphabet);
    let initial: MacroState = BTreeSet::from([to_nnf(phi)]);

    let mut frontier = vec![initial.clone()];
    let mut seen: BTreeSet<MacroState> = BTreeSet::new();
    let mut transitions = BTreeMap::new();
    let mut accepting = BTreeSet::new();

    while let Some(state) = frontier.pop() {
        if seen.contains(&state) {
            continue;
        }
        seen.insert(state.clone());
        if is_accepting(&state)? {
            accepting.insert(state.clone());
        }
        for letter in &letters {
            let succs = successors(&state, letter, mode)?;
            for s in &succs {
                if !seen.contains(s) {
                    frontier.push(s.clone());
                }
            }
            transitions.insert((state.clone(), letter.clone()), succs);
        }
        tracing::debug!(
            state = %render_state(&state),
            frontier_len = frontier.len(),
            "explored macro-state"
        );
    }

    tracing::info!(
        states = seen.len(),
        transitions = transitions.len(),
        "automaton closure reached"
    );
    Ok((initial, seen, transitions, accepting))
}

fn render_state(state: &MacroState) -> String {
    format!("{{{}}}", state.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))
}

/// Batch-build a fully deterministic automaton directly (§4.F "Batch build"
/// in DFA mode). Already a DFA in the formal sense: one successor per
/// `(state, letter)`.
pub fn build_dfa(phi: &Ltlf, labels: &BTreeSet<Symbol>) -> Result<Automaton, FormulaError> {
    let (initial, states, transitions, accepting) = explore(phi, labels, BuildMode::Dfa)?;
    let transitions = transitions
        .into_iter()
        .map(|(k, mut v)| {
            let only = v.pop_first().expect("DFA mode always yields exactly one successor");
            (k, only)
        })
        .collect();
    Ok(Automaton {
        alphabet: full_alphabet(labels),
        initial,
        states,
        accepting,
        transitions,
    })
}

/// An on-the-fly wrapper: no materialized state/transition sets, `step` and
/// `is_accepting` are computed lazily, memoized per §5's resource-discipline
/// note ("memoize to_nnf and delta by (node_identity, I, ε)").
pub struct DfaOtf {
    alphabet: BTreeSet<Symbol>,
    initial: MacroState,
    step_cache: RefCell<BTreeMap<(MacroState, Interpretation), MacroState>>,
    accept_cache: RefCell<BTreeMap<MacroState, bool>>,
}

impl DfaOtf {
    pub fn new(phi: &Ltlf, labels: &BTreeSet<Symbol>) -> Self {
        DfaOtf {
            alphabet: full_alphabet(labels),
            initial: BTreeSet::from([to_nnf(phi)]),
            step_cache: RefCell::new(BTreeMap::new()),
            accept_cache: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn initial(&self) -> &MacroState {
        &self.initial
    }

    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    pub fn step(&self, state: &MacroState, letter: &Interpretation) -> Result<MacroState, FormulaError> {
        let key = (state.clone(), letter.clone());
        if let Some(cached) = self.step_cache.borrow().get(&key) {
            return Ok(cached.clone());
        }
        let succs = successors(state, letter, BuildMode::Dfa)?;
        let only = succs
            .into_iter()
            .next()
            .expect("DFA mode always yields exactly one successor");
        self.step_cache.borrow_mut().insert(key, only.clone());
        Ok(only)
    }

    pub fn is_accepting(&self, state: &MacroState) -> Result<bool, FormulaError> {
        if let Some(cached) = self.accept_cache.borrow().get(state) {
            return Ok(*cached);
        }
        let accepts = is_accepting(state)?;
        self.accept_cache.borrow_mut().insert(state.clone(), accepts);
        Ok(accepts)
    }
}

/// Run the automaton over `trace`, honoring `LAST` by construction (the
/// builder always injects it into the letter alphabet, and `accepts` sets it
/// on the final letter regardless of whether the caller already did).
///
/// §7: an empty trace accepts iff the initial macro-state is accepting under
/// ε-evaluation — this is *not* an error, it is `EmptyTrace`'s defined
/// semantics, so it is handled as a direct early return rather than through
/// [`AutomatonError`].
pub fn accepts(automaton: &Automaton, trace: &[Interpretation]) -> Result<bool, AutomatonError> {
    if trace.is_empty() {
        return Ok(automaton.is_accepting(&automaton.initial));
    }
    let mut state = automaton.initial.clone();
    let last = trace.len() - 1;
    for (pos, letter) in trace.iter().enumerate() {
        for symbol in letter.symbols() {
            if symbol.as_str() != "LAST" && !automaton.alphabet.contains(symbol) {
                return Err(AutomatonError::UnknownSymbol(symbol.clone()));
            }
        }
        let letter = if pos == last {
            let mut symbols = letter.symbols().clone();
            symbols.insert(last_symbol());
            Interpretation::new(symbols)
        } else {
            letter.clone()
        };
        state = automaton
            .successors(&state, &letter)
            .cloned()
            .unwrap_or_else(dead_state);
    }
    Ok(automaton.is_accepting(&state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str) -> Ltlf {
        Ltlf::atomic(name)
    }

    fn letter(symbols: &[&str]) -> Interpretation {
        Interpretation::new(symbols.iter().map(|s| Symbol::new(*s)))
    }

    #[test]
    fn eventually_accepts_when_atom_seen() {
        let phi = Ltlf::eventually(atom("a"));
        let labels = phi.find_labels();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(accepts(&automaton, &[letter(&[]), letter(&["a"])]).unwrap());
        assert!(!accepts(&automaton, &[letter(&["b"]), letter(&["b"])]).unwrap());
    }

    #[test]
    fn always_rejects_on_a_gap() {
        let phi = Ltlf::always(atom("a"));
        let labels = phi.find_labels();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(accepts(&automaton, &[letter(&["a"]), letter(&["a"]), letter(&["a"])]).unwrap());
        assert!(!accepts(&automaton, &[letter(&["a"]), letter(&[]), letter(&["a"])]).unwrap());
    }

    #[test]
    fn until_scenario() {
        let phi = Ltlf::until(vec![atom("a"), atom("b")]).unwrap();
        let labels = phi.find_labels();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(accepts(&automaton, &[letter(&["a"]), letter(&["a"]), letter(&["b"])]).unwrap());
    }

    #[test]
    fn weak_next_is_vacuously_accepting_at_end() {
        let phi = Ltlf::weak_next(atom("a"));
        let labels = phi.find_labels();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(accepts(&automaton, &[letter(&["a"])]).unwrap());
    }

    #[test]
    fn empty_trace_accepts_iff_initial_state_accepts() {
        let phi = Ltlf::True;
        let labels: BTreeSet<Symbol> = BTreeSet::new();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(accepts(&automaton, &[]).unwrap());

        let phi = atom("a");
        let labels = phi.find_labels();
        let automaton = build_dfa(&phi, &labels).unwrap();
        assert!(!accepts(&automaton, &[]).unwrap());
    }

    #[test]
    fn dfa_otf_agrees_with_batch_build() {
        let phi = Ltlf::until(vec![atom("a"), atom("b")]).unwrap();
        let labels = phi.find_labels();
        let batch = build_dfa(&phi, &labels).unwrap();
        let otf = DfaOtf::new(&phi, &labels);

        let trace = [letter(&["a"]), letter(&["a"]), letter(&["b"])];
        assert!(accepts(&batch, &trace).unwrap());

        let mut state = otf.initial().clone();
        let last = trace.len() - 1;
        for (pos, l) in trace.iter().enumerate() {
            let l = if pos == last {
                let mut symbols = l.symbols().clone();
                symbols.insert(last_symbol());
                Interpretation::new(symbols)
            } else {
                l.clone()
            };
            state = otf.step(&state, &l).unwrap();
        }
        assert!(otf.is_accepting(&state).unwrap());
    }
}
