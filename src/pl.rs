//! Component B: propositional formulas used as the output alphabet of *delta*.
//!
//! Atoms come from two disjoint namespaces (see the delta's double role of
//! atoms design note): a [`Symbol`] from the input alphabet, or an LTLf
//! subformula used as a placeholder for "this must hold from the next
//! position". Only the symbol namespace is ever substituted against a
//! concrete [`Interpretation`]; the subformula namespace is interpreted by
//! the automaton builder via minimal-model extraction instead.

use std::{collections::BTreeSet, fmt, rc::Rc};

use itertools::Itertools;

use crate::{formula::Ltlf, symbol::Interpretation, symbol::Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    Symbol(Symbol),
    Subformula(Ltlf),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(s) => write!(f, "{s}"),
            Atom::Subformula(ltlf) => write!(f, "[{ltlf}]"),
        }
    }
}

/// A propositional formula, n-ary `And`/`Or` kept flattened and deduplicated
/// by construction (§3 invariants 1-5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pl {
    True,
    False,
    Atomic(Atom),
    Not(Rc<Pl>),
    And(BTreeSet<Pl>),
    Or(BTreeSet<Pl>),
}

impl Pl {
    pub fn atom(atom: Atom) -> Pl {
        Pl::Atomic(atom)
    }

    pub fn symbol(symbol: Symbol) -> Pl {
        Pl::Atomic(Atom::Symbol(symbol))
    }

    pub fn subformula(formula: Ltlf) -> Pl {
        Pl::Atomic(Atom::Subformula(formula))
    }

    pub fn not(inner: Pl) -> Pl {
        match inner {
            Pl::True => Pl::False,
            Pl::False => Pl::True,
            Pl::Not(grandchild) => (*grandchild).clone(),
            other => Pl::Not(Rc::new(other)),
        }
    }

    /// Canonical n-ary conjunction: flattens nested `And`s, drops `True`
    /// members, short-circuits to `False` on any `False` member, deduplicates
    /// via the `BTreeSet`, and collapses a singleton to its sole member.
    pub fn and(children: impl IntoIterator<Item = Pl>) -> Pl {
        let mut members = BTreeSet::new();
        for child in children {
            match child {
                Pl::True => {}
                Pl::False => return Pl::False,
                Pl::And(inner) => members.extend(inner),
                other => {
                    members.insert(other);
                }
            }
        }
        Self::collapse(members, Pl::True, Pl::And)
    }

    /// Dual of [`Pl::and`].
    pub fn or(children: impl IntoIterator<Item = Pl>) -> Pl {
        let mut members = BTreeSet::new();
        for child in children {
            match child {
                Pl::False => {}
                Pl::True => return Pl::True,
                Pl::Or(inner) => members.extend(inner),
                other => {
                    members.insert(other);
                }
            }
        }
        Self::collapse(members, Pl::False, Pl::Or)
    }

    fn collapse(
        members: BTreeSet<Pl>,
        empty: Pl,
        wrap: impl FnOnce(BTreeSet<Pl>) -> Pl,
    ) -> Pl {
        match members.len() {
            0 => empty,
            1 => members.into_iter().next().unwrap(),
            _ => wrap(members),
        }
    }

    /// Every distinct atom appearing in this formula.
    pub fn atoms(&self) -> BTreeSet<Atom> {
        let mut found = BTreeSet::new();
        self.collect_atoms(&mut found);
        found
    }

    fn collect_atoms(&self, out: &mut BTreeSet<Atom>) {
        match self {
            Pl::True | Pl::False => {}
            Pl::Atomic(a) => {
                out.insert(a.clone());
            }
            Pl::Not(inner) => inner.collect_atoms(out),
            Pl::And(cs) | Pl::Or(cs) => cs.iter().for_each(|c| c.collect_atoms(out)),
        }
    }
}

impl fmt::Display for Pl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pl::True => write!(f, "tt"),
            Pl::False => write!(f, "ff"),
            Pl::Atomic(a) => write!(f, "{a}"),
            Pl::Not(inner) => write!(f, "!{inner}"),
            Pl::And(cs) => {
                write!(f, "(")?;
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
            Pl::Or(cs) => {
                write!(f, "(")?;
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " || ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// How to resolve a [`Atom::Symbol`] atom during evaluation.
///
/// `AllTrue`/`AllFalse` are the `PLTrueInterpretation`/`PLFalseInterpretation`
/// dummy valuations §4.A calls for: any valuation works once a formula has
/// collapsed to constants, so these exist purely so the automaton builder can
/// evaluate an epsilon-residual without constructing a real [`Interpretation`].
pub enum Valuation<'a> {
    Interpretation(&'a Interpretation),
    AllTrue,
    AllFalse,
}

impl Valuation<'_> {
    fn holds(&self, symbol: &Symbol) -> bool {
        match self {
            Valuation::Interpretation(i) => i.contains(symbol),
            Valuation::AllTrue => true,
            Valuation::AllFalse => false,
        }
    }
}

/// Evaluate `φ` given an arbitrary resolver for its atoms. The general
/// mechanism underlying both [`truth`] (symbol atoms against a valuation) and
/// the automaton builder's minimal-model extraction (subformula atoms
/// against a candidate model).
pub fn eval(formula: &Pl, resolve: &impl Fn(&Atom) -> bool) -> bool {
    match formula {
        Pl::True => true,
        Pl::False => false,
        Pl::Atomic(a) => resolve(a),
        Pl::Not(inner) => !eval(inner, resolve),
        Pl::And(cs) => cs.iter().all(|c| eval(c, resolve)),
        Pl::Or(cs) => cs.iter().any(|c| eval(c, resolve)),
    }
}

/// Standard Boolean evaluation of a formula whose atoms are all
/// [`Atom::Symbol`] against a concrete valuation.
pub fn truth(formula: &Pl, valuation: &Valuation) -> bool {
    eval(formula, &|atom| match atom {
        Atom::Symbol(s) => valuation.holds(s),
        // A `delta` residual only ever carries subformula atoms when it still
        // describes next-position obligations; `truth` is only meaningful
        // once those have collapsed away (see the epsilon collapse note).
        Atom::Subformula(_) => false,
    })
}

/// Every subset of `alphabet` that satisfies `φ`, as canonical
/// [`Interpretation`]s. Naive `2^|alphabet|` enumeration over the powerset;
/// deterministic and correct, which is all that's required of it.
pub fn models(formula: &Pl, alphabet: &BTreeSet<Symbol>) -> BTreeSet<Interpretation> {
    alphabet
        .iter()
        .cloned()
        .powerset()
        .map(Interpretation::new)
        .filter(|interpretation| truth(formula, &Valuation::Interpretation(interpretation)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Pl {
        Pl::symbol(Symbol::new(name))
    }

    #[test]
    fn and_flattens_and_drops_true() {
        let p = Pl::and([Pl::and([sym("a"), sym("b")]), Pl::True]);
        assert_eq!(p, Pl::And(BTreeSet::from([sym("a"), sym("b")])));
    }

    #[test]
    fn and_short_circuits_on_false() {
        assert_eq!(Pl::and([sym("a"), Pl::False]), Pl::False);
    }

    #[test]
    fn singleton_and_collapses() {
        assert_eq!(Pl::and([sym("a")]), sym("a"));
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        assert_eq!(Pl::and(Vec::new()), Pl::True);
        assert_eq!(Pl::or(Vec::new()), Pl::False);
    }

    #[test]
    fn truth_evaluates_standard_boolean_semantics() {
        let i = Interpretation::new([Symbol::new("a")]);
        let v = Valuation::Interpretation(&i);
        assert!(truth(&Pl::and([sym("a")]), &v));
        assert!(!truth(&Pl::and([sym("a"), sym("b")]), &v));
        assert!(truth(&Pl::or([sym("a"), sym("b")]), &v));
        assert!(truth(&Pl::not(sym("b")), &v));
    }

    #[test]
    fn models_enumerates_all_satisfying_subsets() {
        let alphabet = BTreeSet::from([Symbol::new("a"), Symbol::new("b")]);
        let ms = models(&sym("a"), &alphabet);
        assert_eq!(ms.len(), 2);
        assert!(ms.iter().all(|i| i.contains(&Symbol::new("a"))));
    }
}
