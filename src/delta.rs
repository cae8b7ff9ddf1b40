//! Component E: the symbolic one-step transition relation.
//!
//! Every rule below follows the self-referential `Until`/`Release`
//! unfolding (`φ1 U φ2 ≡ φ2 ∨ (φ1 ∧ X(φ1 U φ2))`) by naming the whole
//! operator node as the `Next`/`WeakNext` obligation rather than recursing
//! into a truncated continuation.
//!
//! `Eventually`/`Always` are handled directly (not via their `Until`/
//! `Release` desugaring) since doing so is sound — they never require
//! pushing negation through a temporal operator, the one thing that does
//! require NNF input. `Implies`/`Equivalence` are rejected instead of
//! expanded inline: expanding them here would need `PLNot` to wrap an
//! arbitrary (possibly temporal) sub-delta, producing a negative-literal
//! obligation that the automaton builder's minimal-model extraction (which
//! only ever tracks *positive* subformula membership) cannot represent. This
//! is the Open Question decision recorded in DESIGN.md.

use crate::{
    error::FormulaError,
    formula::Ltlf,
    pl::{Atom, Pl},
    symbol::Interpretation,
};

pub fn delta(formula: &Ltlf, letter: &Interpretation, epsilon: bool) -> Result<Pl, FormulaError> {
    match formula {
        Ltlf::True => Ok(Pl::True),
        Ltlf::False => Ok(Pl::False),
        Ltlf::Atomic(s) => {
            if epsilon {
                Ok(Pl::False)
            } else {
                Ok(bool_pl(letter.contains(s)))
            }
        }
        Ltlf::Not(inner) => match inner.as_ref() {
            Ltlf::Atomic(s) => {
                if epsilon {
                    Ok(Pl::False)
                } else {
                    Ok(bool_pl(!letter.contains(s)))
                }
            }
            non_atomic => Err(FormulaError::NotNnf {
                formula: format!("!{non_atomic}"),
            }),
        },
        Ltlf::And(cs) => {
            let parts: Result<Vec<Pl>, _> = cs.iter().map(|c| delta(c, letter, epsilon)).collect();
            Ok(Pl::and(parts?))
        }
        Ltlf::Or(cs) => {
            let parts: Result<Vec<Pl>, _> = cs.iter().map(|c| delta(c, letter, epsilon)).collect();
            Ok(Pl::or(parts?))
        }
        Ltlf::Next(inner) => Ok(next_delta(inner, letter, epsilon)),
        Ltlf::WeakNext(inner) => Ok(weak_next_delta(inner, letter, epsilon)),
        Ltlf::Until(cs) => until_delta(cs, formula, letter, epsilon),
        Ltlf::Release(cs) => release_delta(cs, formula, letter, epsilon),
        Ltlf::Eventually(inner) => {
            let tail = delta(inner, letter, epsilon)?;
            let self_ref = next_delta(&Ltlf::Eventually(inner.clone()), letter, epsilon);
            Ok(Pl::or([tail, self_ref]))
        }
        Ltlf::Always(inner) => {
            let tail = delta(inner, letter, epsilon)?;
            let self_ref = weak_next_delta(&Ltlf::Always(inner.clone()), letter, epsilon);
            Ok(Pl::and([tail, self_ref]))
        }
        Ltlf::Implies(_) | Ltlf::Equivalence(_) => Err(FormulaError::NotNnf {
            formula: formula.to_string(),
        }),
    }
}

fn bool_pl(value: bool) -> Pl {
    if value {
        Pl::True
    } else {
        Pl::False
    }
}

/// `δ(Next ψ, I, ε)`: `ψ` itself becomes the next-position obligation,
/// represented as a bare subformula atom — `delta` is *not* recursively
/// applied to `ψ` here, it is named as the obligation verbatim.
fn next_delta(inner: &Ltlf, letter: &Interpretation, epsilon: bool) -> Pl {
    if epsilon || letter.has_last() {
        Pl::False
    } else {
        Pl::subformula(inner.clone())
    }
}

fn weak_next_delta(inner: &Ltlf, letter: &Interpretation, epsilon: bool) -> Pl {
    if epsilon || letter.has_last() {
        Pl::True
    } else {
        Pl::subformula(inner.clone())
    }
}

/// `δ(Until[φ1, rest], I, ε) = δ(f2, I, ε) ∨ (δ(φ1, I, ε) ∧ δ(Next(self), I, ε))`
/// where `f2` is `Until(rest)` when `rest` has more than one member, else
/// `rest[0]`, and `self` is the *whole* `Until` node (the fixpoint unfolding
/// `φ1 U φ2 ≡ φ2 ∨ (φ1 ∧ X(φ1 U φ2))`).
fn until_delta(
    children: &[Ltlf],
    whole: &Ltlf,
    letter: &Interpretation,
    epsilon: bool,
) -> Result<Pl, FormulaError> {
    let f1 = &children[0];
    let tail_delta = if children.len() > 2 {
        let tail = Ltlf::until(children[1..].to_vec()).expect("tail keeps arity >= 2");
        delta(&tail, letter, epsilon)?
    } else {
        delta(&children[1], letter, epsilon)?
    };
    let self_ref = next_delta(whole, letter, epsilon);
    let d_f1 = delta(f1, letter, epsilon)?;
    Ok(Pl::or([tail_delta, Pl::and([d_f1, self_ref])]))
}

/// Dual of [`until_delta`]:
/// `δ(Release[φ1, rest], I, ε) = δ(f2, I, ε) ∧ (δ(φ1, I, ε) ∨ δ(WeakNext(self), I, ε))`.
fn release_delta(
    children: &[Ltlf],
    whole: &Ltlf,
    letter: &Interpretation,
    epsilon: bool,
) -> Result<Pl, FormulaError> {
    let f1 = &children[0];
    let tail_delta = if children.len() > 2 {
        let tail = Ltlf::release(children[1..].to_vec()).expect("tail keeps arity >= 2");
        delta(&tail, letter, epsilon)?
    } else {
        delta(&children[1], letter, epsilon)?
    };
    let self_ref = weak_next_delta(whole, letter, epsilon);
    let d_f1 = delta(f1, letter, epsilon)?;
    Ok(Pl::and([tail_delta, Pl::or([d_f1, self_ref])]))
}
