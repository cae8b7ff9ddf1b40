//! Component C: the LTLf formula algebra and its structural invariants.
//!
//! Construction always normalizes (§3): same-type binary operators flatten
//! into their parent the way `BinaryOperator._popup` does, and the
//! commutative operators (`And`, `Or`, `Equivalence`) canonicalize their
//! children into a sorted, deduplicated `BTreeSet` the way
//! `CommutativeBinaryOperator` canonicalizes into `self.members`. Ordering on
//! `Ltlf` is derived structurally, which gives a total order over formulas
//! for free.

use std::{collections::BTreeSet, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    error::FormulaError,
    symbol::{Interpretation, Symbol},
};

/// A node of the LTLf formula tree. The n-ary temporal operators (`Until`,
/// `Release`) keep an ordered chain since they are *not* commutative;
/// `And`/`Or`/`Equivalence` keep a canonical set since they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ltlf {
    True,
    False,
    Atomic(Symbol),
    Not(Rc<Ltlf>),
    And(BTreeSet<Ltlf>),
    Or(BTreeSet<Ltlf>),
    Implies(Rc<Vec<Ltlf>>),
    Equivalence(BTreeSet<Ltlf>),
    Next(Rc<Ltlf>),
    WeakNext(Rc<Ltlf>),
    Until(Rc<Vec<Ltlf>>),
    Release(Rc<Vec<Ltlf>>),
    Eventually(Rc<Ltlf>),
    Always(Rc<Ltlf>),
}

impl Ltlf {
    pub fn atomic(symbol: impl Into<Symbol>) -> Ltlf {
        Ltlf::Atomic(symbol.into())
    }

    /// Raw one-level syntactic negation (used only by [`crate::nnf::to_nnf`]
    /// to build the operand of a rewrite rule before recursing into it).
    pub fn negate(&self) -> Ltlf {
        match self {
            Ltlf::True => Ltlf::False,
            Ltlf::False => Ltlf::True,
            Ltlf::Not(inner) => (**inner).clone(),
            other => Ltlf::Not(Rc::new(other.clone())),
        }
    }

    pub fn and(children: impl IntoIterator<Item = Ltlf>) -> Result<Ltlf, FormulaError> {
        let flattened = flatten(children, |f| match f {
            Ltlf::And(inner) => inner.into_iter().collect(),
            other => vec![other],
        });
        if flattened.contains(&Ltlf::False) {
            return Ok(Ltlf::False);
        }
        let members: BTreeSet<Ltlf> = flattened.into_iter().filter(|f| *f != Ltlf::True).collect();
        Ok(collapse_set(members, Ltlf::True, Ltlf::And))
    }

    pub fn or(children: impl IntoIterator<Item = Ltlf>) -> Result<Ltlf, FormulaError> {
        let flattened = flatten(children, |f| match f {
            Ltlf::Or(inner) => inner.into_iter().collect(),
            other => vec![other],
        });
        if flattened.contains(&Ltlf::True) {
            return Ok(Ltlf::True);
        }
        let members: BTreeSet<Ltlf> = flattened.into_iter().filter(|f| *f != Ltlf::False).collect();
        Ok(collapse_set(members, Ltlf::False, Ltlf::Or))
    }

    pub fn implies(children: Vec<Ltlf>) -> Result<Ltlf, FormulaError> {
        require_arity("implies", 2, children.len())?;
        let flattened = flatten(children, |f| match f {
            Ltlf::Implies(inner) => (*inner).clone(),
            other => vec![other],
        });
        Ok(Ltlf::Implies(Rc::new(flattened)))
    }

    pub fn equivalence(children: impl IntoIterator<Item = Ltlf>) -> Result<Ltlf, FormulaError> {
        let flattened = flatten(children, |f| match f {
            Ltlf::Equivalence(inner) => inner.into_iter().collect(),
            other => vec![other],
        });
        require_arity("equivalence", 2, flattened.len())?;
        let members: BTreeSet<Ltlf> = flattened.into_iter().collect();
        Ok(collapse_set(members, Ltlf::True, Ltlf::Equivalence))
    }

    pub fn next(inner: Ltlf) -> Ltlf {
        Ltlf::Next(Rc::new(inner))
    }

    pub fn weak_next(inner: Ltlf) -> Ltlf {
        Ltlf::WeakNext(Rc::new(inner))
    }

    pub fn until(children: Vec<Ltlf>) -> Result<Ltlf, FormulaError> {
        require_arity("until", 2, children.len())?;
        let flattened = flatten(children, |f| match f {
            Ltlf::Until(inner) => (*inner).clone(),
            other => vec![other],
        });
        Ok(Ltlf::Until(Rc::new(flattened)))
    }

    pub fn release(children: Vec<Ltlf>) -> Result<Ltlf, FormulaError> {
        require_arity("release", 2, children.len())?;
        let flattened = flatten(children, |f| match f {
            Ltlf::Release(inner) => (*inner).clone(),
            other => vec![other],
        });
        Ok(Ltlf::Release(Rc::new(flattened)))
    }

    pub fn eventually(inner: Ltlf) -> Ltlf {
        Ltlf::Eventually(Rc::new(inner))
    }

    pub fn always(inner: Ltlf) -> Ltlf {
        Ltlf::Always(Rc::new(inner))
    }

    /// All atomic symbols appearing anywhere under this formula; the default
    /// alphabet when a caller does not supply one explicitly.
    pub fn find_labels(&self) -> BTreeSet<Symbol> {
        let mut labels = BTreeSet::new();
        self.collect_labels(&mut labels);
        labels
    }

    fn collect_labels(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Ltlf::True | Ltlf::False => {}
            Ltlf::Atomic(s) => {
                out.insert(s.clone());
            }
            Ltlf::Not(f) | Ltlf::Next(f) | Ltlf::WeakNext(f) | Ltlf::Eventually(f) | Ltlf::Always(f) => {
                f.collect_labels(out)
            }
            Ltlf::And(cs) | Ltlf::Or(cs) | Ltlf::Equivalence(cs) => {
                cs.iter().for_each(|c| c.collect_labels(out))
            }
            Ltlf::Implies(cs) | Ltlf::Until(cs) | Ltlf::Release(cs) => {
                cs.iter().for_each(|c| c.collect_labels(out))
            }
        }
    }

    /// Reference finite-trace semantics (§6, §8), used only by tests and by
    /// callers wanting a ground truth independent of `delta`/the automaton.
    /// `pos` must be `<= trace.len()`; querying exactly at `trace.len()` is
    /// only meaningful for `True`/`False`/`Eventually`/`Always` over an empty
    /// remaining suffix.
    pub fn truth_on_trace(&self, trace: &[Interpretation], pos: usize) -> bool {
        let n = trace.len();
        debug_assert!(pos <= n);
        match self {
            Ltlf::True => true,
            Ltlf::False => false,
            Ltlf::Atomic(s) => pos < n && trace[pos].contains(s),
            Ltlf::Not(f) => !f.truth_on_trace(trace, pos),
            Ltlf::And(cs) => cs.iter().all(|c| c.truth_on_trace(trace, pos)),
            Ltlf::Or(cs) => cs.iter().any(|c| c.truth_on_trace(trace, pos)),
            Ltlf::Implies(cs) => {
                let (antecedents, consequent) = cs.split_at(cs.len() - 1);
                let antecedent_holds = antecedents.iter().all(|c| c.truth_on_trace(trace, pos));
                !antecedent_holds || consequent[0].truth_on_trace(trace, pos)
            }
            Ltlf::Equivalence(cs) => {
                cs.iter().all(|c| c.truth_on_trace(trace, pos))
                    || cs.iter().all(|c| !c.truth_on_trace(trace, pos))
            }
            Ltlf::Next(f) => pos < n.saturating_sub(1) && f.truth_on_trace(trace, pos + 1),
            Ltlf::WeakNext(f) => pos >= n.saturating_sub(1) || f.truth_on_trace(trace, pos + 1),
            Ltlf::Eventually(f) => (pos..n).any(|j| f.truth_on_trace(trace, j)),
            Ltlf::Always(f) => (pos..n).all(|j| f.truth_on_trace(trace, j)),
            Ltlf::Until(cs) => until_holds(cs, trace, pos),
            Ltlf::Release(cs) => release_holds(cs, trace, pos),
        }
    }
}

fn until_holds(children: &[Ltlf], trace: &[Interpretation], pos: usize) -> bool {
    let n = trace.len();
    (pos..n).any(|j| {
        let tail_holds = if children.len() == 2 {
            children[1].truth_on_trace(trace, j)
        } else {
            until_holds(&children[1..], trace, j)
        };
        tail_holds && (pos..j).all(|i| children[0].truth_on_trace(trace, i))
    })
}

fn release_holds(children: &[Ltlf], trace: &[Interpretation], pos: usize) -> bool {
    let n = trace.len();
    (pos..n).all(|j| {
        let tail_holds = if children.len() == 2 {
            children[1].truth_on_trace(trace, j)
        } else {
            release_holds(&children[1..], trace, j)
        };
        tail_holds || (pos..j).any(|i| children[0].truth_on_trace(trace, i))
    })
}

fn require_arity(operator: &'static str, minimum: usize, got: usize) -> Result<(), FormulaError> {
    if got < minimum {
        Err(FormulaError::EmptyOperands {
            operator,
            minimum,
            got,
        })
    } else {
        Ok(())
    }
}

/// Mirrors `BinaryOperator._popup`: splice a same-type child's own children
/// in place instead of nesting, one level per call (construction recurses
/// naturally since children are already-normalized `Ltlf` values).
fn flatten(children: impl IntoIterator<Item = Ltlf>, splice: impl Fn(Ltlf) -> Vec<Ltlf>) -> Vec<Ltlf> {
    children.into_iter().flat_map(splice).collect()
}

fn collapse_set(members: BTreeSet<Ltlf>, empty: Ltlf, wrap: impl FnOnce(BTreeSet<Ltlf>) -> Ltlf) -> Ltlf {
    match members.len() {
        0 => empty,
        1 => members.into_iter().next().unwrap(),
        _ => wrap(members),
    }
}

impl fmt::Display for Ltlf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ltlf::True => write!(f, "tt"),
            Ltlf::False => write!(f, "ff"),
            Ltlf::Atomic(s) => write!(f, "{s}"),
            Ltlf::Not(inner) => write!(f, "!{inner}"),
            Ltlf::And(cs) => write_infix(f, cs.iter(), "&&"),
            Ltlf::Or(cs) => write_infix(f, cs.iter(), "||"),
            Ltlf::Implies(cs) => write_infix(f, cs.iter(), "->"),
            Ltlf::Equivalence(cs) => write_infix(f, cs.iter(), "<->"),
            Ltlf::Next(inner) => write!(f, "X{{{inner}}}"),
            Ltlf::WeakNext(inner) => write!(f, "WX{{{inner}}}"),
            Ltlf::Until(cs) => write_infix(f, cs.iter(), "U"),
            Ltlf::Release(cs) => write_infix(f, cs.iter(), "R"),
            Ltlf::Eventually(inner) => write!(f, "F{{{inner}}}"),
            Ltlf::Always(inner) => write!(f, "G{{{inner}}}"),
        }
    }
}

fn write_infix<'a>(
    f: &mut fmt::Formatter<'_>,
    children: impl Iterator<Item = &'a Ltlf>,
    op: &str,
) -> fmt::Result {
    write!(f, "(")?;
    for (i, c) in children.enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, ")")
}
