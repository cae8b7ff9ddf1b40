//! Component D: rewrite a formula so negation appears only on atoms.
//!
//! Two passes: [`desugar`] first expands `Implies`/`Equivalence`/`Eventually`/
//! `Always` into `{And, Or, Not, Until, Release}` regardless of polarity (the
//! "expanded to their base form before rewriting" rule), then `to_nnf`'s
//! inner `rewrite` pushes negation inward over the remaining operators via
//! duality, one match arm per operator pair instead of a table of
//! operator-to-dual-operator links.

use std::rc::Rc;

use crate::formula::Ltlf;

/// Expand `Implies`/`Equivalence`/`Eventually`/`Always` away, at every
/// polarity, before any negation-pushing happens.
pub fn desugar(formula: &Ltlf) -> Ltlf {
    match formula {
        Ltlf::True | Ltlf::False | Ltlf::Atomic(_) => formula.clone(),
        Ltlf::Not(inner) => Ltlf::Not(Rc::new(desugar(inner))),
        Ltlf::And(cs) => Ltlf::and(cs.iter().map(desugar)).expect("And arity preserved by map"),
        Ltlf::Or(cs) => Ltlf::or(cs.iter().map(desugar)).expect("Or arity preserved by map"),
        Ltlf::Next(inner) => Ltlf::next(desugar(inner)),
        Ltlf::WeakNext(inner) => Ltlf::weak_next(desugar(inner)),
        Ltlf::Until(cs) => {
            Ltlf::until(cs.iter().map(desugar).collect()).expect("Until arity preserved by map")
        }
        Ltlf::Release(cs) => {
            Ltlf::release(cs.iter().map(desugar).collect()).expect("Release arity preserved by map")
        }
        Ltlf::Implies(cs) => {
            let desugared: Vec<Ltlf> = cs.iter().map(desugar).collect();
            let (antecedents, consequent) = desugared.split_at(desugared.len() - 1);
            let antecedent = Ltlf::and(antecedents.iter().cloned())
                .expect("Implies always has at least one antecedent");
            Ltlf::or([antecedent.negate(), consequent[0].clone()])
                .expect("binary Or is always constructible")
        }
        Ltlf::Equivalence(cs) => {
            let desugared: Vec<Ltlf> = cs.iter().map(desugar).collect();
            let all_true =
                Ltlf::and(desugared.iter().cloned()).expect("Equivalence has >= 2 members");
            let all_false = Ltlf::and(desugared.iter().map(Ltlf::negate))
                .expect("Equivalence has >= 2 members");
            Ltlf::or([all_true, all_false]).expect("binary Or is always constructible")
        }
        Ltlf::Eventually(inner) => {
            Ltlf::until(vec![Ltlf::True, desugar(inner)]).expect("binary Until is always constructible")
        }
        Ltlf::Always(inner) => {
            Ltlf::release(vec![Ltlf::False, desugar(inner)])
                .expect("binary Release is always constructible")
        }
    }
}

/// Push negation down to the atoms of an already-[`desugar`]red formula.
fn rewrite(formula: &Ltlf) -> Ltlf {
    match formula {
        Ltlf::True | Ltlf::False | Ltlf::Atomic(_) => formula.clone(),
        Ltlf::Not(inner) => rewrite_not(inner),
        Ltlf::And(cs) => Ltlf::and(cs.iter().map(rewrite)).expect("And arity preserved by map"),
        Ltlf::Or(cs) => Ltlf::or(cs.iter().map(rewrite)).expect("Or arity preserved by map"),
        Ltlf::Next(inner) => Ltlf::next(rewrite(inner)),
        Ltlf::WeakNext(inner) => Ltlf::weak_next(rewrite(inner)),
        Ltlf::Until(cs) => {
            Ltlf::until(cs.iter().map(rewrite).collect()).expect("Until arity preserved by map")
        }
        Ltlf::Release(cs) => {
            Ltlf::release(cs.iter().map(rewrite).collect()).expect("Release arity preserved by map")
        }
        Ltlf::Implies(_) | Ltlf::Equivalence(_) | Ltlf::Eventually(_) | Ltlf::Always(_) => {
            unreachable!("desugar removes these operators before rewrite ever sees them")
        }
    }
}

fn rewrite_not(inner: &Ltlf) -> Ltlf {
    tracing::trace!(node = %inner, "pushing negation inward");
    match inner {
        Ltlf::True => Ltlf::False,
        Ltlf::False => Ltlf::True,
        Ltlf::Atomic(_) => Ltlf::Not(Rc::new(inner.clone())),
        Ltlf::Not(grandchild) => rewrite(grandchild),
        Ltlf::And(cs) => {
            Ltlf::or(cs.iter().map(|c| rewrite(&c.negate()))).expect("Or arity preserved by map")
        }
        Ltlf::Or(cs) => {
            Ltlf::and(cs.iter().map(|c| rewrite(&c.negate()))).expect("And arity preserved by map")
        }
        Ltlf::Next(f) => Ltlf::weak_next(rewrite(&f.negate())),
        Ltlf::WeakNext(f) => Ltlf::next(rewrite(&f.negate())),
        Ltlf::Until(cs) => Ltlf::release(cs.iter().map(|c| rewrite(&c.negate())).collect())
            .expect("Release arity preserved by map"),
        Ltlf::Release(cs) => Ltlf::until(cs.iter().map(|c| rewrite(&c.negate())).collect())
            .expect("Until arity preserved by map"),
        Ltlf::Implies(_) | Ltlf::Equivalence(_) | Ltlf::Eventually(_) | Ltlf::Always(_) => {
            unreachable!("desugar removes these operators before rewrite ever sees them")
        }
    }
}

/// Rewrite `φ` into Negative Normal Form: negation appears only on atoms.
pub fn to_nnf(formula: &Ltlf) -> Ltlf {
    rewrite(&desugar(formula))
}
