//! Cross-cutting scenarios: the §8 scenario table exercised end-to-end
//! through `compile`/`accepts`, plus the NNF/delta/automaton-agreement
//! properties on hand-picked formulas and traces. Per-module unit tests stay
//! colocated with their source; this file is for checks that span the whole
//! pipeline, mirroring `examples/Brahmastra-Labs-logicaffeine/tests/`'s
//! role as the crate's integration layer.

use ltlf_dfa::{
    accepts, compile, delta, last_symbol, to_nnf, truth_on_trace, CompileOptions, Interpretation,
    Ltlf, Symbol,
};

fn atom(name: &str) -> Ltlf {
    Ltlf::atomic(name)
}

fn letter(symbols: &[&str]) -> Interpretation {
    Interpretation::new(symbols.iter().map(|s| Symbol::new(*s)))
}

fn compiled_automaton(phi: &Ltlf) -> ltlf_dfa::Automaton {
    let compiled = compile(phi, &CompileOptions::default()).expect("formula compiles");
    match compiled {
        ltlf_dfa::Compiled::Materialized(automaton) => automaton,
        ltlf_dfa::Compiled::OnTheFly(_) => unreachable!("default options build in batch mode"),
    }
}

/// Attach `LAST` to the final letter of a trace, the way every caller in this
/// crate (the CLI, `accepts` itself) is expected to before driving an
/// automaton by hand; `accepts` re-derives this internally so tests can also
/// pass bare traces directly to it.
fn with_last(trace: &[Interpretation]) -> Vec<Interpretation> {
    let mut out: Vec<Interpretation> = trace.to_vec();
    if let Some(last) = out.last_mut() {
        let mut symbols = last.symbols().clone();
        symbols.insert(last_symbol());
        *last = Interpretation::new(symbols);
    }
    out
}

macro_rules! scenario {
    ($name:ident, $phi:expr, $trace:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let phi = $phi;
            let trace = $trace;
            let automaton = compiled_automaton(&phi);
            assert_eq!(
                accepts(&automaton, &trace).unwrap(),
                $expected,
                "automaton acceptance mismatch for {phi}"
            );
            assert_eq!(
                truth_on_trace(&phi, &trace, 0),
                $expected,
                "reference semantics mismatch for {phi}"
            );
        }
    };
}

scenario!(
    scenario_1_eventually_a_accepts,
    Ltlf::eventually(atom("a")),
    vec![letter(&[]), letter(&["a"])],
    true
);

scenario!(
    scenario_2_eventually_a_rejects_without_a,
    Ltlf::eventually(atom("a")),
    vec![letter(&["b"]), letter(&["b"])],
    false
);

scenario!(
    scenario_3_always_a_accepts,
    Ltlf::always(atom("a")),
    vec![letter(&["a"]), letter(&["a"]), letter(&["a"])],
    true
);

scenario!(
    scenario_4_always_a_rejects_on_a_gap,
    Ltlf::always(atom("a")),
    vec![letter(&["a"]), letter(&[]), letter(&["a"])],
    false
);

scenario!(
    scenario_5_until_a_b_accepts,
    Ltlf::until(vec![atom("a"), atom("b")]).unwrap(),
    vec![letter(&["a"]), letter(&["a"]), letter(&["b"])],
    true
);

scenario!(
    scenario_6_next_a_accepts_one_step_ahead,
    Ltlf::next(atom("a")),
    vec![letter(&[]), letter(&["a"])],
    true
);

scenario!(
    scenario_6_next_a_rejects_at_last_position,
    Ltlf::next(atom("a")),
    vec![letter(&["a"])],
    false
);

scenario!(
    scenario_7_weak_next_vacuously_accepts_at_end,
    Ltlf::weak_next(atom("a")),
    vec![letter(&["a"])],
    true
);

scenario!(
    scenario_8_implies_eventually_accepts,
    Ltlf::implies(vec![atom("a"), Ltlf::eventually(atom("b"))]).unwrap(),
    vec![letter(&["a"]), letter(&[]), letter(&["b"])],
    true
);

scenario!(
    scenario_8_implies_eventually_rejects_without_consequent,
    Ltlf::implies(vec![atom("a"), Ltlf::eventually(atom("b"))]).unwrap(),
    vec![letter(&["a"]), letter(&[]), letter(&[])],
    false
);

/// §8 property 1: `to_nnf` is idempotent on a representative sample of
/// formulas mixing every operator.
#[test]
fn nnf_idempotence_across_operator_mix() {
    let samples = [
        Ltlf::until(vec![atom("a"), Ltlf::next(atom("b"))])
            .unwrap()
            .negate(),
        Ltlf::implies(vec![atom("a"), Ltlf::always(atom("b"))]).unwrap(),
        Ltlf::equivalence([atom("a"), Ltlf::eventually(atom("b"))]).unwrap(),
        Ltlf::release(vec![atom("a"), atom("b")]).unwrap().negate(),
    ];
    for phi in samples {
        let once = to_nnf(&phi);
        let twice = to_nnf(&once);
        assert_eq!(once, twice, "to_nnf not idempotent for {phi}");
    }
}

/// §8 property 2: NNF rewriting preserves semantics over every position of a
/// fixed trace.
#[test]
fn nnf_preserves_semantics_over_a_trace() {
    let trace = [letter(&["a"]), letter(&[]), letter(&["a", "b"])];
    let samples = [
        Ltlf::implies(vec![atom("a"), Ltlf::eventually(atom("b"))]).unwrap(),
        Ltlf::until(vec![atom("a"), atom("b")]).unwrap().negate(),
        Ltlf::always(atom("a")).negate(),
    ];
    for phi in samples {
        let nnf = to_nnf(&phi);
        for pos in 0..=trace.len() {
            assert_eq!(
                truth_on_trace(&phi, &trace, pos.min(trace.len())),
                truth_on_trace(&nnf, &trace, pos.min(trace.len())),
                "nnf changed semantics for {phi} at position {pos}"
            );
        }
    }
}

/// §8 property 3: delta soundness — stepping one position with `delta`
/// agrees with directly evaluating the reference semantics one position
/// ahead, for every prefix of a fixed trace.
#[test]
fn delta_soundness_along_a_trace() {
    let trace = [letter(&["a"]), letter(&["a"]), letter(&["b"])];
    let phi = to_nnf(&Ltlf::until(vec![atom("a"), atom("b")]).unwrap());

    // Walk delta forward, tracking the live macro-state as a single
    // conjunctive formula the way the automaton builder does internally.
    let mut state = phi.clone();
    for (pos, letter) in trace.iter().enumerate() {
        assert_eq!(
            truth_on_trace(&phi, &trace, pos),
            state.truth_on_trace(&trace, pos),
            "delta soundness failed before stepping position {pos}"
        );
        let is_last = pos == trace.len() - 1;
        let letter_with_last = if is_last {
            let mut symbols = letter.symbols().clone();
            symbols.insert(last_symbol());
            Interpretation::new(symbols)
        } else {
            letter.clone()
        };
        let residual = delta(&state, &letter_with_last, is_last).unwrap();
        state = step_state(&residual);
    }
    assert_eq!(
        truth_on_trace(&phi, &trace, trace.len()),
        state.truth_on_trace(&trace, trace.len())
    );
}

/// Collapse a delta residual (a `Pl` over subformula atoms) down to the
/// single formula it stands for, by conjoining every subformula atom that
/// appears in it — this is exactly what the automaton builder's
/// `minimal_models`-then-union step does in DFA mode, re-derived here at the
/// single-formula level instead of through `MacroState`.
fn step_state(residual: &ltlf_dfa::Pl) -> Ltlf {
    let atoms: Vec<Ltlf> = residual
        .atoms()
        .into_iter()
        .filter_map(|a| match a {
            ltlf_dfa::Atom::Subformula(f) => Some(f),
            ltlf_dfa::Atom::Symbol(_) => None,
        })
        .collect();
    if atoms.is_empty() {
        Ltlf::True
    } else {
        Ltlf::and(atoms).expect("And has no arity precondition")
    }
}

/// §8 property 4: automaton agreement — `accepts(compile(phi), trace) ==
/// truth_on_trace(phi, trace, 0)` across a spread of formulas and traces,
/// including both minimized and unminimized compilation.
#[test]
fn automaton_agrees_with_reference_semantics() {
    let cases: Vec<(Ltlf, Vec<Interpretation>)> = vec![
        (Ltlf::eventually(atom("a")), vec![letter(&[]), letter(&["a"])]),
        (Ltlf::always(atom("a")), vec![letter(&["a"]), letter(&[])]),
        (
            Ltlf::until(vec![atom("a"), atom("b")]).unwrap(),
            vec![letter(&["a"]), letter(&["b"])],
        ),
        (
            Ltlf::implies(vec![atom("a"), Ltlf::eventually(atom("b"))]).unwrap(),
            vec![letter(&["a"]), letter(&[]), letter(&[])],
        ),
    ];
    for (phi, trace) in cases {
        for minimize in [false, true] {
            let options = CompileOptions {
                minimize,
                ..Default::default()
            };
            let compiled = compile(&phi, &options).unwrap();
            let automaton = compiled.as_materialized().unwrap();
            assert_eq!(
                accepts(automaton, &trace).unwrap(),
                truth_on_trace(&phi, &trace, 0),
                "automaton disagreed with reference semantics for {phi} (minimize={minimize})"
            );
        }
    }
}

/// §8 property 5: removing a duplicate child or collapsing a singleton
/// commutative node must not change acceptance.
#[test]
fn duplicate_children_collapse_without_changing_semantics() {
    let with_duplicate = Ltlf::and([atom("a"), atom("a"), atom("b")]).unwrap();
    let deduplicated = Ltlf::and([atom("a"), atom("b")]).unwrap();
    assert_eq!(with_duplicate, deduplicated);

    let trace = with_last(&[letter(&["a", "b"])]);
    assert_eq!(
        truth_on_trace(&with_duplicate, &trace, 0),
        truth_on_trace(&deduplicated, &trace, 0)
    );
}

/// §8 property 8: after `minimize`, no two distinct states of the resulting
/// automaton are behaviorally equivalent (same acceptance under every
/// letter, recursively) — checked directly via a bounded bisimulation search
/// instead of re-running Hopcroft.
#[test]
fn minimize_leaves_no_equivalent_state_pairs() {
    let phi = Ltlf::until(vec![atom("a"), Ltlf::and([atom("a"), atom("b")]).unwrap()]).unwrap();
    let options = CompileOptions {
        minimize: true,
        ..Default::default()
    };
    let compiled = compile(&phi, &options).unwrap();
    let automaton = compiled.as_materialized().unwrap();

    let states: Vec<_> = automaton.states().iter().cloned().collect();
    for i in 0..states.len() {
        for j in (i + 1)..states.len() {
            assert!(
                !bisimilar(automaton, &states[i], &states[j], 4),
                "minimize left equivalent states {:?} and {:?}",
                states[i],
                states[j]
            );
        }
    }
}

fn bisimilar(
    automaton: &ltlf_dfa::Automaton,
    a: &ltlf_dfa::MacroState,
    b: &ltlf_dfa::MacroState,
    depth: usize,
) -> bool {
    if automaton.is_accepting(a) != automaton.is_accepting(b) {
        return false;
    }
    if depth == 0 {
        return true;
    }
    for symbol in automaton.alphabet() {
        let letter = Interpretation::new([symbol.clone()]);
        let next_a = automaton.successors(a, &letter).cloned();
        let next_b = automaton.successors(b, &letter).cloned();
        match (next_a, next_b) {
            (Some(na), Some(nb)) => {
                if na != nb && !bisimilar(automaton, &na, &nb, depth - 1) {
                    return false;
                }
            }
            (None, None) => {}
            _ => return false,
        }
    }
    true
}
