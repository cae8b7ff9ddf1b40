use std::collections::BTreeSet;

use clap::{Parser, ValueEnum};
use ltlf_dfa::{accepts, compile, CompileOptions, Interpretation, Ltlf, Symbol};
use tracing_subscriber::EnvFilter;

/// One of the canned formulas exercised by the scenario table this crate is
/// tested against; this binary does not parse LTLf concrete syntax.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Eventually,
    Always,
    Until,
    Next,
    WeakNext,
    ImpliesEventually,
}

impl Scenario {
    fn build(self) -> Ltlf {
        let a = Ltlf::atomic("a");
        let b = Ltlf::atomic("b");
        match self {
            Scenario::Eventually => Ltlf::eventually(a),
            Scenario::Always => Ltlf::always(a),
            Scenario::Until => Ltlf::until(vec![a, b]).expect("binary until is always constructible"),
            Scenario::Next => Ltlf::next(a),
            Scenario::WeakNext => Ltlf::weak_next(a),
            Scenario::ImpliesEventually => Ltlf::implies(vec![a, Ltlf::eventually(b)])
                .expect("binary implies is always constructible"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Compile a canned LTLf formula and run it over a trace")]
struct Args {
    /// Named formula to compile (see --help for the full list).
    #[arg(value_enum)]
    scenario: Scenario,

    /// JSON array of letters, e.g. `[["a"], [], ["a","b"]]`.
    #[arg(long)]
    trace: String,

    /// Run the subset-construction determinizer before minimizing.
    #[arg(long)]
    determinize: bool,

    /// Skip the minimization pass.
    #[arg(long)]
    no_minimize: bool,

    /// Print automaton state/transition counts.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_trace(json: &str) -> Result<Vec<Interpretation>, serde_json::Error> {
    let letters: Vec<Vec<String>> = serde_json::from_str(json)?;
    Ok(letters
        .into_iter()
        .map(|symbols| Interpretation::new(symbols.into_iter().map(Symbol::from)))
        .collect())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let phi = args.scenario.build();
    let trace = match parse_trace(&args.trace) {
        Ok(trace) => trace,
        Err(err) => {
            eprintln!("invalid --trace JSON: {err}");
            std::process::exit(1);
        }
    };

    let labels: BTreeSet<Symbol> = phi.find_labels();
    let options = CompileOptions {
        determinize: args.determinize,
        minimize: !args.no_minimize,
        labels: Some(labels),
        ..Default::default()
    };

    let compiled = match compile(&phi, &options) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprintln!("failed to compile formula: {err}");
            std::process::exit(1);
        }
    };
    let automaton = compiled
        .as_materialized()
        .expect("this binary always compiles in batch mode");

    if args.verbose {
        println!(
            "states = {}, transitions = {}, accepting = {}",
            automaton.states().len(),
            automaton.transitions.len(),
            automaton.is_accepting(automaton.initial())
        );
    }

    match accepts(automaton, &trace) {
        Ok(true) => println!("accept"),
        Ok(false) => println!("reject"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
