//! Component H: typed failures, one enum per failure domain,
//! `thiserror`-derived, one `#[error(...)]` message per variant.

use crate::symbol::Symbol;

/// Precondition violations raised while constructing an `Ltlf` node or while
/// running `delta` on a formula that does not satisfy `delta`'s contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("`{operator}` requires at least {minimum} operand(s), got {got}")]
    EmptyOperands {
        operator: &'static str,
        minimum: usize,
        got: usize,
    },
    #[error("delta requires NNF input; found disallowed node: {formula}")]
    NotNnf { formula: String },
}

/// Run-time failures surfaced by the automaton builder or by `accepts`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomatonError {
    #[error("symbol `{0}` does not belong to the automaton's alphabet")]
    UnknownSymbol(Symbol),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}
