//! Component A: atomic propositions and truth assignments over them.

use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    rc::Rc,
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// An opaque, value-typed proposition name.
///
/// Two symbols are equal iff their names are equal; ordering is lexicographic
/// on the name, which is what gives macro-states and propositional formulas a
/// deterministic canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol(Rc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(Rc::from(name))
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// `Rc<str>` round-trips through serde fine for Serialize (it derefs to `str`),
// but the blanket `Deserialize` impl for `Rc<T>` requires `T: Deserialize`,
// which `str` is not (unsized). Go through `String` by hand instead.
impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer).map_err(D::Error::custom)?;
        Ok(Symbol::new(name))
    }
}

/// The reserved alphabet symbol denoting "this is the last letter of the trace".
///
/// Injected into every alphabet by the automaton builder; never part of a
/// user-supplied label set.
pub fn last_symbol() -> Symbol {
    Symbol::new("LAST")
}

/// A finite set of [`Symbol`]s considered true at one position of a trace;
/// all symbols outside the set are considered false.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Interpretation(BTreeSet<Symbol>);

impl Interpretation {
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Interpretation(symbols.into_iter().collect())
    }

    /// The all-false interpretation (`PLFalseInterpretation`).
    pub fn empty() -> Self {
        Interpretation(BTreeSet::new())
    }

    /// The interpretation making every symbol of `alphabet` true
    /// (`PLTrueInterpretation`, restricted to a concrete alphabet).
    pub fn full(alphabet: &BTreeSet<Symbol>) -> Self {
        Interpretation(alphabet.clone())
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains(symbol)
    }

    pub fn symbols(&self) -> &BTreeSet<Symbol> {
        &self.0
    }

    pub fn has_last(&self) -> bool {
        self.0.iter().any(|s| s.as_str() == "LAST")
    }
}

impl Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<Symbol> for Interpretation {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Interpretation(iter.into_iter().collect())
    }
}
