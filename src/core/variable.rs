//! Input-size variables.
//!
//! Analysis results are stated over *canonical* variables: renamed
//! input-size parameters drawn from the sequence `n, m, k, p, q, …` in
//! declaration order, producing clean Big-O output regardless of what the
//! source program called them.

use std::fmt;
use std::sync::Arc;

/// What a size variable measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarKind {
    /// A numeric input-size parameter (e.g. `int n`).
    #[default]
    InputSize,
    /// The element count of a collection parameter.
    DataCount,
    /// The length of a string parameter.
    StringLength,
    /// Anything else the extractor chose to track.
    Generic,
}

/// A named input-size variable.
///
/// Identity (equality, hashing, ordering) is by name only; the kind is a
/// descriptive tag carried along for tooltips.
#[derive(Debug, Clone)]
pub struct Variable {
    name: Arc<str>,
    kind: VarKind,
}

/// The canonical single-letter sequence, in assignment order.
const CANONICAL: [&str; 8] = ["n", "m", "k", "p", "q", "r", "s", "t"];

impl Variable {
    /// Create a variable with the given name and kind.
    pub fn new(name: impl AsRef<str>, kind: VarKind) -> Self {
        Variable {
            name: Arc::from(name.as_ref()),
            kind,
        }
    }

    /// Create a generic-kind variable.
    pub fn named(name: impl AsRef<str>) -> Self {
        Variable::new(name, VarKind::Generic)
    }

    /// The canonical variable at `index` in declaration order:
    /// `n, m, k, p, q, r, s, t`, then `x1, x2, …`.
    pub fn canonical(index: usize, kind: VarKind) -> Self {
        match CANONICAL.get(index) {
            Some(name) => Variable::new(name, kind),
            None => Variable::new(format!("x{}", index - CANONICAL.len() + 1), kind),
        }
    }

    /// The conventional primary variable `n`.
    pub fn n() -> Self {
        Variable::canonical(0, VarKind::InputSize)
    }

    /// The variable's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable's kind tag.
    #[inline]
    pub fn kind(&self) -> VarKind {
        self.kind
    }
}

impl PartialEq for Variable {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_sequence_order() {
        let names: Vec<String> = (0..10)
            .map(|i| Variable::canonical(i, VarKind::InputSize).name().to_owned())
            .collect();
        assert_eq!(
            names,
            ["n", "m", "k", "p", "q", "r", "s", "t", "x1", "x2"]
        );
    }

    #[test]
    fn identity_is_by_name_only() {
        let a = Variable::new("n", VarKind::InputSize);
        let b = Variable::new("n", VarKind::DataCount);
        assert_eq!(a, b);
    }
}
