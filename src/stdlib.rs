//! Standard-library complexity table.
//!
//! The full pre-computed library is an external collaborator; this module
//! fixes its contract and ships a compact built-in set sufficient for
//! realistic code. A lookup is keyed `(type, method, arity)` and yields
//! the documented complexity with a provenance tag and behavior flags.
//! Missing entries map to a conservative O(n) with `Heuristic`
//! provenance, so an unknown library call can never be under-reported.

use rustc_hash::FxHashMap;

use crate::core::expr::{AmortizedMethod, Complexity};
use crate::core::variable::Variable;

/// Where a table entry's figure comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Stated by the library's documentation.
    Documented,
    /// Confirmed from the library's source.
    Attested,
    /// Measured.
    Empirical,
    /// A guess; treat with reduced confidence.
    Heuristic,
}

/// Behavior flags attached to a table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryFlags {
    /// The figure is amortized over an operation sequence.
    pub amortized: bool,
    /// Execution is deferred (LINQ-style); cost is paid at enumeration.
    pub deferred_execution: bool,
    /// Worst case can backtrack (regex-style).
    pub backtracking_warning: bool,
    /// Cost depends on the input values, not just sizes.
    pub input_dependent: bool,
    /// Safe for concurrent use.
    pub thread_safe: bool,
    /// Randomized; the figure is expected-case.
    pub probabilistic: bool,
}

/// One table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryComplexity {
    /// The per-call cost in the receiver's size variable.
    pub complexity: Complexity,
    /// Provenance of the figure.
    pub provenance: Provenance,
    /// Behavior flags.
    pub flags: LibraryFlags,
    /// Free-form notes for tooltips.
    pub notes: Option<String>,
}

/// The lookup contract.
pub trait LibraryTable: Send + Sync {
    /// Look up `(type, method, arity)`. `None` means the table has no
    /// entry; callers then fall back to [`conservative_default`].
    fn lookup(&self, type_name: &str, method: &str, arity: usize) -> Option<LibraryComplexity>;
}

/// The O(n)/Heuristic entry substituted for every miss.
pub fn conservative_default() -> LibraryComplexity {
    LibraryComplexity {
        complexity: Complexity::variable(Variable::n()),
        provenance: Provenance::Heuristic,
        flags: LibraryFlags::default(),
        notes: Some("no table entry; conservative linear bound".to_owned()),
    }
}

/// Normalize receiver type spellings to table keys.
fn normalize_type(type_name: &str) -> &str {
    if type_name.ends_with("[]") {
        return "Array";
    }
    match type_name {
        "string" => "String",
        "Dictionary" | "SortedDictionary" => "Dictionary",
        other => other,
    }
}

/// Compact built-in table of documented container costs.
pub struct BuiltinTable {
    entries: FxHashMap<(&'static str, &'static str), LibraryComplexity>,
}

impl BuiltinTable {
    /// Build the default table.
    pub fn new() -> Self {
        let n = || Complexity::variable(Variable::n());
        let one = Complexity::one;
        let nlogn = || Complexity::polylog(Variable::n(), 1.0, 1.0);
        let logn = || Complexity::logarithmic(1.0, 2.0, Variable::n());
        let amortized_constant = || {
            Complexity::amortized(
                Complexity::one(),
                Complexity::variable(Variable::n()),
                AmortizedMethod::Aggregate,
                None,
            )
        };

        let documented = |complexity: Complexity| LibraryComplexity {
            complexity,
            provenance: Provenance::Documented,
            flags: LibraryFlags::default(),
            notes: None,
        };
        let documented_amortized = |complexity: Complexity| LibraryComplexity {
            complexity,
            provenance: Provenance::Documented,
            flags: LibraryFlags {
                amortized: true,
                ..LibraryFlags::default()
            },
            notes: None,
        };

        let mut entries: FxHashMap<(&'static str, &'static str), LibraryComplexity> =
            FxHashMap::default();

        // Arrays
        entries.insert(("Array", "Sort"), {
            let mut e = documented(nlogn());
            e.flags.input_dependent = true;
            e
        });
        entries.insert(("Array", "BinarySearch"), documented(logn()));
        entries.insert(("Array", "IndexOf"), documented(n()));
        entries.insert(("Array", "Contains"), documented(n()));
        entries.insert(("Array", "CopyTo"), documented(n()));
        entries.insert(("Array", "Reverse"), documented(n()));
        entries.insert(("Array", "Clone"), documented(n()));

        // List
        entries.insert(("List", "Add"), documented_amortized(amortized_constant()));
        entries.insert(("List", "Insert"), documented(n()));
        entries.insert(("List", "Remove"), documented(n()));
        entries.insert(("List", "RemoveAt"), documented(n()));
        entries.insert(("List", "Contains"), documented(n()));
        entries.insert(("List", "IndexOf"), documented(n()));
        entries.insert(("List", "Sort"), documented(nlogn()));
        entries.insert(("List", "Clear"), documented(n()));
        entries.insert(("List", "BinarySearch"), documented(logn()));

        // Dictionary / HashSet: hashed access is amortized constant.
        for ty in ["Dictionary", "HashSet"] {
            entries.insert((ty, "Add"), documented_amortized(amortized_constant()));
            entries.insert((ty, "Remove"), documented_amortized(amortized_constant()));
            entries.insert((ty, "Contains"), documented_amortized(amortized_constant()));
            entries.insert(
                (ty, "ContainsKey"),
                documented_amortized(amortized_constant()),
            );
            entries.insert((ty, "TryGetValue"), documented_amortized(amortized_constant()));
        }

        // Stack / Queue
        entries.insert(("Stack", "Push"), documented_amortized(amortized_constant()));
        entries.insert(("Stack", "Pop"), documented(one()));
        entries.insert(("Stack", "Peek"), documented(one()));
        entries.insert(("Queue", "Enqueue"), documented_amortized(amortized_constant()));
        entries.insert(("Queue", "Dequeue"), documented(one()));
        entries.insert(("Queue", "Peek"), documented(one()));

        // String
        entries.insert(("String", "Contains"), documented(n()));
        entries.insert(("String", "IndexOf"), documented(n()));
        entries.insert(("String", "Substring"), documented(n()));
        entries.insert(("String", "ToLower"), documented(n()));
        entries.insert(("String", "ToUpper"), documented(n()));
        entries.insert(("String", "Split"), documented(n()));

        // Console / Math: constant-time leaves.
        for method in ["WriteLine", "Write", "ReadLine"] {
            entries.insert(("Console", method), documented(one()));
        }
        for method in ["Abs", "Min", "Max", "Sqrt", "Pow", "Floor", "Ceiling", "Log"] {
            entries.insert(("Math", method), documented(one()));
        }

        // Random: probabilistic constant.
        entries.insert(("Random", "Next"), {
            let mut e = documented(one());
            e.flags.probabilistic = true;
            e
        });

        BuiltinTable { entries }
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        BuiltinTable::new()
    }
}

impl LibraryTable for BuiltinTable {
    fn lookup(&self, type_name: &str, method: &str, _arity: usize) -> Option<LibraryComplexity> {
        let normalized = normalize_type(type_name);
        if let Some(entry) = self.entries.get(&(normalized, method)) {
            return Some(entry.clone());
        }
        // Unknown receiver type: fall back to a unique method-name match
        // so `list.Sort()` on an untyped local still resolves.
        if normalized.is_empty() {
            let mut matches = self
                .entries
                .iter()
                .filter(|((_, m), _)| *m == method)
                .map(|(_, entry)| entry);
            if let Some(first) = matches.next() {
                if matches.next().is_none() {
                    return Some(first.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_sort_is_linearithmic() {
        let table = BuiltinTable::new();
        let entry = table.lookup("int[]", "Sort", 0).unwrap();
        assert_eq!(entry.complexity.big_o(), "O(n log n)");
        assert_eq!(entry.provenance, Provenance::Documented);
    }

    #[test]
    fn dictionary_lookup_is_amortized_constant() {
        let table = BuiltinTable::new();
        let entry = table.lookup("Dictionary", "ContainsKey", 1).unwrap();
        assert!(entry.flags.amortized);
        assert_eq!(entry.complexity.big_o(), "O(1)");
    }

    #[test]
    fn misses_fall_back_to_conservative_linear() {
        let table = BuiltinTable::new();
        assert!(table.lookup("Widget", "Frobnicate", 2).is_none());
        let fallback = conservative_default();
        assert_eq!(fallback.complexity.big_o(), "O(n)");
        assert_eq!(fallback.provenance, Provenance::Heuristic);
    }

    #[test]
    fn unique_method_names_resolve_without_receiver_type() {
        let table = BuiltinTable::new();
        let entry = table.lookup("", "Enqueue", 1).unwrap();
        assert!(entry.flags.amortized);
    }
}
