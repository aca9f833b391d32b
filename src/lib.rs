#![forbid(unsafe_code)]
//! Static Asymptotic Complexity Analysis
//!
//! A library that reads procedural source code and reports Big-O bounds
//! on running time (and optionally space), each with a confidence score
//! in `[0, 1]`.
//!
//! # Features
//! - A closed complexity algebra (constant, polynomial, polylog,
//!   exponential, factorial, amortized, memory, recurrence terms) with
//!   substitution, evaluation and canonical Big-O rendering
//! - Recurrence solving: Master Theorem cases 1–3, Akra–Bazzi with
//!   critical-exponent root finding, linear recurrences via
//!   characteristic-polynomial roots, mutual-recursion reduction
//! - Syntactic pattern extraction: loop bounds, recursion shapes,
//!   amortized idioms (dynamic arrays, union-find, binary counters)
//! - A speculative layer for incomplete code, stubs, declared
//!   complexity contracts and polymorphic call targets
//! - An incremental, cancellation-aware pipeline
//!
//! # Usage Examples
//!
//! ## One-shot analysis
//! ```
//! use asymptotica::analyze;
//!
//! let result = analyze(
//!     "int find(int[] arr, int x) {
//!        for (int i = 0; i < arr.Length; i++) {
//!          if (arr[i] == x) { return i; }
//!        }
//!        return -1;
//!      }",
//! );
//! assert_eq!(result.methods[0].time_complexity, "O(n)");
//! ```
//!
//! ## Configured analyzer
//! ```
//! use asymptotica::{Analyzer, AnalysisOptions};
//!
//! let analyzer = Analyzer::with_options(
//!     AnalysisOptions::new()
//!         .show_space_complexity(true)
//!         .min_confidence_to_emit(0.5),
//! );
//! let result = analyzer.analyze_str("int id(int x) { return x; }");
//! assert_eq!(result.methods.len(), 1);
//! ```

pub mod analysis;
pub mod classify;
mod core;
pub mod lang;
pub mod oracle;
pub mod pipeline;
pub mod recurrence;
pub mod semantic;
pub mod simplification;
pub mod solvers;
pub mod speculation;
pub mod stdlib;

#[cfg(test)]
mod tests;

// Re-export the core types at the crate root.
pub use core::visitor;
pub use core::{
    AllocationSite, AmortizedMethod, AnalysisError, Assignment, BinaryOp, Complexity,
    ComplexityKind, Confidence, Diagnostic, MemoryProfile, Severity, Span, VarKind, Variable,
};

// Re-export the pipeline surface.
pub use pipeline::{
    AnalysisCache, AnalysisOptions, Analyzer, CancellationToken, DocumentResult, MethodResult,
    NullListener, Phase, ProgressListener, ResultTag,
};

// Re-export frequently used pieces of the solving stack.
pub use recurrence::{RecurrenceRelation, RecurrenceTerm};
pub use simplification::{simplify_expr, Simplifier};
pub use solvers::{solve, MasterCase, SolverOutcome};
pub use speculation::parse_big_o;

/// Default maximum expression-tree depth accepted from hosts.
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum expression node count accepted from hosts.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Analyze a source document with default options.
///
/// # Example
/// ```
/// use asymptotica::analyze;
/// let result = analyze("int id(int x) { return x; }");
/// assert_eq!(result.methods.len(), 1);
/// ```
pub fn analyze(source: &str) -> DocumentResult {
    Analyzer::new().analyze_str(source)
}

/// Analyze a source document and return the Big-O string of a single
/// named method, or `None` when the method is missing.
///
/// # Example
/// ```
/// use asymptotica::analyze_method;
/// let bound = analyze_method(
///     "void touch(int[] a) { foreach (var x in a) { use(x); } }",
///     "touch",
/// );
/// assert_eq!(bound.as_deref(), Some("O(n)"));
/// ```
pub fn analyze_method(source: &str, method: &str) -> Option<String> {
    analyze(source)
        .method(method)
        .map(|m| m.time_complexity.clone())
}
