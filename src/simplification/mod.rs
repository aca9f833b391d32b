//! Expression simplification.
//!
//! A rule-based engine that normalizes complexity expressions: exact
//! algebraic coalescing (polylog factors, coefficient merging) followed
//! by asymptotic dominant-term extraction over `+`/`max` chains, applied
//! bottom-up to a fixpoint.

mod engine;
pub mod rules;

pub use engine::Simplifier;

use crate::core::expr::Complexity;

/// Simplify with the default rule set.
pub fn simplify_expr(expr: Complexity) -> Complexity {
    Simplifier::new().simplify(expr)
}

/// Simplify with value-exact rules only (keeps every summand).
pub fn simplify_exact(expr: Complexity) -> Complexity {
    Simplifier::new().exact_only(true).simplify(expr)
}
