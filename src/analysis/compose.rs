//! Composition rules.
//!
//! Per-statement costs combine up to method level under three rules:
//! sequential blocks sum (the simplifier then extracts the dominant
//! summand — constants absorb), nested loops multiply the iteration
//! count into the body, and branches take the maximum since every branch
//! with unknown taken-frequency is considered taken.

use crate::core::expr::Complexity;
use crate::simplification::simplify_expr;

/// Sequential composition of statement costs.
pub fn sequence(parts: impl IntoIterator<Item = Complexity>) -> Complexity {
    let mut acc = Complexity::constant(0.0);
    for part in parts {
        acc = Complexity::plus(acc, part);
    }
    acc
}

/// Nested composition: iteration count times body cost.
pub fn nest(iterations: Complexity, body: Complexity) -> Complexity {
    // A zero-cost body still pays the loop control per iteration.
    let body = if body.as_constant() == Some(0.0) {
        Complexity::one()
    } else {
        body
    };
    Complexity::multiply(iterations, body)
}

/// Branch composition: maximum over branch costs.
pub fn branch(branches: impl IntoIterator<Item = Complexity>) -> Complexity {
    let mut iter = branches.into_iter();
    let Some(first) = iter.next() else {
        return Complexity::one();
    };
    iter.fold(first, Complexity::max_of)
}

/// Substitute a callee's formal size variables with caller-side
/// expressions and simplify.
pub fn apply_call(
    callee_bound: &Complexity,
    substitutions: &[(crate::core::variable::Variable, Complexity)],
) -> Complexity {
    let mut bound = callee_bound.clone();
    for (formal, actual) in substitutions {
        bound = bound.substitute(formal, actual);
    }
    simplify_expr(bound)
}
