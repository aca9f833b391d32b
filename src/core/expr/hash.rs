//! Structural hashing for complexity expressions.
//!
//! Every `Complexity` caches a structural hash computed once at
//! construction. Equality checks reject on hash mismatch before falling
//! back to a full structural comparison, and the simplifier's cycle
//! detection keys on the cached value directly.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::{Complexity, ComplexityKind};

/// Compute the structural hash for an expression kind.
///
/// Sub-expressions contribute their own cached hashes, so hashing a node
/// is O(children), not O(subtree).
pub fn compute_complexity_hash(kind: &ComplexityKind) -> u64 {
    let mut hasher = FxHasher::default();
    hash_kind(kind, &mut hasher);
    hasher.finish()
}

fn hash_sub(expr: &Complexity, state: &mut FxHasher) {
    expr.hash.hash(state);
}

fn hash_kind(kind: &ComplexityKind, state: &mut FxHasher) {
    std::mem::discriminant(kind).hash(state);
    match kind {
        ComplexityKind::Constant(c) => c.to_bits().hash(state),
        ComplexityKind::Variable(v) => v.hash(state),
        ComplexityKind::Linear { coeff, var } => {
            coeff.to_bits().hash(state);
            var.hash(state);
        }
        ComplexityKind::Polynomial { var, terms } => {
            var.hash(state);
            terms.len().hash(state);
            for &(deg, coeff) in terms {
                deg.hash(state);
                coeff.to_bits().hash(state);
            }
        }
        ComplexityKind::Logarithmic { coeff, base, var } => {
            coeff.to_bits().hash(state);
            base.to_bits().hash(state);
            var.hash(state);
        }
        ComplexityKind::LogOf { base, inner } => {
            base.to_bits().hash(state);
            hash_sub(inner, state);
        }
        ComplexityKind::PolyLog {
            var,
            degree,
            log_exponent,
        } => {
            var.hash(state);
            degree.to_bits().hash(state);
            log_exponent.to_bits().hash(state);
        }
        ComplexityKind::Exponential { base, var } => {
            base.to_bits().hash(state);
            var.hash(state);
        }
        ComplexityKind::Factorial(v) | ComplexityKind::InverseAckermann(v) => v.hash(state),
        ComplexityKind::Power { base, exponent } => {
            hash_sub(base, state);
            exponent.to_bits().hash(state);
        }
        ComplexityKind::Binary { op, left, right } => {
            op.hash(state);
            hash_sub(left, state);
            hash_sub(right, state);
        }
        ComplexityKind::Integral {
            integrand,
            bound_var,
            lower,
            upper,
            bound,
        } => {
            hash_sub(integrand, state);
            bound_var.hash(state);
            hash_sub(lower, state);
            hash_sub(upper, state);
            hash_sub(bound, state);
        }
        ComplexityKind::Recurrence(rec) => {
            rec.variable().hash(state);
            rec.terms().len().hash(state);
            for term in rec.terms() {
                term.coefficient.to_bits().hash(state);
                term.scale.to_bits().hash(state);
                term.reduction.to_bits().hash(state);
            }
            hash_sub(rec.work(), state);
            hash_sub(rec.base_case(), state);
        }
        ComplexityKind::Amortized {
            amortized,
            worst,
            method,
            potential,
        } => {
            hash_sub(amortized, state);
            hash_sub(worst, state);
            method.hash(state);
            potential.hash(state);
        }
        ComplexityKind::Memory(profile) => {
            hash_sub(&profile.total, state);
            hash_sub(&profile.stack, state);
            hash_sub(&profile.heap, state);
            hash_sub(&profile.auxiliary, state);
            profile.in_place.hash(state);
            profile.tail_recursive.hash(state);
            profile.allocations.len().hash(state);
            for site in &profile.allocations {
                site.label.hash(state);
                hash_sub(&site.size, state);
                site.on_heap.hash(state);
            }
        }
    }
}
