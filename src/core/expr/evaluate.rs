//! Numeric evaluation of complexity expressions.
//!
//! `evaluate` substitutes concrete sizes for variables and computes the
//! resulting work figure. The result is `Option<f64>`: `None` means
//! *undefined* — a variable is missing from the assignment, a logarithm
//! hit a non-positive argument, or a recurrence needs the solver (the
//! unrolling fallback only covers n <= 100).

use num_traits::Float;
use rustc_hash::FxHashMap;

use super::{Complexity, ComplexityKind};

/// Variable assignment for evaluation, keyed by variable name.
pub type Assignment = FxHashMap<String, f64>;

/// log base `base` of `x`, `None` when `x <= 0`.
fn checked_log<T: Float>(base: T, x: T) -> Option<T> {
    if x <= T::zero() {
        return None;
    }
    Some(x.ln() / base.ln())
}

/// Integer factorial for values that fit in f64 without overflow.
fn checked_factorial(x: f64) -> Option<f64> {
    if x < 0.0 || x > 170.0 {
        return None;
    }
    let n = x.round() as u32;
    let mut acc = 1.0_f64;
    for i in 2..=n {
        acc *= f64::from(i);
    }
    Some(acc)
}

/// The inverse Ackermann function, as the usual step table. Effectively
/// constant for every input a program will ever see.
fn inverse_ackermann(x: f64) -> f64 {
    if x <= 3.0 {
        1.0
    } else if x <= 7.0 {
        2.0
    } else if x <= 61.0 {
        3.0
    } else {
        4.0
    }
}

impl Complexity {
    /// Evaluate at the given assignment.
    ///
    /// Returns a non-negative figure, or `None` when undefined.
    pub fn evaluate(&self, vars: &Assignment) -> Option<f64> {
        let lookup = |name: &str| vars.get(name).copied();

        match &self.kind {
            ComplexityKind::Constant(c) => Some(*c),
            ComplexityKind::Variable(v) => lookup(v.name()),
            ComplexityKind::Linear { coeff, var } => Some(coeff * lookup(var.name())?),
            ComplexityKind::Polynomial { var, terms } => {
                let x = lookup(var.name())?;
                let mut acc = 0.0;
                for &(deg, coeff) in terms {
                    acc += coeff * x.powi(deg as i32);
                }
                Some(acc)
            }
            ComplexityKind::Logarithmic { coeff, base, var } => {
                Some(coeff * checked_log(*base, lookup(var.name())?)?)
            }
            ComplexityKind::LogOf { base, inner } => {
                checked_log(*base, inner.evaluate(vars)?)
            }
            ComplexityKind::PolyLog {
                var,
                degree,
                log_exponent,
            } => {
                let x = lookup(var.name())?;
                if x <= 0.0 {
                    return None;
                }
                Some(x.powf(*degree) * checked_log(2.0, x)?.powf(*log_exponent))
            }
            ComplexityKind::Exponential { base, var } => Some(base.powf(lookup(var.name())?)),
            ComplexityKind::Factorial(var) => checked_factorial(lookup(var.name())?),
            ComplexityKind::Power { base, exponent } => {
                Some(base.evaluate(vars)?.powf(*exponent))
            }
            ComplexityKind::InverseAckermann(var) => {
                Some(inverse_ackermann(lookup(var.name())?))
            }
            ComplexityKind::Binary { op, left, right } => {
                let l = left.evaluate(vars)?;
                let r = right.evaluate(vars)?;
                Some(match op {
                    super::BinaryOp::Plus => l + r,
                    super::BinaryOp::Multiply => l * r,
                    super::BinaryOp::Max => l.max(r),
                    super::BinaryOp::Min => l.min(r),
                })
            }
            // The integral's conservative bound stands in for the
            // deferred closed form.
            ComplexityKind::Integral { bound, .. } => bound.evaluate(vars),
            ComplexityKind::Recurrence(rec) => {
                let n = lookup(rec.variable().name())?;
                rec.unroll(n)
            }
            ComplexityKind::Amortized { amortized, .. } => amortized.evaluate(vars),
            ComplexityKind::Memory(profile) => profile.total.evaluate(vars),
        }
    }
}
