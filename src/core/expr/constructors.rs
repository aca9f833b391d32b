//! Smart constructors for complexity expressions.
//!
//! All construction funnels through these: they compute the structural
//! hash, fold trivial identities and collapse equivalent shapes so that
//! structurally equal asymptotic functions compare equal without running
//! the full simplifier:
//!
//! - `Polynomial` of degree 1 becomes `Linear`; `Linear(1, v)` becomes
//!   `Variable(v)`; single constant terms become `Constant`.
//! - `PolyLog(d, 0)` becomes `Polynomial`; `PolyLog(0, 1)` becomes
//!   `Logarithmic`.
//! - Binary identities: `x + 0 = x`, `x · 1 = x`, `x · 0 = 0`,
//!   `max(x, x) = x`, `min(x, x) = x`, and constant folding.
//! - Commutative operands are sorted by the total variant order so that
//!   `a + b` and `b + a` are the same tree.

use std::sync::Arc;

use super::hash::compute_complexity_hash;
use super::ordering::complexity_cmp;
use super::{
    AllocationSite, AmortizedMethod, BinaryOp, Complexity, ComplexityKind, MemoryProfile,
};
use crate::core::variable::Variable;
use crate::recurrence::RecurrenceRelation;

impl Complexity {
    pub(crate) fn from_kind(kind: ComplexityKind) -> Self {
        let hash = compute_complexity_hash(&kind);
        Complexity { hash, kind }
    }

    /// Constant work. Negative scalars clamp to zero.
    pub fn constant(value: f64) -> Self {
        Complexity::from_kind(ComplexityKind::Constant(value.max(0.0)))
    }

    /// O(1).
    pub fn one() -> Self {
        Complexity::constant(1.0)
    }

    /// A bare size variable.
    pub fn variable(var: Variable) -> Self {
        Complexity::from_kind(ComplexityKind::Variable(var))
    }

    /// coefficient · variable. `linear(1, v)` normalizes to `Variable(v)`,
    /// `linear(0, v)` to zero.
    pub fn linear(coeff: f64, var: Variable) -> Self {
        if coeff == 0.0 {
            return Complexity::constant(0.0);
        }
        if coeff == 1.0 {
            return Complexity::variable(var);
        }
        Complexity::from_kind(ComplexityKind::Linear { coeff, var })
    }

    /// Sparse polynomial from `(degree, coefficient)` pairs.
    ///
    /// Zero coefficients are dropped, terms are sorted by ascending degree
    /// and degenerate shapes collapse (degree-1-only to `Linear`, constant
    /// only to `Constant`, empty to zero).
    pub fn polynomial(var: Variable, terms: Vec<(u32, f64)>) -> Self {
        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(terms.len());
        for (deg, coeff) in terms {
            if coeff == 0.0 {
                continue;
            }
            match merged.iter_mut().find(|(d, _)| *d == deg) {
                Some((_, c)) => *c += coeff,
                None => merged.push((deg, coeff)),
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        merged.sort_by_key(|&(d, _)| d);

        match merged.as_slice() {
            [] => Complexity::constant(0.0),
            [(0, c)] => Complexity::constant(*c),
            [(1, c)] => Complexity::linear(*c, var),
            _ => Complexity::from_kind(ComplexityKind::Polynomial { var, terms: merged }),
        }
    }

    /// coefficient · log_base(variable).
    pub fn logarithmic(coeff: f64, base: f64, var: Variable) -> Self {
        if coeff == 0.0 {
            return Complexity::constant(0.0);
        }
        Complexity::from_kind(ComplexityKind::Logarithmic { coeff, base, var })
    }

    /// log_base of an arbitrary sub-expression. A variable inner collapses
    /// to `Logarithmic`; a constant inner is asymptotically constant.
    pub fn log_of(base: f64, inner: Complexity) -> Self {
        match &inner.kind {
            ComplexityKind::Variable(v) => Complexity::logarithmic(1.0, base, v.clone()),
            ComplexityKind::Constant(_) => Complexity::one(),
            _ => Complexity::from_kind(ComplexityKind::LogOf {
                base,
                inner: Arc::new(inner),
            }),
        }
    }

    /// variable^degree · log^log_exponent(variable); degrees are real.
    ///
    /// `polylog(v, d, 0)` with integral d normalizes to `Polynomial`;
    /// `polylog(v, 0, 1)` to `Logarithmic`; `polylog(v, 0, 0)` to O(1).
    pub fn polylog(var: Variable, degree: f64, log_exponent: f64) -> Self {
        if log_exponent == 0.0 {
            if degree == 0.0 {
                return Complexity::one();
            }
            if degree.fract() == 0.0 && degree > 0.0 && degree <= u32::MAX as f64 {
                return Complexity::polynomial(var, vec![(degree as u32, 1.0)]);
            }
        }
        if degree == 0.0 && log_exponent == 1.0 {
            return Complexity::logarithmic(1.0, 2.0, var);
        }
        Complexity::from_kind(ComplexityKind::PolyLog {
            var,
            degree,
            log_exponent,
        })
    }

    /// base^variable. A base of 1 (or less) degenerates to O(1).
    pub fn exponential(base: f64, var: Variable) -> Self {
        if base <= 1.0 {
            return Complexity::one();
        }
        Complexity::from_kind(ComplexityKind::Exponential { base, var })
    }

    /// variable!.
    pub fn factorial(var: Variable) -> Self {
        Complexity::from_kind(ComplexityKind::Factorial(var))
    }

    /// An arbitrary sub-expression raised to a constant exponent.
    ///
    /// Exponent 1 is the base itself; exponent 0 is O(1); a variable base
    /// collapses into the polynomial/polylog family; a constant base folds.
    pub fn power(base: Complexity, exponent: f64) -> Self {
        if exponent == 0.0 {
            return Complexity::one();
        }
        if exponent == 1.0 {
            return base;
        }
        match &base.kind {
            ComplexityKind::Variable(v) => Complexity::polylog(v.clone(), exponent, 0.0),
            ComplexityKind::Constant(c) => Complexity::constant(c.powf(exponent)),
            ComplexityKind::PolyLog {
                var,
                degree,
                log_exponent,
            } => Complexity::polylog(var.clone(), degree * exponent, log_exponent * exponent),
            _ => Complexity::from_kind(ComplexityKind::Power {
                base: Arc::new(base),
                exponent,
            }),
        }
    }

    /// α(variable) — inverse Ackermann, for union-find results.
    pub fn inverse_ackermann(var: Variable) -> Self {
        Complexity::from_kind(ComplexityKind::InverseAckermann(var))
    }

    /// Generic binary node. Prefer `plus` / `multiply` / `max_of` /
    /// `min_of`, which fold identities.
    pub fn binary(op: BinaryOp, left: Complexity, right: Complexity) -> Self {
        use ComplexityKind::Constant;

        // Constant folding
        if let (Constant(a), Constant(b)) = (&left.kind, &right.kind) {
            let folded = match op {
                BinaryOp::Plus => a + b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Max => a.max(*b),
                BinaryOp::Min => a.min(*b),
            };
            return Complexity::constant(folded);
        }

        // Identities
        match op {
            BinaryOp::Plus => {
                if matches!(left.kind, Constant(c) if c == 0.0) {
                    return right;
                }
                if matches!(right.kind, Constant(c) if c == 0.0) {
                    return left;
                }
            }
            BinaryOp::Multiply => {
                if matches!(left.kind, Constant(c) if c == 0.0)
                    || matches!(right.kind, Constant(c) if c == 0.0)
                {
                    return Complexity::constant(0.0);
                }
                if matches!(left.kind, Constant(c) if c == 1.0) {
                    return right;
                }
                if matches!(right.kind, Constant(c) if c == 1.0) {
                    return left;
                }
            }
            BinaryOp::Max | BinaryOp::Min => {
                if left == right {
                    return left;
                }
            }
        }

        // Canonical operand order for the commutative operators
        let (left, right) = if complexity_cmp(&left, &right) == std::cmp::Ordering::Greater {
            (right, left)
        } else {
            (left, right)
        };

        Complexity::from_kind(ComplexityKind::Binary {
            op,
            left: Arc::new(left),
            right: Arc::new(right),
        })
    }

    /// Sequential combination: `left + right`.
    pub fn plus(left: Complexity, right: Complexity) -> Self {
        Complexity::binary(BinaryOp::Plus, left, right)
    }

    /// Nested combination: `left · right`.
    pub fn multiply(left: Complexity, right: Complexity) -> Self {
        Complexity::binary(BinaryOp::Multiply, left, right)
    }

    /// Branch combination: `max(left, right)`.
    pub fn max_of(left: Complexity, right: Complexity) -> Self {
        Complexity::binary(BinaryOp::Max, left, right)
    }

    /// `min(left, right)`.
    pub fn min_of(left: Complexity, right: Complexity) -> Self {
        Complexity::binary(BinaryOp::Min, left, right)
    }

    /// A deferred symbolic integral with its conservative bound.
    pub fn integral(
        integrand: Complexity,
        bound_var: Variable,
        lower: Complexity,
        upper: Complexity,
        bound: Complexity,
    ) -> Self {
        Complexity::from_kind(ComplexityKind::Integral {
            integrand: Arc::new(integrand),
            bound_var,
            lower: Arc::new(lower),
            upper: Arc::new(upper),
            bound: Arc::new(bound),
        })
    }

    /// An unsolved recurrence, referenced symbolically.
    pub fn recurrence(relation: RecurrenceRelation) -> Self {
        Complexity::from_kind(ComplexityKind::Recurrence(relation))
    }

    /// An amortized bound with its worst-case counterpart.
    pub fn amortized(
        amortized: Complexity,
        worst: Complexity,
        method: AmortizedMethod,
        potential: Option<String>,
    ) -> Self {
        Complexity::from_kind(ComplexityKind::Amortized {
            amortized: Arc::new(amortized),
            worst: Arc::new(worst),
            method,
            potential,
        })
    }

    /// A space-complexity profile.
    pub fn memory(profile: MemoryProfile) -> Self {
        Complexity::from_kind(ComplexityKind::Memory(profile))
    }
}

impl MemoryProfile {
    /// A constant-space profile with no recorded allocations.
    pub fn constant_space() -> Self {
        MemoryProfile {
            total: Arc::new(Complexity::one()),
            stack: Arc::new(Complexity::one()),
            heap: Arc::new(Complexity::one()),
            auxiliary: Arc::new(Complexity::one()),
            in_place: true,
            tail_recursive: false,
            allocations: Vec::new(),
        }
    }

    /// Build a profile from stack/heap parts; total = stack + heap.
    pub fn from_parts(
        stack: Complexity,
        heap: Complexity,
        allocations: Vec<AllocationSite>,
    ) -> Self {
        let total = Complexity::plus(stack.clone(), heap.clone());
        let auxiliary = total.clone();
        MemoryProfile {
            total: Arc::new(total),
            stack: Arc::new(stack),
            heap: Arc::new(heap),
            auxiliary: Arc::new(auxiliary),
            in_place: allocations.is_empty(),
            tail_recursive: false,
            allocations,
        }
    }
}

impl std::ops::Add for Complexity {
    type Output = Complexity;
    fn add(self, rhs: Complexity) -> Complexity {
        Complexity::plus(self, rhs)
    }
}

impl std::ops::Mul for Complexity {
    type Output = Complexity;
    fn mul(self, rhs: Complexity) -> Complexity {
        Complexity::multiply(self, rhs)
    }
}
