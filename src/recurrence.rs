//! Recurrence relations.
//!
//! A detected recursion pattern is normalized into a [`RecurrenceRelation`]
//! of shape `T(n) = Σᵢ aᵢ·T(bᵢ·n or n−kᵢ) + g(n)` before being handed to
//! the theorem solvers. Recurrences reference themselves through the
//! variable name, never a pointer, so expression trees stay acyclic.
//!
//! Prefer the named factories (`divide_and_conquer`, `decrease_and_conquer`,
//! `fibonacci`, `summation`) over `new`: they encode preconditions that the
//! raw constructor would have to re-validate.

use std::sync::Arc;

use crate::core::error::AnalysisError;
use crate::core::expr::Complexity;
use crate::core::variable::Variable;

/// One recursive call inside a recurrence.
///
/// `scale` ∈ (0, 1] is the multiplicative argument reduction (`n/2` has
/// scale 0.5); `reduction` is the subtractive one (`n−1` has reduction 1).
/// A term is *reducing* iff `scale < 1` or `reduction > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceTerm {
    /// Number of recursive calls with this argument shape (aᵢ > 0).
    pub coefficient: f64,
    /// Multiplicative scale factor in (0, 1].
    pub scale: f64,
    /// Subtractive reduction (>= 0; used when scale == 1).
    pub reduction: f64,
}

impl RecurrenceTerm {
    /// A call of shape `T(scale · n)`.
    pub fn scaled(coefficient: f64, scale: f64) -> Self {
        RecurrenceTerm {
            coefficient,
            scale,
            reduction: 0.0,
        }
    }

    /// A call of shape `T(n − reduction)`.
    pub fn decreased(coefficient: f64, reduction: f64) -> Self {
        RecurrenceTerm {
            coefficient,
            scale: 1.0,
            reduction,
        }
    }

    /// True iff the argument strictly shrinks.
    pub fn is_reducing(&self) -> bool {
        self.scale < 1.0 || self.reduction > 0.0
    }

    /// The division factor `b = 1/scale` for division-pattern terms.
    pub fn division_factor(&self) -> f64 {
        1.0 / self.scale
    }
}

/// A normalized recurrence relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRelation {
    variable: Variable,
    terms: Vec<RecurrenceTerm>,
    work: Arc<Complexity>,
    base_case: Arc<Complexity>,
}

impl RecurrenceRelation {
    /// Build a recurrence from raw parts, validating every term.
    ///
    /// Prefer the named factories below when one fits.
    pub fn new(
        variable: Variable,
        terms: Vec<RecurrenceTerm>,
        work: Complexity,
        base_case: Complexity,
    ) -> Result<Self, AnalysisError> {
        if terms.is_empty() {
            return Err(AnalysisError::invalid_recurrence(
                "a recurrence needs at least one recursive term",
            ));
        }
        for term in &terms {
            if term.coefficient <= 0.0 || !term.coefficient.is_finite() {
                return Err(AnalysisError::invalid_recurrence(format!(
                    "term coefficient must be positive and finite, got {}",
                    term.coefficient
                )));
            }
            if !(term.scale > 0.0 && term.scale <= 1.0) {
                return Err(AnalysisError::invalid_recurrence(format!(
                    "term scale factor must lie in (0, 1], got {}",
                    term.scale
                )));
            }
            if term.reduction < 0.0 || !term.reduction.is_finite() {
                return Err(AnalysisError::invalid_recurrence(format!(
                    "term reduction must be non-negative, got {}",
                    term.reduction
                )));
            }
        }
        Ok(RecurrenceRelation {
            variable,
            terms,
            work: Arc::new(work),
            base_case: Arc::new(base_case),
        })
    }

    /// `T(n) = a · T(n/b) + g(n)`, the Master Theorem template.
    ///
    /// Requires `a >= 1` and `b > 1`.
    pub fn divide_and_conquer(
        a: f64,
        b: f64,
        work: Complexity,
        variable: Variable,
    ) -> Result<Self, AnalysisError> {
        if a < 1.0 {
            return Err(AnalysisError::invalid_recurrence(format!(
                "divide-and-conquer needs a >= 1, got {}",
                a
            )));
        }
        if b <= 1.0 {
            return Err(AnalysisError::invalid_recurrence(format!(
                "divide-and-conquer needs a division factor b > 1, got {}",
                b
            )));
        }
        RecurrenceRelation::new(
            variable,
            vec![RecurrenceTerm::scaled(a, 1.0 / b)],
            work,
            Complexity::constant(1.0),
        )
    }

    /// `T(n) = a · T(n−k) + g(n)`, the subtract-and-recurse template.
    ///
    /// Requires `a >= 1` and `k >= 1`.
    pub fn decrease_and_conquer(
        a: f64,
        k: f64,
        work: Complexity,
        variable: Variable,
    ) -> Result<Self, AnalysisError> {
        if a < 1.0 {
            return Err(AnalysisError::invalid_recurrence(format!(
                "decrease-and-conquer needs a >= 1, got {}",
                a
            )));
        }
        if k < 1.0 {
            return Err(AnalysisError::invalid_recurrence(format!(
                "decrease-and-conquer needs a reduction k >= 1, got {}",
                k
            )));
        }
        RecurrenceRelation::new(
            variable,
            vec![RecurrenceTerm::decreased(a, k)],
            work,
            Complexity::constant(1.0),
        )
    }

    /// `T(n) = T(n−1) + T(n−2) + O(1)`, the two-branch tree template.
    pub fn fibonacci(variable: Variable) -> Self {
        RecurrenceRelation {
            variable,
            terms: vec![
                RecurrenceTerm::decreased(1.0, 1.0),
                RecurrenceTerm::decreased(1.0, 2.0),
            ],
            work: Arc::new(Complexity::constant(1.0)),
            base_case: Arc::new(Complexity::constant(1.0)),
        }
    }

    /// `T(n) = T(n−1) + g(n)`, whose solution is the summation of g.
    pub fn summation(work: Complexity, variable: Variable) -> Self {
        RecurrenceRelation {
            variable,
            terms: vec![RecurrenceTerm::decreased(1.0, 1.0)],
            work: Arc::new(work),
            base_case: Arc::new(Complexity::constant(1.0)),
        }
    }

    /// The recurrence variable.
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// The recursive terms.
    pub fn terms(&self) -> &[RecurrenceTerm] {
        &self.terms
    }

    /// The non-recursive work g(n).
    pub fn work(&self) -> &Arc<Complexity> {
        &self.work
    }

    /// The base-case cost.
    pub fn base_case(&self) -> &Arc<Complexity> {
        &self.base_case
    }

    /// True iff every term strictly reduces its argument.
    pub fn is_reducing(&self) -> bool {
        self.terms.iter().all(RecurrenceTerm::is_reducing)
    }

    /// Well-formed for the Master Theorem: exactly one term with
    /// `a >= 1` and `0 < 1/b < 1` (a division pattern).
    pub fn is_master_candidate(&self) -> bool {
        self.terms.len() == 1 && {
            let t = &self.terms[0];
            t.coefficient >= 1.0 && t.scale < 1.0 && t.reduction == 0.0
        }
    }

    /// Well-formed for Akra–Bazzi: every term is a division pattern with
    /// `aᵢ > 0` and `0 < bᵢ⁻¹ < 1`.
    pub fn is_akra_bazzi_candidate(&self) -> bool {
        !self.terms.is_empty()
            && self
                .terms
                .iter()
                .all(|t| t.coefficient > 0.0 && t.scale < 1.0 && t.reduction == 0.0)
    }

    /// Well-formed for the linear solver: every term is a subtraction
    /// pattern `T(n − k)` with integral `k >= 1`.
    pub fn is_linear_candidate(&self) -> bool {
        !self.terms.is_empty()
            && self.terms.iter().all(|t| {
                t.scale == 1.0 && t.reduction >= 1.0 && t.reduction.fract() == 0.0
            })
    }

    /// The `(aᵢ, bᵢ)` pairs with `bᵢ = 1/scaleᵢ` for division terms.
    pub fn division_pairs(&self) -> Vec<(f64, f64)> {
        self.terms
            .iter()
            .map(|t| (t.coefficient, t.division_factor()))
            .collect()
    }

    /// Numerically unroll the recurrence for small n.
    ///
    /// Used as the evaluation fallback when no solver ran; returns `None`
    /// for n > 100 (the solver path is preferred) or when g(n) cannot be
    /// evaluated.
    pub fn unroll(&self, n: f64) -> Option<f64> {
        if !(0.0..=100.0).contains(&n) {
            return None;
        }
        let mut memo: rustc_hash::FxHashMap<i64, f64> = rustc_hash::FxHashMap::default();
        self.unroll_memo(n.floor(), &mut memo)
    }

    fn unroll_memo(&self, n: f64, memo: &mut rustc_hash::FxHashMap<i64, f64>) -> Option<f64> {
        if n <= 1.0 {
            let mut assignment = crate::core::expr::Assignment::default();
            assignment.insert(self.variable.name().to_owned(), 1.0);
            return self.base_case.evaluate(&assignment);
        }
        let key = n as i64;
        if let Some(&v) = memo.get(&key) {
            return Some(v);
        }
        let mut assignment = crate::core::expr::Assignment::default();
        assignment.insert(self.variable.name().to_owned(), n);
        let mut total = self.work.evaluate(&assignment)?;
        for term in &self.terms {
            let arg = (term.scale * n - term.reduction).floor();
            if arg >= n {
                return None; // non-reducing, unrolling would not terminate
            }
            total += term.coefficient * self.unroll_memo(arg.max(0.0), memo)?;
        }
        memo.insert(key, total);
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_and_conquer_validates_factors() {
        let n = Variable::n();
        assert!(
            RecurrenceRelation::divide_and_conquer(
                2.0,
                2.0,
                Complexity::variable(n.clone()),
                n.clone()
            )
            .is_ok()
        );
        assert!(
            RecurrenceRelation::divide_and_conquer(0.5, 2.0, Complexity::constant(1.0), n.clone())
                .is_err()
        );
        assert!(
            RecurrenceRelation::divide_and_conquer(2.0, 1.0, Complexity::constant(1.0), n).is_err()
        );
    }

    #[test]
    fn master_candidate_shape() {
        let n = Variable::n();
        let rec = RecurrenceRelation::divide_and_conquer(
            2.0,
            2.0,
            Complexity::variable(n.clone()),
            n.clone(),
        )
        .unwrap();
        assert!(rec.is_master_candidate());
        assert!(rec.is_akra_bazzi_candidate());
        assert!(!rec.is_linear_candidate());

        let fib = RecurrenceRelation::fibonacci(n);
        assert!(!fib.is_master_candidate());
        assert!(fib.is_linear_candidate());
    }

    #[test]
    fn unroll_matches_hand_computation() {
        let n = Variable::n();
        // T(n) = T(n-1) + 1, T(1) = 1  =>  T(5) = 5
        let rec = RecurrenceRelation::summation(Complexity::constant(1.0), n);
        assert_eq!(rec.unroll(5.0), Some(5.0));
        assert_eq!(rec.unroll(500.0), None);
    }

    #[test]
    fn unroll_rejects_non_reducing_terms() {
        let n = Variable::n();
        let rec = RecurrenceRelation::new(
            n.clone(),
            vec![RecurrenceTerm::scaled(1.0, 1.0)],
            Complexity::constant(1.0),
            Complexity::constant(1.0),
        )
        .unwrap();
        assert!(!rec.is_reducing());
        assert_eq!(rec.unroll(10.0), None);
    }
}
