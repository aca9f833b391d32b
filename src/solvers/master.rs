//! The Master Theorem.
//!
//! For `T(n) = a·T(n/b) + g(n)` with `a >= 1`, `b > 1`, let
//! `d = log_b(a)` and compare g against `n^d`:
//!
//! - g = O(n^(d−ε))             => Case 1: Θ(n^d)
//! - g = Θ(n^d · log^k n)       => Case 2: Θ(n^d · log^(k+1) n)
//! - g = Ω(n^(d+ε)) + regularity => Case 3: Θ(g(n))
//!
//! The regularity condition `a·g(n/b) <= c·g(n)` is verified structurally
//! for polynomial and polylog g; anything else returns Case 3 with
//! `regularity_verified = false` so the caller can reduce confidence.
//! Inputs falling in the gap between the cases defer to Akra–Bazzi.

use super::MasterCase;
use crate::classify::{classify, dominates_polynomial, is_bounded_by_polynomial, Form};
use crate::core::expr::Complexity;
use crate::recurrence::RecurrenceRelation;

/// Degree comparisons use this tolerance for the k = d boundary.
const DEGREE_EPSILON: f64 = 1e-9;

/// Internal outcome: applicable with a case, or the gap.
#[derive(Debug, Clone, PartialEq)]
pub enum MasterOutcome {
    /// One of the three cases fired.
    Applicable {
        /// Which case.
        case: MasterCase,
        /// Closed-form solution.
        solution: Complexity,
        /// Whether Case 3 regularity was verified structurally
        /// (`true` for Cases 1 and 2).
        regularity_verified: bool,
    },
    /// g(n) falls between the cases; defer to Akra–Bazzi.
    Gap,
}

/// Apply the Master Theorem. The caller has already checked
/// [`RecurrenceRelation::is_master_candidate`].
pub fn solve(relation: &RecurrenceRelation) -> MasterOutcome {
    let term = &relation.terms()[0];
    let a = term.coefficient;
    let b = term.division_factor();
    let d = a.ln() / b.ln();
    let var = relation.variable().clone();
    let g = relation.work();

    // Case 1: g strictly below n^d.
    if is_bounded_by_polynomial(g, &var, d) {
        return MasterOutcome::Applicable {
            case: MasterCase::Case1,
            solution: Complexity::polylog(var, d, 0.0),
            regularity_verified: true,
        };
    }

    // Case 2: g = Θ(n^d · log^k n), k >= 0.
    let class = classify(g, &var);
    if let Some((k, j)) = class.polylog_pair() {
        if (k - d).abs() < DEGREE_EPSILON && j >= 0.0 {
            return MasterOutcome::Applicable {
                case: MasterCase::Case2,
                solution: Complexity::polylog(var, d, j + 1.0),
                regularity_verified: true,
            };
        }
    }

    // Case 3: g polynomially above n^d, with regularity.
    if dominates_polynomial(g, &var, d) {
        let verified = regularity_holds_structurally(&class.form, class.degree, a, b, d);
        return MasterOutcome::Applicable {
            case: MasterCase::Case3,
            solution: (**g).clone(),
            regularity_verified: verified,
        };
    }

    MasterOutcome::Gap
}

/// Structural regularity check for Case 3.
///
/// For g(n) = n^k (·log^j n) with k > d: a·g(n/b) = a·b^(−k)·g-ish(n),
/// and a·b^(−k) < 1 exactly when k > log_b(a) = d, which Case 3 already
/// established. Other families are left unverified.
fn regularity_holds_structurally(
    form: &Form,
    degree: Option<f64>,
    a: f64,
    b: f64,
    d: f64,
) -> bool {
    match form {
        Form::Polynomial | Form::PolyLog => {
            let k = degree.unwrap_or(0.0);
            // c = a / b^k must be < 1.
            k > d && a / b.powf(k) < 1.0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variable::Variable;
    use crate::solvers::MasterCase;

    fn n() -> Variable {
        Variable::n()
    }

    fn dnc(a: f64, b: f64, g: Complexity) -> RecurrenceRelation {
        RecurrenceRelation::divide_and_conquer(a, b, g, n()).unwrap()
    }

    #[test]
    fn binary_search_is_case_two() {
        // T(n) = T(n/2) + 1: d = 0, g constant => Θ(log n)
        let rec = dnc(1.0, 2.0, Complexity::one());
        match solve(&rec) {
            MasterOutcome::Applicable { case, solution, .. } => {
                assert_eq!(case, MasterCase::Case2);
                assert_eq!(solution.big_o(), "O(log n)");
            }
            MasterOutcome::Gap => panic!("expected Case 2"),
        }
    }

    #[test]
    fn karatsuba_is_case_one() {
        // T(n) = 3·T(n/2) + n: d = log2(3) ≈ 1.585 > 1 => Θ(n^1.585)
        let rec = dnc(3.0, 2.0, Complexity::variable(n()));
        match solve(&rec) {
            MasterOutcome::Applicable { case, solution, .. } => {
                assert_eq!(case, MasterCase::Case1);
                assert_eq!(solution.big_o(), "O(n^1.585)");
            }
            MasterOutcome::Gap => panic!("expected Case 1"),
        }
    }

    #[test]
    fn quadratic_work_is_case_three_with_regularity() {
        // T(n) = 2·T(n/2) + n²: d = 1, g = n² => Θ(n²), regular
        let rec = dnc(2.0, 2.0, Complexity::polynomial(n(), vec![(2, 1.0)]));
        match solve(&rec) {
            MasterOutcome::Applicable {
                case,
                solution,
                regularity_verified,
            } => {
                assert_eq!(case, MasterCase::Case3);
                assert!(regularity_verified);
                assert_eq!(solution.big_o(), "O(n²)");
            }
            MasterOutcome::Gap => panic!("expected Case 3"),
        }
    }

    #[test]
    fn exponential_work_is_case_three_unverified() {
        // T(n) = 2·T(n/2) + 2^n: dominates any polynomial but the
        // structural regularity check cannot cover exponentials.
        let rec = dnc(2.0, 2.0, Complexity::exponential(2.0, n()));
        match solve(&rec) {
            MasterOutcome::Applicable {
                case,
                regularity_verified,
                ..
            } => {
                assert_eq!(case, MasterCase::Case3);
                assert!(!regularity_verified);
            }
            MasterOutcome::Gap => panic!("expected Case 3"),
        }
    }

    #[test]
    fn sub_polynomial_gap_defers() {
        // T(n) = 2·T(n/2) + n/log n: between Case 1 and Case 2.
        let g = Complexity::polylog(n(), 1.0, -1.0);
        let rec = dnc(2.0, 2.0, g);
        assert_eq!(solve(&rec), MasterOutcome::Gap);
    }

    #[test]
    fn strassen_case_one() {
        // T(n) = 7·T(n/2) + n²: d = log2(7) ≈ 2.807 => Θ(n^2.807)
        let rec = dnc(7.0, 2.0, Complexity::polynomial(n(), vec![(2, 1.0)]));
        match solve(&rec) {
            MasterOutcome::Applicable { case, solution, .. } => {
                assert_eq!(case, MasterCase::Case1);
                assert_eq!(solution.big_o(), "O(n^2.807)");
            }
            MasterOutcome::Gap => panic!("expected Case 1"),
        }
    }
}
