//! Recurrence solvers.
//!
//! The entry point is [`solve`]: it dispatches a normalized
//! [`RecurrenceRelation`] to the Master Theorem, Akra–Bazzi, or the
//! linear characteristic-polynomial solver, and reports a typed
//! [`SolverOutcome`]. Failures are records, not errors: `NotApplicable`
//! carries the primary reason, the violated preconditions and suggested
//! alternatives.

pub mod akra_bazzi;
pub mod linear;
pub mod master;
pub mod mutual;

use tracing::debug;

use crate::core::confidence::Confidence;
use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::recurrence::RecurrenceRelation;

/// Which Master Theorem case applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterCase {
    /// g(n) = O(n^(d−ε)): the recursion tree dominates.
    Case1,
    /// g(n) = Θ(n^d · log^k n): balanced levels.
    Case2,
    /// g(n) = Ω(n^(d+ε)) with regularity: the root dominates.
    Case3,
}

/// Which method the linear solver used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearMethod {
    /// Order 1: the root is the coefficient itself.
    DirectRoot,
    /// Order 2: quadratic formula (with complex-pair detection).
    QuadraticFormula,
    /// Order >= 3: roots of the companion polynomial.
    CompanionRoots,
}

/// Typed result of a solve attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// The Master Theorem applied.
    MasterApplicable {
        /// Which case fired.
        case: MasterCase,
        /// The closed-form solution.
        solution: Complexity,
        /// Case 3 only: whether the regularity condition was verified
        /// structurally. `false` reduces confidence.
        regularity_verified: bool,
    },
    /// Akra–Bazzi applied.
    AkraBazziApplicable {
        /// The critical exponent solving Σ aᵢ·bᵢ^p = 1.
        p: f64,
        /// The solution (a symbolic integral when the table had no row).
        solution: Complexity,
        /// True when the integral stayed symbolic.
        deferred: bool,
    },
    /// The linear characteristic-polynomial solver applied.
    LinearSolved {
        /// The closed-form solution.
        solution: Complexity,
        /// Which root-finding path produced it.
        method: LinearMethod,
    },
    /// No solver applies.
    NotApplicable {
        /// Primary reason.
        reason: String,
        /// Violated preconditions, one per line.
        violated: Vec<String>,
        /// Suggested alternatives (other solvers, numeric unrolling).
        suggestions: Vec<String>,
    },
}

impl SolverOutcome {
    /// The solved complexity, when any solver applied.
    pub fn solution(&self) -> Option<&Complexity> {
        match self {
            SolverOutcome::MasterApplicable { solution, .. }
            | SolverOutcome::AkraBazziApplicable { solution, .. }
            | SolverOutcome::LinearSolved { solution, .. } => Some(solution),
            SolverOutcome::NotApplicable { .. } => None,
        }
    }

    /// Confidence contribution of this outcome.
    ///
    /// Closed-form solutions are certain; a deferred symbolic integral
    /// and an unverified regularity condition are not.
    pub fn confidence(&self) -> Confidence {
        match self {
            SolverOutcome::MasterApplicable {
                regularity_verified: false,
                ..
            } => Confidence::new(0.8),
            SolverOutcome::MasterApplicable { .. } => Confidence::CERTAIN,
            SolverOutcome::AkraBazziApplicable { deferred: true, .. } => {
                Confidence::SYMBOLIC_INTEGRAL
            }
            SolverOutcome::AkraBazziApplicable { .. } => Confidence::CERTAIN,
            SolverOutcome::LinearSolved { .. } => Confidence::CERTAIN,
            SolverOutcome::NotApplicable { .. } => Confidence::NONE,
        }
    }
}

/// An optional oracle for integrals outside the closed-form table.
///
/// Implemented by the symbolic-math subprocess client; any failure there
/// simply returns `None` and the table fallback stands.
pub trait IntegralOracle {
    /// Attempt `Θ(n^p · (1 + ∫₁ⁿ g(u)/u^(p+1) du))` in closed form.
    fn solve_integral(&self, g: &Complexity, p: f64, var: &Variable) -> Option<Complexity>;
}

/// Solve a normalized recurrence with no oracle.
pub fn solve(relation: &RecurrenceRelation) -> SolverOutcome {
    solve_with_oracle(relation, None)
}

/// Solve a normalized recurrence, consulting `oracle` for integrals the
/// table cannot evaluate.
pub fn solve_with_oracle(
    relation: &RecurrenceRelation,
    oracle: Option<&dyn IntegralOracle>,
) -> SolverOutcome {
    if !relation.is_reducing() {
        return SolverOutcome::NotApplicable {
            reason: "non-reducing recurrence".to_owned(),
            violated: vec![
                "every recursive term must strictly shrink its argument".to_owned(),
            ],
            suggestions: vec![
                "check for a pass-through recursive argument".to_owned(),
            ],
        };
    }

    if relation.is_master_candidate() {
        match master::solve(relation) {
            master::MasterOutcome::Applicable {
                case,
                solution,
                regularity_verified,
            } => {
                debug!(?case, "master theorem applied");
                return SolverOutcome::MasterApplicable {
                    case,
                    solution,
                    regularity_verified,
                };
            }
            // The gap between the cases defers to Akra–Bazzi.
            master::MasterOutcome::Gap => {
                debug!("master theorem gap, deferring to Akra-Bazzi");
            }
        }
    }

    if relation.is_akra_bazzi_candidate() {
        return akra_bazzi::solve(relation, oracle);
    }

    if relation.is_linear_candidate() {
        return linear::solve(relation);
    }

    SolverOutcome::NotApplicable {
        reason: "recurrence matches no solver template".to_owned(),
        violated: describe_violations(relation),
        suggestions: vec![
            "try Akra-Bazzi after normalizing every term to a division pattern".to_owned(),
            "numeric unrolling is available for n <= 100".to_owned(),
        ],
    }
}

fn describe_violations(relation: &RecurrenceRelation) -> Vec<String> {
    let mut out = Vec::new();
    let has_division = relation
        .terms()
        .iter()
        .any(|t| t.scale < 1.0 && t.reduction == 0.0);
    let has_subtraction = relation.terms().iter().any(|t| t.reduction > 0.0);
    if has_division && has_subtraction {
        out.push("mixed division and subtraction patterns in one recurrence".to_owned());
    }
    for (i, t) in relation.terms().iter().enumerate() {
        if t.scale == 1.0 && t.reduction > 0.0 && t.reduction.fract() != 0.0 {
            out.push(format!(
                "term {} subtracts a non-integral amount ({})",
                i, t.reduction
            ));
        }
    }
    if out.is_empty() {
        out.push("no template matches the term shapes".to_owned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_reducing_recurrence_is_rejected() {
        let n = Variable::n();
        let rec = RecurrenceRelation::new(
            n.clone(),
            vec![crate::recurrence::RecurrenceTerm::scaled(1.0, 1.0)],
            Complexity::one(),
            Complexity::one(),
        )
        .unwrap();
        match solve(&rec) {
            SolverOutcome::NotApplicable { reason, .. } => {
                assert!(reason.contains("non-reducing"));
            }
            other => panic!("expected NotApplicable, got {:?}", other),
        }
    }

    #[test]
    fn merge_sort_recurrence_hits_master_case_two() {
        let n = Variable::n();
        let rec = RecurrenceRelation::divide_and_conquer(
            2.0,
            2.0,
            Complexity::variable(n.clone()),
            n.clone(),
        )
        .unwrap();
        match solve(&rec) {
            SolverOutcome::MasterApplicable { case, solution, .. } => {
                assert_eq!(case, MasterCase::Case2);
                assert_eq!(solution.big_o(), "O(n log n)");
            }
            other => panic!("expected Master, got {:?}", other),
        }
    }

    #[test]
    fn fibonacci_recurrence_solves_linearly() {
        let rec = RecurrenceRelation::fibonacci(Variable::n());
        match solve(&rec) {
            SolverOutcome::LinearSolved { solution, method } => {
                assert_eq!(method, LinearMethod::QuadraticFormula);
                // Dominant root is the golden ratio.
                let rendered = solution.big_o();
                assert!(rendered.contains("^n"), "got {}", rendered);
            }
            other => panic!("expected LinearSolved, got {:?}", other),
        }
    }
}
