//! Mutual recursion.
//!
//! A strongly connected component of the call graph is reduced to a
//! single equivalent recurrence: the per-method non-recursive works are
//! composed along the cycle into a combined g(n), and the argument
//! reductions combine by multiplication for division patterns and by
//! addition for subtraction patterns. The standard solver path then
//! applies, and every method in the cycle shares the asymptotic result
//! up to constants. No fixpoint iteration over the group is attempted.

use tracing::debug;

use super::{solve_with_oracle, IntegralOracle, SolverOutcome};
use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::recurrence::{RecurrenceRelation, RecurrenceTerm};
use crate::simplification::simplify_expr;

/// The cycle-internal call made by one method of an SCC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleCall {
    /// Number of such calls (> 0).
    pub coefficient: f64,
    /// Multiplicative argument reduction in (0, 1].
    pub scale: f64,
    /// Subtractive argument reduction (>= 0).
    pub reduction: f64,
}

/// One method of a mutual-recursion cycle.
#[derive(Debug, Clone)]
pub struct MutualComponent {
    /// Method name, for reporting.
    pub name: String,
    /// Non-recursive work of this method.
    pub work: Complexity,
    /// Its call to the next method along the cycle.
    pub call: CycleCall,
}

/// Reduce a cycle to one recurrence over `variable`.
///
/// Returns `None` when the composed call does not reduce its argument at
/// all (the cycle would not terminate).
pub fn reduce_cycle(
    components: &[MutualComponent],
    variable: Variable,
) -> Option<RecurrenceRelation> {
    if components.is_empty() {
        return None;
    }

    let mut coefficient = 1.0;
    let mut scale = 1.0;
    let mut reduction = 0.0;
    let mut work = Complexity::constant(0.0);

    for component in components {
        coefficient *= component.call.coefficient;
        scale *= component.call.scale;
        reduction += component.call.reduction;
        work = Complexity::plus(work, component.work.clone());
    }
    let work = simplify_expr(work);

    // A division pattern anywhere in the cycle dominates asymptotically:
    // n/2 − k behaves as n/2.
    let term = if scale < 1.0 {
        RecurrenceTerm::scaled(coefficient, scale)
    } else if reduction > 0.0 {
        RecurrenceTerm::decreased(coefficient, reduction)
    } else {
        return None;
    };

    debug!(
        cycle_len = components.len(),
        coefficient, scale, reduction, "reduced mutual-recursion cycle"
    );

    RecurrenceRelation::new(variable, vec![term], work, Complexity::one()).ok()
}

/// Reduce and solve a cycle in one step.
pub fn solve_cycle(
    components: &[MutualComponent],
    variable: Variable,
    oracle: Option<&dyn IntegralOracle>,
) -> SolverOutcome {
    match reduce_cycle(components, variable) {
        Some(relation) => solve_with_oracle(&relation, oracle),
        None => SolverOutcome::NotApplicable {
            reason: "mutual-recursion cycle never reduces its argument".to_owned(),
            violated: vec![
                "the composed cycle call must shrink the argument".to_owned(),
            ],
            suggestions: vec![
                "check each cycle member for a pass-through argument".to_owned(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::LinearMethod;

    fn n() -> Variable {
        Variable::n()
    }

    fn call(scale: f64, reduction: f64) -> CycleCall {
        CycleCall {
            coefficient: 1.0,
            scale,
            reduction,
        }
    }

    #[test]
    fn even_odd_cycle_solves_linearly() {
        // is_even(n) -> is_odd(n−1) -> is_even(n−2): T(n) = T(n−2) + O(1) => Θ(n)
        let components = vec![
            MutualComponent {
                name: "is_even".to_owned(),
                work: Complexity::one(),
                call: call(1.0, 1.0),
            },
            MutualComponent {
                name: "is_odd".to_owned(),
                work: Complexity::one(),
                call: call(1.0, 1.0),
            },
        ];
        match solve_cycle(&components, n(), None) {
            SolverOutcome::LinearSolved { solution, method } => {
                assert_eq!(method, LinearMethod::QuadraticFormula);
                assert_eq!(solution.big_o(), "O(n)");
            }
            other => panic!("expected LinearSolved, got {:?}", other),
        }
    }

    #[test]
    fn halving_cycle_solves_logarithmically() {
        // f(n) -> g(n/2) -> f(n/2): composed T(n) = T(n/4) + O(1) => Θ(log n)
        let components = vec![
            MutualComponent {
                name: "f".to_owned(),
                work: Complexity::one(),
                call: call(0.5, 0.0),
            },
            MutualComponent {
                name: "g".to_owned(),
                work: Complexity::one(),
                call: call(0.5, 0.0),
            },
        ];
        match solve_cycle(&components, n(), None) {
            SolverOutcome::MasterApplicable { solution, .. } => {
                assert_eq!(solution.big_o(), "O(log n)");
            }
            other => panic!("expected Master, got {:?}", other),
        }
    }

    #[test]
    fn cycle_works_compose_additively() {
        // One member does linear work: the combined recurrence carries it.
        let components = vec![
            MutualComponent {
                name: "scan".to_owned(),
                work: Complexity::variable(n()),
                call: call(0.5, 0.0),
            },
            MutualComponent {
                name: "descend".to_owned(),
                work: Complexity::one(),
                call: call(1.0, 0.0),
            },
        ];
        // descend's call has scale 1, but the composed cycle still halves.
        match solve_cycle(&components, n(), None) {
            SolverOutcome::MasterApplicable { solution, .. } => {
                // T(n) = T(n/2) + n => Θ(n)
                assert_eq!(solution.big_o(), "O(n)");
            }
            other => panic!("expected Master, got {:?}", other),
        }
    }

    #[test]
    fn non_reducing_cycle_is_rejected() {
        let components = vec![MutualComponent {
            name: "spin".to_owned(),
            work: Complexity::one(),
            call: call(1.0, 0.0),
        }];
        assert!(matches!(
            solve_cycle(&components, n(), None),
            SolverOutcome::NotApplicable { .. }
        ));
    }
}
