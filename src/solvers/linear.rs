//! Linear recurrences with constant coefficients.
//!
//! `T(n) = Σᵢ aᵢ·T(n−i) + f(n)` is solved through its characteristic
//! polynomial `x^K − a₁·x^(K−1) − … − a_K = 0`:
//!
//! - K = 1: the root is a₁ directly.
//! - K = 2: quadratic formula, detecting complex conjugate pairs via the
//!   discriminant.
//! - K >= 3: all roots of the companion polynomial at once
//!   (Durand–Kerner iteration over `num_complex::Complex64`).
//!
//! Roots within 1e-6 of each other are grouped to detect multiplicities.
//! The dominant root r (largest modulus) fixes the homogeneous part:
//! `|r| > 1` gives O(r^n) (times n^(m−1) when repeated), `|r| = 1`
//! repeated with multiplicity m gives O(n^(m−1)), `|r| < 1` gives O(1).
//! A particular solution for f(n) is added by case analysis, with the
//! summation case at r = 1 and the resonance case when f is exponential
//! with base |r|.

use num_complex::Complex64;
use tracing::debug;

use super::{LinearMethod, SolverOutcome};
use crate::classify::{classify, Form};
use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::recurrence::RecurrenceRelation;
use crate::simplification::simplify_expr;

/// Roots closer than this are treated as one root with multiplicity.
const ROOT_TOLERANCE: f64 = 1e-6;

/// One distinct characteristic root.
#[derive(Debug, Clone, Copy)]
struct GroupedRoot {
    value: Complex64,
    multiplicity: usize,
}

/// Apply the linear solver. The caller has already checked
/// [`RecurrenceRelation::is_linear_candidate`].
pub fn solve(relation: &RecurrenceRelation) -> SolverOutcome {
    // Collect a_i by reduction depth; K is the largest reduction.
    let order = relation
        .terms()
        .iter()
        .map(|t| t.reduction as usize)
        .max()
        .unwrap_or(0);
    if order == 0 {
        return SolverOutcome::NotApplicable {
            reason: "degenerate linear recurrence of order zero".to_owned(),
            violated: vec!["largest reduction must be at least 1".to_owned()],
            suggestions: vec![],
        };
    }

    let mut coefficients = vec![0.0; order + 1]; // coefficients[i] = a_i
    for term in relation.terms() {
        coefficients[term.reduction as usize] += term.coefficient;
    }

    let (roots, method) = match order {
        1 => (
            vec![Complex64::new(coefficients[1], 0.0)],
            LinearMethod::DirectRoot,
        ),
        2 => (
            quadratic_roots(coefficients[1], coefficients[2]),
            LinearMethod::QuadraticFormula,
        ),
        _ => {
            let Some(roots) = companion_roots(&coefficients) else {
                return SolverOutcome::NotApplicable {
                    reason: "companion-root iteration failed to converge".to_owned(),
                    violated: vec![format!(
                        "characteristic polynomial of order {} resisted root finding",
                        order
                    )],
                    suggestions: vec![
                        "numeric unrolling is available for n <= 100".to_owned(),
                    ],
                };
            };
            (roots, LinearMethod::CompanionRoots)
        }
    };

    let grouped = group_roots(&roots);
    let dominant = grouped
        .iter()
        .max_by(|a, b| {
            a.value
                .norm()
                .partial_cmp(&b.value.norm())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied();
    let Some(dominant) = dominant else {
        return SolverOutcome::NotApplicable {
            reason: "characteristic polynomial has no roots".to_owned(),
            violated: vec![],
            suggestions: vec![],
        };
    };
    debug!(
        root = dominant.value.norm(),
        multiplicity = dominant.multiplicity,
        "dominant characteristic root"
    );

    let var = relation.variable().clone();
    let homogeneous = homogeneous_part(&dominant, &var);
    let particular = particular_part(relation, &grouped, &dominant, &var);
    let solution = simplify_expr(Complexity::plus(homogeneous, particular));

    SolverOutcome::LinearSolved { solution, method }
}

/// Roots of `x² − a₁·x − a₂`.
fn quadratic_roots(a1: f64, a2: f64) -> Vec<Complex64> {
    let disc = a1 * a1 + 4.0 * a2;
    if disc >= 0.0 {
        let sq = disc.sqrt();
        vec![
            Complex64::new((a1 + sq) / 2.0, 0.0),
            Complex64::new((a1 - sq) / 2.0, 0.0),
        ]
    } else {
        // Complex conjugate pair.
        let im = (-disc).sqrt() / 2.0;
        vec![
            Complex64::new(a1 / 2.0, im),
            Complex64::new(a1 / 2.0, -im),
        ]
    }
}

/// All roots of the monic polynomial `x^K − Σ aᵢ·x^(K−i)` by
/// Durand–Kerner iteration (simultaneous Newton on all roots — the
/// eigenvalues of the companion matrix).
fn companion_roots(coefficients: &[f64]) -> Option<Vec<Complex64>> {
    let order = coefficients.len() - 1;
    // Monic polynomial coefficients, low degree first:
    // p(x) = x^K − a₁·x^(K−1) − … − a_K
    let mut poly = vec![Complex64::new(0.0, 0.0); order + 1];
    poly[order] = Complex64::new(1.0, 0.0);
    for (i, &a) in coefficients.iter().enumerate().skip(1) {
        poly[order - i] = Complex64::new(-a, 0.0);
    }

    let eval = |x: Complex64| {
        let mut acc = Complex64::new(0.0, 0.0);
        for &c in poly.iter().rev() {
            acc = acc * x + c;
        }
        acc
    };

    // Standard starting points: powers of a non-real, non-unit seed.
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..order).map(|k| seed.powu(k as u32 + 1)).collect();

    for _ in 0..500 {
        let mut worst = 0.0_f64;
        for i in 0..order {
            let mut denom = Complex64::new(1.0, 0.0);
            for j in 0..order {
                if i != j {
                    denom *= roots[i] - roots[j];
                }
            }
            if denom.norm() < 1e-300 {
                // Coincident estimates: nudge apart and retry next sweep.
                roots[i] += Complex64::new(1e-4, 1e-4);
                continue;
            }
            let delta = eval(roots[i]) / denom;
            roots[i] -= delta;
            worst = worst.max(delta.norm());
        }
        if worst < 1e-12 {
            return Some(roots);
        }
    }
    None
}

/// Group roots within tolerance to find multiplicities.
fn group_roots(roots: &[Complex64]) -> Vec<GroupedRoot> {
    let mut grouped: Vec<GroupedRoot> = Vec::new();
    for &root in roots {
        match grouped
            .iter_mut()
            .find(|g| (g.value - root).norm() < ROOT_TOLERANCE)
        {
            Some(g) => g.multiplicity += 1,
            None => grouped.push(GroupedRoot {
                value: root,
                multiplicity: 1,
            }),
        }
    }
    grouped
}

/// Snap near-integer moduli so `2.0000000001^n` renders as `2^n`.
fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < ROOT_TOLERANCE {
        rounded
    } else {
        value
    }
}

fn homogeneous_part(dominant: &GroupedRoot, var: &Variable) -> Complexity {
    let modulus = snap(dominant.value.norm());
    let m = dominant.multiplicity;
    if modulus > 1.0 {
        let exponential = Complexity::exponential(modulus, var.clone());
        if m > 1 {
            Complexity::multiply(
                Complexity::polylog(var.clone(), (m - 1) as f64, 0.0),
                exponential,
            )
        } else {
            exponential
        }
    } else if (modulus - 1.0).abs() < ROOT_TOLERANCE && m > 1 {
        Complexity::polylog(var.clone(), (m - 1) as f64, 0.0)
    } else {
        Complexity::one()
    }
}

/// Particular solution by case analysis on f(n).
fn particular_part(
    relation: &RecurrenceRelation,
    grouped: &[GroupedRoot],
    dominant: &GroupedRoot,
    var: &Variable,
) -> Complexity {
    let work = relation.work();
    let class = classify(work, var);
    let root_at_one = grouped
        .iter()
        .find(|g| (g.value - Complex64::new(1.0, 0.0)).norm() < ROOT_TOLERANCE)
        .map(|g| g.multiplicity)
        .unwrap_or(0);

    match class.form {
        Form::Constant => {
            if root_at_one > 0 {
                // Summation of a constant across n levels (and higher
                // multiplicities raise the power further).
                Complexity::polylog(var.clone(), root_at_one as f64, 0.0)
            } else {
                Complexity::one()
            }
        }
        Form::Polynomial | Form::Logarithmic | Form::PolyLog => {
            let (k, j) = class.polylog_pair().unwrap_or((0.0, 0.0));
            // Each unit of multiplicity at root 1 integrates once more.
            Complexity::polylog(var.clone(), k + root_at_one as f64, j)
        }
        Form::Exponential => {
            let base = class.degree.unwrap_or(2.0);
            let modulus = snap(dominant.value.norm());
            if (base - modulus).abs() < ROOT_TOLERANCE {
                // Resonance: the particular solution picks up a factor n.
                Complexity::multiply(
                    Complexity::variable(var.clone()),
                    Complexity::exponential(base, var.clone()),
                )
            } else {
                Complexity::exponential(base, var.clone())
            }
        }
        _ => (**work).clone(),
    }
}
