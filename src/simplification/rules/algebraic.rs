//! Exact algebraic rewrites.
//!
//! These rules never change the numeric value of an expression, only its
//! shape: products of pure polylog-family factors coalesce into a single
//! `PolyLog` term (`n^a · log^j n · n^b · log^k n = n^(a+b) · log^(j+k)`),
//! scattered constant coefficients merge, and powers of logarithms join
//! the polylog family.

use std::rc::Rc;

use super::{Rule, RuleCategory, RuleContext};
use crate::core::expr::{BinaryOp, Complexity, ComplexityKind};
use crate::core::variable::Variable;

/// A pure single-term polylog-family factor: coeff · v^degree · log^j v.
struct PolyLogParts {
    var: Variable,
    coeff: f64,
    degree: f64,
    log_exponent: f64,
}

/// Destructure a factor into exact polylog parts, or `None` when the
/// shape is not a single term (multi-term polynomials are *not* pure:
/// coalescing them would drop lower-order terms, which is the dominance
/// rules' call to make).
fn pure_polylog_parts(expr: &Complexity) -> Option<PolyLogParts> {
    match expr.kind() {
        ComplexityKind::Variable(v) => Some(PolyLogParts {
            var: v.clone(),
            coeff: 1.0,
            degree: 1.0,
            log_exponent: 0.0,
        }),
        ComplexityKind::Linear { coeff, var } => Some(PolyLogParts {
            var: var.clone(),
            coeff: *coeff,
            degree: 1.0,
            log_exponent: 0.0,
        }),
        ComplexityKind::Polynomial { var, terms } => match terms.as_slice() {
            [(deg, coeff)] => Some(PolyLogParts {
                var: var.clone(),
                coeff: *coeff,
                degree: f64::from(*deg),
                log_exponent: 0.0,
            }),
            _ => None,
        },
        ComplexityKind::Logarithmic { coeff, var, .. } => Some(PolyLogParts {
            var: var.clone(),
            coeff: *coeff,
            degree: 0.0,
            log_exponent: 1.0,
        }),
        ComplexityKind::PolyLog {
            var,
            degree,
            log_exponent,
        } => Some(PolyLogParts {
            var: var.clone(),
            coeff: 1.0,
            degree: *degree,
            log_exponent: *log_exponent,
        }),
        _ => None,
    }
}

/// Rebuild `coeff · v^d · log^j v` in normalized form, folding the
/// coefficient into a variant that carries one where possible.
fn rebuild(parts: PolyLogParts) -> Complexity {
    if parts.log_exponent == 0.0
        && parts.degree >= 0.0
        && parts.degree.fract() == 0.0
        && parts.degree <= f64::from(u32::MAX)
    {
        return Complexity::polynomial(parts.var, vec![(parts.degree as u32, parts.coeff)]);
    }
    if parts.degree == 0.0 && parts.log_exponent == 1.0 {
        return Complexity::logarithmic(parts.coeff, 2.0, parts.var);
    }
    let body = Complexity::polylog(parts.var, parts.degree, parts.log_exponent);
    if parts.coeff == 1.0 {
        body
    } else {
        Complexity::multiply(Complexity::constant(parts.coeff), body)
    }
}

/// `n^a log^j n · n^b log^k n = n^(a+b) log^(j+k) n` for same-variable
/// pure factors.
struct ProductCoalesceRule;

impl Rule for ProductCoalesceRule {
    fn name(&self) -> &'static str {
        "product-coalesce"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Algebraic
    }

    fn apply(&self, expr: &Complexity, _context: &RuleContext) -> Option<Complexity> {
        let ComplexityKind::Binary {
            op: BinaryOp::Multiply,
            left,
            right,
        } = expr.kind()
        else {
            return None;
        };
        // A constant factor folds into the other side's coefficient.
        for (constant, term) in [(left, right), (right, left)] {
            if let Some(c) = constant.as_constant() {
                let mut parts = pure_polylog_parts(term)?;
                parts.coeff *= c;
                let folded = rebuild(parts);
                if folded != *expr {
                    return Some(folded);
                }
                return None;
            }
        }
        let l = pure_polylog_parts(left)?;
        let r = pure_polylog_parts(right)?;
        if l.var != r.var {
            return None;
        }
        Some(rebuild(PolyLogParts {
            var: l.var,
            coeff: l.coeff * r.coeff,
            degree: l.degree + r.degree,
            log_exponent: l.log_exponent + r.log_exponent,
        }))
    }
}

/// `c1 · (c2 · x) = (c1·c2) · x` — merge scattered constant coefficients
/// in multiplication chains.
struct CoefficientMergeRule;

impl Rule for CoefficientMergeRule {
    fn name(&self) -> &'static str {
        "coefficient-merge"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Algebraic
    }

    fn apply(&self, expr: &Complexity, _context: &RuleContext) -> Option<Complexity> {
        let ComplexityKind::Binary {
            op: BinaryOp::Multiply,
            left,
            right,
        } = expr.kind()
        else {
            return None;
        };
        let outer = left.as_constant()?;
        let ComplexityKind::Binary {
            op: BinaryOp::Multiply,
            left: inner_left,
            right: inner_right,
        } = right.kind()
        else {
            return None;
        };
        let inner = inner_left.as_constant()?;
        Some(Complexity::multiply(
            Complexity::constant(outer * inner),
            (**inner_right).clone(),
        ))
    }
}

/// `(c · log v)^j = c^j · log^j v` — powers of logarithms join the
/// polylog family.
struct PowerOfLogRule;

impl Rule for PowerOfLogRule {
    fn name(&self) -> &'static str {
        "power-of-log"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Algebraic
    }

    fn apply(&self, expr: &Complexity, _context: &RuleContext) -> Option<Complexity> {
        let ComplexityKind::Power { base, exponent } = expr.kind() else {
            return None;
        };
        let ComplexityKind::Logarithmic { coeff, var, .. } = base.kind() else {
            return None;
        };
        Some(rebuild(PolyLogParts {
            var: var.clone(),
            coeff: coeff.powf(*exponent),
            degree: 0.0,
            log_exponent: *exponent,
        }))
    }
}

/// All exact algebraic rules.
pub fn rules() -> Vec<Rc<dyn Rule>> {
    vec![
        Rc::new(CoefficientMergeRule),
        Rc::new(ProductCoalesceRule),
        Rc::new(PowerOfLogRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Variable {
        Variable::n()
    }

    #[test]
    fn coalesces_variable_times_log() {
        let e = Complexity::multiply(
            Complexity::variable(n()),
            Complexity::logarithmic(1.0, 2.0, n()),
        );
        let rule = ProductCoalesceRule;
        let out = rule.apply(&e, &RuleContext::default()).unwrap();
        assert_eq!(out, Complexity::polylog(n(), 1.0, 1.0));
    }

    #[test]
    fn coalescing_preserves_coefficients() {
        // 3n · 2 log n = 6 · n log n
        let e = Complexity::multiply(
            Complexity::linear(3.0, n()),
            Complexity::logarithmic(2.0, 2.0, n()),
        );
        let out = ProductCoalesceRule.apply(&e, &RuleContext::default()).unwrap();
        let expected = Complexity::multiply(
            Complexity::constant(6.0),
            Complexity::polylog(n(), 1.0, 1.0),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn multi_term_polynomials_are_left_alone() {
        let e = Complexity::multiply(
            Complexity::polynomial(n(), vec![(2, 1.0), (1, 1.0)]),
            Complexity::variable(n()),
        );
        assert!(ProductCoalesceRule.apply(&e, &RuleContext::default()).is_none());
    }

    #[test]
    fn different_variables_do_not_coalesce() {
        let e = Complexity::multiply(
            Complexity::variable(n()),
            Complexity::variable(Variable::named("m")),
        );
        assert!(ProductCoalesceRule.apply(&e, &RuleContext::default()).is_none());
    }
}
