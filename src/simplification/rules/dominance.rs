//! Dominant-term extraction.
//!
//! These rewrites preserve the asymptotic class, not the numeric value:
//! `Plus`/`Max` chains collapse to their dominant summand when the
//! comparison is meaningful, constants are absorbed by any growing term,
//! multi-term polynomials truncate to their top degree, and `log` of a
//! polynomial folds to a logarithm. `Multiply` is never collapsed this
//! way. Ties keep the left operand.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{compare_dominance, Rule, RuleCategory, RuleContext};
use crate::classify::{classify, Form};
use crate::core::expr::{BinaryOp, Complexity, ComplexityKind};

/// `a + b` -> dominant summand; constants absorb.
struct SumDominanceRule;

/// `max(a, b)` -> dominant branch; constants absorb.
struct MaxDominanceRule;

/// `min(a, b)` -> smaller side when comparable.
struct MinDominanceRule;

/// Multi-term polynomial -> its top-degree term.
struct PolynomialTruncateRule;

/// `log(f)` with polynomial-family f -> logarithm of the variable.
struct LogOfPolynomialRule;

fn extract_dominant(
    left: &Complexity,
    right: &Complexity,
    keep_larger: bool,
) -> Option<Complexity> {
    // A constant summand is absorbed by anything that grows, even when
    // the growing side is unclassifiable.
    if left.is_constant() && !right.is_constant() {
        return Some(if keep_larger {
            right.clone()
        } else {
            left.clone()
        });
    }
    if right.is_constant() && !left.is_constant() {
        return Some(if keep_larger {
            left.clone()
        } else {
            right.clone()
        });
    }
    match compare_dominance(left, right)? {
        Ordering::Less => Some(if keep_larger {
            right.clone()
        } else {
            left.clone()
        }),
        // Ties keep the left operand.
        Ordering::Equal | Ordering::Greater => Some(if keep_larger {
            left.clone()
        } else {
            right.clone()
        }),
    }
}

impl Rule for SumDominanceRule {
    fn name(&self) -> &'static str {
        "sum-dominance"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dominance
    }

    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity> {
        if context.exact_only {
            return None;
        }
        let ComplexityKind::Binary {
            op: BinaryOp::Plus,
            left,
            right,
        } = expr.kind()
        else {
            return None;
        };
        extract_dominant(left, right, true)
    }
}

impl Rule for MaxDominanceRule {
    fn name(&self) -> &'static str {
        "max-dominance"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dominance
    }

    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity> {
        if context.exact_only {
            return None;
        }
        let ComplexityKind::Binary {
            op: BinaryOp::Max,
            left,
            right,
        } = expr.kind()
        else {
            return None;
        };
        extract_dominant(left, right, true)
    }
}

impl Rule for MinDominanceRule {
    fn name(&self) -> &'static str {
        "min-dominance"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dominance
    }

    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity> {
        if context.exact_only {
            return None;
        }
        let ComplexityKind::Binary {
            op: BinaryOp::Min,
            left,
            right,
        } = expr.kind()
        else {
            return None;
        };
        extract_dominant(left, right, false)
    }
}

impl Rule for PolynomialTruncateRule {
    fn name(&self) -> &'static str {
        "polynomial-truncate"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dominance
    }

    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity> {
        if context.exact_only {
            return None;
        }
        let ComplexityKind::Polynomial { var, terms } = expr.kind() else {
            return None;
        };
        if terms.len() < 2 {
            return None;
        }
        let &(deg, coeff) = terms.last()?;
        Some(Complexity::polynomial(var.clone(), vec![(deg, coeff)]))
    }
}

impl Rule for LogOfPolynomialRule {
    fn name(&self) -> &'static str {
        "log-of-polynomial"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Dominance
    }

    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity> {
        if context.exact_only {
            return None;
        }
        let ComplexityKind::LogOf { base, inner } = expr.kind() else {
            return None;
        };
        let var = inner.dominant_variable()?;
        let c = classify(inner, &var);
        match c.form {
            // log(n^d) ~ d · log n
            Form::Polynomial | Form::PolyLog => Some(Complexity::logarithmic(
                c.degree.unwrap_or(1.0),
                *base,
                var,
            )),
            _ => None,
        }
    }
}

/// All dominance rules.
pub fn rules() -> Vec<Rc<dyn Rule>> {
    vec![
        Rc::new(SumDominanceRule),
        Rc::new(MaxDominanceRule),
        Rc::new(MinDominanceRule),
        Rc::new(PolynomialTruncateRule),
        Rc::new(LogOfPolynomialRule),
    ]
}
