//! Recursion detection.
//!
//! While walking a method, every invocation resolving back to the
//! containing method is recorded together with the shape of its
//! argument reduction: pass-through (a problem — the recursion never
//! terminates structurally), scaled (`n/2`, `n >> 1`), decreased
//! (`n − 1`), or unknown. The collected calls normalize into a
//! [`RecurrenceRelation`] once the surrounding work is composed.

use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::lang::{BinOp, Expr, Method, Stmt};
use crate::recurrence::{RecurrenceRelation, RecurrenceTerm};

/// How a recursive call reduces its argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgReduction {
    /// The same variable passed straight through: non-reducing.
    PassThrough,
    /// Multiplied down: `n/k`, `n >> k` give factor `1/k`, `1/2^k`.
    Scaled(f64),
    /// Subtracted down: `n − k` gives reduction `k`.
    Decreased(f64),
    /// Shape not recognized.
    Unknown,
}

/// One detected recursive call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveCall {
    /// The strongest reduction found among the call's arguments.
    pub reduction: ArgReduction,
}

/// Names of locals initialized as midpoints (`mid = (lo + hi) / 2`):
/// a recursive call passing such a local halves its range.
pub fn midpoint_locals(method: &Method) -> Vec<String> {
    let mut out = Vec::new();
    collect_midpoints(&method.body.statements, &mut out);
    out
}

fn collect_midpoints(statements: &[Stmt], out: &mut Vec<String>) {
    for stmt in statements {
        match stmt {
            Stmt::Local {
                name,
                init: Some(init),
                ..
            } => {
                if is_midpoint_expr(init) {
                    out.push(name.clone());
                }
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_midpoints(&then_branch.statements, out);
                if let Some(branch) = else_branch {
                    collect_midpoints(&branch.statements, out);
                }
            }
            Stmt::While { body, .. }
            | Stmt::DoWhile { body, .. }
            | Stmt::For { body, .. }
            | Stmt::ForEach { body, .. } => collect_midpoints(&body.statements, out),
            Stmt::Block(block) => collect_midpoints(&block.statements, out),
            _ => {}
        }
    }
}

/// `(a + b) / 2` or `a + (b − a) / 2`.
fn is_midpoint_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Binary {
            op: BinOp::Div,
            left,
            right,
        } => {
            matches!(right.as_ref(), Expr::IntLit(2))
                && matches!(left.as_ref(), Expr::Binary { op: BinOp::Add, .. })
        }
        Expr::Binary {
            op: BinOp::Add,
            right,
            ..
        } => matches!(
            right.as_ref(),
            Expr::Binary { op: BinOp::Div, right: divisor, .. }
                if matches!(divisor.as_ref(), Expr::IntLit(2))
        ),
        _ => false,
    }
}

/// Classify one argument of a recursive call against the parameter set.
pub fn classify_argument(arg: &Expr, method: &Method, midpoints: &[String]) -> ArgReduction {
    let is_param = |name: &str| method.param_index(name).is_some();

    match arg {
        Expr::Ident(name) => {
            if is_param(name) {
                ArgReduction::PassThrough
            } else if midpoints.iter().any(|m| m == name) {
                // Half-open range recursion through a midpoint local.
                ArgReduction::Scaled(0.5)
            } else {
                ArgReduction::Unknown
            }
        }
        Expr::Binary { op, left, right } => {
            let base_is_param = left.as_ident().is_some_and(is_param);
            let base_is_midpoint = left
                .as_ident()
                .is_some_and(|n| midpoints.iter().any(|m| m == n));
            match op {
                BinOp::Div if base_is_param => match right.as_ref() {
                    Expr::IntLit(k) if *k > 1 => ArgReduction::Scaled(1.0 / *k as f64),
                    _ => ArgReduction::Unknown,
                },
                BinOp::Shr if base_is_param => match right.as_ref() {
                    Expr::IntLit(k) if *k >= 1 => {
                        ArgReduction::Scaled(1.0 / f64::from(2u32.pow(*k as u32)))
                    }
                    _ => ArgReduction::Unknown,
                },
                BinOp::Sub if base_is_param => match right.as_ref() {
                    Expr::IntLit(k) if *k >= 1 => ArgReduction::Decreased(*k as f64),
                    _ => ArgReduction::Unknown,
                },
                // mid + 1 / mid − 1: the other half of a split range.
                BinOp::Add | BinOp::Sub if base_is_midpoint => ArgReduction::Scaled(0.5),
                _ => ArgReduction::Unknown,
            }
        }
        _ => ArgReduction::Unknown,
    }
}

/// The strongest reduction among a call's arguments: any recognized
/// shrink beats pass-through, and scaled beats nothing at all.
pub fn classify_call(args: &[Expr], method: &Method, midpoints: &[String]) -> RecursiveCall {
    let mut best = ArgReduction::Unknown;
    let mut saw_param = false;
    for arg in args {
        match classify_argument(arg, method, midpoints) {
            ArgReduction::PassThrough => saw_param = true,
            reduction @ (ArgReduction::Scaled(_) | ArgReduction::Decreased(_)) => {
                best = match best {
                    ArgReduction::Scaled(_) | ArgReduction::Decreased(_) => best,
                    _ => reduction,
                };
            }
            ArgReduction::Unknown => {}
        }
    }
    if matches!(best, ArgReduction::Unknown) && saw_param {
        best = ArgReduction::PassThrough;
    }
    RecursiveCall { reduction: best }
}

/// Normalize collected recursive calls into a recurrence.
///
/// Unknown reductions are treated as non-reducing; the solver will then
/// report the recurrence as not applicable rather than inventing a bound.
pub fn to_recurrence(
    calls: &[RecursiveCall],
    work: Complexity,
    variable: Variable,
) -> Option<RecurrenceRelation> {
    if calls.is_empty() {
        return None;
    }
    // Merge identical reductions by summing coefficients.
    let mut terms: Vec<RecurrenceTerm> = Vec::new();
    for call in calls {
        let (scale, reduction) = match call.reduction {
            ArgReduction::Scaled(factor) => (factor, 0.0),
            ArgReduction::Decreased(amount) => (1.0, amount),
            ArgReduction::PassThrough | ArgReduction::Unknown => (1.0, 0.0),
        };
        match terms
            .iter_mut()
            .find(|t| t.scale == scale && t.reduction == reduction)
        {
            Some(term) => term.coefficient += 1.0,
            None => terms.push(RecurrenceTerm {
                coefficient: 1.0,
                scale,
                reduction,
            }),
        }
    }
    RecurrenceRelation::new(variable, terms, work, Complexity::one()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    #[test]
    fn pass_through_is_flagged() {
        let file = parse_source("int f(int n) { return f(n); }");
        let method = &file.methods[0];
        let call = classify_call(
            &[Expr::Ident("n".to_owned())],
            method,
            &midpoint_locals(method),
        );
        assert_eq!(call.reduction, ArgReduction::PassThrough);
    }

    #[test]
    fn halving_and_shifting_scale() {
        let file = parse_source("int f(int n) { return f(n / 2) + f(n >> 1); }");
        let method = &file.methods[0];
        let halved = Expr::Binary {
            op: BinOp::Div,
            left: Box::new(Expr::Ident("n".to_owned())),
            right: Box::new(Expr::IntLit(2)),
        };
        assert_eq!(
            classify_argument(&halved, method, &[]),
            ArgReduction::Scaled(0.5)
        );
        let shifted = Expr::Binary {
            op: BinOp::Shr,
            left: Box::new(Expr::Ident("n".to_owned())),
            right: Box::new(Expr::IntLit(2)),
        };
        assert_eq!(
            classify_argument(&shifted, method, &[]),
            ArgReduction::Scaled(0.25)
        );
    }

    #[test]
    fn subtraction_is_decreasing() {
        let file = parse_source("int f(int n) { return f(n - 1); }");
        let method = &file.methods[0];
        let arg = Expr::Binary {
            op: BinOp::Sub,
            left: Box::new(Expr::Ident("n".to_owned())),
            right: Box::new(Expr::IntLit(1)),
        };
        assert_eq!(
            classify_argument(&arg, method, &[]),
            ArgReduction::Decreased(1.0)
        );
    }

    #[test]
    fn midpoint_locals_imply_halving() {
        let file = parse_source(
            "void ms(int[] a, int l, int r) { if (l < r) { int m = (l + r) / 2; ms(a, l, m); ms(a, m + 1, r); } }",
        );
        let method = &file.methods[0];
        let midpoints = midpoint_locals(method);
        assert_eq!(midpoints, vec!["m".to_owned()]);
        let call = classify_call(
            &[
                Expr::Ident("a".to_owned()),
                Expr::Ident("l".to_owned()),
                Expr::Ident("m".to_owned()),
            ],
            method,
            &midpoints,
        );
        assert_eq!(call.reduction, ArgReduction::Scaled(0.5));
    }

    #[test]
    fn fibonacci_calls_merge_into_two_terms() {
        let calls = vec![
            RecursiveCall {
                reduction: ArgReduction::Decreased(1.0),
            },
            RecursiveCall {
                reduction: ArgReduction::Decreased(2.0),
            },
        ];
        let rec = to_recurrence(&calls, Complexity::one(), Variable::n()).unwrap();
        assert_eq!(rec.terms().len(), 2);
        assert!(rec.is_linear_candidate());
    }

    #[test]
    fn twin_halving_calls_merge_coefficients() {
        let calls = vec![
            RecursiveCall {
                reduction: ArgReduction::Scaled(0.5),
            },
            RecursiveCall {
                reduction: ArgReduction::Scaled(0.5),
            },
        ];
        let rec = to_recurrence(&calls, Complexity::variable(Variable::n()), Variable::n())
            .unwrap();
        assert_eq!(rec.terms().len(), 1);
        assert_eq!(rec.terms()[0].coefficient, 2.0);
        assert!(rec.is_master_candidate());
    }
}
