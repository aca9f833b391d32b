//! Loop bound inference.
//!
//! Per-loop iteration bounds are inferred syntactically, update step
//! first: a multiply/divide/shift update makes a loop logarithmic no
//! matter what the condition says; then the condition is inspected for a
//! mapped identifier, a `.Length`/`.Count` member, or a numeric literal.
//! Quadratic growth is never assigned to a single loop — it arises from
//! nesting in the composer. Unrecognized shapes yield `Unknown` with a
//! conservative upper expression.

use crate::analysis::context::AnalysisContext;
use crate::core::expr::Complexity;
use crate::core::variable::{VarKind, Variable};
use crate::lang::{AssignOp, BinOp, Block, Expr, Stmt};

/// The recognized shape of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPattern {
    /// Counter marches linearly to the bound.
    Linear,
    /// Counter halves/doubles (or gcd-style shrinks).
    Logarithmic,
    /// Triangular iteration space (assigned only by composition).
    Quadratic,
    /// Shape not recognized; the bound is conservative.
    Unknown,
}

/// An inferred loop bound.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBound {
    /// Lower bound expression.
    pub lower: Complexity,
    /// Upper bound expression.
    pub upper: Complexity,
    /// Counter step per iteration.
    pub step: f64,
    /// Recognized pattern.
    pub pattern: LoopPattern,
    /// True when the bound is exact rather than conservative.
    pub exact: bool,
}

impl LoopBound {
    /// The derived iteration count:
    /// Linear -> (upper − lower)/step, Logarithmic -> log(upper),
    /// Quadratic -> upper²/2 + upper/2, Unknown -> upper.
    pub fn iteration_count(&self) -> Complexity {
        match self.pattern {
            LoopPattern::Linear => {
                let span = match (self.upper.as_constant(), self.lower.as_constant()) {
                    (Some(hi), Some(lo)) => Complexity::constant((hi - lo).max(0.0)),
                    _ => self.upper.clone(),
                };
                if self.step == 1.0 {
                    span
                } else {
                    Complexity::multiply(Complexity::constant(1.0 / self.step), span)
                }
            }
            LoopPattern::Logarithmic => Complexity::log_of(2.0, self.upper.clone()),
            LoopPattern::Quadratic => Complexity::plus(
                Complexity::multiply(
                    Complexity::constant(0.5),
                    Complexity::power(self.upper.clone(), 2.0),
                ),
                Complexity::multiply(Complexity::constant(0.5), self.upper.clone()),
            ),
            LoopPattern::Unknown => self.upper.clone(),
        }
    }

    fn unknown(upper: Complexity) -> Self {
        LoopBound {
            lower: Complexity::constant(0.0),
            upper,
            step: 1.0,
            pattern: LoopPattern::Unknown,
            exact: false,
        }
    }
}

/// Translate a size-denoting source expression into the algebra.
///
/// `i < n` gives the canonical variable for `n`; `arr.Length` gives the
/// collection's variable (canonical n as a fallback); literals are
/// constants. Arithmetic over sizes maps structurally so `n - 1` and
/// `n / 2` stay meaningful.
pub fn size_expr(expr: &Expr, ctx: &AnalysisContext) -> Option<Complexity> {
    match expr {
        Expr::IntLit(v) => Some(Complexity::constant(*v as f64)),
        Expr::FloatLit(v) => Some(Complexity::constant(*v)),
        Expr::Ident(name) => ctx.variable_for(name).map(|v| Complexity::variable(v.clone())),
        Expr::Member { target, name } if name == "Length" || name == "Count" => {
            let var = target
                .as_ident()
                .and_then(|n| ctx.variable_for(n).cloned())
                .unwrap_or_else(|| Variable::new("n", VarKind::DataCount));
            Some(Complexity::variable(var))
        }
        Expr::Binary { op, left, right } => match op {
            // Subtraction and right shift only shrink a bound; the
            // minuend alone is a sound upper expression even when the
            // subtrahend is an unmapped loop counter.
            BinOp::Sub | BinOp::Shr => size_expr(left, ctx),
            BinOp::Add => Some(Complexity::plus(
                size_expr(left, ctx)?,
                size_expr(right, ctx)?,
            )),
            BinOp::Mul => Some(Complexity::multiply(
                size_expr(left, ctx)?,
                size_expr(right, ctx)?,
            )),
            BinOp::Div => {
                let l = size_expr(left, ctx)?;
                match size_expr(right, ctx).and_then(|r| r.as_constant()) {
                    Some(c) if c > 0.0 => {
                        Some(Complexity::multiply(Complexity::constant(1.0 / c), l))
                    }
                    _ => Some(l),
                }
            }
            _ => None,
        },
        _ => None,
    }
}

/// Whether an update expression is a halving/doubling step for `counter`.
fn is_multiplicative_update(update: &Expr, counter: Option<&str>) -> bool {
    let Expr::Assign { target, op, value } = update else {
        return false;
    };
    if !counter.is_none_or(|c| target.as_ident() == Some(c)) {
        return false;
    }
    match op {
        AssignOp::Mul | AssignOp::Div | AssignOp::Shl | AssignOp::Shr => true,
        // i = i / 2, i = i * 2
        AssignOp::Assign => matches!(
            value.as_ref(),
            Expr::Binary {
                op: BinOp::Div | BinOp::Mul | BinOp::Shl | BinOp::Shr,
                ..
            }
        ),
        _ => false,
    }
}

/// The counter's step for linear updates (`i++` is 1, `i += 2` is 2).
fn linear_step(update: &Expr) -> f64 {
    match update {
        Expr::IncDec { .. } => 1.0,
        Expr::Assign {
            op: AssignOp::Add | AssignOp::Sub,
            value,
            ..
        } => match value.as_ref() {
            Expr::IntLit(v) => (*v as f64).abs().max(1.0),
            _ => 1.0,
        },
        _ => 1.0,
    }
}

/// Infer the bound of a counter-style `for` loop.
pub fn infer_for_bound(
    init: Option<&Stmt>,
    cond: Option<&Expr>,
    update: Option<&Expr>,
    ctx: &AnalysisContext,
) -> LoopBound {
    let counter = init.and_then(|stmt| match stmt {
        Stmt::Local { name, .. } => Some(name.as_str()),
        Stmt::Expr {
            expr: Expr::Assign { target, .. },
            ..
        } => target.as_ident(),
        _ => None,
    });
    let lower = init
        .and_then(|stmt| match stmt {
            Stmt::Local {
                init: Some(expr), ..
            } => size_expr(expr, ctx),
            Stmt::Expr {
                expr: Expr::Assign { value, .. },
                ..
            } => size_expr(value, ctx),
            _ => None,
        })
        .unwrap_or_else(|| Complexity::constant(0.0));

    let upper = cond.and_then(|cond| condition_bound(cond, ctx));

    // Update step first: a multiplicative step is logarithmic whatever
    // the condition looks like.
    if let Some(update) = update {
        if is_multiplicative_update(update, counter) {
            return LoopBound {
                lower,
                upper: upper.unwrap_or_else(|| {
                    Complexity::variable(ctx.primary_variable())
                }),
                step: 1.0,
                pattern: LoopPattern::Logarithmic,
                exact: true,
            };
        }
    }

    match upper {
        Some(upper) => LoopBound {
            lower,
            upper,
            step: update.map_or(1.0, linear_step),
            pattern: LoopPattern::Linear,
            exact: true,
        },
        None => LoopBound::unknown(Complexity::variable(ctx.primary_variable())),
    }
}

/// The bound expression on the right of a `<`/`<=`-style condition.
fn condition_bound(cond: &Expr, ctx: &AnalysisContext) -> Option<Complexity> {
    match cond {
        Expr::Binary {
            op: BinOp::Lt | BinOp::Le,
            right,
            ..
        } => size_expr(right, ctx),
        Expr::Binary {
            op: BinOp::Gt | BinOp::Ge,
            left,
            ..
        } => size_expr(left, ctx),
        Expr::Binary {
            op: BinOp::Ne,
            right,
            ..
        } => size_expr(right, ctx),
        _ => None,
    }
}

/// Identifiers mentioned in a condition.
fn condition_identifiers<'a>(cond: &'a Expr, out: &mut Vec<&'a str>) {
    match cond {
        Expr::Ident(name) => out.push(name),
        Expr::Binary { left, right, .. } => {
            condition_identifiers(left, out);
            condition_identifiers(right, out);
        }
        Expr::Unary { operand, .. } => condition_identifiers(operand, out),
        Expr::Member { target, .. } => condition_identifiers(target, out),
        _ => {}
    }
}

/// Whether a block updates any of `names` multiplicatively (halving or
/// doubling), subtractively, or at all.
fn scan_updates(body: &Block, names: &[&str]) -> (bool, bool) {
    let mut multiplicative = false;
    let mut subtractive = false;
    scan_updates_stmts(&body.statements, names, &mut multiplicative, &mut subtractive);
    (multiplicative, subtractive)
}

fn scan_updates_stmts(
    statements: &[Stmt],
    names: &[&str],
    multiplicative: &mut bool,
    subtractive: &mut bool,
) {
    for stmt in statements {
        match stmt {
            Stmt::Expr { expr, .. } | Stmt::Local { init: Some(expr), .. } => {
                scan_update_expr(expr, names, multiplicative, subtractive);
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                scan_updates_stmts(&then_branch.statements, names, multiplicative, subtractive);
                if let Some(branch) = else_branch {
                    scan_updates_stmts(&branch.statements, names, multiplicative, subtractive);
                }
            }
            Stmt::While { body, .. }
            | Stmt::DoWhile { body, .. }
            | Stmt::For { body, .. }
            | Stmt::ForEach { body, .. } => {
                scan_updates_stmts(&body.statements, names, multiplicative, subtractive);
            }
            Stmt::Block(block) => {
                scan_updates_stmts(&block.statements, names, multiplicative, subtractive);
            }
            _ => {}
        }
    }
}

fn scan_update_expr(expr: &Expr, names: &[&str], multiplicative: &mut bool, subtractive: &mut bool) {
    if let Expr::Assign { target, op, value } = expr {
        let Some(target_name) = target.as_ident() else {
            return;
        };
        if !names.contains(&target_name) {
            return;
        }
        match op {
            AssignOp::Mul | AssignOp::Div | AssignOp::Shl | AssignOp::Shr => {
                *multiplicative = true;
            }
            AssignOp::Sub => *subtractive = true,
            AssignOp::Assign => match value.as_ref() {
                Expr::Binary {
                    op: BinOp::Div | BinOp::Mul | BinOp::Shl | BinOp::Shr,
                    ..
                } => *multiplicative = true,
                Expr::Binary { op: BinOp::Sub, .. } => *subtractive = true,
                // left = mid + 1 / right = mid − 1: a halving search when
                // mid is a midpoint local.
                Expr::Binary {
                    op: BinOp::Add,
                    left,
                    ..
                } if left.as_ident().is_some_and(|n| n.contains("mid")) => {
                    *multiplicative = true;
                }
                Expr::Ident(name) if name.contains("mid") => *multiplicative = true,
                _ => {}
            },
            _ => {}
        }
    }
}

/// Infer the bound of a `while` (or `do-while`) loop from its condition
/// and body updates.
pub fn infer_while_bound(cond: &Expr, body: &Block, ctx: &AnalysisContext) -> LoopBound {
    let mut names = Vec::new();
    condition_identifiers(cond, &mut names);
    let (multiplicative, subtractive) = scan_updates(body, &names);

    let upper = condition_bound(cond, ctx)
        .or_else(|| {
            names
                .iter()
                .find_map(|n| ctx.variable_for(n))
                .map(|v| Complexity::variable(v.clone()))
        })
        .unwrap_or_else(|| Complexity::variable(ctx.primary_variable()));

    if multiplicative {
        // Halving/doubling update reaches the bound in log steps.
        return LoopBound {
            lower: Complexity::constant(0.0),
            upper,
            step: 1.0,
            pattern: LoopPattern::Logarithmic,
            exact: true,
        };
    }

    // `while (i != j)` with subtractive updates: gcd-style, logarithmic.
    if subtractive
        && matches!(
            cond,
            Expr::Binary {
                op: BinOp::Ne,
                ..
            }
        )
    {
        return LoopBound {
            lower: Complexity::constant(0.0),
            upper,
            step: 1.0,
            pattern: LoopPattern::Logarithmic,
            exact: false,
        };
    }

    LoopBound {
        lower: Complexity::constant(0.0),
        upper,
        step: 1.0,
        pattern: LoopPattern::Linear,
        exact: false,
    }
}

/// Infer the bound of a `foreach` loop: linear in the collection.
pub fn infer_foreach_bound(iterable: &Expr, ctx: &AnalysisContext) -> LoopBound {
    let upper = size_expr(iterable, ctx)
        .or_else(|| {
            iterable
                .as_ident()
                .and_then(|n| ctx.variable_for(n))
                .map(|v| Complexity::variable(v.clone()))
        })
        .unwrap_or_else(|| Complexity::variable(ctx.primary_variable()));
    LoopBound {
        lower: Complexity::constant(0.0),
        upper,
        step: 1.0,
        pattern: LoopPattern::Linear,
        exact: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    fn method_context(source: &str) -> (crate::lang::SourceFile, AnalysisContext) {
        let file = parse_source(source);
        let ctx = AnalysisContext::for_method(&file.methods[0], 10);
        (file, ctx)
    }

    fn first_for(file: &crate::lang::SourceFile) -> (&Stmt, &Option<Expr>, &Option<Expr>) {
        match &file.methods[0].body.statements[0] {
            Stmt::For {
                init, cond, update, ..
            } => (init.as_deref().unwrap(), cond, update),
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn counter_to_mapped_identifier_is_linear() {
        let (file, ctx) = method_context("void f(int n) { for (int i = 0; i < n; i++) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.pattern, LoopPattern::Linear);
        assert_eq!(bound.iteration_count().big_o(), "O(n)");
    }

    #[test]
    fn multiplicative_update_wins_over_condition() {
        let (file, ctx) = method_context("void f(int n) { for (int i = 1; i < n; i *= 2) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.pattern, LoopPattern::Logarithmic);
        assert_eq!(bound.iteration_count().big_o(), "O(log n)");
    }

    #[test]
    fn length_member_maps_to_collection_variable() {
        let (file, ctx) =
            method_context("void f(int[] arr) { for (int i = 0; i < arr.Length; i++) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.iteration_count().big_o(), "O(n)");
    }

    #[test]
    fn literal_bound_folds_to_a_constant() {
        let (file, ctx) = method_context("void f() { for (int i = 0; i < 64; i++) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.pattern, LoopPattern::Linear);
        assert_eq!(bound.iteration_count().big_o(), "O(1)");
    }

    #[test]
    fn triangular_inner_bound_keeps_the_minuend() {
        // j < n - i - 1: the counter i is unmapped, but n still bounds
        // the loop from above.
        let (file, ctx) =
            method_context("void f(int n) { for (int j = 0; j < n - i - 1; j++) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.pattern, LoopPattern::Linear);
        assert_eq!(bound.iteration_count().big_o(), "O(n)");
    }

    #[test]
    fn while_with_halving_body_is_logarithmic() {
        let (file, ctx) =
            method_context("void f(int n) { int i = n; while (i > 1) { i = i / 2; } }");
        match &file.methods[0].body.statements[1] {
            Stmt::While { cond, body, .. } => {
                let bound = infer_while_bound(cond, body, &ctx);
                assert_eq!(bound.pattern, LoopPattern::Logarithmic);
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn gcd_style_loop_is_logarithmic() {
        let (file, ctx) = method_context(
            "void f(int a, int b) { while (a != b) { if (a > b) { a -= b; } else { b -= a; } } }",
        );
        match &file.methods[0].body.statements[0] {
            Stmt::While { cond, body, .. } => {
                let bound = infer_while_bound(cond, body, &ctx);
                assert_eq!(bound.pattern, LoopPattern::Logarithmic);
                assert!(!bound.exact);
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn foreach_is_linear_in_the_collection() {
        let (file, ctx) = method_context("void f(int[] arr) { foreach (var x in arr) { } }");
        match &file.methods[0].body.statements[0] {
            Stmt::ForEach { iterable, .. } => {
                let bound = infer_foreach_bound(iterable, &ctx);
                assert_eq!(bound.pattern, LoopPattern::Linear);
                assert_eq!(bound.iteration_count().big_o(), "O(n)");
            }
            other => panic!("expected foreach, got {:?}", other),
        }
    }

    #[test]
    fn unknown_shapes_stay_conservative() {
        let (file, ctx) = method_context("void f(int n) { for (int i = 0; g(i); i++) { } }");
        let (init, cond, update) = first_for(&file);
        let bound = infer_for_bound(Some(init), cond.as_ref(), update.as_ref(), &ctx);
        assert_eq!(bound.pattern, LoopPattern::Unknown);
        assert!(!bound.exact);
    }
}
