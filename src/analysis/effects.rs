//! Parallel and probabilistic decorations.
//!
//! Purely syntactic recognition of parallel-loop constructs, async
//! control flow and random-number generators. Decorations never block an
//! analysis: an unrecognized shape simply falls back to the sequential,
//! deterministic path. Each decoration carries both the expected and the
//! worst-case figure; the emitted result renders the expected one and
//! keeps the worst case for the tooltip.

use crate::core::expr::Complexity;
use crate::lang::{Expr, Method, Stmt};

/// Effect decorations detected on a method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectDecorations {
    /// `Parallel.For`/`Parallel.ForEach`-style constructs present.
    pub parallel: bool,
    /// RNG usage present.
    pub probabilistic: bool,
    /// `async`/`await` present.
    pub is_async: bool,
}

impl EffectDecorations {
    /// Whether any decoration applies.
    pub fn any(&self) -> bool {
        self.parallel || self.probabilistic || self.is_async
    }
}

/// A decorated cost: expected and worst-case figures.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedCost {
    /// Expected-case bound (what gets rendered).
    pub expected: Complexity,
    /// Worst-case bound (tooltip material).
    pub worst: Complexity,
}

impl DecoratedCost {
    /// An undecorated cost: expected and worst case coincide.
    pub fn plain(cost: Complexity) -> Self {
        DecoratedCost {
            expected: cost.clone(),
            worst: cost,
        }
    }
}

/// Scan a method for effect decorations.
pub fn detect(method: &Method) -> EffectDecorations {
    let mut decorations = EffectDecorations {
        is_async: method.modifiers.is_async,
        ..EffectDecorations::default()
    };
    scan_stmts(&method.body.statements, &mut decorations);
    decorations
}

fn scan_stmts(statements: &[Stmt], out: &mut EffectDecorations) {
    for stmt in statements {
        match stmt {
            Stmt::Local { init: Some(e), .. }
            | Stmt::Expr { expr: e, .. }
            | Stmt::Throw { value: e, .. } => scan_expr(e, out),
            Stmt::Return { value: Some(e), .. } => scan_expr(e, out),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                scan_expr(cond, out);
                scan_stmts(&then_branch.statements, out);
                if let Some(branch) = else_branch {
                    scan_stmts(&branch.statements, out);
                }
            }
            Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. } => {
                scan_expr(cond, out);
                scan_stmts(&body.statements, out);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    scan_stmts(std::slice::from_ref(init), out);
                }
                if let Some(cond) = cond {
                    scan_expr(cond, out);
                }
                if let Some(update) = update {
                    scan_expr(update, out);
                }
                scan_stmts(&body.statements, out);
            }
            Stmt::ForEach { iterable, body, .. } => {
                scan_expr(iterable, out);
                scan_stmts(&body.statements, out);
            }
            Stmt::Block(block) => scan_stmts(&block.statements, out),
            _ => {}
        }
    }
}

fn scan_expr(expr: &Expr, out: &mut EffectDecorations) {
    match expr {
        Expr::Await(inner) => {
            out.is_async = true;
            scan_expr(inner, out);
        }
        Expr::Call { callee, args } => {
            if let Expr::Member { target, name } = callee.as_ref() {
                if target.as_ident() == Some("Parallel")
                    && (name == "For" || name == "ForEach" || name == "Invoke")
                {
                    out.parallel = true;
                }
                if name == "Next" || name == "NextDouble" {
                    out.probabilistic = true;
                }
            }
            if callee.callee_name().is_some_and(|n| n == "rand" || n == "random") {
                out.probabilistic = true;
            }
            scan_expr(callee, out);
            for arg in args {
                scan_expr(arg, out);
            }
        }
        Expr::New { type_name, args } => {
            if type_name == "Random" {
                out.probabilistic = true;
            }
            for arg in args {
                scan_expr(arg, out);
            }
        }
        Expr::Member { target, .. } => scan_expr(target, out),
        Expr::Index { target, index } => {
            scan_expr(target, out);
            scan_expr(index, out);
        }
        Expr::Unary { operand, .. } => scan_expr(operand, out),
        Expr::Binary { left, right, .. } => {
            scan_expr(left, out);
            scan_expr(right, out);
        }
        Expr::Assign { target, value, .. } => {
            scan_expr(target, out);
            scan_expr(value, out);
        }
        Expr::IncDec { target, .. } => scan_expr(target, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    #[test]
    fn detects_parallel_for() {
        let file = parse_source("void f(int n) { Parallel.For(0, n, body); }");
        let d = detect(&file.methods[0]);
        assert!(d.parallel);
        assert!(!d.probabilistic);
    }

    #[test]
    fn detects_rng_usage() {
        let file =
            parse_source("int pick(int n) { var rng = new Random(); return rng.Next(n); }");
        let d = detect(&file.methods[0]);
        assert!(d.probabilistic);
    }

    #[test]
    fn detects_await() {
        let file = parse_source("async void f() { await fetch(); }");
        let d = detect(&file.methods[0]);
        assert!(d.is_async);
    }

    #[test]
    fn plain_code_has_no_decorations() {
        let file = parse_source("int id(int x) { return x; }");
        assert!(!detect(&file.methods[0]).any());
    }
}
