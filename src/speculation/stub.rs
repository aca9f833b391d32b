//! Stub detection.
//!
//! A stub is a method that pretends to work: it returns a constant, a
//! default or null, or its only non-return statement increments a
//! counter-like field. Stubs report O(1) at low confidence so callers
//! see a figure without mistaking it for an analysis.

use crate::lang::{AssignOp, Expr, Method, Stmt};

/// A detected stub body.
#[derive(Debug, Clone, PartialEq)]
pub struct StubFinding {
    /// Human-readable reason.
    pub reason: String,
}

fn is_trivial_value(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::IntLit(_)
            | Expr::FloatLit(_)
            | Expr::BoolLit(_)
            | Expr::NullLit
            | Expr::StringLit(_)
    ) || matches!(
        expr,
        Expr::New { args, .. } if args.is_empty()
    )
}

fn is_counter_bump(expr: &Expr) -> bool {
    let target = match expr {
        Expr::IncDec { target, .. } => target,
        Expr::Assign {
            target,
            op: AssignOp::Add | AssignOp::Sub,
            ..
        } => target,
        _ => return false,
    };
    let name = match target.as_ref() {
        Expr::Ident(name) => name,
        Expr::Member { name, .. } => name,
        _ => return false,
    };
    let lower = name.to_lowercase();
    lower.contains("count") || lower.contains("counter") || lower.contains("calls")
}

/// Detect a stub body.
pub fn detect_stub(method: &Method) -> Option<StubFinding> {
    match method.body.statements.as_slice() {
        // Single trivial return (covers expression-bodied literals).
        [Stmt::Return {
            value: Some(value), ..
        }] if is_trivial_value(value) => Some(StubFinding {
            reason: "returns a constant value".to_owned(),
        }),
        // Counter bump then trivial return.
        [Stmt::Expr { expr, .. }, Stmt::Return { value, .. }]
            if is_counter_bump(expr)
                && value.as_ref().is_none_or(is_trivial_value) =>
        {
            Some(StubFinding {
                reason: "only increments a counter field".to_owned(),
            })
        }
        // Lone counter bump.
        [Stmt::Expr { expr, .. }] if is_counter_bump(expr) => Some(StubFinding {
            reason: "only increments a counter field".to_owned(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    fn detect(source: &str) -> Option<StubFinding> {
        let file = parse_source(source);
        detect_stub(&file.methods[0])
    }

    #[test]
    fn constant_return_is_a_stub() {
        assert!(detect("int f() { return 42; }").is_some());
        assert!(detect("string g() { return null; }").is_some());
    }

    #[test]
    fn expression_bodied_literal_is_a_stub() {
        assert!(detect("int f() => 0;").is_some());
    }

    #[test]
    fn counter_increment_is_a_stub() {
        assert!(detect("void f() { callCount++; }").is_some());
        assert!(detect("int f() { counter += 1; return 0; }").is_some());
    }

    #[test]
    fn real_bodies_are_not_stubs() {
        assert!(detect("int f(int n) { return n * 2; }").is_none());
        assert!(
            detect("int f(int[] a) { foreach (var x in a) { use(x); } return 0; }").is_none()
        );
    }
}
