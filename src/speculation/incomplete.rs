//! Incomplete-code detection.
//!
//! Definite markers: a body dominated by a "not implemented" throw.
//! Likely markers: "not supported" throws, empty bodies, a single bare
//! return, and TODO/FIXME/HACK/XXX/UNDONE comments in the method's span.

use crate::lang::{Comment, Expr, Method, Stmt};

/// How sure the detector is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteKind {
    /// Unreachable body behind a not-implemented throw.
    Definite,
    /// Suspicious shape; the method may still be real.
    Likely,
}

/// A detected incomplete region.
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteFinding {
    /// Definite or likely.
    pub kind: IncompleteKind,
    /// Human-readable reason.
    pub reason: String,
}

/// Throws whose type name marks the body as unwritten.
fn thrown_type(stmt: &Stmt) -> Option<&str> {
    let Stmt::Throw { value, .. } = stmt else {
        return None;
    };
    match value {
        Expr::New { type_name, .. } => Some(type_name),
        _ => None,
    }
}

/// Detect incomplete code in a method.
pub fn detect_incomplete(method: &Method, comments: &[&Comment]) -> Option<IncompleteFinding> {
    // Definite: the body is dominated by a not-implemented throw — it is
    // the first (or only) top-level statement.
    if let Some(first) = method.body.statements.first() {
        if let Some(type_name) = thrown_type(first) {
            if type_name.contains("NotImplemented") {
                return Some(IncompleteFinding {
                    kind: IncompleteKind::Definite,
                    reason: "body throws NotImplementedException".to_owned(),
                });
            }
            if type_name.contains("NotSupported") {
                return Some(IncompleteFinding {
                    kind: IncompleteKind::Likely,
                    reason: "body throws NotSupportedException".to_owned(),
                });
            }
        }
    }

    if method.body.is_empty() {
        return Some(IncompleteFinding {
            kind: IncompleteKind::Likely,
            reason: "empty method body".to_owned(),
        });
    }

    if method.body.statements.len() == 1 {
        if let Stmt::Return { value: None, .. } = &method.body.statements[0] {
            return Some(IncompleteFinding {
                kind: IncompleteKind::Likely,
                reason: "single bare return".to_owned(),
            });
        }
    }

    let markers = comments
        .iter()
        .filter(|c| c.has_incomplete_marker())
        .count();
    if markers > 0 {
        return Some(IncompleteFinding {
            kind: IncompleteKind::Likely,
            reason: format!("{} unfinished-work marker(s) in body", markers),
        });
    }

    None
}
