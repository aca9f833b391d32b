//! The speculative layer.
//!
//! When code is incomplete, stubbed, annotated, or polymorphic, the
//! structural pipeline cannot stand alone. The detectors here run in
//! order — incomplete-code, stub, contract reader — and the uncertainty
//! tracker marks methods whose calls have polymorphic targets. A parsed
//! contract beats every heuristic; a definite incomplete marker beats a
//! stub match.

pub mod contract;
pub mod incomplete;
pub mod stub;

pub use contract::{parse_big_o, read_contract, Contract, ContractSource};
pub use incomplete::{detect_incomplete, IncompleteFinding, IncompleteKind};
pub use stub::{detect_stub, StubFinding};

use crate::core::confidence::Confidence;
use crate::core::expr::Complexity;
use crate::lang::{Comment, Method};

/// The speculative verdict on a method, decided before (and sometimes
/// instead of) structural analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum Speculation {
    /// A declared contract: trust it at high confidence.
    Contract {
        /// The declared bound.
        complexity: Complexity,
        /// Annotation or doc comment.
        source: ContractSource,
    },
    /// Definitely incomplete: report and stop.
    Incomplete {
        /// Why.
        reason: String,
        /// Definite or likely.
        kind: IncompleteKind,
    },
    /// A stub: O(1) at low confidence.
    Stub {
        /// Why.
        reason: String,
    },
    /// An empty body: trivially O(1), and certainly so.
    Empty,
    /// Nothing speculative; run the structural pipeline.
    None,
}

impl Speculation {
    /// The confidence attached to this verdict.
    pub fn confidence(&self) -> Confidence {
        match self {
            Speculation::Contract { .. } => Confidence::CONTRACT,
            Speculation::Incomplete {
                kind: IncompleteKind::Definite,
                ..
            } => Confidence::INCOMPLETE,
            Speculation::Incomplete {
                kind: IncompleteKind::Likely,
                ..
            } => Confidence::STUB,
            Speculation::Stub { .. } => Confidence::STUB,
            Speculation::Empty => Confidence::CONTRACT,
            Speculation::None => Confidence::STRUCTURAL,
        }
    }
}

/// Run the speculative detectors on one method.
///
/// `comments` are the file's comments; only those inside the method's
/// span are considered. Likely-incomplete markers (TODOs) do not
/// short-circuit here — they degrade confidence via [`marker_penalty`]
/// while the structural result stands.
pub fn speculate(method: &Method, comments: &[Comment]) -> Speculation {
    let in_span: Vec<&Comment> = comments
        .iter()
        .filter(|c| {
            c.span.start() >= method.span.start() && c.span.end() <= method.span.end()
        })
        .collect();

    // A contract beats every heuristic.
    if let Some(contract) = read_contract(method) {
        return Speculation::Contract {
            complexity: contract.complexity,
            source: contract.source,
        };
    }

    // An empty body does nothing: the O(1) bound is certain even though
    // the method is clearly unfinished.
    if method.body.is_empty() {
        return Speculation::Empty;
    }

    if let Some(finding) = detect_incomplete(method, &in_span) {
        // TODO-style markers alone only penalize; a definite or shape
        // marker replaces the result.
        let only_markers = finding.reason.contains("marker");
        if !only_markers {
            return Speculation::Incomplete {
                reason: finding.reason,
                kind: finding.kind,
            };
        }
    }

    if let Some(finding) = detect_stub(method) {
        return Speculation::Stub {
            reason: finding.reason,
        };
    }

    Speculation::None
}

/// Confidence penalty for unfinished-work markers inside the method.
pub fn marker_penalty(method: &Method, comments: &[Comment]) -> usize {
    comments
        .iter()
        .filter(|c| {
            c.span.start() >= method.span.start()
                && c.span.end() <= method.span.end()
                && c.has_incomplete_marker()
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    fn speculate_first(source: &str) -> Speculation {
        let file = parse_source(source);
        speculate(&file.methods[0], &file.comments)
    }

    #[test]
    fn contract_beats_stub_shape() {
        // A constant return with an annotation: the annotation wins.
        let verdict = speculate_first(
            "[Complexity(\"O(n log n)\")]\nint f() { return 0; }",
        );
        match verdict {
            Speculation::Contract { complexity, .. } => {
                assert_eq!(complexity.big_o(), "O(n log n)");
            }
            other => panic!("expected contract, got {:?}", other),
        }
    }

    #[test]
    fn not_implemented_is_definite_incomplete() {
        let verdict =
            speculate_first("int f(int n) { throw new NotImplementedException(); }");
        assert!(matches!(
            verdict,
            Speculation::Incomplete {
                kind: IncompleteKind::Definite,
                ..
            }
        ));
        assert!(verdict.confidence().value() <= 0.2);
    }

    #[test]
    fn constant_return_is_a_stub_verdict() {
        let verdict = speculate_first("int f() { return 7; }");
        assert!(matches!(verdict, Speculation::Stub { .. }));
        assert!((verdict.confidence().value() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn todo_markers_penalize_without_replacing() {
        let file = parse_source(
            "int f(int n) {\n  // TODO: tighten\n  for (int i = 0; i < n; i++) { work(i); }\n  return 0;\n}",
        );
        let verdict = speculate(&file.methods[0], &file.comments);
        assert_eq!(verdict, Speculation::None);
        assert_eq!(marker_penalty(&file.methods[0], &file.comments), 1);
    }

    #[test]
    fn empty_body_is_certainly_constant() {
        let verdict = speculate_first("void f() { }");
        assert_eq!(verdict, Speculation::Empty);
        assert!(verdict.confidence().value() >= 0.9);
    }

    #[test]
    fn ordinary_code_passes_through() {
        let verdict = speculate_first("int f(int n) { return n * 2; }");
        assert_eq!(verdict, Speculation::None);
    }
}
