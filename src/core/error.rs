//! Error types for parsing and analysis
//!
//! This module provides:
//! - `AnalysisError` - The main error enum for parse/analysis failures
//! - `Span` - Source location tracking for precise diagnostics

use std::fmt;

/// Source location span for diagnostics.
/// Represents a range of characters in the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    end: usize,
}

impl Span {
    /// Create a new span. If end < start, they will be swapped.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        if end < start {
            Span {
                start: end,
                end: start,
            }
        } else {
            Span { start, end }
        }
    }

    /// Create a span for a single position
    #[inline]
    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Create an empty/unknown span
    #[inline]
    pub fn empty() -> Self {
        Span { start: 0, end: 0 }
    }

    /// Get the start position
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end position
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Merge two spans into the smallest span covering both.
    pub fn join(self, other: Span) -> Span {
        if !self.is_valid() {
            return other;
        }
        if !other.is_valid() {
            return self;
        }
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Check if this span has valid location info
    ///
    /// A span is valid if it covers at least one character (end > start).
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Format the span for display (1-indexed for users)
    pub fn display(&self) -> String {
        if !self.is_valid() {
            String::new()
        } else if self.end - self.start == 1 {
            format!(" at position {}", self.start + 1)
        } else {
            format!(" at positions {}-{}", self.start + 1, self.end)
        }
    }
}

/// Errors that can occur during parsing and analysis.
///
/// Component boundaries never raise these for recoverable conditions; the
/// recovery parser collects `Diagnostic`s and the solvers return typed
/// `NotApplicable` records instead. `AnalysisError` covers the genuinely
/// fatal paths: malformed contract strings, oracle transport failures and
/// violated internal limits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnalysisError {
    /// The input text was empty or contained only whitespace.
    EmptySource,
    /// A contract string (e.g. `O(n log n)`) has invalid syntax.
    InvalidContract {
        /// Description of the syntax error.
        msg: String,
        /// Location of the error in the contract string.
        span: Option<Span>,
    },
    /// A numeric literal could not be parsed.
    InvalidNumber {
        /// The invalid number string.
        value: String,
        /// Location of the error in the source.
        span: Option<Span>,
    },
    /// An unrecognized token was encountered.
    InvalidToken {
        /// The invalid token.
        token: String,
        /// Location of the error in the source.
        span: Option<Span>,
    },
    /// The input ended unexpectedly while parsing.
    UnexpectedEndOfInput,
    /// A recurrence factory was called with parameters violating its
    /// preconditions (e.g. a division factor b <= 1).
    InvalidRecurrence {
        /// Description of the violated precondition.
        msg: String,
    },
    /// The symbolic-math subprocess could not be spawned or spoken to.
    OracleTransport {
        /// Description of the transport failure.
        msg: String,
    },
    /// The symbolic-math subprocess exceeded its hard timeout.
    OracleTimeout,
    /// The expression exceeded the maximum allowed tree depth.
    MaxDepthExceeded,
    /// The expression exceeded the maximum allowed node count.
    MaxNodesExceeded,
}

impl AnalysisError {
    /// Create InvalidContract without span
    pub fn invalid_contract(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidContract {
            msg: msg.into(),
            span: None,
        }
    }

    /// Create InvalidContract with span
    pub fn invalid_contract_at(msg: impl Into<String>, span: Span) -> Self {
        AnalysisError::InvalidContract {
            msg: msg.into(),
            span: Some(span),
        }
    }

    /// Create InvalidNumber without span
    pub fn invalid_number(value: impl Into<String>) -> Self {
        AnalysisError::InvalidNumber {
            value: value.into(),
            span: None,
        }
    }

    /// Create InvalidToken without span
    pub fn invalid_token(token: impl Into<String>) -> Self {
        AnalysisError::InvalidToken {
            token: token.into(),
            span: None,
        }
    }

    /// Create InvalidRecurrence
    pub fn invalid_recurrence(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidRecurrence { msg: msg.into() }
    }

    /// Create OracleTransport
    pub fn oracle_transport(msg: impl Into<String>) -> Self {
        AnalysisError::OracleTransport { msg: msg.into() }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptySource => write!(f, "Source text cannot be empty"),
            AnalysisError::InvalidContract { msg, span } => {
                write!(
                    f,
                    "Invalid complexity contract: {}{}",
                    msg,
                    span.map_or(String::new(), |s| s.display())
                )
            }
            AnalysisError::InvalidNumber { value, span } => {
                write!(
                    f,
                    "Invalid number format: '{}'{}",
                    value,
                    span.map_or(String::new(), |s| s.display())
                )
            }
            AnalysisError::InvalidToken { token, span } => {
                write!(
                    f,
                    "Invalid token: '{}'{}",
                    token,
                    span.map_or(String::new(), |s| s.display())
                )
            }
            AnalysisError::UnexpectedEndOfInput => write!(f, "Unexpected end of input"),
            AnalysisError::InvalidRecurrence { msg } => {
                write!(f, "Invalid recurrence relation: {}", msg)
            }
            AnalysisError::OracleTransport { msg } => {
                write!(f, "Symbolic oracle transport failure: {}", msg)
            }
            AnalysisError::OracleTimeout => {
                write!(f, "Symbolic oracle exceeded its hard timeout")
            }
            AnalysisError::MaxDepthExceeded => {
                write!(f, "Expression nesting depth exceeds maximum limit")
            }
            AnalysisError::MaxNodesExceeded => {
                write!(f, "Expression size exceeds maximum node count limit")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// A non-fatal diagnostic attached to a document result.
///
/// The recovery parser continues past malformed regions; each one is
/// reported as a diagnostic rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Location of the problem in the source.
    pub span: Span,
    /// Severity level.
    pub severity: Severity,
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Parsing recovered; analysis proceeds on a synthetic node.
    Error,
    /// Analysis proceeds but confidence may be reduced.
    Warning,
}

impl Diagnostic {
    /// Create an error-severity diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            severity: Severity::Error,
        }
    }

    /// Create a warning-severity diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            severity: Severity::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_swaps_reversed_bounds() {
        let s = Span::new(7, 3);
        assert_eq!(s.start(), 3);
        assert_eq!(s.end(), 7);
    }

    #[test]
    fn span_display_is_one_indexed() {
        assert_eq!(Span::at(0).display(), " at position 1");
        assert_eq!(Span::new(2, 5).display(), " at positions 3-5");
        assert_eq!(Span::empty().display(), "");
    }

    #[test]
    fn join_covers_both_spans() {
        let joined = Span::new(2, 4).join(Span::new(8, 9));
        assert_eq!(joined, Span::new(2, 9));
        assert_eq!(Span::empty().join(Span::at(3)), Span::at(3));
    }

    #[test]
    fn error_messages_mention_location() {
        let err = AnalysisError::invalid_contract_at("expected ')'", Span::at(4));
        assert!(err.to_string().contains("position 5"));
    }
}
