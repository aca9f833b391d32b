//! Emitted results.

use serde::{Deserialize, Serialize};

/// Lifecycle tags on a method result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTag {
    /// Analysis ran to completion.
    Complete,
    /// Analysis was cancelled mid-document; this result is partial.
    Cancelled,
    /// The per-method budget expired; this is the speculative fallback.
    Timeout,
    /// The body is incomplete (stub/not-implemented).
    Incomplete,
}

/// One method's analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    /// Method name.
    pub method_name: String,
    /// Byte range of the declaration in the source.
    pub file_location: (usize, usize),
    /// Big-O rendering of the time bound.
    pub time_complexity: String,
    /// Big-O rendering of the space bound, when requested.
    pub space_complexity: Option<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// The bound is amortized over an operation sequence.
    pub is_amortized: bool,
    /// The bound is an expected-case figure.
    pub is_probabilistic: bool,
    /// Rendering of the asymptotically dominant term.
    pub dominant_term: Option<String>,
    /// Free-form hover text (worst case, dependencies, pattern names).
    pub tooltip: Option<String>,
    /// Confidence fell below the configured threshold.
    pub requires_review: bool,
    /// Why review is required.
    pub review_reason: Option<String>,
    /// Lifecycle tag.
    pub tag: ResultTag,
}

/// One diagnostic attached to a document result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDiagnostic {
    /// Human-readable message.
    pub message: String,
    /// Byte range in the source.
    pub location: (usize, usize),
}

/// An incomplete region of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteRegion {
    /// The method containing the region.
    pub method_name: String,
    /// Why it is considered incomplete.
    pub reason: String,
}

/// The whole document's analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Document name.
    pub document: String,
    /// Per-method results, in emission (topological) order.
    pub methods: Vec<MethodResult>,
    /// Maximum complexity over all methods.
    pub aggregate_complexity: String,
    /// Parse and analysis diagnostics.
    pub diagnostics: Vec<DocumentDiagnostic>,
    /// Incomplete regions found by the speculative layer.
    pub incomplete_regions: Vec<IncompleteRegion>,
}

impl DocumentResult {
    /// Find a method's result by name.
    pub fn method(&self, name: &str) -> Option<&MethodResult> {
        self.methods.iter().find(|m| m.method_name == name)
    }
}
