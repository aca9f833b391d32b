//! Analysis configuration.

/// Options recognized by the analysis pipeline, with a chainable
/// builder API.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Soft per-document budget in milliseconds.
    pub analysis_timeout_ms: u64,
    /// Hard per-method budget in milliseconds.
    pub per_method_timeout_ms: u64,
    /// Results below this confidence are tagged `requires_review`.
    pub min_confidence_to_emit: f64,
    /// Depth limit for the inter-procedural walk.
    pub max_call_depth: usize,
    /// Emit space complexity alongside time.
    pub show_space_complexity: bool,
    /// Include the confidence figure in tooltips.
    pub show_confidence: bool,
    /// Consult the symbolic-math subprocess for hard integrals.
    pub use_symbolic_math_oracle: bool,
    /// Command line for the oracle subprocess.
    pub oracle_command: Option<Vec<String>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            analysis_timeout_ms: 500,
            per_method_timeout_ms: 100,
            min_confidence_to_emit: 0.3,
            max_call_depth: 10,
            show_space_complexity: false,
            show_confidence: true,
            use_symbolic_math_oracle: false,
            oracle_command: None,
        }
    }
}

impl AnalysisOptions {
    /// Defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft per-document budget.
    #[must_use]
    pub fn analysis_timeout_ms(mut self, ms: u64) -> Self {
        self.analysis_timeout_ms = ms;
        self
    }

    /// Hard per-method budget.
    #[must_use]
    pub fn per_method_timeout_ms(mut self, ms: u64) -> Self {
        self.per_method_timeout_ms = ms;
        self
    }

    /// Review threshold.
    #[must_use]
    pub fn min_confidence_to_emit(mut self, threshold: f64) -> Self {
        self.min_confidence_to_emit = threshold.clamp(0.0, 1.0);
        self
    }

    /// Inter-procedural depth limit.
    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Emit space complexity.
    #[must_use]
    pub fn show_space_complexity(mut self, show: bool) -> Self {
        self.show_space_complexity = show;
        self
    }

    /// Include confidence in tooltips.
    #[must_use]
    pub fn show_confidence(mut self, show: bool) -> Self {
        self.show_confidence = show;
        self
    }

    /// Enable the symbolic-math oracle with the given command line.
    #[must_use]
    pub fn symbolic_math_oracle(mut self, command: Vec<String>) -> Self {
        self.use_symbolic_math_oracle = true;
        self.oracle_command = Some(command);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = AnalysisOptions::default();
        assert_eq!(options.analysis_timeout_ms, 500);
        assert_eq!(options.per_method_timeout_ms, 100);
        assert!((options.min_confidence_to_emit - 0.3).abs() < 1e-12);
        assert_eq!(options.max_call_depth, 10);
        assert!(!options.use_symbolic_math_oracle);
    }

    #[test]
    fn builder_chains() {
        let options = AnalysisOptions::new()
            .analysis_timeout_ms(1000)
            .min_confidence_to_emit(0.5)
            .show_space_complexity(true);
        assert_eq!(options.analysis_timeout_ms, 1000);
        assert!(options.show_space_complexity);
    }
}
