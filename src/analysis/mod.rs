//! Structural analysis: pattern extraction, loop bounds, recursion and
//! amortized idiom detection, call-graph ordering, and composition.

pub mod amortized;
pub mod callgraph;
pub mod compose;
pub mod context;
pub mod effects;
pub mod extract;
pub mod loops;
pub mod recursion;

pub use callgraph::{AnalysisUnit, CallGraph};
pub use context::AnalysisContext;
pub use extract::{MethodAnalysis, PatternExtractor};
pub use loops::{LoopBound, LoopPattern};
