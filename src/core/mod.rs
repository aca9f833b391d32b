//! Core types: the complexity algebra, variables, confidence, errors,
//! rendering and the visitor.

pub mod confidence;
mod display;
pub mod error;
pub mod expr;
pub mod variable;
pub mod visitor;

pub use confidence::Confidence;
pub use error::{AnalysisError, Diagnostic, Severity, Span};
pub use expr::{
    AllocationSite, AmortizedMethod, Assignment, BinaryOp, Complexity, ComplexityKind,
    MemoryProfile,
};
pub use variable::{VarKind, Variable};
