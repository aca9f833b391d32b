//! Per-method analysis context.
//!
//! A scoped, immutable record extended by `with`-style derivation:
//! children inherit the parent's symbol map and canonical-variable
//! counter, and structural sharing keeps derivation cheap. One context
//! lives for one method traversal.

use rustc_hash::FxHashMap;

use crate::core::variable::{VarKind, Variable};
use crate::lang::Method;

/// Scoped analysis state for one method traversal.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    method_name: String,
    variables: FxHashMap<String, Variable>,
    /// Canonical variables in assignment order (`n` first).
    assigned: Vec<Variable>,
    counter: usize,
    call_depth: usize,
    max_call_depth: usize,
}

impl AnalysisContext {
    /// Seed a context for a method: every size-bearing parameter gets a
    /// canonical variable (`n, m, k, …`) in declaration order.
    pub fn for_method(method: &Method, max_call_depth: usize) -> Self {
        let mut ctx = AnalysisContext {
            method_name: method.name.clone(),
            variables: FxHashMap::default(),
            assigned: Vec::new(),
            counter: 0,
            call_depth: 0,
            max_call_depth,
        };
        for param in &method.params {
            let kind = if param.is_collection() {
                Some(VarKind::DataCount)
            } else if param.is_string() {
                Some(VarKind::StringLength)
            } else if matches!(param.type_name.as_str(), "int" | "long" | "uint" | "ulong") {
                Some(VarKind::InputSize)
            } else {
                None
            };
            if let Some(kind) = kind {
                let var = Variable::canonical(ctx.counter, kind);
                ctx.counter += 1;
                ctx.assigned.push(var.clone());
                ctx.variables.insert(param.name.clone(), var);
            }
        }
        ctx
    }

    /// The method this context belongs to.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// The canonical variable a source symbol maps to, if any.
    pub fn variable_for(&self, symbol: &str) -> Option<&Variable> {
        self.variables.get(symbol)
    }

    /// The method's primary size variable: the first canonical one
    /// assigned, or `n` when the method takes no size-bearing parameters.
    pub fn primary_variable(&self) -> Variable {
        self.assigned.first().cloned().unwrap_or_else(Variable::n)
    }

    /// Derive a child context with one more symbol mapped to a fresh
    /// canonical variable.
    #[must_use]
    pub fn with_symbol(&self, symbol: impl Into<String>, kind: VarKind) -> (Self, Variable) {
        let mut child = self.clone();
        let var = Variable::canonical(child.counter, kind);
        child.counter += 1;
        child.assigned.push(var.clone());
        child.variables.insert(symbol.into(), var.clone());
        (child, var)
    }

    /// Derive a child context mapping a symbol to an existing variable
    /// (foreach element aliasing its collection's size, for instance).
    #[must_use]
    pub fn with_alias(&self, symbol: impl Into<String>, var: Variable) -> Self {
        let mut child = self.clone();
        child.variables.insert(symbol.into(), var);
        child
    }

    /// Derive a child context one call deeper.
    #[must_use]
    pub fn with_deeper_call(&self) -> Self {
        let mut child = self.clone();
        child.call_depth += 1;
        child
    }

    /// Whether the inter-procedural walk may descend further.
    pub fn may_descend(&self) -> bool {
        self.call_depth < self.max_call_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parse_source;

    #[test]
    fn parameters_get_canonical_variables_in_order() {
        let file = parse_source("void f(int[] data, int limit, bool flag) { }");
        let ctx = AnalysisContext::for_method(&file.methods[0], 10);
        assert_eq!(ctx.variable_for("data").unwrap().name(), "n");
        assert_eq!(ctx.variable_for("limit").unwrap().name(), "m");
        assert!(ctx.variable_for("flag").is_none());
        assert_eq!(ctx.primary_variable().name(), "n");
    }

    #[test]
    fn derivation_does_not_mutate_the_parent() {
        let file = parse_source("void f(int n) { }");
        let ctx = AnalysisContext::for_method(&file.methods[0], 10);
        let (child, var) = ctx.with_symbol("extra", VarKind::Generic);
        assert!(ctx.variable_for("extra").is_none());
        assert_eq!(child.variable_for("extra"), Some(&var));
        assert_eq!(var.name(), "m");
    }

    #[test]
    fn call_depth_limits_descent() {
        let file = parse_source("void f() { }");
        let mut ctx = AnalysisContext::for_method(&file.methods[0], 2);
        assert!(ctx.may_descend());
        ctx = ctx.with_deeper_call().with_deeper_call();
        assert!(!ctx.may_descend());
    }
}
