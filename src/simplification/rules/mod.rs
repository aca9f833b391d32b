//! Simplification rules.
//!
//! Each rule is a small rewrite with a name, a priority and a category;
//! the registry loads every group and orders them so that exact algebraic
//! rewrites run before asymptotic (dominance) ones at each node.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::classify::compare_asymptotic;
use crate::core::expr::Complexity;

/// Core trait for all simplification rules.
pub trait Rule {
    /// Stable rule name, used for tracing.
    fn name(&self) -> &'static str;
    /// Higher priority runs first within a category.
    fn priority(&self) -> i32;
    /// The rule's category.
    fn category(&self) -> RuleCategory;
    /// Attempt the rewrite; `None` when the rule does not apply.
    fn apply(&self, expr: &Complexity, context: &RuleContext) -> Option<Complexity>;
}

/// Categories of simplification rules.
///
/// `Algebraic` rewrites are value-exact; `Dominance` rewrites preserve
/// only the asymptotic class (dominant-summand extraction, polynomial
/// truncation).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RuleCategory {
    /// Exact rewrites: coefficient merging, polylog coalescing.
    Algebraic,
    /// Asymptotic rewrites: dominant-term extraction.
    Dominance,
}

/// Context passed to rules during application.
#[derive(Clone, Debug, Default)]
pub struct RuleContext {
    /// Current tree depth.
    pub depth: usize,
    /// When set, dominance rules keep sums intact (exact mode).
    pub exact_only: bool,
}

mod algebraic;
mod dominance;

/// Rule registry: loads every rule group, ordered for application.
pub struct RuleRegistry {
    pub(crate) rules: Vec<Rc<dyn Rule>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        RuleRegistry { rules: Vec::new() }
    }

    /// Load all built-in rule groups.
    pub fn load_all_rules(&mut self) {
        self.rules.extend(algebraic::rules());
        self.rules.extend(dominance::rules());

        // Algebraic before dominance, then priority descending.
        self.rules.sort_by_key(|r| {
            (
                match r.category() {
                    RuleCategory::Algebraic => 0,
                    RuleCategory::Dominance => 1,
                },
                -r.priority(),
            )
        });
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut registry = RuleRegistry::new();
        registry.load_all_rules();
        registry
    }
}

/// The single variable both expressions range over, if there is exactly
/// one. Dominance comparisons are only meaningful in that case.
pub(crate) fn comparison_variable(
    a: &Complexity,
    b: &Complexity,
) -> Option<crate::core::variable::Variable> {
    let mut vars = a.free_variables();
    vars.extend(b.free_variables());
    if vars.len() == 1 {
        vars.into_iter().next()
    } else {
        None
    }
}

/// Compare two sub-expressions asymptotically, when a shared single
/// variable makes the comparison meaningful.
pub(crate) fn compare_dominance(a: &Complexity, b: &Complexity) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
        return x.partial_cmp(&y);
    }
    let var = comparison_variable(a, b)?;
    compare_asymptotic(a, b, &var)
}
