//! The simplification engine.
//!
//! Applies the rule registry bottom-up to a fixpoint, with cycle
//! detection on structural hashes and an iteration cap. Simplification
//! is idempotent: a second run over its own output changes nothing.

use rustc_hash::FxHashSet;
use tracing::trace;

use super::rules::{Rule, RuleContext, RuleRegistry};
use crate::core::expr::{Complexity, ComplexityKind, MemoryProfile};
use crate::recurrence::RecurrenceRelation;

/// Rule-based simplifier for complexity expressions.
pub struct Simplifier {
    registry: RuleRegistry,
    max_iterations: usize,
    max_depth: usize,
    context: RuleContext,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    /// A simplifier with the full rule set loaded.
    pub fn new() -> Self {
        Simplifier {
            registry: RuleRegistry::default(),
            max_iterations: 100,
            max_depth: 50,
            context: RuleContext::default(),
        }
    }

    /// Cap the number of whole-tree passes.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Cap the recursion depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Restrict to value-exact rewrites (no dominant-term extraction).
    #[must_use]
    pub fn exact_only(mut self, exact: bool) -> Self {
        self.context.exact_only = exact;
        self
    }

    /// Main simplification entry point.
    pub fn simplify(&self, expr: Complexity) -> Complexity {
        let mut current = expr;
        let mut seen: FxHashSet<u64> = FxHashSet::default();

        for _ in 0..self.max_iterations {
            // Cycle detection on structural hashes.
            if !seen.insert(current.hash) {
                break;
            }
            let next = self.apply_bottom_up(&current, 0);
            if next == current {
                break;
            }
            current = next;
        }

        current
    }

    /// Apply rules bottom-up through the expression tree.
    fn apply_bottom_up(&self, expr: &Complexity, depth: usize) -> Complexity {
        if depth > self.max_depth {
            return expr.clone();
        }

        let rebuilt = match expr.kind() {
            ComplexityKind::Binary { op, left, right } => Complexity::binary(
                *op,
                self.apply_bottom_up(left, depth + 1),
                self.apply_bottom_up(right, depth + 1),
            ),
            ComplexityKind::LogOf { base, inner } => {
                Complexity::log_of(*base, self.apply_bottom_up(inner, depth + 1))
            }
            ComplexityKind::Power { base, exponent } => {
                Complexity::power(self.apply_bottom_up(base, depth + 1), *exponent)
            }
            ComplexityKind::Amortized {
                amortized,
                worst,
                method,
                potential,
            } => Complexity::amortized(
                self.apply_bottom_up(amortized, depth + 1),
                self.apply_bottom_up(worst, depth + 1),
                *method,
                potential.clone(),
            ),
            ComplexityKind::Recurrence(rec) => {
                let rebuilt = RecurrenceRelation::new(
                    rec.variable().clone(),
                    rec.terms().to_vec(),
                    self.apply_bottom_up(rec.work(), depth + 1),
                    self.apply_bottom_up(rec.base_case(), depth + 1),
                );
                match rebuilt {
                    Ok(r) => Complexity::recurrence(r),
                    Err(_) => expr.clone(),
                }
            }
            ComplexityKind::Memory(profile) => {
                let map = |c: &Complexity| std::sync::Arc::new(self.apply_bottom_up(c, depth + 1));
                Complexity::memory(MemoryProfile {
                    total: map(&profile.total),
                    stack: map(&profile.stack),
                    heap: map(&profile.heap),
                    auxiliary: map(&profile.auxiliary),
                    in_place: profile.in_place,
                    tail_recursive: profile.tail_recursive,
                    allocations: profile.allocations.clone(),
                })
            }
            _ => expr.clone(),
        };

        self.apply_rules_at_node(rebuilt, depth)
    }

    /// Apply the first matching rule repeatedly at one node.
    fn apply_rules_at_node(&self, expr: Complexity, depth: usize) -> Complexity {
        let mut current = expr;
        let context = RuleContext {
            depth,
            ..self.context.clone()
        };

        // A node can enable further rules after one fires (coalescing a
        // product can expose a dominance step); cap local passes to keep
        // pathological inputs bounded.
        for _ in 0..8 {
            let mut changed = false;
            for rule in &self.registry.rules {
                if let Some(next) = rule.apply(&current, &context) {
                    if next != current {
                        trace!(rule = rule.name(), "rule fired");
                        current = next;
                        changed = true;
                        break;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        current
    }
}
