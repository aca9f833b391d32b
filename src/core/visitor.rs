//! Expression visitor for complexity-tree traversal.
//!
//! The visitor is the one polymorphic boundary of the algebra: every
//! variant of the closed set is covered by a dedicated method, and
//! `walk_complexity` matches the enum exhaustively, so adding a variant
//! forces every visitor to be revisited at compile time.

use std::sync::Arc;

use crate::core::expr::{BinaryOp, Complexity, ComplexityKind, MemoryProfile};
use crate::core::variable::Variable;
use crate::recurrence::RecurrenceRelation;

/// Trait for visiting complexity expression nodes.
///
/// Each method returns `true` to continue into children, `false` to skip
/// them. Leaf methods' return values are ignored but kept uniform so
/// implementations can share helpers.
pub trait ComplexityVisitor {
    /// Visit a constant.
    fn visit_constant(&mut self, value: f64) -> bool;

    /// Visit a size variable (also called for the variable inside linear,
    /// polynomial, logarithmic, polylog, exponential, factorial and
    /// inverse-Ackermann nodes).
    fn visit_variable(&mut self, var: &Variable) -> bool;

    /// Visit a linear term.
    fn visit_linear(&mut self, coeff: f64, var: &Variable) -> bool {
        let _ = coeff;
        self.visit_variable(var)
    }

    /// Visit a polynomial.
    fn visit_polynomial(&mut self, var: &Variable, terms: &[(u32, f64)]) -> bool {
        let _ = terms;
        self.visit_variable(var)
    }

    /// Visit a logarithm of a variable.
    fn visit_logarithmic(&mut self, coeff: f64, base: f64, var: &Variable) -> bool {
        let _ = (coeff, base);
        self.visit_variable(var)
    }

    /// Visit a logarithm of a sub-expression; return true to walk it.
    fn visit_log_of(&mut self, base: f64, inner: &Complexity) -> bool;

    /// Visit a polylog term.
    fn visit_polylog(&mut self, var: &Variable, degree: f64, log_exponent: f64) -> bool {
        let _ = (degree, log_exponent);
        self.visit_variable(var)
    }

    /// Visit an exponential term.
    fn visit_exponential(&mut self, base: f64, var: &Variable) -> bool {
        let _ = base;
        self.visit_variable(var)
    }

    /// Visit a factorial term.
    fn visit_factorial(&mut self, var: &Variable) -> bool {
        self.visit_variable(var)
    }

    /// Visit a power node; return true to walk the base.
    fn visit_power(&mut self, base: &Complexity, exponent: f64) -> bool;

    /// Visit an inverse-Ackermann term.
    fn visit_inverse_ackermann(&mut self, var: &Variable) -> bool {
        self.visit_variable(var)
    }

    /// Visit a binary operator node; return true to walk both operands.
    fn visit_binary(&mut self, op: BinaryOp, left: &Complexity, right: &Complexity) -> bool;

    /// Visit a symbolic integral; return true to walk integrand/limits/bound.
    fn visit_integral(&mut self, integrand: &Complexity, bound_var: &Variable) -> bool;

    /// Visit an unsolved recurrence; return true to walk work and base case.
    fn visit_recurrence(&mut self, relation: &RecurrenceRelation) -> bool;

    /// Visit an amortized bound; return true to walk both costs.
    fn visit_amortized(&mut self, amortized: &Complexity, worst: &Complexity) -> bool;

    /// Visit a memory profile; return true to walk its expressions.
    fn visit_memory(&mut self, profile: &MemoryProfile) -> bool;
}

/// Walk an expression tree with a visitor, pre-order.
pub fn walk_complexity<V: ComplexityVisitor>(expr: &Complexity, visitor: &mut V) {
    match expr.kind() {
        ComplexityKind::Constant(c) => {
            visitor.visit_constant(*c);
        }
        ComplexityKind::Variable(v) => {
            visitor.visit_variable(v);
        }
        ComplexityKind::Linear { coeff, var } => {
            visitor.visit_linear(*coeff, var);
        }
        ComplexityKind::Polynomial { var, terms } => {
            visitor.visit_polynomial(var, terms);
        }
        ComplexityKind::Logarithmic { coeff, base, var } => {
            visitor.visit_logarithmic(*coeff, *base, var);
        }
        ComplexityKind::LogOf { base, inner } => {
            if visitor.visit_log_of(*base, inner) {
                walk_complexity(inner, visitor);
            }
        }
        ComplexityKind::PolyLog {
            var,
            degree,
            log_exponent,
        } => {
            visitor.visit_polylog(var, *degree, *log_exponent);
        }
        ComplexityKind::Exponential { base, var } => {
            visitor.visit_exponential(*base, var);
        }
        ComplexityKind::Factorial(var) => {
            visitor.visit_factorial(var);
        }
        ComplexityKind::Power { base, exponent } => {
            if visitor.visit_power(base, *exponent) {
                walk_complexity(base, visitor);
            }
        }
        ComplexityKind::InverseAckermann(var) => {
            visitor.visit_inverse_ackermann(var);
        }
        ComplexityKind::Binary { op, left, right } => {
            if visitor.visit_binary(*op, left, right) {
                walk_complexity(left, visitor);
                walk_complexity(right, visitor);
            }
        }
        ComplexityKind::Integral {
            integrand,
            bound_var,
            lower,
            upper,
            bound,
        } => {
            if visitor.visit_integral(integrand, bound_var) {
                walk_complexity(integrand, visitor);
                walk_complexity(lower, visitor);
                walk_complexity(upper, visitor);
                walk_complexity(bound, visitor);
            }
        }
        ComplexityKind::Recurrence(rec) => {
            if visitor.visit_recurrence(rec) {
                walk_complexity(rec.work(), visitor);
                walk_complexity(rec.base_case(), visitor);
            }
        }
        ComplexityKind::Amortized {
            amortized, worst, ..
        } => {
            if visitor.visit_amortized(amortized, worst) {
                walk_complexity(amortized, visitor);
                walk_complexity(worst, visitor);
            }
        }
        ComplexityKind::Memory(profile) => {
            if visitor.visit_memory(profile) {
                walk_complexity(&profile.total, visitor);
                walk_complexity(&profile.stack, visitor);
                walk_complexity(&profile.heap, visitor);
                walk_complexity(&profile.auxiliary, visitor);
                for site in &profile.allocations {
                    walk_complexity(&site.size, visitor);
                }
            }
        }
    }
}

/// A visitor that counts visited nodes.
#[derive(Default)]
pub struct NodeCounter {
    /// Number of nodes visited so far.
    pub count: usize,
}

impl ComplexityVisitor for NodeCounter {
    fn visit_constant(&mut self, _value: f64) -> bool {
        self.count += 1;
        true
    }

    fn visit_variable(&mut self, _var: &Variable) -> bool {
        self.count += 1;
        true
    }

    fn visit_log_of(&mut self, _base: f64, _inner: &Complexity) -> bool {
        self.count += 1;
        true
    }

    fn visit_power(&mut self, _base: &Complexity, _exponent: f64) -> bool {
        self.count += 1;
        true
    }

    fn visit_binary(&mut self, _op: BinaryOp, _l: &Complexity, _r: &Complexity) -> bool {
        self.count += 1;
        true
    }

    fn visit_integral(&mut self, _integrand: &Complexity, _bound_var: &Variable) -> bool {
        self.count += 1;
        true
    }

    fn visit_recurrence(&mut self, _relation: &RecurrenceRelation) -> bool {
        self.count += 1;
        true
    }

    fn visit_amortized(&mut self, _amortized: &Complexity, _worst: &Complexity) -> bool {
        self.count += 1;
        true
    }

    fn visit_memory(&mut self, _profile: &MemoryProfile) -> bool {
        self.count += 1;
        true
    }
}

/// A visitor that collects every size variable in an expression.
#[derive(Default)]
pub struct VariableCollector {
    /// The variables seen so far.
    pub variables: rustc_hash::FxHashSet<Variable>,
}

impl ComplexityVisitor for VariableCollector {
    fn visit_constant(&mut self, _value: f64) -> bool {
        true
    }

    fn visit_variable(&mut self, var: &Variable) -> bool {
        self.variables.insert(var.clone());
        true
    }

    fn visit_log_of(&mut self, _base: f64, _inner: &Complexity) -> bool {
        true
    }

    fn visit_power(&mut self, _base: &Complexity, _exponent: f64) -> bool {
        true
    }

    fn visit_binary(&mut self, _op: BinaryOp, _l: &Complexity, _r: &Complexity) -> bool {
        true
    }

    fn visit_integral(&mut self, _integrand: &Complexity, _bound_var: &Variable) -> bool {
        true
    }

    fn visit_recurrence(&mut self, relation: &RecurrenceRelation) -> bool {
        self.variables.insert(relation.variable().clone());
        true
    }

    fn visit_amortized(&mut self, _amortized: &Complexity, _worst: &Complexity) -> bool {
        true
    }

    fn visit_memory(&mut self, _profile: &MemoryProfile) -> bool {
        true
    }
}

/// Convenience alias used by walkers that need shared subtrees.
pub type SharedComplexity = Arc<Complexity>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_counter_counts_tree_nodes() {
        let n = Variable::n();
        // max(n, log n) -> binary + variable + logarithmic = 3 nodes
        let e = Complexity::max_of(
            Complexity::variable(n.clone()),
            Complexity::logarithmic(1.0, 2.0, n),
        );
        let mut counter = NodeCounter::default();
        walk_complexity(&e, &mut counter);
        assert_eq!(counter.count, 3);
    }

    #[test]
    fn variable_collector_sees_through_nesting() {
        let e = Complexity::multiply(
            Complexity::variable(Variable::n()),
            Complexity::plus(
                Complexity::variable(Variable::named("m")),
                Complexity::exponential(2.0, Variable::named("k")),
            ),
        );
        let mut collector = VariableCollector::default();
        walk_complexity(&e, &mut collector);
        assert_eq!(collector.variables.len(), 3);
    }
}
