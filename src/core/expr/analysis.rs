//! Expression analysis methods.
//!
//! Free-variable sets, substitution, and structural metrics
//! (`node_count`, `depth`).

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::{AllocationSite, Complexity, ComplexityKind, MemoryProfile};
use crate::core::variable::Variable;
use crate::recurrence::RecurrenceRelation;

impl Complexity {
    /// The set of free size variables in this expression.
    ///
    /// A recurrence contributes its own variable plus the free variables
    /// of its work and base-case expressions.
    pub fn free_variables(&self) -> FxHashSet<Variable> {
        let mut out = FxHashSet::default();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut FxHashSet<Variable>) {
        match &self.kind {
            ComplexityKind::Constant(_) => {}
            ComplexityKind::Variable(v)
            | ComplexityKind::Linear { var: v, .. }
            | ComplexityKind::Polynomial { var: v, .. }
            | ComplexityKind::Logarithmic { var: v, .. }
            | ComplexityKind::PolyLog { var: v, .. }
            | ComplexityKind::Exponential { var: v, .. }
            | ComplexityKind::Factorial(v)
            | ComplexityKind::InverseAckermann(v) => {
                out.insert(v.clone());
            }
            ComplexityKind::LogOf { inner, .. } => inner.collect_variables(out),
            ComplexityKind::Power { base, .. } => base.collect_variables(out),
            ComplexityKind::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            ComplexityKind::Integral {
                integrand,
                bound_var,
                lower,
                upper,
                bound,
            } => {
                integrand.collect_variables(out);
                lower.collect_variables(out);
                upper.collect_variables(out);
                bound.collect_variables(out);
                // The integration variable is bound, not free.
                out.remove(bound_var);
            }
            ComplexityKind::Recurrence(rec) => {
                out.insert(rec.variable().clone());
                rec.work().collect_variables(out);
                rec.base_case().collect_variables(out);
            }
            ComplexityKind::Amortized {
                amortized, worst, ..
            } => {
                amortized.collect_variables(out);
                worst.collect_variables(out);
            }
            ComplexityKind::Memory(profile) => {
                profile.total.collect_variables(out);
                profile.stack.collect_variables(out);
                profile.heap.collect_variables(out);
                profile.auxiliary.collect_variables(out);
                for site in &profile.allocations {
                    site.size.collect_variables(out);
                }
            }
        }
    }

    /// True iff `var` occurs free in this expression.
    pub fn contains_variable(&self, var: &Variable) -> bool {
        self.free_variables().contains(var)
    }

    /// Replace all free occurrences of `var` with `replacement`.
    ///
    /// Identity when `var` is not free. Variable-shaped replacements
    /// rename in place; structured variants that cannot host an arbitrary
    /// sub-expression (exponential, factorial, inverse Ackermann) rename
    /// to the replacement's dominant variable as a conservative
    /// approximation when handed a compound replacement.
    #[must_use]
    pub fn substitute(&self, var: &Variable, replacement: &Complexity) -> Complexity {
        match &self.kind {
            ComplexityKind::Constant(_) => self.clone(),
            ComplexityKind::Variable(v) => {
                if v == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            ComplexityKind::Linear { coeff, var: v } => {
                if v != var {
                    return self.clone();
                }
                match replacement.as_variable() {
                    Some(w) => Complexity::linear(*coeff, w.clone()),
                    None => {
                        Complexity::multiply(Complexity::constant(*coeff), replacement.clone())
                    }
                }
            }
            ComplexityKind::Polynomial { var: v, terms } => {
                if v != var {
                    return self.clone();
                }
                if let Some(w) = replacement.as_variable() {
                    return Complexity::polynomial(w.clone(), terms.clone());
                }
                // Rebuild as a sum of coeff · r^deg
                let mut acc = Complexity::constant(0.0);
                for &(deg, coeff) in terms {
                    let term = Complexity::multiply(
                        Complexity::constant(coeff),
                        Complexity::power(replacement.clone(), f64::from(deg)),
                    );
                    acc = Complexity::plus(acc, term);
                }
                acc
            }
            ComplexityKind::Logarithmic { coeff, base, var: v } => {
                if v == var {
                    Complexity::multiply(
                        Complexity::constant(*coeff),
                        Complexity::log_of(*base, replacement.clone()),
                    )
                } else {
                    self.clone()
                }
            }
            ComplexityKind::LogOf { base, inner } => {
                Complexity::log_of(*base, inner.substitute(var, replacement))
            }
            ComplexityKind::PolyLog {
                var: v,
                degree,
                log_exponent,
            } => {
                if v != var {
                    return self.clone();
                }
                if let Some(w) = replacement.as_variable() {
                    return Complexity::polylog(w.clone(), *degree, *log_exponent);
                }
                let poly_part = Complexity::power(replacement.clone(), *degree);
                let log_part = Complexity::power(
                    Complexity::log_of(2.0, replacement.clone()),
                    *log_exponent,
                );
                Complexity::multiply(poly_part, log_part)
            }
            ComplexityKind::Exponential { base, var: v } => {
                if v != var {
                    return self.clone();
                }
                match replacement.kind() {
                    ComplexityKind::Constant(c) => Complexity::constant(base.powf(*c)),
                    _ => match replacement.dominant_variable() {
                        Some(w) => Complexity::exponential(*base, w),
                        None => self.clone(),
                    },
                }
            }
            ComplexityKind::Factorial(v) => {
                self.substitute_variable_only(v, var, replacement, Complexity::factorial)
            }
            ComplexityKind::InverseAckermann(v) => {
                self.substitute_variable_only(v, var, replacement, Complexity::inverse_ackermann)
            }
            ComplexityKind::Power { base, exponent } => {
                Complexity::power(base.substitute(var, replacement), *exponent)
            }
            ComplexityKind::Binary { op, left, right } => Complexity::binary(
                *op,
                left.substitute(var, replacement),
                right.substitute(var, replacement),
            ),
            ComplexityKind::Integral {
                integrand,
                bound_var,
                lower,
                upper,
                bound,
            } => {
                if bound_var == var {
                    // The integration variable shadows the substitution.
                    return self.clone();
                }
                Complexity::integral(
                    integrand.substitute(var, replacement),
                    bound_var.clone(),
                    lower.substitute(var, replacement),
                    upper.substitute(var, replacement),
                    bound.substitute(var, replacement),
                )
            }
            ComplexityKind::Recurrence(rec) => {
                let renamed = match replacement.as_variable() {
                    Some(w) if rec.variable() == var => w.clone(),
                    _ => rec.variable().clone(),
                };
                let rebuilt = RecurrenceRelation::new(
                    renamed,
                    rec.terms().to_vec(),
                    rec.work().substitute(var, replacement),
                    rec.base_case().substitute(var, replacement),
                );
                match rebuilt {
                    Ok(r) => Complexity::recurrence(r),
                    Err(_) => self.clone(),
                }
            }
            ComplexityKind::Amortized {
                amortized,
                worst,
                method,
                potential,
            } => Complexity::amortized(
                amortized.substitute(var, replacement),
                worst.substitute(var, replacement),
                *method,
                potential.clone(),
            ),
            ComplexityKind::Memory(profile) => {
                let map = |c: &Arc<Complexity>| Arc::new(c.substitute(var, replacement));
                Complexity::memory(MemoryProfile {
                    total: map(&profile.total),
                    stack: map(&profile.stack),
                    heap: map(&profile.heap),
                    auxiliary: map(&profile.auxiliary),
                    in_place: profile.in_place,
                    tail_recursive: profile.tail_recursive,
                    allocations: profile
                        .allocations
                        .iter()
                        .map(|site| AllocationSite {
                            label: site.label.clone(),
                            size: map(&site.size),
                            on_heap: site.on_heap,
                        })
                        .collect(),
                })
            }
        }
    }

    fn substitute_variable_only(
        &self,
        v: &Variable,
        var: &Variable,
        replacement: &Complexity,
        rebuild: impl Fn(Variable) -> Complexity,
    ) -> Complexity {
        if v != var {
            return self.clone();
        }
        match replacement.as_variable() {
            Some(w) => rebuild(w.clone()),
            None => match replacement.dominant_variable() {
                Some(w) => rebuild(w),
                None => self.clone(),
            },
        }
    }

    /// The wrapped variable, when this expression is a bare variable.
    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ComplexityKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// The scalar value, when this expression is a constant.
    pub fn as_constant(&self) -> Option<f64> {
        match &self.kind {
            ComplexityKind::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// True for `Constant`.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ComplexityKind::Constant(_))
    }

    /// An arbitrary-but-deterministic representative of the free-variable
    /// set: the largest by name. Used when a structured variant needs a
    /// single variable to stand in for a compound replacement.
    pub fn dominant_variable(&self) -> Option<Variable> {
        self.free_variables().into_iter().max()
    }

    /// Number of nodes in the expression tree.
    pub fn node_count(&self) -> usize {
        let mut counter = crate::core::visitor::NodeCounter::default();
        crate::core::visitor::walk_complexity(self, &mut counter);
        counter.count
    }

    /// Maximum nesting depth of the expression tree.
    pub fn depth(&self) -> usize {
        match &self.kind {
            ComplexityKind::LogOf { inner, .. } => 1 + inner.depth(),
            ComplexityKind::Power { base, .. } => 1 + base.depth(),
            ComplexityKind::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
            ComplexityKind::Integral {
                integrand,
                lower,
                upper,
                bound,
                ..
            } => {
                1 + integrand
                    .depth()
                    .max(lower.depth())
                    .max(upper.depth())
                    .max(bound.depth())
            }
            ComplexityKind::Recurrence(rec) => {
                1 + rec.work().depth().max(rec.base_case().depth())
            }
            ComplexityKind::Amortized {
                amortized, worst, ..
            } => 1 + amortized.depth().max(worst.depth()),
            ComplexityKind::Memory(profile) => 1 + profile.total.depth(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Variable {
        Variable::n()
    }

    fn m() -> Variable {
        Variable::named("m")
    }

    #[test]
    fn free_variables_of_compound_expression() {
        let e = Complexity::plus(
            Complexity::variable(n()),
            Complexity::logarithmic(1.0, 2.0, m()),
        );
        let vars = e.free_variables();
        assert!(vars.contains(&n()));
        assert!(vars.contains(&m()));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn substitute_renames_variable() {
        let e = Complexity::polynomial(n(), vec![(2, 1.0)]);
        let renamed = e.substitute(&n(), &Complexity::variable(m()));
        assert!(!renamed.contains_variable(&n()));
        assert!(renamed.contains_variable(&m()));
    }

    #[test]
    fn substitute_is_identity_for_unbound_variable() {
        let e = Complexity::variable(n());
        let out = e.substitute(&m(), &Complexity::constant(5.0));
        assert_eq!(out, e);
    }

    #[test]
    fn substitute_compound_replacement_into_linear() {
        // 3·n with n := m² becomes 3 · m²
        let e = Complexity::linear(3.0, n());
        let m_sq = Complexity::polynomial(m(), vec![(2, 1.0)]);
        let out = e.substitute(&n(), &m_sq);
        assert!(out.contains_variable(&m()));
        assert!(!out.contains_variable(&n()));
    }

    #[test]
    fn substitution_free_variable_law() {
        // FV(e[v := r]) = (FV(e) \ {v}) ∪ FV(r) when v ∈ FV(e)
        let e = Complexity::multiply(
            Complexity::variable(n()),
            Complexity::logarithmic(1.0, 2.0, n()),
        );
        let r = Complexity::linear(2.0, m());
        let out = e.substitute(&n(), &r);
        let fv = out.free_variables();
        assert_eq!(fv.len(), 1);
        assert!(fv.contains(&m()));
    }

    #[test]
    fn integration_variable_is_bound() {
        let u = Variable::named("u");
        let e = Complexity::integral(
            Complexity::variable(u.clone()),
            u.clone(),
            Complexity::one(),
            Complexity::variable(n()),
            Complexity::variable(n()),
        );
        let fv = e.free_variables();
        assert!(fv.contains(&n()));
        assert!(!fv.contains(&u));
    }
}
