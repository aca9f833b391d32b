//! Total structural order over complexity expressions.
//!
//! This order is *syntactic*, not asymptotic: it exists so commutative
//! operands can be sorted into a canonical form before comparison or
//! hashing. Asymptotic dominance lives in [`crate::classify`].

use std::cmp::Ordering;

use super::{Complexity, ComplexityKind};

/// Rank of each variant in the canonical sort. Roughly smallest growth
/// first so that sorted operands read naturally, but ties and mixtures
/// are broken purely structurally.
fn variant_rank(kind: &ComplexityKind) -> u8 {
    match kind {
        ComplexityKind::Constant(_) => 0,
        ComplexityKind::InverseAckermann(_) => 1,
        ComplexityKind::Logarithmic { .. } => 2,
        ComplexityKind::LogOf { .. } => 3,
        ComplexityKind::Variable(_) => 4,
        ComplexityKind::Linear { .. } => 5,
        ComplexityKind::Polynomial { .. } => 6,
        ComplexityKind::PolyLog { .. } => 7,
        ComplexityKind::Power { .. } => 8,
        ComplexityKind::Exponential { .. } => 9,
        ComplexityKind::Factorial(_) => 10,
        ComplexityKind::Binary { .. } => 11,
        ComplexityKind::Integral { .. } => 12,
        ComplexityKind::Recurrence(_) => 13,
        ComplexityKind::Amortized { .. } => 14,
        ComplexityKind::Memory(_) => 15,
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Compare two expressions in the canonical total order.
pub fn complexity_cmp(a: &Complexity, b: &Complexity) -> Ordering {
    let rank = variant_rank(&a.kind).cmp(&variant_rank(&b.kind));
    if rank != Ordering::Equal {
        return rank;
    }

    match (&a.kind, &b.kind) {
        (ComplexityKind::Constant(x), ComplexityKind::Constant(y)) => cmp_f64(*x, *y),
        (ComplexityKind::Variable(x), ComplexityKind::Variable(y)) => x.cmp(y),
        (
            ComplexityKind::Linear { coeff: c1, var: v1 },
            ComplexityKind::Linear { coeff: c2, var: v2 },
        ) => v1.cmp(v2).then(cmp_f64(*c1, *c2)),
        (
            ComplexityKind::Polynomial { var: v1, terms: t1 },
            ComplexityKind::Polynomial { var: v2, terms: t2 },
        ) => v1.cmp(v2).then_with(|| {
            let d1 = t1.last().map_or(0, |&(d, _)| d);
            let d2 = t2.last().map_or(0, |&(d, _)| d);
            d1.cmp(&d2).then(t1.len().cmp(&t2.len()))
        }),
        (
            ComplexityKind::Logarithmic { coeff: c1, var: v1, .. },
            ComplexityKind::Logarithmic { coeff: c2, var: v2, .. },
        ) => v1.cmp(v2).then(cmp_f64(*c1, *c2)),
        (
            ComplexityKind::LogOf { inner: i1, .. },
            ComplexityKind::LogOf { inner: i2, .. },
        ) => complexity_cmp(i1, i2),
        (
            ComplexityKind::PolyLog { var: v1, degree: d1, log_exponent: l1 },
            ComplexityKind::PolyLog { var: v2, degree: d2, log_exponent: l2 },
        ) => v1.cmp(v2).then(cmp_f64(*d1, *d2)).then(cmp_f64(*l1, *l2)),
        (
            ComplexityKind::Exponential { base: b1, var: v1 },
            ComplexityKind::Exponential { base: b2, var: v2 },
        ) => v1.cmp(v2).then(cmp_f64(*b1, *b2)),
        (ComplexityKind::Factorial(x), ComplexityKind::Factorial(y))
        | (ComplexityKind::InverseAckermann(x), ComplexityKind::InverseAckermann(y)) => x.cmp(y),
        (
            ComplexityKind::Power { base: b1, exponent: e1 },
            ComplexityKind::Power { base: b2, exponent: e2 },
        ) => complexity_cmp(b1, b2).then(cmp_f64(*e1, *e2)),
        (
            ComplexityKind::Binary { op: o1, left: l1, right: r1 },
            ComplexityKind::Binary { op: o2, left: l2, right: r2 },
        ) => o1
            .cmp(o2)
            .then_with(|| complexity_cmp(l1, l2))
            .then_with(|| complexity_cmp(r1, r2)),
        // Remaining compound variants: order by cached hash, which is
        // stable within one process run.
        _ => a.hash.cmp(&b.hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variable::Variable;

    #[test]
    fn constants_sort_before_variables_before_exponentials() {
        let c = Complexity::constant(5.0);
        let v = Complexity::variable(Variable::n());
        let e = Complexity::exponential(2.0, Variable::n());
        assert_eq!(complexity_cmp(&c, &v), Ordering::Less);
        assert_eq!(complexity_cmp(&v, &e), Ordering::Less);
        assert_eq!(complexity_cmp(&e, &c), Ordering::Greater);
    }

    #[test]
    fn order_is_total_and_reflexive() {
        let v = Complexity::variable(Variable::n());
        assert_eq!(complexity_cmp(&v, &v), Ordering::Equal);
    }

    #[test]
    fn variables_sort_by_name() {
        let n = Complexity::variable(Variable::n());
        let m = Complexity::variable(Variable::named("m"));
        assert_eq!(complexity_cmp(&m, &n), Ordering::Less);
    }
}
