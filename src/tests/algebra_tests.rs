//! Algebra and simplifier invariants.

use crate::classify::{classify, compare_asymptotic, Form};
use crate::core::{Assignment, Complexity, Variable};
use crate::simplification::{simplify_expr, Simplifier};

fn n() -> Variable {
    Variable::n()
}

fn m() -> Variable {
    Variable::named("m")
}

#[test]
fn substitution_respects_free_variable_sets() {
    // e = n² · log n, e' = 2m: FV(e[n := e']) = {m}
    let e = Complexity::multiply(
        Complexity::polynomial(n(), vec![(2, 1.0)]),
        Complexity::logarithmic(1.0, 2.0, n()),
    );
    let replacement = Complexity::linear(2.0, m());
    let substituted = e.substitute(&n(), &replacement);
    let fv = substituted.free_variables();
    assert_eq!(fv.len(), 1);
    assert!(fv.contains(&m()));

    // Substituting an unbound variable is the identity.
    let unchanged = e.substitute(&m(), &replacement);
    assert_eq!(unchanged, e);
}

#[test]
fn simplify_is_idempotent_on_compound_expressions() {
    let samples = vec![
        Complexity::plus(
            Complexity::plus(Complexity::one(), Complexity::variable(n())),
            Complexity::polynomial(n(), vec![(2, 1.0), (1, 4.0)]),
        ),
        Complexity::multiply(
            Complexity::linear(3.0, n()),
            Complexity::logarithmic(2.0, 2.0, n()),
        ),
        Complexity::max_of(
            Complexity::variable(n()),
            Complexity::variable(m()),
        ),
        Complexity::multiply(
            Complexity::multiply(Complexity::constant(2.0), Complexity::variable(n())),
            Complexity::constant(3.0),
        ),
    ];
    let simplifier = Simplifier::new();
    for sample in samples {
        let once = simplifier.simplify(sample);
        let twice = simplifier.simplify(once.clone());
        assert_eq!(once, twice);
    }
}

#[test]
fn exact_simplification_preserves_evaluation() {
    // Coalescing 3n · 2 log n into 6 · n log n is value-exact.
    let e = Complexity::multiply(
        Complexity::linear(3.0, n()),
        Complexity::logarithmic(2.0, 2.0, n()),
    );
    let simplified = Simplifier::new().exact_only(true).simplify(e.clone());
    let mut vars = Assignment::default();
    for size in [2.0, 8.0, 64.0, 100.0] {
        vars.insert("n".to_owned(), size);
        let before = e.evaluate(&vars).unwrap();
        let after = simplified.evaluate(&vars).unwrap();
        assert!(
            (before - after).abs() < 1e-9 * before.abs().max(1.0),
            "value changed at n = {}",
            size
        );
    }
}

#[test]
fn dominance_simplification_preserves_the_asymptotic_class() {
    let e = Complexity::plus(
        Complexity::polynomial(n(), vec![(2, 1.0), (1, 7.0), (0, 3.0)]),
        Complexity::polylog(n(), 1.0, 1.0),
    );
    let simplified = simplify_expr(e.clone());
    let before = classify(&e, &n());
    let after = classify(&simplified, &n());
    assert_eq!(before.form, after.form);
    assert_eq!(before.degree, after.degree);
}

#[test]
fn polynomial_times_logarithm_classifies_as_polylog() {
    // P of degree d times L with exponent j is polylog (d, j).
    for (d, j) in [(1u32, 1.0), (2, 1.0), (3, 2.0)] {
        let p = Complexity::polynomial(n(), vec![(d, 1.0)]);
        let l = Complexity::power(Complexity::logarithmic(1.0, 2.0, n()), j);
        let product = simplify_expr(Complexity::multiply(p, l));
        let class = classify(&product, &n());
        assert_eq!(class.form, Form::PolyLog, "d={} j={}", d, j);
        assert_eq!(class.degree, Some(f64::from(d)));
        assert_eq!(class.log_exponent, Some(j));
    }
}

#[test]
fn multiplying_by_unit_is_the_identity() {
    let e = Complexity::variable(n());
    let product = simplify_expr(Complexity::multiply(
        e.clone(),
        Complexity::constant(1.0),
    ));
    assert_eq!(product, e);
}

#[test]
fn composition_is_monotone() {
    use std::cmp::Ordering;
    // a ≼ a' and b ≼ b' imply a·b ≼ a'·b' and a+b ≼ a'+b'.
    let a = Complexity::logarithmic(1.0, 2.0, n());
    let a_up = Complexity::variable(n());
    let b = Complexity::variable(n());
    let b_up = Complexity::polynomial(n(), vec![(2, 1.0)]);

    let product = simplify_expr(Complexity::multiply(a.clone(), b.clone()));
    let product_up = simplify_expr(Complexity::multiply(a_up.clone(), b_up.clone()));
    assert_ne!(
        compare_asymptotic(&product, &product_up, &n()),
        Some(Ordering::Greater)
    );

    let sum = simplify_expr(Complexity::plus(a, b));
    let sum_up = simplify_expr(Complexity::plus(a_up, b_up));
    assert_ne!(
        compare_asymptotic(&sum, &sum_up, &n()),
        Some(Ordering::Greater)
    );
}

#[test]
fn asymptotic_rank_orders_the_canonical_ladder() {
    use std::cmp::Ordering;
    let ladder = vec![
        Complexity::one(),
        Complexity::inverse_ackermann(n()),
        Complexity::logarithmic(1.0, 2.0, n()),
        Complexity::polylog(n(), 0.5, 0.0),
        Complexity::variable(n()),
        Complexity::polylog(n(), 1.0, 1.0),
        Complexity::polynomial(n(), vec![(2, 1.0)]),
        Complexity::exponential(2.0, n()),
        Complexity::exponential(3.0, n()),
        Complexity::factorial(n()),
    ];
    for pair in ladder.windows(2) {
        assert_eq!(
            compare_asymptotic(&pair[0], &pair[1], &n()),
            Some(Ordering::Less),
            "{} should rank below {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn evaluation_agrees_with_closed_forms() {
    let mut vars = Assignment::default();
    vars.insert("n".to_owned(), 16.0);

    let cases = vec![
        (Complexity::one(), 1.0),
        (Complexity::variable(n()), 16.0),
        (Complexity::logarithmic(1.0, 2.0, n()), 4.0),
        (Complexity::polylog(n(), 1.0, 1.0), 64.0),
        (Complexity::polynomial(n(), vec![(2, 1.0)]), 256.0),
        (Complexity::exponential(2.0, n()), 65536.0),
    ];
    for (expr, expected) in cases {
        let value = expr.evaluate(&vars).unwrap();
        assert!(
            (value - expected).abs() < 1e-6,
            "{} evaluated to {}",
            expr,
            value
        );
    }
}

#[test]
fn canonical_renderings_are_stable() {
    let cases = vec![
        (Complexity::one(), "O(1)"),
        (Complexity::logarithmic(1.0, 2.0, n()), "O(log n)"),
        (Complexity::variable(n()), "O(n)"),
        (Complexity::polylog(n(), 1.0, 1.0), "O(n log n)"),
        (Complexity::polynomial(n(), vec![(2, 1.0)]), "O(n²)"),
        (Complexity::polylog(n(), 1.585, 0.0), "O(n^1.585)"),
        (Complexity::exponential(2.0, n()), "O(2^n)"),
        (Complexity::factorial(n()), "O(n!)"),
    ];
    for (expr, expected) in cases {
        assert_eq!(expr.big_o(), expected);
    }
}

#[test]
fn amortized_costs_stay_below_their_worst_case() {
    use crate::core::AmortizedMethod;
    use std::cmp::Ordering;
    let amortized = Complexity::amortized(
        Complexity::one(),
        Complexity::variable(n()),
        AmortizedMethod::Aggregate,
        None,
    );
    if let crate::core::ComplexityKind::Amortized {
        amortized: cost,
        worst,
        ..
    } = amortized.kind()
    {
        assert_ne!(
            compare_asymptotic(cost, worst, &n()),
            Some(Ordering::Greater)
        );
    } else {
        panic!("expected amortized variant");
    }
}
