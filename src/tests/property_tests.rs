//! Property-based laws.

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use crate::classify::classify;
use crate::core::{Assignment, Complexity, Confidence, Variable};
use crate::recurrence::{RecurrenceRelation, RecurrenceTerm};
use crate::simplification::simplify_expr;
use crate::solvers::akra_bazzi::critical_exponent;

fn n() -> Variable {
    Variable::n()
}

/// A generated single-variable complexity expression.
#[derive(Debug, Clone)]
struct GenExpr(Complexity);

impl Arbitrary for GenExpr {
    fn arbitrary(g: &mut Gen) -> Self {
        GenExpr(gen_expr(g, 3))
    }
}

fn gen_coeff(g: &mut Gen) -> f64 {
    f64::from(u8::arbitrary(g) % 9 + 1)
}

fn gen_expr(g: &mut Gen, depth: usize) -> Complexity {
    let leaf = depth == 0 || bool::arbitrary(g);
    if leaf {
        match u8::arbitrary(g) % 6 {
            0 => Complexity::constant(gen_coeff(g)),
            1 => Complexity::variable(n()),
            2 => Complexity::linear(gen_coeff(g), n()),
            3 => Complexity::polynomial(
                n(),
                vec![(u8::arbitrary(g) as u32 % 4 + 1, gen_coeff(g))],
            ),
            4 => Complexity::logarithmic(gen_coeff(g), 2.0, n()),
            _ => Complexity::polylog(n(), f64::from(u8::arbitrary(g) % 3), 1.0),
        }
    } else {
        let left = gen_expr(g, depth - 1);
        let right = gen_expr(g, depth - 1);
        match u8::arbitrary(g) % 3 {
            0 => Complexity::plus(left, right),
            1 => Complexity::multiply(left, right),
            _ => Complexity::max_of(left, right),
        }
    }
}

/// A generated replacement expression over a second variable.
#[derive(Debug, Clone)]
struct GenReplacement(Complexity);

impl Arbitrary for GenReplacement {
    fn arbitrary(g: &mut Gen) -> Self {
        let m = Variable::named("m");
        let expr = match u8::arbitrary(g) % 4 {
            0 => Complexity::variable(m),
            1 => Complexity::linear(gen_coeff(g), m),
            2 => Complexity::polynomial(m, vec![(2, 1.0)]),
            _ => Complexity::logarithmic(1.0, 2.0, m),
        };
        GenReplacement(expr)
    }
}

/// A generated Akra–Bazzi-shaped recurrence.
#[derive(Debug, Clone)]
struct GenDivisionRecurrence(RecurrenceRelation);

impl Arbitrary for GenDivisionRecurrence {
    fn arbitrary(g: &mut Gen) -> Self {
        let term_count = usize::arbitrary(g) % 3 + 1;
        let terms: Vec<RecurrenceTerm> = (0..term_count)
            .map(|_| {
                let coefficient = f64::from(u8::arbitrary(g) % 4 + 1) / 2.0;
                // Scales in [1/8, 7/8].
                let scale = f64::from(u8::arbitrary(g) % 7 + 1) / 8.0;
                RecurrenceTerm::scaled(coefficient, scale)
            })
            .collect();
        let relation = RecurrenceRelation::new(
            n(),
            terms,
            Complexity::variable(n()),
            Complexity::one(),
        )
        .expect("generated terms are valid");
        GenDivisionRecurrence(relation)
    }
}

#[test]
fn substitution_preserves_free_variable_law() {
    fn law(expr: GenExpr, replacement: GenReplacement) -> bool {
        let e = expr.0;
        let r = replacement.0;
        let var = n();
        let had_var = e.contains_variable(&var);
        let substituted = e.substitute(&var, &r);
        let fv = substituted.free_variables();

        let mut expected = e.free_variables();
        expected.remove(&var);
        if had_var {
            expected.extend(r.free_variables());
        }
        fv == expected
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(law as fn(GenExpr, GenReplacement) -> bool);
}

#[test]
fn simplification_is_idempotent() {
    fn law(expr: GenExpr) -> bool {
        let once = simplify_expr(expr.0);
        let twice = simplify_expr(once.clone());
        once == twice
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(law as fn(GenExpr) -> bool);
}

#[test]
fn simplification_preserves_the_growth_class() {
    fn law(expr: GenExpr) -> TestResult {
        let var = n();
        let before = classify(&expr.0, &var);
        if before.form == crate::classify::Form::Unknown {
            return TestResult::discard();
        }
        let after = classify(&simplify_expr(expr.0), &var);
        TestResult::from_bool(
            before.form == after.form
                && before.degree == after.degree
                && before.log_exponent == after.log_exponent,
        )
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(law as fn(GenExpr) -> TestResult);
}

#[test]
fn simplification_never_raises_the_value() {
    // Dominance extraction may drop summands but never grows them: at a
    // large input the simplified figure is bounded by the original.
    fn law(expr: GenExpr) -> TestResult {
        let mut vars = Assignment::default();
        vars.insert("n".to_owned(), 64.0);
        let original = expr.0.evaluate(&vars);
        let simplified = simplify_expr(expr.0).evaluate(&vars);
        match (original, simplified) {
            (Some(before), Some(after)) => {
                TestResult::from_bool(after <= before + 1e-9)
            }
            _ => TestResult::discard(),
        }
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(law as fn(GenExpr) -> TestResult);
}

#[test]
fn critical_exponent_residual_is_tiny() {
    fn law(rec: GenDivisionRecurrence) -> bool {
        let relation = rec.0;
        let Some(p) = critical_exponent(&relation) else {
            return false;
        };
        let residual: f64 = relation
            .terms()
            .iter()
            .map(|t| t.coefficient * t.scale.powf(p))
            .sum::<f64>()
            - 1.0;
        residual.abs() < 1e-9
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(law as fn(GenDivisionRecurrence) -> bool);
}

#[test]
fn critical_exponent_is_deterministic() {
    fn law(rec: GenDivisionRecurrence) -> bool {
        critical_exponent(&rec.0) == critical_exponent(&rec.0)
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(law as fn(GenDivisionRecurrence) -> bool);
}

#[test]
fn confidence_always_stays_in_unit_interval() {
    fn law(raw: f64, factors: Vec<u8>) -> bool {
        let mut confidence = Confidence::new(raw);
        if !(0.0..=1.0).contains(&confidence.value()) {
            return false;
        }
        for factor in factors.iter().take(8) {
            let penalty = Confidence::new(f64::from(*factor) / 255.0);
            let next = confidence.combine(penalty);
            // Monotone non-increasing and still in range.
            if next.value() > confidence.value() || !(0.0..=1.0).contains(&next.value()) {
                return false;
            }
            confidence = next;
        }
        true
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(law as fn(f64, Vec<u8>) -> bool);
}

#[test]
fn master_solutions_track_unrolled_growth() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::solvers::{solve, SolverOutcome};

    // For random divide-and-conquer recurrences with constant work, the
    // solved closed form and direct numeric unrolling must grow at the
    // same rate between n = 16 and n = 64, up to the constant factors
    // the Θ bound is allowed to hide.
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let a = f64::from(rng.gen_range(1_i32..=4));
        let b = f64::from(rng.gen_range(2_i32..=4));
        let relation =
            RecurrenceRelation::divide_and_conquer(a, b, Complexity::one(), n()).unwrap();

        let unrolled_ratio = relation.unroll(64.0).unwrap() / relation.unroll(16.0).unwrap();

        let solution = match solve(&relation) {
            SolverOutcome::MasterApplicable { solution, .. }
            | SolverOutcome::AkraBazziApplicable { solution, .. } => solution,
            other => panic!("expected a closed form for a={} b={}, got {:?}", a, b, other),
        };
        let mut at_16 = Assignment::default();
        at_16.insert("n".to_owned(), 16.0);
        let mut at_64 = Assignment::default();
        at_64.insert("n".to_owned(), 64.0);
        let solved_ratio =
            solution.evaluate(&at_64).unwrap() / solution.evaluate(&at_16).unwrap();

        let drift = solved_ratio / unrolled_ratio;
        assert!(
            (0.25..=4.0).contains(&drift),
            "a={} b={}: solved ratio {} vs unrolled ratio {}",
            a,
            b,
            solved_ratio,
            unrolled_ratio
        );
    }
}

#[test]
fn unrolled_recurrences_match_solved_growth() {
    // For merge sort, the unrolled values grow like n log n: the ratio
    // T(2n)/T(n) approaches 2 + o(1).
    let relation = RecurrenceRelation::divide_and_conquer(
        2.0,
        2.0,
        Complexity::variable(n()),
        n(),
    )
    .unwrap();
    let t32 = relation.unroll(32.0).unwrap();
    let t64 = relation.unroll(64.0).unwrap();
    let ratio = t64 / t32;
    assert!(
        (2.0..2.6).contains(&ratio),
        "T(64)/T(32) = {} looks wrong for n log n growth",
        ratio
    );
}
