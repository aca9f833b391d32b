//! Asymptotic classification of complexity expressions.
//!
//! `classify` reduces an expression to its growth *form* relative to one
//! variable: constant, polynomial, logarithmic, polylog, exponential,
//! factorial or unknown, together with the primary parameter (degree or
//! base), log exponent and leading coefficient. Sums and maxima classify
//! as their dominant summand; products add polynomial degrees and log
//! exponents.
//!
//! The asymptotic rank implied by a classification drives dominant-term
//! extraction in the simplifier and the `f(n)` vs `n^log_b(a)` comparison
//! in the Master Theorem:
//!
//! `Constant < log^j n < n^d (by d) < n^d·log^j n < base^n (by base) < n!`

use std::cmp::Ordering;

use crate::core::expr::{BinaryOp, Complexity, ComplexityKind};
use crate::core::variable::Variable;

/// The growth form of an expression relative to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// No dependence on the variable.
    Constant,
    /// n^d for some real d > 0.
    Polynomial,
    /// log^j n for some j > 0 (j = 0 covers inverse-Ackermann terms).
    Logarithmic,
    /// n^d · log^j n with d > 0 and j > 0.
    PolyLog,
    /// base^n.
    Exponential,
    /// n!.
    Factorial,
    /// Not classifiable (unsolved recurrence, mixed variables, …).
    Unknown,
}

/// Result of classifying an expression against one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The growth form.
    pub form: Form,
    /// Primary parameter: polynomial degree, or exponential base.
    pub degree: Option<f64>,
    /// Logarithm exponent for logarithmic/polylog forms.
    pub log_exponent: Option<f64>,
    /// Leading multiplicative coefficient where known.
    pub coefficient: Option<f64>,
}

impl Classification {
    fn constant(coefficient: f64) -> Self {
        Classification {
            form: Form::Constant,
            degree: None,
            log_exponent: None,
            coefficient: Some(coefficient),
        }
    }

    fn polynomial(degree: f64, coefficient: f64) -> Self {
        Classification {
            form: Form::Polynomial,
            degree: Some(degree),
            log_exponent: None,
            coefficient: Some(coefficient),
        }
    }

    fn logarithmic(log_exponent: f64, coefficient: f64) -> Self {
        Classification {
            form: Form::Logarithmic,
            degree: None,
            log_exponent: Some(log_exponent),
            coefficient: Some(coefficient),
        }
    }

    fn polylog(degree: f64, log_exponent: f64, coefficient: f64) -> Self {
        Classification {
            form: Form::PolyLog,
            degree: Some(degree),
            log_exponent: Some(log_exponent),
            coefficient: Some(coefficient),
        }
    }

    fn exponential(base: f64) -> Self {
        Classification {
            form: Form::Exponential,
            degree: Some(base),
            // For exponential forms this field carries the degree of an
            // accompanying polynomial factor (n^d · base^n), used as the
            // secondary rank.
            log_exponent: Some(0.0),
            coefficient: None,
        }
    }

    fn factorial() -> Self {
        Classification {
            form: Form::Factorial,
            degree: None,
            log_exponent: None,
            coefficient: None,
        }
    }

    fn unknown() -> Self {
        Classification {
            form: Form::Unknown,
            degree: None,
            log_exponent: None,
            coefficient: None,
        }
    }

    /// The `(degree, log_exponent)` pair for forms expressible as
    /// n^d · log^j n. `None` for exponential, factorial and unknown.
    pub fn polylog_pair(&self) -> Option<(f64, f64)> {
        match self.form {
            Form::Constant => Some((0.0, 0.0)),
            Form::Logarithmic => Some((0.0, self.log_exponent.unwrap_or(1.0))),
            Form::Polynomial => Some((self.degree.unwrap_or(0.0), 0.0)),
            Form::PolyLog => Some((
                self.degree.unwrap_or(0.0),
                self.log_exponent.unwrap_or(0.0),
            )),
            _ => None,
        }
    }

    /// Asymptotic rank key: `(tier, primary, secondary)`.
    ///
    /// `None` for unclassifiable expressions, which compare as
    /// incomparable rather than being absorbed.
    fn rank(&self) -> Option<(u8, f64, f64)> {
        match self.form {
            Form::Constant => Some((0, 0.0, 0.0)),
            Form::Logarithmic => Some((1, self.log_exponent.unwrap_or(1.0), 0.0)),
            // Polynomial and polylog share a tier, compared
            // lexicographically on (degree, log exponent): n^d sits below
            // n^d · log^j n.
            Form::Polynomial => Some((2, self.degree.unwrap_or(0.0), 0.0)),
            Form::PolyLog => Some((
                2,
                self.degree.unwrap_or(0.0),
                self.log_exponent.unwrap_or(0.0),
            )),
            Form::Exponential => Some((
                3,
                self.degree.unwrap_or(2.0),
                self.log_exponent.unwrap_or(0.0),
            )),
            Form::Factorial => Some((4, 0.0, 0.0)),
            Form::Unknown => None,
        }
    }
}

/// Classify `expr` relative to `var`.
pub fn classify(expr: &Complexity, var: &Variable) -> Classification {
    match expr.kind() {
        ComplexityKind::Constant(c) => Classification::constant(*c),
        ComplexityKind::Variable(v) => {
            if v == var {
                Classification::polynomial(1.0, 1.0)
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::Linear { coeff, var: v } => {
            if v == var {
                Classification::polynomial(1.0, *coeff)
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::Polynomial { var: v, terms } => {
            if v != var {
                return Classification::unknown();
            }
            match terms.last() {
                Some(&(deg, coeff)) => Classification::polynomial(f64::from(deg), coeff),
                None => Classification::constant(0.0),
            }
        }
        ComplexityKind::Logarithmic { coeff, var: v, .. } => {
            if v == var {
                Classification::logarithmic(1.0, *coeff)
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::LogOf { inner, .. } => {
            let inner_class = classify(inner, var);
            match inner_class.form {
                // log(n^d) = d · log n
                Form::Polynomial => {
                    Classification::logarithmic(1.0, inner_class.degree.unwrap_or(1.0))
                }
                Form::PolyLog => Classification::logarithmic(1.0, 1.0),
                Form::Constant => Classification::constant(1.0),
                // log(2^n) = n
                Form::Exponential => Classification::polynomial(1.0, 1.0),
                _ => Classification::unknown(),
            }
        }
        ComplexityKind::PolyLog {
            var: v,
            degree,
            log_exponent,
        } => {
            if v != var {
                return Classification::unknown();
            }
            if *degree == 0.0 {
                Classification::logarithmic(*log_exponent, 1.0)
            } else if *log_exponent == 0.0 {
                Classification::polynomial(*degree, 1.0)
            } else {
                Classification::polylog(*degree, *log_exponent, 1.0)
            }
        }
        ComplexityKind::Exponential { base, var: v } => {
            if v == var {
                Classification::exponential(*base)
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::Factorial(v) => {
            if v == var {
                Classification::factorial()
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::Power { base, exponent } => {
            let inner = classify(base, var);
            scale_exponents(inner, *exponent)
        }
        // α(n) grows strictly slower than any positive log power; rank it
        // as a zero-exponent logarithmic form.
        ComplexityKind::InverseAckermann(v) => {
            if v == var {
                Classification::logarithmic(0.0, 1.0)
            } else {
                Classification::unknown()
            }
        }
        ComplexityKind::Binary { op, left, right } => {
            let l = classify(left, var);
            let r = classify(right, var);
            match op {
                BinaryOp::Plus | BinaryOp::Max => dominant(l, r),
                BinaryOp::Min => match compare_ranked(&l, &r) {
                    Some(Ordering::Greater) => r,
                    Some(_) => l,
                    None => Classification::unknown(),
                },
                BinaryOp::Multiply => product(l, r),
            }
        }
        ComplexityKind::Integral { bound, .. } => classify(bound, var),
        ComplexityKind::Recurrence(_) => Classification::unknown(),
        ComplexityKind::Amortized { amortized, .. } => classify(amortized, var),
        ComplexityKind::Memory(profile) => classify(&profile.total, var),
    }
}

/// The dominant of two classifications, or unknown when incomparable.
fn dominant(l: Classification, r: Classification) -> Classification {
    match compare_ranked(&l, &r) {
        Some(Ordering::Less) => r,
        Some(_) => l,
        None => {
            // A constant summand is absorbed even next to an
            // unclassifiable one.
            if l.form == Form::Constant {
                r
            } else if r.form == Form::Constant {
                l
            } else {
                Classification::unknown()
            }
        }
    }
}

/// Product classification: degrees add, log exponents add.
fn product(l: Classification, r: Classification) -> Classification {
    use Form::*;
    match (l.form, r.form) {
        (Unknown, _) | (_, Unknown) => Classification::unknown(),
        (Factorial, _) | (_, Factorial) => Classification::factorial(),
        (Exponential, Exponential) => Classification {
            form: Exponential,
            degree: Some(l.degree.unwrap_or(2.0) * r.degree.unwrap_or(2.0)),
            log_exponent: Some(l.log_exponent.unwrap_or(0.0) + r.log_exponent.unwrap_or(0.0)),
            coefficient: None,
        },
        // base^n · n^d: the base decides the tier, the polynomial factor
        // survives as the secondary rank.
        (Exponential, _) => exponential_with_factor(l, &r),
        (_, Exponential) => exponential_with_factor(r, &l),
        (Constant, _) => scale_coefficient(r, l.coefficient),
        (_, Constant) => scale_coefficient(l, r.coefficient),
        _ => {
            let (ld, lj) = l.polylog_pair().unwrap_or((0.0, 0.0));
            let (rd, rj) = r.polylog_pair().unwrap_or((0.0, 0.0));
            let d = ld + rd;
            let j = lj + rj;
            let coeff = l.coefficient.unwrap_or(1.0) * r.coefficient.unwrap_or(1.0);
            if d == 0.0 && j == 0.0 {
                Classification::constant(coeff)
            } else if d == 0.0 {
                Classification::logarithmic(j, coeff)
            } else if j == 0.0 {
                Classification::polynomial(d, coeff)
            } else {
                Classification::polylog(d, j, coeff)
            }
        }
    }
}

/// Fold a polylog-family factor into an exponential classification.
fn exponential_with_factor(exp: Classification, factor: &Classification) -> Classification {
    let factor_degree = factor.polylog_pair().map_or(0.0, |(d, _)| d);
    Classification {
        form: Form::Exponential,
        degree: exp.degree,
        log_exponent: Some(exp.log_exponent.unwrap_or(0.0) + factor_degree),
        coefficient: None,
    }
}

fn scale_coefficient(c: Classification, by: Option<f64>) -> Classification {
    Classification {
        coefficient: match (c.coefficient, by) {
            (Some(a), Some(b)) => Some(a * b),
            (a, _) => a,
        },
        ..c
    }
}

fn scale_exponents(c: Classification, by: f64) -> Classification {
    match c.polylog_pair() {
        Some((d, j)) => {
            let d = d * by;
            let j = j * by;
            if d == 0.0 && j == 0.0 {
                Classification::constant(1.0)
            } else if d == 0.0 {
                Classification::logarithmic(j, 1.0)
            } else if j == 0.0 {
                Classification::polynomial(d, 1.0)
            } else {
                Classification::polylog(d, j, 1.0)
            }
        }
        None => Classification::unknown(),
    }
}

fn compare_ranked(l: &Classification, r: &Classification) -> Option<Ordering> {
    let (lt, lp, ls) = l.rank()?;
    let (rt, rp, rs) = r.rank()?;
    Some(
        lt.cmp(&rt)
            .then(lp.partial_cmp(&rp).unwrap_or(Ordering::Equal))
            .then(ls.partial_cmp(&rs).unwrap_or(Ordering::Equal)),
    )
}

/// Compare two expressions asymptotically relative to `var`.
///
/// `None` when either side is unclassifiable (the caller must keep both).
pub fn compare_asymptotic(
    a: &Complexity,
    b: &Complexity,
    var: &Variable,
) -> Option<Ordering> {
    compare_ranked(&classify(a, var), &classify(b, var))
}

/// Extract the polynomial degree of `expr` relative to `var`, when its
/// form is purely polynomial.
pub fn try_extract_polynomial_degree(expr: &Complexity, var: &Variable) -> Option<f64> {
    let c = classify(expr, var);
    match c.form {
        Form::Polynomial => c.degree,
        Form::Constant => Some(0.0),
        _ => None,
    }
}

/// Extract the `(degree, log_exponent)` polylog form of `expr` relative
/// to `var`, covering constant, polynomial, logarithmic and polylog forms.
pub fn try_extract_polylog_form(expr: &Complexity, var: &Variable) -> Option<(f64, f64)> {
    classify(expr, var).polylog_pair()
}

/// True iff `expr` is O(n^(d−ε)) for some ε > 0 — strictly below degree d.
pub fn is_bounded_by_polynomial(expr: &Complexity, var: &Variable, d: f64) -> bool {
    let c = classify(expr, var);
    match c.form {
        Form::Constant => d > 0.0,
        Form::Logarithmic => d > 0.0,
        Form::Polynomial | Form::PolyLog => c.degree.unwrap_or(0.0) < d,
        _ => false,
    }
}

/// True iff `expr` is Ω(n^(d+ε)) for some ε > 0 — polynomially above
/// degree d. A polylog factor at degree exactly d does not qualify.
pub fn dominates_polynomial(expr: &Complexity, var: &Variable, d: f64) -> bool {
    let c = classify(expr, var);
    match c.form {
        Form::Polynomial | Form::PolyLog => c.degree.unwrap_or(0.0) > d,
        Form::Exponential | Form::Factorial => true,
        _ => false,
    }
}
