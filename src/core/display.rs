//! Big-O rendering for complexity expressions.
//!
//! `Display` renders the bare asymptotic form (`n log n`, `n²`, `2^n`);
//! [`Complexity::big_o`] wraps it as `O(…)`. Rendering is asymptotic:
//! multiplicative coefficients and logarithm bases are dropped, and a
//! polynomial renders as its top-degree term. Dominant-summand extraction
//! across `+`/`max` chains is the simplifier's job, not the renderer's.
//!
//! Small integral exponents use Unicode superscripts (`n²`, `log² n`);
//! fractional exponents render as `n^p` with at most three decimals.

use std::fmt;

use crate::core::expr::{BinaryOp, Complexity, ComplexityKind};

/// Superscript digits for small integral exponents.
const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Format an exponent: integral values verbatim, fractional values with
/// at most three decimals, trailing zeros trimmed.
fn format_exponent(p: f64) -> String {
    if p.fract() == 0.0 && p.abs() < 1e9 {
        format!("{}", p as i64)
    } else {
        let s = format!("{:.3}", p);
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// `n²` for small integral degrees, `n^2.5` otherwise.
fn power_of(base: &str, p: f64) -> String {
    if p == 1.0 {
        return base.to_owned();
    }
    if p.fract() == 0.0 && (0.0..10.0).contains(&p) {
        let mut s = base.to_owned();
        s.push(SUPERSCRIPTS[p as usize]);
        return s;
    }
    format!("{}^{}", base, format_exponent(p))
}

/// `log n`, `log² n`, `log^2.5 n`.
fn log_power(arg: &str, j: f64) -> String {
    if j == 1.0 {
        return format!("log {}", arg);
    }
    if j.fract() == 0.0 && (0.0..10.0).contains(&j) {
        return format!("log{} {}", SUPERSCRIPTS[j as usize], arg);
    }
    format!("log^{} {}", format_exponent(j), arg)
}

/// Whether a rendered operand needs parentheses inside a product.
fn needs_parens_in_product(expr: &Complexity) -> bool {
    matches!(
        expr.kind(),
        ComplexityKind::Binary {
            op: BinaryOp::Plus,
            ..
        }
    )
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Complexity, in_product: bool) -> fmt::Result {
    if in_product && needs_parens_in_product(expr) {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ComplexityKind::Constant(_) => write!(f, "1"),
            ComplexityKind::Variable(v) => write!(f, "{}", v),
            ComplexityKind::Linear { var, .. } => write!(f, "{}", var),
            ComplexityKind::Polynomial { var, terms } => {
                let degree = terms.last().map_or(0, |&(d, _)| d);
                write!(f, "{}", power_of(var.name(), f64::from(degree)))
            }
            ComplexityKind::Logarithmic { var, .. } => {
                write!(f, "{}", log_power(var.name(), 1.0))
            }
            ComplexityKind::LogOf { inner, .. } => write!(f, "log({})", inner),
            ComplexityKind::PolyLog {
                var,
                degree,
                log_exponent,
            } => {
                if *degree == 0.0 {
                    return write!(f, "{}", log_power(var.name(), *log_exponent));
                }
                if *log_exponent == 0.0 {
                    return write!(f, "{}", power_of(var.name(), *degree));
                }
                write!(
                    f,
                    "{} {}",
                    power_of(var.name(), *degree),
                    log_power(var.name(), *log_exponent)
                )
            }
            ComplexityKind::Exponential { base, var } => {
                write!(f, "{}^{}", format_exponent(*base), var)
            }
            ComplexityKind::Factorial(var) => write!(f, "{}!", var),
            ComplexityKind::Power { base, exponent } => {
                let rendered = format!("{}", base);
                let wrapped = if rendered.contains(' ') {
                    format!("({})", rendered)
                } else {
                    rendered
                };
                write!(f, "{}^{}", wrapped, format_exponent(*exponent))
            }
            ComplexityKind::InverseAckermann(var) => write!(f, "α({})", var),
            ComplexityKind::Binary { op, left, right } => match op {
                BinaryOp::Plus => {
                    write!(f, "{} + {}", left, right)
                }
                BinaryOp::Multiply => {
                    // Constant factors are asymptotically irrelevant.
                    if left.is_constant() {
                        return write_operand(f, right, true);
                    }
                    if right.is_constant() {
                        return write_operand(f, left, true);
                    }
                    write_operand(f, left, true)?;
                    write!(f, " · ")?;
                    write_operand(f, right, true)
                }
                BinaryOp::Max => write!(f, "max({}, {})", left, right),
                BinaryOp::Min => write!(f, "min({}, {})", left, right),
            },
            // A deferred integral renders through its conservative bound;
            // the symbolic payload is for the oracle, not the user.
            ComplexityKind::Integral { bound, .. } => write!(f, "{}", bound),
            ComplexityKind::Recurrence(rec) => write!(f, "T({})", rec.variable()),
            ComplexityKind::Amortized { amortized, .. } => write!(f, "{}", amortized),
            ComplexityKind::Memory(profile) => write!(f, "{}", profile.total),
        }
    }
}

impl Complexity {
    /// Render in Big-O notation: `O(1)`, `O(log n)`, `O(n log n)`, `O(n²)`…
    pub fn big_o(&self) -> String {
        format!("O({})", self)
    }

    /// Render in Theta notation, used by solver solutions.
    pub fn theta(&self) -> String {
        format!("Θ({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variable::Variable;

    fn n() -> Variable {
        Variable::n()
    }

    #[test]
    fn canonical_forms_render() {
        assert_eq!(Complexity::one().big_o(), "O(1)");
        assert_eq!(Complexity::variable(n()).big_o(), "O(n)");
        assert_eq!(Complexity::logarithmic(1.0, 2.0, n()).big_o(), "O(log n)");
        assert_eq!(Complexity::polylog(n(), 1.0, 1.0).big_o(), "O(n log n)");
        assert_eq!(
            Complexity::polynomial(n(), vec![(2, 1.0)]).big_o(),
            "O(n²)"
        );
        assert_eq!(Complexity::exponential(2.0, n()).big_o(), "O(2^n)");
        assert_eq!(Complexity::factorial(n()).big_o(), "O(n!)");
        assert_eq!(Complexity::inverse_ackermann(n()).big_o(), "O(α(n))");
    }

    #[test]
    fn fractional_exponents_render_with_three_decimals() {
        let e = Complexity::polylog(n(), 1.585, 0.0);
        assert_eq!(e.big_o(), "O(n^1.585)");
    }

    #[test]
    fn coefficients_are_dropped() {
        assert_eq!(Complexity::linear(3.0, n()).big_o(), "O(n)");
        assert_eq!(Complexity::logarithmic(7.0, 2.0, n()).big_o(), "O(log n)");
    }

    #[test]
    fn polynomial_renders_top_degree() {
        let e = Complexity::polynomial(n(), vec![(2, 0.5), (1, 0.5)]);
        assert_eq!(e.big_o(), "O(n²)");
    }

    #[test]
    fn products_and_sums_render_infix() {
        let m = Variable::named("m");
        let e = Complexity::multiply(Complexity::variable(n()), Complexity::variable(m.clone()));
        assert_eq!(e.big_o(), "O(m · n)");
        let s = Complexity::plus(Complexity::variable(n()), Complexity::variable(m));
        assert_eq!(s.big_o(), "O(m + n)");
    }

    #[test]
    fn log_squared_renders_superscript() {
        let e = Complexity::polylog(n(), 0.0, 2.0);
        assert_eq!(e.big_o(), "O(log² n)");
    }
}
