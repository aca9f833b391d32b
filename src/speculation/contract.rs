//! Complexity contract reader.
//!
//! Parses declared complexity bounds out of annotations
//! (`[Complexity("O(n log n)")]`) and doc-comment phrases. The grammar is
//! small: sums of products of the canonical factors (`1`, `n`, `log n`,
//! `log² n`, `n^p`, `2^n`, `n!`, `α(n)`), with `·`, `*` or juxtaposition
//! for products. Unicode superscripts produced by the renderer are
//! accepted, so rendering and parsing round-trip on the canonical forms.

use crate::core::error::AnalysisError;
use crate::core::expr::Complexity;
use crate::core::variable::Variable;
use crate::lang::Method;
use crate::simplification::simplify_expr;

/// Where a parsed contract came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSource {
    /// A `[Complexity("…")]` annotation.
    Annotation,
    /// A doc-comment phrase.
    DocComment,
}

/// A parsed complexity contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    /// The declared bound.
    pub complexity: Complexity,
    /// Annotation or doc comment.
    pub source: ContractSource,
}

/// Read a contract from a method's annotations, then its doc comment.
pub fn read_contract(method: &Method) -> Option<Contract> {
    for annotation in &method.annotations {
        if annotation.name == "Complexity" || annotation.name == "TimeComplexity" {
            if let Some(argument) = &annotation.argument {
                if let Ok(complexity) = parse_big_o(argument) {
                    return Some(Contract {
                        complexity,
                        source: ContractSource::Annotation,
                    });
                }
            }
        }
    }
    for line in &method.doc_comment {
        if let Some(complexity) = extract_from_prose(line) {
            return Some(Contract {
                complexity,
                source: ContractSource::DocComment,
            });
        }
    }
    None
}

/// Find and parse an `O(…)` group inside free prose.
pub fn extract_from_prose(text: &str) -> Option<Complexity> {
    let start = text.find("O(")?;
    let rest = &text[start..];
    let mut depth = 0usize;
    for (offset, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return parse_big_o(&rest[..=offset]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a Big-O string such as `O(n log n)` or bare `n^2`.
pub fn parse_big_o(input: &str) -> Result<Complexity, AnalysisError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptySource);
    }
    // Strip an O(…)/Θ(…) wrapper when present.
    let inner = trimmed
        .strip_prefix("O(")
        .or_else(|| trimmed.strip_prefix("Θ("))
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(trimmed);

    let tokens = tokenize(inner)?;
    let mut parser = ContractParser { tokens, pos: 0 };
    let expr = parser.parse_sum()?;
    if parser.pos != parser.tokens.len() {
        return Err(AnalysisError::invalid_contract(format!(
            "trailing input after complexity term in '{}'",
            inner
        )));
    }
    Ok(simplify_expr(expr))
}

#[derive(Debug, Clone, PartialEq)]
enum ContractToken {
    Number(f64),
    Word(String),
    Caret,
    Bang,
    Plus,
    Times,
    LParen,
    RParen,
}

const SUPERSCRIPTS: [(char, u32); 10] = [
    ('⁰', 0),
    ('¹', 1),
    ('²', 2),
    ('³', 3),
    ('⁴', 4),
    ('⁵', 5),
    ('⁶', 6),
    ('⁷', 7),
    ('⁸', 8),
    ('⁹', 9),
];

fn superscript_value(c: char) -> Option<u32> {
    SUPERSCRIPTS
        .iter()
        .find(|(s, _)| *s == c)
        .map(|&(_, v)| v)
}

fn tokenize(input: &str) -> Result<Vec<ContractToken>, AnalysisError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        match c {
            ' ' | '\t' => pos += 1,
            '^' => {
                tokens.push(ContractToken::Caret);
                pos += 1;
            }
            '!' => {
                tokens.push(ContractToken::Bang);
                pos += 1;
            }
            '+' => {
                tokens.push(ContractToken::Plus);
                pos += 1;
            }
            '*' | '·' | '×' => {
                tokens.push(ContractToken::Times);
                pos += 1;
            }
            '(' => {
                tokens.push(ContractToken::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(ContractToken::RParen);
                pos += 1;
            }
            c if c.is_ascii_digit() => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| AnalysisError::invalid_number(text))?;
                tokens.push(ContractToken::Number(value));
            }
            c if superscript_value(c).is_some() => {
                // A superscript is an inline exponent.
                let mut value = 0u32;
                while pos < chars.len() {
                    match superscript_value(chars[pos]) {
                        Some(digit) => {
                            value = value * 10 + digit;
                            pos += 1;
                        }
                        None => break,
                    }
                }
                tokens.push(ContractToken::Caret);
                tokens.push(ContractToken::Number(f64::from(value)));
            }
            c if c.is_alphabetic() => {
                // Superscript digits count as alphanumeric in Unicode but
                // are exponents here, never part of a name.
                let start = pos;
                while pos < chars.len()
                    && chars[pos].is_alphanumeric()
                    && superscript_value(chars[pos]).is_none()
                {
                    pos += 1;
                }
                tokens.push(ContractToken::Word(chars[start..pos].iter().collect()));
            }
            other => {
                return Err(AnalysisError::invalid_token(other.to_string()));
            }
        }
    }
    Ok(tokens)
}

struct ContractParser {
    tokens: Vec<ContractToken>,
    pos: usize,
}

impl ContractParser {
    fn peek(&self) -> Option<&ContractToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<ContractToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_sum(&mut self) -> Result<Complexity, AnalysisError> {
        let mut acc = self.parse_product()?;
        while matches!(self.peek(), Some(ContractToken::Plus)) {
            self.advance();
            let rhs = self.parse_product()?;
            acc = Complexity::plus(acc, rhs);
        }
        Ok(acc)
    }

    fn parse_product(&mut self) -> Result<Complexity, AnalysisError> {
        let mut acc = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(ContractToken::Times) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    acc = Complexity::multiply(acc, rhs);
                }
                // Juxtaposition: `n log n`.
                Some(ContractToken::Word(_)) | Some(ContractToken::Number(_))
                | Some(ContractToken::LParen) => {
                    let rhs = self.parse_factor()?;
                    acc = Complexity::multiply(acc, rhs);
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn parse_factor(&mut self) -> Result<Complexity, AnalysisError> {
        match self.advance() {
            Some(ContractToken::Number(value)) => {
                // `2^n` is exponential; a bare number is constant.
                if matches!(self.peek(), Some(ContractToken::Caret)) {
                    self.advance();
                    match self.advance() {
                        Some(ContractToken::Word(var)) => {
                            Ok(Complexity::exponential(value, Variable::named(&var)))
                        }
                        Some(ContractToken::Number(exponent)) => {
                            Ok(Complexity::constant(value.powf(exponent)))
                        }
                        _ => Err(AnalysisError::UnexpectedEndOfInput),
                    }
                } else {
                    Ok(Complexity::constant(value))
                }
            }
            Some(ContractToken::Word(word)) if word == "log" || word == "lg" || word == "ln" => {
                // log^j n / log n / log(n)
                let exponent = if matches!(self.peek(), Some(ContractToken::Caret)) {
                    self.advance();
                    match self.advance() {
                        Some(ContractToken::Number(j)) => j,
                        _ => return Err(AnalysisError::UnexpectedEndOfInput),
                    }
                } else {
                    1.0
                };
                let var = match self.advance() {
                    Some(ContractToken::Word(var)) => Variable::named(&var),
                    Some(ContractToken::LParen) => {
                        let inner = match self.advance() {
                            Some(ContractToken::Word(var)) => Variable::named(&var),
                            _ => return Err(AnalysisError::UnexpectedEndOfInput),
                        };
                        if !matches!(self.advance(), Some(ContractToken::RParen)) {
                            return Err(AnalysisError::invalid_contract(
                                "unclosed parenthesis after log",
                            ));
                        }
                        inner
                    }
                    _ => return Err(AnalysisError::UnexpectedEndOfInput),
                };
                Ok(Complexity::polylog(var, 0.0, exponent))
            }
            Some(ContractToken::Word(word)) if word == "sqrt" => {
                if !matches!(self.advance(), Some(ContractToken::LParen)) {
                    return Err(AnalysisError::invalid_contract("sqrt needs parentheses"));
                }
                let var = match self.advance() {
                    Some(ContractToken::Word(var)) => Variable::named(&var),
                    _ => return Err(AnalysisError::UnexpectedEndOfInput),
                };
                if !matches!(self.advance(), Some(ContractToken::RParen)) {
                    return Err(AnalysisError::invalid_contract("unclosed sqrt"));
                }
                Ok(Complexity::polylog(var, 0.5, 0.0))
            }
            Some(ContractToken::Word(word)) if word == "α" || word == "alpha" => {
                if matches!(self.peek(), Some(ContractToken::LParen)) {
                    self.advance();
                    let var = match self.advance() {
                        Some(ContractToken::Word(var)) => Variable::named(&var),
                        _ => return Err(AnalysisError::UnexpectedEndOfInput),
                    };
                    if !matches!(self.advance(), Some(ContractToken::RParen)) {
                        return Err(AnalysisError::invalid_contract("unclosed α"));
                    }
                    Ok(Complexity::inverse_ackermann(var))
                } else {
                    Ok(Complexity::inverse_ackermann(Variable::n()))
                }
            }
            Some(ContractToken::Word(word)) => {
                let var = Variable::named(&word);
                // n! / n^p / bare n
                match self.peek() {
                    Some(ContractToken::Bang) => {
                        self.advance();
                        Ok(Complexity::factorial(var))
                    }
                    Some(ContractToken::Caret) => {
                        self.advance();
                        match self.advance() {
                            Some(ContractToken::Number(p)) => {
                                Ok(Complexity::polylog(var, p, 0.0))
                            }
                            Some(ContractToken::Word(exp_var)) if exp_var == var.name() => {
                                // n^n: dominated by factorial; keep it
                                // conservative.
                                Ok(Complexity::factorial(var))
                            }
                            _ => Err(AnalysisError::UnexpectedEndOfInput),
                        }
                    }
                    _ => Ok(Complexity::variable(var)),
                }
            }
            Some(ContractToken::LParen) => {
                let inner = self.parse_sum()?;
                if !matches!(self.advance(), Some(ContractToken::RParen)) {
                    return Err(AnalysisError::invalid_contract("unclosed parenthesis"));
                }
                Ok(inner)
            }
            Some(other) => Err(AnalysisError::invalid_contract(format!(
                "unexpected token {:?}",
                other
            ))),
            None => Err(AnalysisError::UnexpectedEndOfInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms_round_trip() {
        let n = Variable::n();
        let cases = vec![
            Complexity::one(),
            Complexity::logarithmic(1.0, 2.0, n.clone()),
            Complexity::variable(n.clone()),
            Complexity::polylog(n.clone(), 1.0, 1.0),
            Complexity::polynomial(n.clone(), vec![(2, 1.0)]),
            Complexity::polylog(n.clone(), 1.585, 0.0),
            Complexity::exponential(2.0, n.clone()),
            Complexity::factorial(n.clone()),
        ];
        for expected in cases {
            let rendered = expected.big_o();
            let parsed = parse_big_o(&rendered).unwrap_or_else(|e| {
                panic!("failed to parse {}: {}", rendered, e)
            });
            assert_eq!(parsed.big_o(), rendered, "round trip through {}", rendered);
        }
    }

    #[test]
    fn parses_spaced_products() {
        assert_eq!(parse_big_o("O(n log n)").unwrap().big_o(), "O(n log n)");
        assert_eq!(parse_big_o("n * log n").unwrap().big_o(), "O(n log n)");
    }

    #[test]
    fn parses_caret_and_superscript_powers() {
        assert_eq!(parse_big_o("O(n^2)").unwrap().big_o(), "O(n²)");
        assert_eq!(parse_big_o("O(n²)").unwrap().big_o(), "O(n²)");
        assert_eq!(parse_big_o("O(n^2.5)").unwrap().big_o(), "O(n^2.5)");
    }

    #[test]
    fn parses_sums_to_dominant_term() {
        assert_eq!(parse_big_o("O(n² + n log n)").unwrap().big_o(), "O(n²)");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_big_o("O(#!)").is_err());
        assert!(parse_big_o("").is_err());
    }

    #[test]
    fn extracts_from_prose() {
        let found =
            extract_from_prose("Runs in O(n log n) time in the worst case.").unwrap();
        assert_eq!(found.big_o(), "O(n log n)");
        assert!(extract_from_prose("no bound stated here").is_none());
    }

    #[test]
    fn reads_annotation_contract() {
        let file = crate::lang::parse_source(
            "[Complexity(\"O(n log n)\")]\nvoid sort(int[] a) { }",
        );
        let contract = read_contract(&file.methods[0]).unwrap();
        assert_eq!(contract.source, ContractSource::Annotation);
        assert_eq!(contract.complexity.big_o(), "O(n log n)");
    }

    #[test]
    fn reads_doc_comment_contract() {
        let file = crate::lang::parse_source(
            "/// Amortized O(1), worst case O(n).\nvoid add(int x) { }",
        );
        let contract = read_contract(&file.methods[0]).unwrap();
        assert_eq!(contract.source, ContractSource::DocComment);
        assert_eq!(contract.complexity.big_o(), "O(1)");
    }
}
