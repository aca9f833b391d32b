//! Lexer for the analyzed source language.
//!
//! Single-pass scanner producing spanned tokens. Comments are not
//! discarded: they are collected as trivia (the speculative layer reads
//! TODO-family markers and doc-comment contracts out of them). Unknown
//! characters produce a diagnostic and are skipped — lexing never fails.

use crate::core::error::{Diagnostic, Span};
use crate::lang::ast::Comment;

/// A spanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// Source span.
    pub span: Span,
}

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword-free word.
    Ident(String),
    /// Integer literal.
    Int(i64),
    /// Floating literal.
    Float(f64),
    /// String literal (without quotes).
    Str(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<<=`
    ShlEq,
    /// `>>=`
    ShrEq,
    /// `=>`
    FatArrow,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short text for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Int(v) => format!("'{}'", v),
            TokenKind::Float(v) => format!("'{}'", v),
            TokenKind::Str(_) => "string literal".to_owned(),
            TokenKind::Eof => "end of input".to_owned(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semi => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Bang => "!",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::FatArrow => "=>",
            _ => "?",
        }
    }
}

/// Lexer output: tokens, trivia and recovery diagnostics.
#[derive(Debug, Default)]
pub struct LexOutput {
    /// The token stream, ending with `Eof`.
    pub tokens: Vec<Token>,
    /// Retained comments.
    pub comments: Vec<Comment>,
    /// Skipped-character diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan `input` into tokens and trivia.
pub fn lex(input: &str) -> LexOutput {
    let bytes = input.as_bytes();
    let mut out = LexOutput::default();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let c = bytes[pos] as char;

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                pos += 1;
            }
            '/' if bytes.get(pos + 1) == Some(&b'/') => {
                let doc = bytes.get(pos + 2) == Some(&b'/');
                let mut end = pos;
                while end < bytes.len() && bytes[end] != b'\n' {
                    end += 1;
                }
                let body_start = if doc { pos + 3 } else { pos + 2 };
                out.comments.push(Comment {
                    text: input[body_start.min(end)..end].trim().to_owned(),
                    span: Span::new(pos, end),
                    doc,
                });
                pos = end;
            }
            '/' if bytes.get(pos + 1) == Some(&b'*') => {
                let mut end = pos + 2;
                while end + 1 < bytes.len() && !(bytes[end] == b'*' && bytes[end + 1] == b'/') {
                    end += 1;
                }
                let close = (end + 2).min(bytes.len());
                out.comments.push(Comment {
                    text: input[pos + 2..end.min(bytes.len())].trim().to_owned(),
                    span: Span::new(pos, close),
                    doc: false,
                });
                pos = close;
            }
            '"' => {
                let mut end = pos + 1;
                while end < bytes.len() && bytes[end] != b'"' {
                    if bytes[end] == b'\\' {
                        end += 1;
                    }
                    end += 1;
                }
                let close = (end + 1).min(bytes.len());
                out.tokens.push(Token {
                    kind: TokenKind::Str(input[pos + 1..end.min(bytes.len())].to_owned()),
                    span: Span::new(pos, close),
                });
                pos = close;
            }
            c if c.is_ascii_digit() => {
                let mut end = pos;
                let mut is_float = false;
                while end < bytes.len() {
                    let b = bytes[end] as char;
                    if b.is_ascii_digit() {
                        end += 1;
                    } else if b == '.'
                        && !is_float
                        && bytes.get(end + 1).is_some_and(|n| (*n as char).is_ascii_digit())
                    {
                        is_float = true;
                        end += 1;
                    } else {
                        break;
                    }
                }
                let text = &input[pos..end];
                let kind = if is_float {
                    text.parse::<f64>().map(TokenKind::Float).map_err(|_| ())
                } else {
                    text.parse::<i64>().map(TokenKind::Int).map_err(|_| ())
                };
                match kind {
                    Ok(kind) => out.tokens.push(Token {
                        kind,
                        span: Span::new(pos, end),
                    }),
                    Err(_) => out.diagnostics.push(Diagnostic::error(
                        format!("invalid numeric literal '{}'", text),
                        Span::new(pos, end),
                    )),
                }
                pos = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while end < bytes.len() {
                    let b = bytes[end] as char;
                    if b.is_ascii_alphanumeric() || b == '_' {
                        end += 1;
                    } else {
                        break;
                    }
                }
                out.tokens.push(Token {
                    kind: TokenKind::Ident(input[pos..end].to_owned()),
                    span: Span::new(pos, end),
                });
                pos = end;
            }
            _ => {
                let (kind, len) = match (
                    c,
                    bytes.get(pos + 1).map(|b| *b as char),
                    bytes.get(pos + 2).map(|b| *b as char),
                ) {
                    ('<', Some('<'), Some('=')) => (Some(TokenKind::ShlEq), 3),
                    ('>', Some('>'), Some('=')) => (Some(TokenKind::ShrEq), 3),
                    ('<', Some('<'), _) => (Some(TokenKind::Shl), 2),
                    ('>', Some('>'), _) => (Some(TokenKind::Shr), 2),
                    ('=', Some('='), _) => (Some(TokenKind::EqEq), 2),
                    ('=', Some('>'), _) => (Some(TokenKind::FatArrow), 2),
                    ('!', Some('='), _) => (Some(TokenKind::NotEq), 2),
                    ('<', Some('='), _) => (Some(TokenKind::Le), 2),
                    ('>', Some('='), _) => (Some(TokenKind::Ge), 2),
                    ('&', Some('&'), _) => (Some(TokenKind::AndAnd), 2),
                    ('|', Some('|'), _) => (Some(TokenKind::OrOr), 2),
                    ('+', Some('+'), _) => (Some(TokenKind::PlusPlus), 2),
                    ('-', Some('-'), _) => (Some(TokenKind::MinusMinus), 2),
                    ('+', Some('='), _) => (Some(TokenKind::PlusEq), 2),
                    ('-', Some('='), _) => (Some(TokenKind::MinusEq), 2),
                    ('*', Some('='), _) => (Some(TokenKind::StarEq), 2),
                    ('/', Some('='), _) => (Some(TokenKind::SlashEq), 2),
                    ('%', Some('='), _) => (Some(TokenKind::PercentEq), 2),
                    ('(', _, _) => (Some(TokenKind::LParen), 1),
                    (')', _, _) => (Some(TokenKind::RParen), 1),
                    ('{', _, _) => (Some(TokenKind::LBrace), 1),
                    ('}', _, _) => (Some(TokenKind::RBrace), 1),
                    ('[', _, _) => (Some(TokenKind::LBracket), 1),
                    (']', _, _) => (Some(TokenKind::RBracket), 1),
                    (';', _, _) => (Some(TokenKind::Semi), 1),
                    (',', _, _) => (Some(TokenKind::Comma), 1),
                    ('.', _, _) => (Some(TokenKind::Dot), 1),
                    ('+', _, _) => (Some(TokenKind::Plus), 1),
                    ('-', _, _) => (Some(TokenKind::Minus), 1),
                    ('*', _, _) => (Some(TokenKind::Star), 1),
                    ('/', _, _) => (Some(TokenKind::Slash), 1),
                    ('%', _, _) => (Some(TokenKind::Percent), 1),
                    ('=', _, _) => (Some(TokenKind::Eq), 1),
                    ('<', _, _) => (Some(TokenKind::Lt), 1),
                    ('>', _, _) => (Some(TokenKind::Gt), 1),
                    ('!', _, _) => (Some(TokenKind::Bang), 1),
                    _ => (None, 1),
                };
                match kind {
                    Some(kind) => out.tokens.push(Token {
                        kind,
                        span: Span::new(start, start + len),
                    }),
                    None => out.diagnostics.push(Diagnostic::warning(
                        format!("skipped unexpected character '{}'", c),
                        Span::at(start),
                    )),
                }
                pos += len;
            }
        }
    }

    out.tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::at(input.len()),
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_compound_operators_longest_first() {
        assert_eq!(
            kinds("<<= << <= <"),
            vec![
                TokenKind::ShlEq,
                TokenKind::Shl,
                TokenKind::Le,
                TokenKind::Lt,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn retains_comments_as_trivia() {
        let out = lex("int x = 1; // TODO: widen\n/* block */");
        assert_eq!(out.comments.len(), 2);
        assert!(out.comments[0].has_incomplete_marker());
        assert!(!out.comments[0].doc);
    }

    #[test]
    fn doc_comments_are_flagged() {
        let out = lex("/// Runs in O(n log n) time.\nvoid f() {}");
        assert_eq!(out.comments.len(), 1);
        assert!(out.comments[0].doc);
        assert!(out.comments[0].text.contains("O(n log n)"));
    }

    #[test]
    fn unknown_characters_are_skipped_with_diagnostics() {
        let out = lex("int x = 1 @ 2;");
        assert_eq!(out.diagnostics.len(), 1);
        // Lexing continued past the bad character.
        assert!(out.tokens.len() > 4);
    }

    #[test]
    fn numbers_scan_as_int_and_float() {
        assert_eq!(
            kinds("42 3.5"),
            vec![TokenKind::Int(42), TokenKind::Float(3.5), TokenKind::Eof]
        );
    }
}
