//! Recovery parser for the analyzed source language.
//!
//! Parsing never fails: malformed regions produce `Diagnostic`s and
//! `Error` placeholder nodes, then the parser resynchronizes at the next
//! `;` or `}`. Incomplete text (unbalanced braces, missing expressions)
//! yields a partial tree the speculative layer can still classify.

use crate::core::error::{Diagnostic, Span};
use crate::lang::ast::{
    Annotation, AssignOp, BinOp, Block, Comment, Expr, Interface, Method, MethodSignature,
    Modifiers, Param, SourceFile, Stmt, UnaryOp,
};
use crate::lang::lexer::{lex, Token, TokenKind};

/// Parse a compilation unit. Never fails; an empty or hopeless input
/// yields an empty file with diagnostics.
pub fn parse_source(input: &str) -> SourceFile {
    let lexed = lex(input);
    let mut parser = Parser {
        tokens: lexed.tokens,
        pos: 0,
        diagnostics: lexed.diagnostics,
    };
    let mut file = parser.parse_file();
    file.comments = lexed.comments;
    file.diagnostics = parser.diagnostics;
    attach_doc_comments(&mut file);
    file
}

/// Attach `///` trivia to the method that follows it.
fn attach_doc_comments(file: &mut SourceFile) {
    let comments: Vec<Comment> = file.comments.clone();
    let mut previous_end = 0usize;
    for method in &mut file.methods {
        let start = method.span.start();
        method.doc_comment = comments
            .iter()
            .filter(|c| c.doc && c.span.start() >= previous_end && c.span.end() <= start)
            .map(|c| c.text.clone())
            .collect();
        previous_end = method.span.end();
    }
}

const MODIFIER_WORDS: [&str; 9] = [
    "public", "private", "protected", "internal", "static", "abstract", "virtual", "override",
    "sealed",
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) -> TokenKind {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].kind.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_word() == Some(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            TokenKind::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }

    fn peek_word_at(&self, offset: usize) -> Option<&str> {
        match self.peek_at(offset) {
            TokenKind::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Expect a token; on mismatch record a diagnostic and do not consume.
    fn expect(&mut self, kind: &TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.diagnostics.push(Diagnostic::error(
            format!(
                "expected {} but found {}",
                kind.describe(),
                self.peek().describe()
            ),
            self.span(),
        ));
        false
    }

    // -------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------

    fn parse_file(&mut self) -> SourceFile {
        let mut file = SourceFile::default();
        while !self.at_eof() {
            self.parse_top_level(&mut file);
        }
        file
    }

    fn parse_top_level(&mut self, file: &mut SourceFile) {
        if self.eat_word("class") {
            // class Name { members }
            if matches!(self.peek(), TokenKind::Ident(_)) {
                self.advance();
            }
            if self.eat(&TokenKind::LBrace) {
                while !self.at_eof() && !self.eat(&TokenKind::RBrace) {
                    self.parse_top_level(file);
                }
            }
            return;
        }

        if self.peek_word() == Some("interface") {
            self.advance();
            if let Some(interface) = self.parse_interface() {
                file.interfaces.push(interface);
            }
            return;
        }

        let annotations = self.parse_annotations();
        let modifiers = self.parse_modifiers();

        if let Some(method) = self.parse_method(annotations, modifiers) {
            file.methods.push(method);
            return;
        }

        // A field declaration (`int count = 0;`): skip it quietly.
        if matches!(self.peek(), TokenKind::Ident(_))
            && matches!(self.peek_at(1), TokenKind::Ident(_))
            && matches!(self.peek_at(2), TokenKind::Eq | TokenKind::Semi)
        {
            self.recover_to_boundary();
            return;
        }

        // Nothing recognizable at this position: skip one token.
        if !self.at_eof() {
            let span = self.span();
            let token = self.advance();
            self.diagnostics.push(Diagnostic::error(
                format!("unexpected {} at top level", token.describe()),
                span,
            ));
        }
    }

    fn parse_interface(&mut self) -> Option<Interface> {
        let TokenKind::Ident(name) = self.advance() else {
            self.diagnostics.push(Diagnostic::error(
                "expected interface name".to_owned(),
                self.span(),
            ));
            return None;
        };
        let mut members = Vec::new();
        if self.eat(&TokenKind::LBrace) {
            while !self.at_eof() && !self.eat(&TokenKind::RBrace) {
                // Type Name(params);
                if let Some(signature) = self.parse_signature() {
                    members.push(signature);
                } else {
                    self.advance();
                }
            }
        }
        Some(Interface { name, members })
    }

    fn parse_signature(&mut self) -> Option<MethodSignature> {
        // Two identifiers then a parenthesized list ending in `;`.
        if !matches!(self.peek(), TokenKind::Ident(_)) {
            return None;
        }
        self.advance(); // return type
        if self.eat(&TokenKind::LBracket) {
            self.eat(&TokenKind::RBracket);
        }
        let TokenKind::Ident(name) = self.advance() else {
            return None;
        };
        if !self.eat(&TokenKind::LParen) {
            return None;
        }
        let params = self.parse_params();
        self.eat(&TokenKind::Semi);
        Some(MethodSignature {
            name,
            arity: params.len(),
        })
    }

    fn parse_annotations(&mut self) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        while matches!(self.peek(), TokenKind::LBracket)
            && matches!(self.peek_at(1), TokenKind::Ident(_))
        {
            self.advance(); // [
            let TokenKind::Ident(name) = self.advance() else {
                break;
            };
            let mut argument = None;
            if self.eat(&TokenKind::LParen) {
                if let TokenKind::Str(text) = self.peek().clone() {
                    self.advance();
                    argument = Some(text);
                }
                self.expect(&TokenKind::RParen);
            }
            self.expect(&TokenKind::RBracket);
            annotations.push(Annotation { name, argument });
        }
        annotations
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            let Some(word) = self.peek_word() else { break };
            if !MODIFIER_WORDS.contains(&word) && word != "async" {
                break;
            }
            // A modifier word followed by `(` is actually a call.
            if matches!(self.peek_at(1), TokenKind::LParen) {
                break;
            }
            match word {
                "abstract" => modifiers.is_abstract = true,
                "virtual" => modifiers.is_virtual = true,
                "sealed" => modifiers.is_sealed = true,
                "async" => modifiers.is_async = true,
                "static" => modifiers.is_static = true,
                _ => {}
            }
            self.advance();
        }
        modifiers
    }

    /// `[Type] name(params) { body }` / `=> expr;` / `;` (abstract).
    fn parse_method(
        &mut self,
        annotations: Vec<Annotation>,
        modifiers: Modifiers,
    ) -> Option<Method> {
        let start = self.span();

        let (return_type, name) = self.parse_declarator()?;

        self.expect(&TokenKind::LParen);
        let params = self.parse_params();

        let body = if self.eat(&TokenKind::FatArrow) {
            // Expression-bodied member: => expr;
            let expr_span = self.span();
            let value = self.parse_expr();
            self.eat(&TokenKind::Semi);
            Block {
                statements: vec![Stmt::Return {
                    value: Some(value),
                    span: expr_span.join(self.span()),
                }],
                span: expr_span.join(self.span()),
            }
        } else if self.eat(&TokenKind::Semi) {
            // Abstract or interface-style declaration.
            Block::default()
        } else {
            self.parse_block()
        };

        Some(Method {
            name,
            return_type,
            params,
            body,
            modifiers,
            annotations,
            doc_comment: Vec::new(),
            span: start.join(self.span()),
        })
    }

    /// `Type name` or bare `name` before a parameter list.
    fn parse_declarator(&mut self) -> Option<(Option<String>, String)> {
        let TokenKind::Ident(first) = self.peek().clone() else {
            return None;
        };
        // `name(` — no return type.
        if matches!(self.peek_at(1), TokenKind::LParen) {
            self.advance();
            return Some((None, first));
        }
        // `Type name(` or `Type[] name(`
        let mut offset = 1;
        let mut type_name = first.clone();
        if matches!(self.peek_at(1), TokenKind::LBracket)
            && matches!(self.peek_at(2), TokenKind::RBracket)
        {
            type_name.push_str("[]");
            offset = 3;
        }
        if let TokenKind::Ident(name) = self.peek_at(offset).clone() {
            if matches!(self.peek_at(offset + 1), TokenKind::LParen) {
                for _ in 0..=offset {
                    self.advance();
                }
                return Some((Some(type_name), name));
            }
        }
        None
    }

    /// Parameter list after `(`, consuming the closing `)`.
    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return params;
        }
        loop {
            if self.at_eof() {
                break;
            }
            let TokenKind::Ident(mut type_name) = self.peek().clone() else {
                self.diagnostics.push(Diagnostic::error(
                    format!("expected parameter type, found {}", self.peek().describe()),
                    self.span(),
                ));
                break;
            };
            self.advance();
            if self.eat(&TokenKind::LBracket) {
                self.eat(&TokenKind::RBracket);
                type_name.push_str("[]");
            }
            let name = match self.peek().clone() {
                TokenKind::Ident(name) => {
                    self.advance();
                    name
                }
                // Untyped parameter: the single word was the name.
                _ => std::mem::take(&mut type_name),
            };
            let type_name = if type_name.is_empty() {
                "var".to_owned()
            } else {
                type_name
            };
            params.push(Param { type_name, name });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        params
    }

    // -------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------

    fn parse_block(&mut self) -> Block {
        let start = self.span();
        let mut statements = Vec::new();
        if !self.expect(&TokenKind::LBrace) {
            return Block {
                statements,
                span: start,
            };
        }
        while !self.at_eof() && !self.eat(&TokenKind::RBrace) {
            statements.push(self.parse_stmt());
        }
        Block {
            statements,
            span: start.join(self.span()),
        }
    }

    fn parse_stmt(&mut self) -> Stmt {
        let start = self.span();
        match self.peek_word() {
            Some("if") => return self.parse_if(),
            Some("while") => return self.parse_while(),
            Some("do") => return self.parse_do_while(),
            Some("for") => return self.parse_for(),
            Some("foreach") => return self.parse_foreach(),
            Some("return") => {
                self.advance();
                let value = if matches!(self.peek(), TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.eat(&TokenKind::Semi);
                return Stmt::Return {
                    value,
                    span: start.join(self.span()),
                };
            }
            Some("throw") => {
                self.advance();
                let value = self.parse_expr();
                self.eat(&TokenKind::Semi);
                return Stmt::Throw {
                    value,
                    span: start.join(self.span()),
                };
            }
            Some("break") => {
                self.advance();
                self.eat(&TokenKind::Semi);
                return Stmt::Break { span: start };
            }
            Some("continue") => {
                self.advance();
                self.eat(&TokenKind::Semi);
                return Stmt::Continue { span: start };
            }
            _ => {}
        }

        if matches!(self.peek(), TokenKind::LBrace) {
            return Stmt::Block(self.parse_block());
        }

        if let Some(stmt) = self.try_parse_local(start) {
            return stmt;
        }

        // Expression statement, with resynchronization on failure.
        let before = self.pos;
        let expr = self.parse_expr();
        if matches!(expr, Expr::Error) && self.pos == before {
            self.recover_to_boundary();
            return Stmt::Error {
                span: start.join(self.span()),
            };
        }
        self.eat(&TokenKind::Semi);
        Stmt::Expr {
            expr,
            span: start.join(self.span()),
        }
    }

    /// `Type name [= init];` / `var name = init;`
    fn try_parse_local(&mut self, start: Span) -> Option<Stmt> {
        let TokenKind::Ident(first) = self.peek().clone() else {
            return None;
        };
        let (ty, name, consumed) = if first == "var" {
            let TokenKind::Ident(name) = self.peek_at(1).clone() else {
                return None;
            };
            (None, name, 2)
        } else {
            let mut type_name = first;
            let mut offset = 1;
            if matches!(self.peek_at(1), TokenKind::LBracket)
                && matches!(self.peek_at(2), TokenKind::RBracket)
            {
                type_name.push_str("[]");
                offset = 3;
            }
            let TokenKind::Ident(name) = self.peek_at(offset).clone() else {
                return None;
            };
            // Must look like a declaration, not `a b` garbage: the next
            // token has to be `=` or `;`.
            if !matches!(self.peek_at(offset + 1), TokenKind::Eq | TokenKind::Semi) {
                return None;
            }
            (Some(type_name), name, offset + 1)
        };
        for _ in 0..consumed {
            self.advance();
        }
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expr())
        } else {
            None
        };
        self.eat(&TokenKind::Semi);
        Some(Stmt::Local {
            ty,
            name,
            init,
            span: start.join(self.span()),
        })
    }

    fn parse_if(&mut self) -> Stmt {
        let start = self.span();
        self.advance(); // if
        self.expect(&TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen);
        let then_branch = self.parse_branch_body();
        let else_branch = if self.eat_word("else") {
            if self.peek_word() == Some("if") {
                let nested = self.parse_if();
                let span = nested.span();
                Some(Block {
                    statements: vec![nested],
                    span,
                })
            } else {
                Some(self.parse_branch_body())
            }
        } else {
            None
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: start.join(self.span()),
        }
    }

    /// A braced block or a single statement promoted to one.
    fn parse_branch_body(&mut self) -> Block {
        if matches!(self.peek(), TokenKind::LBrace) {
            self.parse_block()
        } else {
            let stmt = self.parse_stmt();
            let span = stmt.span();
            Block {
                statements: vec![stmt],
                span,
            }
        }
    }

    fn parse_while(&mut self) -> Stmt {
        let start = self.span();
        self.advance(); // while
        self.expect(&TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen);
        let body = self.parse_branch_body();
        Stmt::While {
            cond,
            body,
            span: start.join(self.span()),
        }
    }

    fn parse_do_while(&mut self) -> Stmt {
        let start = self.span();
        self.advance(); // do
        let body = self.parse_branch_body();
        self.eat_word("while");
        self.expect(&TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen);
        self.eat(&TokenKind::Semi);
        Stmt::DoWhile {
            body,
            cond,
            span: start.join(self.span()),
        }
    }

    fn parse_for(&mut self) -> Stmt {
        let start = self.span();
        self.advance(); // for
        self.expect(&TokenKind::LParen);

        let init = if self.eat(&TokenKind::Semi) {
            None
        } else {
            let init_span = self.span();
            let stmt = self
                .try_parse_local(init_span)
                .unwrap_or_else(|| {
                    let expr = self.parse_expr();
                    self.eat(&TokenKind::Semi);
                    Stmt::Expr {
                        expr,
                        span: init_span.join(self.span()),
                    }
                });
            Some(Box::new(stmt))
        };

        let cond = if matches!(self.peek(), TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.eat(&TokenKind::Semi);

        let update = if matches!(self.peek(), TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&TokenKind::RParen);

        let body = self.parse_branch_body();
        Stmt::For {
            init,
            cond,
            update,
            body,
            span: start.join(self.span()),
        }
    }

    fn parse_foreach(&mut self) -> Stmt {
        let start = self.span();
        self.advance(); // foreach
        self.expect(&TokenKind::LParen);
        // (var|Type) name in expr — the element type is optional.
        if matches!(self.peek(), TokenKind::Ident(_))
            && matches!(self.peek_at(1), TokenKind::Ident(_))
            && self.peek_word_at(1) != Some("in")
        {
            self.advance();
        }
        let var_name = match self.advance() {
            TokenKind::Ident(name) => name,
            _ => "item".to_owned(),
        };
        self.eat_word("in");
        let iterable = self.parse_expr();
        self.expect(&TokenKind::RParen);
        let body = self.parse_branch_body();
        Stmt::ForEach {
            var_name,
            iterable,
            body,
            span: start.join(self.span()),
        }
    }

    /// Skip forward to the next statement boundary.
    fn recover_to_boundary(&mut self) {
        while !self.at_eof() {
            match self.peek() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // Expressions (precedence climbing)
    // -------------------------------------------------------------------

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let target = self.parse_binary(0);
        let op = match self.peek() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            TokenKind::PercentEq => Some(AssignOp::Mod),
            TokenKind::ShlEq => Some(AssignOp::Shl),
            TokenKind::ShrEq => Some(AssignOp::Shr),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let value = self.parse_assignment();
                Expr::Assign {
                    target: Box::new(target),
                    op,
                    value: Box::new(value),
                }
            }
            None => target,
        }
    }

    fn binary_op(&self) -> Option<(BinOp, u8)> {
        let (op, bp) = match self.peek() {
            TokenKind::OrOr => (BinOp::Or, 1),
            TokenKind::AndAnd => (BinOp::And, 2),
            TokenKind::EqEq => (BinOp::Eq, 3),
            TokenKind::NotEq => (BinOp::Ne, 3),
            TokenKind::Lt => (BinOp::Lt, 4),
            TokenKind::Le => (BinOp::Le, 4),
            TokenKind::Gt => (BinOp::Gt, 4),
            TokenKind::Ge => (BinOp::Ge, 4),
            TokenKind::Shl => (BinOp::Shl, 5),
            TokenKind::Shr => (BinOp::Shr, 5),
            TokenKind::Plus => (BinOp::Add, 6),
            TokenKind::Minus => (BinOp::Sub, 6),
            TokenKind::Star => (BinOp::Mul, 7),
            TokenKind::Slash => (BinOp::Div, 7),
            TokenKind::Percent => (BinOp::Mod, 7),
            _ => return None,
        };
        Some((op, bp))
    }

    fn parse_binary(&mut self, min_bp: u8) -> Expr {
        let mut left = self.parse_unary();
        while let Some((op, bp)) = self.binary_op() {
            if bp < min_bp {
                break;
            }
            self.advance();
            let right = self.parse_binary(bp + 1);
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.parse_unary()),
                }
            }
            TokenKind::Bang => {
                self.advance();
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(self.parse_unary()),
                }
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = matches!(self.peek(), TokenKind::PlusPlus);
                self.advance();
                Expr::IncDec {
                    target: Box::new(self.parse_unary()),
                    increment,
                }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name = match self.advance() {
                        TokenKind::Ident(name) => name,
                        other => {
                            self.diagnostics.push(Diagnostic::error(
                                format!("expected member name, found {}", other.describe()),
                                self.span(),
                            ));
                            return Expr::Error;
                        }
                    };
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_args();
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr();
                    self.expect(&TokenKind::RBracket);
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let increment = matches!(self.peek(), TokenKind::PlusPlus);
                    self.advance();
                    expr = Expr::IncDec {
                        target: Box::new(expr),
                        increment,
                    };
                }
                _ => break,
            }
        }
        expr
    }

    /// Arguments after `(`, consuming the closing `)`.
    fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return args;
        }
        loop {
            if self.at_eof() {
                break;
            }
            args.push(self.parse_expr());
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        args
    }

    fn parse_primary(&mut self) -> Expr {
        match self.peek().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Expr::IntLit(value)
            }
            TokenKind::Float(value) => {
                self.advance();
                Expr::FloatLit(value)
            }
            TokenKind::Str(value) => {
                self.advance();
                Expr::StringLit(value)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen);
                inner
            }
            TokenKind::Ident(name) => match name.as_str() {
                "true" => {
                    self.advance();
                    Expr::BoolLit(true)
                }
                "false" => {
                    self.advance();
                    Expr::BoolLit(false)
                }
                "null" => {
                    self.advance();
                    Expr::NullLit
                }
                "await" => {
                    self.advance();
                    Expr::Await(Box::new(self.parse_unary()))
                }
                "new" => {
                    self.advance();
                    let type_name = match self.advance() {
                        TokenKind::Ident(name) => name,
                        _ => {
                            self.diagnostics.push(Diagnostic::error(
                                "expected type name after 'new'".to_owned(),
                                self.span(),
                            ));
                            return Expr::Error;
                        }
                    };
                    let args = if self.eat(&TokenKind::LParen) {
                        self.parse_args()
                    } else if self.eat(&TokenKind::LBracket) {
                        let size = self.parse_expr();
                        self.expect(&TokenKind::RBracket);
                        vec![size]
                    } else {
                        Vec::new()
                    };
                    Expr::New { type_name, args }
                }
                _ => {
                    self.advance();
                    Expr::Ident(name)
                }
            },
            other => {
                self.diagnostics.push(Diagnostic::error(
                    format!("expected expression, found {}", other.describe()),
                    self.span(),
                ));
                Expr::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_method() {
        let file = parse_source(
            "int sum(int[] arr) {\n  int total = 0;\n  foreach (var x in arr) { total += x; }\n  return total;\n}",
        );
        assert_eq!(file.methods.len(), 1);
        let method = &file.methods[0];
        assert_eq!(method.name, "sum");
        assert_eq!(method.return_type.as_deref(), Some("int"));
        assert_eq!(method.params[0].type_name, "int[]");
        assert_eq!(method.body.statements.len(), 3);
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn parses_counter_for_loop() {
        let file = parse_source(
            "void scan(int[] arr, int n) { for (int i = 0; i < n; i++) { arr[i] = 0; } }",
        );
        let body = &file.methods[0].body;
        match &body.statements[0] {
            Stmt::For {
                init, cond, update, ..
            } => {
                assert!(matches!(init.as_deref(), Some(Stmt::Local { name, .. }) if name == "i"));
                assert!(matches!(
                    cond,
                    Some(Expr::Binary { op: BinOp::Lt, .. })
                ));
                assert!(matches!(update, Some(Expr::IncDec { .. })));
            }
            other => panic!("expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn recovers_from_malformed_statement() {
        let file = parse_source(
            "void broken(int n) { int x = ; ; return; }\nvoid fine() { return; }",
        );
        assert_eq!(file.methods.len(), 2);
        assert!(!file.diagnostics.is_empty());
        assert_eq!(file.methods[1].name, "fine");
    }

    #[test]
    fn never_rejects_truncated_input() {
        let file = parse_source("int half(int n) { while (n > 1) { n = n / 2;");
        assert_eq!(file.methods.len(), 1);
        // Partial body is still usable.
        assert!(!file.methods[0].body.statements.is_empty());
    }

    #[test]
    fn parses_annotations_and_doc_comments() {
        let file = parse_source(
            "/// Sorts in O(n log n) worst case.\n[Complexity(\"O(n log n)\")]\nvoid sort(int[] arr) { }",
        );
        let method = &file.methods[0];
        assert_eq!(method.annotations.len(), 1);
        assert_eq!(method.annotations[0].name, "Complexity");
        assert_eq!(
            method.annotations[0].argument.as_deref(),
            Some("O(n log n)")
        );
        assert_eq!(method.doc_comment.len(), 1);
    }

    #[test]
    fn parses_expression_bodied_member() {
        let file = parse_source("int count() => 42;");
        let method = &file.methods[0];
        assert!(matches!(
            &method.body.statements[0],
            Stmt::Return {
                value: Some(Expr::IntLit(42)),
                ..
            }
        ));
    }

    #[test]
    fn parses_interface_declarations() {
        let file = parse_source(
            "interface ISorter { void Sort(int[] arr); int Compare(int a, int b); }",
        );
        assert_eq!(file.interfaces.len(), 1);
        assert_eq!(file.interfaces[0].members.len(), 2);
        assert_eq!(file.interfaces[0].members[1].arity, 2);
    }

    #[test]
    fn parses_class_wrapper_and_modifiers() {
        let file = parse_source(
            "class Helpers { public static int id(int x) { return x; } abstract int slow(int n); }",
        );
        assert_eq!(file.methods.len(), 2);
        assert!(file.methods[0].modifiers.is_static);
        assert!(file.methods[1].modifiers.is_abstract);
        assert!(file.methods[1].body.is_empty());
    }

    #[test]
    fn parses_shift_assignment_updates() {
        let file = parse_source("void halve(int n) { for (int i = n; i > 1; i >>= 1) { } }");
        match &file.methods[0].body.statements[0] {
            Stmt::For { update, .. } => {
                assert!(matches!(
                    update,
                    Some(Expr::Assign {
                        op: AssignOp::Shr,
                        ..
                    })
                ));
            }
            other => panic!("expected for, got {:?}", other),
        }
    }
}
