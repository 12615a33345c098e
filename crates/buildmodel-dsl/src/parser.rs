// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser for the Gradle Groovy DSL.
//!
//! The parser covers the statement and expression forms that appear in build
//! scripts: assignments and declarations, method calls with and without
//! parentheses (command expressions), trailing closures, named arguments,
//! lists, maps, string templates, binary/unary/ternary operators and the
//! common control-flow statements.
//!
//! Parsing never fails as a whole. A statement that cannot be parsed is
//! recorded as [`Statement::Unparsed`] and a diagnostic is added to
//! [`Script::errors`]; parsing resumes at the next statement boundary.

use buildmodel_core::Span;

use crate::error::DslError;
use crate::nodes::{
    Argument, Assignment, Block, Closure, Control, Expression, Ident, Literal, LiteralKind,
    MapEntry, MethodCall, Reference, Script, Statement, Template, TemplatePart,
};
use crate::tokenizer::{skip_interpolation, tokenize, tokenize_range, Token, TokenKind};

type PResult<T> = Result<T, DslError>;

/// Parse a whole script.
pub fn parse_script(source: &str) -> Script {
    let (tokens, errors) = tokenize(source);
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        errors,
    };
    let statements = parser.statements(false);
    Script {
        statements,
        errors: parser.errors,
        span: Span::new(0, source.len()),
    }
}

const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "try", "switch", "return", "throw"];

fn binary_precedence(op: &str) -> Option<u8> {
    let prec = match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" | "<=>" | "=~" | "==~" => 6,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" | "as" => 7,
        "<<" | ">>" | ".." | "..<" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        "**" => 11,
        _ => return None,
    };
    Some(prec)
}

fn is_template_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_template_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<DslError>,
}

impl<'src> Parser<'src> {
    // ------------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------------

    fn peek(&self) -> Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Token {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + ahead).min(last)]
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_op(&self, op: &str) -> bool {
        let tok = self.peek();
        tok.kind == TokenKind::Op && tok.text(self.source) == op
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(what))
        }
    }

    fn text(&self, tok: Token) -> &'src str {
        tok.text(self.source)
    }

    fn ident(&self, tok: Token) -> Ident {
        Ident {
            name: self.text(tok).to_string(),
            span: tok.span,
        }
    }

    fn describe(&self, tok: Token) -> String {
        match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Newline => "newline".to_string(),
            _ => format!("'{}'", self.text(tok)),
        }
    }

    fn error_here(&self, expected: &str) -> DslError {
        let tok = self.peek();
        DslError::unexpected_token(self.source, expected, self.describe(tok), tok.span)
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            self.peek().span.start
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon) {
            self.bump();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    /// Skip a balanced `open ... close` group, starting at `open`.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind, what: &str) -> PResult<()> {
        self.expect(open, what)?;
        let mut depth = 1usize;
        loop {
            let tok = self.bump();
            match tok.kind {
                TokenKind::Eof => return Err(self.error_here(what)),
                k if k == open => depth += 1,
                k if k == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn statements(&mut self, in_block: bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::RBrace if in_block => break,
                TokenKind::RBrace => {
                    let tok = self.bump();
                    self.errors.push(DslError::unexpected_token(
                        self.source,
                        "statement",
                        "'}'",
                        tok.span,
                    ));
                    statements.push(Statement::Unparsed { span: tok.span });
                }
                _ => statements.push(self.statement_or_recover()),
            }
        }
        statements
    }

    fn statement_or_recover(&mut self) -> Statement {
        let start_pos = self.pos;
        let start = self.peek().span.start;
        match self.statement() {
            Ok(stmt) if self.at_statement_end() => stmt,
            Ok(_) => {
                let err = self.error_here("end of statement");
                self.recover(start_pos, start, err)
            }
            Err(err) => self.recover(start_pos, start, err),
        }
    }

    /// Record `err` and skip to the next statement boundary at nesting depth
    /// zero. A `}` at depth zero is left for the enclosing block.
    fn recover(&mut self, start_pos: usize, start: usize, err: DslError) -> Statement {
        self.errors.push(err);
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.bump();
        }
        if self.pos == start_pos && !matches!(self.peek().kind, TokenKind::Eof | TokenKind::RBrace)
        {
            self.bump();
        }
        let end = self.prev_end().max(start);
        Statement::Unparsed {
            span: Span::new(start, end),
        }
    }

    fn statement(&mut self) -> PResult<Statement> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident {
            let word = self.text(tok);
            if CONTROL_KEYWORDS.contains(&word) {
                return self.control();
            }
            if word == "import" {
                return self.import();
            }
            if word == "def" {
                return self.declaration();
            }
            let typed_declaration = self.peek_at(1).kind == TokenKind::Ident
                && self.peek_at(2).kind == TokenKind::Assign
                && binary_precedence(self.text(self.peek_at(1))).is_none();
            if typed_declaration {
                return self.declaration();
            }
        }
        self.expression_statement()
    }

    fn import(&mut self) -> PResult<Statement> {
        let start = self.bump().span.start;
        let first = self.peek();
        while !self.at_statement_end() {
            self.bump();
        }
        let end = self.prev_end();
        if end <= first.span.start {
            return Err(self.error_here("import path"));
        }
        Ok(Statement::Import {
            path: self.source[first.span.start..end].to_string(),
            span: Span::new(start, end),
        })
    }

    /// `def x = v`, `def Type x = v`, `Type x = v`, `def f(params) { ... }`.
    fn declaration(&mut self) -> PResult<Statement> {
        let first = self.bump();
        let start = first.span.start;
        if self.at(TokenKind::Ident) && self.peek_at(1).kind == TokenKind::Ident {
            self.bump();
        }
        let name_tok = self.expect(TokenKind::Ident, "variable name")?;
        let name = self.ident(name_tok);

        if self.at(TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen, "')'")?;
            let body = self.body()?;
            return Ok(Statement::Control(Control {
                keyword: self.ident(first),
                condition: None,
                bodies: vec![body],
                span: Span::new(start, self.prev_end()),
            }));
        }

        let target = Reference {
            span: name.span,
            segments: vec![name],
        };
        if self.eat(TokenKind::Assign).is_none() {
            return Ok(Statement::Expression(Expression::Reference(target)));
        }
        self.skip_newlines();
        let value = self.expression()?;
        let span = Span::new(start, value.span().end);
        Ok(Statement::Assignment(Assignment {
            target,
            value,
            declared: true,
            span,
        }))
    }

    fn expression_statement(&mut self) -> PResult<Statement> {
        let start = self.peek().span.start;
        let expr = self.expression()?;
        let next = self.peek();

        if matches!(next.kind, TokenKind::Assign | TokenKind::CompoundAssign) {
            self.bump();
            self.skip_newlines();
            let value = self.expression()?;
            let span = Span::new(start, value.span().end);
            return Ok(match expr {
                Expression::Reference(target) if next.kind == TokenKind::Assign => {
                    Statement::Assignment(Assignment {
                        target,
                        value,
                        declared: false,
                        span,
                    })
                }
                other => Statement::Expression(Expression::Binary {
                    op: self.text(next).to_string(),
                    left: Box::new(other),
                    right: Box::new(value),
                    span,
                }),
            });
        }

        match expr {
            Expression::Reference(callee) if self.starts_command_argument() => {
                let mut call = self.command_call(callee)?;
                // Command chain: `id 'x' version '1.0'` is `id('x').version('1.0')`.
                while self.at(TokenKind::Ident) {
                    let name = self.reference()?;
                    let mut next = if self.starts_command_argument() {
                        self.command_call(name)?
                    } else {
                        MethodCall {
                            receiver: None,
                            span: name.span,
                            callee: name,
                            arguments: Vec::new(),
                            closure: None,
                            parenthesized: false,
                        }
                    };
                    next.span = Span::new(call.span.start, next.span.end);
                    next.receiver = Some(Box::new(Expression::Call(Box::new(call))));
                    call = next;
                }
                Ok(Statement::Call(call))
            }
            Expression::Call(call) => Ok(Statement::Call(*call)),
            other => Ok(Statement::Expression(other)),
        }
    }

    fn starts_command_argument(&self) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Ident => binary_precedence(self.text(tok)).is_none(),
            TokenKind::Number | TokenKind::Str => true,
            TokenKind::Op => self.text(tok) == "!",
            _ => false,
        }
    }

    /// `callee arg, name: arg, ... [{ closure }]`
    fn command_call(&mut self, callee: Reference) -> PResult<MethodCall> {
        let start = callee.span.start;
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.argument()?);
            if self.eat(TokenKind::Comma).is_some() {
                self.skip_newlines();
                continue;
            }
            break;
        }
        let closure = if self.at(TokenKind::LBrace) {
            Some(self.closure()?)
        } else {
            None
        };
        Ok(MethodCall {
            receiver: None,
            callee,
            arguments,
            closure,
            parenthesized: false,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn control(&mut self) -> PResult<Statement> {
        let kw_tok = self.bump();
        let keyword = self.ident(kw_tok);
        let mut condition = None;
        let mut bodies = Vec::new();

        match keyword.name.as_str() {
            "if" => {
                condition = Some(self.paren_condition()?);
                bodies.push(self.body()?);
                let save = self.pos;
                self.skip_newlines();
                if self.peek().is_word(self.source, "else") {
                    self.bump();
                    if self.peek().is_word(self.source, "if") {
                        let nested = self.control()?;
                        bodies.push(Block {
                            span: nested.span(),
                            statements: vec![nested],
                        });
                    } else {
                        bodies.push(self.body()?);
                    }
                } else {
                    self.pos = save;
                }
            }
            "while" => {
                condition = Some(self.paren_condition()?);
                bodies.push(self.body()?);
            }
            "switch" => {
                condition = Some(self.paren_condition()?);
                self.skip_newlines();
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace, "'}'")?;
            }
            "for" => {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen, "')'")?;
                bodies.push(self.body()?);
            }
            "try" => {
                bodies.push(self.body()?);
                loop {
                    let save = self.pos;
                    self.skip_newlines();
                    if self.peek().is_word(self.source, "catch") {
                        self.bump();
                        self.skip_balanced(TokenKind::LParen, TokenKind::RParen, "')'")?;
                        bodies.push(self.body()?);
                    } else if self.peek().is_word(self.source, "finally") {
                        self.bump();
                        bodies.push(self.body()?);
                    } else {
                        self.pos = save;
                        break;
                    }
                }
            }
            _ => {
                // return / throw
                if !self.at_statement_end() {
                    condition = Some(self.expression()?);
                }
            }
        }

        Ok(Statement::Control(Control {
            span: Span::new(keyword.span.start, self.prev_end()),
            keyword,
            condition,
            bodies,
        }))
    }

    fn paren_condition(&mut self) -> PResult<Expression> {
        self.expect(TokenKind::LParen, "'('")?;
        self.skip_newlines();
        let condition = self.expression()?;
        self.skip_newlines();
        self.expect(TokenKind::RParen, "')'")?;
        Ok(condition)
    }

    fn body(&mut self) -> PResult<Block> {
        self.skip_newlines();
        if self.at(TokenKind::LBrace) {
            let start = self.bump().span.start;
            let statements = self.statements(true);
            let end = self.expect(TokenKind::RBrace, "'}'")?.span.end;
            return Ok(Block {
                statements,
                span: Span::new(start, end),
            });
        }
        let stmt = self.statement()?;
        Ok(Block {
            span: stmt.span(),
            statements: vec![stmt],
        })
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expression(&mut self) -> PResult<Expression> {
        let condition = self.binary(1)?;
        let start = condition.span().start;
        if self.at(TokenKind::Question) {
            self.bump();
            self.skip_newlines();
            let then = self.expression()?;
            self.skip_newlines();
            self.expect(TokenKind::Colon, "':'")?;
            self.skip_newlines();
            let otherwise = self.expression()?;
            return Ok(Expression::Ternary {
                span: Span::new(start, otherwise.span().end),
                condition: Box::new(condition),
                then: Some(Box::new(then)),
                otherwise: Box::new(otherwise),
            });
        }
        if self.at_op("?:") {
            self.bump();
            self.skip_newlines();
            let otherwise = self.expression()?;
            return Ok(Expression::Ternary {
                span: Span::new(start, otherwise.span().end),
                condition: Box::new(condition),
                then: None,
                otherwise: Box::new(otherwise),
            });
        }
        Ok(condition)
    }

    fn binary(&mut self, min_prec: u8) -> PResult<Expression> {
        let mut left = self.unary()?;
        loop {
            let tok = self.peek();
            if !matches!(tok.kind, TokenKind::Op | TokenKind::Ident) {
                break;
            }
            let op = self.text(tok);
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.bump();
            self.skip_newlines();
            let right = self.binary(prec + 1)?;
            left = Expression::Binary {
                op: op.to_string(),
                span: Span::new(left.span().start, right.span().end),
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<Expression> {
        let tok = self.peek();
        if tok.kind == TokenKind::Op && matches!(self.text(tok), "!" | "-" | "+" | "~" | "++" | "--")
        {
            self.bump();
            let operand = self.unary()?;
            return Ok(Expression::Unary {
                op: self.text(tok).to_string(),
                span: Span::new(tok.span.start, operand.span().end),
                operand: Box::new(operand),
            });
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    fn primary(&mut self) -> PResult<Expression> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Number => {
                self.bump();
                Ok(Expression::Literal(self.token_literal(tok, LiteralKind::Number)))
            }
            TokenKind::Str => {
                self.bump();
                Ok(self.string_literal(tok))
            }
            TokenKind::Ident => match self.text(tok) {
                "true" | "false" => {
                    self.bump();
                    Ok(Expression::Literal(self.token_literal(tok, LiteralKind::Boolean)))
                }
                "null" => {
                    self.bump();
                    Ok(Expression::Literal(self.token_literal(tok, LiteralKind::Null)))
                }
                "new" => self.new_expression(),
                _ => Ok(Expression::Reference(self.reference()?)),
            },
            TokenKind::LParen => {
                let start = self.bump().span.start;
                self.skip_newlines();
                let inner = self.expression()?;
                self.skip_newlines();
                let end = self.expect(TokenKind::RParen, "')'")?.span.end;
                Ok(Expression::Paren {
                    inner: Box::new(inner),
                    span: Span::new(start, end),
                })
            }
            TokenKind::LBracket => self.list_or_map(),
            TokenKind::LBrace => Ok(Expression::Closure(self.closure()?)),
            _ => Err(self.error_here("expression")),
        }
    }

    fn token_literal(&self, tok: Token, kind: LiteralKind) -> Literal {
        Literal {
            kind,
            value: self.text(tok).to_string(),
            span: tok.span,
            value_span: tok.span,
        }
    }

    fn reference(&mut self) -> PResult<Reference> {
        let first = self.expect(TokenKind::Ident, "identifier")?;
        let mut segments = vec![self.ident(first)];
        while self.at(TokenKind::Dot) && self.peek_at(1).kind == TokenKind::Ident {
            self.bump();
            let tok = self.bump();
            segments.push(self.ident(tok));
        }
        let end = self.prev_end();
        Ok(Reference {
            segments,
            span: Span::new(first.span.start, end),
        })
    }

    /// `new Type(args)`, parsed as a call of the type name.
    fn new_expression(&mut self) -> PResult<Expression> {
        let start = self.bump().span.start;
        let callee = self.reference()?;
        let arguments = if self.at(TokenKind::LParen) {
            self.call_arguments()?
        } else {
            Vec::new()
        };
        let closure = if self.at(TokenKind::LBrace) {
            Some(self.closure()?)
        } else {
            None
        };
        Ok(Expression::Call(Box::new(MethodCall {
            receiver: None,
            callee,
            arguments,
            closure,
            parenthesized: true,
            span: Span::new(start, self.prev_end()),
        })))
    }

    fn postfix(&mut self, mut expr: Expression) -> PResult<Expression> {
        loop {
            let tok = self.peek();
            let member_access = match tok.kind {
                TokenKind::Dot => true,
                TokenKind::Op => matches!(self.text(tok), "?." | "*." | ".&"),
                _ => false,
            };
            if member_access && self.peek_at(1).kind == TokenKind::Ident {
                self.bump();
                let name_tok = self.bump();
                let name = self.ident(name_tok);
                expr = match expr {
                    Expression::Reference(mut r) if tok.kind == TokenKind::Dot => {
                        r.span = Span::new(r.span.start, name.span.end);
                        r.segments.push(name);
                        Expression::Reference(r)
                    }
                    other => Expression::PropertyAccess {
                        span: Span::new(other.span().start, name.span.end),
                        receiver: Box::new(other),
                        name,
                    },
                };
                continue;
            }

            match tok.kind {
                TokenKind::LParen => {
                    let arguments = self.call_arguments()?;
                    let closure = if self.at(TokenKind::LBrace) {
                        Some(self.closure()?)
                    } else {
                        None
                    };
                    expr = self.make_call(expr, arguments, closure, true)?;
                }
                TokenKind::LBrace if matches!(expr, Expression::Reference(_)) => {
                    let closure = self.closure()?;
                    expr = self.make_call(expr, Vec::new(), Some(closure), false)?;
                }
                TokenKind::LBracket => {
                    self.bump();
                    self.skip_newlines();
                    let index = self.expression()?;
                    self.skip_newlines();
                    let end = self.expect(TokenKind::RBracket, "']'")?.span.end;
                    expr = Expression::Index {
                        span: Span::new(expr.span().start, end),
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Op if matches!(self.text(tok), "++" | "--") => {
                    self.bump();
                    expr = Expression::Unary {
                        op: self.text(tok).to_string(),
                        span: Span::new(expr.span().start, tok.span.end),
                        operand: Box::new(expr),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn make_call(
        &mut self,
        expr: Expression,
        arguments: Vec<Argument>,
        closure: Option<Closure>,
        parenthesized: bool,
    ) -> PResult<Expression> {
        let start = expr.span().start;
        let (receiver, callee) = match expr {
            Expression::Reference(r) => (None, r),
            Expression::PropertyAccess { receiver, name, .. } => (
                Some(receiver),
                Reference {
                    span: name.span,
                    segments: vec![name],
                },
            ),
            other => {
                return Err(DslError::unexpected_token(
                    self.source,
                    "method name",
                    "call",
                    other.span(),
                ))
            }
        };
        Ok(Expression::Call(Box::new(MethodCall {
            receiver,
            callee,
            arguments,
            closure,
            parenthesized,
            span: Span::new(start, self.prev_end()),
        })))
    }

    fn call_arguments(&mut self) -> PResult<Vec<Argument>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut arguments = Vec::new();
        loop {
            self.skip_newlines();
            if self.at(TokenKind::RParen) {
                break;
            }
            arguments.push(self.argument()?);
            self.skip_newlines();
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RParen, "')'")?;
        Ok(arguments)
    }

    fn argument(&mut self) -> PResult<Argument> {
        let tok = self.peek();
        let named = matches!(tok.kind, TokenKind::Ident | TokenKind::Str)
            && self.peek_at(1).kind == TokenKind::Colon;
        if !named {
            return Ok(Argument::Positional(self.expression()?));
        }
        self.bump();
        self.bump();
        self.skip_newlines();
        let name = match tok.kind {
            TokenKind::Str => match self.string_literal(tok) {
                Expression::Literal(lit) => Ident {
                    name: lit.value,
                    span: lit.value_span,
                },
                _ => self.ident(tok),
            },
            _ => self.ident(tok),
        };
        let value = self.expression()?;
        Ok(Argument::Named {
            span: Span::new(tok.span.start, value.span().end),
            name,
            value,
        })
    }

    fn closure(&mut self) -> PResult<Closure> {
        let start = self.expect(TokenKind::LBrace, "'{'")?.span.start;
        self.skip_closure_parameters();
        let statements = self.statements(true);
        let end = self.expect(TokenKind::RBrace, "'}'")?.span.end;
        Ok(Closure {
            statements,
            span: Span::new(start, end),
        })
    }

    /// Skip `a, b ->` (or a bare `->`) at the start of a closure body.
    fn skip_closure_parameters(&mut self) {
        let mut i = self.pos;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::Arrow => {
                    self.pos = i + 1;
                    return;
                }
                TokenKind::Ident | TokenKind::Comma | TokenKind::Dot => i += 1,
                _ => return,
            }
        }
    }

    fn list_or_map(&mut self) -> PResult<Expression> {
        let start = self.expect(TokenKind::LBracket, "'['")?.span.start;
        self.skip_newlines();
        if self.at(TokenKind::Colon) && self.peek_at(1).kind == TokenKind::RBracket {
            self.bump();
            let end = self.bump().span.end;
            return Ok(Expression::Map {
                entries: Vec::new(),
                span: Span::new(start, end),
            });
        }

        let is_map = matches!(
            self.peek().kind,
            TokenKind::Ident | TokenKind::Str | TokenKind::Number
        ) && self.peek_at(1).kind == TokenKind::Colon;

        let mut elements = Vec::new();
        let mut entries = Vec::new();
        loop {
            self.skip_newlines();
            if self.at(TokenKind::RBracket) {
                break;
            }
            if is_map {
                entries.push(self.map_entry()?);
            } else {
                elements.push(self.expression()?);
            }
            self.skip_newlines();
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.skip_newlines();
        let end = self.expect(TokenKind::RBracket, "']'")?.span.end;
        let span = Span::new(start, end);
        if is_map {
            Ok(Expression::Map { entries, span })
        } else {
            Ok(Expression::List { elements, span })
        }
    }

    fn map_entry(&mut self) -> PResult<MapEntry> {
        let tok = self.peek();
        let key = match tok.kind {
            TokenKind::Ident => {
                self.bump();
                Expression::Literal(self.token_literal(tok, LiteralKind::String))
            }
            TokenKind::Str => {
                self.bump();
                self.string_literal(tok)
            }
            TokenKind::Number => {
                self.bump();
                Expression::Literal(self.token_literal(tok, LiteralKind::Number))
            }
            TokenKind::LParen => self.primary()?,
            _ => return Err(self.error_here("map key")),
        };
        self.expect(TokenKind::Colon, "':'")?;
        self.skip_newlines();
        let value = self.expression()?;
        Ok(MapEntry {
            span: Span::new(key.span().start, value.span().end),
            key,
            value,
        })
    }

    // ------------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------------

    fn string_literal(&mut self, tok: Token) -> Expression {
        let text = self.text(tok);
        let quote = text.as_bytes()[0];
        let triple_quote = [quote, quote, quote];
        let triple = text.as_bytes().starts_with(&triple_quote);
        let quote_len = if triple { 3 } else { 1 };
        let closed = text.len() >= 2 * quote_len
            && text.as_bytes()[text.len() - quote_len..]
                .iter()
                .all(|b| *b == quote);

        let inner_start = tok.span.start + quote_len;
        let inner_end = if closed {
            tok.span.end - quote_len
        } else {
            tok.span.end
        };
        let inner = Span::new(inner_start.min(inner_end), inner_end);

        if quote == b'"' {
            if let Some(template) = self.template(inner, tok.span) {
                return Expression::Template(template);
            }
        }
        Expression::Literal(Literal {
            kind: LiteralKind::String,
            value: inner.slice(self.source).unwrap_or("").to_string(),
            span: tok.span,
            value_span: inner,
        })
    }

    /// Split a double-quoted string body into text and interpolations.
    /// Returns `None` when the body has no interpolation.
    fn template(&mut self, inner: Span, span: Span) -> Option<Template> {
        let source = self.source;
        let bytes = source.as_bytes();
        let end = inner.end;
        let mut parts = Vec::new();
        let mut has_interpolation = false;
        let mut text_start = inner.start;
        let mut i = inner.start;

        let flush = |parts: &mut Vec<TemplatePart>, from: usize, to: usize| {
            if from < to {
                parts.push(TemplatePart::Text {
                    text: source[from..to].to_string(),
                    span: Span::new(from, to),
                });
            }
        };

        while i < end {
            match bytes[i] {
                b'\\' => i = (i + 2).min(end),
                b'$' if i + 1 < end && bytes[i + 1] == b'{' => {
                    flush(&mut parts, text_start, i);
                    let (close, body_end) = match skip_interpolation(bytes, i + 2, end) {
                        Ok(after) => (after, after - 1),
                        Err(stop) => (stop, stop),
                    };
                    let expression = self.sub_expression(Span::new(i + 2, body_end));
                    parts.push(TemplatePart::Interpolation {
                        expression,
                        braced: true,
                        span: Span::new(i, close),
                    });
                    has_interpolation = true;
                    i = close;
                    text_start = i;
                }
                b'$' if i + 1 < end && is_template_ident_start(bytes[i + 1]) => {
                    flush(&mut parts, text_start, i);
                    let mut segments = Vec::new();
                    let mut j = i + 1;
                    loop {
                        let seg_start = j;
                        while j < end && is_template_ident_continue(bytes[j]) {
                            j += 1;
                        }
                        segments.push(Ident {
                            name: source[seg_start..j].to_string(),
                            span: Span::new(seg_start, j),
                        });
                        if j + 1 < end && bytes[j] == b'.' && is_template_ident_start(bytes[j + 1])
                        {
                            j += 1;
                            continue;
                        }
                        break;
                    }
                    parts.push(TemplatePart::Interpolation {
                        expression: Expression::Reference(Reference {
                            segments,
                            span: Span::new(i + 1, j),
                        }),
                        braced: false,
                        span: Span::new(i, j),
                    });
                    has_interpolation = true;
                    i = j;
                    text_start = i;
                }
                _ => i += 1,
            }
        }
        flush(&mut parts, text_start, end);

        if has_interpolation {
            Some(Template { parts, span })
        } else {
            None
        }
    }

    /// Parse the body of a `${...}` interpolation.
    fn sub_expression(&mut self, body: Span) -> Expression {
        let (tokens, errors) = tokenize_range(self.source, body);
        self.errors.extend(errors);
        let mut sub = Parser {
            source: self.source,
            tokens,
            pos: 0,
            errors: Vec::new(),
        };
        sub.skip_newlines();
        let result = sub.expression();
        sub.skip_newlines();
        let expression = match result {
            Ok(expr) if sub.at(TokenKind::Eof) => expr,
            Ok(_) => {
                let err = sub.error_here("'}'");
                sub.errors.push(err);
                Expression::Unparsed { span: body }
            }
            Err(err) => {
                sub.errors.push(err);
                Expression::Unparsed { span: body }
            }
        };
        self.errors.extend(sub.errors);
        expression
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Script {
        let script = parse_script(source);
        assert!(script.errors.is_empty(), "errors: {:?}", script.errors);
        script
    }

    fn only_statement(source: &str) -> Statement {
        let mut script = parse_ok(source);
        assert_eq!(script.statements.len(), 1, "{:?}", script.statements);
        script.statements.remove(0)
    }

    fn slice(source: &str, span: Span) -> &str {
        span.slice(source).unwrap()
    }

    mod statement_tests {
        use super::*;

        #[test]
        fn simple_assignment() {
            let source = "version = '1.0'";
            let Statement::Assignment(a) = only_statement(source) else {
                panic!("expected assignment");
            };
            assert_eq!(a.target.path(), "version");
            assert!(!a.declared);
            let Expression::Literal(lit) = &a.value else {
                panic!("expected literal");
            };
            assert_eq!(lit.value, "1.0");
            assert_eq!(slice(source, lit.value_span), "1.0");
            assert_eq!(slice(source, a.span), source);
        }

        #[test]
        fn def_declaration() {
            let Statement::Assignment(a) = only_statement("def supportVersion = \"24.2.1\"")
            else {
                panic!("expected assignment");
            };
            assert!(a.declared);
            assert_eq!(a.target.name(), "supportVersion");
        }

        #[test]
        fn typed_declaration() {
            let Statement::Assignment(a) = only_statement("String v = 'x'") else {
                panic!("expected assignment");
            };
            assert!(a.declared);
            assert_eq!(a.target.name(), "v");
        }

        #[test]
        fn dotted_assignment_target() {
            let Statement::Assignment(a) = only_statement("project.ext.minSdk = 15") else {
                panic!("expected assignment");
            };
            assert_eq!(a.target.qualifier(), vec!["project", "ext"]);
            assert_eq!(a.target.name(), "minSdk");
        }

        #[test]
        fn command_expression_with_string() {
            let source = "compile 'com.google.guava:guava:18.0'";
            let Statement::Call(call) = only_statement(source) else {
                panic!("expected call");
            };
            assert_eq!(call.callee.path(), "compile");
            assert!(!call.parenthesized);
            assert_eq!(call.arguments.len(), 1);
            assert_eq!(slice(source, call.span), source);
        }

        #[test]
        fn command_expression_with_named_arguments() {
            let Statement::Call(call) = only_statement("apply plugin: 'com.android.application'")
            else {
                panic!("expected call");
            };
            assert_eq!(call.callee.name(), "apply");
            assert!(matches!(
                &call.arguments[0],
                Argument::Named { name, .. } if name.name == "plugin"
            ));
        }

        #[test]
        fn command_chain() {
            let source = "id 'com.example.plugin' version '1.0'";
            let Statement::Call(call) = only_statement(source) else {
                panic!("expected call");
            };
            assert_eq!(call.callee.name(), "version");
            assert_eq!(slice(source, call.span), source);
            let Some(receiver) = &call.receiver else {
                panic!("expected receiver");
            };
            assert!(matches!(&**receiver, Expression::Call(c) if c.callee.name() == "id"));
        }

        #[test]
        fn block_call_nests_statements() {
            let source = "android {\n    compileSdkVersion 24\n    buildToolsVersion \"24.0.2\"\n}\n";
            let Statement::Call(call) = only_statement(source) else {
                panic!("expected call");
            };
            assert_eq!(call.callee.name(), "android");
            assert!(call.arguments.is_empty());
            let closure = call.closure.as_ref().unwrap();
            assert_eq!(closure.statements.len(), 2);
            assert!(matches!(&closure.statements[0], Statement::Call(c) if c.callee.name() == "compileSdkVersion"));
        }

        #[test]
        fn parenthesized_call_with_closure() {
            let source = "compile('a:b:1') {\n  transitive = false\n}";
            let Statement::Call(call) = only_statement(source) else {
                panic!("expected call");
            };
            assert!(call.parenthesized);
            assert_eq!(call.arguments.len(), 1);
            assert_eq!(call.closure.as_ref().unwrap().statements.len(), 1);
        }

        #[test]
        fn empty_parenthesized_call() {
            let Statement::Call(call) = only_statement("mavenCentral()") else {
                panic!("expected call");
            };
            assert!(call.parenthesized);
            assert!(call.arguments.is_empty());
            assert!(call.closure.is_none());
        }

        #[test]
        fn closure_parameters_are_skipped() {
            let source = "configurations.all { c ->\n  c.x = 1\n}";
            let Statement::Call(call) = only_statement(source) else {
                panic!("expected call");
            };
            assert_eq!(call.callee.path(), "configurations.all");
            assert_eq!(call.closure.unwrap().statements.len(), 1);
        }

        #[test]
        fn if_else_bodies() {
            let source = "if (x) {\n  a = 1\n} else if (y) b = 2\nelse {\n  c = 3\n}";
            let Statement::Control(control) = only_statement(source) else {
                panic!("expected control");
            };
            assert_eq!(control.keyword.name, "if");
            assert_eq!(control.bodies.len(), 2);
            let Statement::Control(nested) = &control.bodies[1].statements[0] else {
                panic!("expected nested if");
            };
            assert_eq!(nested.bodies.len(), 2);
        }

        #[test]
        fn try_catch_finally() {
            let source = "try {\n a = 1\n} catch (Exception e) {\n b = 2\n} finally {\n c = 3\n}";
            let Statement::Control(control) = only_statement(source) else {
                panic!("expected control");
            };
            assert_eq!(control.bodies.len(), 3);
        }

        #[test]
        fn method_definition_is_control() {
            let source = "def bump(v) {\n  return v + 1\n}";
            let Statement::Control(control) = only_statement(source) else {
                panic!("expected control");
            };
            assert_eq!(control.keyword.name, "def");
        }

        #[test]
        fn import_statement() {
            let Statement::Import { path, .. } = only_statement("import org.foo.Bar") else {
                panic!("expected import");
            };
            assert_eq!(path, "org.foo.Bar");
        }

        #[test]
        fn semicolons_separate_statements() {
            let script = parse_ok("a = b; b = a");
            assert_eq!(script.statements.len(), 2);
        }

        #[test]
        fn newlines_inside_parentheses() {
            let script = parse_ok("compile(\n  'a:b:1',\n  'c:d:2'\n)\n");
            let Statement::Call(call) = &script.statements[0] else {
                panic!("expected call");
            };
            assert_eq!(call.arguments.len(), 2);
        }
    }

    mod expression_tests {
        use super::*;

        fn value_of(source: &str) -> Expression {
            match only_statement(source) {
                Statement::Assignment(a) => a.value,
                other => panic!("expected assignment, got {:?}", other),
            }
        }

        #[test]
        fn binary_precedence_groups_multiplication() {
            let Expression::Binary { op, right, .. } = value_of("x = 1 + 2 * 3") else {
                panic!("expected binary");
            };
            assert_eq!(op, "+");
            assert!(matches!(*right, Expression::Binary { ref op, .. } if op == "*"));
        }

        #[test]
        fn string_plus_number() {
            assert!(matches!(value_of("x = \"a\" + 1"), Expression::Binary { .. }));
        }

        #[test]
        fn template_with_simple_and_braced_interpolation() {
            let source = "x = \"com.android.tools.build:gradle:$v and ${a.b}\"";
            let Expression::Template(t) = value_of(source) else {
                panic!("expected template");
            };
            assert_eq!(t.parts.len(), 4);
            let TemplatePart::Interpolation {
                expression: Expression::Reference(r),
                braced: false,
                span,
            } = &t.parts[1]
            else {
                panic!("expected $v");
            };
            assert_eq!(r.name(), "v");
            assert_eq!(slice(source, *span), "$v");
            let TemplatePart::Interpolation {
                expression: Expression::Reference(r),
                braced: true,
                ..
            } = &t.parts[3]
            else {
                panic!("expected ${{a.b}}");
            };
            assert_eq!(r.path(), "a.b");
        }

        #[test]
        fn double_quoted_without_dollar_is_literal() {
            let Expression::Literal(lit) = value_of("x = \"plain\"") else {
                panic!("expected literal");
            };
            assert_eq!(lit.value, "plain");
        }

        #[test]
        fn single_quoted_dollar_is_literal() {
            let Expression::Literal(lit) = value_of("x = '$v'") else {
                panic!("expected literal");
            };
            assert_eq!(lit.value, "$v");
        }

        #[test]
        fn list_and_map_literals() {
            assert!(matches!(value_of("x = [1, 2]"), Expression::List { ref elements, .. } if elements.len() == 2));
            assert!(matches!(value_of("x = [a: 1, 'b': 2]"), Expression::Map { ref entries, .. } if entries.len() == 2));
            assert!(matches!(value_of("x = [:]"), Expression::Map { ref entries, .. } if entries.is_empty()));
        }

        #[test]
        fn method_call_value() {
            let Expression::Call(call) = value_of("x = uri('http://example.com')") else {
                panic!("expected call");
            };
            assert_eq!(call.callee.name(), "uri");
        }

        #[test]
        fn call_on_literal_receiver() {
            let Expression::Call(call) = value_of("x = 'a'.trim()") else {
                panic!("expected call");
            };
            assert!(call.receiver.is_some());
            assert_eq!(call.callee.name(), "trim");
        }

        #[test]
        fn ternary_and_elvis() {
            assert!(matches!(
                value_of("x = a ? 1 : 2"),
                Expression::Ternary { then: Some(_), .. }
            ));
            assert!(matches!(
                value_of("x = a ?: 2"),
                Expression::Ternary { then: None, .. }
            ));
        }

        #[test]
        fn index_and_property_access() {
            assert!(matches!(value_of("x = a[0]"), Expression::Index { .. }));
            assert!(matches!(
                value_of("x = a()?.b"),
                Expression::PropertyAccess { .. }
            ));
        }
    }

    mod recovery_tests {
        use super::*;

        #[test]
        fn bad_statement_becomes_unparsed() {
            let source = "a = 1\nb = )\nc = 3\n";
            let script = parse_script(source);
            assert_eq!(script.errors.len(), 1);
            assert_eq!(script.statements.len(), 3);
            assert!(matches!(script.statements[1], Statement::Unparsed { .. }));
            assert!(matches!(script.statements[2], Statement::Assignment(_)));
        }

        #[test]
        fn error_inside_block_keeps_block() {
            let source = "android {\n  x = = 1\n  compileSdkVersion 24\n}\nfoo = 1\n";
            let script = parse_script(source);
            assert_eq!(script.errors.len(), 1);
            assert_eq!(script.statements.len(), 2);
            let Statement::Call(call) = &script.statements[0] else {
                panic!("expected call");
            };
            assert_eq!(call.closure.as_ref().unwrap().statements.len(), 2);
        }

        #[test]
        fn stray_closing_brace() {
            let script = parse_script("}\na = 1");
            assert_eq!(script.errors.len(), 1);
            assert!(matches!(script.statements[1], Statement::Assignment(_)));
        }

        #[test]
        fn missing_closing_brace_reports_error() {
            let script = parse_script("android {\n  a = 1\n");
            assert!(!script.errors.is_empty());
            assert!(matches!(script.statements[0], Statement::Unparsed { .. }));
        }

        #[test]
        fn bad_interpolation_is_unparsed_expression() {
            let script = parse_script("x = \"${ ) }\"");
            assert_eq!(script.errors.len(), 1);
            let Statement::Assignment(a) = &script.statements[0] else {
                panic!("expected assignment");
            };
            let Expression::Template(t) = &a.value else {
                panic!("expected template");
            };
            assert!(matches!(
                t.parts[0],
                TemplatePart::Interpolation {
                    expression: Expression::Unparsed { .. },
                    ..
                }
            ));
        }
    }
}
