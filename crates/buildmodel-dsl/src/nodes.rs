// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Concrete syntax tree node types.
//!
//! Every node carries the byte [`Span`] it was parsed from. Nodes own their
//! data; the source text is only needed again to slice raw text by span.

use buildmodel_core::Span;

use crate::error::DslError;

// ============================================================================
// Script
// ============================================================================

/// A parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
    /// Diagnostics collected while parsing. Statements that failed to parse
    /// are kept as [`Statement::Unparsed`].
    pub errors: Vec<DslError>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `target = value`, optionally declared with `def` or a type.
    Assignment(Assignment),
    /// A method call at statement level: `foo(a)`, `foo a, b`, `foo { ... }`.
    Call(MethodCall),
    /// Any other expression statement.
    Expression(Expression),
    /// `if`, `for`, `while`, `try` and their bodies.
    Control(Control),
    /// `import a.b.C`
    Import { path: String, span: Span },
    /// Text that could not be parsed.
    Unparsed { span: Span },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Assignment(a) => a.span,
            Statement::Call(c) => c.span,
            Statement::Expression(e) => e.span(),
            Statement::Control(c) => c.span,
            Statement::Import { span, .. } => *span,
            Statement::Unparsed { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Reference,
    pub value: Expression,
    /// Introduced with `def` or a type name.
    pub declared: bool,
    pub span: Span,
}

/// A control-flow statement. Only the bodies are kept structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub keyword: Ident,
    pub condition: Option<Expression>,
    pub bodies: Vec<Block>,
    pub span: Span,
}

/// A braced statement list, or a single statement used as a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ============================================================================
// Calls
// ============================================================================

/// A method call, with or without parentheses, and an optional trailing closure.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Receiver when the call is made on something other than a plain
    /// reference, e.g. `"x".trim()`.
    pub receiver: Option<Box<Expression>>,
    /// The (possibly dotted) method name.
    pub callee: Reference,
    pub arguments: Vec<Argument>,
    pub closure: Option<Closure>,
    /// Whether the arguments were written inside parentheses.
    pub parenthesized: bool,
    pub span: Span,
}

impl MethodCall {
    /// Positional arguments in source order.
    pub fn positional(&self) -> impl Iterator<Item = &Expression> {
        self.arguments.iter().filter_map(|a| match a {
            Argument::Positional(e) => Some(e),
            Argument::Named { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expression),
    /// `name: value`
    Named {
        name: Ident,
        value: Expression,
        span: Span,
    },
}

impl Argument {
    pub fn span(&self) -> Span {
        match self {
            Argument::Positional(e) => e.span(),
            Argument::Named { span, .. } => *span,
        }
    }
}

/// `{ [params ->] statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ============================================================================
// Names
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A dotted name: `a`, `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub segments: Vec<Ident>,
    pub span: Span,
}

impl Reference {
    /// The terminal segment name.
    pub fn name(&self) -> &str {
        self.segments.last().map(|s| s.name.as_str()).unwrap_or("")
    }

    /// Names of the segments preceding the terminal one.
    pub fn qualifier(&self) -> Vec<String> {
        let n = self.segments.len().saturating_sub(1);
        self.segments[..n].iter().map(|s| s.name.clone()).collect()
    }

    /// Dotted text of the reference.
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
}

/// A literal. For strings `value` is the text between the quotes and
/// `value_span` its range; for other kinds both equal the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: String,
    pub span: Span,
    pub value_span: Span,
}

/// A double-quoted string containing interpolations.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text { text: String, span: Span },
    /// `$name` (`braced == false`) or `${expression}`.
    Interpolation {
        expression: Expression,
        braced: bool,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Template(Template),
    Reference(Reference),
    Call(Box<MethodCall>),
    Binary {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Unary {
        op: String,
        operand: Box<Expression>,
        span: Span,
    },
    List {
        elements: Vec<Expression>,
        span: Span,
    },
    Map {
        entries: Vec<MapEntry>,
        span: Span,
    },
    Closure(Closure),
    PropertyAccess {
        receiver: Box<Expression>,
        name: Ident,
        span: Span,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    /// `c ? a : b`, or `a ?: b` when `then` is `None`.
    Ternary {
        condition: Box<Expression>,
        then: Option<Box<Expression>>,
        otherwise: Box<Expression>,
        span: Span,
    },
    Paren {
        inner: Box<Expression>,
        span: Span,
    },
    /// An expression that could not be parsed (inside an interpolation).
    Unparsed {
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(l) => l.span,
            Expression::Template(t) => t.span,
            Expression::Reference(r) => r.span,
            Expression::Call(c) => c.span,
            Expression::Closure(c) => c.span,
            Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::List { span, .. }
            | Expression::Map { span, .. }
            | Expression::PropertyAccess { span, .. }
            | Expression::Index { span, .. }
            | Expression::Ternary { span, .. }
            | Expression::Paren { span, .. }
            | Expression::Unparsed { span } => *span,
        }
    }

    /// The reference, if this expression is a plain (dotted) name.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Expression::Reference(r) => Some(r),
            _ => None,
        }
    }
}
