//! Value and variable extraction from one right-hand-side expression.
//!
//! [`extract`] walks an expression once and returns an [`ExtractedRvalue`]:
//! the literal fragments and the variable references it contains. Anything
//! that cannot be reduced to those becomes a single opaque value covering
//! the node.

use buildmodel_core::{FileId, Location, Span};
use buildmodel_dsl::visitor::walk_expression;
use buildmodel_dsl::{
    Expression, Literal, MethodCall, Reference, Template, TemplatePart, VisitResult, Visitor,
};

use super::model::{Value, Variable};

/// Calls that only wrap their argument, as in `url uri('https://...')`.
const TRANSPARENT_WRAPPERS: &[&str] = &["uri", "file"];

/// A variable reference found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedVariable {
    pub variable: Variable,
    /// The reference as written, e.g. `rootProject.ext.v`.
    pub text: String,
    pub location: Location,
}

/// Everything extracted from one right-hand side.
///
/// Built fresh for every statement and consumed when the assignment is
/// registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRvalue {
    values: Vec<Value>,
    variables: Vec<ReferencedVariable>,
}

impl ExtractedRvalue {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn variables(&self) -> &[ReferencedVariable] {
        &self.variables
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.variables.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Value>, Vec<ReferencedVariable>) {
        (self.values, self.variables)
    }
}

/// Extract values and variables from `expression` in `file`.
pub fn extract(file: FileId, expression: &Expression) -> ExtractedRvalue {
    let mut extractor = Extractor {
        file,
        rvalue: ExtractedRvalue::default(),
        template_text_seen: Vec::new(),
    };
    walk_expression(&mut extractor, expression);
    extractor.rvalue
}

struct Extractor {
    file: FileId,
    rvalue: ExtractedRvalue,
    /// One flag per template being walked: whether a text part was cached.
    template_text_seen: Vec<bool>,
}

impl Extractor {
    fn location(&self, span: Span) -> Location {
        Location::new(self.file, span)
    }

    fn push_opaque(&mut self, span: Span) {
        let value = Value::opaque(self.location(span));
        self.rvalue.values.push(value);
    }
}

/// The single argument of a `uri(x)`/`file(x)` call.
fn transparent_argument(call: &MethodCall) -> Option<&Expression> {
    if call.receiver.is_some()
        || call.closure.is_some()
        || call.callee.segments.len() != 1
        || call.arguments.len() != 1
        || !TRANSPARENT_WRAPPERS.contains(&call.callee.name())
    {
        return None;
    }
    call.positional().next()
}

impl Visitor for Extractor {
    fn visit_expression(&mut self, node: &Expression) -> VisitResult {
        match node {
            Expression::Literal(_)
            | Expression::Template(_)
            | Expression::Reference(_)
            | Expression::Binary { .. }
            | Expression::Paren { .. } => VisitResult::Continue,
            Expression::Call(call) => {
                match transparent_argument(call) {
                    Some(argument) => {
                        walk_expression(self, argument);
                    }
                    None => self.push_opaque(node.span()),
                }
                VisitResult::SkipChildren
            }
            _ => {
                self.push_opaque(node.span());
                VisitResult::SkipChildren
            }
        }
    }

    fn visit_literal(&mut self, node: &Literal) -> VisitResult {
        let value = Value::new(node.value.clone(), self.location(node.value_span));
        self.rvalue.values.push(value);
        VisitResult::Continue
    }

    fn visit_reference(&mut self, node: &Reference) -> VisitResult {
        self.rvalue.variables.push(ReferencedVariable {
            variable: Variable::from_reference(node),
            text: node.path(),
            location: self.location(node.span),
        });
        VisitResult::Continue
    }

    fn visit_template(&mut self, _node: &Template) -> VisitResult {
        self.template_text_seen.push(false);
        VisitResult::Continue
    }

    fn leave_template(&mut self, _node: &Template) {
        self.template_text_seen.pop();
    }

    fn visit_template_part(&mut self, node: &TemplatePart) -> VisitResult {
        if let TemplatePart::Text { text, span } = node {
            if !text.is_empty() && self.template_text_seen.last() == Some(&false) {
                let value = Value::new(text.clone(), self.location(*span));
                self.rvalue.values.push(value);
                if let Some(seen) = self.template_text_seen.last_mut() {
                    *seen = true;
                }
            }
        }
        VisitResult::Continue
    }
}
