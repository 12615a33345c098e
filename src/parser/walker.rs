//! Feeds the statements of a parsed script into a [`ParseContext`].

use buildmodel_core::{Location, Span};
use buildmodel_dsl::visitor::walk_script;
use buildmodel_dsl::{
    Argument, Assignment, Control, Expression, MethodCall, Script, Statement, VisitResult,
    Visitor,
};
use tracing::debug;

use super::context::{ParseContext, Rvalue};
use super::extractor::extract;
use super::model::Variable;

/// Keyword of a method definition; its body is not configuration.
const METHOD_DEFINITION: &str = "def";

/// Register every assignment in `script` with `ctx`.
///
/// `source` must be the text `script` was parsed from.
pub fn register_script(ctx: &mut ParseContext, script: &Script, source: &str) {
    for error in &script.errors {
        debug!(file = %ctx.current_file(), %error, "skipping unparsed statement");
    }
    let mut walker = ScriptWalker { ctx, source };
    walk_script(&mut walker, script);
}

struct ScriptWalker<'a> {
    ctx: &'a mut ParseContext,
    source: &'a str,
}

impl ScriptWalker<'_> {
    fn register(
        &mut self,
        lvalue: Variable,
        lvalue_location: Location,
        value: &Expression,
        statement: Span,
    ) {
        let span = value.span();
        let Some(text) = span.slice(self.source) else {
            return;
        };
        let cache = extract(self.ctx.current_file(), value);
        let rvalue = Rvalue {
            span,
            text,
            statement,
        };
        self.ctx
            .register_assignment_from_cached_data(lvalue, lvalue_location, rvalue, cache);
    }

    /// Whether `call` opens a configuration block.
    fn opens_block(call: &MethodCall) -> bool {
        call.receiver.is_none() && call.closure.is_some()
    }
}

impl Visitor for ScriptWalker<'_> {
    fn visit_statement(&mut self, node: &Statement) -> VisitResult {
        match node {
            Statement::Assignment(_) | Statement::Call(_) | Statement::Control(_) => {
                VisitResult::Continue
            }
            Statement::Expression(_) | Statement::Import { .. } | Statement::Unparsed { .. } => {
                VisitResult::SkipChildren
            }
        }
    }

    fn visit_control(&mut self, node: &Control) -> VisitResult {
        if node.keyword.name == METHOD_DEFINITION {
            VisitResult::SkipChildren
        } else {
            VisitResult::Continue
        }
    }

    fn visit_expression(&mut self, _node: &Expression) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_argument(&mut self, _node: &Argument) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_assignment(&mut self, node: &Assignment) -> VisitResult {
        let lvalue = Variable::from_reference(&node.target);
        let lvalue_location = self.ctx.location(node.target.span);
        self.register(lvalue, lvalue_location, &node.value, node.span);
        VisitResult::SkipChildren
    }

    fn visit_method_call(&mut self, node: &MethodCall) -> VisitResult {
        if node.receiver.is_some() {
            return VisitResult::SkipChildren;
        }
        let lvalue = Variable::from_reference(&node.callee);
        let lvalue_location = self.ctx.location(node.callee.span);

        for argument in &node.arguments {
            let Argument::Positional(value) = argument else {
                continue;
            };
            // Sibling arguments are declared separately.
            let statement = if node.arguments.len() == 1 {
                node.span
            } else {
                argument.span()
            };
            self.register(lvalue.clone(), lvalue_location, value, statement);
        }
        if node.arguments.is_empty() && node.closure.is_none() && node.parenthesized {
            self.ctx
                .register_no_args_marker(lvalue, lvalue_location, node.span);
        }

        if !Self::opens_block(node) {
            return VisitResult::SkipChildren;
        }
        let location = self.ctx.location(node.span);
        for segment in &node.callee.segments {
            self.ctx.on_method_enter(&segment.name, location);
        }
        VisitResult::Continue
    }

    fn leave_method_call(&mut self, node: &MethodCall) {
        if Self::opens_block(node) {
            for _ in &node.callee.segments {
                self.ctx.on_method_exit();
            }
        }
    }
}
