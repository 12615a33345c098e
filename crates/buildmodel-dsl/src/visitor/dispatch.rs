// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions for tree traversal.
//!
//! - **Pre-order**: `visit_*` is called before descending into children
//! - **Post-order**: `leave_*` is called after all children have been visited
//! - **Source order**: children are visited left-to-right, top-to-bottom
//!
//! # Control Flow
//!
//! - `VisitResult::Continue` - traverse into children
//! - `VisitResult::SkipChildren` - skip children but still call `leave_*`
//! - `VisitResult::Stop` - halt traversal immediately (no `leave_*` called)

use super::traits::{VisitResult, Visitor};
use crate::nodes::{
    Argument, Assignment, Block, Closure, Control, Expression, Literal, MapEntry, MethodCall,
    Reference, Script, Statement, Template, TemplatePart,
};

macro_rules! walk_or_stop {
    ($walk:expr) => {
        if $walk == VisitResult::Stop {
            return VisitResult::Stop;
        }
    };
}

// ============================================================================
// Script and statement walks
// ============================================================================

/// Walk a [`Script`] and every statement in it.
pub fn walk_script<V: Visitor + ?Sized>(visitor: &mut V, node: &Script) -> VisitResult {
    match visitor.visit_script(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for stmt in &node.statements {
                walk_or_stop!(walk_statement(visitor, stmt));
            }
        }
    }
    visitor.leave_script(node);
    VisitResult::Continue
}

/// Walk a [`Statement`], dispatching on its kind.
pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, node: &Statement) -> VisitResult {
    match visitor.visit_statement(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => match node {
            Statement::Assignment(a) => walk_or_stop!(walk_assignment(visitor, a)),
            Statement::Call(c) => walk_or_stop!(walk_method_call(visitor, c)),
            Statement::Expression(e) => walk_or_stop!(walk_expression(visitor, e)),
            Statement::Control(c) => walk_or_stop!(walk_control(visitor, c)),
            Statement::Import { .. } | Statement::Unparsed { .. } => {}
        },
    }
    visitor.leave_statement(node);
    VisitResult::Continue
}

/// Walk an [`Assignment`]: target, then value.
pub fn walk_assignment<V: Visitor + ?Sized>(visitor: &mut V, node: &Assignment) -> VisitResult {
    match visitor.visit_assignment(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            walk_or_stop!(walk_reference(visitor, &node.target));
            walk_or_stop!(walk_expression(visitor, &node.value));
        }
    }
    visitor.leave_assignment(node);
    VisitResult::Continue
}

/// Walk a [`Control`] statement: condition, then each body.
pub fn walk_control<V: Visitor + ?Sized>(visitor: &mut V, node: &Control) -> VisitResult {
    match visitor.visit_control(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if let Some(condition) = &node.condition {
                walk_or_stop!(walk_expression(visitor, condition));
            }
            for body in &node.bodies {
                walk_or_stop!(walk_block(visitor, body));
            }
        }
    }
    visitor.leave_control(node);
    VisitResult::Continue
}

/// Walk a [`Block`].
pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, node: &Block) -> VisitResult {
    match visitor.visit_block(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for stmt in &node.statements {
                walk_or_stop!(walk_statement(visitor, stmt));
            }
        }
    }
    visitor.leave_block(node);
    VisitResult::Continue
}

// ============================================================================
// Call walks
// ============================================================================

/// Walk a [`MethodCall`]: receiver, callee, arguments, then closure.
pub fn walk_method_call<V: Visitor + ?Sized>(visitor: &mut V, node: &MethodCall) -> VisitResult {
    match visitor.visit_method_call(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if let Some(receiver) = &node.receiver {
                walk_or_stop!(walk_expression(visitor, receiver));
            }
            walk_or_stop!(walk_reference(visitor, &node.callee));
            for arg in &node.arguments {
                walk_or_stop!(walk_argument(visitor, arg));
            }
            if let Some(closure) = &node.closure {
                walk_or_stop!(walk_closure(visitor, closure));
            }
        }
    }
    visitor.leave_method_call(node);
    VisitResult::Continue
}

/// Walk an [`Argument`]. Only the value of a named argument is walked.
pub fn walk_argument<V: Visitor + ?Sized>(visitor: &mut V, node: &Argument) -> VisitResult {
    match visitor.visit_argument(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => match node {
            Argument::Positional(e) => walk_or_stop!(walk_expression(visitor, e)),
            Argument::Named { value, .. } => walk_or_stop!(walk_expression(visitor, value)),
        },
    }
    visitor.leave_argument(node);
    VisitResult::Continue
}

/// Walk a [`Closure`] body.
pub fn walk_closure<V: Visitor + ?Sized>(visitor: &mut V, node: &Closure) -> VisitResult {
    match visitor.visit_closure(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for stmt in &node.statements {
                walk_or_stop!(walk_statement(visitor, stmt));
            }
        }
    }
    visitor.leave_closure(node);
    VisitResult::Continue
}

// ============================================================================
// Expression walks
// ============================================================================

/// Walk an [`Expression`], dispatching on its kind.
pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, node: &Expression) -> VisitResult {
    match visitor.visit_expression(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => match node {
            Expression::Literal(l) => walk_or_stop!(walk_literal(visitor, l)),
            Expression::Template(t) => walk_or_stop!(walk_template(visitor, t)),
            Expression::Reference(r) => walk_or_stop!(walk_reference(visitor, r)),
            Expression::Call(c) => walk_or_stop!(walk_method_call(visitor, c)),
            Expression::Closure(c) => walk_or_stop!(walk_closure(visitor, c)),
            Expression::Binary { left, right, .. } => {
                walk_or_stop!(walk_expression(visitor, left));
                walk_or_stop!(walk_expression(visitor, right));
            }
            Expression::Unary { operand, .. } => walk_or_stop!(walk_expression(visitor, operand)),
            Expression::List { elements, .. } => {
                for element in elements {
                    walk_or_stop!(walk_expression(visitor, element));
                }
            }
            Expression::Map { entries, .. } => {
                for entry in entries {
                    walk_or_stop!(walk_map_entry(visitor, entry));
                }
            }
            Expression::PropertyAccess { receiver, .. } => {
                walk_or_stop!(walk_expression(visitor, receiver))
            }
            Expression::Index { target, index, .. } => {
                walk_or_stop!(walk_expression(visitor, target));
                walk_or_stop!(walk_expression(visitor, index));
            }
            Expression::Ternary {
                condition,
                then,
                otherwise,
                ..
            } => {
                walk_or_stop!(walk_expression(visitor, condition));
                if let Some(then) = then {
                    walk_or_stop!(walk_expression(visitor, then));
                }
                walk_or_stop!(walk_expression(visitor, otherwise));
            }
            Expression::Paren { inner, .. } => walk_or_stop!(walk_expression(visitor, inner)),
            Expression::Unparsed { .. } => {}
        },
    }
    visitor.leave_expression(node);
    VisitResult::Continue
}

/// Visit a [`Literal`] (a leaf).
pub fn walk_literal<V: Visitor + ?Sized>(visitor: &mut V, node: &Literal) -> VisitResult {
    if visitor.visit_literal(node) == VisitResult::Stop {
        return VisitResult::Stop;
    }
    visitor.leave_literal(node);
    VisitResult::Continue
}

/// Visit a [`Reference`] (a leaf).
pub fn walk_reference<V: Visitor + ?Sized>(visitor: &mut V, node: &Reference) -> VisitResult {
    if visitor.visit_reference(node) == VisitResult::Stop {
        return VisitResult::Stop;
    }
    visitor.leave_reference(node);
    VisitResult::Continue
}

/// Walk a [`Template`] and its parts.
pub fn walk_template<V: Visitor + ?Sized>(visitor: &mut V, node: &Template) -> VisitResult {
    match visitor.visit_template(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for part in &node.parts {
                walk_or_stop!(walk_template_part(visitor, part));
            }
        }
    }
    visitor.leave_template(node);
    VisitResult::Continue
}

/// Walk a [`TemplatePart`]; interpolations walk their expression.
pub fn walk_template_part<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: &TemplatePart,
) -> VisitResult {
    match visitor.visit_template_part(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if let TemplatePart::Interpolation { expression, .. } = node {
                walk_or_stop!(walk_expression(visitor, expression));
            }
        }
    }
    visitor.leave_template_part(node);
    VisitResult::Continue
}

/// Walk a [`MapEntry`]: key, then value.
pub fn walk_map_entry<V: Visitor + ?Sized>(visitor: &mut V, node: &MapEntry) -> VisitResult {
    match visitor.visit_map_entry(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            walk_or_stop!(walk_expression(visitor, &node.key));
            walk_or_stop!(walk_expression(visitor, &node.value));
        }
    }
    visitor.leave_map_entry(node);
    VisitResult::Continue
}
