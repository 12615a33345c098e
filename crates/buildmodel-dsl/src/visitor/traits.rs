// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait and traversal control.

use crate::nodes::{
    Argument, Assignment, Block, Closure, Control, Expression, Literal, MapEntry, MethodCall,
    Reference, Script, Statement, Template, TemplatePart,
};

/// Controls how a walk proceeds after a `visit_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    ///
    /// After visiting children, `leave_*` will be called for this node.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// The walker will not descend into this node's children, but `leave_*`
    /// will still be called for this node.
    SkipChildren,

    /// Stop traversal entirely. No further `visit_*` or `leave_*` calls are made.
    Stop,
}

/// Macro to generate visitor trait method signatures.
///
/// For each `name: Type` pair this generates `visit_name` and `leave_name`
/// with default implementations that return `VisitResult::Continue` and do
/// nothing, respectively.
macro_rules! visitor_methods {
    (
        $(
            $(#[$meta:meta])*
            $base_name:ident : $node_type:ty
        ),* $(,)?
    ) => {
        paste::paste! {
            $(
                $(#[$meta])*
                #[doc = concat!("Visit a [`", stringify!($node_type), "`] node.")]
                #[doc = ""]
                #[doc = "Called before descending into children. Return `VisitResult` to control traversal."]
                #[allow(unused_variables)]
                fn [<visit_ $base_name>](&mut self, node: &$node_type) -> VisitResult {
                    VisitResult::Continue
                }

                $(#[$meta])*
                #[doc = concat!("Leave a [`", stringify!($node_type), "`] node.")]
                #[doc = ""]
                #[doc = "Called after all children have been visited. Called even if `SkipChildren` was returned."]
                #[allow(unused_variables)]
                fn [<leave_ $base_name>](&mut self, node: &$node_type) {}
            )*
        }
    };
}

/// Read-only traversal of a script tree.
///
/// Every method has a default implementation, so implementors override only
/// the node types they care about. Drive a visitor with the `walk_*`
/// functions in [`super::dispatch`].
pub trait Visitor {
    // Script and statements
    visitor_methods! {
        script: Script,
        statement: Statement,
        assignment: Assignment,
        control: Control,
        block: Block,
    }

    // Calls
    visitor_methods! {
        method_call: MethodCall,
        argument: Argument,
        closure: Closure,
    }

    // Expressions
    visitor_methods! {
        expression: Expression,
        literal: Literal,
        template: Template,
        template_part: TemplatePart,
        reference: Reference,
        map_entry: MapEntry,
    }
}
