// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure for script traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for `visit_*` methods
//! - **Post-order** for `leave_*` methods
//! - Children are visited in source order (left-to-right, top-to-bottom)
//!
//! # Visitor Pattern
//!
//! ```
//! use buildmodel_dsl::visitor::{walk_script, VisitResult, Visitor};
//! use buildmodel_dsl::{parse_script, Reference};
//!
//! struct ReferenceCounter {
//!     count: usize,
//! }
//!
//! impl Visitor for ReferenceCounter {
//!     fn visit_reference(&mut self, _node: &Reference) -> VisitResult {
//!         self.count += 1;
//!         VisitResult::Continue
//!     }
//! }
//!
//! let script = parse_script("a = b\nc = d");
//! let mut counter = ReferenceCounter { count: 0 };
//! walk_script(&mut counter, &script);
//! assert_eq!(counter.count, 4);
//! ```

mod dispatch;
mod traits;

pub use dispatch::{
    walk_argument, walk_assignment, walk_block, walk_closure, walk_control, walk_expression,
    walk_literal, walk_map_entry, walk_method_call, walk_reference, walk_script, walk_statement,
    walk_template, walk_template_part,
};
pub use traits::{VisitResult, Visitor};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Closure, Literal, MethodCall};
    use crate::parse_script;

    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
        skip_closures: bool,
        stop_at_literal: Option<String>,
    }

    impl Visitor for EventLog {
        fn visit_method_call(&mut self, node: &MethodCall) -> VisitResult {
            self.events.push(format!("enter {}", node.callee.path()));
            VisitResult::Continue
        }

        fn leave_method_call(&mut self, node: &MethodCall) {
            self.events.push(format!("leave {}", node.callee.path()));
        }

        fn visit_closure(&mut self, _node: &Closure) -> VisitResult {
            if self.skip_closures {
                VisitResult::SkipChildren
            } else {
                VisitResult::Continue
            }
        }

        fn visit_literal(&mut self, node: &Literal) -> VisitResult {
            self.events.push(format!("literal {}", node.value));
            if self.stop_at_literal.as_deref() == Some(node.value.as_str()) {
                VisitResult::Stop
            } else {
                VisitResult::Continue
            }
        }
    }

    const SOURCE: &str = "dependencies {\n  compile 'a:b:1'\n}\nx = 'after'\n";

    #[test]
    fn pre_and_post_order() {
        let script = parse_script(SOURCE);
        let mut log = EventLog::default();
        assert_eq!(walk_script(&mut log, &script), VisitResult::Continue);
        assert_eq!(
            log.events,
            vec![
                "enter dependencies",
                "enter compile",
                "literal a:b:1",
                "leave compile",
                "leave dependencies",
                "literal after",
            ]
        );
    }

    #[test]
    fn skip_children_still_leaves() {
        let script = parse_script(SOURCE);
        let mut log = EventLog {
            skip_closures: true,
            ..Default::default()
        };
        walk_script(&mut log, &script);
        assert_eq!(
            log.events,
            vec!["enter dependencies", "leave dependencies", "literal after"]
        );
    }

    #[test]
    fn stop_halts_traversal() {
        let script = parse_script(SOURCE);
        let mut log = EventLog {
            stop_at_literal: Some("a:b:1".to_string()),
            ..Default::default()
        };
        assert_eq!(walk_script(&mut log, &script), VisitResult::Stop);
        assert_eq!(
            log.events,
            vec!["enter dependencies", "enter compile", "literal a:b:1"]
        );
    }
}
