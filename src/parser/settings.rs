//! Module declarations from a settings script.
//!
//! Only `include` directives are read:
//!
//! ```text
//! include ':app', ':libs:core'
//! include(':wear')
//! ```
//!
//! Each argument is a module path:
//!
//! ```text
//! <path>    := [":"] <segment> (":" <segment>)*
//! <segment> := one or more characters other than ":" and whitespace
//! ```

use std::fmt;

use buildmodel_dsl::visitor::walk_script;
use buildmodel_dsl::{Expression, LiteralKind, MethodCall, Script, VisitResult, Visitor};
use tracing::debug;
use winnow::combinator::{opt, separated};
use winnow::prelude::*;
use winnow::token::take_while;
use winnow::ModalResult;

const INCLUDE: &str = "include";

/// A declared module, e.g. `:libs:core` as `["libs", "core"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// Parse `:a:b` (the leading colon is optional).
    pub fn parse(text: &str) -> Option<Self> {
        parse_module_path.parse(text.trim()).ok()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, ":{}", segment)?;
        }
        Ok(())
    }
}

fn parse_module_path(input: &mut &str) -> ModalResult<ModulePath> {
    opt(':').parse_next(input)?;
    let segments: Vec<&str> = separated(1.., parse_segment, ':').parse_next(input)?;
    Ok(ModulePath(segments.into_iter().map(str::to_string).collect()))
}

fn parse_segment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c != ':' && !c.is_whitespace()).parse_next(input)
}

/// The modules a settings script declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    modules: Vec<ModulePath>,
}

impl Settings {
    /// Read the `include` directives of a parsed settings script.
    pub fn from_script(script: &Script) -> Self {
        let mut collector = IncludeCollector::default();
        walk_script(&mut collector, script);
        Settings {
            modules: collector.modules,
        }
    }

    pub fn parse(source: &str) -> Self {
        Settings::from_script(&buildmodel_dsl::parse_script(source))
    }

    /// Whether a module with exactly these path segments is declared.
    pub fn declares<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.modules.iter().any(|m| {
            m.0.len() == segments.len()
                && m.0.iter().zip(segments).all(|(a, b)| a == b.as_ref())
        })
    }
}

#[derive(Default)]
struct IncludeCollector {
    modules: Vec<ModulePath>,
}

impl Visitor for IncludeCollector {
    fn visit_method_call(&mut self, node: &MethodCall) -> VisitResult {
        if node.receiver.is_some() || node.callee.path() != INCLUDE {
            return VisitResult::SkipChildren;
        }
        for argument in node.positional() {
            let Expression::Literal(literal) = argument else {
                debug!(span = %argument.span(), "ignoring computed include");
                continue;
            };
            if literal.kind != LiteralKind::String {
                continue;
            }
            match ModulePath::parse(&literal.value) {
                Some(path) => self.modules.push(path),
                None => debug!(path = %literal.value, "ignoring malformed module path"),
            }
        }
        VisitResult::SkipChildren
    }

    fn visit_expression(&mut self, _node: &Expression) -> VisitResult {
        VisitResult::SkipChildren
    }
}
