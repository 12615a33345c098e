//! Transitive variable resolution over the assignment graph.
//!
//! Resolution starts from one or more seed variables and follows every
//! assignment's dependencies. Each variable is processed at most once, which
//! is also what stops cycles such as `a = b; b = a`. The result is the set of
//! source locations touched on the way plus a single scalar value that is
//! only non-empty when exactly one literal was found.

use std::borrow::Cow;
use std::collections::HashSet;

use buildmodel_core::{FileId, Location};
use tracing::warn;

use super::context::ParseContext;
use super::model::{Assignment, Variable};

/// Decides whether an assignment takes part in a resolution, optionally
/// replacing it.
pub type AssignmentFilter<'a> = dyn Fn(&'a Assignment) -> Option<Cow<'a, Assignment>> + 'a;

/// Output of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Value locations of every assignment visited, in visit order.
    pub locations: Vec<Location>,
    /// The single resolved value, or empty when unset or ambiguous.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ValueState {
    Unset,
    Set(String),
    Ambiguous,
}

impl ValueState {
    fn set(&mut self, text: &str) {
        *self = match self {
            ValueState::Unset => ValueState::Set(text.to_string()),
            _ => ValueState::Ambiguous,
        };
    }

    fn into_value(self) -> String {
        match self {
            ValueState::Set(value) => value,
            ValueState::Unset | ValueState::Ambiguous => String::new(),
        }
    }
}

pub struct VariableResolver<'a> {
    ctx: &'a ParseContext,
    filter: Option<Box<AssignmentFilter<'a>>>,
}

impl<'a> VariableResolver<'a> {
    pub fn new(ctx: &'a ParseContext) -> Self {
        VariableResolver { ctx, filter: None }
    }

    /// Pass every candidate assignment through `filter`. Returning `None`
    /// drops the assignment.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&'a Assignment) -> Option<Cow<'a, Assignment>> + 'a,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Resolve the seed variables.
    pub fn resolve<I>(&self, seeds: I) -> Resolution
    where
        I: IntoIterator<Item = Variable>,
    {
        let mut walk = Walk::default();
        let mut seeds: Vec<Variable> = seeds.into_iter().collect();
        seeds.reverse();
        walk.stack = seeds;
        self.run(&mut walk);
        walk.finish()
    }

    /// Resolve starting from one assignment that was found directly.
    pub fn resolve_assignment(&self, assignment: &'a Assignment) -> Resolution {
        let mut walk = Walk::default();
        walk.processed.insert(assignment.lvalue.clone());
        self.visit(assignment, &mut walk);
        self.run(&mut walk);
        walk.finish()
    }

    fn run(&self, walk: &mut Walk) {
        while let Some(variable) = walk.stack.pop() {
            if !walk.processed.insert(variable.clone()) {
                continue;
            }
            for assignment in self.candidates(&variable) {
                self.visit(assignment, walk);
            }
        }
    }

    fn candidates(&self, variable: &Variable) -> Vec<&'a Assignment> {
        let mut found = self.ctx.assignments_for_variable(variable);
        if let Some(ext) = variable.ext_variant() {
            found.extend(self.ctx.assignments_for_variable(&ext));
        }
        found
    }

    fn visit(&self, assignment: &'a Assignment, walk: &mut Walk) {
        let assignment = match &self.filter {
            Some(filter) => match filter(assignment) {
                Some(assignment) => assignment,
                None => return,
            },
            None => Cow::Borrowed(assignment),
        };

        walk.locations.push(assignment.value_binding_location());
        match &assignment.resolved_value {
            Some(value) if !value.is_empty() => walk.state.set(&value.text),
            Some(_) => walk.state = ValueState::Ambiguous,
            None => {
                if walk.state != ValueState::Unset {
                    walk.state = ValueState::Ambiguous;
                }
            }
        }
        for (dependency, _) in assignment.dependencies.iter().rev() {
            walk.stack.push(dependency.clone());
        }
    }
}

struct Walk {
    stack: Vec<Variable>,
    processed: HashSet<Variable>,
    locations: Vec<Location>,
    state: ValueState,
}

impl Default for Walk {
    fn default() -> Self {
        Walk {
            stack: Vec::new(),
            processed: HashSet::new(),
            locations: Vec::new(),
            state: ValueState::Unset,
        }
    }
}

impl Walk {
    fn finish(self) -> Resolution {
        Resolution {
            locations: self.locations,
            value: self.state.into_value(),
        }
    }
}

/// The only assignment to `variable` in `file` whose code structure is
/// exactly `path`.
///
/// Duplicates make the lookup ambiguous: a warning is logged and `None`
/// returned.
pub fn unique_assignment<'a>(
    ctx: &'a ParseContext,
    file: FileId,
    path: &[&str],
    variable: &Variable,
) -> Option<&'a Assignment> {
    let matches: Vec<&Assignment> = ctx
        .assignments_for_path(path)
        .into_iter()
        .filter(|a| a.file() == file && a.lvalue == *variable)
        .collect();
    match matches.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => {
            warn!(
                %variable,
                path = %path.join("."),
                count = matches.len(),
                "ambiguous assignment, ignoring"
            );
            None
        }
    }
}
