//! The assignment store for one parse pass.
//!
//! A [`ParseContext`] collects the assignments of every file parsed for one
//! request, keeps the stack of enclosing block calls and indexes assignments
//! by variable and by code structure.

use std::collections::HashMap;

use buildmodel_core::{FileId, Location, Span};
use tracing::trace;

use super::extractor::ExtractedRvalue;
use super::model::{Assignment, Value, Variable, NO_ARGS_MARKER};

/// The block that turns plain assignments into extra properties.
const EXT_BLOCK: &str = "ext";

/// The right-hand side being registered, as raw source.
#[derive(Debug, Clone, Copy)]
pub struct Rvalue<'a> {
    pub span: Span,
    /// Source text covered by `span`.
    pub text: &'a str,
    /// The whole statement the right-hand side belongs to.
    pub statement: Span,
}

#[derive(Debug)]
pub struct ParseContext {
    target_file: FileId,
    current_file: FileId,
    blocks: Vec<(String, Location)>,
    assignments: Vec<Assignment>,
    by_variable: HashMap<Variable, Vec<usize>>,
    by_path: HashMap<Vec<String>, Vec<usize>>,
}

impl ParseContext {
    /// Start a parse pass whose target is `target_file`.
    pub fn new(target_file: FileId) -> Self {
        ParseContext {
            target_file,
            current_file: target_file,
            blocks: Vec::new(),
            assignments: Vec::new(),
            by_variable: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// The file entities are built for.
    pub fn target_file(&self) -> FileId {
        self.target_file
    }

    /// The file new assignments are attributed to.
    pub fn current_file(&self) -> FileId {
        self.current_file
    }

    /// Attribute subsequent assignments to `file`.
    pub fn on_change_file(&mut self, file: FileId) {
        self.current_file = file;
        self.blocks.clear();
    }

    /// Location of `span` in the current file.
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.current_file, span)
    }

    pub fn on_method_enter(&mut self, name: &str, location: Location) {
        self.blocks.push((name.to_string(), location));
    }

    pub fn on_method_exit(&mut self) {
        self.blocks.pop();
    }

    /// Names of the currently open blocks, outermost first.
    pub fn code_structure(&self) -> Vec<String> {
        self.blocks.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Turn an extracted right-hand side into an assignment to `lvalue`.
    ///
    /// Returns `false` and registers nothing when nothing was extracted.
    pub fn register_assignment_from_cached_data(
        &mut self,
        lvalue: Variable,
        lvalue_location: Location,
        rvalue: Rvalue<'_>,
        cache: ExtractedRvalue,
    ) -> bool {
        if cache.is_empty() {
            return false;
        }
        let rvalue_location = self.location(rvalue.span);
        let (mut values, variables) = cache.into_parts();

        let (resolved_value, dependencies) = if variables.is_empty() {
            let value = if values.len() > 1 {
                Value::opaque(rvalue_location)
            } else {
                values.remove(0)
            };
            (Some(value), Vec::new())
        } else if variables.len() == 1 && is_simple_reference(rvalue.text, &variables[0].text) {
            let dependencies = variables
                .into_iter()
                .map(|v| (v.variable, v.location))
                .collect();
            (None, dependencies)
        } else {
            let dependencies = variables
                .into_iter()
                .map(|v| (v.variable, v.location))
                .collect();
            (Some(Value::opaque(rvalue_location)), dependencies)
        };

        let assignment = Assignment {
            lvalue: self.qualify(lvalue),
            lvalue_location,
            rvalue_location,
            statement_location: self.location(rvalue.statement),
            code_structure: self.code_structure(),
            block_locations: self.blocks.iter().map(|(_, loc)| *loc).collect(),
            resolved_value,
            raw_rvalue_text: Some(rvalue.text.to_string()),
            dependencies,
        };
        self.insert(assignment);
        true
    }

    /// Record an argument-less call such as `mavenCentral()`.
    pub fn register_no_args_marker(
        &mut self,
        lvalue: Variable,
        lvalue_location: Location,
        call: Span,
    ) {
        let call_location = self.location(call);
        let assignment = Assignment {
            lvalue: self.qualify(lvalue),
            lvalue_location,
            rvalue_location: call_location,
            statement_location: call_location,
            code_structure: self.code_structure(),
            block_locations: self.blocks.iter().map(|(_, loc)| *loc).collect(),
            resolved_value: Some(Value::new(NO_ARGS_MARKER, call_location)),
            raw_rvalue_text: None,
            dependencies: Vec::new(),
        };
        self.insert(assignment);
    }

    /// Assignments directly inside an `ext { }` block define extra properties.
    fn qualify(&self, lvalue: Variable) -> Variable {
        match self.blocks.last() {
            Some((name, _)) if name == EXT_BLOCK => lvalue.in_ext(),
            _ => lvalue,
        }
    }

    fn insert(&mut self, assignment: Assignment) {
        trace!(
            lvalue = %assignment.lvalue,
            path = ?assignment.code_structure,
            file = %assignment.file(),
            "registered assignment"
        );
        let index = self.assignments.len();
        self.by_variable
            .entry(assignment.lvalue.clone())
            .or_default()
            .push(index);
        self.by_path
            .entry(assignment.code_structure.clone())
            .or_default()
            .push(index);
        self.assignments.push(assignment);
    }

    /// All assignments, in registration order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Assignments to `variable`, in registration order.
    pub fn assignments_for_variable(&self, variable: &Variable) -> Vec<&Assignment> {
        self.lookup(self.by_variable.get(variable))
    }

    /// Assignments whose code structure is exactly `path`.
    pub fn assignments_for_path(&self, path: &[&str]) -> Vec<&Assignment> {
        let key: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.lookup(self.by_path.get(&key))
    }

    fn lookup(&self, indices: Option<&Vec<usize>>) -> Vec<&Assignment> {
        indices
            .map(|indices| indices.iter().map(|&i| &self.assignments[i]).collect())
            .unwrap_or_default()
    }
}

/// Strip one level of string quotes (`'`, `"`, `'''` or `"""`).
///
/// Returns the inner text and the byte offset it starts at.
pub fn strip_quotes(text: &str) -> (&str, usize) {
    for quote in ["'''", "\"\"\"", "'", "\""] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            return (&text[quote.len()..text.len() - quote.len()], quote.len());
        }
    }
    (text, 0)
}

/// Whether `raw` is nothing but a reference to `name`: `name`, `$name` or
/// `${name}`, optionally quoted.
fn is_simple_reference(raw: &str, name: &str) -> bool {
    let (inner, _) = strip_quotes(raw.trim());
    if inner == name {
        return true;
    }
    match inner.strip_prefix('$') {
        Some(rest) if rest == name => true,
        Some(rest) => rest
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .is_some_and(|r| r.trim() == name),
        None => false,
    }
}
