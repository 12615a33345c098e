//! Assignment records extracted from build scripts.
//!
//! A script is reduced to a flat list of [`Assignment`]s. Both `x = value`
//! statements and DSL calls such as `classpath 'a:b:1.0'` become assignments:
//! the callee plays the role of the lvalue.

use std::fmt;

use buildmodel_core::{FileId, Location};
use buildmodel_dsl::Reference;

/// Value text recorded for an argument-less call such as `mavenCentral()`.
pub const NO_ARGS_MARKER: &str = "()";

/// Qualifier prefixes that refer to the current project and carry no
/// information of their own.
const PROJECT_PREFIXES: &[&str] = &["project", "rootProject"];

// ============================================================================
// Variable
// ============================================================================

/// A (possibly qualified) variable name. `a.b.c` is `c` qualified by `[a, b]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub name: String,
    pub qualifier: Vec<String>,
}

impl Variable {
    /// Create a variable, dropping leading `project`/`rootProject` segments.
    pub fn new(name: impl Into<String>, qualifier: Vec<String>) -> Self {
        let skip = qualifier
            .iter()
            .take_while(|s| PROJECT_PREFIXES.contains(&s.as_str()))
            .count();
        Variable {
            name: name.into(),
            qualifier: qualifier.into_iter().skip(skip).collect(),
        }
    }

    /// An unqualified variable.
    pub fn simple(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            qualifier: Vec::new(),
        }
    }

    /// Parse a dotted path such as `ext.supportVersion`.
    pub fn from_path(path: &str) -> Self {
        let mut segments: Vec<String> = path.split('.').map(str::to_string).collect();
        let name = segments.pop().unwrap_or_default();
        Variable::new(name, segments)
    }

    pub fn from_reference(reference: &Reference) -> Self {
        Variable::new(reference.name(), reference.qualifier())
    }

    /// The `ext`-qualified variant of an unqualified variable.
    pub fn ext_variant(&self) -> Option<Variable> {
        if !self.qualifier.is_empty() {
            return None;
        }
        Some(Variable {
            name: self.name.clone(),
            qualifier: vec!["ext".to_string()],
        })
    }

    /// Prefix the qualifier with `ext` unless it already starts with it.
    pub fn in_ext(mut self) -> Self {
        if self.qualifier.first().map(String::as_str) != Some("ext") {
            self.qualifier.insert(0, "ext".to_string());
        }
        self
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.qualifier {
            write!(f, "{}.", segment)?;
        }
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Value
// ============================================================================

/// A literal value, or an opaque placeholder with empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub text: String,
    pub location: Location,
}

impl Value {
    pub fn new(text: impl Into<String>, location: Location) -> Self {
        Value {
            text: text.into(),
            location,
        }
    }

    /// A value that could not be evaluated.
    pub fn opaque(location: Location) -> Self {
        Value {
            text: String::new(),
            location,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// One assignment to a variable, as found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lvalue: Variable,
    pub lvalue_location: Location,
    pub rvalue_location: Location,
    /// The whole statement the assignment came from.
    pub statement_location: Location,
    /// Names of the enclosing block calls, outermost first.
    pub code_structure: Vec<String>,
    /// Locations of the enclosing block calls, parallel to `code_structure`.
    pub block_locations: Vec<Location>,
    /// `None` when the assignment only delegates to its single dependency.
    pub resolved_value: Option<Value>,
    pub raw_rvalue_text: Option<String>,
    /// Referenced variables in source order, with the reference location.
    pub dependencies: Vec<(Variable, Location)>,
}

impl Assignment {
    pub fn file(&self) -> FileId {
        self.lvalue_location.file_id
    }

    /// Whether this records an argument-less call rather than a value.
    pub fn is_no_args_marker(&self) -> bool {
        self.raw_rvalue_text.is_none()
            && self
                .resolved_value
                .as_ref()
                .is_some_and(|v| v.text == NO_ARGS_MARKER)
    }

    /// Where an editor should point for this assignment's value: the unquoted
    /// literal when there is one, otherwise the whole right-hand side.
    pub fn value_binding_location(&self) -> Location {
        match &self.resolved_value {
            Some(value) if !value.is_empty() => value.location,
            _ => self.rvalue_location,
        }
    }
}
