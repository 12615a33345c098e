//! `group:artifact:version` dependency coordinates.

use std::sync::LazyLock;

use buildmodel_core::Location;
use regex::Regex;

use super::context::strip_quotes;
use super::model::{Assignment, Variable};
use super::resolver::VariableResolver;

static COORDINATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\s]+):([^:\s]+):([^:\s]+)$").unwrap());

/// `$name` or `${name}` and nothing else.
static PURE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$(?:\{\s*([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\s*\}|([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*))$")
        .unwrap()
});

/// Every `$name`/`${name}` occurrence.
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{?\s*([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)").unwrap());

/// One `:`-separated part of a coordinate, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMatch {
    pub text: String,
    pub location: Location,
}

/// The three parts of a matched coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateMatch {
    pub group: DimensionMatch,
    pub artifact: DimensionMatch,
    pub version: DimensionMatch,
}

impl CoordinateMatch {
    pub fn dimensions(&self) -> [&DimensionMatch; 3] {
        [&self.group, &self.artifact, &self.version]
    }

    /// `group:artifact` as written.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group.text, self.artifact.text)
    }
}

/// Split the raw right-hand side of `assignment` into coordinate parts.
///
/// Returns `None` when the text is not a three-part coordinate.
pub fn match_coordinate(assignment: &Assignment) -> Option<CoordinateMatch> {
    let raw = assignment.raw_rvalue_text.as_deref()?;
    let (inner, offset) = strip_quotes(raw);
    let captures = COORDINATE.captures(inner)?;
    let dimension = |index: usize| {
        captures.get(index).map(|m| DimensionMatch {
            text: m.as_str().to_string(),
            location: assignment
                .rvalue_location
                .sub_location(offset + m.start(), m.len()),
        })
    };
    Some(CoordinateMatch {
        group: dimension(1)?,
        artifact: dimension(2)?,
        version: dimension(3)?,
    })
}

/// A coordinate part after variable resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDimension {
    pub value: String,
    pub locations: Vec<Location>,
}

/// Resolve one coordinate part.
///
/// A literal part is its own value. A part that is exactly one `$name`
/// reference takes the variable's value and points only at the variable's
/// assignments. A part mixing text and references has no value; it points at
/// itself and at every referenced variable.
pub fn resolve_dimension(
    resolver: &VariableResolver<'_>,
    dimension: &DimensionMatch,
) -> ResolvedDimension {
    if let Some(captures) = PURE_REFERENCE.captures(&dimension.text) {
        let Some(name) = captures.get(1).or_else(|| captures.get(2)) else {
            return ResolvedDimension::default();
        };
        let resolution = resolver.resolve([Variable::from_path(name.as_str())]);
        return ResolvedDimension {
            value: resolution.value,
            locations: resolution.locations,
        };
    }
    if dimension.text.contains('$') {
        let seeds: Vec<Variable> = REFERENCE
            .captures_iter(&dimension.text)
            .filter_map(|c| c.get(1))
            .map(|m| Variable::from_path(m.as_str()))
            .collect();
        let resolution = resolver.resolve(seeds);
        let mut locations = vec![dimension.location];
        locations.extend(resolution.locations);
        return ResolvedDimension {
            value: String::new(),
            locations,
        };
    }
    ResolvedDimension {
        value: dimension.text.clone(),
        locations: vec![dimension.location],
    }
}
