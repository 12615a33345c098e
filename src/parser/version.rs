//! Plugin version numbers and version windows.
//!
//! ## Grammar
//!
//! ```text
//! <version>    := <number> ("." <number>)* [<separator> <qualifier>]
//! <separator>  := "-" | "."
//! <qualifier>  := any non-whitespace text, e.g. "alpha1", "rc2", "+"
//! ```
//!
//! Versions order numerically by component, missing components counting as
//! zero. A qualified version sorts before the same unqualified release.

use std::cmp::Ordering;
use std::fmt;

use winnow::ascii::digit1;
use winnow::combinator::{opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};
use winnow::ModalResult;

#[derive(Debug, Clone, Eq)]
pub struct GradleVersion {
    components: Vec<u32>,
    qualifier: Option<String>,
}

impl GradleVersion {
    /// Build a release version from numeric components.
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        GradleVersion {
            components: components.into(),
            qualifier: None,
        }
    }

    /// Parse a version string. Returns `None` if it is not a version.
    pub fn parse(text: &str) -> Option<Self> {
        parse_version.parse(text.trim()).ok()
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The smallest version.
    pub fn zero() -> Self {
        GradleVersion::new(vec![0])
    }

    fn component(&self, index: usize) -> u32 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for GradleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for GradleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GradleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => qualifier_key(a).cmp(&qualifier_key(b)),
        }
    }
}

/// `alpha10` orders as `("alpha", 10)` so that it sorts after `alpha9`.
fn qualifier_key(qualifier: &str) -> (&str, u64, &str) {
    let split = qualifier
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(qualifier.len());
    let (word, rest) = qualifier.split_at(split);
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let number = rest[..digits].parse().unwrap_or(0);
    (word, number, &rest[digits..])
}

impl fmt::Display for GradleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.components.iter().map(u32::to_string).collect();
        write!(f, "{}", numbers.join("."))?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "-{}", qualifier)?;
        }
        Ok(())
    }
}

fn parse_version(input: &mut &str) -> ModalResult<GradleVersion> {
    let components: Vec<u32> = separated(1.., parse_component, '.').parse_next(input)?;
    let qualifier = opt(preceded(
        one_of(['-', '.']),
        take_while(1.., |c: char| !c.is_whitespace()),
    ))
    .parse_next(input)?;
    Ok(GradleVersion {
        components,
        qualifier: qualifier.map(str::to_string),
    })
}

fn parse_component(input: &mut &str) -> ModalResult<u32> {
    digit1.try_map(|s: &str| s.parse::<u32>()).parse_next(input)
}

/// A half-open window of plugin versions, `[min, max)`. No `max` means
/// unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: GradleVersion,
    pub max: Option<GradleVersion>,
}

impl VersionRange {
    pub fn new(min: GradleVersion, max: Option<GradleVersion>) -> Self {
        VersionRange { min, max }
    }

    /// Every version.
    pub fn all() -> Self {
        VersionRange::new(GradleVersion::zero(), None)
    }

    pub fn contains(&self, version: &GradleVersion) -> bool {
        *version >= self.min && self.max.as_ref().is_none_or(|max| version < max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max {
            Some(max) => write!(f, "[{}, {})", self.min, max),
            None => write!(f, "[{}, *)", self.min),
        }
    }
}
