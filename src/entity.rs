//! Entities extracted from a build script.
//!
//! An [`Entity`] is one editable item (a dependency, a version, a
//! repository) together with live bindings into the source it came from.
//! Entities are grouped into [`EntityGroup`]s for display.

use std::collections::BTreeSet;
use std::fmt;

use buildmodel_core::SourceBinding;
use serde::{Deserialize, Serialize};

pub const VERSIONS_GROUP: &str = "Versions";
pub const DEPENDENCIES_GROUP: &str = "Dependencies";
pub const REPOSITORIES_GROUP: &str = "Repositories";

/// Flags describing how an entity relates to the file being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metadata {
    /// Can be deleted with [`crate::remove_entity`].
    Removable,
    /// Declared here for other projects (`allprojects`/`subprojects`).
    Outgoing,
    /// Declared in another file and inherited.
    Injected,
    /// A built-in shorthand whose details cannot be edited.
    ReadOnly,
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metadata::Removable => "REMOVABLE",
            Metadata::Outgoing => "OUTGOING",
            Metadata::Injected => "INJECTED",
            Metadata::ReadOnly => "READ_ONLY",
        };
        f.write_str(name)
    }
}

/// One resolved part of a dependency coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundValue {
    pub value: String,
    pub bindings: Vec<SourceBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDependency {
    /// Configuration the dependency is declared in, e.g. `compile`.
    pub configuration: String,
    pub group: BoundValue,
    pub artifact: BoundValue,
    pub version: BoundValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub url: String,
    pub help_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Dependency(ExternalDependency),
    Version,
    Repository(Repository),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Dependency(_) => "dependency",
            EntityKind::Version => "version",
            EntityKind::Repository(_) => "repository",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub display_name: String,
    pub current_value: String,
    /// Where the value comes from, including through variables.
    pub bindings: Vec<SourceBinding>,
    /// The whole declaration, deleted on removal.
    pub whole_range: Option<SourceBinding>,
    pub metadata: BTreeSet<Metadata>,
    pub kind: EntityKind,
}

impl Entity {
    pub fn has(&self, flag: Metadata) -> bool {
        self.metadata.contains(&flag)
    }
}

/// A named, ordered list of entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityGroup {
    pub name: String,
    pub entities: Vec<Entity>,
}

impl EntityGroup {
    pub fn new(name: impl Into<String>, entities: Vec<Entity>) -> Self {
        EntityGroup {
            name: name.into(),
            entities,
        }
    }
}

/// Find a group by name.
pub fn find_group<'a>(groups: &'a [EntityGroup], name: &str) -> Option<&'a EntityGroup> {
    groups.iter().find(|g| g.name == name)
}
