//! buildmodel: source-bound model extraction for Gradle build scripts.
//!
//! Reads a build script (and, for a module, its parent build script) and
//! produces editable entities for its dependencies, tool versions and
//! repositories. Every entity keeps live bindings to the source text its
//! value comes from, including through variable indirection, so callers can
//! navigate to it or remove it after other edits.
//!
//! ```no_run
//! use buildmodel::{BuildFileParser, BuildModelConfig, Project};
//!
//! let mut project = Project::new("/path/to/project");
//! let file = project.open("app/build.gradle").unwrap();
//! let groups = BuildFileParser::new(BuildModelConfig::default()).parse(file, &mut project);
//! for group in &groups {
//!     println!("{}: {} entities", group.name, group.entities.len());
//! }
//! ```

pub mod config;
pub mod entity;
pub mod output;
pub mod parser;
pub mod remove;

pub use buildmodel_core::{BuildModelError, FileId, Location, Project, Result, SourceBinding, Span};
pub use config::BuildModelConfig;
pub use entity::{
    find_group, BoundValue, Entity, EntityGroup, EntityKind, ExternalDependency, Metadata,
    Repository, DEPENDENCIES_GROUP, REPOSITORIES_GROUP, VERSIONS_GROUP,
};
pub use parser::BuildFileParser;
pub use remove::remove_entity;
