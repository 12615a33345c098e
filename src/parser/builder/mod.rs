//! Version-scoped entity builders.
//!
//! # Architecture
//!
//! A builder turns the assignments of a [`ParseContext`] into
//! [`EntityGroup`]s. Build scripts change meaning between plugin versions, so
//! builders are registered in a [`BuilderTable`] against a [`VersionRange`]
//! and the facade picks the first whose range contains the detected plugin
//! version.
//!
//! Builders receive the [`Project`] mutably only to create source bindings;
//! they never edit documents.

mod v1;

pub use v1::DefaultBuilder;

use std::collections::BTreeSet;
use std::fmt;

use buildmodel_core::{Location, Project, SourceBinding};

use super::context::ParseContext;
use super::coordinate::{match_coordinate, CoordinateMatch};
use super::model::Assignment;
use super::version::{GradleVersion, VersionRange};
use crate::config::BuildModelConfig;
use crate::entity::{EntityGroup, Metadata};

/// First code-structure segments whose contents other projects inherit.
const INHERITED_BLOCKS: &[&str] = &["allprojects", "subprojects"];

/// Where build plugins are put on the classpath.
pub(crate) const PLUGIN_CLASSPATH_PATH: &[&str] = &["buildscript", "dependencies"];
const CLASSPATH: &str = "classpath";

/// Converts a parse context into entity groups.
pub trait EntityBuilder {
    /// Build the groups for `ctx.target_file()`. Empty groups are omitted.
    fn build(&self, ctx: &ParseContext, project: &mut Project) -> Vec<EntityGroup>;
}

/// Creates a builder for one request.
pub type BuilderFactory = fn(&BuildModelConfig) -> Box<dyn EntityBuilder>;

/// Ordered `(range, factory)` pairs; the first matching range wins.
#[derive(Clone)]
pub struct BuilderTable {
    entries: Vec<(VersionRange, BuilderFactory)>,
}

impl BuilderTable {
    /// A table with no builders.
    pub fn empty() -> Self {
        BuilderTable {
            entries: Vec::new(),
        }
    }

    /// Append a builder for `range`.
    pub fn register(&mut self, range: VersionRange, factory: BuilderFactory) {
        self.entries.push((range, factory));
    }

    /// The first builder whose range contains `version`.
    pub fn select(&self, version: &GradleVersion) -> Option<BuilderFactory> {
        self.entries
            .iter()
            .find(|(range, _)| range.contains(version))
            .map(|(_, factory)| *factory)
    }
}

impl Default for BuilderTable {
    /// The default builder over every version.
    fn default() -> Self {
        let mut table = BuilderTable::empty();
        table.register(VersionRange::all(), DefaultBuilder::factory);
        table
    }
}

impl fmt::Debug for BuilderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(range, _)| range))
            .finish()
    }
}

// ============================================================================
// Shared rules
// ============================================================================

/// Whether `assignment` is declared in a block other projects inherit.
pub(crate) fn is_inherited(assignment: &Assignment) -> bool {
    assignment
        .code_structure
        .first()
        .is_some_and(|first| INHERITED_BLOCKS.contains(&first.as_str()))
}

/// Assignments from other files are only visible when inherited.
pub(crate) fn is_visible(ctx: &ParseContext, assignment: &Assignment) -> bool {
    assignment.file() == ctx.target_file() || is_inherited(assignment)
}

/// Metadata for an entity declared by `assignment`.
pub(crate) fn metadata_for(
    ctx: &ParseContext,
    assignment: &Assignment,
    removable: bool,
) -> BTreeSet<Metadata> {
    let mut metadata = BTreeSet::new();
    if removable {
        metadata.insert(Metadata::Removable);
    }
    if assignment.file() != ctx.target_file() {
        metadata.insert(Metadata::Injected);
    } else if is_inherited(assignment) {
        metadata.insert(Metadata::Outgoing);
    }
    metadata
}

/// Classpath coordinates of the configured build plugin, from every parsed
/// file, target file first.
pub(crate) fn plugin_coordinates<'a>(
    ctx: &'a ParseContext,
    config: &BuildModelConfig,
) -> Vec<(&'a Assignment, CoordinateMatch)> {
    let key = config.plugin.key();
    let mut found: Vec<_> = ctx
        .assignments_for_path(PLUGIN_CLASSPATH_PATH)
        .into_iter()
        .filter(|a| a.lvalue.qualifier.is_empty() && a.lvalue.name == CLASSPATH)
        .filter_map(|a| match_coordinate(a).map(|c| (a, c)))
        .filter(|(_, c)| c.key() == key)
        .collect();
    found.sort_by_key(|(a, _)| a.file() != ctx.target_file());
    found
}

/// Bind each location once, in order. Locations that cannot be bound are
/// skipped.
pub(crate) fn bind_all(project: &mut Project, locations: &[Location]) -> Vec<SourceBinding> {
    let mut seen = Vec::with_capacity(locations.len());
    let mut bindings = Vec::with_capacity(locations.len());
    for location in locations {
        if seen.contains(location) {
            continue;
        }
        seen.push(*location);
        if let Some(binding) = project.bind(location) {
            bindings.push(binding);
        }
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::walker::register_script;
    use buildmodel_core::{FileId, Span};
    use buildmodel_dsl::parse_script;

    fn v(text: &str) -> GradleVersion {
        GradleVersion::parse(text).unwrap()
    }

    struct NothingBuilder;

    impl EntityBuilder for NothingBuilder {
        fn build(&self, _ctx: &ParseContext, _project: &mut Project) -> Vec<EntityGroup> {
            Vec::new()
        }
    }

    fn nothing(_config: &BuildModelConfig) -> Box<dyn EntityBuilder> {
        Box::new(NothingBuilder)
    }

    mod table {
        use super::*;

        #[test]
        fn default_table_covers_every_version() {
            let table = BuilderTable::default();
            assert!(table.select(&GradleVersion::zero()).is_some());
            assert!(table.select(&v("3.0.0-alpha1")).is_some());
        }

        #[test]
        fn empty_table_selects_nothing() {
            assert!(BuilderTable::empty().select(&v("2.2.0")).is_none());
        }

        #[test]
        fn first_matching_range_wins() {
            let mut table = BuilderTable::empty();
            table.register(VersionRange::new(v("3.0"), None), nothing);
            table.register(VersionRange::all(), DefaultBuilder::factory);
            let config = BuildModelConfig::default();
            let mut project = Project::new("/tmp");
            let id = project.add_document("build.gradle", "compileSdkVersion 24\n");
            let ctx = ParseContext::new(id);

            let newer = table.select(&v("3.1")).unwrap();
            assert!(newer(&config).build(&ctx, &mut project).is_empty());
            assert!(table.select(&v("2.3")).is_some());
            assert_eq!(table.entries.len(), 2);
        }
    }

    mod rules {
        use super::*;

        fn parse(file: FileId, source: &str) -> ParseContext {
            let mut ctx = ParseContext::new(FileId(0));
            ctx.on_change_file(file);
            register_script(&mut ctx, &parse_script(source), source);
            ctx
        }

        #[test]
        fn target_file_assignments_are_visible() {
            let source = "buildscript {\n    repositories {\n        jcenter()\n    }\n}\n";
            let ctx = parse(FileId(0), source);
            let a = &ctx.assignments()[0];
            assert!(is_visible(&ctx, a));
            assert_eq!(metadata_for(&ctx, a, true), BTreeSet::from([Metadata::Removable]));
        }

        #[test]
        fn other_file_needs_inherited_block() {
            let source = "\
buildscript {
    repositories {
        jcenter()
    }
}
allprojects {
    repositories {
        google()
    }
}
";
            let ctx = parse(FileId(1), source);
            let [buildscript, allprojects] = ctx.assignments() else {
                panic!("expected two assignments");
            };
            assert!(!is_visible(&ctx, buildscript));
            assert!(is_visible(&ctx, allprojects));
            assert_eq!(
                metadata_for(&ctx, allprojects, true),
                BTreeSet::from([Metadata::Removable, Metadata::Injected])
            );
        }

        #[test]
        fn inherited_block_in_target_is_outgoing() {
            let source = "subprojects {\n    repositories {\n        google()\n    }\n}\n";
            let ctx = parse(FileId(0), source);
            let a = &ctx.assignments()[0];
            assert_eq!(
                metadata_for(&ctx, a, false),
                BTreeSet::from([Metadata::Outgoing])
            );
        }

        #[test]
        fn bind_all_skips_duplicates_and_unknown_files() {
            let mut project = Project::new("/tmp");
            let id = project.add_document("build.gradle", "v = '1'\n");
            let here = Location::new(id, Span::new(5, 6));
            let elsewhere = Location::new(FileId(9), Span::new(0, 1));
            let bindings = bind_all(&mut project, &[here, here, elsewhere]);
            assert_eq!(bindings.len(), 1);
            assert_eq!(project.binding_text(bindings[0]), Some("1"));
        }
    }
}
