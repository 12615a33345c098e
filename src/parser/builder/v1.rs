//! The builder for every plugin version currently known.

use std::borrow::Cow;

use buildmodel_core::Project;
use tracing::debug;

use super::{bind_all, is_visible, metadata_for, plugin_coordinates, EntityBuilder};
use crate::config::BuildModelConfig;
use crate::entity::{
    BoundValue, Entity, EntityGroup, EntityKind, ExternalDependency, Metadata, Repository,
    DEPENDENCIES_GROUP, REPOSITORIES_GROUP, VERSIONS_GROUP,
};
use crate::parser::context::ParseContext;
use crate::parser::coordinate::{match_coordinate, resolve_dimension, ResolvedDimension};
use crate::parser::model::{Assignment, Variable};
use crate::parser::resolver::{unique_assignment, VariableResolver};

const PLUGIN_VERSION_NAME: &str = "Plugin Version";

/// Version properties of the `android` block, with their display names.
const SDK_VERSIONS: &[(&str, &str)] = &[
    ("compileSdkVersion", "Compile SDK Version"),
    ("buildToolsVersion", "Build Tools Version"),
];
const ANDROID_PATH: &[&str] = &["android"];

const DEPENDENCY_PATHS: &[&[&str]] = &[
    &["dependencies"],
    &["subprojects", "dependencies"],
    &["allprojects", "dependencies"],
];

const REPOSITORY_PATHS: &[&[&str]] = &[
    &["buildscript", "repositories"],
    &["repositories"],
    &["subprojects", "repositories"],
    &["allprojects", "repositories"],
];
const MAVEN: &str = "maven";
const URL: &str = "url";

pub struct DefaultBuilder {
    config: BuildModelConfig,
}

impl DefaultBuilder {
    pub fn new(config: BuildModelConfig) -> Self {
        DefaultBuilder { config }
    }

    pub fn factory(config: &BuildModelConfig) -> Box<dyn EntityBuilder> {
        Box::new(DefaultBuilder::new(config.clone()))
    }

    fn versions<'a>(
        &self,
        ctx: &'a ParseContext,
        resolver: &VariableResolver<'a>,
        project: &mut Project,
    ) -> Vec<Entity> {
        let mut entities = Vec::new();

        for (assignment, coordinate) in plugin_coordinates(ctx, &self.config) {
            let version = resolve_dimension(resolver, &coordinate.version);
            entities.push(Entity {
                display_name: PLUGIN_VERSION_NAME.to_string(),
                current_value: version.value,
                bindings: bind_all(project, &version.locations),
                whole_range: project.bind(&assignment.statement_location),
                metadata: metadata_for(ctx, assignment, false),
                kind: EntityKind::Version,
            });
        }

        for (name, display_name) in SDK_VERSIONS {
            let variable = Variable::simple(*name);
            let Some(assignment) =
                unique_assignment(ctx, ctx.target_file(), ANDROID_PATH, &variable)
            else {
                continue;
            };
            let resolution = resolver.resolve_assignment(assignment);
            entities.push(Entity {
                display_name: display_name.to_string(),
                current_value: resolution.value,
                bindings: bind_all(project, &resolution.locations),
                whole_range: project.bind(&assignment.statement_location),
                metadata: metadata_for(ctx, assignment, true),
                kind: EntityKind::Version,
            });
        }
        entities
    }

    fn dependencies(
        &self,
        ctx: &ParseContext,
        resolver: &VariableResolver<'_>,
        project: &mut Project,
    ) -> Vec<Entity> {
        let mut entities = Vec::new();
        for path in DEPENDENCY_PATHS {
            for assignment in ctx.assignments_for_path(path) {
                if !is_visible(ctx, assignment) || assignment.is_no_args_marker() {
                    continue;
                }
                let Some(coordinate) = match_coordinate(assignment) else {
                    debug!(lvalue = %assignment.lvalue, "not a dependency coordinate");
                    continue;
                };
                let [group, artifact, version] =
                    coordinate.dimensions().map(|d| resolve_dimension(resolver, d));
                let current_value = format!("{}:{}:{}", group.value, artifact.value, version.value);
                let mut locations = Vec::new();
                for dimension in [&group, &artifact, &version] {
                    locations.extend_from_slice(&dimension.locations);
                }
                entities.push(Entity {
                    display_name: coordinate.key(),
                    current_value,
                    bindings: bind_all(project, &locations),
                    whole_range: project.bind(&assignment.statement_location),
                    metadata: metadata_for(ctx, assignment, true),
                    kind: EntityKind::Dependency(ExternalDependency {
                        configuration: assignment.lvalue.to_string(),
                        group: bound(project, group),
                        artifact: bound(project, artifact),
                        version: bound(project, version),
                    }),
                });
            }
        }
        entities
    }

    fn repositories<'a>(
        &self,
        ctx: &'a ParseContext,
        resolver: &VariableResolver<'a>,
        project: &mut Project,
    ) -> Vec<Entity> {
        let mut entities = Vec::new();
        for path in REPOSITORY_PATHS {
            for assignment in ctx.assignments_for_path(path) {
                if is_visible(ctx, assignment) {
                    entities.extend(self.well_known_repository(ctx, assignment, project));
                }
            }
            let mut maven_path = path.to_vec();
            maven_path.push(MAVEN);
            for assignment in ctx.assignments_for_path(&maven_path) {
                if is_visible(ctx, assignment) && assignment.lvalue == Variable::simple(URL) {
                    entities.push(maven_repository(ctx, resolver, assignment, project));
                }
            }
        }
        entities
    }

    fn well_known_repository(
        &self,
        ctx: &ParseContext,
        assignment: &Assignment,
        project: &mut Project,
    ) -> Option<Entity> {
        if !assignment.is_no_args_marker() || !assignment.lvalue.qualifier.is_empty() {
            return None;
        }
        let Some(known) = self.config.repository(&assignment.lvalue.name) else {
            debug!(method = %assignment.lvalue.name, "unknown repository shorthand");
            return None;
        };
        let mut metadata = metadata_for(ctx, assignment, true);
        metadata.insert(Metadata::ReadOnly);
        Some(Entity {
            display_name: known.display_name.clone(),
            current_value: known.url.clone(),
            bindings: bind_all(project, &[assignment.rvalue_location]),
            whole_range: project.bind(&assignment.statement_location),
            metadata,
            kind: EntityKind::Repository(Repository {
                url: known.url.clone(),
                help_id: known.help_id.clone(),
            }),
        })
    }
}

/// A `maven { url ... }` repository; its whole range is the `maven` block.
fn maven_repository<'a>(
    ctx: &ParseContext,
    resolver: &VariableResolver<'a>,
    assignment: &'a Assignment,
    project: &mut Project,
) -> Entity {
    let resolution = resolver.resolve_assignment(assignment);
    let block = assignment
        .block_locations
        .last()
        .copied()
        .unwrap_or(assignment.statement_location);
    Entity {
        display_name: resolution.value.clone(),
        current_value: resolution.value.clone(),
        bindings: bind_all(project, &resolution.locations),
        whole_range: project.bind(&block),
        metadata: metadata_for(ctx, assignment, true),
        kind: EntityKind::Repository(Repository {
            url: resolution.value,
            help_id: None,
        }),
    }
}

fn bound(project: &mut Project, dimension: ResolvedDimension) -> BoundValue {
    BoundValue {
        bindings: bind_all(project, &dimension.locations),
        value: dimension.value,
    }
}

impl EntityBuilder for DefaultBuilder {
    fn build(&self, ctx: &ParseContext, project: &mut Project) -> Vec<EntityGroup> {
        let resolver = VariableResolver::new(ctx)
            .with_filter(|a| (!a.is_no_args_marker()).then_some(Cow::Borrowed(a)));

        let groups = [
            (VERSIONS_GROUP, self.versions(ctx, &resolver, project)),
            (DEPENDENCIES_GROUP, self.dependencies(ctx, &resolver, project)),
            (REPOSITORIES_GROUP, self.repositories(ctx, &resolver, project)),
        ];
        groups
            .into_iter()
            .filter(|(_, entities)| !entities.is_empty())
            .map(|(name, entities)| EntityGroup::new(name, entities))
            .collect()
    }
}
