//! Entry point: extract the entity groups of one build script.
//!
//! The target script is parsed into a fresh [`ParseContext`]. If a settings
//! script in an ancestor directory declares the target's directory as a
//! module, the nearest ancestor build script is parsed into the same context
//! so inherited `allprojects`/`subprojects` configuration and root-level
//! `ext` properties resolve. The plugin version found on the classpath then
//! selects the entity builder.

use std::path::{Path, PathBuf};

use buildmodel_core::{FileId, Project};
use buildmodel_dsl::parse_script;
use tracing::{debug, info_span, warn};

use super::builder::{plugin_coordinates, BuilderTable};
use super::context::ParseContext;
use super::coordinate::resolve_dimension;
use super::resolver::VariableResolver;
use super::settings::Settings;
use super::version::GradleVersion;
use super::walker::register_script;
use crate::config::BuildModelConfig;
use crate::entity::EntityGroup;

#[derive(Debug, Clone)]
pub struct BuildFileParser {
    config: BuildModelConfig,
    builders: BuilderTable,
}

impl BuildFileParser {
    pub fn new(config: BuildModelConfig) -> Self {
        BuildFileParser {
            config,
            builders: BuilderTable::default(),
        }
    }

    /// Replace the builder table.
    pub fn with_builders(mut self, builders: BuilderTable) -> Self {
        self.builders = builders;
        self
    }

    pub fn config(&self) -> &BuildModelConfig {
        &self.config
    }

    /// Extract the entity groups of `target`.
    ///
    /// Returns an empty list when no builder handles the detected plugin
    /// version.
    pub fn parse(&self, target: FileId, project: &mut Project) -> Vec<EntityGroup> {
        let _span = info_span!("parse", file = %target).entered();
        let ctx = self.parse_context(target, project);
        let version = self.plugin_version(&ctx);
        let Some(factory) = self.builders.select(&version) else {
            debug!(%version, "no builder for plugin version");
            return Vec::new();
        };
        debug!(%version, "building entities");
        factory(&self.config).build(&ctx, project)
    }

    /// Parse `target` and, when it is a declared module, its parent build
    /// script.
    pub fn parse_context(&self, target: FileId, project: &mut Project) -> ParseContext {
        let mut ctx = ParseContext::new(target);
        let Some(target_path) = project.document(target).map(|d| d.path().to_path_buf()) else {
            warn!(file = %target, "target document is not loaded");
            return ctx;
        };
        register_document(&mut ctx, project, target);

        if let Some(parent_path) = self.parent_build_file(project, &target_path) {
            match project.open(&parent_path) {
                Ok(parent) => {
                    debug!(parent = %parent_path.display(), "merging parent build script");
                    ctx.on_change_file(parent);
                    register_document(&mut ctx, project, parent);
                }
                Err(err) => warn!(parent = %parent_path.display(), %err, "cannot read parent build script"),
            }
        }
        ctx
    }

    /// The plugin version on the classpath, or `0` when it is absent or not
    /// a literal version.
    pub fn plugin_version(&self, ctx: &ParseContext) -> GradleVersion {
        let resolver = VariableResolver::new(ctx);
        plugin_coordinates(ctx, &self.config)
            .into_iter()
            .map(|(_, coordinate)| resolve_dimension(&resolver, &coordinate.version).value)
            .find_map(|value| GradleVersion::parse(&value))
            .unwrap_or_else(GradleVersion::zero)
    }

    /// The build script of the parent project, if `target_path` belongs to a
    /// module declared in an ancestor settings script.
    fn parent_build_file(&self, project: &mut Project, target_path: &Path) -> Option<PathBuf> {
        let module_dir = target_path.parent()?;
        let settings_dir = module_dir
            .ancestors()
            .find(|dir| project.exists(dir.join(&self.config.settings_file)))?
            .to_path_buf();
        let settings_path = settings_dir.join(&self.config.settings_file);

        let settings_id = match project.open(&settings_path) {
            Ok(id) => id,
            Err(err) => {
                warn!(settings = %settings_path.display(), %err, "cannot read settings, assuming no parent");
                return None;
            }
        };
        let settings = Settings::parse(project.document(settings_id)?.text());

        let relative = module_dir.strip_prefix(&settings_dir).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.is_empty() || !settings.declares(&segments) {
            debug!(module = %relative.display(), "not a declared module");
            return None;
        }

        module_dir
            .ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(&settings_dir))
            .map(|dir| dir.join(&self.config.build_file))
            .find(|path| project.exists(path))
    }
}

fn register_document(ctx: &mut ParseContext, project: &Project, id: FileId) {
    let Some(document) = project.document(id) else {
        return;
    };
    let source = document.text();
    let script = parse_script(source);
    register_script(ctx, &script, source);
}
