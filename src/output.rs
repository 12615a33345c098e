//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Always JSON:** all CLI output on stdout is valid JSON
//! 2. **Status first:** every response has `status` as its first field
//! 3. **Deterministic:** same input gives the same output, groups and
//!    entities in extraction order
//! 4. **Nullable vs absent:** explicit `null` for "no value"; an absent field
//!    means "not applicable"
//!
//! Source bindings are live handles, so they are rendered against the
//! [`Project`] at the moment of output.

use std::io::{self, Write};

use buildmodel_core::text::byte_offset_to_position;
use buildmodel_core::{BuildModelError, Project, SourceBinding};
use serde::{Deserialize, Serialize};

use crate::entity::{BoundValue, Entity, EntityGroup, EntityKind, Metadata};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Common Types
// ============================================================================

/// Current position and text of a source binding.
///
/// - `file`: path relative to the project root when possible
/// - `line`, `col`: 1-indexed
/// - `byte_start`, `byte_end`: byte range, end exclusive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingView {
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
}

impl BindingView {
    /// Render `binding`, or `None` if its range was invalidated.
    pub fn new(project: &Project, binding: SourceBinding) -> Option<Self> {
        let (path, span) = project.navigate(binding)?;
        let content = project.document(binding.file_id)?.text();
        let (line, col) = byte_offset_to_position(content, span.start);
        let file = path
            .strip_prefix(project.root())
            .unwrap_or(path)
            .display()
            .to_string();
        Some(BindingView {
            file,
            line,
            col,
            byte_start: span.start,
            byte_end: span.end,
            text: span.slice(content).unwrap_or_default().to_string(),
        })
    }
}

fn views(project: &Project, bindings: &[SourceBinding]) -> Vec<BindingView> {
    bindings
        .iter()
        .filter_map(|b| BindingView::new(project, *b))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundValueView {
    pub value: String,
    pub bindings: Vec<BindingView>,
}

impl BoundValueView {
    fn new(project: &Project, bound: &BoundValue) -> Self {
        BoundValueView {
            value: bound.value.clone(),
            bindings: views(project, &bound.bindings),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyView {
    pub configuration: String,
    pub group: BoundValueView,
    pub artifact: BoundValueView,
    pub version: BoundValueView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryView {
    pub url: String,
    pub help_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityView {
    pub display_name: String,
    pub kind: String,
    pub current_value: String,
    pub metadata: Vec<Metadata>,
    pub bindings: Vec<BindingView>,
    /// Declaration range, `null` once invalidated.
    pub whole_range: Option<BindingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryView>,
}

impl EntityView {
    pub fn new(project: &Project, entity: &Entity) -> Self {
        let (dependency, repository) = match &entity.kind {
            EntityKind::Dependency(d) => (
                Some(DependencyView {
                    configuration: d.configuration.clone(),
                    group: BoundValueView::new(project, &d.group),
                    artifact: BoundValueView::new(project, &d.artifact),
                    version: BoundValueView::new(project, &d.version),
                }),
                None,
            ),
            EntityKind::Repository(r) => (
                None,
                Some(RepositoryView {
                    url: r.url.clone(),
                    help_id: r.help_id.clone(),
                }),
            ),
            EntityKind::Version => (None, None),
        };
        EntityView {
            display_name: entity.display_name.clone(),
            kind: entity.kind.name().to_string(),
            current_value: entity.current_value.clone(),
            metadata: entity.metadata.iter().copied().collect(),
            bindings: views(project, &entity.bindings),
            whole_range: entity
                .whole_range
                .and_then(|b| BindingView::new(project, b)),
            dependency,
            repository,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupView {
    pub name: String,
    pub entities: Vec<EntityView>,
}

impl GroupView {
    pub fn new(project: &Project, group: &EntityGroup) -> Self {
        GroupView {
            name: group.name.clone(),
            entities: group
                .entities
                .iter()
                .map(|e| EntityView::new(project, e))
                .collect(),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit status.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &BuildModelError) -> Self {
        let details = match err {
            BuildModelError::FileNotFound { path } => Some(serde_json::json!({ "path": path })),
            BuildModelError::Io { path, .. } | BuildModelError::Config { path, .. } => {
                Some(serde_json::json!({ "path": path }))
            }
            _ => None,
        };
        ErrorInfo {
            code: err.error_code().code(),
            message: err.to_string(),
            details,
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for `bmodel entities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub groups: Vec<GroupView>,
}

impl EntitiesResponse {
    pub fn new(project: &Project, file: impl Into<String>, groups: &[EntityGroup]) -> Self {
        EntitiesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            groups: groups.iter().map(|g| GroupView::new(project, g)).collect(),
        }
    }
}

/// Response for `bmodel remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// Display name of the removed entity.
    pub removed: String,
    pub dry_run: bool,
    /// Files written back to disk.
    pub saved: Vec<String>,
    /// New text of the file, only for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Error response for any command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &BuildModelError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
