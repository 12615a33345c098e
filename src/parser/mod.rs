//! Build script model extraction.
//!
//! Scripts are walked into a [`ParseContext`] of [`Assignment`]s, which a
//! version-selected [`EntityBuilder`] resolves into entity groups. The
//! [`BuildFileParser`] drives the whole pipeline for one target file.

pub mod builder;
pub mod context;
pub mod coordinate;
pub mod extractor;
pub mod facade;
pub mod model;
pub mod resolver;
pub mod settings;
pub mod version;
pub mod walker;

pub use builder::{BuilderFactory, BuilderTable, DefaultBuilder, EntityBuilder};
pub use context::ParseContext;
pub use facade::BuildFileParser;
pub use model::{Assignment, Value, Variable};
pub use resolver::{Resolution, VariableResolver};
pub use version::{GradleVersion, VersionRange};
