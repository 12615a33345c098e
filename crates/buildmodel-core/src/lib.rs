//! Core infrastructure for buildmodel.
//!
//! This crate provides the language-agnostic host model the extraction
//! engine runs against:
//! - Spans, file ids and the edit IR for atomic document changes
//! - Immutable locations (file + byte range)
//! - Documents with live range markers that survive unrelated edits
//! - A project that owns documents, write transactions and undo
//! - Error types and error codes
//! - Text utilities for positions and line handling

pub mod document;
pub mod edit;
pub mod error;
pub mod text;
pub mod types;

pub use document::{Document, MarkerId, Project, SourceBinding};
pub use edit::{Conflict, Edit, FileId, Span, Transaction};
pub use error::{BuildModelError, OutputErrorCode, Result};
pub use types::Location;
