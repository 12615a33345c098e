//! Common types shared between the document model and the extraction engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::edit::{FileId, Span};

// ============================================================================
// Location Type
// ============================================================================

/// Immutable snapshot of a byte range in a specific document.
///
/// A `Location` is only meaningful against the text it was taken from. To
/// follow a range across later edits, turn it into a
/// [`SourceBinding`](crate::SourceBinding) with [`crate::Project::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Document the range belongs to.
    pub file_id: FileId,
    /// Byte range within the document.
    pub span: Span,
}

impl Location {
    /// Create a new location.
    pub fn new(file_id: FileId, span: Span) -> Self {
        Location { file_id, span }
    }

    /// Location of a sub-range, `offset` bytes into this one.
    pub fn sub_location(&self, offset: usize, len: usize) -> Self {
        Location {
            file_id: self.file_id,
            span: self.span.sub_span(offset, len),
        }
    }

    /// Comparison key for deterministic sorting: (file, start, end).
    fn sort_key(&self) -> (FileId, usize, usize) {
        (self.file_id, self.span.start, self.span.end)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_id, self.span)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// ============================================================================
// Tests
// ============================================================================
