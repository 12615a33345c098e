//! Edit IR: spans, edits and transactions for atomic document changes.
//!
//! This module implements the change infrastructure used by the document
//! model:
//! - Byte spans and stable file identifiers
//! - Insert / delete / replace edits against one document
//! - Transactions that group edits and detect conflicts before anything is
//!   applied (all-or-nothing semantics live in [`crate::Project::write`])

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Core Types
// ============================================================================

/// Stable document identifier within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into document text.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Empty span at `offset`.
    pub fn empty(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Sub-span of `len` bytes starting `offset` bytes into this span.
    pub fn sub_span(&self, offset: usize, len: usize) -> Span {
        let start = (self.start + offset).min(self.end);
        Span {
            start,
            end: (start + len).min(self.end),
        }
    }

    /// The text covered by this span, if it lies within `text` on char boundaries.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Edits
// ============================================================================

/// A single change to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Target document.
    pub file_id: FileId,
    /// Range replaced by `text` (empty for inserts).
    pub span: Span,
    /// Replacement text (empty for deletes).
    pub text: String,
}

impl Edit {
    /// Insert `text` at `offset`.
    pub fn insert(file_id: FileId, offset: usize, text: impl Into<String>) -> Self {
        Edit {
            file_id,
            span: Span::empty(offset),
            text: text.into(),
        }
    }

    /// Delete the bytes in `span`.
    pub fn delete(file_id: FileId, span: Span) -> Self {
        Edit {
            file_id,
            span,
            text: String::new(),
        }
    }

    /// Replace the bytes in `span` with `text`.
    pub fn replace(file_id: FileId, span: Span, text: impl Into<String>) -> Self {
        Edit {
            file_id,
            span,
            text: text.into(),
        }
    }

    /// Net change in document length once applied.
    pub fn delta(&self) -> isize {
        self.text.len() as isize - self.span.len() as isize
    }
}

/// A problem that prevents a transaction from being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Two edits in the same document touch the same bytes.
    OverlappingSpans {
        file_id: FileId,
        first: Span,
        second: Span,
    },
    /// An edit reaches past the end of its document, or splits a character.
    OutOfBounds {
        file_id: FileId,
        span: Span,
        len: usize,
    },
    /// An edit targets a document the project does not know.
    UnknownDocument { file_id: FileId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OverlappingSpans {
                file_id,
                first,
                second,
            } => write!(f, "edits {} and {} overlap in {}", first, second, file_id),
            Conflict::OutOfBounds { file_id, span, len } => write!(
                f,
                "edit {} is out of bounds for {} (length {})",
                span, file_id, len
            ),
            Conflict::UnknownDocument { file_id } => write!(f, "unknown document {}", file_id),
        }
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// An ordered group of edits applied atomically by [`crate::Project::write`].
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    edits: Vec<Edit>,
}

impl Transaction {
    /// Queue an edit.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Queue a deletion.
    pub fn delete(&mut self, file_id: FileId, span: Span) {
        self.push(Edit::delete(file_id, span));
    }

    /// Queue a replacement.
    pub fn replace(&mut self, file_id: FileId, span: Span, text: impl Into<String>) {
        self.push(Edit::replace(file_id, span, text));
    }

    /// Queue an insertion.
    pub fn insert(&mut self, file_id: FileId, offset: usize, text: impl Into<String>) {
        self.push(Edit::insert(file_id, offset, text));
    }

    /// Check whether anything was queued.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Consume the transaction, returning edits sorted by (file, start, end).
    pub fn into_sorted_edits(mut self) -> Vec<Edit> {
        self.edits.sort_by_key(|e| (e.file_id, e.span.start, e.span.end));
        self.edits
    }

    /// Detect overlapping edits within each document.
    ///
    /// Two inserts at the same offset are reported as overlapping too: their
    /// relative order would be ambiguous.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut sorted: Vec<&Edit> = self.edits.iter().collect();
        sorted.sort_by_key(|e| (e.file_id, e.span.start, e.span.end));

        let mut conflicts = Vec::new();
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.file_id != b.file_id {
                continue;
            }
            let same_point =
                a.span.is_empty() && b.span.is_empty() && a.span.start == b.span.start;
            if a.span.overlaps(&b.span) || same_point {
                conflicts.push(Conflict::OverlappingSpans {
                    file_id: a.file_id,
                    first: a.span,
                    second: b.span,
                });
            }
        }
        conflicts
    }
}

// ============================================================================
// Tests
// ============================================================================
