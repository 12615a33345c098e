//! Documents, live range markers and the project that owns them.
//!
//! A [`Location`] is a snapshot: it stops meaning anything once the text it
//! was taken from changes. Anything that must survive edits is turned into a
//! [`SourceBinding`], a handle to a marker whose span the document keeps up to
//! date as edits are applied.
//!
//! ## Marker update rules
//!
//! For an edit replacing `[s, e)` with `n` bytes (`delta = n - (e - s)`) and a
//! marker `[ms, me)`:
//!
//! - edit entirely before the marker (`e <= ms`): the marker shifts by `delta`
//! - edit entirely after the marker (`s >= me`): unchanged
//! - edit covering the marker: the marker becomes invalid
//! - edit strictly inside the marker: the marker end moves by `delta`
//! - any other partial overlap: the marker becomes invalid
//!
//! An invalid marker never becomes valid again, not even through undo.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edit::{Conflict, Edit, FileId, Span, Transaction};
use crate::error::{BuildModelError, Result};
use crate::types::Location;

// ============================================================================
// Markers and Bindings
// ============================================================================

/// Identifier of a marker within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

/// Stable handle to a range in a document.
///
/// The range follows edits to the document; ask the [`Project`] for its
/// current position with [`Project::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceBinding {
    /// Document the marker lives in.
    pub file_id: FileId,
    /// Marker within the document.
    pub marker: MarkerId,
}

#[derive(Debug, Clone)]
struct Marker {
    span: Span,
    valid: bool,
}

impl Marker {
    fn update(&mut self, edit_span: Span, delta: isize) {
        if !self.valid {
            return;
        }
        let (s, e) = (edit_span.start, edit_span.end);
        if e <= self.span.start {
            self.span = Span::new(shift(self.span.start, delta), shift(self.span.end, delta));
        } else if s >= self.span.end {
            // after the marker
        } else if s <= self.span.start && e >= self.span.end {
            self.valid = false;
        } else if s >= self.span.start && e <= self.span.end {
            self.span = Span::new(self.span.start, shift(self.span.end, delta));
        } else {
            self.valid = false;
        }
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    (offset as isize + delta).max(0) as usize
}

// ============================================================================
// Document
// ============================================================================

/// A build file loaded into a [`Project`].
#[derive(Debug, Clone)]
pub struct Document {
    id: FileId,
    path: PathBuf,
    text: String,
    markers: Vec<Marker>,
    modified: bool,
}

impl Document {
    fn new(id: FileId, path: PathBuf, text: String) -> Self {
        Document {
            id,
            path,
            text,
            markers: Vec::new(),
            modified: false,
        }
    }

    /// Path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the text differs from what is on disk.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Create a marker tracking `span`.
    pub fn create_marker(&mut self, span: Span) -> MarkerId {
        let id = MarkerId(self.markers.len() as u32);
        self.markers.push(Marker { span, valid: true });
        id
    }

    /// Current span of a marker, or `None` if the marker was invalidated.
    pub fn marker_span(&self, marker: MarkerId) -> Option<Span> {
        self.markers
            .get(marker.0 as usize)
            .filter(|m| m.valid)
            .map(|m| m.span)
    }

    /// Replace `span` with `text`, updating markers. Returns the removed text.
    fn splice(&mut self, span: Span, text: &str) -> String {
        let removed = self.text[span.start..span.end].to_string();
        self.text.replace_range(span.start..span.end, text);
        let delta = text.len() as isize - span.len() as isize;
        for marker in &mut self.markers {
            marker.update(span, delta);
        }
        self.modified = true;
        removed
    }

    fn check_bounds(&self, span: Span) -> Option<Conflict> {
        let ok = span.end <= self.text.len()
            && self.text.is_char_boundary(span.start)
            && self.text.is_char_boundary(span.end);
        if ok {
            None
        } else {
            Some(Conflict::OutOfBounds {
                file_id: self.id,
                span,
                len: self.text.len(),
            })
        }
    }

    fn reload(&mut self, text: String) {
        self.text = text;
        for marker in &mut self.markers {
            marker.valid = false;
        }
        self.modified = false;
    }
}

// ============================================================================
// Project
// ============================================================================

#[derive(Debug, Clone)]
struct UndoEntry {
    label: String,
    edits: Vec<Edit>,
}

/// The set of build files a model is extracted from and edited through.
#[derive(Debug, Default)]
pub struct Project {
    root: PathBuf,
    documents: Vec<Document>,
    by_path: HashMap<PathBuf, FileId>,
    undo_stack: Vec<UndoEntry>,
}

impl Project {
    /// Create an empty project. Relative paths resolve against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Project {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Add a document with in-memory text.
    ///
    /// If the path is already loaded its text is replaced and all of its
    /// markers are invalidated.
    pub fn add_document(&mut self, path: impl AsRef<Path>, text: impl Into<String>) -> FileId {
        let path = self.resolve_path(path.as_ref());
        if let Some(&id) = self.by_path.get(&path) {
            self.documents[id.0 as usize].reload(text.into());
            return id;
        }
        let id = FileId(self.documents.len() as u32);
        self.documents
            .push(Document::new(id, path.clone(), text.into()));
        self.by_path.insert(path, id);
        id
    }

    /// Return the loaded document for `path`, reading it from disk if needed.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<FileId> {
        let path = self.resolve_path(path.as_ref());
        if let Some(&id) = self.by_path.get(&path) {
            return Ok(id);
        }
        if !path.is_file() {
            return Err(BuildModelError::file_not_found(path.display().to_string()));
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| BuildModelError::io(path.display().to_string(), &e))?;
        debug!(path = %path.display(), bytes = text.len(), "loaded document");
        Ok(self.add_document(path, text))
    }

    /// Whether `path` is loaded or exists on disk as a file.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let path = self.resolve_path(path.as_ref());
        self.by_path.contains_key(&path) || path.is_file()
    }

    /// Look up a document by id.
    pub fn document(&self, id: FileId) -> Option<&Document> {
        self.documents.get(id.0 as usize)
    }

    /// Look up a loaded document by path.
    pub fn find(&self, path: impl AsRef<Path>) -> Option<FileId> {
        let path = self.resolve_path(path.as_ref());
        self.by_path.get(&path).copied()
    }

    /// Create a binding that tracks `location` through later edits.
    pub fn bind(&mut self, location: &Location) -> Option<SourceBinding> {
        let Some(doc) = self.documents.get_mut(location.file_id.0 as usize) else {
            warn!(location = %location, "cannot bind location in unknown document");
            return None;
        };
        if doc.check_bounds(location.span).is_some() {
            warn!(location = %location, "cannot bind location outside document");
            return None;
        }
        let marker = doc.create_marker(location.span);
        Some(SourceBinding {
            file_id: location.file_id,
            marker,
        })
    }

    /// Current file and span of a binding, or `None` if it was invalidated.
    pub fn navigate(&self, binding: SourceBinding) -> Option<(&Path, Span)> {
        let doc = self.document(binding.file_id)?;
        let span = doc.marker_span(binding.marker)?;
        Some((doc.path(), span))
    }

    /// Current text covered by a binding.
    pub fn binding_text(&self, binding: SourceBinding) -> Option<&str> {
        let doc = self.document(binding.file_id)?;
        let span = doc.marker_span(binding.marker)?;
        span.slice(doc.text())
    }

    /// Run `build` to collect edits, then apply them atomically.
    ///
    /// Nothing is applied if `build` fails or the edits conflict. A
    /// successful, non-empty write can be reverted with [`Project::undo`].
    pub fn write<F>(&mut self, label: &str, build: F) -> Result<()>
    where
        F: FnOnce(&Project, &mut Transaction) -> Result<()>,
    {
        let mut tx = Transaction::default();
        build(&*self, &mut tx)?;
        if tx.is_empty() {
            return Ok(());
        }
        let edits = tx.into_sorted_edits();
        let inverse = self.apply_edits(edits)?;
        debug!(label, edits = inverse.len(), "applied write transaction");
        self.undo_stack.push(UndoEntry {
            label: label.to_string(),
            edits: inverse,
        });
        Ok(())
    }

    /// Revert the most recent write. Returns its label, or `None` if there
    /// was nothing to undo.
    pub fn undo(&mut self) -> Result<Option<String>> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(None);
        };
        self.apply_edits(entry.edits)?;
        debug!(label = %entry.label, "undid write transaction");
        Ok(Some(entry.label))
    }

    /// Write a document's text back to disk.
    pub fn save(&mut self, id: FileId) -> Result<()> {
        let doc = self
            .documents
            .get_mut(id.0 as usize)
            .ok_or_else(|| BuildModelError::internal(format!("unknown document {}", id)))?;
        fs::write(&doc.path, &doc.text)
            .map_err(|e| BuildModelError::io(doc.path.display().to_string(), &e))?;
        doc.modified = false;
        Ok(())
    }

    /// Save every modified document. Returns the paths written.
    pub fn save_modified(&mut self) -> Result<Vec<PathBuf>> {
        let ids: Vec<FileId> = self
            .documents
            .iter()
            .filter(|d| d.modified)
            .map(|d| d.id)
            .collect();
        let mut saved = Vec::with_capacity(ids.len());
        for id in ids {
            self.save(id)?;
            saved.push(self.documents[id.0 as usize].path.clone());
        }
        Ok(saved)
    }

    /// Validate and apply edits sorted by (file, start). Returns the edits
    /// that revert them.
    fn apply_edits(&mut self, mut edits: Vec<Edit>) -> Result<Vec<Edit>> {
        edits.sort_by_key(|e| (e.file_id, e.span.start, e.span.end));

        let mut check = Transaction::default();
        for edit in &edits {
            check.push(edit.clone());
        }
        let mut conflicts = check.detect_conflicts();
        for edit in &edits {
            match self.document(edit.file_id) {
                Some(doc) => conflicts.extend(doc.check_bounds(edit.span)),
                None => conflicts.push(Conflict::UnknownDocument {
                    file_id: edit.file_id,
                }),
            }
        }
        if let Some(first) = conflicts.first() {
            return Err(BuildModelError::ApplyError {
                message: first.to_string(),
            });
        }

        // Apply back to front so earlier offsets stay valid.
        let mut removed = vec![String::new(); edits.len()];
        for (i, edit) in edits.iter().enumerate().rev() {
            let doc = &mut self.documents[edit.file_id.0 as usize];
            removed[i] = doc.splice(edit.span, &edit.text);
        }

        let mut inverse = Vec::with_capacity(edits.len());
        let mut current_file = None;
        let mut shift_so_far: isize = 0;
        for (edit, old_text) in edits.iter().zip(removed) {
            if current_file != Some(edit.file_id) {
                current_file = Some(edit.file_id);
                shift_so_far = 0;
            }
            let start = shift(edit.span.start, shift_so_far);
            let span = Span::new(start, start + edit.text.len());
            inverse.push(inverse_edit(edit.file_id, span, old_text));
            shift_so_far += edit.delta();
        }
        Ok(inverse)
    }
}

fn inverse_edit(file_id: FileId, span: Span, text: String) -> Edit {
    if span.is_empty() {
        Edit::insert(file_id, span.start, text)
    } else if text.is_empty() {
        Edit::delete(file_id, span)
    } else {
        Edit::replace(file_id, span, text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with(text: &str) -> (Project, FileId) {
        let mut project = Project::new("/work");
        let id = project.add_document("build.gradle", text);
        (project, id)
    }

    mod marker_tests {
        use super::*;

        fn marker(start: usize, end: usize) -> Marker {
            Marker {
                span: Span::new(start, end),
                valid: true,
            }
        }

        #[test]
        fn edit_before_shifts() {
            let mut m = marker(10, 15);
            m.update(Span::new(2, 4), 3);
            assert_eq!(m.span, Span::new(13, 18));
            assert!(m.valid);
        }

        #[test]
        fn edit_after_is_ignored() {
            let mut m = marker(10, 15);
            m.update(Span::new(15, 20), -5);
            assert_eq!(m.span, Span::new(10, 15));
        }

        #[test]
        fn covering_edit_invalidates() {
            let mut m = marker(10, 15);
            m.update(Span::new(8, 16), -8);
            assert!(!m.valid);
        }

        #[test]
        fn inner_edit_moves_end() {
            let mut m = marker(10, 20);
            m.update(Span::new(12, 14), 4);
            assert_eq!(m.span, Span::new(10, 24));
        }

        #[test]
        fn partial_overlap_invalidates() {
            let mut m = marker(10, 20);
            m.update(Span::new(18, 25), 0);
            assert!(!m.valid);
        }
    }

    mod binding_tests {
        use super::*;

        #[test]
        fn binding_follows_edit_before_it() {
            let (mut project, id) = project_with("a = 'x'\nb = 'y'\n");
            let binding = project
                .bind(&Location::new(id, Span::new(12, 15)))
                .unwrap();
            project
                .write("prefix", |_, tx| {
                    tx.insert(id, 0, "// header\n");
                    Ok(())
                })
                .unwrap();
            assert_eq!(project.binding_text(binding), Some("'y'"));
            let (path, span) = project.navigate(binding).unwrap();
            assert_eq!(path, Path::new("/work/build.gradle"));
            assert_eq!(span, Span::new(22, 25));
        }

        #[test]
        fn binding_over_deleted_text_is_invalid() {
            let (mut project, id) = project_with("a = 'x'\nb = 'y'\n");
            let binding = project.bind(&Location::new(id, Span::new(4, 7))).unwrap();
            project
                .write("delete", |_, tx| {
                    tx.delete(id, Span::new(0, 8));
                    Ok(())
                })
                .unwrap();
            assert!(project.navigate(binding).is_none());
        }

        #[test]
        fn bind_unknown_document_fails() {
            let (mut project, _) = project_with("x");
            assert!(project
                .bind(&Location::new(FileId(9), Span::new(0, 1)))
                .is_none());
        }

        #[test]
        fn reload_invalidates_markers() {
            let (mut project, id) = project_with("a = 1\n");
            let binding = project.bind(&Location::new(id, Span::new(4, 5))).unwrap();
            let again = project.add_document("build.gradle", "a = 2\n");
            assert_eq!(again, id);
            assert!(project.navigate(binding).is_none());
        }
    }

    mod write_tests {
        use super::*;

        #[test]
        fn multiple_edits_apply_with_original_offsets() {
            let (mut project, id) = project_with("one two three");
            project
                .write("edit", |_, tx| {
                    tx.replace(id, Span::new(0, 3), "1");
                    tx.replace(id, Span::new(8, 13), "3");
                    Ok(())
                })
                .unwrap();
            assert_eq!(project.document(id).unwrap().text(), "1 two 3");
            assert!(project.document(id).unwrap().is_modified());
        }

        #[test]
        fn conflicting_edits_apply_nothing() {
            let (mut project, id) = project_with("abcdef");
            let err = project
                .write("bad", |_, tx| {
                    tx.delete(id, Span::new(0, 4));
                    tx.delete(id, Span::new(2, 6));
                    Ok(())
                })
                .unwrap_err();
            assert!(matches!(err, BuildModelError::ApplyError { .. }));
            assert_eq!(project.document(id).unwrap().text(), "abcdef");
        }

        #[test]
        fn out_of_bounds_edit_is_rejected() {
            let (mut project, id) = project_with("abc");
            let result = project.write("bad", |_, tx| {
                tx.delete(id, Span::new(1, 10));
                Ok(())
            });
            assert!(result.is_err());
        }

        #[test]
        fn failing_builder_applies_nothing() {
            let (mut project, id) = project_with("abc");
            let result = project.write("bad", |_, tx| {
                tx.delete(id, Span::new(0, 1));
                Err(BuildModelError::stale("gone"))
            });
            assert!(result.is_err());
            assert_eq!(project.document(id).unwrap().text(), "abc");
        }

        #[test]
        fn undo_restores_text() {
            let (mut project, id) = project_with("one two three");
            project
                .write("edit", |_, tx| {
                    tx.replace(id, Span::new(0, 3), "1");
                    tx.delete(id, Span::new(3, 7));
                    tx.insert(id, 13, "!");
                    Ok(())
                })
                .unwrap();
            assert_eq!(project.document(id).unwrap().text(), "1 three!");
            let label = project.undo().unwrap();
            assert_eq!(label.as_deref(), Some("edit"));
            assert_eq!(project.document(id).unwrap().text(), "one two three");
            assert_eq!(project.undo().unwrap(), None);
        }
    }

    mod disk_tests {
        use super::*;

        #[test]
        fn open_reads_and_save_writes() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("build.gradle");
            fs::write(&path, "a = 1\n").unwrap();

            let mut project = Project::new(dir.path());
            let id = project.open("build.gradle").unwrap();
            assert_eq!(project.open(&path).unwrap(), id);
            assert!(project.exists("build.gradle"));
            assert!(!project.exists("settings.gradle"));

            project
                .write("edit", |_, tx| {
                    tx.replace(id, Span::new(4, 5), "2");
                    Ok(())
                })
                .unwrap();
            let saved = project.save_modified().unwrap();
            assert_eq!(saved, vec![path.clone()]);
            assert_eq!(fs::read_to_string(&path).unwrap(), "a = 2\n");
            assert!(!project.document(id).unwrap().is_modified());
        }

        #[test]
        fn open_missing_file_is_not_found() {
            let dir = TempDir::new().unwrap();
            let mut project = Project::new(dir.path());
            let err = project.open("missing.gradle").unwrap_err();
            assert!(matches!(err, BuildModelError::FileNotFound { .. }));
        }
    }
}
