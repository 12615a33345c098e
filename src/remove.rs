//! Deleting entities from their build script.

use buildmodel_core::text::{
    expand_horizontal_whitespace, is_horizontal_whitespace, is_line_end, is_line_start,
    terminator_after, terminator_before,
};
use buildmodel_core::{BuildModelError, Project, Result, Span};
use tracing::debug;

use crate::entity::Entity;

/// Delete the declaration of `entity` as one undoable write.
///
/// Fails with [`BuildModelError::StaleEntity`] when the entity has no
/// declaration range or an earlier edit invalidated it.
pub fn remove_entity(project: &mut Project, entity: &Entity) -> Result<()> {
    let Some(binding) = entity.whole_range else {
        return Err(BuildModelError::stale(format!(
            "'{}' has no declaration to remove",
            entity.display_name
        )));
    };
    let label = format!("Remove {}", entity.display_name);
    project.write(&label, |project, tx| {
        let (_, span) = project.navigate(binding).ok_or_else(|| {
            BuildModelError::stale(format!(
                "declaration of '{}' was changed since it was read",
                entity.display_name
            ))
        })?;
        let document = project
            .document(binding.file_id)
            .ok_or_else(|| BuildModelError::internal(format!("unknown document {}", binding.file_id)))?;
        let range = removal_span(document.text(), span);
        debug!(file = %binding.file_id, start = range.start, end = range.end, "removing entity");
        tx.delete(binding.file_id, range);
        Ok(())
    })
}

/// The range to delete for a declaration at `span`.
///
/// One adjacent `,` separator goes with an argument, the one after it if
/// there is one. The last argument left in a call takes the call with it.
/// A `;` right after the declaration goes with it. When the declaration
/// occupies whole lines, one line terminator goes too: the one before it if
/// there is a previous line, otherwise the one after it. On a shared line
/// the text before the declaration keeps its indentation and spacing unless
/// nothing follows it on that line.
pub fn removal_span(content: &str, span: Span) -> Span {
    let bytes = content.as_bytes();
    let mut first = span.start;
    let mut expanded = expand_horizontal_whitespace(content, span);
    if bytes.get(expanded.end) == Some(&b',') {
        return Span::new(span.start, skip_whitespace(bytes, expanded.end + 1));
    }
    if let Some(separator) =
        previous_non_whitespace(bytes, expanded.start).filter(|&i| bytes[i] == b',')
    {
        return Span::new(separator, expanded.end);
    }
    if let Some(call) = enclosing_call(content, expanded) {
        first = call.start;
        expanded = expand_horizontal_whitespace(content, call);
    }

    let (start, mut end) = (expanded.start, expanded.end);
    if bytes.get(end) == Some(&b';') {
        end = skip_horizontal_whitespace(bytes, end + 1);
    }

    if is_line_start(content, start) && is_line_end(content, end) {
        return if let Some(before) = terminator_before(content, start) {
            Span::new(before.start, end)
        } else if let Some(after) = terminator_after(content, end) {
            Span::new(start, after.end)
        } else {
            Span::new(start, end)
        };
    }

    let closes_line = is_line_end(content, end) || matches!(bytes.get(end), Some(b'}' | b')'));
    if !closes_line {
        return Span::new(first, end);
    }
    if start > 0 && bytes[start - 1] == b';' {
        Span::new(start - 1, end)
    } else {
        Span::new(start, end)
    }
}

/// The call around `argument` when it is the call's only argument.
///
/// Covers `name arg` and `name(arg)` where `name` starts its statement.
fn enclosing_call(content: &str, argument: Span) -> Option<Span> {
    let bytes = content.as_bytes();
    let boundary = content[..argument.start]
        .rfind(['\n', '{', ';'])
        .map_or(0, |i| i + 1);
    let prefix = &content[boundary..argument.start];
    let callee_start = boundary + (prefix.len() - prefix.trim_start().len());
    let (callee, parenthesized) = match prefix.trim().strip_suffix('(') {
        Some(callee) => (callee.trim_end(), true),
        None => (prefix.trim(), false),
    };
    if !is_call_name(callee) {
        return None;
    }
    if !parenthesized {
        return Some(Span::new(callee_start, argument.end));
    }
    let close = skip_horizontal_whitespace(bytes, argument.end);
    (bytes.get(close) == Some(&b')')).then(|| Span::new(callee_start, close + 1))
}

fn is_call_name(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn skip_horizontal_whitespace(bytes: &[u8], mut offset: usize) -> usize {
    while offset < bytes.len() && is_horizontal_whitespace(bytes[offset]) {
        offset += 1;
    }
    offset
}

fn skip_whitespace(bytes: &[u8], mut offset: usize) -> usize {
    while offset < bytes.len() && bytes[offset].is_ascii_whitespace() {
        offset += 1;
    }
    offset
}

/// Offset of the last non-whitespace byte before `offset`.
fn previous_non_whitespace(bytes: &[u8], offset: usize) -> Option<usize> {
    bytes[..offset.min(bytes.len())]
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
}
