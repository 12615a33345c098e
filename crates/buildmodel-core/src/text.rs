//! Text position utilities for byte offsets, line:column conversions and
//! line-terminator handling.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes
//!
//! A line terminator is either `\n` or `\r\n`. Horizontal whitespace is a
//! space or a tab.

use crate::edit::Span;

// ============================================================================
// Position Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
///
/// If `offset` exceeds the content length, returns the position at the end
/// of the content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    let mut current_offset = 0usize;

    for ch in content.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Check whether `byte` is horizontal whitespace.
pub fn is_horizontal_whitespace(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Grow `span` over horizontal whitespace on both sides.
pub fn expand_horizontal_whitespace(content: &str, span: Span) -> Span {
    let bytes = content.as_bytes();
    let mut start = span.start.min(bytes.len());
    let mut end = span.end.min(bytes.len());
    while start > 0 && is_horizontal_whitespace(bytes[start - 1]) {
        start -= 1;
    }
    while end < bytes.len() && is_horizontal_whitespace(bytes[end]) {
        end += 1;
    }
    Span::new(start, end)
}

/// Check whether `offset` is at the start of a line.
pub fn is_line_start(content: &str, offset: usize) -> bool {
    offset == 0 || content.as_bytes().get(offset - 1) == Some(&b'\n')
}

/// Check whether `offset` is at the end of a line (before a terminator or at EOF).
pub fn is_line_end(content: &str, offset: usize) -> bool {
    offset >= content.len() || terminator_after(content, offset).is_some()
}

/// The line terminator ending exactly at `offset`, if any.
pub fn terminator_before(content: &str, offset: usize) -> Option<Span> {
    let bytes = content.as_bytes();
    if offset == 0 || offset > bytes.len() || bytes[offset - 1] != b'\n' {
        return None;
    }
    if offset >= 2 && bytes[offset - 2] == b'\r' {
        Some(Span::new(offset - 2, offset))
    } else {
        Some(Span::new(offset - 1, offset))
    }
}

/// The line terminator starting exactly at `offset`, if any.
pub fn terminator_after(content: &str, offset: usize) -> Option<Span> {
    let rest = content.as_bytes().get(offset..)?;
    if rest.starts_with(b"\r\n") {
        Some(Span::new(offset, offset + 2))
    } else if rest.starts_with(b"\n") {
        Some(Span::new(offset, offset + 1))
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod position_tests {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = "android {\n    compileSdkVersion 24\n}\n";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 8), (1, 9));
            assert_eq!(byte_offset_to_position(content, 10), (2, 1));
            assert_eq!(byte_offset_to_position(content, 14), (2, 5));
        }

        #[test]
        fn offset_beyond_content() {
            let (line, col) = byte_offset_to_position("short", 100);
            assert_eq!(line, 1);
            assert_eq!(col, 6);
        }

        #[test]
        fn multibyte_columns_count_chars() {
            let content = "v = 'é'\nx";
            // 'é' is two bytes; the closing quote starts at byte 7
            assert_eq!(byte_offset_to_position(content, 7), (1, 7));
        }

        #[test]
        fn empty_content() {
            assert_eq!(byte_offset_to_position("", 0), (1, 1));
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn expand_whitespace_both_sides() {
            let content = "a\n  \tfoo  \nb";
            let span = Span::new(5, 8);
            assert_eq!(expand_horizontal_whitespace(content, span), Span::new(2, 10));
        }

        #[test]
        fn expand_whitespace_stops_at_newlines() {
            let content = "foo\nbar";
            assert_eq!(
                expand_horizontal_whitespace(content, Span::new(4, 7)),
                Span::new(4, 7)
            );
        }

        #[test]
        fn line_start_and_end() {
            let content = "ab\ncd";
            assert!(is_line_start(content, 0));
            assert!(!is_line_start(content, 1));
            assert!(is_line_start(content, 3));
            assert!(is_line_end(content, 2));
            assert!(!is_line_end(content, 3));
            assert!(is_line_end(content, 5));
        }

        #[test]
        fn terminators_lf() {
            let content = "ab\ncd";
            assert_eq!(terminator_before(content, 3), Some(Span::new(2, 3)));
            assert_eq!(terminator_after(content, 2), Some(Span::new(2, 3)));
            assert_eq!(terminator_before(content, 0), None);
            assert_eq!(terminator_after(content, 5), None);
        }

        #[test]
        fn terminators_crlf() {
            let content = "ab\r\ncd";
            assert_eq!(terminator_before(content, 4), Some(Span::new(2, 4)));
            assert_eq!(terminator_after(content, 2), Some(Span::new(2, 4)));
            assert!(is_line_end(content, 2));
        }
    }
}
