// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Diagnostics produced while tokenizing and parsing a script.

use buildmodel_core::text::byte_offset_to_position;
use buildmodel_core::Span;
use thiserror::Error;

/// A tokenizer or parser diagnostic, positioned by 1-indexed line and column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DslError {
    #[error("{line}:{col}: unterminated string literal")]
    UnterminatedString { span: Span, line: u32, col: u32 },

    #[error("{line}:{col}: unterminated block comment")]
    UnterminatedComment { span: Span, line: u32, col: u32 },

    #[error("{line}:{col}: unexpected character {ch:?}")]
    UnexpectedChar {
        ch: char,
        span: Span,
        line: u32,
        col: u32,
    },

    #[error("{line}:{col}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
        line: u32,
        col: u32,
    },
}

impl DslError {
    pub(crate) fn unterminated_string(source: &str, span: Span) -> Self {
        let (line, col) = byte_offset_to_position(source, span.start);
        DslError::UnterminatedString { span, line, col }
    }

    pub(crate) fn unterminated_comment(source: &str, span: Span) -> Self {
        let (line, col) = byte_offset_to_position(source, span.start);
        DslError::UnterminatedComment { span, line, col }
    }

    pub(crate) fn unexpected_char(source: &str, ch: char, span: Span) -> Self {
        let (line, col) = byte_offset_to_position(source, span.start);
        DslError::UnexpectedChar {
            ch,
            span,
            line,
            col,
        }
    }

    pub(crate) fn unexpected_token(
        source: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        let (line, col) = byte_offset_to_position(source, span.start);
        DslError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
            line,
            col,
        }
    }

    /// Byte range the diagnostic refers to.
    pub fn span(&self) -> Span {
        match self {
            DslError::UnterminatedString { span, .. }
            | DslError::UnterminatedComment { span, .. }
            | DslError::UnexpectedChar { span, .. }
            | DslError::UnexpectedToken { span, .. } => *span,
        }
    }

    /// 1-indexed line of the diagnostic.
    pub fn line(&self) -> u32 {
        match self {
            DslError::UnterminatedString { line, .. }
            | DslError::UnterminatedComment { line, .. }
            | DslError::UnexpectedChar { line, .. }
            | DslError::UnexpectedToken { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_includes_position() {
        let source = "a = 1\nb = 'oops\n";
        let err = DslError::unterminated_string(source, Span::new(10, 15));
        assert_eq!(err.to_string(), "2:5: unterminated string literal");
        assert_eq!(err.line(), 2);
        assert_eq!(err.span(), Span::new(10, 15));
    }

    #[test]
    fn unexpected_token_message() {
        let err = DslError::unexpected_token("x )", "expression", "')'", Span::new(2, 3));
        assert_eq!(err.to_string(), "1:3: expected expression, found ')'");
    }
}
