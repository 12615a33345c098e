// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for the Gradle Groovy DSL.
//!
//! The tokenizer is hand written and never fails: problems are collected as
//! [`DslError`] diagnostics and scanning resumes after the offending input.
//!
//! - Newlines are significant in Groovy and are emitted as
//!   [`TokenKind::Newline`]; a backslash before a newline joins the lines.
//! - `//` and `/* */` comments and a leading `#!` line are skipped.
//! - Strings are emitted whole, quotes included. Double-quoted strings may
//!   contain `${...}` interpolations with nested braces and nested strings;
//!   the parser decomposes them into template parts.
//! - Keywords are ordinary [`TokenKind::Ident`] tokens.

use buildmodel_core::Span;

use crate::error::DslError;

/// Kind of a [`Token`]. The token text is recovered from the source by span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    At,
    /// `=`
    Assign,
    /// `+=`, `-=` and friends.
    CompoundAssign,
    /// `->`
    Arrow,
    /// Any other operator, including `?.`, `*.` and `?:`.
    Op,
    Newline,
    Eof,
}

/// A token: a kind plus the byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Source text of the token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source).unwrap_or("")
    }

    /// Whether this is an identifier with exactly the text `word`.
    pub fn is_word(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == word
    }
}

// Longest first.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::CompoundAssign),
    ("<<=", TokenKind::CompoundAssign),
    (">>=", TokenKind::CompoundAssign),
    ("==~", TokenKind::Op),
    ("<=>", TokenKind::Op),
    ("..<", TokenKind::Op),
    ("->", TokenKind::Arrow),
    ("?.", TokenKind::Op),
    ("*.", TokenKind::Op),
    ("?:", TokenKind::Op),
    (".&", TokenKind::Op),
    ("==", TokenKind::Op),
    ("!=", TokenKind::Op),
    ("<=", TokenKind::Op),
    (">=", TokenKind::Op),
    ("&&", TokenKind::Op),
    ("||", TokenKind::Op),
    ("++", TokenKind::Op),
    ("--", TokenKind::Op),
    ("+=", TokenKind::CompoundAssign),
    ("-=", TokenKind::CompoundAssign),
    ("*=", TokenKind::CompoundAssign),
    ("/=", TokenKind::CompoundAssign),
    ("%=", TokenKind::CompoundAssign),
    ("**", TokenKind::Op),
    ("=~", TokenKind::Op),
    ("<<", TokenKind::Op),
    (">>", TokenKind::Op),
    ("..", TokenKind::Op),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("?", TokenKind::Question),
    ("@", TokenKind::At),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Op),
    ("-", TokenKind::Op),
    ("*", TokenKind::Op),
    ("/", TokenKind::Op),
    ("%", TokenKind::Op),
    ("<", TokenKind::Op),
    (">", TokenKind::Op),
    ("!", TokenKind::Op),
    ("~", TokenKind::Op),
    ("&", TokenKind::Op),
    ("|", TokenKind::Op),
    ("^", TokenKind::Op),
];

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Tokenize a whole script.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<DslError>) {
    tokenize_range(source, Span::new(0, source.len()))
}

/// Tokenize `range` of `source`. Token spans are absolute offsets into `source`.
pub fn tokenize_range(source: &str, range: Span) -> (Vec<Token>, Vec<DslError>) {
    let tokenizer = Tokenizer {
        source,
        bytes: source.as_bytes(),
        pos: range.start,
        end: range.end.min(source.len()),
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    tokenizer.run()
}

struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    tokens: Vec<Token>,
    errors: Vec<DslError>,
}

impl Tokenizer<'_> {
    fn run(mut self) -> (Vec<Token>, Vec<DslError>) {
        if self.pos == 0 && self.bytes[..self.end].starts_with(b"#!") {
            self.skip_line_comment();
        }
        while self.pos < self.end {
            let b = self.bytes[self.pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\x0c' => self.pos += 1,
                b'\n' => {
                    self.push(TokenKind::Newline, self.pos, self.pos + 1);
                    self.pos += 1;
                }
                b'\\' if self.line_continuation_len() > 0 => {
                    self.pos += self.line_continuation_len();
                }
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'\'' | b'"' => self.string(),
                b'0'..=b'9' => self.number(),
                b if is_ident_start(b) => self.ident(),
                _ => self.punct(),
            }
        }
        self.push(TokenKind::Eof, self.end, self.end);
        (self.tokens, self.errors)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        let i = self.pos + ahead;
        if i < self.end {
            Some(self.bytes[i])
        } else {
            None
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn line_continuation_len(&self) -> usize {
        match (self.peek(1), self.peek(2)) {
            (Some(b'\n'), _) => 2,
            (Some(b'\r'), Some(b'\n')) => 3,
            _ => 0,
        }
    }

    fn skip_line_comment(&mut self) {
        match memchr::memchr(b'\n', &self.bytes[self.pos..self.end]) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.end,
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.pos;
        match memchr::memmem::find(&self.bytes[start + 2..self.end], b"*/") {
            Some(offset) => self.pos = start + 2 + offset + 2,
            None => {
                self.errors.push(DslError::unterminated_comment(
                    self.source,
                    Span::new(start, self.end),
                ));
                self.pos = self.end;
            }
        }
    }

    fn string(&mut self) {
        let start = self.pos;
        let quote = self.bytes[start];
        let triple = self.bytes[start..self.end].starts_with(&[quote, quote, quote]);
        let body = start + if triple { 3 } else { 1 };
        match scan_string_body(self.bytes, body, self.end, quote, triple) {
            Ok(end) => {
                self.push(TokenKind::Str, start, end);
                self.pos = end;
            }
            Err(stop) => {
                self.errors.push(DslError::unterminated_string(
                    self.source,
                    Span::new(start, stop),
                ));
                self.push(TokenKind::Str, start, stop);
                self.pos = stop;
            }
        }
    }

    fn number(&mut self) {
        let start = self.pos;
        let bytes = self.bytes;
        let end = self.end;
        let mut i = start;
        let digit = |i: usize| i < end && (bytes[i].is_ascii_digit() || bytes[i] == b'_');

        if bytes[i] == b'0' && i + 1 < end && matches!(bytes[i + 1], b'x' | b'X') {
            i += 2;
            while i < end && (bytes[i].is_ascii_hexdigit() || bytes[i] == b'_') {
                i += 1;
            }
        } else {
            while digit(i) {
                i += 1;
            }
            if i + 1 < end && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
                while digit(i) {
                    i += 1;
                }
            }
            if i < end && matches!(bytes[i], b'e' | b'E') {
                let mut j = i + 1;
                if j < end && matches!(bytes[j], b'+' | b'-') {
                    j += 1;
                }
                if j < end && bytes[j].is_ascii_digit() {
                    i = j;
                    while digit(i) {
                        i += 1;
                    }
                }
            }
        }
        let suffix = i < end
            && matches!(
                bytes[i],
                b'l' | b'L' | b'g' | b'G' | b'd' | b'D' | b'f' | b'F' | b'i' | b'I'
            )
            && !(i + 1 < end && is_ident_continue(bytes[i + 1]));
        if suffix {
            i += 1;
        }
        self.push(TokenKind::Number, start, i);
        self.pos = i;
    }

    fn ident(&mut self) {
        let start = self.pos;
        let mut i = start;
        while i < self.end && is_ident_continue(self.bytes[i]) {
            i += 1;
        }
        self.push(TokenKind::Ident, start, i);
        self.pos = i;
    }

    fn punct(&mut self) {
        let rest = &self.bytes[self.pos..self.end];
        for (op, kind) in OPERATORS {
            if rest.starts_with(op.as_bytes()) {
                self.push(*kind, self.pos, self.pos + op.len());
                self.pos += op.len();
                return;
            }
        }
        let ch = self.source[self.pos..].chars().next().unwrap_or('\0');
        let len = ch.len_utf8().max(1);
        self.errors.push(DslError::unexpected_char(
            self.source,
            ch,
            Span::new(self.pos, self.pos + len),
        ));
        self.pos += len;
    }
}

/// Scan a string body starting after the opening quote(s).
///
/// Returns the offset just past the closing quote(s), or `Err` with the
/// offset where scanning stopped (a newline for single-line strings, or
/// `end`).
fn scan_string_body(
    bytes: &[u8],
    mut i: usize,
    end: usize,
    quote: u8,
    triple: bool,
) -> Result<usize, usize> {
    let interpolating = quote == b'"';
    while i < end {
        let b = bytes[i];
        if b == b'\\' {
            i = (i + 2).min(end);
            continue;
        }
        if triple {
            if bytes[i..end].starts_with(&[quote, quote, quote]) {
                return Ok(i + 3);
            }
        } else if b == quote {
            return Ok(i + 1);
        } else if b == b'\n' {
            return Err(i);
        }
        if interpolating && b == b'$' && i + 1 < end && bytes[i + 1] == b'{' {
            i = skip_interpolation(bytes, i + 2, end)?;
            continue;
        }
        i += 1;
    }
    Err(end)
}

/// Skip an interpolation body starting just after `${`. Returns the offset
/// just past the matching `}`.
pub(crate) fn skip_interpolation(bytes: &[u8], mut i: usize, end: usize) -> Result<usize, usize> {
    let mut depth = 1usize;
    while i < end {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            q @ (b'\'' | b'"') => {
                let triple = bytes[i..end].starts_with(&[q, q, q]);
                let body = i + if triple { 3 } else { 1 };
                i = scan_string_body(bytes, body, end, q, triple)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    Err(end)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        tokens.iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<&str> {
        let (tokens, _) = tokenize(source);
        tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text(source))
            .collect()
    }

    #[test]
    fn command_expression() {
        use TokenKind::*;
        assert_eq!(
            kinds("compile 'a:b:1.0'\n"),
            vec![Ident, Str, Newline, Eof]
        );
    }

    #[test]
    fn assignment_and_block() {
        assert_eq!(
            texts("ext {\n  v = \"1\"\n}"),
            vec!["ext", "{", "\n", "v", "=", "\"1\"", "\n", "}"]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let source = "#!/usr/bin/env groovy\na = 1 // trailing\n/* block\n comment */b = 2";
        assert_eq!(
            texts(source),
            vec!["\n", "a", "=", "1", "\n", "b", "=", "2"]
        );
    }

    #[test]
    fn interpolation_with_nested_quotes_stays_one_token() {
        let source = r#"x = "a ${map["k"]} b""#;
        assert_eq!(texts(source), vec!["x", "=", r#""a ${map["k"]} b""#]);
    }

    #[test]
    fn triple_quoted_strings_span_lines() {
        let source = "s = '''one\ntwo'''\n";
        assert_eq!(texts(source), vec!["s", "=", "'''one\ntwo'''", "\n"]);
    }

    #[test]
    fn escaped_quote_does_not_terminate() {
        let source = r"s = 'it\'s'";
        assert_eq!(texts(source), vec!["s", "=", r"'it\'s'"]);
    }

    #[test]
    fn numbers_with_suffixes_and_exponents() {
        assert_eq!(
            texts("a 24 1.5 10L 0xFF 1e10 2.0d"),
            vec!["a", "24", "1.5", "10L", "0xFF", "1e10", "2.0d"]
        );
    }

    #[test]
    fn range_is_not_a_decimal() {
        assert_eq!(texts("1..5"), vec!["1", "..", "5"]);
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            texts("a ?: b?.c ==~ d -> e"),
            vec!["a", "?:", "b", "?.", "c", "==~", "d", "->", "e"]
        );
    }

    #[test]
    fn crlf_line_endings() {
        use TokenKind::*;
        assert_eq!(kinds("a = 1\r\nb"), vec![Ident, Assign, Number, Newline, Ident, Eof]);
    }

    #[test]
    fn line_continuation_joins_lines() {
        assert_eq!(texts("a = 1 + \\\n 2"), vec!["a", "=", "1", "+", "2"]);
    }

    #[test]
    fn unterminated_string_reports_and_recovers() {
        let source = "a = 'oops\nb = 1";
        let (tokens, errors) = tokenize(source);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DslError::UnterminatedString { line: 1, .. }));
        let texts: Vec<_> = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(texts, vec!["a", "=", "'oops", "\n", "b", "=", "1", ""]);
    }

    #[test]
    fn unexpected_character_is_skipped() {
        let source = "a = `b`";
        let (tokens, errors) = tokenize(source);
        assert_eq!(errors.len(), 2);
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn tokenize_range_uses_absolute_offsets() {
        let source = "\"${a.b}\"";
        let (tokens, errors) = tokenize_range(source, Span::new(3, 6));
        assert!(errors.is_empty());
        assert_eq!(tokens[0].span, Span::new(3, 4));
        assert_eq!(tokens[2].span, Span::new(5, 6));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn skip_interpolation_finds_matching_brace() {
        let source = b"{ a } } rest";
        assert_eq!(skip_interpolation(source, 0, source.len()), Ok(7));
    }
}
