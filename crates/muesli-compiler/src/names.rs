//! Token and identifier helpers.
//!
//! Lines reach the compiler already split; these helpers do the remaining
//! word-level work: identifier checks, whitespace normalization and
//! splitting at top-level separators while skipping literals and brackets.

use muesli_core::{CompilationError, Result, Span};

/// Words that can never name a variable, member or class.
pub const KEYWORDS: &[&str] = &[
    "abstract",
    "class",
    "const",
    "constructor",
    "extends",
    "false",
    "func",
    "implements",
    "import",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "sealed",
    "serial",
    "static",
    "super",
    "this",
    "true",
    "var",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// `[A-Za-z_$][A-Za-z0-9_$]*`, not a keyword.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !is_keyword(text)
}

/// Identifiers joined by `.` or `/`.
pub fn is_type_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .split(['.', '/'])
            .all(is_identifier)
}

/// Fail with a grammar error unless `text` is a valid identifier.
pub fn check_identifier(text: &str, what: &str, span: Span) -> Result<()> {
    if is_identifier(text) {
        Ok(())
    } else {
        Err(CompilationError::grammar(
            format!("invalid {} name '{}'", what, text),
            span,
        ))
    }
}

/// Fail with a grammar error unless `text` is a valid type name.
pub fn check_type_name(text: &str, span: Span) -> Result<()> {
    if is_type_name(text) {
        Ok(())
    } else {
        Err(CompilationError::grammar(
            format!("invalid type name '{}'", text),
            span,
        ))
    }
}

/// Walks a string tracking literal and bracket nesting.
struct Scanner {
    quote: Option<char>,
    escaped: bool,
    depth: usize,
}

impl Scanner {
    fn new() -> Self {
        Self {
            quote: None,
            escaped: false,
            depth: 0,
        }
    }

    /// Feed one char; returns `true` if it sits at top level outside any
    /// literal or bracket.
    fn step(&mut self, c: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return false;
        }
        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                false
            }
            '(' | '[' => {
                self.depth += 1;
                false
            }
            ')' | ']' => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Collapse whitespace runs outside literals into single spaces and trim.
pub fn normalize_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for c in text.trim().chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}

/// Split at every top-level `sep`, trimming each part.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut scanner = Scanner::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if scanner.step(c) && c == sep {
            parts.push(text[start..i].trim());
            start = i + c.len_utf8();
        }
    }
    parts.push(text[start..].trim());
    parts
}

/// Byte offset of the top-level assignment `=`, ignoring `==`, `!=`, `<=`
/// and `>=`.
pub fn find_assignment(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut scanner = Scanner::new();
    for (i, c) in text.char_indices() {
        let top = scanner.step(c);
        if !top || c != '=' {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        if matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) || next == Some(b'=') {
            continue;
        }
        return Some(i);
    }
    None
}

/// If `text` starts with the word `keyword`, the trimmed remainder.
pub fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        _ => None,
    }
}

/// Byte offset of `word` as a whole whitespace-separated word.
pub fn find_word(text: &str, word: &str) -> Option<usize> {
    let mut offset = 0;
    for part in text.split(' ') {
        if part == word {
            return Some(offset);
        }
        offset += part.len() + 1;
    }
    None
}
