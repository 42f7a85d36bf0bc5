//! Logical line splitter.
//!
//! Turns raw source text into a tree of [`SourceLine`]s:
//!
//! ```text
//! class Point {                 SourceLine "class Point"
//!     var x: int = 0              ├── SourceLine "var x: int = 0"
//!     func get(): int {           └── SourceLine "func get(): int"
//!         return x                      └── SourceLine "return x"
//!     }
//! }
//! ```
//!
//! A line ends at a newline or `;` outside string and char literals and
//! outside parentheses. `{` attaches a nested body to the line before it and
//! `}` closes that body. `//` comments run to the end of the line.

use muesli_core::{CompilationError, Result, Span};

/// One logical line, with its nested body if it opened a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub text: String,
    pub line: u32,
    pub body: Option<Vec<SourceLine>>,
}

impl SourceLine {
    pub fn new(text: impl Into<String>, line: u32) -> Self {
        Self {
            text: text.into(),
            line,
            body: None,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line)
    }

    /// Statements of the nested body, empty when there is none.
    pub fn body_lines(&self) -> &[SourceLine] {
        self.body.as_deref().unwrap_or(&[])
    }
}

struct Frame {
    header: String,
    line: u32,
    children: Vec<SourceLine>,
}

struct Splitter {
    frames: Vec<Frame>,
    top: Vec<SourceLine>,
    current: String,
    current_line: u32,
    line: u32,
}

impl Splitter {
    fn level(&mut self) -> &mut Vec<SourceLine> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.top,
        }
    }

    fn push_char(&mut self, c: char) {
        if self.current.trim().is_empty() {
            self.current.clear();
            self.current_line = self.line;
        }
        self.current.push(c);
    }

    fn flush(&mut self) {
        let text = self.current.trim().to_string();
        self.current.clear();
        if !text.is_empty() {
            let line = self.current_line;
            self.level().push(SourceLine::new(text, line));
        }
    }

    fn open(&mut self) -> Result<()> {
        let (header, line) = if self.current.trim().is_empty() {
            // `{` on its own line belongs to the previous line
            let line = self.line;
            match self.level().pop() {
                Some(prev) if prev.body.is_none() => (prev.text, prev.line),
                _ => {
                    return Err(CompilationError::grammar(
                        "block without a header",
                        Span::new(line),
                    ));
                }
            }
        } else {
            let header = self.current.trim().to_string();
            self.current.clear();
            (header, self.current_line)
        };
        self.frames.push(Frame {
            header,
            line,
            children: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush();
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| CompilationError::grammar("unmatched '}'", Span::new(self.line)))?;
        let line = SourceLine {
            text: frame.header,
            line: frame.line,
            body: Some(frame.children),
        };
        self.level().push(line);
        Ok(())
    }
}

/// Split `source` into logical lines.
pub fn split_lines(source: &str) -> Result<Vec<SourceLine>> {
    let mut splitter = Splitter {
        frames: Vec::new(),
        top: Vec::new(),
        current: String::new(),
        current_line: 1,
        line: 1,
    };
    let mut chars = source.chars().peekable();
    let mut quote: Option<(char, u32)> = None;
    let mut escaped = false;
    let mut parens = 0usize;

    while let Some(c) = chars.next() {
        if let Some((q, start)) = quote {
            if c == '\n' {
                return Err(CompilationError::grammar(
                    "unterminated literal",
                    Span::new(start),
                ));
            }
            splitter.push_char(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some((c, splitter.line));
                splitter.push_char(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '(' => {
                parens += 1;
                splitter.push_char(c);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                splitter.push_char(c);
            }
            '\n' => {
                if parens == 0 {
                    splitter.flush();
                } else {
                    splitter.push_char(' ');
                }
                splitter.line += 1;
            }
            ';' if parens == 0 => splitter.flush(),
            '{' if parens == 0 => splitter.open()?,
            '}' if parens == 0 => splitter.close()?,
            '\r' => {}
            _ => splitter.push_char(c),
        }
    }

    if let Some((_, start)) = quote {
        return Err(CompilationError::grammar(
            "unterminated literal",
            Span::new(start),
        ));
    }
    splitter.flush();
    if let Some(frame) = splitter.frames.last() {
        return Err(CompilationError::grammar(
            "unclosed '{'",
            Span::new(frame.line),
        ));
    }
    Ok(splitter.top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[SourceLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_on_newline_and_semicolon() {
        let lines = split_lines("var a = 1; var b = 2\nreturn a").unwrap();
        assert_eq!(texts(&lines), vec!["var a = 1", "var b = 2", "return a"]);
        assert_eq!(lines[2].line, 2);
    }

    #[test]
    fn nests_bodies() {
        let source = "class Point {\n  constructor Point(x: int) {\n    super()\n  }\n}\n";
        let lines = split_lines(source).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "class Point");
        let members = lines[0].body_lines();
        assert_eq!(members[0].text, "constructor Point(x: int)");
        assert_eq!(members[0].line, 2);
        assert_eq!(texts(members[0].body_lines()), vec!["super()"]);
    }

    #[test]
    fn empty_body_is_present() {
        let lines = split_lines("func run() {}").unwrap();
        assert_eq!(lines[0].body, Some(vec![]));
    }

    #[test]
    fn brace_on_next_line() {
        let lines = split_lines("class A\n{\n  var x: int\n}").unwrap();
        assert_eq!(lines[0].text, "class A");
        assert_eq!(texts(lines[0].body_lines()), vec!["var x: int"]);
    }

    #[test]
    fn literals_and_comments() {
        let lines = split_lines("var s = \"a;b{c}\" // trailing; comment\nvar c = ';'").unwrap();
        assert_eq!(texts(&lines), vec!["var s = \"a;b{c}\"", "var c = ';'"]);
    }

    #[test]
    fn parameter_lists_may_span_lines() {
        let lines = split_lines("constructor P(x: int,\n   y: int) {\n}").unwrap();
        assert_eq!(lines[0].text, "constructor P(x: int,    y: int)");
        assert_eq!(lines[0].line, 1);
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert!(split_lines("class A {").is_err());
        assert!(split_lines("}").is_err());
        assert!(split_lines("var s = \"open").is_err());
    }
}
