//! Source location tracking for error reporting.
//!
//! Sources reach the compiler already split into logical lines, so a
//! [`Span`] only needs the 1-based line a logical line started on.

use std::fmt;

/// Location of a logical line in its source file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 when synthesized).
    pub line: u32,
}

impl Span {
    /// Create a span for the given line.
    #[inline]
    pub fn new(line: u32) -> Self {
        Self { line }
    }

    /// Span used for code the compiler synthesizes itself.
    #[inline]
    pub fn synthetic() -> Self {
        Self { line: 0 }
    }

    /// Whether this span points at synthesized code.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.line)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "<generated>")
        } else {
            write!(f, "line {}", self.line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line() {
        assert_eq!(Span::new(12).to_string(), "line 12");
        assert_eq!(Span::synthetic().to_string(), "<generated>");
    }
}
