//! Compilation error type.
//!
//! Every violation detected anywhere in the pipeline is reported as a
//! [`CompilationError`]. There is no recoverable error: the first one aborts
//! the whole compilation unit.
//!
//! ## Categories
//!
//! ```text
//! CompilationError
//! ├── Grammar      - missing/duplicate keywords, malformed lists, stray tokens
//! ├── Duplicate    - repeated member, parameter or local names
//! ├── UnknownType  - a type name the resolver cannot find
//! ├── Resolution   - other lookup failures (interfaces, variables, members)
//! ├── TypeMismatch - assignability failures
//! ├── Protocol     - super-call and return-shape violations
//! └── Internal     - broken compiler invariants
//! ```

use std::fmt;

use thiserror::Error;

use crate::Span;

/// Result alias used across the compiler crates.
pub type Result<T> = std::result::Result<T, CompilationError>;

/// Category of a [`CompilationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Grammar,
    Duplicate,
    Resolution,
    Type,
    Protocol,
    Internal,
}

impl ErrorKind {
    /// Human-readable category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Grammar => "grammar error",
            ErrorKind::Duplicate => "duplicate definition",
            ErrorKind::Resolution => "resolution error",
            ErrorKind::Type => "type error",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while declaring classes or compiling their bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// Malformed source: missing or unexpected tokens and keywords.
    #[error("at {span}: {message}")]
    Grammar { message: String, span: Span },

    /// A name was defined twice in the same scope.
    #[error("at {span}: duplicate {what} '{name}'")]
    Duplicate {
        what: &'static str,
        name: String,
        span: Span,
    },

    /// A type name could not be resolved to a known class.
    #[error("at {span}: unknown type '{name}'")]
    UnknownType { name: String, span: Span },

    /// Any other failed lookup.
    #[error("at {span}: {message}")]
    Resolution { message: String, span: Span },

    /// A value is not assignable where it is used.
    #[error("at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// Constructor or return protocol violated.
    #[error("at {span}: {message}")]
    Protocol { message: String, span: Span },

    /// A compiler invariant was broken.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    pub fn grammar(message: impl Into<String>, span: Span) -> Self {
        CompilationError::Grammar {
            message: message.into(),
            span,
        }
    }

    pub fn duplicate(what: &'static str, name: impl Into<String>, span: Span) -> Self {
        CompilationError::Duplicate {
            what,
            name: name.into(),
            span,
        }
    }

    pub fn unknown_type(name: impl Into<String>, span: Span) -> Self {
        CompilationError::UnknownType {
            name: name.into(),
            span,
        }
    }

    pub fn resolution(message: impl Into<String>, span: Span) -> Self {
        CompilationError::Resolution {
            message: message.into(),
            span,
        }
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn protocol(message: impl Into<String>, span: Span) -> Self {
        CompilationError::Protocol {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal {
            message: message.into(),
        }
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilationError::Grammar { .. } => ErrorKind::Grammar,
            CompilationError::Duplicate { .. } => ErrorKind::Duplicate,
            CompilationError::UnknownType { .. } | CompilationError::Resolution { .. } => {
                ErrorKind::Resolution
            }
            CompilationError::TypeMismatch { .. } => ErrorKind::Type,
            CompilationError::Protocol { .. } => ErrorKind::Protocol,
            CompilationError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Where the error occurred, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompilationError::Grammar { span, .. }
            | CompilationError::Duplicate { span, .. }
            | CompilationError::UnknownType { span, .. }
            | CompilationError::Resolution { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::Protocol { span, .. } => Some(*span),
            CompilationError::Internal { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_span() {
        let err = CompilationError::grammar("Expecting class definition", Span::new(3));
        assert_eq!(err.to_string(), "at line 3: Expecting class definition");
    }

    #[test]
    fn duplicate_message() {
        let err = CompilationError::duplicate("parameter", "x", Span::new(1));
        assert_eq!(err.to_string(), "at line 1: duplicate parameter 'x'");
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[test]
    fn unknown_type_is_resolution_kind() {
        let err = CompilationError::unknown_type("Foo", Span::new(2));
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(err.span(), Some(Span::new(2)));
    }

    #[test]
    fn internal_has_no_span() {
        let err = CompilationError::internal("label bound twice");
        assert_eq!(err.span(), None);
        assert_eq!(err.kind().as_str(), "internal error");
    }
}
