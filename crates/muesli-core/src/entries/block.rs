//! Lexical blocks.

use crate::{BlockId, Label};

/// The instruction range a block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub block: BlockId,
    pub start: Label,
    pub end: Label,
}

impl Scope {
    pub fn new(block: BlockId, start: Label, end: Label) -> Self {
        Self { block, start, end }
    }

    /// Whether a local declared in `self` is visible from `other`.
    #[inline]
    pub fn encloses(&self, other: &Scope) -> bool {
        other.start >= self.start
    }
}

/// A lexical block of a method body.
///
/// Constructor blocks also record whether the superclass initializer has
/// been invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub scope: Scope,
    is_constructor: bool,
    super_called: bool,
}

impl Block {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            is_constructor: false,
            super_called: false,
        }
    }

    /// Block of a constructor body, with the super-call flag cleared.
    pub fn constructor(scope: Scope) -> Self {
        Self {
            scope,
            is_constructor: true,
            super_called: false,
        }
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    #[inline]
    pub fn has_called_super(&self) -> bool {
        self.super_called
    }

    /// Record the superclass initializer call.
    ///
    /// Returns `false` if it had already been recorded.
    pub fn mark_super_called(&mut self) -> bool {
        !std::mem::replace(&mut self.super_called, true)
    }
}
