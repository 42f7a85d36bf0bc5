//! Local variable symbols.

use crate::{AccessFlags, Descriptor, Scope};

/// A parameter or local variable of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSymbol {
    pub name: String,
    pub descriptor: Descriptor,
    /// Declaring block; `None` until a parameter is bound to the body block.
    pub scope: Option<Scope>,
    pub slot: u16,
    pub modifiers: AccessFlags,
}

impl LocalSymbol {
    pub fn new(
        name: impl Into<String>,
        descriptor: Descriptor,
        scope: Option<Scope>,
        slot: u16,
        modifiers: AccessFlags,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            scope,
            slot,
            modifiers,
        }
    }

    /// Declared with `const`.
    pub fn is_read_only(&self) -> bool {
        self.modifiers.is_final()
    }

    /// Whether this local is visible from a lookup made in `from`.
    pub fn is_visible_from(&self, from: Option<&Scope>) -> bool {
        match (self.scope.as_ref(), from) {
            (Some(declared), Some(from)) => declared.encloses(from),
            _ => true,
        }
    }
}
