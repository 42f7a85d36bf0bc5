//! Stable identifiers for symbols held in the registry arena.

use std::fmt;

/// Index of a class in the symbol registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// A method or constructor of a class, addressed by declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub class: ClassId,
    pub index: u32,
}

impl MethodId {
    pub fn new(class: ClassId, index: u32) -> Self {
        Self { class, index }
    }
}

/// A lexical block inside one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// A position marker in a method's instruction stream.
///
/// Labels are allocated in emission order, so comparing two labels of the
/// same method compares where their blocks start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.method#{}", self.class, self.index)
    }
}
