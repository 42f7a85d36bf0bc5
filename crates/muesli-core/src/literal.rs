//! Typed literal values.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::{Descriptor, PrimitiveKind};

/// Source-level type of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    Primitive(PrimitiveKind),
    String,
    Null,
}

impl LiteralType {
    /// Source-level type name (`int`, `string`, `null`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            LiteralType::Primitive(kind) => kind.name(),
            LiteralType::String => "string",
            LiteralType::Null => "null",
        }
    }

    /// Descriptor of this literal type. `null` has none of its own.
    pub fn descriptor(&self) -> Option<Descriptor> {
        match self {
            LiteralType::Primitive(kind) => Some(Descriptor::Primitive(*kind)),
            LiteralType::String => Some(Descriptor::string()),
            LiteralType::Null => None,
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed literal, ready for constant emission.
///
/// Floats are wrapped in [`OrderedFloat`] so values can be hashed when they
/// are deduplicated into a constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Boolean(bool),
    /// `byte`, `short` and `int` values.
    Int(i32),
    Char(u16),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
    Null,
}

impl LiteralValue {
    /// Integer payload for values the VM keeps as a 32-bit int.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            LiteralValue::Boolean(b) => Some(*b as i32),
            LiteralValue::Int(v) => Some(*v),
            LiteralValue::Char(c) => Some(*c as i32),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LiteralValue::Null)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Char(c) => match char::from_u32(*c as u32) {
                Some(ch) => write!(f, "'{}'", ch),
                None => write!(f, "'\\u{:04x}'", c),
            },
            LiteralValue::Long(v) => write!(f, "{}L", v),
            LiteralValue::Float(v) => write!(f, "{}f", v),
            LiteralValue::Double(v) => write!(f, "{}", v),
            LiteralValue::String(s) => write!(f, "{:?}", s),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}
