//! Binary type descriptors.
//!
//! A descriptor is the class-file encoding of a type: a one-character code
//! for primitives (`I`, `Z`, ...) or `L<path>;` for references, where the
//! path is a slash-separated fully qualified class name.

use std::fmt;

/// Root of the class hierarchy.
pub const OBJECT_CLASS: &str = "java/lang/Object";
/// Class backing the `string` type.
pub const STRING_CLASS: &str = "java/lang/String";
/// Marker interface added by the `serial` class keyword.
pub const SERIALIZABLE_CLASS: &str = "java/io/Serializable";

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Source-level name of this primitive.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// One-character descriptor code.
    pub const fn code(self) -> char {
        match self {
            PrimitiveKind::Void => 'V',
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Byte => 'B',
            PrimitiveKind::Short => 'S',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Float => 'F',
            PrimitiveKind::Double => 'D',
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "void" => PrimitiveKind::Void,
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'V' => PrimitiveKind::Void,
            'Z' => PrimitiveKind::Boolean,
            'B' => PrimitiveKind::Byte,
            'S' => PrimitiveKind::Short,
            'C' => PrimitiveKind::Char,
            'I' => PrimitiveKind::Int,
            'J' => PrimitiveKind::Long,
            'F' => PrimitiveKind::Float,
            'D' => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Types held on the operand stack as a 32-bit int.
    pub const fn is_int_like(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
        )
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub const fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// Whether a value of `self` widens implicitly to `target`.
    ///
    /// Identity counts as widening. `boolean` only matches itself and `char`
    /// is unsigned, so neither `byte` nor `short` widen into it.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean | Void => false,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field or local type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Primitive(PrimitiveKind),
    /// Reference to a class, by slash-separated path.
    Object(String),
}

impl Descriptor {
    pub const VOID: Descriptor = Descriptor::Primitive(PrimitiveKind::Void);
    pub const BOOLEAN: Descriptor = Descriptor::Primitive(PrimitiveKind::Boolean);
    pub const INT: Descriptor = Descriptor::Primitive(PrimitiveKind::Int);
    pub const LONG: Descriptor = Descriptor::Primitive(PrimitiveKind::Long);
    pub const DOUBLE: Descriptor = Descriptor::Primitive(PrimitiveKind::Double);

    /// Reference descriptor for a class path (`a/b/C`).
    pub fn object(path: impl Into<String>) -> Self {
        Descriptor::Object(path.into())
    }

    pub fn string() -> Self {
        Descriptor::Object(STRING_CLASS.to_string())
    }

    pub fn root_object() -> Self {
        Descriptor::Object(OBJECT_CLASS.to_string())
    }

    /// Parse a single descriptor such as `I` or `Ljava/lang/String;`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let first = chars.next()?;
        if first == 'L' {
            let path = text.strip_prefix('L')?.strip_suffix(';')?;
            if path.is_empty() || path.contains(';') {
                return None;
            }
            return Some(Descriptor::Object(path.to_string()));
        }
        if chars.next().is_some() {
            return None;
        }
        PrimitiveKind::from_code(first).map(Descriptor::Primitive)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Descriptor::Primitive(PrimitiveKind::Void))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Descriptor::Primitive(kind) if *kind != PrimitiveKind::Void)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Descriptor::Object(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Descriptor::Object(path) if path == STRING_CLASS)
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Descriptor::Primitive(kind) => Some(*kind),
            Descriptor::Object(_) => None,
        }
    }

    /// Class path of a reference descriptor.
    pub fn class_path(&self) -> Option<&str> {
        match self {
            Descriptor::Object(path) => Some(path),
            Descriptor::Primitive(_) => None,
        }
    }

    /// Name used in diagnostics: `int`, `string`, or the simple class name.
    pub fn display_name(&self) -> String {
        match self {
            Descriptor::Primitive(kind) => kind.name().to_string(),
            Descriptor::Object(path) if path == STRING_CLASS => "string".to_string(),
            Descriptor::Object(path) => path.rsplit('/').next().unwrap_or(path).to_string(),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Primitive(kind) => write!(f, "{}", kind.code()),
            Descriptor::Object(path) => write!(f, "L{};", path),
        }
    }
}

/// Build a method descriptor `(<params>)<return>`.
pub fn method_descriptor<'a>(
    params: impl IntoIterator<Item = &'a Descriptor>,
    return_type: &Descriptor,
) -> String {
    let mut desc = String::from("(");
    for param in params {
        desc.push_str(&param.to_string());
    }
    desc.push(')');
    desc.push_str(&return_type.to_string());
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_codes_round_trip_names() {
        for name in ["int", "long", "short", "byte", "char", "float", "double", "boolean"] {
            let kind = PrimitiveKind::from_name(name).unwrap();
            assert_eq!(PrimitiveKind::from_code(kind.code()), Some(kind));
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn reference_display_is_padded() {
        assert_eq!(Descriptor::string().to_string(), "Ljava/lang/String;");
        assert_eq!(Descriptor::INT.to_string(), "I");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(Descriptor::parse("Ljava/lang/Object;"), Some(Descriptor::root_object()));
        assert_eq!(Descriptor::parse("J"), Some(Descriptor::LONG));
        assert_eq!(Descriptor::parse("L;"), None);
        assert_eq!(Descriptor::parse("II"), None);
        assert_eq!(Descriptor::parse("Lfoo"), None);
    }

    #[test]
    fn widening_rules() {
        use PrimitiveKind::*;
        assert!(Int.widens_to(Long));
        assert!(Char.widens_to(Int));
        assert!(Float.widens_to(Double));
        assert!(!Long.widens_to(Int));
        assert!(!Byte.widens_to(Char));
        assert!(!Boolean.widens_to(Int));
        assert!(!Int.widens_to(Boolean));
    }

    #[test]
    fn method_descriptor_layout() {
        let params = [Descriptor::INT, Descriptor::string()];
        assert_eq!(
            method_descriptor(&params, &Descriptor::VOID),
            "(ILjava/lang/String;)V"
        );
        assert_eq!(method_descriptor(&[], &Descriptor::BOOLEAN), "()Z");
    }

    #[test]
    fn display_names() {
        assert_eq!(Descriptor::string().display_name(), "string");
        assert_eq!(Descriptor::object("geo/Point").display_name(), "Point");
        assert_eq!(Descriptor::DOUBLE.display_name(), "double");
    }
}
