//! Signature & type utility.
//!
//! Pure functions over type names, literal text and descriptors that every
//! compiler stage relies on:
//!
//! - [`TypeResolver`]: source type name to [`Descriptor`]
//! - [`infer_type`] / [`parse_literal`]: literal classification and parsing
//! - [`is_assignable`]: the single gate before any store, return or field write
//! - instruction selection for constant pushes, loads, stores, returns and
//!   widening conversions; callers never pick opcodes themselves

use ordered_float::OrderedFloat;

use muesli_core::{
    ClassSymbol, CompilationError, Descriptor, LiteralType, LiteralValue, MethodSymbol,
    PrimitiveKind, Result, Span,
};
use muesli_registry::SymbolRegistry;

use crate::bytecode::OpCode;

// ============================================================================
// Type names
// ============================================================================

/// Descriptor of a built-in type name (`int`, `string`, ...).
pub fn builtin_descriptor(name: &str) -> Option<Descriptor> {
    if name == "string" {
        return Some(Descriptor::string());
    }
    PrimitiveKind::from_name(name).map(Descriptor::Primitive)
}

/// Resolves type names written inside one class (and optionally one method).
pub struct TypeResolver<'a> {
    registry: &'a SymbolRegistry,
    from: &'a ClassSymbol,
    method: Option<&'a MethodSymbol>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a SymbolRegistry, from: &'a ClassSymbol) -> Self {
        Self {
            registry,
            from,
            method: None,
        }
    }

    /// Also resolve the generic parameters of `method`.
    pub fn in_method(mut self, method: &'a MethodSymbol) -> Self {
        self.method = Some(method);
        self
    }

    /// `signatureOf`: primitives map to their code, `string` to the platform
    /// string class, everything else to a registered class.
    pub fn resolve(&self, name: &str, span: Span) -> Result<Descriptor> {
        if let Some(desc) = builtin_descriptor(name) {
            return Ok(desc);
        }
        if let Some(generic) = self.method.and_then(|m| m.generic_param(name)) {
            return Ok(generic.erasure());
        }
        self.registry
            .resolve(name, self.from)
            .map(Descriptor::object)
            .ok_or_else(|| CompilationError::unknown_type(name, span))
    }

    /// Like [`resolve`](Self::resolve) but rejects `void`.
    pub fn resolve_value_type(&self, name: &str, span: Span) -> Result<Descriptor> {
        let desc = self.resolve(name, span)?;
        if desc.is_void() {
            return Err(CompilationError::type_mismatch(
                "'void' is not a value type",
                span,
            ));
        }
        Ok(desc)
    }
}

// ============================================================================
// Literals
// ============================================================================

fn strip_suffix_ci<'t>(text: &'t str, suffix: char) -> Option<&'t str> {
    text.strip_suffix(suffix)
        .or_else(|| text.strip_suffix(suffix.to_ascii_uppercase()))
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_text(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    body.bytes().next().is_some_and(|b| b.is_ascii_digit() || b == b'.')
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'-' | b'+'))
        && body.parse::<f64>().is_ok()
}

/// A single quoted literal: the closing quote is the last character and
/// no unescaped quote appears before it.
fn is_quoted(text: &str, quote: char) -> bool {
    let Some(body) = text.strip_prefix(quote) else {
        return false;
    };
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.next().is_none() => return false,
            '\\' => {}
            c if c == quote => return chars.as_str().is_empty(),
            _ => {}
        }
    }
    false
}

fn fits(kind: PrimitiveKind, value: i64) -> bool {
    match kind {
        PrimitiveKind::Byte => i8::try_from(value).is_ok(),
        PrimitiveKind::Short => i16::try_from(value).is_ok(),
        PrimitiveKind::Char => u16::try_from(value).is_ok(),
        PrimitiveKind::Int => i32::try_from(value).is_ok(),
        PrimitiveKind::Long => true,
        _ => false,
    }
}

/// `inferType`: classify literal `text`, using `hint` (the expected type) to
/// pick among compatible numeric types. `None` when `text` is not a literal.
pub fn infer_type(text: &str, hint: Option<&Descriptor>) -> Option<LiteralType> {
    let text = text.trim();
    let hint = hint.and_then(Descriptor::primitive);
    match text {
        "true" | "false" => return Some(LiteralType::Primitive(PrimitiveKind::Boolean)),
        "null" => return Some(LiteralType::Null),
        _ => {}
    }
    if is_quoted(text, '"') {
        return Some(LiteralType::String);
    }
    if is_quoted(text, '\'') {
        return Some(LiteralType::Primitive(PrimitiveKind::Char));
    }

    if let Some(digits) = strip_suffix_ci(text, 'l')
        && is_integer_text(digits)
    {
        return Some(LiteralType::Primitive(PrimitiveKind::Long));
    }
    if is_integer_text(text) {
        let value = text.parse::<i64>().ok()?;
        let kind = match hint {
            Some(kind) if kind.is_floating() => kind,
            Some(kind) if kind.is_integral() && fits(kind, value) => kind,
            _ if fits(PrimitiveKind::Int, value) => PrimitiveKind::Int,
            _ => PrimitiveKind::Long,
        };
        return Some(LiteralType::Primitive(kind));
    }

    if let Some(body) = strip_suffix_ci(text, 'f')
        && is_decimal_text(body)
    {
        return Some(LiteralType::Primitive(PrimitiveKind::Float));
    }
    if let Some(body) = strip_suffix_ci(text, 'd')
        && is_decimal_text(body)
    {
        return Some(LiteralType::Primitive(PrimitiveKind::Double));
    }
    if is_decimal_text(text) {
        let kind = match hint {
            Some(PrimitiveKind::Float) => PrimitiveKind::Float,
            _ => PrimitiveKind::Double,
        };
        return Some(LiteralType::Primitive(kind));
    }
    None
}

fn unescape(body: &str, span: Span) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        CompilationError::grammar(format!("invalid escape '\\u{}'", hex), span)
                    })?
            }
            other => {
                return Err(CompilationError::grammar(
                    format!("invalid escape '\\{}'", other.map(String::from).unwrap_or_default()),
                    span,
                ));
            }
        };
        out.push(escaped);
    }
    Ok(out)
}

/// `parseLiteral`: convert literal `text` of type `ty` into a value.
pub fn parse_literal(ty: LiteralType, text: &str, span: Span) -> Result<LiteralValue> {
    let text = text.trim();
    let invalid = || CompilationError::grammar(format!("invalid {} literal '{}'", ty, text), span);
    let kind = match ty {
        LiteralType::Null => return Ok(LiteralValue::Null),
        LiteralType::String => {
            if !is_quoted(text, '"') {
                return Err(invalid());
            }
            return Ok(LiteralValue::String(unescape(&text[1..text.len() - 1], span)?));
        }
        LiteralType::Primitive(kind) => kind,
    };

    let value = match kind {
        PrimitiveKind::Boolean => match text {
            "true" => LiteralValue::Boolean(true),
            "false" => LiteralValue::Boolean(false),
            _ => return Err(invalid()),
        },
        PrimitiveKind::Char if is_quoted(text, '\'') => {
            let decoded = unescape(&text[1..text.len() - 1], span)?;
            let mut units = decoded.encode_utf16();
            match (units.next(), units.next()) {
                (Some(unit), None) => LiteralValue::Char(unit),
                _ => return Err(invalid()),
            }
        }
        PrimitiveKind::Char => {
            LiteralValue::Char(text.parse::<u16>().map_err(|_| invalid())?)
        }
        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int => {
            let value = text.parse::<i64>().map_err(|_| invalid())?;
            if !fits(kind, value) {
                return Err(invalid());
            }
            LiteralValue::Int(value as i32)
        }
        PrimitiveKind::Long => {
            let digits = strip_suffix_ci(text, 'l').unwrap_or(text);
            LiteralValue::Long(digits.parse::<i64>().map_err(|_| invalid())?)
        }
        PrimitiveKind::Float => {
            let body = strip_suffix_ci(text, 'f').unwrap_or(text);
            LiteralValue::Float(OrderedFloat(body.parse::<f32>().map_err(|_| invalid())?))
        }
        PrimitiveKind::Double => {
            let body = strip_suffix_ci(text, 'd').unwrap_or(text);
            LiteralValue::Double(OrderedFloat(body.parse::<f64>().map_err(|_| invalid())?))
        }
        PrimitiveKind::Void => return Err(invalid()),
    };
    Ok(value)
}

/// Convert a numeric literal to the wider primitive `target`.
///
/// Values that are not numeric, or already of the target type, pass through.
pub fn widen_literal(value: LiteralValue, target: PrimitiveKind) -> LiteralValue {
    let as_i64 = match &value {
        LiteralValue::Int(v) => Some(i64::from(*v)),
        LiteralValue::Char(c) => Some(i64::from(*c)),
        LiteralValue::Long(v) => Some(*v),
        _ => None,
    };
    let widened = match (target, as_i64, &value) {
        (PrimitiveKind::Long, Some(v), _) => Some(LiteralValue::Long(v)),
        (PrimitiveKind::Int, Some(v), LiteralValue::Char(_)) => Some(LiteralValue::Int(v as i32)),
        (PrimitiveKind::Float, Some(v), _) => Some(LiteralValue::Float(OrderedFloat(v as f32))),
        (PrimitiveKind::Double, Some(v), _) => Some(LiteralValue::Double(OrderedFloat(v as f64))),
        (PrimitiveKind::Double, None, LiteralValue::Float(f)) => {
            Some(LiteralValue::Double(OrderedFloat(f64::from(f.0))))
        }
        _ => None,
    };
    widened.unwrap_or(value)
}

// ============================================================================
// Assignability
// ============================================================================

/// `isAssignable`: can a value of type `value` be stored where `target` is
/// expected.
///
/// Reflexive; primitives follow widening rules; references must be the same
/// class, the root object class, or a descendant of the target.
pub fn is_assignable(registry: &SymbolRegistry, target: &Descriptor, value: &Descriptor) -> bool {
    if target == value {
        return !target.is_void();
    }
    match (target, value) {
        (Descriptor::Primitive(t), Descriptor::Primitive(v)) => {
            *t != PrimitiveKind::Void && v.widens_to(*t)
        }
        (Descriptor::Object(t), Descriptor::Object(v)) => {
            t == muesli_core::OBJECT_CLASS || registry.is_subtype(v, t)
        }
        _ => false,
    }
}

/// Assignability of a literal; `null` fits any reference type.
pub fn is_literal_assignable(
    registry: &SymbolRegistry,
    target: &Descriptor,
    literal: LiteralType,
) -> bool {
    match literal.descriptor() {
        Some(desc) => is_assignable(registry, target, &desc),
        None => target.is_reference(),
    }
}

// ============================================================================
// Instruction selection
// ============================================================================

/// How a constant is pushed onto the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushInstruction {
    /// A dedicated opcode such as `iconst_1` or `aconst_null`.
    Simple(OpCode),
    Bipush(i8),
    Sipush(i16),
    /// `ldc` or `ldc_w`, chosen by pool index.
    Ldc,
    /// `ldc2_w` for longs and doubles.
    Ldc2,
}

/// Select the push instruction for a literal value.
pub fn push_instruction(value: &LiteralValue) -> PushInstruction {
    use PushInstruction::*;
    let int_push = |v: i32| match v {
        -1 => Simple(OpCode::IconstM1),
        0 => Simple(OpCode::Iconst0),
        1 => Simple(OpCode::Iconst1),
        2 => Simple(OpCode::Iconst2),
        3 => Simple(OpCode::Iconst3),
        4 => Simple(OpCode::Iconst4),
        5 => Simple(OpCode::Iconst5),
        v => match (i8::try_from(v), i16::try_from(v)) {
            (Ok(b), _) => Bipush(b),
            (_, Ok(s)) => Sipush(s),
            _ => Ldc,
        },
    };
    match value {
        LiteralValue::Boolean(b) => Simple(if *b { OpCode::Iconst1 } else { OpCode::Iconst0 }),
        LiteralValue::Int(v) => int_push(*v),
        LiteralValue::Char(c) => int_push(i32::from(*c)),
        LiteralValue::Long(0) => Simple(OpCode::Lconst0),
        LiteralValue::Long(1) => Simple(OpCode::Lconst1),
        LiteralValue::Long(_) => Ldc2,
        LiteralValue::Float(f) if f.0.to_bits() == 0.0f32.to_bits() => Simple(OpCode::Fconst0),
        LiteralValue::Float(f) if f.0 == 1.0 => Simple(OpCode::Fconst1),
        LiteralValue::Float(f) if f.0 == 2.0 => Simple(OpCode::Fconst2),
        LiteralValue::Float(_) => Ldc,
        LiteralValue::Double(d) if d.0.to_bits() == 0.0f64.to_bits() => Simple(OpCode::Dconst0),
        LiteralValue::Double(d) if d.0 == 1.0 => Simple(OpCode::Dconst1),
        LiteralValue::Double(_) => Ldc2,
        LiteralValue::String(_) => Ldc,
        LiteralValue::Null => Simple(OpCode::AconstNull),
    }
}

/// `(general form, first short form)` of the load family for `desc`.
pub fn load_ops(desc: &Descriptor) -> (OpCode, OpCode) {
    match desc.primitive() {
        Some(PrimitiveKind::Long) => (OpCode::Lload, OpCode::Lload0),
        Some(PrimitiveKind::Float) => (OpCode::Fload, OpCode::Fload0),
        Some(PrimitiveKind::Double) => (OpCode::Dload, OpCode::Dload0),
        Some(_) => (OpCode::Iload, OpCode::Iload0),
        None => (OpCode::Aload, OpCode::Aload0),
    }
}

/// `(general form, first short form)` of the store family for `desc`.
pub fn store_ops(desc: &Descriptor) -> (OpCode, OpCode) {
    match desc.primitive() {
        Some(PrimitiveKind::Long) => (OpCode::Lstore, OpCode::Lstore0),
        Some(PrimitiveKind::Float) => (OpCode::Fstore, OpCode::Fstore0),
        Some(PrimitiveKind::Double) => (OpCode::Dstore, OpCode::Dstore0),
        Some(_) => (OpCode::Istore, OpCode::Istore0),
        None => (OpCode::Astore, OpCode::Astore0),
    }
}

/// Return instruction for a method returning `desc`.
pub fn return_op(desc: &Descriptor) -> OpCode {
    match desc.primitive() {
        Some(PrimitiveKind::Void) => OpCode::Return,
        Some(PrimitiveKind::Long) => OpCode::Lreturn,
        Some(PrimitiveKind::Float) => OpCode::Freturn,
        Some(PrimitiveKind::Double) => OpCode::Dreturn,
        Some(_) => OpCode::Ireturn,
        None => OpCode::Areturn,
    }
}

/// Values of these types occupy two words on the target machine.
pub fn is_two_word(desc: &Descriptor) -> bool {
    matches!(
        desc.primitive(),
        Some(PrimitiveKind::Long | PrimitiveKind::Double)
    )
}

/// Conversion instruction widening `from` to `to`, if one is needed.
pub fn widening_op(from: PrimitiveKind, to: PrimitiveKind) -> Option<OpCode> {
    use PrimitiveKind::*;
    match (from, to) {
        (f, Long) if f.is_int_like() => Some(OpCode::I2l),
        (f, Float) if f.is_int_like() => Some(OpCode::I2f),
        (f, Double) if f.is_int_like() => Some(OpCode::I2d),
        (Long, Float) => Some(OpCode::L2f),
        (Long, Double) => Some(OpCode::L2d),
        (Float, Double) => Some(OpCode::F2d),
        _ => None,
    }
}
