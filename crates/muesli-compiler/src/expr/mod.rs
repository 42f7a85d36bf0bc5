//! Expression collaborator.
//!
//! Statement and constructor compilers never evaluate expressions
//! themselves; they hand the text to an [`ExprCompiler`] and get back the
//! type, name and owner of what was compiled:
//!
//! ```text
//!   "p.x"  ──compile(Load)────────▶ aload_1 getfield  ─▶ (I, "x", Some("geo/Point"))
//!   "p.x"  ──compile(ResolveOnly)─▶ aload_1           ─▶ (I, "x", Some("geo/Point"))
//!   "n"    ──compile(ResolveOnly)─▶ (nothing)         ─▶ (I, "n", None)
//! ```
//!
//! [`compile_value`] layers the literal fast path and the assignability
//! gate on top; it is how every store, return and field default gets its
//! value onto the stack.

mod calls;
mod reference;

pub use reference::ReferenceCompiler;

use muesli_core::{Block, CompilationError, Descriptor, Result, Span};

use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::types;

/// Whether the final segment of an expression is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Load,
    /// Resolve the name only. Receivers of a qualified name are still
    /// loaded so a following field store finds them on the stack.
    ResolveOnly,
}

/// What an expression compiled to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprResult {
    pub descriptor: Descriptor,
    /// Name of the final segment (`x` for `p.x`).
    pub name: String,
    /// Class declaring the final segment, when it is a member.
    pub owner: Option<String>,
    /// The expression had more than one segment.
    pub qualified: bool,
}

impl ExprResult {
    pub fn value(descriptor: Descriptor, name: impl Into<String>) -> Self {
        Self {
            descriptor,
            name: name.into(),
            owner: None,
            qualified: false,
        }
    }

    pub fn is_void(&self) -> bool {
        self.descriptor.is_void()
    }
}

/// Compiles expression text into instructions.
pub trait ExprCompiler {
    /// Compile `text`, leaving its value on the stack in [`LoadMode::Load`].
    ///
    /// `block` is the innermost enclosing block; it bounds local lookups
    /// and records superclass constructor calls.
    fn compile(
        &self,
        ctx: &CompilationContext<'_>,
        emitter: &mut BytecodeEmitter<'_>,
        block: &mut Block,
        text: &str,
        mode: LoadMode,
        span: Span,
    ) -> Result<ExprResult>;
}

pub(crate) fn mismatch(target: &Descriptor, found: &str, span: Span) -> CompilationError {
    CompilationError::type_mismatch(
        format!(
            "expected '{}', found '{}'",
            target.display_name(),
            found
        ),
        span,
    )
}

/// Push `text` as a value of type `target`.
///
/// Literals are typed against `target` and widened at compile time; other
/// expressions go through `expr`, are checked with
/// [`is_assignable`](types::is_assignable) and widened with a conversion
/// instruction when needed.
pub fn compile_value(
    expr: &dyn ExprCompiler,
    ctx: &CompilationContext<'_>,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
    text: &str,
    target: &Descriptor,
    span: Span,
) -> Result<()> {
    if let Some(ty) = types::infer_type(text, Some(target)) {
        if !types::is_literal_assignable(ctx.registry, target, ty) {
            return Err(mismatch(target, ty.name(), span));
        }
        let mut value = types::parse_literal(ty, text, span)?;
        if let Some(kind) = target.primitive() {
            value = types::widen_literal(value, kind);
        }
        return emitter.emit_literal(&value);
    }

    let result = expr.compile(ctx, emitter, block, text, LoadMode::Load, span)?;
    if result.is_void() {
        return Err(CompilationError::type_mismatch(
            format!("'{}' does not produce a value", text),
            span,
        ));
    }
    if !ctx.is_assignable(target, &result.descriptor) {
        return Err(mismatch(target, &result.descriptor.display_name(), span));
    }
    if let (Some(from), Some(to)) = (result.descriptor.primitive(), target.primitive()) {
        emitter.emit_widen(from, to);
    }
    Ok(())
}
