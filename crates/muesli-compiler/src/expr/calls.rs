//! Method and superclass constructor calls.

use muesli_core::{
    Block, CONSTRUCTOR_NAME, ClassSymbol, CompilationError, Descriptor, MethodSymbol, Result, Span,
};

use super::{ExprCompiler, compile_value};
use crate::context::CompilationContext;
use crate::emit::{BytecodeEmitter, InvokeKind};
use crate::names;

/// One dot-separated piece of a reference expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Segment<'t> {
    Name(&'t str),
    Call(&'t str, Vec<&'t str>),
}

impl<'t> Segment<'t> {
    pub(super) fn parse(text: &'t str, span: Span) -> Result<Self> {
        let unsupported = || {
            CompilationError::grammar(format!("unsupported expression '{}'", text), span)
        };
        let Some(open) = text.find('(') else {
            if text == "this" || names::is_identifier(text) {
                return Ok(Segment::Name(text));
            }
            return Err(unsupported());
        };
        let inner = text[open + 1..].strip_suffix(')').ok_or_else(unsupported)?;
        let name = text[..open].trim();
        if !names::is_identifier(name) {
            return Err(unsupported());
        }
        Ok(Segment::Call(name, split_args(inner)))
    }

    pub(super) fn name(&self) -> &'t str {
        match self {
            Segment::Name(name) | Segment::Call(name, _) => *name,
        }
    }
}

fn split_args(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        Vec::new()
    } else {
        names::split_top_level(inner, ',')
    }
}

/// Arguments of a `super(...)` call, if `text` is one.
pub(super) fn super_call_args(text: &str) -> Option<Vec<&str>> {
    let rest = text.strip_prefix("super")?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(split_args(inner))
}

/// Push every argument, typed against the matching parameter.
fn compile_args(
    expr: &dyn ExprCompiler,
    ctx: &CompilationContext<'_>,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
    method: &MethodSymbol,
    args: &[&str],
    span: Span,
) -> Result<()> {
    let params = method.params();
    if params.len() != args.len() {
        let name = if method.is_constructor() {
            "constructor"
        } else {
            method.name.as_str()
        };
        return Err(CompilationError::type_mismatch(
            format!(
                "'{}' expects {} argument{}, found {}",
                name,
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len()
            ),
            span,
        ));
    }
    for (arg, param) in args.iter().zip(params) {
        compile_value(expr, ctx, emitter, block, arg, &param.descriptor, span)?;
    }
    Ok(())
}

/// Invoke `method` of `declaring` on the receiver already on the stack
/// (nothing for static methods).
#[allow(clippy::too_many_arguments)]
pub(super) fn compile_invoke(
    expr: &dyn ExprCompiler,
    ctx: &CompilationContext<'_>,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
    declaring: &ClassSymbol,
    method: &MethodSymbol,
    args: &[&str],
    span: Span,
) -> Result<()> {
    compile_args(expr, ctx, emitter, block, method, args, span)?;
    let kind = if method.is_static() {
        InvokeKind::Static
    } else if declaring.is_interface() {
        InvokeKind::Interface
    } else {
        InvokeKind::Virtual
    };
    emitter.emit_invoke(
        kind,
        &declaring.name,
        &method.name,
        &method.descriptor(),
        args.len() as u16,
        &method.return_type,
    )
}

/// Call `name(args)` on the current class, loading `this` for instance
/// methods. Returns the result type and declaring class.
pub(super) fn compile_own_call(
    expr: &dyn ExprCompiler,
    ctx: &CompilationContext<'_>,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
    name: &str,
    args: &[&str],
    span: Span,
) -> Result<(Descriptor, String)> {
    let (declaring, method) = ctx
        .registry
        .find_method(&ctx.class.name, name)
        .ok_or_else(|| CompilationError::resolution(format!("unknown method '{}'", name), span))?;
    if !method.is_static() {
        if emitter.method().is_static() {
            return Err(CompilationError::resolution(
                format!("instance method '{}' cannot be called from a static method", name),
                span,
            ));
        }
        emitter.emit_load_this()?;
    }
    compile_invoke(expr, ctx, emitter, block, declaring, method, args, span)?;
    Ok((method.return_type.clone(), declaring.name.clone()))
}

/// `super(args)`: run the parent constructor taking `args.len()` arguments.
///
/// Only valid in a constructor block, and only once per block.
pub(super) fn compile_super(
    expr: &dyn ExprCompiler,
    ctx: &CompilationContext<'_>,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
    args: &[&str],
    span: Span,
) -> Result<()> {
    if !block.is_constructor() {
        return Err(CompilationError::protocol(
            "super constructor call outside a constructor",
            span,
        ));
    }
    if block.has_called_super() {
        return Err(CompilationError::protocol(
            "super constructor already called",
            span,
        ));
    }
    let parent_name = ctx.parent().ok_or_else(|| {
        CompilationError::protocol(format!("'{}' has no parent class", ctx.class.name), span)
    })?;
    let parent = ctx
        .registry
        .lookup(parent_name)
        .ok_or_else(|| CompilationError::unknown_type(parent_name, span))?;
    let (_, constructor) = parent
        .constructors()
        .find(|(_, c)| c.params().len() == args.len())
        .ok_or_else(|| {
            CompilationError::resolution(
                format!(
                    "'{}' has no constructor taking {} arguments",
                    parent.name,
                    args.len()
                ),
                span,
            )
        })?;

    emitter.emit_load_this()?;
    compile_args(expr, ctx, emitter, block, constructor, args, span)?;
    emitter.emit_invoke(
        InvokeKind::Special,
        &parent.name,
        CONSTRUCTOR_NAME,
        &constructor.descriptor(),
        args.len() as u16,
        &Descriptor::VOID,
    )?;
    block.mark_super_called();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_segments() {
        let span = Span::new(1);
        assert_eq!(Segment::parse("x", span).unwrap(), Segment::Name("x"));
        assert_eq!(
            Segment::parse("f(1, g(2, 3))", span).unwrap(),
            Segment::Call("f", vec!["1", "g(2, 3)"])
        );
        assert_eq!(Segment::parse("f()", span).unwrap(), Segment::Call("f", vec![]));
        assert!(Segment::parse("a + b", span).is_err());
        assert!(Segment::parse("f(", span).is_err());
    }

    #[test]
    fn super_args() {
        assert_eq!(super_call_args("super()"), Some(vec![]));
        assert_eq!(super_call_args("super (x, 2)"), Some(vec!["x", "2"]));
        assert_eq!(super_call_args("superb()"), None);
        assert_eq!(super_call_args("super.f()"), None);
    }
}
