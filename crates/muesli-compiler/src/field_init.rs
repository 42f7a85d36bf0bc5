//! Field initialization.
//!
//! Instance fields declared with a value are initialized by every
//! constructor, in declaration order, before the constructor's own
//! statements:
//!
//! ```text
//! var radius: double = 1.0      aload_0
//!                               dconst_1
//!                               putfield Circle.radius:D
//! ```
//!
//! Static constants with a literal value are not initialized in code; the
//! value is recorded on the field artifact instead.
//!
//! Defaults run before the superclass constructor, so a default may not call
//! an instance method of the class being constructed.

use muesli_core::{Block, CompilationError, FieldSymbol, LiteralValue, ProposedValue, Result};

use crate::artifact::FieldArtifact;
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::{self, ExprCompiler};
use crate::names;

/// Emit the stores for every instance field carrying a default value.
///
/// Literal defaults were typed and widened when the field was declared;
/// source defaults are compiled here and checked against the field type.
pub fn emit_field_defaults(
    ctx: &CompilationContext<'_>,
    expr: &dyn ExprCompiler,
    emitter: &mut BytecodeEmitter<'_>,
    block: &mut Block,
) -> Result<()> {
    for field in ctx.class.fields().iter().filter(|f| f.needs_constructor_init()) {
        let Some(proposed) = &field.proposed else {
            continue;
        };
        emitter.set_line(field.span.line);
        emitter.emit_load_this()?;
        match proposed {
            ProposedValue::Literal(value) => emitter.emit_literal(value)?,
            ProposedValue::Expression(text) => {
                if let Some(method) = own_instance_call(ctx, text) {
                    return Err(CompilationError::protocol(
                        format!(
                            "default of field '{}' calls instance method '{}' before super(...)",
                            field.name, method
                        ),
                        field.span,
                    ));
                }
                expr::compile_value(expr, ctx, emitter, block, text, &field.descriptor, field.span)?
            }
        }
        emitter.emit_put_field(&ctx.class.name, &field.name, &field.descriptor, false)?;
    }
    Ok(())
}

/// Name of an instance method of the current class that `text` calls on
/// `this`, directly or inside an argument.
fn own_instance_call<'t>(ctx: &CompilationContext<'_>, text: &'t str) -> Option<&'t str> {
    let segments = names::split_top_level(text.trim(), '.');
    let on_this = segments.first() == Some(&"this");
    for (index, segment) in segments.iter().enumerate() {
        let Some((name, rest)) = segment.split_once('(') else {
            continue;
        };
        let args = rest.strip_suffix(')').unwrap_or(rest);
        if let Some(found) = names::split_top_level(args, ',')
            .into_iter()
            .find_map(|arg| own_instance_call(ctx, arg))
        {
            return Some(found);
        }
        let name = name.trim();
        let on_self = index == 0 || (on_this && index == 1);
        if on_self
            && ctx
                .registry
                .find_method(&ctx.class.name, name)
                .is_some_and(|(_, method)| !method.is_static())
        {
            return Some(name);
        }
    }
    None
}

/// Compile-time value of a static constant.
pub fn constant_value(field: &FieldSymbol) -> Option<LiteralValue> {
    if !field.is_static() || !field.modifiers.is_final() {
        return None;
    }
    match &field.proposed {
        Some(ProposedValue::Literal(value)) => Some(value.clone()),
        _ => None,
    }
}

/// Artifact entry for a declared field.
pub fn field_artifact(field: &FieldSymbol) -> FieldArtifact {
    FieldArtifact {
        name: field.name.clone(),
        descriptor: field.descriptor.to_string(),
        modifiers: field.modifiers,
        constant_value: constant_value(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ConstantPool, OpCode};
    use crate::config::CompilerOptions;
    use crate::expr::ReferenceCompiler;
    use muesli_core::{
        AccessFlags, BlockId, ClassSymbol, Descriptor, ErrorKind, Label, MethodSymbol, Scope,
        Span,
    };
    use muesli_registry::{DEFAULT_BUILTINS, SymbolRegistry};
    use ordered_float::OrderedFloat;

    fn create_test_class() -> ClassSymbol {
        let mut class = ClassSymbol::new(
            "Circle",
            Some("java/lang/Object".to_string()),
            AccessFlags::SUPER,
        );
        class
            .add_field(
                FieldSymbol::new("radius", Descriptor::DOUBLE, AccessFlags::empty())
                    .with_proposed(ProposedValue::Literal(LiteralValue::Double(OrderedFloat(1.0))))
                    .with_span(Span::new(2)),
            )
            .unwrap();
        class
            .add_field(FieldSymbol::new("label", Descriptor::string(), AccessFlags::empty()))
            .unwrap();
        class
            .add_field(
                FieldSymbol::new("diameter", Descriptor::DOUBLE, AccessFlags::empty())
                    .with_proposed(ProposedValue::Expression("radius".to_string()))
                    .with_span(Span::new(4)),
            )
            .unwrap();
        class
            .add_field(
                FieldSymbol::new(
                    "SIDES",
                    Descriptor::INT,
                    AccessFlags::STATIC | AccessFlags::FINAL,
                )
                .with_proposed(ProposedValue::Literal(LiteralValue::Int(0))),
            )
            .unwrap();
        class
    }

    #[test]
    fn defaults_in_declaration_order() {
        let mut registry = SymbolRegistry::with_builtins(DEFAULT_BUILTINS).unwrap();
        registry.register(create_test_class()).unwrap();
        let options = CompilerOptions::default();
        let class = registry.lookup("Circle").unwrap();
        let ctx = CompilationContext::new(&registry, class, &options);
        let mut pool = ConstantPool::new();
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let mut emitter = BytecodeEmitter::new(&mut pool, method, true);
        let mut block = Block::constructor(Scope::new(BlockId(0), Label(0), Label(0)));

        emit_field_defaults(&ctx, &ReferenceCompiler, &mut emitter, &mut block).unwrap();
        emitter.code().assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Dconst1,
            OpCode::Putfield,
            OpCode::Aload0,
            OpCode::Aload0,
            OpCode::Getfield,
            OpCode::Putfield,
        ]);
        assert_eq!(emitter.method().stack_size(), 2);
        assert_eq!(emitter.method().current_stack(), 0);
    }

    fn compile_defaults(class: ClassSymbol) -> Result<()> {
        let mut registry = SymbolRegistry::with_builtins(DEFAULT_BUILTINS).unwrap();
        let name = class.name.clone();
        registry.register(class).unwrap();
        let options = CompilerOptions::default();
        let class = registry.lookup(&name).unwrap();
        let ctx = CompilationContext::new(&registry, class, &options);
        let mut pool = ConstantPool::new();
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let mut emitter = BytecodeEmitter::new(&mut pool, method, true);
        let mut block = Block::constructor(Scope::new(BlockId(0), Label(0), Label(0)));
        emit_field_defaults(&ctx, &ReferenceCompiler, &mut emitter, &mut block)
    }

    fn create_class_with_default(default: &str) -> ClassSymbol {
        let mut class = ClassSymbol::new(
            "Badge",
            Some("java/lang/Object".to_string()),
            AccessFlags::SUPER,
        );
        class
            .add_method(MethodSymbol::new("describe", Descriptor::string(), AccessFlags::PUBLIC))
            .unwrap();
        class
            .add_method(MethodSymbol::new(
                "fallback",
                Descriptor::string(),
                AccessFlags::PUBLIC | AccessFlags::STATIC,
            ))
            .unwrap();
        class
            .add_field(
                FieldSymbol::new("label", Descriptor::string(), AccessFlags::empty())
                    .with_proposed(ProposedValue::Expression(default.to_string()))
                    .with_span(Span::new(3)),
            )
            .unwrap();
        class
    }

    #[test]
    fn instance_call_in_default_rejected() {
        for default in ["describe()", "this.describe()", "Badge.fallback(describe())"] {
            let err = compile_defaults(create_class_with_default(default)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Protocol, "{}", default);
            assert_eq!(err.span(), Some(Span::new(3)));
            assert!(err.to_string().contains("describe"));
        }
    }

    #[test]
    fn static_call_in_default_allowed() {
        compile_defaults(create_class_with_default("Badge.fallback()")).unwrap();
    }

    #[test]
    fn static_constant_value() {
        let class = create_test_class();
        let sides = class.field("SIDES").unwrap();
        assert_eq!(constant_value(sides), Some(LiteralValue::Int(0)));
        assert_eq!(field_artifact(sides).descriptor, "I");
        assert_eq!(constant_value(class.field("radius").unwrap()), None);
    }
}
