//! Reference expression compiler.
//!
//! Handles the expression shapes bodies are written with:
//!
//! - literals
//! - `this`
//! - locals and parameters
//! - fields, unqualified, through a value (`p.x`) or through a class
//!   (`Counter.total`)
//! - method calls on `this`, values and classes
//! - `super(args)` inside constructors
//!
//! An expression is split at top-level dots into segments. The first
//! segment is resolved against the method's locals, then the class's fields
//! and methods, then class names; every later segment is a member of what
//! the previous one produced.

use muesli_core::{Block, CompilationError, Descriptor, Result, Span};

use super::calls::{self, Segment};
use super::{ExprCompiler, ExprResult, LoadMode};
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::names;
use crate::types;

/// What the segments walked so far evaluated to.
enum Receiver {
    /// A value of this type is on the stack (or would be, for the final
    /// segment in resolve-only mode).
    Value(Descriptor),
    /// A class name; only static members may follow.
    Class(String),
}

/// The default [`ExprCompiler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCompiler;

impl ReferenceCompiler {
    pub fn new() -> Self {
        Self
    }

    fn compile_literal(
        &self,
        emitter: &mut BytecodeEmitter<'_>,
        text: &str,
        mode: LoadMode,
        span: Span,
    ) -> Result<Option<ExprResult>> {
        let Some(ty) = types::infer_type(text, None) else {
            return Ok(None);
        };
        if mode == LoadMode::ResolveOnly {
            return Err(CompilationError::grammar(
                format!("cannot assign to literal '{}'", text),
                span,
            ));
        }
        let value = types::parse_literal(ty, text, span)?;
        emitter.emit_literal(&value)?;
        let descriptor = ty.descriptor().unwrap_or_else(Descriptor::root_object);
        Ok(Some(ExprResult::value(descriptor, text)))
    }

    /// Resolve the first segment(s). Returns the receiver and how many
    /// segments were consumed (a dotted class name spans several).
    #[allow(clippy::too_many_arguments)]
    fn compile_head(
        &self,
        ctx: &CompilationContext<'_>,
        emitter: &mut BytecodeEmitter<'_>,
        block: &mut Block,
        segments: &[Segment<'_>],
        load: bool,
        result: &mut ExprResult,
        span: Span,
    ) -> Result<(Receiver, usize)> {
        let name = match segments[0] {
            Segment::Call(name, ref args) => {
                let (descriptor, owner) =
                    calls::compile_own_call(self, ctx, emitter, block, name, args, span)?;
                result.name = name.to_string();
                result.owner = Some(owner);
                return Ok((Receiver::Value(descriptor), 1));
            }
            Segment::Name(name) => name,
        };
        result.name = name.to_string();

        if name == "this" {
            if emitter.method().is_static() {
                return Err(CompilationError::resolution(
                    "'this' cannot be used in a static method",
                    span,
                ));
            }
            if load {
                emitter.emit_load_this()?;
            }
            return Ok((Receiver::Value(ctx.this_descriptor()), 1));
        }

        let local = emitter
            .method()
            .find_local(name, Some(&block.scope))
            .map(|local| (local.descriptor.clone(), local.slot));
        if let Some((descriptor, slot)) = local {
            if load {
                emitter.emit_load(&descriptor, slot);
            }
            return Ok((Receiver::Value(descriptor), 1));
        }

        if let Some((owner, field)) = ctx.registry.find_field(&ctx.class.name, name) {
            if field.is_static() {
                if load {
                    emitter.emit_get_field(&owner.name, name, &field.descriptor, true)?;
                }
            } else {
                if emitter.method().is_static() {
                    return Err(CompilationError::resolution(
                        format!("instance field '{}' cannot be used in a static method", name),
                        span,
                    ));
                }
                emitter.emit_load_this()?;
                if load {
                    emitter.emit_get_field(&owner.name, name, &field.descriptor, false)?;
                }
            }
            result.owner = Some(owner.name.clone());
            return Ok((Receiver::Value(field.descriptor.clone()), 1));
        }

        // Longest run of plain names that resolves to a class.
        let names: Vec<&str> = segments
            .iter()
            .map_while(|segment| match segment {
                Segment::Name(name) => Some(*name),
                Segment::Call(..) => None,
            })
            .collect();
        for taken in (1..=names.len()).rev() {
            let path = names[..taken].join("/");
            if let Some(class) = ctx.registry.resolve(&path, ctx.class) {
                result.name = names[taken - 1].to_string();
                return Ok((Receiver::Class(class), taken));
            }
        }

        Err(CompilationError::resolution(
            format!("unknown symbol '{}'", name),
            span,
        ))
    }

    /// Compile one member access on `receiver`.
    #[allow(clippy::too_many_arguments)]
    fn compile_member(
        &self,
        ctx: &CompilationContext<'_>,
        emitter: &mut BytecodeEmitter<'_>,
        block: &mut Block,
        receiver: Receiver,
        segment: &Segment<'_>,
        load: bool,
        result: &mut ExprResult,
        span: Span,
    ) -> Result<Receiver> {
        let (owner, through_class) = match receiver {
            Receiver::Class(class) => (class, true),
            Receiver::Value(descriptor) => match descriptor.class_path() {
                Some(path) => (path.to_string(), false),
                None => {
                    return Err(CompilationError::type_mismatch(
                        format!(
                            "cannot access '{}' on a value of type '{}'",
                            segment.name(),
                            descriptor.display_name()
                        ),
                        span,
                    ));
                }
            },
        };
        result.name = segment.name().to_string();

        match segment {
            Segment::Name(name) => {
                let (declaring, field) =
                    ctx.registry.find_field(&owner, name).ok_or_else(|| {
                        CompilationError::resolution(
                            format!("unknown field '{}' on '{}'", name, owner),
                            span,
                        )
                    })?;
                check_static_access(field.is_static(), through_class, name, span)?;
                if load {
                    emitter.emit_get_field(
                        &declaring.name,
                        name,
                        &field.descriptor,
                        field.is_static(),
                    )?;
                }
                result.owner = Some(declaring.name.clone());
                Ok(Receiver::Value(field.descriptor.clone()))
            }
            Segment::Call(name, args) => {
                let (declaring, method) =
                    ctx.registry.find_method(&owner, name).ok_or_else(|| {
                        CompilationError::resolution(
                            format!("unknown method '{}' on '{}'", name, owner),
                            span,
                        )
                    })?;
                check_static_access(method.is_static(), through_class, name, span)?;
                calls::compile_invoke(self, ctx, emitter, block, declaring, method, args, span)?;
                result.owner = Some(declaring.name.clone());
                Ok(Receiver::Value(method.return_type.clone()))
            }
        }
    }
}

fn check_static_access(is_static: bool, through_class: bool, name: &str, span: Span) -> Result<()> {
    match (is_static, through_class) {
        (true, false) => Err(CompilationError::resolution(
            format!("static member '{}' must be accessed through its class", name),
            span,
        )),
        (false, true) => Err(CompilationError::resolution(
            format!("instance member '{}' requires an object", name),
            span,
        )),
        _ => Ok(()),
    }
}

impl ExprCompiler for ReferenceCompiler {
    fn compile(
        &self,
        ctx: &CompilationContext<'_>,
        emitter: &mut BytecodeEmitter<'_>,
        block: &mut Block,
        text: &str,
        mode: LoadMode,
        span: Span,
    ) -> Result<ExprResult> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CompilationError::grammar("expected expression", span));
        }
        if let Some(args) = calls::super_call_args(text) {
            if mode == LoadMode::ResolveOnly {
                return Err(CompilationError::grammar(
                    "cannot assign to a constructor call",
                    span,
                ));
            }
            calls::compile_super(self, ctx, emitter, block, &args, span)?;
            return Ok(ExprResult::value(Descriptor::VOID, "super"));
        }
        if let Some(result) = self.compile_literal(emitter, text, mode, span)? {
            return Ok(result);
        }

        let segments = names::split_top_level(text, '.')
            .into_iter()
            .map(|segment| Segment::parse(segment, span))
            .collect::<Result<Vec<_>>>()?;
        if mode == LoadMode::ResolveOnly
            && let Some(Segment::Call(name, _)) = segments.last()
        {
            return Err(CompilationError::grammar(
                format!("cannot assign to the result of '{}'", name),
                span,
            ));
        }

        let last = segments.len() - 1;
        let load_at = |index: usize| index != last || mode == LoadMode::Load;
        let mut result = ExprResult::value(Descriptor::VOID, "");

        let (mut receiver, consumed) =
            self.compile_head(ctx, emitter, block, &segments, load_at(0), &mut result, span)?;
        for (index, segment) in segments.iter().enumerate().skip(consumed) {
            if let Receiver::Value(descriptor) = &receiver
                && descriptor.is_void()
            {
                return Err(CompilationError::type_mismatch(
                    format!("cannot access '{}' on a void result", segment.name()),
                    span,
                ));
            }
            receiver = self.compile_member(
                ctx,
                emitter,
                block,
                receiver,
                segment,
                load_at(index),
                &mut result,
                span,
            )?;
        }

        result.qualified = segments.len() > 1;
        result.descriptor = match receiver {
            Receiver::Value(descriptor) => descriptor,
            Receiver::Class(class) => {
                return Err(CompilationError::resolution(
                    format!("'{}' is a class, not a value", class),
                    span,
                ));
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ConstantPool, OpCode};
    use crate::config::CompilerOptions;
    use muesli_core::{
        AccessFlags, BlockId, ClassSymbol, FieldSymbol, Label, MethodSymbol, Param, Scope,
    };
    use muesli_registry::{DEFAULT_BUILTINS, SymbolRegistry};

    fn create_test_registry() -> SymbolRegistry {
        let mut registry = SymbolRegistry::with_builtins(DEFAULT_BUILTINS).unwrap();
        let mut point = ClassSymbol::new(
            "geo/Point",
            Some("java/lang/Object".to_string()),
            AccessFlags::PUBLIC | AccessFlags::SUPER,
        );
        point
            .add_field(FieldSymbol::new("x", Descriptor::INT, AccessFlags::PUBLIC))
            .unwrap();
        point
            .add_field(FieldSymbol::new(
                "count",
                Descriptor::INT,
                AccessFlags::PUBLIC | AccessFlags::STATIC,
            ))
            .unwrap();
        let mut norm = MethodSymbol::new("norm", Descriptor::DOUBLE, AccessFlags::PUBLIC);
        norm.set_parameters(vec![Param::new("scale", Descriptor::DOUBLE)])
            .unwrap();
        point.add_method(norm).unwrap();
        point
            .add_method(MethodSymbol::constructor(AccessFlags::PUBLIC))
            .unwrap();
        registry.register(point).unwrap();
        registry
    }

    fn create_test_block(method: &mut MethodSymbol) -> Block {
        let scope = Scope::new(method.next_block(), Label(0), Label(1));
        method.bind_parameters(scope);
        Block::new(scope)
    }

    fn with_method<F>(method: MethodSymbol, check: F)
    where
        F: FnOnce(&CompilationContext<'_>, &mut BytecodeEmitter<'_>, &mut Block),
    {
        let registry = create_test_registry();
        let options = CompilerOptions::default();
        let class = registry.lookup("geo/Point").unwrap();
        let ctx = CompilationContext::new(&registry, class, &options);
        let mut method = method;
        let mut block = create_test_block(&mut method);
        let mut pool = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut pool, method, true);
        check(&ctx, &mut emitter, &mut block);
    }

    fn create_test_method() -> MethodSymbol {
        let mut method = MethodSymbol::new("run", Descriptor::VOID, AccessFlags::PUBLIC);
        method
            .set_parameters(vec![Param::new("other", Descriptor::object("geo/Point"))])
            .unwrap();
        method
    }

    #[test]
    fn unqualified_field_loads_this() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "x", LoadMode::Load, Span::new(1))
                .unwrap();
            assert_eq!(result.descriptor, Descriptor::INT);
            assert_eq!(result.owner.as_deref(), Some("geo/Point"));
            emitter
                .code()
                .assert_opcodes(&[OpCode::Aload0, OpCode::Getfield]);
        });
    }

    #[test]
    fn resolve_only_loads_receiver() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "other.x", LoadMode::ResolveOnly, Span::new(1))
                .unwrap();
            assert!(result.qualified);
            assert_eq!(result.name, "x");
            emitter.code().assert_opcodes(&[OpCode::Aload1]);
        });
    }

    #[test]
    fn resolve_only_local_emits_nothing() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "other", LoadMode::ResolveOnly, Span::new(1))
                .unwrap();
            assert_eq!(result.owner, None);
            assert!(emitter.code().is_empty());
        });
    }

    #[test]
    fn static_field_through_class() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "Point.count", LoadMode::Load, Span::new(1))
                .unwrap();
            assert_eq!(result.descriptor, Descriptor::INT);
            emitter.code().assert_opcodes(&[OpCode::Getstatic]);
        });
    }

    #[test]
    fn static_field_through_value_rejected() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let err = ReferenceCompiler
                .compile(ctx, emitter, block, "other.count", LoadMode::Load, Span::new(1))
                .unwrap_err();
            assert!(err.to_string().contains("through its class"));
        });
    }

    #[test]
    fn method_call_widens_literal_argument() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "other.norm(2)", LoadMode::Load, Span::new(1))
                .unwrap();
            assert_eq!(result.descriptor, Descriptor::DOUBLE);
            emitter
                .code()
                .assert_opcodes(&[OpCode::Aload1, OpCode::Ldc2W, OpCode::Invokevirtual]);
            assert_eq!(emitter.method().current_stack(), 1);
        });
    }

    #[test]
    fn wrong_argument_count() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let err = ReferenceCompiler
                .compile(ctx, emitter, block, "norm()", LoadMode::Load, Span::new(1))
                .unwrap_err();
            assert!(err.to_string().contains("expects 1 argument"));
        });
    }

    #[test]
    fn unknown_symbol() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let err = ReferenceCompiler
                .compile(ctx, emitter, block, "missing", LoadMode::Load, Span::new(4))
                .unwrap_err();
            assert_eq!(err.kind(), muesli_core::ErrorKind::Resolution);
            assert_eq!(err.span(), Some(Span::new(4)));
        });
    }

    #[test]
    fn this_in_static_method() {
        let method = MethodSymbol::new("main", Descriptor::VOID, AccessFlags::STATIC);
        with_method(method, |ctx, emitter, block| {
            assert!(
                ReferenceCompiler
                    .compile(ctx, emitter, block, "this", LoadMode::Load, Span::new(1))
                    .is_err()
            );
            assert!(
                ReferenceCompiler
                    .compile(ctx, emitter, block, "x", LoadMode::Load, Span::new(1))
                    .is_err()
            );
        });
    }

    #[test]
    fn super_outside_constructor() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let err = ReferenceCompiler
                .compile(ctx, emitter, block, "super()", LoadMode::Load, Span::new(1))
                .unwrap_err();
            assert_eq!(err.kind(), muesli_core::ErrorKind::Protocol);
        });
    }

    #[test]
    fn super_once_per_constructor() {
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        with_method(method, |ctx, emitter, _| {
            let mut block = Block::constructor(Scope::new(BlockId(0), Label(0), Label(1)));
            let result = ReferenceCompiler
                .compile(ctx, emitter, &mut block, "super()", LoadMode::Load, Span::new(1))
                .unwrap();
            assert!(result.is_void());
            assert!(block.has_called_super());
            emitter
                .code()
                .assert_opcodes(&[OpCode::Aload0, OpCode::Invokespecial]);
            let err = ReferenceCompiler
                .compile(ctx, emitter, &mut block, "super()", LoadMode::Load, Span::new(2))
                .unwrap_err();
            assert_eq!(err.kind(), muesli_core::ErrorKind::Protocol);
        });
    }

    #[test]
    fn string_literal_is_reference() {
        with_method(create_test_method(), |ctx, emitter, block| {
            let result = ReferenceCompiler
                .compile(ctx, emitter, block, "\"a.b\"", LoadMode::Load, Span::new(1))
                .unwrap();
            assert!(result.descriptor.is_string());
            emitter.code().assert_opcodes(&[OpCode::Ldc]);
        });
    }
}
