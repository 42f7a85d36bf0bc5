//! Constructor compiler.
//!
//! A constructor body is laid out as:
//!
//! ```text
//!   <field defaults>          aload_0, value, putfield    (declaration order)
//!   <statements>              must include exactly one super(...)
//!   return                    implicit unless the body ends in one
//! ```
//!
//! Classes without a constructor get a public no-argument one:
//!
//! ```text
//!   aload_0
//!   invokespecial <parent>.<init>()V
//!   <field defaults>
//!   return
//! ```

use muesli_core::{CONSTRUCTOR_NAME, CompilationError, Descriptor, MethodSymbol, Result};

use crate::artifact::MethodArtifact;
use crate::bytecode::ConstantPool;
use crate::context::CompilationContext;
use crate::emit::InvokeKind;
use crate::expr::ExprCompiler;
use crate::method::MethodCompiler;
use crate::source::SourceLine;

/// Emits constructor bodies for one class.
pub struct ConstructorCompiler<'a, 'ctx> {
    ctx: &'a CompilationContext<'ctx>,
    expr: &'a dyn ExprCompiler,
}

impl<'a, 'ctx> ConstructorCompiler<'a, 'ctx> {
    pub fn new(ctx: &'a CompilationContext<'ctx>, expr: &'a dyn ExprCompiler) -> Self {
        Self { ctx, expr }
    }

    /// Compile a declared constructor.
    ///
    /// Field defaults are emitted before the parameters are bound, so names
    /// in a default always refer to members, never to parameters.
    pub fn compile(
        &self,
        pool: &mut ConstantPool,
        method: MethodSymbol,
        body: &[SourceLine],
    ) -> Result<(MethodSymbol, MethodArtifact)> {
        let span = method.span;
        let mut compiler = MethodCompiler::new(self.ctx, self.expr, pool, method);
        compiler.emit_field_defaults()?;
        compiler.bind_parameters();
        compiler.compile_body(body)?;

        if !compiler.block().has_called_super() {
            return Err(CompilationError::protocol(
                format!(
                    "constructor of '{}' must call super(...) exactly once",
                    self.ctx.class.simple_name
                ),
                span,
            ));
        }
        compiler.finish()
    }

    /// Compile the synthesized no-argument constructor.
    pub fn compile_default(
        &self,
        pool: &mut ConstantPool,
        method: MethodSymbol,
    ) -> Result<(MethodSymbol, MethodArtifact)> {
        let span = method.span;
        let parent = self.ctx.parent().ok_or_else(|| {
            CompilationError::internal(format!("'{}' has no parent", self.ctx.class.name))
        })?;
        let has_default = self
            .ctx
            .registry
            .lookup(parent)
            .and_then(|class| class.default_constructor())
            .is_some();
        if !has_default {
            return Err(CompilationError::resolution(
                format!(
                    "'{}' needs a constructor: parent '{}' has no no-argument constructor",
                    self.ctx.class.name, parent
                ),
                span,
            ));
        }

        let mut compiler = MethodCompiler::new(self.ctx, self.expr, pool, method);
        compiler.bind_parameters();
        let emitter = compiler.emitter_mut();
        emitter.emit_load_this()?;
        emitter.emit_invoke(
            InvokeKind::Special,
            parent,
            CONSTRUCTOR_NAME,
            "()V",
            0,
            &Descriptor::VOID,
        )?;
        compiler.block_mut().mark_super_called();
        compiler.emit_field_defaults()?;
        compiler.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use crate::config::CompilerOptions;
    use crate::expr::ReferenceCompiler;
    use muesli_core::{
        AccessFlags, ClassSymbol, ErrorKind, FieldSymbol, LiteralValue, Param, ProposedValue,
        Span,
    };
    use muesli_registry::{DEFAULT_BUILTINS, SymbolRegistry};
    use ordered_float::OrderedFloat;

    fn create_test_registry() -> SymbolRegistry {
        let mut registry = SymbolRegistry::with_builtins(DEFAULT_BUILTINS).unwrap();
        let point = ClassSymbol::new(
            "Point",
            Some("java/lang/Object".to_string()),
            AccessFlags::SUPER,
        );
        registry.register(point).unwrap();

        let mut circle = ClassSymbol::new(
            "Circle",
            Some("java/lang/Object".to_string()),
            AccessFlags::SUPER,
        );
        circle
            .add_field(
                FieldSymbol::new("radius", Descriptor::DOUBLE, AccessFlags::empty())
                    .with_proposed(ProposedValue::Literal(LiteralValue::Double(OrderedFloat(
                        1.0,
                    )))),
            )
            .unwrap();
        registry.register(circle).unwrap();

        let orphan = ClassSymbol::new("Orphan", Some("Point".to_string()), AccessFlags::SUPER);
        registry.register(orphan).unwrap();
        registry
    }

    fn compile_in(
        class: &str,
        method: MethodSymbol,
        body: Option<&[&str]>,
    ) -> Result<(MethodSymbol, MethodArtifact)> {
        let registry = create_test_registry();
        let options = CompilerOptions::default();
        let class = registry.lookup(class).unwrap();
        let ctx = CompilationContext::new(&registry, class, &options);
        let compiler = ConstructorCompiler::new(&ctx, &ReferenceCompiler);
        let mut pool = ConstantPool::new();
        match body {
            Some(body) => {
                let lines: Vec<SourceLine> = body
                    .iter()
                    .enumerate()
                    .map(|(i, text)| SourceLine::new(*text, i as u32 + 2))
                    .collect();
                compiler.compile(&mut pool, method, &lines)
            }
            None => compiler.compile_default(&mut pool, method),
        }
    }

    fn create_point_constructor() -> MethodSymbol {
        let mut method = MethodSymbol::constructor(AccessFlags::PUBLIC).with_span(Span::new(1));
        method
            .set_parameters(vec![
                Param::new("x", Descriptor::INT),
                Param::new("y", Descriptor::INT),
            ])
            .unwrap();
        method
    }

    #[test]
    fn point_constructor_slots() {
        let (method, artifact) =
            compile_in("Point", create_point_constructor(), Some(&["super()"])).unwrap();
        assert_eq!(artifact.name, "<init>");
        assert_eq!(artifact.descriptor, "(II)V");
        assert_eq!(method.find_local("x", None).unwrap().slot, 1);
        assert_eq!(method.find_local("y", None).unwrap().slot, 2);
        assert_eq!(artifact.local("this").unwrap().slot, 0);
        assert_eq!(artifact.max_locals, 3);
        assert_eq!(artifact.max_stack, 1);
        artifact.code.as_ref().unwrap().assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Invokespecial,
            OpCode::Return,
        ]);
    }

    #[test]
    fn missing_super_fails() {
        let err = compile_in("Point", create_point_constructor(), Some(&["var z = x"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(err.span(), Some(Span::new(1)));
    }

    #[test]
    fn double_super_fails() {
        let err = compile_in(
            "Point",
            create_point_constructor(),
            Some(&["super()", "super()"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn defaults_precede_body() {
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let (_, artifact) = compile_in("Circle", method, Some(&["super()", "return"])).unwrap();
        artifact.code.as_ref().unwrap().assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Dconst1,
            OpCode::Putfield,
            OpCode::Aload0,
            OpCode::Invokespecial,
            OpCode::Return,
        ]);
    }

    #[test]
    fn default_constructor_initializes_fields() {
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let (_, artifact) = compile_in("Circle", method, None).unwrap();
        artifact.code.as_ref().unwrap().assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Invokespecial,
            OpCode::Aload0,
            OpCode::Dconst1,
            OpCode::Putfield,
            OpCode::Return,
        ]);
        assert_eq!(artifact.max_stack, 2);
        assert_eq!(artifact.max_locals, 1);
        assert!(artifact.modifiers.contains(AccessFlags::PUBLIC));
    }

    #[test]
    fn default_constructor_needs_parent_default() {
        let method = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let err = compile_in("Orphan", method, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
