//! Assignment statements.

use muesli_core::{CompilationError, Result, Span};

use super::StmtCompiler;
use crate::expr::LoadMode;
use crate::names;

/// `this`, identifiers, and dotted chains of both.
fn is_assignment_target(text: &str) -> bool {
    text.split('.')
        .all(|part| part == "this" || names::is_identifier(part))
}

impl<'a, 'ctx, 'pool> StmtCompiler<'a, 'ctx, 'pool> {
    /// Compile `target = value`.
    ///
    /// The target is compiled in resolve-only mode: a local needs nothing on
    /// the stack, a field has its receiver loaded. Locals shadow fields. A
    /// target that binds to neither is compiled as a plain expression
    /// statement instead.
    pub(super) fn compile_assignment(&mut self, text: &str, span: Span) -> Result<()> {
        let Some(eq) = names::find_assignment(text) else {
            return self.compile_expr_stmt(text, span);
        };
        let target = text[..eq].trim();
        let value = text[eq + 1..].trim();
        if value.is_empty() {
            return Err(CompilationError::grammar("expected a value after '='", span));
        }
        if !is_assignment_target(target) {
            return self.compile_expr_stmt(text, span);
        }

        let resolved = self.expr.compile(
            self.ctx,
            self.emitter,
            self.block,
            target,
            LoadMode::ResolveOnly,
            span,
        )?;

        if !resolved.qualified {
            let scope = self.block.scope;
            let local = self
                .emitter
                .method()
                .find_local(&resolved.name, Some(&scope))
                .cloned();
            if let Some(local) = local {
                if local.is_read_only() {
                    return Err(CompilationError::type_mismatch(
                        format!("cannot assign to constant '{}'", local.name),
                        span,
                    ));
                }
                self.compile_value(value, &local.descriptor, span)?;
                return self.emitter.emit_store(&local.descriptor, local.slot);
            }
        }

        let field = resolved
            .owner
            .as_deref()
            .and_then(|owner| self.ctx.registry.find_field(owner, &resolved.name));
        let Some((declaring, field)) = field else {
            return self.compile_expr_stmt(text, span);
        };

        if field.modifiers.is_final() {
            let in_own_constructor = self.emitter.method().is_constructor()
                && !field.is_static()
                && declaring.name == self.ctx.class.name;
            if !in_own_constructor {
                return Err(CompilationError::type_mismatch(
                    format!("cannot assign to constant field '{}'", field.name),
                    span,
                ));
            }
        }

        self.compile_value(value, &field.descriptor, span)?;
        self.emitter
            .emit_put_field(&declaring.name, &field.name, &field.descriptor, field.is_static())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{compile_lines, create_test_method};
    use crate::bytecode::OpCode;
    use muesli_core::{AccessFlags, Descriptor, ErrorKind, MethodSymbol};

    #[test]
    fn assign_local() {
        let (_, code, _) = compile_lines(
            create_test_method(Descriptor::VOID),
            &["var x = 1", "x = 7"],
        )
        .unwrap();
        code.assert_opcodes(&[
            OpCode::Iconst1,
            OpCode::Istore2,
            OpCode::Bipush,
            OpCode::Istore2,
        ]);
    }

    #[test]
    fn assign_instance_field() {
        let (method, code, _) =
            compile_lines(create_test_method(Descriptor::VOID), &["area = n"]).unwrap();
        code.assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Iload1,
            OpCode::I2d,
            OpCode::Putfield,
        ]);
        assert_eq!(method.stack_size(), 2);
        assert_eq!(method.current_stack(), 0);
    }

    #[test]
    fn assign_qualified_field() {
        let (_, code, _) =
            compile_lines(create_test_method(Descriptor::VOID), &["this.area = 2.5"]).unwrap();
        code.assert_opcodes(&[OpCode::Aload0, OpCode::Ldc2W, OpCode::Putfield]);
    }

    #[test]
    fn assign_static_field() {
        let (_, code, _) =
            compile_lines(create_test_method(Descriptor::VOID), &["created = 0"]).unwrap();
        code.assert_opcodes(&[OpCode::Lconst0, OpCode::Putstatic]);
    }

    #[test]
    fn local_shadows_field() {
        let (_, code, _) = compile_lines(
            create_test_method(Descriptor::VOID),
            &["var area = 1", "area = 2"],
        )
        .unwrap();
        code.assert_opcodes(&[
            OpCode::Iconst1,
            OpCode::Istore2,
            OpCode::Iconst2,
            OpCode::Istore2,
        ]);
    }

    #[test]
    fn const_local_rejected() {
        let err = compile_lines(
            create_test_method(Descriptor::VOID),
            &["const k = 1", "k = 2"],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn final_field_only_in_constructor() {
        let err = compile_lines(create_test_method(Descriptor::VOID), &["id = 3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let constructor = MethodSymbol::constructor(AccessFlags::PUBLIC);
        let (_, code, _) = compile_lines(constructor, &["super()", "id = 3"]).unwrap();
        code.assert_opcodes(&[
            OpCode::Aload0,
            OpCode::Invokespecial,
            OpCode::Aload0,
            OpCode::Iconst3,
            OpCode::Putfield,
        ]);
    }

    #[test]
    fn mismatched_value_rejected() {
        let err = compile_lines(create_test_method(Descriptor::VOID), &["area = true"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn unbound_target_compiles_as_expression() {
        let err = compile_lines(create_test_method(Descriptor::VOID), &["this = null"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Grammar);
        assert!(err.to_string().contains("unsupported expression"));
    }

    #[test]
    fn invalid_targets() {
        for line in ["describe() = 1", "1 = n", "n + 1 = 2", "this = null"] {
            assert!(
                compile_lines(create_test_method(Descriptor::VOID), &[line]).is_err(),
                "{} should fail",
                line
            );
        }
    }
}
