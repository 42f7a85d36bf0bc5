//! Variable declarations.
//!
//! Fields and locals share one declaration grammar:
//!
//! ```text
//! var|const name[: Type][ = value]
//! ```
//!
//! [`DeclarationText`] splits the text; resolution then differs by site.
//! Members keep non-literal values as raw source for the constructors to
//! compile, while locals compile them immediately.

use muesli_core::{
    AccessFlags, CompilationError, Descriptor, LiteralType, LiteralValue, Result, Span,
};
use muesli_registry::SymbolRegistry;

use super::StmtCompiler;
use crate::expr::{self, LoadMode};
use crate::names;
use crate::types::{self, TypeResolver};

/// The parts of a `var`/`const` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationText<'t> {
    pub read_only: bool,
    pub name: &'t str,
    pub type_name: Option<&'t str>,
    pub initializer: Option<&'t str>,
}

impl<'t> DeclarationText<'t> {
    /// Split a declaration that starts with `var` or `const`.
    pub fn parse(text: &'t str, span: Span) -> Result<Self> {
        let (read_only, rest) = match names::strip_keyword(text.trim(), "const") {
            Some(rest) => (true, rest),
            None => (
                false,
                names::strip_keyword(text.trim(), "var").ok_or_else(|| {
                    CompilationError::grammar("expected 'var' or 'const'", span)
                })?,
            ),
        };

        let (head, initializer) = match names::find_assignment(rest) {
            Some(eq) => {
                let value = rest[eq + 1..].trim();
                if value.is_empty() {
                    return Err(CompilationError::grammar(
                        "expected a value after '='",
                        span,
                    ));
                }
                (rest[..eq].trim(), Some(value))
            }
            None => (rest.trim(), None),
        };

        let (name, type_name) = match head.split_once(':') {
            Some((name, ty)) => {
                let ty = ty.trim();
                names::check_type_name(ty, span)?;
                (name.trim(), Some(ty))
            }
            None => (head, None),
        };
        names::check_identifier(name, "variable", span)?;

        Ok(Self {
            read_only,
            name,
            type_name,
            initializer,
        })
    }

    pub fn modifiers(&self) -> AccessFlags {
        if self.read_only {
            AccessFlags::FINAL
        } else {
            AccessFlags::empty()
        }
    }
}

/// Outcome of resolving a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    /// Declared, or inferred, type.
    pub descriptor: Descriptor,
    /// Literal value, already widened to `descriptor`.
    pub value: Option<LiteralValue>,
    /// Type of the literal; `None` when the value is not a literal.
    pub value_type: Option<LiteralType>,
    /// The value was compiled as a sub-expression and is on the stack.
    pub from_expression: bool,
}

/// Type and convert a literal initializer against an optional declared type.
///
/// Returns `None` when `text` is not a literal.
pub fn literal_initializer(
    registry: &SymbolRegistry,
    declared: Option<&Descriptor>,
    text: &str,
    span: Span,
) -> Result<Option<(LiteralType, LiteralValue, Descriptor)>> {
    let Some(ty) = types::infer_type(text, declared) else {
        return Ok(None);
    };
    let descriptor = match declared {
        Some(declared) => {
            if !types::is_literal_assignable(registry, declared, ty) {
                return Err(expr::mismatch(declared, ty.name(), span));
            }
            declared.clone()
        }
        None => ty.descriptor().ok_or_else(|| {
            CompilationError::resolution("cannot infer a type from 'null'", span)
        })?,
    };
    let mut value = types::parse_literal(ty, text, span)?;
    if let Some(kind) = descriptor.primitive() {
        value = types::widen_literal(value, kind);
    }
    Ok(Some((ty, value, descriptor)))
}

/// Resolve a field declaration.
///
/// Fields need an explicit type. A literal value is parsed and checked now;
/// anything else is left for the constructors.
pub fn declare_member(
    resolver: &TypeResolver<'_>,
    registry: &SymbolRegistry,
    decl: &DeclarationText<'_>,
    span: Span,
) -> Result<VariableDeclaration> {
    let type_name = decl.type_name.ok_or_else(|| {
        CompilationError::grammar(
            format!("field '{}' requires an explicit type", decl.name),
            span,
        )
    })?;
    let descriptor = resolver.resolve_value_type(type_name, span)?;
    let literal = match decl.initializer {
        Some(text) => literal_initializer(registry, Some(&descriptor), text, span)?,
        None => None,
    };
    Ok(match literal {
        Some((ty, value, _)) => VariableDeclaration {
            descriptor,
            value: Some(value),
            value_type: Some(ty),
            from_expression: false,
        },
        None => VariableDeclaration {
            descriptor,
            value: None,
            value_type: None,
            from_expression: false,
        },
    })
}

impl<'a, 'ctx, 'pool> StmtCompiler<'a, 'ctx, 'pool> {
    /// Resolve a local declaration, compiling a non-literal initializer.
    fn declare_local(
        &mut self,
        decl: &DeclarationText<'_>,
        span: Span,
    ) -> Result<VariableDeclaration> {
        let declared = match decl.type_name {
            Some(name) => Some(
                self.ctx
                    .method_resolver(self.emitter.method())
                    .resolve_value_type(name, span)?,
            ),
            None => None,
        };

        let Some(text) = decl.initializer else {
            if decl.read_only {
                return Err(CompilationError::grammar(
                    format!("constant '{}' requires a value", decl.name),
                    span,
                ));
            }
            let descriptor = declared.ok_or_else(|| {
                CompilationError::resolution(
                    format!("cannot infer the type of '{}' without a value", decl.name),
                    span,
                )
            })?;
            return Ok(VariableDeclaration {
                descriptor,
                value: None,
                value_type: None,
                from_expression: false,
            });
        };

        if let Some((ty, value, descriptor)) =
            literal_initializer(self.ctx.registry, declared.as_ref(), text, span)?
        {
            return Ok(VariableDeclaration {
                descriptor,
                value: Some(value),
                value_type: Some(ty),
                from_expression: false,
            });
        }

        let descriptor = match declared {
            Some(declared) => {
                self.compile_value(text, &declared, span)?;
                declared
            }
            None => {
                let result = self.expr.compile(
                    self.ctx,
                    self.emitter,
                    self.block,
                    text,
                    LoadMode::Load,
                    span,
                )?;
                if result.is_void() {
                    return Err(CompilationError::type_mismatch(
                        format!("'{}' does not produce a value", text),
                        span,
                    ));
                }
                result.descriptor
            }
        };
        Ok(VariableDeclaration {
            descriptor,
            value: None,
            value_type: None,
            from_expression: true,
        })
    }

    /// Compile `var`/`const`: allocate the next slot and store the value.
    pub(super) fn compile_var_decl(&mut self, text: &str, span: Span) -> Result<()> {
        let decl = DeclarationText::parse(text, span)?;
        let scope = self.block.scope;
        if self.emitter.method().has_local(decl.name, Some(&scope)) {
            return Err(CompilationError::duplicate("local variable", decl.name, span));
        }

        let resolved = self.declare_local(&decl, span)?;
        if let Some(value) = &resolved.value {
            self.emitter.emit_literal(value)?;
        }
        let slot = self.emitter.method_mut().add_local(
            decl.name,
            resolved.descriptor.clone(),
            scope,
            decl.modifiers(),
            span,
        )?;
        if resolved.value.is_some() || resolved.from_expression {
            self.emitter.emit_store(&resolved.descriptor, slot)?;
        }
        self.emitter
            .declare_local(decl.name, &resolved.descriptor, scope.start, scope.end, slot);
        Ok(())
    }
}
