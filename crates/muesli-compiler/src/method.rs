//! Method body compiler.
//!
//! [`MethodCompiler`] owns the emitter for one method while its body
//! compiles. It handles:
//!
//! - Opening the body block between a start and end label
//! - Binding parameters to slots, with debug entries for `this` and each
//!   parameter
//! - Compiling the body statements
//! - Adding the implicit `return` of void methods, and rejecting
//!   non-void bodies that fall off the end
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = MethodCompiler::new(&ctx, &ReferenceCompiler, pool, method);
//! compiler.bind_parameters();
//! compiler.compile_body(line.body_lines())?;
//! let (method, artifact) = compiler.finish()?;
//! ```

use muesli_core::{Block, CompilationError, Descriptor, Label, MethodSymbol, Result, Scope};

use crate::artifact::MethodArtifact;
use crate::bytecode::ConstantPool;
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::ExprCompiler;
use crate::field_init;
use crate::source::SourceLine;
use crate::stmt::{StatementKind, StmtCompiler};

/// Compiles one method or constructor body.
pub struct MethodCompiler<'a, 'ctx, 'pool> {
    ctx: &'a CompilationContext<'ctx>,
    expr: &'a dyn ExprCompiler,
    emitter: BytecodeEmitter<'pool>,
    /// Outermost block of the body.
    block: Block,
    end: Label,
    last_kind: Option<StatementKind>,
}

impl<'a, 'ctx, 'pool> MethodCompiler<'a, 'ctx, 'pool> {
    /// Open the body of `method`. Constructors get a constructor block.
    pub fn new(
        ctx: &'a CompilationContext<'ctx>,
        expr: &'a dyn ExprCompiler,
        pool: &'pool mut ConstantPool,
        method: MethodSymbol,
    ) -> Self {
        let line = method.span.line;
        let mut emitter = BytecodeEmitter::new(pool, method, ctx.options.debug_info);
        emitter.set_line(line);
        let start = emitter.new_label();
        let end = emitter.new_label();
        emitter.mark(start);
        let scope = Scope::new(emitter.method_mut().next_block(), start, end);
        let block = if emitter.method().is_constructor() {
            Block::constructor(scope)
        } else {
            Block::new(scope)
        };
        Self {
            ctx,
            expr,
            emitter,
            block,
            end,
            last_kind: None,
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    pub fn emitter(&self) -> &BytecodeEmitter<'pool> {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut BytecodeEmitter<'pool> {
        &mut self.emitter
    }

    /// Assign parameter slots and record debug entries for `this` and every
    /// parameter across the whole body.
    pub fn bind_parameters(&mut self) {
        let scope = self.block.scope;
        self.emitter.method_mut().bind_parameters(scope);
        if !self.emitter.method().is_static() {
            let this = self.ctx.this_descriptor();
            self.emitter.declare_local("this", &this, scope.start, scope.end, 0);
        }
        let params: Vec<_> = self
            .emitter
            .method()
            .locals()
            .iter()
            .map(|local| (local.name.clone(), local.descriptor.clone(), local.slot))
            .collect();
        for (name, descriptor, slot) in params {
            self.emitter
                .declare_local(&name, &descriptor, scope.start, scope.end, slot);
        }
    }

    /// Store every instance field default.
    pub fn emit_field_defaults(&mut self) -> Result<()> {
        field_init::emit_field_defaults(self.ctx, self.expr, &mut self.emitter, &mut self.block)
    }

    /// Compile the body statements.
    pub fn compile_body(&mut self, lines: &[SourceLine]) -> Result<()> {
        let mut compiler =
            StmtCompiler::new(self.ctx, &mut self.emitter, self.expr, &mut self.block);
        compiler.compile_body(lines)?;
        if compiler.last_kind().is_some() {
            self.last_kind = compiler.last_kind();
        }
        Ok(())
    }

    /// Whether the last compiled statement was a `return`.
    pub fn ends_with_return(&self) -> bool {
        self.last_kind == Some(StatementKind::Return)
    }

    /// Close the body and commit stack and slot requirements.
    pub fn finish(mut self) -> Result<(MethodSymbol, MethodArtifact)> {
        if !self.ends_with_return() {
            let method = self.emitter.method();
            if !method.return_type.is_void() {
                return Err(CompilationError::protocol(
                    format!(
                        "method '{}' must end with a return of type '{}'",
                        method.name,
                        method.return_type.display_name()
                    ),
                    method.span,
                ));
            }
            self.emitter.emit_return(&Descriptor::VOID)?;
        }
        self.emitter.mark(self.end);
        self.emitter.finish()
    }
}

/// Compile a method with a body.
pub fn compile_method(
    ctx: &CompilationContext<'_>,
    expr: &dyn ExprCompiler,
    pool: &mut ConstantPool,
    method: MethodSymbol,
    body: &[SourceLine],
) -> Result<(MethodSymbol, MethodArtifact)> {
    let mut compiler = MethodCompiler::new(ctx, expr, pool, method);
    compiler.bind_parameters();
    compiler.compile_body(body)?;
    compiler.finish()
}

/// Artifact entry for a method without a body.
pub fn abstract_artifact(method: &MethodSymbol) -> MethodArtifact {
    MethodArtifact {
        name: method.name.clone(),
        descriptor: method.descriptor(),
        modifiers: method.modifiers,
        max_stack: 0,
        max_locals: 0,
        code: None,
        local_variables: Vec::new(),
    }
}
