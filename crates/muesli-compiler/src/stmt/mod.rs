//! Statement compiler.
//!
//! The [`StmtCompiler`] lowers the logical lines of a method or constructor
//! body. Each line is classified by its leading token or shape:
//!
//! | shape                          | kind                                   |
//! |--------------------------------|----------------------------------------|
//! | `return [expr]`                | [`StatementKind::Return`]              |
//! | `var`/`const name[: T][ = e]`  | [`StatementKind::Declaration`]         |
//! | `target = expr`                | [`StatementKind::Assignment`]          |
//! | anything else                  | [`StatementKind::Expression`]          |
//!
//! The kind of the last compiled statement is kept so the body driver can
//! tell whether control falls off the end.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = StmtCompiler::new(&ctx, &mut emitter, expr, &mut block);
//! compiler.compile_body(line.body_lines())?;
//! if compiler.last_kind() != Some(StatementKind::Return) { /* implicit return */ }
//! ```

mod assign;
mod return_stmt;
pub mod var_decl;

pub use var_decl::{DeclarationText, VariableDeclaration};

use tracing::trace;

use muesli_core::{Block, CompilationError, Descriptor, Result, Span};

use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::{self, ExprCompiler, LoadMode};
use crate::names;
use crate::source::SourceLine;

/// The statement forms a body line can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Return,
    Declaration,
    Assignment,
    Expression,
}

/// Classify a logical line by its leading token or shape.
pub fn classify(text: &str) -> StatementKind {
    if names::strip_keyword(text, "return").is_some() {
        StatementKind::Return
    } else if names::strip_keyword(text, "var").is_some()
        || names::strip_keyword(text, "const").is_some()
    {
        StatementKind::Declaration
    } else if names::find_assignment(text).is_some() {
        StatementKind::Assignment
    } else {
        StatementKind::Expression
    }
}

/// Compiles statements into one method body.
pub struct StmtCompiler<'a, 'ctx, 'pool> {
    ctx: &'a CompilationContext<'ctx>,
    emitter: &'a mut BytecodeEmitter<'pool>,
    expr: &'a dyn ExprCompiler,
    /// Innermost block; bounds local visibility and carries the
    /// super-called flag in constructors.
    block: &'a mut Block,
    last_kind: Option<StatementKind>,
}

impl<'a, 'ctx, 'pool> StmtCompiler<'a, 'ctx, 'pool> {
    pub fn new(
        ctx: &'a CompilationContext<'ctx>,
        emitter: &'a mut BytecodeEmitter<'pool>,
        expr: &'a dyn ExprCompiler,
        block: &'a mut Block,
    ) -> Self {
        Self {
            ctx,
            emitter,
            expr,
            block,
            last_kind: None,
        }
    }

    /// Kind of the most recently compiled statement.
    pub fn last_kind(&self) -> Option<StatementKind> {
        self.last_kind
    }

    /// Compile every line of a body in order.
    pub fn compile_body(&mut self, lines: &[SourceLine]) -> Result<()> {
        lines.iter().try_for_each(|line| self.compile(line))
    }

    /// Compile one statement.
    pub fn compile(&mut self, line: &SourceLine) -> Result<()> {
        let span = line.span();
        self.emitter.set_line(line.line);
        if line.body.is_some() {
            return Err(CompilationError::grammar(
                format!("unexpected block after '{}'", line.text),
                span,
            ));
        }

        let text = line.text.trim();
        let kind = classify(text);
        trace!(?kind, line = line.line, statement = text, "compiling statement");
        match kind {
            StatementKind::Return => {
                let rest = names::strip_keyword(text, "return").unwrap_or_default();
                self.compile_return(rest, span)?;
            }
            StatementKind::Declaration => self.compile_var_decl(text, span)?,
            StatementKind::Assignment => self.compile_assignment(text, span)?,
            StatementKind::Expression => self.compile_expr_stmt(text, span)?,
        }
        self.last_kind = Some(kind);
        Ok(())
    }

    /// Evaluate an expression for its side effects, discarding any value.
    fn compile_expr_stmt(&mut self, text: &str, span: Span) -> Result<()> {
        let result = self.expr.compile(
            self.ctx,
            self.emitter,
            self.block,
            text,
            LoadMode::Load,
            span,
        )?;
        if !result.is_void() {
            self.emitter.emit_pop(&result.descriptor)?;
        }
        Ok(())
    }

    /// Push `text` as a value of type `target`.
    fn compile_value(&mut self, text: &str, target: &Descriptor, span: Span) -> Result<()> {
        expr::compile_value(self.expr, self.ctx, self.emitter, self.block, text, target, span)
    }
}
