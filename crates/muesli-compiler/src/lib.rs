//! muesli Compiler
//!
//! Lowers muesli classes to class artifacts for a stack-based virtual
//! machine.
//!
//! ## Architecture
//!
//! - **Declaration**: each source file's header is parsed and registered
//!   eagerly, so the registry knows every class of the unit
//! - **Members**: deferred; fields and signatures are declared once all
//!   classes exist
//! - **Codegen**: deferred; constructor and method bodies are lowered with
//!   operand-stack and local-slot accounting
//!
//! ## Modules
//!
//! - [`artifact`]: Class artifacts and the writer that accumulates them
//! - [`bytecode`]: Bytecode types (OpCode, CodeBuffer, ConstantPool)
//! - [`config`]: Compiler options
//! - [`constructor`]: Constructor bodies, field defaults and the super call
//! - [`context`]: Read-only view of the unit while compiling a body
//! - [`emit`]: Bytecode emitter with stack and slot bookkeeping
//! - [`expr`]: Expression compiler trait and reference implementation
//! - [`method`]: Method bodies and implicit returns
//! - [`passes`]: Declaration and member passes
//! - [`scheduler`]: Two-phase declaration/codegen driver
//! - [`source`]: Logical line splitter
//! - [`stmt`]: Statement compiler
//! - [`types`]: Signatures, literal typing and assignability

pub mod artifact;
pub mod bytecode;
pub mod config;
pub mod constructor;
pub mod context;
pub mod emit;
pub mod expr;
pub mod field_init;
pub mod method;
mod modifiers;
mod names;
pub mod passes;
pub mod scheduler;
pub mod source;
pub mod stmt;
pub mod types;

pub use artifact::{
    ClassArtifact, ClassHeader, ClassWriter, FieldArtifact, LocalVariableEntry, MethodArtifact,
};
pub use bytecode::{CodeBuffer, ConstantPool, LineNumberEntry, OpCode};
pub use config::{CompilerOptions, DEFAULT_CLASS_VERSION};
pub use constructor::ConstructorCompiler;
pub use context::CompilationContext;
pub use emit::{BytecodeEmitter, InvokeKind};
pub use expr::{ExprCompiler, ExprResult, LoadMode, ReferenceCompiler};
pub use method::MethodCompiler;
pub use scheduler::{PendingTask, Scheduler};
pub use source::{SourceLine, split_lines};
pub use stmt::{StatementKind, StmtCompiler};
pub use types::TypeResolver;

// Re-export CompilationError from core for convenience
pub use muesli_core::{CompilationError, ErrorKind, Result};
