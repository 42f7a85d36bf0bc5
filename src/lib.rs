//! muesli: a compiler from muesli classes to class artifacts for a
//! stack-based virtual machine.
//!
//! ```ignore
//! use muesli::Unit;
//!
//! let mut unit = Unit::new();
//! unit.add_source("Circle.mu", "class Circle {\n var radius: double = 1.0\n}")?;
//! unit.build()?;
//! assert!(unit.class("Circle").is_some());
//! ```
//!
//! The work is split over the workspace crates:
//!
//! - `muesli-core`: spans, errors, descriptors and the symbol model
//! - `muesli-registry`: class registry and hierarchy
//! - `muesli-compiler`: declaration passes, scheduler and code generation

pub mod unit;

pub use unit::{BuildError, Unit, UnitError};

pub use muesli_compiler::{
    ClassArtifact, ClassHeader, CodeBuffer, CompilerOptions, ExprCompiler, FieldArtifact,
    LocalVariableEntry, MethodArtifact, OpCode, ReferenceCompiler, Scheduler,
};
pub use muesli_core::{
    AccessFlags, CompilationError, Descriptor, ErrorKind, LiteralValue, PrimitiveKind, Span,
};
pub use muesli_registry::SymbolRegistry;
