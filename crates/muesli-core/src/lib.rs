//! Core types for the muesli compiler.
//!
//! This crate holds the leaf data shared by every other crate in the
//! workspace:
//!
//! - [`Span`]: source line tracking for diagnostics
//! - [`CompilationError`]: the single error type surfaced by every phase
//! - [`AccessFlags`]: class, member and local modifier bitsets
//! - [`Descriptor`] / [`PrimitiveKind`]: binary type descriptors
//! - [`LiteralValue`] / [`LiteralType`]: typed literal payloads
//! - [`entries`]: the symbol model (classes, methods, fields, locals, blocks)

pub mod access;
pub mod descriptor;
pub mod entries;
pub mod error;
pub mod ids;
pub mod literal;
pub mod span;

pub use access::AccessFlags;
pub use descriptor::{
    Descriptor, OBJECT_CLASS, PrimitiveKind, SERIALIZABLE_CLASS, STRING_CLASS, method_descriptor,
};
pub use entries::{
    Block, CONSTRUCTOR_NAME, ClassOrigin, ClassSymbol, FieldSymbol, GenericParam, LocalSymbol,
    MethodKind, MethodSymbol, Param, ProposedValue, Scope,
};
pub use error::{CompilationError, ErrorKind, Result};
pub use ids::{BlockId, ClassId, Label, MethodId};
pub use literal::{LiteralType, LiteralValue};
pub use span::Span;
