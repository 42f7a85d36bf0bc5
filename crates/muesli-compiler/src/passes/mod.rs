//! Compiler passes.
//!
//! - [`declaration`]: eager - parse a file's package, imports and class
//!   header into a [`ClassSymbol`](muesli_core::ClassSymbol)
//! - [`members`]: deferred - declare fields, constructors and methods of a
//!   registered class and queue their bodies

pub mod declaration;
pub mod members;

pub use declaration::{DeclaredClass, declare_class};
pub use members::{BodyTask, DeclaredMembers, MemberPass};
