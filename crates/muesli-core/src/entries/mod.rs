//! Symbol model.
//!
//! In-memory records for the classes being compiled and their members.
//! Symbols live in the registry arena and are addressed by [`ClassId`] and
//! [`MethodId`](crate::MethodId); they are pure data plus the stack and slot
//! bookkeeping a method body needs while it is emitted.
//!
//! [`ClassId`]: crate::ClassId

mod block;
mod class;
mod field;
mod local;
mod method;

pub use block::{Block, Scope};
pub use class::{ClassOrigin, ClassSymbol};
pub use field::{FieldSymbol, ProposedValue};
pub use local::LocalSymbol;
pub use method::{CONSTRUCTOR_NAME, GenericParam, MethodKind, MethodSymbol, Param};
