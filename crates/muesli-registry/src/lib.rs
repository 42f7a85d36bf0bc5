//! Class registry for the muesli compiler.
//!
//! Holds every class known to a compilation unit, preloaded platform classes
//! included, and answers the questions the compiler asks about them:
//! short-name resolution, interface checks, member lookup through the
//! parent chain, and subtype queries over the class hierarchy graph.

pub mod builtins;
pub mod hierarchy;
pub mod registry;

pub use builtins::{DEFAULT_BUILTINS, builtin_class};
pub use hierarchy::{ClassHierarchy, HierarchyEdge};
pub use registry::SymbolRegistry;
