//! CompilationContext - what a body compiler can see of the unit.

use muesli_core::{ClassSymbol, Descriptor, MethodSymbol};
use muesli_registry::SymbolRegistry;

use crate::config::CompilerOptions;
use crate::types::{self, TypeResolver};

/// Read-only view shared by every stage compiling one class body.
///
/// The registry is complete by the time bodies compile, so lookups through
/// it see every class and member of the unit regardless of declaration order.
pub struct CompilationContext<'a> {
    pub registry: &'a SymbolRegistry,
    pub class: &'a ClassSymbol,
    pub options: &'a CompilerOptions,
}

impl<'a> CompilationContext<'a> {
    pub fn new(
        registry: &'a SymbolRegistry,
        class: &'a ClassSymbol,
        options: &'a CompilerOptions,
    ) -> Self {
        Self {
            registry,
            class,
            options,
        }
    }

    /// Resolver for type names written inside the current class.
    pub fn resolver(&self) -> TypeResolver<'a> {
        TypeResolver::new(self.registry, self.class)
    }

    /// Resolver that also sees the generic parameters of `method`.
    pub fn method_resolver<'m>(&self, method: &'m MethodSymbol) -> TypeResolver<'m>
    where
        'a: 'm,
    {
        TypeResolver::new(self.registry, self.class).in_method(method)
    }

    /// Descriptor of `this`.
    pub fn this_descriptor(&self) -> Descriptor {
        self.class.descriptor()
    }

    pub fn parent(&self) -> Option<&'a str> {
        self.class.parent.as_deref()
    }

    pub fn is_assignable(&self, target: &Descriptor, value: &Descriptor) -> bool {
        types::is_assignable(self.registry, target, value)
    }
}
