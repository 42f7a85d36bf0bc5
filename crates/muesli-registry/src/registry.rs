//! SymbolRegistry - storage for every class in a compilation unit.
//!
//! # Storage Model
//!
//! - **Classes**: an arena (`Vec<ClassSymbol>`) addressed by [`ClassId`],
//!   with a name index for lookups by fully qualified name
//! - **Hierarchy**: a [`ClassHierarchy`] graph updated on every registration
//!
//! # Name Resolution
//!
//! A type name written in source resolves in this order:
//!
//! 1. qualified names (`a.b.C` or `a/b/C`) as written
//! 2. explicit imports of the declaring class
//! 3. the declaring class's own package
//! 4. `java/lang`
//! 5. the default package
//!
//! The registry is single-threaded: classes are appended while headers are
//! declared and mutated one method body at a time afterwards.

use rustc_hash::FxHashMap;
use tracing::debug;

use muesli_core::{
    ClassId, ClassSymbol, CompilationError, FieldSymbol, MethodId, MethodSymbol, Result, Span,
};

use crate::builtins::builtin_class;
use crate::hierarchy::ClassHierarchy;

const LANG_PACKAGE: &str = "java/lang";

/// Arena of class symbols keyed by fully qualified name.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    classes: Vec<ClassSymbol>,
    by_name: FxHashMap<String, ClassId>,
    hierarchy: ClassHierarchy,
}

impl SymbolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the named builtin classes.
    pub fn with_builtins<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut registry = Self::new();
        for name in names {
            let name = name.as_ref();
            let class = builtin_class(name).ok_or_else(|| {
                CompilationError::resolution(
                    format!("'{}' is not a builtin class", name),
                    Span::synthetic(),
                )
            })?;
            registry.register(class)?;
        }
        Ok(registry)
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a class. Each fully qualified name may be registered once.
    pub fn register(&mut self, class: ClassSymbol) -> Result<ClassId> {
        if self.by_name.contains_key(&class.name) {
            return Err(CompilationError::duplicate(
                "class",
                class.name,
                Span::synthetic(),
            ));
        }
        let id = ClassId(
            u32::try_from(self.classes.len())
                .map_err(|_| CompilationError::internal("too many classes"))?,
        );
        self.hierarchy.add_class(
            &class.name,
            class.parent.as_deref(),
            class.interfaces.iter().map(String::as_str),
        );
        debug!(class = %class.name, %id, origin = ?class.origin, "registered class");
        self.by_name.insert(class.name.clone(), id);
        self.classes.push(class);
        Ok(id)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn get(&self, id: ClassId) -> Option<&ClassSymbol> {
        self.classes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ClassSymbol> {
        self.classes.get_mut(id.0 as usize)
    }

    /// Class by id, or an internal error for a stale id.
    pub fn class(&self, id: ClassId) -> Result<&ClassSymbol> {
        self.get(id)
            .ok_or_else(|| CompilationError::internal(format!("unknown {}", id)))
    }

    pub fn class_mut(&mut self, id: ClassId) -> Result<&mut ClassSymbol> {
        self.classes
            .get_mut(id.0 as usize)
            .ok_or_else(|| CompilationError::internal(format!("unknown {}", id)))
    }

    /// Class by fully qualified name.
    pub fn lookup(&self, name: &str) -> Option<&ClassSymbol> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether `name` is a registered interface.
    pub fn is_interface(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(ClassSymbol::is_interface)
    }

    pub fn method(&self, id: MethodId) -> Result<&MethodSymbol> {
        self.class(id.class)?
            .method(id.index)
            .ok_or_else(|| CompilationError::internal(format!("unknown {}", id)))
    }

    pub fn method_mut(&mut self, id: MethodId) -> Result<&mut MethodSymbol> {
        self.class_mut(id.class)?
            .method_mut(id.index)
            .ok_or_else(|| CompilationError::internal(format!("unknown {}", id)))
    }

    /// All classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassSymbol)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, class)| (ClassId(i as u32), class))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    // ==========================================================================
    // Name Resolution
    // ==========================================================================

    /// Resolve a type name as written inside `from` to a registered class.
    pub fn resolve(&self, name: &str, from: &ClassSymbol) -> Option<String> {
        self.candidates(name, from)
            .into_iter()
            .find(|candidate| self.contains(candidate))
    }

    /// Fully qualified names `name` could denote from `from`, in lookup order.
    pub fn candidates(&self, name: &str, from: &ClassSymbol) -> Vec<String> {
        let path = name.replace('.', "/");
        if path.contains('/') {
            return vec![path];
        }
        let mut candidates: Vec<String> = from
            .imports
            .iter()
            .filter(|import| import.rsplit('/').next() == Some(path.as_str()))
            .cloned()
            .collect();
        if !from.package.is_empty() {
            candidates.push(format!("{}/{}", from.package, path));
        }
        candidates.push(format!("{}/{}", LANG_PACKAGE, path));
        candidates.push(path);
        candidates
    }

    // ==========================================================================
    // Hierarchy
    // ==========================================================================

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    /// Whether class `sub` is `sup` or one of its descendants.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.hierarchy.is_subtype(sub, sup)
    }

    /// Walk `name` and its parents, nearest first.
    ///
    /// Stops at an unregistered ancestor, and never visits more classes than
    /// are registered so a cyclic chain terminates.
    pub fn ancestry<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassSymbol> + 'a {
        let mut next = self.lookup(name);
        let mut remaining = self.classes.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let current = next?;
            next = current.parent.as_deref().and_then(|p| self.lookup(p));
            Some(current)
        })
    }

    /// Field `name` declared on `owner` or inherited, with its declaring class.
    pub fn find_field(&self, owner: &str, name: &str) -> Option<(&ClassSymbol, &FieldSymbol)> {
        self.ancestry(owner)
            .find_map(|class| class.field(name).map(|field| (class, field)))
    }

    /// Method `name` declared on `owner`, a parent, or an implemented
    /// interface, with its declaring class.
    pub fn find_method(&self, owner: &str, name: &str) -> Option<(&ClassSymbol, &MethodSymbol)> {
        let mut interfaces = Vec::new();
        for class in self.ancestry(owner) {
            if let Some((_, method)) = class.find_method(name) {
                return Some((class, method));
            }
            interfaces.extend(class.interfaces.iter().map(String::as_str));
        }
        interfaces.into_iter().find_map(|interface| {
            self.lookup(interface)
                .and_then(|class| class.find_method(name).map(|(_, m)| (class, m)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muesli_core::{AccessFlags, Descriptor, OBJECT_CLASS, STRING_CLASS};

    fn create_test_registry() -> SymbolRegistry {
        SymbolRegistry::with_builtins(crate::DEFAULT_BUILTINS).unwrap()
    }

    fn source_class(name: &str, parent: &str) -> ClassSymbol {
        ClassSymbol::new(name, Some(parent.to_string()), AccessFlags::SUPER)
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = create_test_registry();
        registry.register(source_class("geo/Point", OBJECT_CLASS)).unwrap();
        let err = registry
            .register(source_class("geo/Point", OBJECT_CLASS))
            .unwrap_err();
        assert!(matches!(err, CompilationError::Duplicate { what: "class", .. }));
    }

    #[test]
    fn unknown_builtin_rejected() {
        assert!(SymbolRegistry::with_builtins(&["java/util/Map"]).is_err());
    }

    #[test]
    fn resolve_follows_lookup_order() {
        let mut registry = create_test_registry();
        registry.register(source_class("geo/Point", OBJECT_CLASS)).unwrap();
        registry.register(source_class("other/Point", OBJECT_CLASS)).unwrap();
        registry.register(source_class("Main", OBJECT_CLASS)).unwrap();

        let mut from = source_class("geo/Shape", OBJECT_CLASS);
        assert_eq!(registry.resolve("Point", &from).as_deref(), Some("geo/Point"));
        from.imports.push("other/Point".to_string());
        assert_eq!(registry.resolve("Point", &from).as_deref(), Some("other/Point"));
        assert_eq!(registry.resolve("String", &from).as_deref(), Some(STRING_CLASS));
        assert_eq!(registry.resolve("Main", &from).as_deref(), Some("Main"));
        assert_eq!(registry.resolve("geo.Point", &from).as_deref(), Some("geo/Point"));
        assert_eq!(registry.resolve("Nothing", &from), None);
    }

    #[test]
    fn is_interface_checks_registered_flags() {
        let registry = create_test_registry();
        assert!(registry.is_interface("java/io/Serializable"));
        assert!(!registry.is_interface(STRING_CLASS));
        assert!(!registry.is_interface("missing/Type"));
    }

    #[test]
    fn inherited_members_are_found() {
        let mut registry = create_test_registry();
        let mut shape = source_class("geo/Shape", OBJECT_CLASS);
        shape
            .add_field(FieldSymbol::new("area", Descriptor::DOUBLE, AccessFlags::PROTECTED))
            .unwrap();
        registry.register(shape).unwrap();
        registry.register(source_class("geo/Circle", "geo/Shape")).unwrap();

        let (owner, field) = registry.find_field("geo/Circle", "area").unwrap();
        assert_eq!(owner.name, "geo/Shape");
        assert_eq!(field.descriptor, Descriptor::DOUBLE);

        let (owner, method) = registry.find_method("geo/Circle", "hashCode").unwrap();
        assert_eq!(owner.name, OBJECT_CLASS);
        assert_eq!(method.descriptor(), "()I");
        assert!(registry.is_subtype("geo/Circle", OBJECT_CLASS));
    }

    #[test]
    fn interface_methods_found_through_implements() {
        let registry = create_test_registry();
        let (owner, method) = registry.find_method(STRING_CLASS, "compareTo").unwrap();
        assert_eq!(owner.name, "java/lang/Comparable");
        assert!(method.interface_method);
    }

    #[test]
    fn ancestry_terminates_on_cycles() {
        let mut registry = SymbolRegistry::new();
        registry.register(source_class("a/A", "a/B")).unwrap();
        registry.register(source_class("a/B", "a/A")).unwrap();
        assert_eq!(registry.ancestry("a/A").count(), 2);
        assert!(registry.hierarchy().is_cyclic());
    }
}
