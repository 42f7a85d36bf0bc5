//! Class symbols.

use crate::{AccessFlags, CompilationError, Descriptor, FieldSymbol, MethodSymbol, Result};

/// Where a class symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassOrigin {
    /// Preloaded platform class; never compiled.
    Builtin,
    /// Declared in the compilation unit.
    Source,
}

/// A class or interface known to the compiler.
///
/// Created once per class header and extended as members are declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSymbol {
    /// Fully qualified, slash-separated name (`geo/Point`).
    pub name: String,
    pub simple_name: String,
    /// Slash-separated package, empty for the default package.
    pub package: String,
    /// Fully qualified parent name; `None` only for the hierarchy root.
    pub parent: Option<String>,
    pub modifiers: AccessFlags,
    pub interfaces: Vec<String>,
    /// Fully qualified names brought in by `import`.
    pub imports: Vec<String>,
    pub source_file: Option<String>,
    pub origin: ClassOrigin,
    fields: Vec<FieldSymbol>,
    methods: Vec<MethodSymbol>,
}

impl ClassSymbol {
    /// New source class named by its fully qualified path.
    pub fn new(name: impl Into<String>, parent: Option<String>, modifiers: AccessFlags) -> Self {
        let name = name.into();
        let (package, simple_name) = match name.rsplit_once('/') {
            Some((package, simple)) => (package.to_string(), simple.to_string()),
            None => (String::new(), name.clone()),
        };
        Self {
            name,
            simple_name,
            package,
            parent,
            modifiers,
            interfaces: Vec::new(),
            imports: Vec::new(),
            source_file: None,
            origin: ClassOrigin::Source,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Preloaded platform class.
    pub fn builtin(name: impl Into<String>, parent: Option<&str>, modifiers: AccessFlags) -> Self {
        Self {
            origin: ClassOrigin::Builtin,
            ..Self::new(name, parent.map(str::to_string), modifiers)
        }
    }

    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(AccessFlags::INTERFACE)
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.origin == ClassOrigin::Builtin
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::object(self.name.clone())
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Whether a field or a named method uses `name`.
    pub fn has_member(&self, name: &str) -> bool {
        self.field(name).is_some()
            || self
                .methods
                .iter()
                .any(|m| !m.is_constructor() && m.name == name)
    }

    pub fn fields(&self) -> &[FieldSymbol] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSymbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Add a field; its name must not be used by any other member.
    pub fn add_field(&mut self, field: FieldSymbol) -> Result<()> {
        if self.has_member(&field.name) {
            return Err(CompilationError::duplicate("member", field.name, field.span));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn methods(&self) -> &[MethodSymbol] {
        &self.methods
    }

    pub fn method(&self, index: u32) -> Option<&MethodSymbol> {
        self.methods.get(index as usize)
    }

    pub fn method_mut(&mut self, index: u32) -> Option<&mut MethodSymbol> {
        self.methods.get_mut(index as usize)
    }

    /// Replace the method at `index`, used when a body finishes compiling.
    pub fn replace_method(&mut self, index: u32, method: MethodSymbol) -> Result<()> {
        let slot = self.methods.get_mut(index as usize).ok_or_else(|| {
            CompilationError::internal(format!("no method #{} on '{}'", index, self.name))
        })?;
        *slot = method;
        Ok(())
    }

    /// Add a method or constructor and return its index.
    ///
    /// Named methods share one namespace with fields. Constructors may be
    /// overloaded but not with an identical parameter list.
    pub fn add_method(&mut self, method: MethodSymbol) -> Result<u32> {
        if method.is_constructor() {
            if self.constructors().any(|(_, c)| c.same_signature(&method)) {
                return Err(CompilationError::duplicate(
                    "constructor",
                    format!("{}{}", self.simple_name, method.descriptor()),
                    method.span,
                ));
            }
        } else if self.has_member(&method.name) {
            return Err(CompilationError::duplicate("member", method.name, method.span));
        }
        let index = u32::try_from(self.methods.len())
            .map_err(|_| CompilationError::internal("too many methods"))?;
        self.methods.push(method);
        Ok(index)
    }

    /// Named method by name.
    pub fn find_method(&self, name: &str) -> Option<(u32, &MethodSymbol)> {
        self.methods
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_constructor() && m.name == name)
            .map(|(i, m)| (i as u32, m))
    }

    pub fn constructors(&self) -> impl Iterator<Item = (u32, &MethodSymbol)> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_constructor())
            .map(|(i, m)| (i as u32, m))
    }

    pub fn has_constructor(&self) -> bool {
        self.constructors().next().is_some()
    }

    /// Constructor taking no arguments.
    pub fn default_constructor(&self) -> Option<(u32, &MethodSymbol)> {
        self.constructors().find(|(_, c)| c.params().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Param;

    fn create_test_class() -> ClassSymbol {
        ClassSymbol::new(
            "geo/Point",
            Some(crate::OBJECT_CLASS.to_string()),
            AccessFlags::PUBLIC | AccessFlags::SUPER,
        )
    }

    #[test]
    fn splits_package_and_simple_name() {
        let class = create_test_class();
        assert_eq!(class.simple_name, "Point");
        assert_eq!(class.package, "geo");
        let bare = ClassSymbol::new("Main", None, AccessFlags::SUPER);
        assert_eq!(bare.package, "");
        assert_eq!(bare.simple_name, "Main");
    }

    #[test]
    fn fields_and_methods_share_namespace() {
        let mut class = create_test_class();
        class
            .add_field(FieldSymbol::new("x", Descriptor::INT, AccessFlags::PRIVATE))
            .unwrap();
        let err = class
            .add_method(MethodSymbol::new("x", Descriptor::VOID, AccessFlags::PUBLIC))
            .unwrap_err();
        assert!(matches!(err, CompilationError::Duplicate { what: "member", .. }));
        let err = class
            .add_field(FieldSymbol::new("x", Descriptor::LONG, AccessFlags::PRIVATE))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Duplicate);
    }

    #[test]
    fn constructors_overload_by_parameters() {
        let mut class = create_test_class();
        class.add_method(MethodSymbol::constructor(AccessFlags::PUBLIC)).unwrap();
        let mut two = MethodSymbol::constructor(AccessFlags::PUBLIC);
        two.set_parameters(vec![Param::new("x", Descriptor::INT), Param::new("y", Descriptor::INT)])
            .unwrap();
        assert_eq!(class.add_method(two.clone()).unwrap(), 1);
        assert!(class.add_method(two).is_err());
        assert_eq!(class.constructors().count(), 2);
        assert_eq!(class.default_constructor().unwrap().0, 0);
    }

    #[test]
    fn constructor_name_is_not_a_member() {
        let mut class = create_test_class();
        class.add_method(MethodSymbol::constructor(AccessFlags::PUBLIC)).unwrap();
        assert!(!class.has_member(crate::CONSTRUCTOR_NAME));
        assert!(class.find_method(crate::CONSTRUCTOR_NAME).is_none());
    }
}
