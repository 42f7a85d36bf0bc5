//! Method and constructor symbols.
//!
//! A [`MethodSymbol`] is created when a member header is parsed and is then
//! mutated while its body is emitted: every instruction that changes the
//! operand stack goes through [`MethodSymbol::increase_stack`] or
//! [`MethodSymbol::decrease_stack`], and every local goes through
//! [`MethodSymbol::add_local`].
//!
//! ```text
//! slot layout (instance method)      slot layout (static method)
//! ┌───┬────┬────┬─────────┐          ┌────┬────┬─────────┐
//! │ 0 │ p1 │ p2 │ locals… │          │ p1 │ p2 │ locals… │
//! └───┴────┴────┴─────────┘          └────┴────┴─────────┘
//!  this
//! ```

use rustc_hash::FxHashSet;

use crate::{
    AccessFlags, BlockId, CompilationError, Descriptor, LocalSymbol, Result, Scope, Span,
    method_descriptor,
};

/// Reserved name every constructor binds to.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Whether a symbol is a plain method or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
}

/// A declared parameter. The instance reference is never listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub descriptor: Descriptor,
}

impl Param {
    pub fn new(name: impl Into<String>, descriptor: Descriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }
}

/// A generic type parameter with an optional upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub name: String,
    pub bound: Option<Descriptor>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>, bound: Option<Descriptor>) -> Self {
        Self {
            name: name.into(),
            bound,
        }
    }

    /// Descriptor the parameter erases to.
    pub fn erasure(&self) -> Descriptor {
        self.bound.clone().unwrap_or_else(Descriptor::root_object)
    }
}

/// A method or constructor of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbol {
    /// Binary name; [`CONSTRUCTOR_NAME`] for constructors.
    pub name: String,
    pub kind: MethodKind,
    pub return_type: Descriptor,
    params: Vec<Param>,
    pub modifiers: AccessFlags,
    /// Declared on an interface type (called with `invokeinterface`).
    pub interface_method: bool,
    generic_params: FxHashSet<GenericParam>,
    local_variables: u16,
    stack_size: u16,
    current_stack: u16,
    locals: Vec<LocalSymbol>,
    blocks: u32,
    pub span: Span,
}

impl MethodSymbol {
    pub fn new(name: impl Into<String>, return_type: Descriptor, modifiers: AccessFlags) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Method,
            return_type,
            params: Vec::new(),
            modifiers,
            interface_method: false,
            generic_params: FxHashSet::default(),
            local_variables: 0,
            stack_size: 0,
            current_stack: 0,
            locals: Vec::new(),
            blocks: 0,
            span: Span::synthetic(),
        }
    }

    /// A constructor returning `void`.
    pub fn constructor(modifiers: AccessFlags) -> Self {
        Self {
            kind: MethodKind::Constructor,
            ..Self::new(CONSTRUCTOR_NAME, Descriptor::VOID, modifiers)
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ========================================================================
    // Signature
    // ========================================================================

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.params.iter().map(|p| &p.descriptor)
    }

    /// Set the ordered parameter list, rejecting repeated names.
    pub fn set_parameters(&mut self, params: Vec<Param>) -> Result<()> {
        let mut seen = FxHashSet::default();
        for param in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(CompilationError::duplicate(
                    "parameter",
                    param.name.clone(),
                    self.span,
                ));
            }
        }
        self.params = params;
        Ok(())
    }

    /// `(<params>)<return>` descriptor.
    pub fn descriptor(&self) -> String {
        method_descriptor(self.param_descriptors(), &self.return_type)
    }

    /// Same binary signature as `other` (name and parameter types).
    pub fn same_signature(&self, other: &MethodSymbol) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self
                .param_descriptors()
                .zip(other.param_descriptors())
                .all(|(a, b)| a == b)
    }

    // ========================================================================
    // Generic parameters
    // ========================================================================

    /// Add a generic parameter. Returns `false` if the name is already taken.
    pub fn add_generic_param(&mut self, param: GenericParam) -> bool {
        if self.generic_param(&param.name).is_some() {
            return false;
        }
        self.generic_params.insert(param)
    }

    pub fn generic_param(&self, name: &str) -> Option<&GenericParam> {
        self.generic_params.iter().find(|p| p.name == name)
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    // ========================================================================
    // Operand stack
    // ========================================================================

    /// Push `count` values; raises the recorded maximum when exceeded.
    pub fn increase_stack(&mut self, count: u16) {
        self.current_stack = self.current_stack.saturating_add(count);
        if self.current_stack > self.stack_size {
            self.stack_size = self.current_stack;
        }
    }

    /// Pop `count` values.
    pub fn decrease_stack(&mut self, count: u16) -> Result<()> {
        self.current_stack = self.current_stack.checked_sub(count).ok_or_else(|| {
            CompilationError::internal(format!(
                "operand stack underflow in '{}': pop {} with depth {}",
                self.name, count, self.current_stack
            ))
        })?;
        Ok(())
    }

    /// Historical maximum of the operand stack depth.
    #[inline]
    pub fn stack_size(&self) -> u16 {
        self.stack_size
    }

    #[inline]
    pub fn current_stack(&self) -> u16 {
        self.current_stack
    }

    // ========================================================================
    // Local slots
    // ========================================================================

    /// First slot available to parameters.
    #[inline]
    pub fn first_parameter_slot(&self) -> u16 {
        if self.is_static() { 0 } else { 1 }
    }

    /// Register every parameter as a local of `scope`, one slot each in
    /// declaration order, after the instance slot for non-static members.
    pub fn bind_parameters(&mut self, scope: Scope) {
        let first = self.first_parameter_slot();
        self.locals.clear();
        self.local_variables = first;
        let params = self.params.clone();
        for param in params {
            let slot = self.local_variables;
            self.locals.push(LocalSymbol::new(
                param.name,
                param.descriptor,
                Some(scope),
                slot,
                AccessFlags::empty(),
            ));
            self.local_variables += 1;
        }
    }

    /// Number of slots used so far; also the slot the next local receives.
    #[inline]
    pub fn local_variables(&self) -> u16 {
        self.local_variables
    }

    /// Declare a local in `scope` at the next free slot.
    ///
    /// Fails if a local with the same name is already visible from `scope`.
    pub fn add_local(
        &mut self,
        name: &str,
        descriptor: Descriptor,
        scope: Scope,
        modifiers: AccessFlags,
        span: Span,
    ) -> Result<u16> {
        if self.find_local(name, Some(&scope)).is_some() {
            return Err(CompilationError::duplicate("local variable", name, span));
        }
        let slot = self.local_variables;
        self.locals
            .push(LocalSymbol::new(name, descriptor, Some(scope), slot, modifiers));
        self.local_variables = self.local_variables.checked_add(1).ok_or_else(|| {
            CompilationError::internal(format!("too many locals in '{}'", self.name))
        })?;
        Ok(slot)
    }

    /// Find the nearest visible local named `name`.
    ///
    /// Locals are searched from the most recently declared; the first one
    /// whose declaring block encloses `from` wins. With no lookup scope every
    /// local is a candidate.
    pub fn find_local(&self, name: &str, from: Option<&Scope>) -> Option<&LocalSymbol> {
        self.locals
            .iter()
            .rev()
            .find(|local| local.name == name && local.is_visible_from(from))
    }

    pub fn has_local(&self, name: &str, from: Option<&Scope>) -> bool {
        self.find_local(name, from).is_some()
    }

    pub fn locals(&self) -> &[LocalSymbol] {
        &self.locals
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Allocate the next block identifier.
    pub fn next_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks);
        self.blocks += 1;
        id
    }

    /// Number of blocks opened so far.
    #[inline]
    pub fn block_count(&self) -> u32 {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;

    fn create_test_method(modifiers: AccessFlags) -> MethodSymbol {
        let mut method = MethodSymbol::new("move", Descriptor::VOID, modifiers);
        method
            .set_parameters(vec![
                Param::new("dx", Descriptor::INT),
                Param::new("dy", Descriptor::INT),
            ])
            .unwrap();
        method
    }

    fn scope(block: u32, start: u32) -> Scope {
        Scope::new(BlockId(block), Label(start), Label(start + 1))
    }

    #[test]
    fn instance_parameters_start_at_one() {
        let mut method = create_test_method(AccessFlags::PUBLIC);
        method.bind_parameters(scope(0, 0));
        let slots: Vec<_> = method.locals().iter().map(|l| (l.name.as_str(), l.slot)).collect();
        assert_eq!(slots, vec![("dx", 1), ("dy", 2)]);
        assert_eq!(method.local_variables(), 3);
    }

    #[test]
    fn static_parameters_start_at_zero() {
        let mut method = create_test_method(AccessFlags::PUBLIC | AccessFlags::STATIC);
        method.bind_parameters(scope(0, 0));
        assert_eq!(method.locals()[0].slot, 0);
        assert_eq!(method.local_variables(), 2);
    }

    #[test]
    fn duplicate_parameter_rejected() {
        let mut method = MethodSymbol::new("f", Descriptor::VOID, AccessFlags::PUBLIC);
        let err = method
            .set_parameters(vec![Param::new("a", Descriptor::INT), Param::new("a", Descriptor::LONG)])
            .unwrap_err();
        assert!(matches!(err, CompilationError::Duplicate { what: "parameter", .. }));
    }

    #[test]
    fn stack_size_keeps_maximum() {
        let mut method = MethodSymbol::new("f", Descriptor::VOID, AccessFlags::PUBLIC);
        method.increase_stack(1);
        method.increase_stack(2);
        method.decrease_stack(2).unwrap();
        method.increase_stack(1);
        assert_eq!(method.current_stack(), 2);
        assert_eq!(method.stack_size(), 3);
    }

    #[test]
    fn stack_underflow_is_internal_error() {
        let mut method = MethodSymbol::new("f", Descriptor::VOID, AccessFlags::PUBLIC);
        method.increase_stack(1);
        let err = method.decrease_stack(2).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn add_local_takes_next_slot() {
        let mut method = create_test_method(AccessFlags::PUBLIC);
        let body = scope(0, 0);
        method.bind_parameters(body);
        let slot = method
            .add_local("n", Descriptor::INT, body, AccessFlags::empty(), Span::new(1))
            .unwrap();
        assert_eq!(slot, 3);
        assert_eq!(method.local_variables(), 4);
    }

    #[test]
    fn visible_duplicate_local_rejected() {
        let mut method = create_test_method(AccessFlags::PUBLIC);
        let body = scope(0, 0);
        method.bind_parameters(body);
        let err = method
            .add_local("dx", Descriptor::INT, body, AccessFlags::empty(), Span::new(2))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Duplicate);
    }

    #[test]
    fn nearest_local_wins() {
        let mut method = MethodSymbol::new("f", Descriptor::VOID, AccessFlags::STATIC);
        let outer = scope(0, 0);
        let inner = scope(1, 2);
        let later = scope(2, 4);
        method
            .add_local("v", Descriptor::INT, later, AccessFlags::empty(), Span::new(1))
            .unwrap();
        method
            .add_local("w", Descriptor::LONG, inner, AccessFlags::empty(), Span::new(2))
            .unwrap();
        assert_eq!(method.find_local("v", Some(&later)).unwrap().slot, 0);

        // Not visible from the outer block, so the name is free there.
        method
            .add_local("v", Descriptor::LONG, outer, AccessFlags::empty(), Span::new(3))
            .unwrap();
        assert_eq!(method.find_local("v", Some(&outer)).unwrap().slot, 2);
        assert_eq!(method.find_local("v", Some(&later)).unwrap().slot, 2);
        assert!(method.find_local("w", Some(&outer)).is_none());
        assert_eq!(method.find_local("v", None).unwrap().slot, 2);
    }

    #[test]
    fn constructor_descriptor() {
        let mut ctor = MethodSymbol::constructor(AccessFlags::PUBLIC);
        ctor.set_parameters(vec![Param::new("x", Descriptor::INT), Param::new("y", Descriptor::INT)])
            .unwrap();
        assert_eq!(ctor.name, CONSTRUCTOR_NAME);
        assert_eq!(ctor.descriptor(), "(II)V");
        assert!(ctor.is_constructor());
    }

    #[test]
    fn generic_params_are_unique_by_name() {
        let mut method = MethodSymbol::new("id", Descriptor::root_object(), AccessFlags::PUBLIC);
        assert!(method.add_generic_param(GenericParam::new("T", None)));
        assert!(!method.add_generic_param(GenericParam::new("T", Some(Descriptor::string()))));
        assert!(method.is_generic());
        assert_eq!(method.generic_param("T").unwrap().erasure(), Descriptor::root_object());
    }

    #[test]
    fn block_ids_are_sequential() {
        let mut method = MethodSymbol::new("f", Descriptor::VOID, AccessFlags::PUBLIC);
        assert_eq!(method.next_block(), BlockId(0));
        assert_eq!(method.next_block(), BlockId(1));
        assert_eq!(method.block_count(), 2);
    }
}
