//! Field symbols.

use crate::{AccessFlags, Descriptor, LiteralValue, Span};

/// Default value a field declaration proposes for every constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposedValue {
    /// Parsed literal, already checked against the field type.
    Literal(LiteralValue),
    /// Raw source of a non-literal initializer, compiled per constructor.
    Expression(String),
}

/// A field of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSymbol {
    pub name: String,
    pub descriptor: Descriptor,
    pub modifiers: AccessFlags,
    pub proposed: Option<ProposedValue>,
    pub span: Span,
}

impl FieldSymbol {
    pub fn new(name: impl Into<String>, descriptor: Descriptor, modifiers: AccessFlags) -> Self {
        Self {
            name: name.into(),
            descriptor,
            modifiers,
            proposed: None,
            span: Span::synthetic(),
        }
    }

    pub fn with_proposed(mut self, proposed: ProposedValue) -> Self {
        self.proposed = Some(proposed);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Instance fields with a default are stored by every constructor.
    pub fn needs_constructor_init(&self) -> bool {
        !self.is_static() && self.proposed.is_some()
    }
}
