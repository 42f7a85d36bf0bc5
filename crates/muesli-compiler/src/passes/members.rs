//! Member pass - declare the members of a registered class.
//!
//! Runs once per class, after every class of the unit has been declared,
//! so member types may name any class in the unit.
//!
//! ## Responsibilities
//!
//! - Parse field, constructor and method headers from the class body
//! - Resolve parameter, return and field types
//! - Add the member symbols to the class in the registry
//! - Synthesize the default constructor when none is written
//! - Hand back the bodies still to be compiled
//!
//! ## Member grammar
//!
//! ```text
//! [modifiers] var|const name: Type [= value]
//! [modifiers] constructor Name(p: T, ...) { ... }
//! [modifiers] func name<G: Bound>(p: T, ...)[: Ret] { ... }
//! ```

use muesli_core::{
    AccessFlags, ClassId, ClassSymbol, CompilationError, Descriptor, FieldSymbol, GenericParam,
    MethodSymbol, Param, ProposedValue, Result, Span,
};
use muesli_registry::SymbolRegistry;
use tracing::trace;

use crate::artifact::{FieldArtifact, MethodArtifact};
use crate::field_init::field_artifact;
use crate::method::abstract_artifact;
use crate::modifiers::{ModifierContext, parse_modifiers};
use crate::names;
use crate::source::SourceLine;
use crate::stmt::{DeclarationText, var_decl};
use crate::types::TypeResolver;

/// A member body waiting for code generation, by method index on its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyTask {
    Constructor { index: u32, body: Vec<SourceLine> },
    DefaultConstructor { index: u32 },
    Method { index: u32, body: Vec<SourceLine> },
}

/// Everything the member pass produced for one class.
#[derive(Debug, Default)]
pub struct DeclaredMembers {
    pub fields: Vec<FieldArtifact>,
    /// Methods without code, complete as declared.
    pub abstract_methods: Vec<MethodArtifact>,
    pub bodies: Vec<BodyTask>,
}

/// The keyword that introduces a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKeyword {
    Field,
    Constructor,
    Method,
}

/// Split a member header at its introducing keyword.
///
/// Returns the modifier words, the keyword and the text from the keyword on.
fn split_header(text: &str, span: Span) -> Result<(&str, MemberKeyword, &str)> {
    let mut offset = 0;
    for word in text.split(' ') {
        let keyword = match word.split(['(', '<']).next().unwrap_or(word) {
            "var" | "const" => Some(MemberKeyword::Field),
            "constructor" => Some(MemberKeyword::Constructor),
            "func" => Some(MemberKeyword::Method),
            _ => None,
        };
        if let Some(keyword) = keyword {
            return Ok((text[..offset].trim(), keyword, &text[offset..]));
        }
        offset += word.len() + 1;
    }
    Err(CompilationError::grammar(
        format!("expected member declaration, found '{}'", text),
        span,
    ))
}

/// `name<generics>(params) tail`, from after the keyword.
struct Signature<'t> {
    name: &'t str,
    generics: Option<&'t str>,
    params: &'t str,
    tail: &'t str,
}

fn parse_signature(text: &str, span: Span) -> Result<Signature<'_>> {
    let open = text
        .find('(')
        .ok_or_else(|| CompilationError::grammar("expected '(' after member name", span))?;
    let close = text
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| CompilationError::grammar("expected ')' to close parameters", span))?;

    let head = text[..open].trim();
    let (name, generics) = match head.split_once('<') {
        Some((name, rest)) => {
            let inner = rest.trim_end().strip_suffix('>').ok_or_else(|| {
                CompilationError::grammar("expected '>' to close generic parameters", span)
            })?;
            (name.trim(), Some(inner))
        }
        None => (head, None),
    };

    Ok(Signature {
        name,
        generics,
        params: text[open + 1..close].trim(),
        tail: text[close + 1..].trim(),
    })
}

/// Declares the members of one class.
pub struct MemberPass<'a> {
    registry: &'a mut SymbolRegistry,
    id: ClassId,
}

impl<'a> MemberPass<'a> {
    pub fn new(registry: &'a mut SymbolRegistry, id: ClassId) -> Self {
        Self { registry, id }
    }

    /// Declare every member in `body` and return the work left over.
    pub fn run(self, body: &[SourceLine]) -> Result<DeclaredMembers> {
        let from = self.registry.class(self.id)?;
        let mut class = from.clone();
        let mut declared = DeclaredMembers::default();
        let mut pending_bodies = Vec::new();

        {
            let declarer = Declarer {
                registry: &*self.registry,
                from,
            };
            for line in body {
                let span = line.span();
                let text = names::normalize_spaces(&line.text);
                let (modifiers, keyword, rest) = split_header(&text, span)?;
                match keyword {
                    MemberKeyword::Field => {
                        if line.body.is_some() {
                            return Err(CompilationError::grammar(
                                "a field declaration cannot have a body",
                                span,
                            ));
                        }
                        let field = declarer.field(modifiers, rest, span)?;
                        trace!(class = %class.name, field = %field.name, "declared field");
                        class.add_field(field)?;
                    }
                    MemberKeyword::Constructor => {
                        let body = line.body.clone().ok_or_else(|| {
                            CompilationError::grammar("constructor requires a body", span)
                        })?;
                        let ctor = declarer.constructor(&class, modifiers, rest, span)?;
                        trace!(class = %class.name, descriptor = %ctor.descriptor(), "declared constructor");
                        let index = class.add_method(ctor)?;
                        pending_bodies.push(BodyTask::Constructor { index, body });
                    }
                    MemberKeyword::Method => {
                        let method = declarer.method(&class, modifiers, rest, span)?;
                        trace!(class = %class.name, method = %method.name, "declared method");
                        match (&line.body, method.is_abstract()) {
                            (Some(_), true) => {
                                return Err(CompilationError::grammar(
                                    format!("abstract method '{}' cannot have a body", method.name),
                                    span,
                                ));
                            }
                            (None, false) => {
                                return Err(CompilationError::grammar(
                                    format!("method '{}' requires a body", method.name),
                                    span,
                                ));
                            }
                            (None, true) => {
                                declared.abstract_methods.push(abstract_artifact(&method));
                                class.add_method(method)?;
                            }
                            (Some(body), false) => {
                                let body = body.clone();
                                let index = class.add_method(method)?;
                                pending_bodies.push(BodyTask::Method { index, body });
                            }
                        }
                    }
                }
            }
        }

        if !class.has_constructor() {
            let index = class.add_method(MethodSymbol::constructor(AccessFlags::PUBLIC))?;
            pending_bodies.push(BodyTask::DefaultConstructor { index });
        }

        declared.fields = class.fields().iter().map(field_artifact).collect();
        declared.bodies = pending_bodies;
        *self.registry.class_mut(self.id)? = class;
        Ok(declared)
    }
}

/// Builds member symbols against the class as registered.
struct Declarer<'r> {
    registry: &'r SymbolRegistry,
    from: &'r ClassSymbol,
}

impl Declarer<'_> {
    fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.registry, self.from)
    }

    fn field(&self, modifiers: &str, text: &str, span: Span) -> Result<FieldSymbol> {
        let flags = parse_modifiers(modifiers, ModifierContext::Field, span)?.flags;
        let decl = DeclarationText::parse(text, span)?;
        let resolved = var_decl::declare_member(&self.resolver(), self.registry, &decl, span)?;
        let flags = flags | decl.modifiers();

        let proposed = match (resolved.value, decl.initializer) {
            (Some(value), _) => Some(ProposedValue::Literal(value)),
            (None, Some(text)) => Some(ProposedValue::Expression(text.to_string())),
            (None, None) => None,
        };
        if flags.is_static()
            && let Some(value) = &proposed
            && (!flags.is_final() || !matches!(value, ProposedValue::Literal(_)))
        {
            return Err(CompilationError::grammar(
                format!(
                    "static field '{}' can only be initialized as a literal 'const'",
                    decl.name
                ),
                span,
            ));
        }

        let field = FieldSymbol::new(decl.name, resolved.descriptor, flags).with_span(span);
        Ok(match proposed {
            Some(proposed) => field.with_proposed(proposed),
            None => field,
        })
    }

    fn constructor(
        &self,
        class: &ClassSymbol,
        modifiers: &str,
        text: &str,
        span: Span,
    ) -> Result<MethodSymbol> {
        let flags = parse_modifiers(modifiers, ModifierContext::Constructor, span)?.flags;
        let rest = names::strip_keyword(text, "constructor")
            .or_else(|| text.strip_prefix("constructor"))
            .unwrap_or(text);
        let signature = parse_signature(rest, span)?;
        if signature.generics.is_some() {
            return Err(CompilationError::grammar(
                "constructors cannot declare generic parameters",
                span,
            ));
        }
        if !signature.tail.is_empty() {
            return Err(CompilationError::grammar(
                format!("unexpected '{}' after constructor parameters", signature.tail),
                span,
            ));
        }
        names::check_identifier(signature.name, "constructor", span)?;
        if signature.name != class.simple_name {
            return Err(CompilationError::grammar(
                format!(
                    "constructor '{}' must be named after its class '{}'",
                    signature.name, class.simple_name
                ),
                span,
            ));
        }
        if class.has_member(signature.name) {
            return Err(CompilationError::duplicate("member", signature.name, span));
        }

        let mut ctor = MethodSymbol::constructor(flags).with_span(span);
        let params = self.params(&self.resolver(), signature.params, span)?;
        ctor.set_parameters(params)?;
        Ok(ctor)
    }

    fn method(
        &self,
        class: &ClassSymbol,
        modifiers: &str,
        text: &str,
        span: Span,
    ) -> Result<MethodSymbol> {
        let flags = parse_modifiers(modifiers, ModifierContext::Method, span)?.flags;
        let rest = names::strip_keyword(text, "func")
            .or_else(|| text.strip_prefix("func"))
            .unwrap_or(text);
        let signature = parse_signature(rest, span)?;
        names::check_identifier(signature.name, "method", span)?;
        if flags.is_abstract() && !class.modifiers.is_abstract() {
            return Err(CompilationError::grammar(
                format!(
                    "abstract method '{}' requires an abstract class",
                    signature.name
                ),
                span,
            ));
        }

        let mut method = MethodSymbol::new(signature.name, Descriptor::VOID, flags).with_span(span);
        if let Some(generics) = signature.generics {
            for generic in names::split_top_level(generics, ',') {
                let param = self.generic(generic, span)?;
                let name = param.name.clone();
                if !method.add_generic_param(param) {
                    return Err(CompilationError::duplicate("generic parameter", name, span));
                }
            }
        }

        let (params, return_type) = {
            let resolver = self.resolver().in_method(&method);
            let params = self.params(&resolver, signature.params, span)?;
            let return_type = match signature.tail {
                "" => Descriptor::VOID,
                tail => {
                    let name = tail.strip_prefix(':').map(str::trim).ok_or_else(|| {
                        CompilationError::grammar(
                            format!("unexpected '{}' after method parameters", tail),
                            span,
                        )
                    })?;
                    names::check_type_name(name, span)?;
                    resolver.resolve(name, span)?
                }
            };
            (params, return_type)
        };
        method.set_parameters(params)?;
        method.return_type = return_type;
        Ok(method)
    }

    /// `T` or `T: Bound`.
    fn generic(&self, text: &str, span: Span) -> Result<GenericParam> {
        let (name, bound) = match text.split_once(':') {
            Some((name, bound)) => (name.trim(), Some(bound.trim())),
            None => (text.trim(), None),
        };
        names::check_identifier(name, "generic parameter", span)?;
        let bound = match bound {
            Some(bound) => {
                names::check_type_name(bound, span)?;
                let desc = self.resolver().resolve_value_type(bound, span)?;
                if !desc.is_reference() {
                    return Err(CompilationError::type_mismatch(
                        format!("generic bound '{}' must be a class", bound),
                        span,
                    ));
                }
                Some(desc)
            }
            None => None,
        };
        Ok(GenericParam::new(name, bound))
    }

    /// `name: Type, ...`
    fn params(&self, resolver: &TypeResolver<'_>, text: &str, span: Span) -> Result<Vec<Param>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        names::split_top_level(text, ',')
            .into_iter()
            .map(|param| {
                let (name, ty) = param.split_once(':').ok_or_else(|| {
                    CompilationError::grammar(
                        format!("expected 'name: type' parameter, found '{}'", param),
                        span,
                    )
                })?;
                let (name, ty) = (name.trim(), ty.trim());
                names::check_identifier(name, "parameter", span)?;
                names::check_type_name(ty, span)?;
                Ok(Param::new(name, resolver.resolve_value_type(ty, span)?))
            })
            .collect()
    }
}
