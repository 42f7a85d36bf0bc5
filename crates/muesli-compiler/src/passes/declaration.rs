//! Declaration pass - parse a file's header.
//!
//! A source file has the shape:
//!
//! ```text
//! package geo                        optional, first
//! import util.Counter                zero or more
//! public class Circle extends Shape implements Comparable {
//!     ...                            body, handed to the member pass
//! }
//! ```
//!
//! Everything here is checked eagerly so a class that fails never reaches
//! the registry.

use muesli_core::{ClassSymbol, CompilationError, Result, SERIALIZABLE_CLASS, Span};
use muesli_registry::SymbolRegistry;

use crate::config::CompilerOptions;
use crate::modifiers::{ModifierContext, parse_modifiers};
use crate::names;
use crate::source::SourceLine;

/// A parsed, not yet registered, class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredClass {
    pub symbol: ClassSymbol,
    pub body: Vec<SourceLine>,
    pub span: Span,
}

fn qualify(package: &str, name: &str) -> String {
    let path = name.replace('.', "/");
    if package.is_empty() || path.contains('/') {
        path
    } else {
        format!("{}/{}", package, path)
    }
}

/// The words following `class`.
struct ClassClause<'t> {
    name: &'t str,
    parent: Option<&'t str>,
    interfaces: Vec<&'t str>,
}

fn parse_class_clause(rest: &str, span: Span) -> Result<ClassClause<'_>> {
    let (head, interfaces) = match names::find_word(rest, "implements") {
        Some(at) => {
            let list = rest[at + "implements".len()..].trim();
            if list.is_empty() {
                return Err(CompilationError::grammar(
                    "expected interface names after 'implements'",
                    span,
                ));
            }
            (rest[..at].trim(), names::split_top_level(list, ','))
        }
        None => (rest.trim(), Vec::new()),
    };

    let mut words = head.split(' ').filter(|w| !w.is_empty());
    let name = words
        .next()
        .ok_or_else(|| CompilationError::grammar("expected class name", span))?;
    names::check_identifier(name, "class", span)?;

    let parent = match words.next() {
        None => None,
        Some("extends") => {
            let parent = words.next().ok_or_else(|| {
                CompilationError::grammar("expected class name after 'extends'", span)
            })?;
            names::check_type_name(parent, span)?;
            Some(parent)
        }
        Some(other) => {
            return Err(CompilationError::grammar(
                format!("unexpected token '{}' in class header", other),
                span,
            ));
        }
    };
    if let Some(extra) = words.next() {
        return Err(CompilationError::grammar(
            format!("unexpected token '{}' in class header", extra),
            span,
        ));
    }
    for interface in &interfaces {
        names::check_type_name(interface, span)?;
    }

    Ok(ClassClause {
        name,
        parent,
        interfaces,
    })
}

/// Parse one file into a class symbol ready for registration.
///
/// The parent may be declared later in the unit and is only checked when
/// the unit is flushed; interfaces must already be registered.
pub fn declare_class(
    registry: &SymbolRegistry,
    options: &CompilerOptions,
    lines: Vec<SourceLine>,
    source_file: Option<&str>,
) -> Result<DeclaredClass> {
    let mut package = String::new();
    let mut imports: Vec<String> = Vec::new();
    let mut class_line = None;

    for (index, line) in lines.into_iter().enumerate() {
        let span = line.span();
        let text = names::normalize_spaces(&line.text);
        if class_line.is_some() {
            return Err(CompilationError::grammar(
                format!("unexpected '{}' after class body", text),
                span,
            ));
        }
        if let Some(rest) = names::strip_keyword(&text, "package") {
            if index != 0 {
                return Err(CompilationError::grammar(
                    "package must be the first declaration",
                    span,
                ));
            }
            names::check_type_name(rest, span)?;
            package = rest.replace('.', "/");
        } else if let Some(rest) = names::strip_keyword(&text, "import") {
            names::check_type_name(rest, span)?;
            let path = rest.replace('.', "/");
            if imports.contains(&path) {
                return Err(CompilationError::duplicate("import", rest, span));
            }
            imports.push(path);
        } else if names::find_word(&text, "class").is_some() {
            class_line = Some((text, line));
        } else {
            return Err(CompilationError::grammar(
                format!("expected class declaration, found '{}'", text),
                span,
            ));
        }
    }

    let (text, line) = class_line
        .ok_or_else(|| CompilationError::grammar("missing class declaration", Span::synthetic()))?;
    let span = line.span();
    let body = line.body.ok_or_else(|| {
        CompilationError::grammar("expected '{' after class header", span)
    })?;

    let at = names::find_word(&text, "class").unwrap_or_default();
    let modifiers = parse_modifiers(&text[..at], ModifierContext::Class, span)?;
    let clause = parse_class_clause(&text[at + "class".len()..], span)?;

    let name = qualify(&package, clause.name);
    if registry.contains(&name) {
        return Err(CompilationError::duplicate("class", name, span));
    }
    let mut symbol = ClassSymbol::new(name, None, modifiers.flags);
    symbol.imports = imports;
    symbol.source_file = source_file.map(str::to_string);

    let parent = match clause.parent {
        Some(parent) => registry.resolve(parent, &symbol).unwrap_or_else(|| {
            symbol
                .imports
                .iter()
                .find(|import| import.rsplit('/').next() == Some(parent))
                .cloned()
                .unwrap_or_else(|| qualify(&symbol.package, parent))
        }),
        None => options.root_parent.clone(),
    };
    if parent == symbol.name {
        return Err(CompilationError::grammar(
            format!("class '{}' cannot extend itself", symbol.simple_name),
            span,
        ));
    }

    let mut interfaces = Vec::new();
    for interface in clause.interfaces {
        if interface.rsplit(['.', '/']).next() == Some("Serializable") {
            return Err(CompilationError::grammar(
                "use the 'serial' keyword instead of implementing Serializable",
                span,
            ));
        }
        let resolved = registry
            .resolve(interface, &symbol)
            .ok_or_else(|| CompilationError::unknown_type(interface, span))?;
        if !registry.is_interface(&resolved) {
            return Err(CompilationError::resolution(
                format!("'{}' is not an interface", interface),
                span,
            ));
        }
        if interfaces.contains(&resolved) {
            return Err(CompilationError::duplicate("interface", interface, span));
        }
        interfaces.push(resolved);
    }
    if modifiers.serial {
        interfaces.push(SERIALIZABLE_CLASS.to_string());
    }

    symbol.parent = Some(parent);
    symbol.interfaces = interfaces;

    Ok(DeclaredClass { symbol, body, span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::split_lines;
    use muesli_core::{AccessFlags, ErrorKind, OBJECT_CLASS};
    use muesli_registry::DEFAULT_BUILTINS;

    fn create_test_registry() -> SymbolRegistry {
        SymbolRegistry::with_builtins(DEFAULT_BUILTINS).unwrap()
    }

    fn declare(source: &str) -> Result<DeclaredClass> {
        let registry = create_test_registry();
        declare_class(
            &registry,
            &CompilerOptions::default(),
            split_lines(source).unwrap(),
            Some("Test.mu"),
        )
    }

    #[test]
    fn minimal_class() {
        let class = declare("class Point {\n}").unwrap();
        assert_eq!(class.symbol.name, "Point");
        assert_eq!(class.symbol.parent.as_deref(), Some(OBJECT_CLASS));
        assert!(class.symbol.modifiers.contains(AccessFlags::SUPER));
        assert_eq!(class.symbol.source_file.as_deref(), Some("Test.mu"));
        assert!(class.body.is_empty());
    }

    #[test]
    fn package_imports_and_clauses() {
        let source = "package geo.shapes\nimport util.Counter\n\
                      public class Circle extends Shape implements Comparable, Runnable {\n}";
        let class = declare(source).unwrap();
        assert_eq!(class.symbol.name, "geo/shapes/Circle");
        assert_eq!(class.symbol.imports, vec!["util/Counter".to_string()]);
        assert_eq!(class.symbol.parent.as_deref(), Some("geo/shapes/Shape"));
        assert_eq!(
            class.symbol.interfaces,
            vec!["java/lang/Comparable".to_string(), "java/lang/Runnable".to_string()]
        );
        assert!(class.symbol.modifiers.contains(AccessFlags::PUBLIC));
    }

    #[test]
    fn parent_from_import() {
        let class = declare("import base.Shape\nclass Circle extends Shape {\n}").unwrap();
        assert_eq!(class.symbol.parent.as_deref(), Some("base/Shape"));
    }

    #[test]
    fn serial_and_sealed() {
        let class = declare("sealed serial class Token {\n}").unwrap();
        assert!(class.symbol.is_final());
        assert_eq!(class.symbol.interfaces, vec![SERIALIZABLE_CLASS.to_string()]);
    }

    #[test]
    fn explicit_serializable_rejected() {
        let err = declare("class Token implements Serializable {\n}").unwrap_err();
        assert!(err.to_string().contains("serial"));
    }

    #[test]
    fn non_interface_rejected() {
        let err = declare("class Token implements String {\n}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        let err = declare("class Token implements Missing {\n}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn header_grammar_errors() {
        for source in [
            "point {\n}",
            "class {\n}",
            "class Point extends {\n}",
            "class Point extends A B {\n}",
            "class Point implements {\n}",
            "class Point inherits A {\n}",
            "public private class Point {\n}",
            "static class Point {\n}",
            "class Point",
            "class Point extends Point {\n}",
            "import a.B\npackage a\nclass Point {\n}",
            "class Point {\n}\nclass Other {\n}",
        ] {
            let err = declare(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Grammar, "{:?}", source);
        }
    }

    #[test]
    fn duplicate_of_registered_class() {
        let mut registry = create_test_registry();
        let first = declare_class(
            &registry,
            &CompilerOptions::default(),
            split_lines("class Point {\n}").unwrap(),
            None,
        )
        .unwrap();
        registry.register(first.symbol).unwrap();
        let err = declare_class(
            &registry,
            &CompilerOptions::default(),
            split_lines("class Point {\n}").unwrap(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }
}
