//! Modifier keyword parsing.
//!
//! Every declaration may be preceded by modifier keywords. Which keywords
//! are accepted depends on what is being declared:
//!
//! | keyword                          | class | constructor | method | field |
//! |----------------------------------|-------|-------------|--------|-------|
//! | `public` `private` `protected`   | yes   | yes         | yes    | yes   |
//! | `static`                         |       |             | yes    | yes   |
//! | `abstract`                       | yes   |             | yes    |       |
//! | `sealed` (final)                 | yes   |             |        |       |
//! | `serial`                         | yes   |             |        |       |

use muesli_core::{AccessFlags, CompilationError, Result, Span};

/// What the modifiers apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierContext {
    Class,
    Constructor,
    Method,
    Field,
}

/// Parsed modifier keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub flags: AccessFlags,
    /// `serial` was given; the class implements the serialization marker.
    pub serial: bool,
}

fn allowed(context: ModifierContext, keyword: &str) -> bool {
    match keyword {
        "public" | "private" | "protected" => true,
        "static" => matches!(context, ModifierContext::Method | ModifierContext::Field),
        "abstract" => matches!(context, ModifierContext::Class | ModifierContext::Method),
        "sealed" | "serial" => context == ModifierContext::Class,
        _ => false,
    }
}

/// Parse the whitespace-separated keywords in `words`.
///
/// Classes always carry the `SUPER` flag.
pub fn parse_modifiers(words: &str, context: ModifierContext, span: Span) -> Result<Modifiers> {
    let mut modifiers = Modifiers::default();
    if context == ModifierContext::Class {
        modifiers.flags |= AccessFlags::SUPER;
    }
    let mut used: Vec<&str> = Vec::new();

    for keyword in words.split_whitespace() {
        if used.contains(&keyword) {
            return Err(CompilationError::grammar(
                format!("duplicate keyword '{}'", keyword),
                span,
            ));
        }
        if !allowed(context, keyword) {
            return Err(CompilationError::grammar(
                format!("unexpected keyword '{}'", keyword),
                span,
            ));
        }
        let flag = match keyword {
            "public" => AccessFlags::PUBLIC,
            "private" => AccessFlags::PRIVATE,
            "protected" => AccessFlags::PROTECTED,
            "static" => AccessFlags::STATIC,
            "abstract" => AccessFlags::ABSTRACT,
            "sealed" => AccessFlags::FINAL,
            _ => AccessFlags::empty(),
        };
        if flag.intersects(AccessFlags::VISIBILITY) && modifiers.flags.has_visibility() {
            return Err(CompilationError::grammar(
                "cannot have multiple access modifiers",
                span,
            ));
        }
        modifiers.flags |= flag;
        if keyword == "serial" {
            modifiers.serial = true;
        }
        used.push(keyword);
    }

    let flags = modifiers.flags;
    if flags.is_abstract() && flags.is_private() {
        return Err(CompilationError::grammar(
            "abstract members cannot be private",
            span,
        ));
    }
    if flags.is_abstract() && flags.is_final() {
        return Err(CompilationError::grammar(
            "a class cannot be both abstract and sealed",
            span,
        ));
    }
    if flags.is_abstract() && flags.is_static() {
        return Err(CompilationError::grammar(
            "static methods cannot be abstract",
            span,
        ));
    }
    Ok(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(words: &str, context: ModifierContext) -> Result<Modifiers> {
        parse_modifiers(words, context, Span::new(1))
    }

    #[test]
    fn class_keywords() {
        let m = parse("public sealed serial", ModifierContext::Class).unwrap();
        assert_eq!(
            m.flags,
            AccessFlags::SUPER | AccessFlags::PUBLIC | AccessFlags::FINAL
        );
        assert!(m.serial);
        assert_eq!(parse("", ModifierContext::Class).unwrap().flags, AccessFlags::SUPER);
    }

    #[test]
    fn duplicate_keyword_rejected() {
        let err = parse("public public", ModifierContext::Method).unwrap_err();
        assert!(err.to_string().contains("duplicate keyword 'public'"));
    }

    #[test]
    fn access_modifiers_are_exclusive() {
        let err = parse("public private", ModifierContext::Field).unwrap_err();
        assert!(err.to_string().contains("multiple access modifiers"));
    }

    #[test]
    fn abstract_private_rejected_in_either_order() {
        assert!(parse("abstract private", ModifierContext::Method).is_err());
        assert!(parse("private abstract", ModifierContext::Method).is_err());
    }

    #[test]
    fn constructor_allows_only_visibility() {
        assert!(parse("private", ModifierContext::Constructor).is_ok());
        assert!(parse("static", ModifierContext::Constructor).is_err());
        assert!(parse("abstract", ModifierContext::Constructor).is_err());
    }

    #[test]
    fn unknown_keyword_rejected() {
        let err = parse("public inline", ModifierContext::Method).unwrap_err();
        assert!(err.to_string().contains("unexpected keyword 'inline'"));
        assert!(parse("sealed", ModifierContext::Field).is_err());
    }
}
