//! Preloaded platform classes.
//!
//! The compiler never sees source for these; they exist so user classes can
//! extend, implement and call into them. Only the members the compiler
//! needs to type-check against are described.

use muesli_core::{
    AccessFlags, ClassSymbol, Descriptor, MethodSymbol, OBJECT_CLASS, Param, PrimitiveKind,
    SERIALIZABLE_CLASS, STRING_CLASS,
};

/// Platform classes loaded when no explicit list is configured.
pub const DEFAULT_BUILTINS: &[&str] = &[
    OBJECT_CLASS,
    STRING_CLASS,
    SERIALIZABLE_CLASS,
    "java/lang/Comparable",
    "java/lang/CharSequence",
    "java/lang/Runnable",
    "java/lang/Cloneable",
    "java/lang/Number",
];

fn class_flags() -> AccessFlags {
    AccessFlags::PUBLIC | AccessFlags::SUPER
}

fn interface_flags() -> AccessFlags {
    AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT
}

fn constructor(params: &[(&str, Descriptor)]) -> MethodSymbol {
    let mut ctor = MethodSymbol::constructor(AccessFlags::PUBLIC);
    set_params(&mut ctor, params);
    ctor
}

fn method(name: &str, params: &[(&str, Descriptor)], ret: Descriptor) -> MethodSymbol {
    let mut method = MethodSymbol::new(name, ret, AccessFlags::PUBLIC);
    set_params(&mut method, params);
    method
}

fn interface_method(name: &str, params: &[(&str, Descriptor)], ret: Descriptor) -> MethodSymbol {
    let mut method = method(name, params, ret);
    method.modifiers |= AccessFlags::ABSTRACT;
    method.interface_method = true;
    method
}

fn set_params(method: &mut MethodSymbol, params: &[(&str, Descriptor)]) {
    let params = params
        .iter()
        .map(|(name, desc)| Param::new(*name, desc.clone()))
        .collect();
    // builtin parameter names are distinct
    let _ = method.set_parameters(params);
}

fn with_methods(mut class: ClassSymbol, methods: Vec<MethodSymbol>) -> ClassSymbol {
    for method in methods {
        // builtin member names are distinct
        let _ = class.add_method(method);
    }
    class
}

/// Describe the builtin class `name`, if it is one.
pub fn builtin_class(name: &str) -> Option<ClassSymbol> {
    let object = Descriptor::root_object;
    let string = Descriptor::string;
    let int = || Descriptor::INT;
    let boolean = || Descriptor::BOOLEAN;

    let class = match name {
        OBJECT_CLASS => with_methods(
            ClassSymbol::builtin(OBJECT_CLASS, None, class_flags()),
            vec![
                constructor(&[]),
                method("hashCode", &[], int()),
                method("toString", &[], string()),
                method("equals", &[("other", object())], boolean()),
            ],
        ),
        STRING_CLASS => with_methods(
            ClassSymbol::builtin(
                STRING_CLASS,
                Some(OBJECT_CLASS),
                class_flags() | AccessFlags::FINAL,
            )
            .with_interfaces([SERIALIZABLE_CLASS, "java/lang/Comparable", "java/lang/CharSequence"]),
            vec![
                constructor(&[]),
                method("length", &[], int()),
                method("isEmpty", &[], boolean()),
                method("concat", &[("other", string())], string()),
                method("charAt", &[("index", int())], Descriptor::Primitive(PrimitiveKind::Char)),
            ],
        ),
        SERIALIZABLE_CLASS | "java/lang/Cloneable" => {
            ClassSymbol::builtin(name, Some(OBJECT_CLASS), interface_flags())
        }
        "java/lang/Comparable" => with_methods(
            ClassSymbol::builtin(name, Some(OBJECT_CLASS), interface_flags()),
            vec![interface_method("compareTo", &[("other", object())], int())],
        ),
        "java/lang/CharSequence" => with_methods(
            ClassSymbol::builtin(name, Some(OBJECT_CLASS), interface_flags()),
            vec![interface_method("length", &[], int())],
        ),
        "java/lang/Runnable" => with_methods(
            ClassSymbol::builtin(name, Some(OBJECT_CLASS), interface_flags()),
            vec![interface_method("run", &[], Descriptor::VOID)],
        ),
        "java/lang/Number" => with_methods(
            ClassSymbol::builtin(
                name,
                Some(OBJECT_CLASS),
                class_flags() | AccessFlags::ABSTRACT,
            )
            .with_interfaces([SERIALIZABLE_CLASS]),
            vec![
                constructor(&[]),
                method("intValue", &[], int()),
                method("longValue", &[], Descriptor::LONG),
                method("doubleValue", &[], Descriptor::DOUBLE),
            ],
        ),
        _ => return None,
    };
    Some(class)
}
