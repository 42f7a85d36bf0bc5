//! Integration tests for muesli using Unit as the entry point.
//!
//! These tests build complete classes from `test_scripts/` and check the
//! emitted artifacts: headers, descriptors, instructions and the stack and
//! slot accounting of every method.

use muesli::{AccessFlags, BuildError, CompilerOptions, ErrorKind, LiteralValue, OpCode, Unit};
use std::path::PathBuf;

/// Load a test script from the test_scripts directory.
fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Build a unit from the given test scripts, in order.
fn build_scripts(filenames: &[&str]) -> Unit {
    let mut unit = Unit::new();
    for filename in filenames {
        unit.add_source(*filename, load_script(filename))
            .expect("Failed to add source");
    }
    unit.build().expect("Failed to build unit");
    unit
}

/// Build a single script that must fail, returning the error category.
fn build_error(filename: &str) -> ErrorKind {
    let mut unit = Unit::new();
    unit.add_source(filename, load_script(filename))
        .expect("Failed to add source");
    let err = unit.build().expect_err("build should fail");
    assert_eq!(unit.class_count(), 0);
    err.compilation_error()
        .unwrap_or_else(|| panic!("unexpected error {:?}", err))
        .kind()
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn test_constructor_parameter_slots() {
    let unit = build_scripts(&["point.mu"]);
    let point = unit.class("geo/Point").unwrap();
    assert_eq!(point.header.parent.as_deref(), Some("java/lang/Object"));
    assert_eq!(point.header.source_file.as_deref(), Some("point.mu"));

    let ctor = point.method("<init>", "(II)V").unwrap();
    assert!(ctor.modifiers.contains(AccessFlags::PUBLIC));
    assert_eq!(ctor.local("this").unwrap().slot, 0);
    assert_eq!(ctor.local("x").unwrap().slot, 1);
    assert_eq!(ctor.local("y").unwrap().slot, 2);
    assert_eq!(ctor.max_locals, 3);
    assert_eq!(ctor.max_stack, 1);
    ctor.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Invokespecial,
        OpCode::Return,
    ]);
    // an explicit constructor suppresses the default one
    assert_eq!(point.methods_named("<init>").count(), 1);
}

#[test]
fn test_default_constructor_stores_field_default() {
    let unit = build_scripts(&["circle.mu"]);
    let circle = unit.class("geo/Circle").unwrap();
    let ctor = circle.method("<init>", "()V").unwrap();
    assert!(ctor.modifiers.contains(AccessFlags::PUBLIC));
    ctor.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Invokespecial,
        OpCode::Aload0,
        OpCode::Dconst1,
        OpCode::Putfield,
        OpCode::Return,
    ]);
    assert_eq!(ctor.max_stack, 2);
    assert_eq!(ctor.max_locals, 1);
    assert_eq!(circle.field("radius").unwrap().descriptor, "D");
}

#[test]
fn test_missing_super_call() {
    assert_eq!(build_error("errors/missing_super.mu"), ErrorKind::Protocol);
}

#[test]
fn test_double_super_call() {
    assert_eq!(build_error("errors/double_super.mu"), ErrorKind::Protocol);
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_inferred_local_and_return() {
    let unit = build_scripts(&["greeting.mu"]);
    let greeting = unit.class("Greeting").unwrap();

    let greet = greeting.method("greet", "()Ljava/lang/String;").unwrap();
    greet.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Ldc,
        OpCode::Astore1,
        OpCode::Aload1,
        OpCode::Areturn,
    ]);
    let name = greet.local("name").unwrap();
    assert_eq!(name.slot, 1);
    assert_eq!(name.descriptor, "Ljava/lang/String;");
    assert_eq!(greet.max_locals, 2);

    let answer = greeting.method("answer", "()J").unwrap();
    assert!(answer.modifiers.contains(AccessFlags::STATIC));
    answer.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Ldc2W,
        OpCode::Lstore0,
        OpCode::Lload0,
        OpCode::Lreturn,
    ]);
    assert_eq!(answer.max_locals, 1);
}

#[test]
fn test_return_type_mismatch() {
    assert_eq!(build_error("errors/return_mismatch.mu"), ErrorKind::Type);
}

#[test]
fn test_boolean_into_int() {
    assert_eq!(build_error("errors/bool_into_int.mu"), ErrorKind::Type);
}

#[test]
fn test_untyped_declaration_without_value() {
    assert_eq!(build_error("errors/untyped_var.mu"), ErrorKind::Resolution);
}

#[test]
fn test_missing_return() {
    assert_eq!(build_error("errors/missing_return.mu"), ErrorKind::Protocol);
}

// =============================================================================
// Multi-file units
// =============================================================================

#[test]
fn test_forward_reference_across_files() {
    let unit = build_scripts(&["library.mu", "counter.mu"]);
    assert_eq!(unit.class_count(), 2);
    assert_eq!(unit.classes()[0].name(), "app/Library");

    let library = unit.class("app/Library").unwrap();
    assert_eq!(library.field("counter").unwrap().descriptor, "Lutil/Counter;");

    let ctor = library.method("<init>", "(Lutil/Counter;)V").unwrap();
    ctor.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Ldc2W,
        OpCode::Putfield,
        OpCode::Aload0,
        OpCode::Invokespecial,
        OpCode::Aload0,
        OpCode::Aload1,
        OpCode::Putfield,
        OpCode::Return,
    ]);
    assert_eq!(ctor.max_stack, 2);

    let count = library.method("count", "()I").unwrap();
    count.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Getfield,
        OpCode::Invokevirtual,
        OpCode::Ireturn,
    ]);

    let limit = library.method("limit", "()I").unwrap();
    limit.code.as_ref().unwrap().assert_opcodes(&[OpCode::Invokestatic, OpCode::Ireturn]);
}

#[test]
fn test_static_constant_field() {
    let unit = build_scripts(&["library.mu", "counter.mu"]);
    let counter = unit.class("util/Counter").unwrap();
    let field = counter.field("LIMIT").unwrap();
    assert_eq!(field.constant_value, Some(LiteralValue::Int(100)));
    assert!(field.modifiers.contains(AccessFlags::STATIC | AccessFlags::FINAL));

    // constants are not initialized by constructors
    let ctor = counter.method("<init>", "()V").unwrap();
    ctor.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Invokespecial,
        OpCode::Return,
    ]);

    let limit = counter.method("limit", "()I").unwrap();
    limit.code.as_ref().unwrap().assert_opcodes(&[OpCode::Getstatic, OpCode::Ireturn]);
}

#[test]
fn test_inheritance_and_abstract_members() {
    let unit = build_scripts(&["square.mu", "shape.mu"]);

    let shape = unit.class("Shape").unwrap();
    assert!(shape.header.modifiers.contains(AccessFlags::ABSTRACT));
    let area = shape.method("area", "()D").unwrap();
    assert!(area.code.is_none());

    let square = unit.class("Square").unwrap();
    assert_eq!(square.header.parent.as_deref(), Some("Shape"));
    assert_eq!(square.header.interfaces, vec!["java/io/Serializable".to_string()]);
    assert!(square.header.modifiers.contains(AccessFlags::FINAL));

    let ctor = square.method("<init>", "(I)V").unwrap();
    ctor.code.as_ref().unwrap().assert_opcodes(&[
        OpCode::Aload0,
        OpCode::Invokespecial,
        OpCode::Aload0,
        OpCode::Iload1,
        OpCode::I2d,
        OpCode::Putfield,
        OpCode::Return,
    ]);
}

#[test]
fn test_duplicate_class() {
    let mut unit = Unit::new();
    unit.add_source("a.mu", "class Dup {\n}").unwrap();
    unit.add_source("b.mu", "class Dup {\n}").unwrap();
    let err = unit.build().unwrap_err();
    assert!(matches!(err, BuildError::Declaration { ref file, .. } if file == "b.mu"));
    assert_eq!(err.compilation_error().unwrap().kind(), ErrorKind::Duplicate);
}

#[test]
fn test_without_debug_info() {
    let mut unit = Unit::with_options(CompilerOptions::default().with_debug_info(false));
    unit.add_source("point.mu", load_script("point.mu")).unwrap();
    unit.build().unwrap();
    let ctor = unit.class("geo/Point").unwrap().method("<init>", "(II)V").unwrap();
    assert!(ctor.local_variables.is_empty());
    assert!(ctor.line_numbers().is_empty());
    assert_eq!(ctor.max_locals, 3);
}
