//! Narrowing-conversion table tests.

use ilcs_csharp::ast::{CsExpr, CsLiteral};
use ilcs_csharp::registry::{default_value, is_implicit, needs_cast_at_call, needs_narrow};
use ilcs_csharp::types::{TypeId, TypeInterner};

#[test]
fn wider_to_narrower_needs_cast() {
    let interner = TypeInterner::new();
    assert!(needs_narrow(&interner, TypeId::INT, TypeId::BYTE));
    assert!(needs_narrow(&interner, TypeId::LONG, TypeId::INT));
    assert!(needs_narrow(&interner, TypeId::ULONG, TypeId::UINT));
    assert!(needs_narrow(&interner, TypeId::INT, TypeId::SHORT));
}

#[test]
fn equal_width_sign_change_needs_cast() {
    let interner = TypeInterner::new();
    assert!(needs_narrow(&interner, TypeId::INT, TypeId::UINT));
    assert!(needs_narrow(&interner, TypeId::UINT, TypeId::INT));
    assert!(needs_narrow(&interner, TypeId::LONG, TypeId::ULONG));
    assert!(needs_narrow(&interner, TypeId::ULONG, TypeId::LONG));
    assert!(needs_narrow(&interner, TypeId::BYTE, TypeId::SBYTE));
}

#[test]
fn widening_is_implicit() {
    let interner = TypeInterner::new();
    assert!(!needs_narrow(&interner, TypeId::BYTE, TypeId::USHORT));
    assert!(!needs_narrow(&interner, TypeId::UINT, TypeId::ULONG));
    assert!(!needs_narrow(&interner, TypeId::INT, TypeId::LONG));
    assert!(!needs_narrow(&interner, TypeId::BYTE, TypeId::INT));
    assert!(!needs_narrow(&interner, TypeId::UINT, TypeId::LONG));
    assert!(!needs_narrow(&interner, TypeId::FLOAT, TypeId::DOUBLE));
    assert!(!needs_narrow(&interner, TypeId::INT, TypeId::DOUBLE));
}

#[test]
fn signed_to_unsigned_is_never_implicit() {
    let interner = TypeInterner::new();
    assert!(!is_implicit(&interner, TypeId::INT, TypeId::ULONG));
    assert!(needs_narrow(&interner, TypeId::INT, TypeId::ULONG));
}

#[test]
fn float_to_integer_needs_cast() {
    let interner = TypeInterner::new();
    assert!(needs_narrow(&interner, TypeId::DOUBLE, TypeId::INT));
    assert!(needs_narrow(&interner, TypeId::DOUBLE, TypeId::FLOAT));
}

#[test]
fn object_argument_needs_cast_at_call() {
    let interner = TypeInterner::new();
    assert!(needs_cast_at_call(&interner, TypeId::DYNAMIC, TypeId::UINT));
    assert!(!needs_cast_at_call(&interner, TypeId::UINT, TypeId::DYNAMIC));
    assert!(!needs_cast_at_call(&interner, TypeId::UINT, TypeId::UINT));
}

#[test]
fn mismatched_array_argument_needs_cast_at_call() {
    let interner = TypeInterner::new();
    assert!(needs_cast_at_call(
        &interner,
        TypeId::BYTE_ARRAY,
        TypeId::UINT_ARRAY
    ));
    assert!(!needs_cast_at_call(
        &interner,
        TypeId::BYTE_ARRAY,
        TypeId::BYTE_ARRAY
    ));
}

#[test]
fn default_values() {
    let interner = TypeInterner::new();
    assert_eq!(
        default_value(&interner, TypeId::UINT),
        CsExpr::Literal {
            value: CsLiteral::UInt(0),
            ty: TypeId::UINT
        }
    );
    assert_eq!(default_value(&interner, TypeId::BOOL), CsExpr::bool(false));
    assert_eq!(default_value(&interner, TypeId::BYTE_ARRAY), CsExpr::null());
    assert_eq!(default_value(&interner, TypeId::STRING), CsExpr::null());
}
