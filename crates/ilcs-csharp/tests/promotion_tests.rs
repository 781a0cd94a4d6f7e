//! Numeric promotion table tests.

use ilcs_csharp::registry::{arithmetic_result, promote_small, shift_result, widen};
use ilcs_csharp::types::{TypeId, TypeInterner};

#[test]
fn small_integers_promote_to_int() {
    let interner = TypeInterner::new();
    assert_eq!(promote_small(&interner, TypeId::BYTE), TypeId::INT);
    assert_eq!(promote_small(&interner, TypeId::SBYTE), TypeId::INT);
    assert_eq!(promote_small(&interner, TypeId::SHORT), TypeId::INT);
    assert_eq!(promote_small(&interner, TypeId::USHORT), TypeId::INT);
    assert_eq!(promote_small(&interner, TypeId::CHAR), TypeId::INT);
    // 32-bit and wider pass through.
    assert_eq!(promote_small(&interner, TypeId::UINT), TypeId::UINT);
    assert_eq!(promote_small(&interner, TypeId::LONG), TypeId::LONG);
}

#[test]
fn byte_plus_byte_is_int() {
    // C# widens byte ⊕ byte to int; this is why pushed byte-array
    // elements always need a cast back down.
    let interner = TypeInterner::new();
    assert_eq!(
        arithmetic_result(&interner, TypeId::BYTE, TypeId::BYTE).unwrap(),
        TypeId::INT
    );
}

#[test]
fn mixed_same_width_promotes_to_next_wider_signed() {
    let interner = TypeInterner::new();
    assert_eq!(
        arithmetic_result(&interner, TypeId::UINT, TypeId::INT).unwrap(),
        TypeId::LONG
    );
    // At 64 bits there is nothing wider; the pair collapses to long.
    assert_eq!(
        arithmetic_result(&interner, TypeId::ULONG, TypeId::LONG).unwrap(),
        TypeId::LONG
    );
}

#[test]
fn unsigned_fits_wider_signed() {
    let interner = TypeInterner::new();
    assert_eq!(
        arithmetic_result(&interner, TypeId::UINT, TypeId::LONG).unwrap(),
        TypeId::LONG
    );
    assert_eq!(
        arithmetic_result(&interner, TypeId::BYTE, TypeId::INT).unwrap(),
        TypeId::INT
    );
}

#[test]
fn float_widening() {
    let interner = TypeInterner::new();
    assert_eq!(
        arithmetic_result(&interner, TypeId::INT, TypeId::DOUBLE).unwrap(),
        TypeId::DOUBLE
    );
    assert_eq!(
        arithmetic_result(&interner, TypeId::FLOAT, TypeId::DOUBLE).unwrap(),
        TypeId::DOUBLE
    );
    assert_eq!(
        arithmetic_result(&interner, TypeId::UINT, TypeId::FLOAT).unwrap(),
        TypeId::FLOAT
    );
}

#[test]
fn string_concatenation_wins() {
    let interner = TypeInterner::new();
    assert_eq!(
        arithmetic_result(&interner, TypeId::STRING, TypeId::UINT).unwrap(),
        TypeId::STRING
    );
    assert_eq!(
        arithmetic_result(&interner, TypeId::DOUBLE, TypeId::STRING).unwrap(),
        TypeId::STRING
    );
}

#[test]
fn shift_keeps_promoted_left_operand() {
    let interner = TypeInterner::new();
    assert_eq!(shift_result(&interner, TypeId::UINT), TypeId::UINT);
    assert_eq!(shift_result(&interner, TypeId::BYTE), TypeId::INT);
    assert_eq!(shift_result(&interner, TypeId::ULONG), TypeId::ULONG);
}

#[test]
fn widen_same_array_is_identity() {
    let interner = TypeInterner::new();
    assert_eq!(
        widen(&interner, TypeId::BYTE_ARRAY, TypeId::BYTE_ARRAY).unwrap(),
        TypeId::BYTE_ARRAY
    );
}

#[test]
fn widen_arrays_widens_elements() {
    let interner = TypeInterner::new();
    let long_array = interner.array_of(TypeId::LONG);
    assert_eq!(
        widen(&interner, TypeId::INT_ARRAY, long_array).unwrap(),
        long_array
    );
}
