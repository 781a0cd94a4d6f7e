//! Numeric promotion and conversion rules.
//!
//! This module is the single authority on which conversions C# performs
//! implicitly and which require an explicit cast in emitted code. The
//! transformer never hand-rolls a width comparison; it asks here.
//!
//! The promotion rules implemented exactly:
//! - 8/16-bit integers (and `char`) promote to `int` for arithmetic,
//!   bitwise and shift operators.
//! - Mixed same-width signed+unsigned promotes to the next-wider signed
//!   type (`uint ⊕ int → long`). At 64 bits there is nothing wider, so
//!   the pair collapses to `long`.
//! - A shift amount is always `int`; the result keeps the promoted left
//!   operand's type.
//! - `string + anything → string`.

use crate::ast::{CsExpr, CsLiteral};
use crate::types::{CsType, PrimitiveKind, TypeId, TypeInterner};

/// A type-registry invariant violation. The transformer converts this
/// into a fatal diagnostic and aborts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeError {
    pub message: String,
}

impl TypeError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

/// Promote 8/16-bit integers (and `char`) to `int`, as C# does for every
/// arithmetic, bitwise and shift operand. Wider types pass through.
pub fn promote_small(interner: &TypeInterner, ty: TypeId) -> TypeId {
    match interner.primitive(ty) {
        Some(kind) if kind.is_integer() || kind == PrimitiveKind::Char => {
            if kind.width().unwrap_or(32) < 32 {
                TypeId::INT
            } else {
                ty
            }
        }
        _ => ty,
    }
}

/// The type a shift expression produces: the promoted left operand.
pub fn shift_result(interner: &TypeInterner, left: TypeId) -> TypeId {
    let promoted = promote_small(interner, left);
    if interner.is_integer(promoted) {
        promoted
    } else {
        TypeId::INT
    }
}

/// The least common type of two operands. Commutative.
///
/// `Dynamic` and `Var` yield to the other side; mixing an array with a
/// primitive is an invariant violation and errors out.
pub fn widen(interner: &TypeInterner, a: TypeId, b: TypeId) -> Result<TypeId, TypeError> {
    if a == b {
        return Ok(a);
    }
    if a == TypeId::DYNAMIC || a == TypeId::VAR {
        return Ok(b);
    }
    if b == TypeId::DYNAMIC || b == TypeId::VAR {
        return Ok(a);
    }

    let ta = interner.lookup(a);
    let tb = interner.lookup(b);
    match (&ta, &tb) {
        (CsType::Primitive(ka), CsType::Primitive(kb)) => Ok(widen_primitives(*ka, *kb)),
        (CsType::Array { elem: ea, jagged: ja }, CsType::Array { elem: eb, jagged: jb }) => {
            if ja != jb {
                return Err(TypeError::new(format!(
                    "cannot widen jagged array {} with flat array {}",
                    interner.display(a),
                    interner.display(b)
                )));
            }
            let elem = widen(interner, *ea, *eb)?;
            Ok(if *ja {
                interner.jagged_of(elem)
            } else {
                interner.array_of(elem)
            })
        }
        (CsType::Array { .. }, _) | (_, CsType::Array { .. }) => Err(TypeError::new(format!(
            "cannot widen array type {} with non-array {}",
            interner.display(a),
            interner.display(b)
        ))),
        (CsType::Void, _) | (_, CsType::Void) => Err(TypeError::new(
            "void participates in no widening".to_string(),
        )),
        (CsType::Nullable(ia), _) => {
            let inner = widen(interner, *ia, b)?;
            Ok(interner.nullable_of(inner))
        }
        (_, CsType::Nullable(ib)) => {
            let inner = widen(interner, a, *ib)?;
            Ok(interner.nullable_of(inner))
        }
        // Structurally different tuples or generics have no common C#
        // shape; fall back to object.
        _ => Ok(TypeId::DYNAMIC),
    }
}

fn widen_primitives(a: PrimitiveKind, b: PrimitiveKind) -> TypeId {
    use PrimitiveKind::*;
    if a == String || b == String {
        return TypeId::STRING;
    }
    if a == Bool {
        return primitive_id(b);
    }
    if b == Bool {
        return primitive_id(a);
    }
    if a == Double || b == Double {
        return TypeId::DOUBLE;
    }
    if a == Float || b == Float {
        return TypeId::FLOAT;
    }

    // Both integers (char counts as an unsigned 16-bit unit).
    let (wa, sa) = (a.width().unwrap_or(32), a.signed().unwrap_or(true));
    let (wb, sb) = (b.width().unwrap_or(32), b.signed().unwrap_or(true));
    let kind = if sa == sb {
        PrimitiveKind::integer(wa.max(wb), sa)
    } else {
        let (sw, uw) = if sa { (wa, wb) } else { (wb, wa) };
        if uw < sw {
            // The signed type fully contains the unsigned one.
            PrimitiveKind::integer(sw, true)
        } else if uw == sw {
            // Same width, mixed signedness: next wider signed. 64-bit
            // pairs collapse to long, there is nothing wider.
            PrimitiveKind::integer((uw * 2).min(64), true)
        } else {
            PrimitiveKind::integer(uw, false)
        }
    };
    primitive_id(kind)
}

fn primitive_id(kind: PrimitiveKind) -> TypeId {
    match kind {
        PrimitiveKind::Bool => TypeId::BOOL,
        PrimitiveKind::Char => TypeId::CHAR,
        PrimitiveKind::SByte => TypeId::SBYTE,
        PrimitiveKind::Byte => TypeId::BYTE,
        PrimitiveKind::Short => TypeId::SHORT,
        PrimitiveKind::UShort => TypeId::USHORT,
        PrimitiveKind::Int => TypeId::INT,
        PrimitiveKind::UInt => TypeId::UINT,
        PrimitiveKind::Long => TypeId::LONG,
        PrimitiveKind::ULong => TypeId::ULONG,
        PrimitiveKind::Float => TypeId::FLOAT,
        PrimitiveKind::Double => TypeId::DOUBLE,
        PrimitiveKind::String => TypeId::STRING,
    }
}

/// The type of `a op b` for arithmetic and non-shift bitwise operators:
/// promote small operands, then widen.
pub fn arithmetic_result(
    interner: &TypeInterner,
    a: TypeId,
    b: TypeId,
) -> Result<TypeId, TypeError> {
    let pa = interner.primitive(a);
    let pb = interner.primitive(b);
    if pa == Some(PrimitiveKind::String) || pb == Some(PrimitiveKind::String) {
        return Ok(TypeId::STRING);
    }
    widen(
        interner,
        promote_small(interner, a),
        promote_small(interner, b),
    )
}

/// Whether C# converts `from` to `to` without a cast.
pub fn is_implicit(interner: &TypeInterner, from: TypeId, to: TypeId) -> bool {
    if from == to || to == TypeId::DYNAMIC || to == TypeId::VAR {
        return true;
    }
    if from == TypeId::DYNAMIC || from == TypeId::VAR {
        return false;
    }
    let (Some(kf), Some(kt)) = (interner.primitive(from), interner.primitive(to)) else {
        // Nullable lifting T -> T? is free.
        if let CsType::Nullable(inner) = interner.lookup(to) {
            return is_implicit(interner, from, inner);
        }
        return false;
    };
    if !kf.is_numeric() && kf != PrimitiveKind::Char {
        return false;
    }
    if kt == PrimitiveKind::Float || kt == PrimitiveKind::Double {
        // Integer -> float family and float -> double widen implicitly.
        return kf != PrimitiveKind::Double || kt == PrimitiveKind::Double;
    }
    if kf.is_float() {
        return false;
    }
    let (wf, sf) = (kf.width().unwrap_or(32), kf.signed().unwrap_or(false));
    let (Some(wt), Some(st)) = (kt.width(), kt.signed().or(Some(false))) else {
        return false;
    };
    if !kt.is_integer() && kt != PrimitiveKind::Char {
        return false;
    }
    if sf == st {
        return wt >= wf && kt != PrimitiveKind::Char;
    }
    // Unsigned fits into any strictly wider signed type; signed never
    // fits into unsigned without a cast.
    !sf && st && wt > wf
}

/// Whether assigning `from` into a slot of type `to` requires an explicit
/// narrowing cast.
pub fn needs_narrow(interner: &TypeInterner, from: TypeId, to: TypeId) -> bool {
    if from == to {
        return false;
    }
    let (Some(kf), Some(kt)) = (interner.primitive(from), interner.primitive(to)) else {
        return false;
    };
    if !(kf.is_numeric() || kf == PrimitiveKind::Char)
        || !(kt.is_numeric() || kt == PrimitiveKind::Char)
    {
        return false;
    }
    !is_implicit(interner, from, to)
}

/// Whether passing a `from`-typed argument to a `to`-typed parameter
/// requires a cast. Stricter than `needs_narrow`: an `object`-typed
/// argument also needs casting down to a concrete parameter type, and so
/// does an array of the wrong element type.
pub fn needs_cast_at_call(interner: &TypeInterner, from: TypeId, to: TypeId) -> bool {
    if to == TypeId::VAR {
        return false;
    }
    !is_implicit(interner, from, to)
}

/// The C# default value expression for a type: `0`, `false`, `'\0'`,
/// `null`, or `default` for tuples.
pub fn default_value(interner: &TypeInterner, ty: TypeId) -> CsExpr {
    match interner.lookup(ty) {
        CsType::Primitive(kind) => match kind {
            PrimitiveKind::Bool => CsExpr::bool(false),
            PrimitiveKind::Char => CsExpr::Literal {
                value: CsLiteral::Char('\0'),
                ty: TypeId::CHAR,
            },
            PrimitiveKind::Float | PrimitiveKind::Double => CsExpr::Literal {
                value: CsLiteral::Float(0.0),
                ty,
            },
            PrimitiveKind::String => CsExpr::null(),
            k if k.signed() == Some(false) => CsExpr::Literal {
                value: CsLiteral::UInt(0),
                ty,
            },
            _ => CsExpr::Literal {
                value: CsLiteral::Int(0),
                ty,
            },
        },
        CsType::Array { .. } | CsType::Generic { .. } | CsType::Nullable(_) | CsType::Dynamic => {
            CsExpr::null()
        }
        CsType::Tuple(_) | CsType::Void | CsType::Var => CsExpr::Default(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_is_commutative() {
        let interner = TypeInterner::new();
        for a in [TypeId::BYTE, TypeId::INT, TypeId::UINT, TypeId::LONG] {
            for b in [TypeId::BYTE, TypeId::INT, TypeId::UINT, TypeId::DOUBLE] {
                assert_eq!(
                    widen(&interner, a, b).unwrap(),
                    widen(&interner, b, a).unwrap(),
                    "widen({a:?}, {b:?})"
                );
            }
        }
    }

    #[test]
    fn widen_array_with_primitive_is_invariant_violation() {
        let interner = TypeInterner::new();
        assert!(widen(&interner, TypeId::BYTE_ARRAY, TypeId::UINT).is_err());
        assert!(widen(&interner, TypeId::UINT, TypeId::BYTE_ARRAY).is_err());
    }

    #[test]
    fn dynamic_yields_to_the_other_side() {
        let interner = TypeInterner::new();
        assert_eq!(widen(&interner, TypeId::DYNAMIC, TypeId::UINT).unwrap(), TypeId::UINT);
        assert_eq!(
            widen(&interner, TypeId::BYTE_ARRAY, TypeId::DYNAMIC).unwrap(),
            TypeId::BYTE_ARRAY
        );
    }
}
