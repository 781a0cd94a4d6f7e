//! Expression type inference.
//!
//! A pure mapping from IL expressions to C# types. Signals are applied in
//! strength order: literal shapes, then operator promotion rules, then
//! registered variables/signatures, then member and call tables, and only
//! when everything else is silent the crypto name heuristics with their
//! unsigned-32 default.
//!
//! Inference never emits warnings itself; the transformers decide what is
//! worth surfacing. The only failure mode is a type-registry invariant
//! violation, which aborts the whole pass.

use ilcs_common::Fatal;
use ilcs_csharp::registry::{arithmetic_result, promote_small, shift_result, widen};
use ilcs_csharp::types::{CsType, TypeId};
use ilcs_il::{
    BinaryOp, IlMemberProperty, IlNode, IlValue, LogicalOp, MathFunc, NumberConst, NumericKind,
    UnaryOp,
};

use crate::context::TransformContext;

/// Names that mean "byte array" in crypto sources.
const BYTE_ARRAY_NAMES: &[&str] = &[
    "key",
    "data",
    "input",
    "output",
    "block",
    "bytes",
    "buffer",
    "counter",
    "nonce",
    "tag",
    "digest",
    "ciphertext",
    "plaintext",
];

/// Names that mean "int" when nothing stronger is known.
const INT_NAMES: &[&str] = &["index", "position", "length", "count", "size"];

/// The name-based fallback, used only when no stronger signal exists.
/// The final default is `uint`: the dominant idiom of the input corpus.
pub fn name_heuristic(name: &str) -> TypeId {
    let lower = name.to_ascii_lowercase();
    if (name.starts_with("is") || name.starts_with("has"))
        && name.len() > 2
        && name.as_bytes()[2].is_ascii_uppercase()
    {
        return TypeId::BOOL;
    }
    // "iv" matches exactly; as a substring it would catch half the
    // dictionary ("private", "derive", ...).
    if lower == "iv" || BYTE_ARRAY_NAMES.iter().any(|n| lower.contains(n)) {
        return TypeId::BYTE_ARRAY;
    }
    if lower.contains("sbox") || lower.contains("pbox") || lower.ends_with("_init") {
        return TypeId::UINT_ARRAY;
    }
    if matches!(lower.as_str(), "i" | "j" | "n") || INT_NAMES.iter().any(|n| lower.contains(n)) {
        return TypeId::INT;
    }
    TypeId::UINT
}

/// Map an upstream JSDoc type hint to a C# type.
pub fn parse_hint(ctx: &TransformContext, hint: &str) -> TypeId {
    match hint.trim() {
        "number" => TypeId::INT,
        "string" => TypeId::STRING,
        "boolean" | "bool" => TypeId::BOOL,
        "bigint" => TypeId::ULONG,
        "Uint8Array" | "byte[]" | "Array<byte>" => TypeId::BYTE_ARRAY,
        "Uint16Array" => ctx.interner.array_of(TypeId::USHORT),
        "Uint32Array" | "uint[]" => TypeId::UINT_ARRAY,
        "Int8Array" => ctx.interner.array_of(TypeId::SBYTE),
        "Int16Array" => ctx.interner.array_of(TypeId::SHORT),
        "Int32Array" | "int[]" => TypeId::INT_ARRAY,
        "BigUint64Array" | "ulong[]" => TypeId::ULONG_ARRAY,
        "Float32Array" => ctx.interner.array_of(TypeId::FLOAT),
        "Float64Array" | "double[]" => ctx.interner.array_of(TypeId::DOUBLE),
        "number[]" | "Array<number>" => TypeId::UINT_ARRAY,
        "string[]" | "Array<string>" => TypeId::STRING_ARRAY,
        "object" | "Object" | "*" | "any" => TypeId::DYNAMIC,
        other => crate::framework::parse_type_str(&ctx.interner, other),
    }
}

/// The smallest signed type of {int, long} whose range contains `value`.
pub fn int_literal_type(value: i64) -> TypeId {
    if value >= i64::from(i32::MIN) && value <= i64::from(i32::MAX) {
        TypeId::INT
    } else {
        TypeId::LONG
    }
}

/// The unsigned integer type of a given bit width.
pub fn unsigned_of(bits: u16) -> TypeId {
    match bits {
        8 => TypeId::BYTE,
        16 => TypeId::USHORT,
        32 => TypeId::UINT,
        _ => TypeId::ULONG,
    }
}

/// The C# type for an IL numeric element kind.
pub fn numeric_kind_type(kind: NumericKind) -> TypeId {
    match kind {
        NumericKind::U8 => TypeId::BYTE,
        NumericKind::I8 => TypeId::SBYTE,
        NumericKind::U16 => TypeId::USHORT,
        NumericKind::I16 => TypeId::SHORT,
        NumericKind::U32 => TypeId::UINT,
        NumericKind::I32 => TypeId::INT,
        NumericKind::U64 => TypeId::ULONG,
        NumericKind::I64 => TypeId::LONG,
        NumericKind::F32 => TypeId::FLOAT,
        NumericKind::F64 => TypeId::DOUBLE,
    }
}

/// Infer the C# type of an IL expression.
pub fn infer_type(ctx: &mut TransformContext, node: &IlNode) -> Result<TypeId, Fatal> {
    match node {
        IlNode::Literal { value } => Ok(match value {
            IlValue::Null => TypeId::DYNAMIC,
            IlValue::Bool(_) => TypeId::BOOL,
            IlValue::Int(v) => int_literal_type(*v),
            IlValue::Float(_) => TypeId::DOUBLE,
            IlValue::Str(_) => TypeId::STRING,
            IlValue::BigInt(text) => {
                if text.parse::<i64>().is_ok() {
                    TypeId::LONG
                } else {
                    TypeId::ULONG
                }
            }
        }),

        IlNode::Identifier { name } => Ok(lookup_identifier(ctx, name)),
        IlNode::This => Ok(this_type(ctx)),
        IlNode::Super => Ok(ctx
            .current_parent
            .clone()
            .map(|p| ctx.interner.generic(p, Vec::new()))
            .unwrap_or(TypeId::DYNAMIC)),

        IlNode::Member { object, property } => infer_member(ctx, object, property),
        IlNode::ThisPropertyAccess { property } => Ok(this_property_type(ctx, property)),

        IlNode::Binary { op, left, right } => infer_binary(ctx, *op, left, right),
        IlNode::Logical { op, left, right } => infer_logical(ctx, *op, left, right),
        IlNode::Unary { op, operand } => infer_unary(ctx, *op, operand),
        IlNode::Update { target, .. } => infer_type(ctx, target),
        IlNode::Assignment { target, .. } => infer_type(ctx, target),
        IlNode::Conditional {
            then_branch,
            else_branch,
            ..
        } => {
            let t = infer_type(ctx, then_branch)?;
            let e = infer_type(ctx, else_branch)?;
            Ok(widen(&ctx.interner, t, e).unwrap_or(TypeId::DYNAMIC))
        }
        IlNode::Sequence { exprs } => match exprs.last() {
            Some(last) => infer_type(ctx, last),
            None => Ok(TypeId::DYNAMIC),
        },
        IlNode::Template { .. } | IlNode::StringInterpolation { .. } => Ok(TypeId::STRING),
        IlNode::Spread { argument } => infer_type(ctx, argument),

        IlNode::ArrayLiteral { elements } => infer_array_literal(ctx, elements),
        IlNode::ObjectLiteral { .. } | IlNode::ArrowFunction { .. } => Ok(TypeId::DYNAMIC),

        IlNode::ThisMethodCall { method, .. } => Ok(this_method_return(ctx, method)),
        IlNode::ParentMethodCall { method, .. } => Ok(parent_method_return(ctx, method)),
        IlNode::ParentConstructorCall { .. } => Ok(TypeId::VOID),
        IlNode::Call { callee, .. } => infer_call(ctx, callee),
        IlNode::New { callee, .. } => Ok(ctx.interner.generic(callee.clone(), Vec::new())),

        // IL-lowered crypto primitives.
        IlNode::RotateLeft { bits, .. } | IlNode::RotateRight { bits, .. } => {
            Ok(unsigned_of(*bits))
        }
        IlNode::PackBytes { bits, .. } => Ok(unsigned_of(*bits)),
        IlNode::UnpackBytes { .. } => Ok(TypeId::BYTE_ARRAY),
        IlNode::Cast { target, .. } => Ok(numeric_kind_type(*target)),
        IlNode::BigIntCast { bits, .. } => Ok(unsigned_of(*bits)),

        // Array operations.
        IlNode::ArrayLength { .. } => Ok(TypeId::INT),
        IlNode::ArrayAppend { array, .. }
        | IlNode::ArraySlice { array, .. }
        | IlNode::ArrayConcat { array, .. }
        | IlNode::ArrayReverse { array }
        | IlNode::ArrayMap { array, .. }
        | IlNode::ArrayFilter { array, .. }
        | IlNode::ArraySort { array, .. }
        | IlNode::TypedArraySubarray { array, .. }
        | IlNode::ArraySplice { array, .. } => infer_type(ctx, array),
        IlNode::ArrayFill { array, .. } => infer_type(ctx, array),
        IlNode::ArrayXor { .. } | IlNode::ArrayClear { .. } | IlNode::TypedArraySet { .. } => {
            Ok(TypeId::VOID)
        }
        IlNode::ArrayIndexOf { .. } | IlNode::ArrayFindIndex { .. } => Ok(TypeId::INT),
        IlNode::ArrayIncludes { .. } | IlNode::ArrayEvery { .. } | IlNode::ArraySome { .. } => {
            Ok(TypeId::BOOL)
        }
        IlNode::ArrayJoin { .. } => Ok(TypeId::STRING),
        IlNode::ArrayReduce { array, initial, .. } => match initial {
            Some(init) => infer_type(ctx, init),
            None => Ok(element_or_dynamic(ctx, array)?),
        },
        IlNode::ArrayForEach { .. } => Ok(TypeId::VOID),
        IlNode::ArrayFind { array, .. }
        | IlNode::ArrayPop { array }
        | IlNode::ArrayShift { array } => Ok(element_or_dynamic(ctx, array)?),
        IlNode::ArrayCreation { .. } => {
            let elem = ctx.current_elem_context().unwrap_or(TypeId::UINT);
            Ok(ctx.interner.array_of(elem))
        }
        IlNode::TypedArrayCreation { element, .. } => {
            Ok(ctx.interner.array_of(numeric_kind_type(*element)))
        }
        IlNode::ByteBufferView { element, .. } => {
            Ok(ctx.interner.array_of(numeric_kind_type(*element)))
        }

        IlNode::HexEncode { .. } => Ok(TypeId::STRING),
        IlNode::HexDecode { .. } => Ok(TypeId::BYTE_ARRAY),
        IlNode::StringToBytes { .. } => Ok(TypeId::BYTE_ARRAY),
        IlNode::BytesToString { .. } => Ok(TypeId::STRING),

        IlNode::StringCharCodeAt { .. } => Ok(TypeId::INT),
        IlNode::StringCharAt { .. } => Ok(TypeId::CHAR),
        IlNode::StringSubstring { .. }
        | IlNode::StringReplace { .. }
        | IlNode::StringToUpperCase { .. }
        | IlNode::StringToLowerCase { .. }
        | IlNode::StringTrim { .. }
        | IlNode::StringRepeat { .. }
        | IlNode::StringPadStart { .. } => Ok(TypeId::STRING),
        IlNode::StringSplit { .. } => Ok(TypeId::STRING_ARRAY),
        IlNode::StringIndexOf { .. } => Ok(TypeId::INT),
        IlNode::StringIncludes { .. } | IlNode::StringStartsWith { .. } => Ok(TypeId::BOOL),

        IlNode::MapCreation | IlNode::ObjectCreate { .. } => {
            Ok(ctx
                .interner
                .generic("Dictionary", vec![TypeId::STRING, TypeId::DYNAMIC]))
        }
        IlNode::MapGet { map, .. } => {
            let map_ty = infer_type(ctx, map)?;
            Ok(dictionary_value_type(ctx, map_ty))
        }
        IlNode::MapSet { .. } => Ok(TypeId::VOID),
        IlNode::MapHas { .. } | IlNode::MapDelete { .. } => Ok(TypeId::BOOL),
        IlNode::SetCreation => Ok(ctx.interner.generic("HashSet", vec![TypeId::DYNAMIC])),

        IlNode::ObjectKeys { .. } => Ok(TypeId::STRING_ARRAY),
        IlNode::ObjectValues { object } => {
            let obj_ty = infer_type(ctx, object)?;
            let value = dictionary_value_type(ctx, obj_ty);
            Ok(ctx.interner.array_of(value))
        }
        IlNode::ObjectEntries { .. } => Ok(TypeId::DYNAMIC),
        IlNode::ObjectFreeze { object } => infer_type(ctx, object),

        IlNode::MathCall { func, args } => infer_math(ctx, *func, args),
        IlNode::MathConstant { .. } => Ok(TypeId::DOUBLE),
        IlNode::NumberConstant { name } => Ok(match name {
            NumberConst::MaxSafeInteger | NumberConst::MinSafeInteger => TypeId::LONG,
            _ => TypeId::DOUBLE,
        }),
        IlNode::Random => Ok(TypeId::DOUBLE),
        IlNode::Clz32 { .. } | IlNode::Imul { .. } => Ok(TypeId::INT),

        IlNode::IsArrayCheck { .. }
        | IlNode::IsFinite { .. }
        | IlNode::IsNaN { .. }
        | IlNode::IsInteger { .. } => Ok(TypeId::BOOL),
        IlNode::ArrayFrom { source, .. } => {
            let src = infer_type(ctx, source)?;
            if ctx.interner.is_array(src) {
                Ok(src)
            } else if src == TypeId::STRING {
                Ok(ctx.interner.array_of(TypeId::CHAR))
            } else {
                Ok(TypeId::UINT_ARRAY)
            }
        }

        IlNode::DataViewRead { element, .. } => Ok(numeric_kind_type(*element)),
        IlNode::DataViewWrite { .. } => Ok(TypeId::VOID),
        IlNode::DebugOutput { .. } => Ok(TypeId::VOID),
        IlNode::ErrorCreation { error, .. } => Ok(ctx
            .interner
            .generic(crate::transform::exception_type_name(*error), Vec::new())),
        IlNode::StringFromCharCodes { .. } => Ok(TypeId::STRING),
        IlNode::InstanceOfCheck { .. } => Ok(TypeId::BOOL),
        IlNode::TypeOfExpression { .. } => Ok(TypeId::STRING),
        IlNode::DestructuringAssignment { .. } => Ok(TypeId::VOID),
        IlNode::OpCodesCall { method, .. } => Ok(opcodes_return(ctx, method)),

        // Structure and statement nodes have no expression type.
        _ => Ok(TypeId::VOID),
    }
}

fn lookup_identifier(ctx: &TransformContext, name: &str) -> TypeId {
    if let Some(ty) = ctx.scopes.lookup(name) {
        return ty;
    }
    if let Some(class) = ctx.current_class.as_deref() {
        if let Some(ty) = ctx.field_type(class, name) {
            return ty;
        }
    }
    name_heuristic(name)
}

fn this_type(ctx: &TransformContext) -> TypeId {
    ctx.current_class
        .clone()
        .map(|c| ctx.interner.generic(c, Vec::new()))
        .unwrap_or(TypeId::DYNAMIC)
}

fn this_property_type(ctx: &TransformContext, property: &str) -> TypeId {
    if let Some(class) = ctx.current_class.as_deref() {
        if let Some(ty) = ctx.field_type(class, property) {
            return ty;
        }
    }
    if let Some(parent) = ctx.current_parent.as_deref() {
        if let Some((_, ty)) = ctx.kb.lookup_property(parent, property) {
            return crate::framework::parse_type_str(&ctx.interner, ty);
        }
    }
    name_heuristic(property)
}

fn this_method_return(ctx: &TransformContext, method: &str) -> TypeId {
    if let Some(class) = ctx.current_class.as_deref() {
        if let Some(sig) = ctx.signatures.get(class, method) {
            return sig.return_type;
        }
    }
    parent_method_return(ctx, method)
}

fn parent_method_return(ctx: &TransformContext, method: &str) -> TypeId {
    if let Some(parent) = ctx.current_parent.as_deref() {
        if let Some((_, _, sig)) = ctx.kb.lookup_method(parent, method) {
            return crate::framework::parse_type_str(&ctx.interner, &sig.returns);
        }
    }
    TypeId::DYNAMIC
}

fn opcodes_return(ctx: &TransformContext, method: &str) -> TypeId {
    match ctx.kb.opcode(method) {
        Some(op) => crate::framework::parse_type_str(&ctx.interner, &op.returns),
        None => TypeId::DYNAMIC,
    }
}

fn dictionary_value_type(ctx: &TransformContext, map_ty: TypeId) -> TypeId {
    match ctx.interner.lookup(map_ty) {
        CsType::Generic { name, args } if name == "Dictionary" && args.len() == 2 => args[1],
        _ => TypeId::DYNAMIC,
    }
}

fn element_or_dynamic(ctx: &mut TransformContext, array: &IlNode) -> Result<TypeId, Fatal> {
    let array_ty = infer_type(ctx, array)?;
    Ok(ctx.interner.element_of(array_ty).unwrap_or(TypeId::DYNAMIC))
}

fn infer_member(
    ctx: &mut TransformContext,
    object: &IlNode,
    property: &IlMemberProperty,
) -> Result<TypeId, Fatal> {
    match property {
        IlMemberProperty::Dotted(name) => {
            if name == "length" {
                return Ok(TypeId::INT);
            }
            let object_ty = infer_type(ctx, object)?;
            match ctx.interner.lookup(object_ty) {
                CsType::Tuple(elems) => {
                    let wanted = ilcs_common::to_pascal_case(name);
                    for elem in &elems {
                        if elem.name.eq_ignore_ascii_case(&wanted) {
                            return Ok(elem.ty);
                        }
                    }
                    Ok(TypeId::DYNAMIC)
                }
                CsType::Generic { name: class, .. } => {
                    if let Some((_, ty)) = ctx.kb.lookup_property(&class, name) {
                        return Ok(crate::framework::parse_type_str(&ctx.interner, ty));
                    }
                    Ok(crypto_pair_member(object, name))
                }
                _ => Ok(crypto_pair_member(object, name)),
            }
        }
        IlMemberProperty::Computed(index) => {
            let object_ty = infer_type(ctx, object)?;
            if object_ty == TypeId::STRING {
                return Ok(TypeId::CHAR);
            }
            if let Some(elem) = ctx.interner.element_of(object_ty) {
                return Ok(elem);
            }
            match ctx.interner.lookup(object_ty) {
                CsType::Tuple(elems) => {
                    if let IlNode::Literal {
                        value: IlValue::Int(i),
                    } = &**index
                    {
                        if let Some(elem) = elems.get(*i as usize) {
                            return Ok(elem.ty);
                        }
                    }
                    Ok(TypeId::DYNAMIC)
                }
                CsType::Generic { name, args } if name == "Dictionary" && args.len() == 2 => {
                    Ok(args[1])
                }
                _ => Ok(TypeId::DYNAMIC),
            }
        }
    }
}

/// `.left` / `.right` on values named like an encryption result are the
/// halves of a 64-bit block: unsigned 32-bit.
fn crypto_pair_member(object: &IlNode, member: &str) -> TypeId {
    if member == "left" || member == "right" {
        if let IlNode::Identifier { name } = object {
            let lower = name.to_ascii_lowercase();
            if lower.contains("result") || lower.contains("encrypt") || lower.contains("decrypt") {
                return TypeId::UINT;
            }
        }
    }
    TypeId::DYNAMIC
}

fn infer_binary(
    ctx: &mut TransformContext,
    op: BinaryOp,
    left: &IlNode,
    right: &IlNode,
) -> Result<TypeId, Fatal> {
    if op.is_comparison() {
        return Ok(TypeId::BOOL);
    }
    let left_ty = infer_type(ctx, left)?;
    if op == BinaryOp::UShr {
        // `x >>> 0` is a forced coercion to unsigned 32-bit; other
        // amounts keep the promoted left width, unsigned.
        if matches!(
            right,
            IlNode::Literal {
                value: IlValue::Int(0)
            }
        ) {
            return Ok(TypeId::UINT);
        }
        let promoted = promote_small(&ctx.interner, left_ty);
        return Ok(if promoted == TypeId::LONG || promoted == TypeId::ULONG {
            TypeId::ULONG
        } else {
            TypeId::UINT
        });
    }
    if op.is_shift() {
        return Ok(shift_result(&ctx.interner, left_ty));
    }
    let right_ty = infer_type(ctx, right)?;
    arithmetic_result(&ctx.interner, left_ty, right_ty)
        .map_err(|e| ctx.fatal_invariant("Binary", e.message))
}

fn infer_logical(
    ctx: &mut TransformContext,
    _op: LogicalOp,
    left: &IlNode,
    right: &IlNode,
) -> Result<TypeId, Fatal> {
    let left_ty = infer_type(ctx, left)?;
    let right_ty = infer_type(ctx, right)?;
    if left_ty == TypeId::BOOL && right_ty == TypeId::BOOL {
        return Ok(TypeId::BOOL);
    }
    Ok(widen(&ctx.interner, left_ty, right_ty).unwrap_or(TypeId::DYNAMIC))
}

fn infer_unary(ctx: &mut TransformContext, op: UnaryOp, operand: &IlNode) -> Result<TypeId, Fatal> {
    let operand_ty = infer_type(ctx, operand)?;
    Ok(match op {
        UnaryOp::Not => TypeId::BOOL,
        UnaryOp::Minus => {
            let promoted = promote_small(&ctx.interner, operand_ty);
            if promoted == TypeId::UINT || promoted == TypeId::ULONG {
                // Negating unsigned widens to the next signed type.
                TypeId::LONG
            } else if promoted == TypeId::DOUBLE
                || promoted == TypeId::FLOAT
                || promoted == TypeId::LONG
                || promoted == TypeId::INT
            {
                promoted
            } else {
                TypeId::INT
            }
        }
        UnaryOp::Plus => {
            if ctx.interner.is_numeric(operand_ty) {
                promote_small(&ctx.interner, operand_ty)
            } else {
                TypeId::DOUBLE
            }
        }
        UnaryOp::BitNot => {
            let promoted = promote_small(&ctx.interner, operand_ty);
            if ctx.interner.is_integer(promoted) {
                promoted
            } else {
                TypeId::INT
            }
        }
        UnaryOp::Void => TypeId::DYNAMIC,
    })
}

fn infer_array_literal(ctx: &mut TransformContext, elements: &[IlNode]) -> Result<TypeId, Fatal> {
    if elements.is_empty() {
        // An empty literal takes the declared element type; in crypto
        // context with no hint at all, byte.
        let elem = ctx.current_elem_context().unwrap_or(TypeId::BYTE);
        return Ok(ctx.interner.array_of(elem));
    }
    let mut folded: Option<TypeId> = None;
    for element in elements {
        let elem_ty = match element {
            IlNode::Spread { argument } => {
                let spread_ty = infer_type(ctx, argument)?;
                ctx.interner.element_of(spread_ty).unwrap_or(TypeId::DYNAMIC)
            }
            other => infer_type(ctx, other)?,
        };
        folded = Some(match folded {
            None => elem_ty,
            Some(acc) => widen(&ctx.interner, acc, elem_ty)
                .map_err(|e| ctx.fatal_invariant("ArrayLiteral", e.message))?,
        });
    }
    let elem = folded.unwrap_or(TypeId::BYTE);
    // Object-literal elements leave the element dynamic; the transformer
    // substitutes the framework type from context.
    if elem == TypeId::DYNAMIC {
        if let Some(hint) = ctx.current_elem_context() {
            return Ok(ctx.interner.array_of(hint));
        }
    }
    Ok(ctx.interner.array_of(elem))
}

fn infer_call(ctx: &mut TransformContext, callee: &IlNode) -> Result<TypeId, Fatal> {
    match callee {
        IlNode::Identifier { name } => {
            // Free functions live on the configured wrapper class.
            let wrapper = ctx.options.class_name.clone();
            if let Some(sig) = ctx.signatures.get(&wrapper, name) {
                return Ok(sig.return_type);
            }
            Ok(TypeId::DYNAMIC)
        }
        IlNode::Member {
            object,
            property: IlMemberProperty::Dotted(method),
        } => {
            let object_ty = infer_type(ctx, object)?;
            if let CsType::Generic { name, .. } = ctx.interner.lookup(object_ty) {
                if let Some(sig) = ctx.signatures.get(&name, method) {
                    return Ok(sig.return_type);
                }
                if let Some((_, _, kb_sig)) = ctx.kb.lookup_method(&name, method) {
                    return Ok(crate::framework::parse_type_str(
                        &ctx.interner,
                        &kb_sig.returns,
                    ));
                }
            }
            Ok(TypeId::DYNAMIC)
        }
        _ => Ok(TypeId::DYNAMIC),
    }
}

fn infer_math(
    ctx: &mut TransformContext,
    func: MathFunc,
    args: &[IlNode],
) -> Result<TypeId, Fatal> {
    let first = match args.first() {
        Some(arg) => infer_type(ctx, arg)?,
        None => TypeId::DOUBLE,
    };
    Ok(match func {
        MathFunc::Floor | MathFunc::Ceil | MathFunc::Round | MathFunc::Trunc => {
            if ctx.interner.is_integer(first) {
                first
            } else {
                TypeId::DOUBLE
            }
        }
        MathFunc::Abs => {
            if ctx.interner.is_numeric(first) {
                promote_small(&ctx.interner, first)
            } else {
                TypeId::DOUBLE
            }
        }
        MathFunc::Min | MathFunc::Max => {
            let mut acc = first;
            for arg in args.iter().skip(1) {
                let ty = infer_type(ctx, arg)?;
                acc = widen(&ctx.interner, acc, ty).unwrap_or(TypeId::DOUBLE);
            }
            acc
        }
        MathFunc::Sign => TypeId::INT,
        _ => TypeId::DOUBLE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilcs_common::TranspileOptions;

    fn test_ctx() -> TransformContext {
        TransformContext::new(TranspileOptions::default()).unwrap()
    }

    #[test]
    fn integer_literals_take_smallest_signed() {
        assert_eq!(int_literal_type(0), TypeId::INT);
        assert_eq!(int_literal_type(-1), TypeId::INT);
        assert_eq!(int_literal_type(0x7FFF_FFFF), TypeId::INT);
        assert_eq!(int_literal_type(0x8000_0000), TypeId::LONG);
        assert_eq!(int_literal_type(i64::MIN), TypeId::LONG);
    }

    #[test]
    fn ushr_zero_is_uint() {
        let mut ctx = test_ctx();
        ctx.scopes.enter_method();
        ctx.scopes.declare("x", TypeId::INT);
        let node = IlNode::binary(BinaryOp::UShr, IlNode::ident("x"), IlNode::int(0));
        assert_eq!(infer_type(&mut ctx, &node).unwrap(), TypeId::UINT);
    }

    #[test]
    fn comparisons_are_bool() {
        let mut ctx = test_ctx();
        let node = IlNode::binary(BinaryOp::Lt, IlNode::ident("i"), IlNode::int(16));
        assert_eq!(infer_type(&mut ctx, &node).unwrap(), TypeId::BOOL);
    }

    #[test]
    fn name_heuristics() {
        assert_eq!(name_heuristic("roundKeys"), TypeId::BYTE_ARRAY);
        assert_eq!(name_heuristic("plaintext"), TypeId::BYTE_ARRAY);
        assert_eq!(name_heuristic("iv"), TypeId::BYTE_ARRAY);
        assert_eq!(name_heuristic("sboxTable"), TypeId::UINT_ARRAY);
        assert_eq!(name_heuristic("i"), TypeId::INT);
        assert_eq!(name_heuristic("blockIndex"), TypeId::BYTE_ARRAY); // "block" wins, listed first
        assert_eq!(name_heuristic("position"), TypeId::INT);
        assert_eq!(name_heuristic("isInverse"), TypeId::BOOL);
        assert_eq!(name_heuristic("x0"), TypeId::UINT);
    }

    #[test]
    fn array_literal_widens_elements() {
        // [1, -1, 0x80000000] - the third element needs long.
        let mut ctx = test_ctx();
        let node = IlNode::ArrayLiteral {
            elements: vec![IlNode::int(1), IlNode::int(-1), IlNode::int(0x8000_0000)],
        };
        let ty = infer_type(&mut ctx, &node).unwrap();
        assert_eq!(ty, ctx.interner.array_of(TypeId::LONG));
    }

    #[test]
    fn empty_array_literal_defaults_to_byte() {
        let mut ctx = test_ctx();
        let node = IlNode::ArrayLiteral { elements: vec![] };
        assert_eq!(infer_type(&mut ctx, &node).unwrap(), TypeId::BYTE_ARRAY);
    }

    #[test]
    fn cast_type_is_authoritative() {
        let mut ctx = test_ctx();
        let node = IlNode::Cast {
            target: NumericKind::U32,
            value: Box::new(IlNode::ident("anything")),
        };
        assert_eq!(infer_type(&mut ctx, &node).unwrap(), TypeId::UINT);
    }

    #[test]
    fn rotate_and_pack_are_unsigned_of_width() {
        let mut ctx = test_ctx();
        let rot = IlNode::RotateLeft {
            bits: 32,
            value: Box::new(IlNode::ident("v")),
            amount: Box::new(IlNode::int(7)),
        };
        assert_eq!(infer_type(&mut ctx, &rot).unwrap(), TypeId::UINT);
        let pack = IlNode::PackBytes {
            bits: 64,
            big_endian: true,
            bytes: vec![],
        };
        assert_eq!(infer_type(&mut ctx, &pack).unwrap(), TypeId::ULONG);
    }
}
