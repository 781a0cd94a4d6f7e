//! Bit-level crypto idioms: rotations, byte packing, casts, data views
//! and the OpCodes escape hatch.
//!
//! Rotations and packing never use language intrinsics; they always go
//! through the portable OpCodes helpers so emitted code runs on any
//! runtime version.

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{CsBinaryOp, CsExpr, CsLiteral};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, MathConst, MathFunc, NumberConst, NumericKind};

use super::Transformer;
use crate::framework::parse_type_str;
use crate::infer::{numeric_kind_type, unsigned_of};

impl<'a> Transformer<'a> {
    pub(crate) fn transform_numeric_primitive(
        &mut self,
        node: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        match node {
            IlNode::RotateLeft {
                bits,
                value,
                amount,
            } => self.build_rotate(*bits, value, amount, true),
            IlNode::RotateRight {
                bits,
                value,
                amount,
            } => self.build_rotate(*bits, value, amount, false),

            IlNode::PackBytes {
                bits,
                big_endian,
                bytes,
            } => self.build_pack(*bits, *big_endian, bytes),
            IlNode::UnpackBytes {
                bits,
                big_endian,
                value,
            } => self.build_unpack(*bits, *big_endian, value),

            IlNode::Cast { target, value } => {
                let to = numeric_kind_type(*target);
                let (expr, from) = self.transform_expr(value)?;
                if from == to {
                    Ok((expr, to))
                } else {
                    Ok((CsExpr::cast(to, expr), to))
                }
            }
            IlNode::BigIntCast { bits, value } => {
                // BigInt.asUintN(bits, v): a cast to the unsigned type of
                // that width.
                let to = unsigned_of(*bits);
                let (expr, from) = self.transform_expr(value)?;
                if from == to {
                    Ok((expr, to))
                } else {
                    Ok((CsExpr::cast(to, expr), to))
                }
            }

            IlNode::ByteBufferView {
                buffer, element, ..
            } => {
                let (buffer_expr, _) = self.transform_expr(buffer)?;
                if let IlNode::Identifier { name } = &**buffer {
                    self.ctx.scopes.mark_array_buffer(name);
                }
                match element {
                    NumericKind::U8 => Ok((buffer_expr, TypeId::BYTE_ARRAY)),
                    NumericKind::U32 => Ok((
                        CsExpr::opcodes_call("BytesToUInt32ArrayLE", vec![buffer_expr]),
                        TypeId::UINT_ARRAY,
                    )),
                    other => {
                        self.ctx.warn(
                            DiagnosticKind::CryptoFallback,
                            format!("no buffer view helper for {other:?}"),
                        );
                        Ok((
                            buffer_expr,
                            self.ctx.interner.array_of(numeric_kind_type(*other)),
                        ))
                    }
                }
            }

            IlNode::DataViewRead {
                view,
                element,
                offset,
                little_endian,
            } => self.build_data_view_read(view, *element, offset, *little_endian),
            IlNode::DataViewWrite {
                view,
                element,
                offset,
                value,
                little_endian,
            } => self.build_data_view_write(view, *element, offset, value, *little_endian),

            IlNode::OpCodesCall { method, args } => self.build_opcodes_call(method, args),

            IlNode::Clz32 { value } => {
                let (expr, ty) = self.transform_expr(value)?;
                let expr = self.coerce_assign(expr, ty, TypeId::UINT);
                Ok((CsExpr::opcodes_call("Clz32", vec![expr]), TypeId::INT))
            }
            IlNode::Imul { left, right } => {
                let (l, l_ty) = self.transform_expr(left)?;
                let (r, r_ty) = self.transform_expr(right)?;
                let l = self.coerce_assign(l, l_ty, TypeId::INT);
                let r = self.coerce_assign(r, r_ty, TypeId::INT);
                Ok((CsExpr::opcodes_call("Imul", vec![l, r]), TypeId::INT))
            }

            IlNode::MathCall { func, args } => self.build_math_call(*func, args),
            IlNode::MathConstant { name } => Ok(build_math_constant(*name)),
            IlNode::NumberConstant { name } => Ok(build_number_constant(*name)),
            IlNode::Random => Ok((
                CsExpr::call(
                    CsExpr::member(CsExpr::ident("Random"), "Shared"),
                    "NextDouble",
                    vec![],
                ),
                TypeId::DOUBLE,
            )),

            IlNode::IsFinite { value } => {
                let (expr, _) = self.transform_expr(value)?;
                Ok((
                    CsExpr::call(CsExpr::ident("double"), "IsFinite", vec![expr]),
                    TypeId::BOOL,
                ))
            }
            IlNode::IsNaN { value } => {
                let (expr, _) = self.transform_expr(value)?;
                Ok((
                    CsExpr::call(CsExpr::ident("double"), "IsNaN", vec![expr]),
                    TypeId::BOOL,
                ))
            }
            IlNode::IsInteger { value } => {
                let (expr, ty) = self.transform_expr(value)?;
                if self.ctx.interner.is_integer(ty) {
                    return Ok((CsExpr::bool(true), TypeId::BOOL));
                }
                Ok((
                    CsExpr::binary(
                        CsBinaryOp::Eq,
                        expr.clone(),
                        CsExpr::call(CsExpr::ident("Math"), "Floor", vec![expr]),
                    ),
                    TypeId::BOOL,
                ))
            }

            other => Err(self
                .ctx
                .fatal_malformed(other.kind_name(), "not a numeric primitive")),
        }
    }

    /// `RotL{bits}` / `RotR{bits}` with the operand cast to the unsigned
    /// type of the requested width.
    fn build_rotate(
        &mut self,
        bits: u16,
        value: &IlNode,
        amount: &IlNode,
        left: bool,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let unsigned = unsigned_of(bits);
        let (value_expr, value_ty) = self.transform_expr(value)?;
        let value_expr = if value_ty == unsigned {
            value_expr
        } else {
            CsExpr::cast(unsigned, value_expr)
        };
        let (amount_expr, amount_ty) = self.transform_expr(amount)?;
        let amount_expr = self.coerce_assign(amount_expr, amount_ty, TypeId::INT);
        let helper = format!("{}{}", if left { "RotL" } else { "RotR" }, bits);
        Ok((
            CsExpr::opcodes_call(helper, vec![value_expr, amount_expr]),
            unsigned,
        ))
    }

    /// `Pack{bits}{BE|LE}(b0, ..., bn)`; a spread of a byte array expands
    /// to indexed accesses.
    fn build_pack(
        &mut self,
        bits: u16,
        big_endian: bool,
        bytes: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let count = usize::from(bits / 8);
        let mut args = Vec::with_capacity(count);
        if let [IlNode::Spread { argument }] = bytes {
            let (source, _) = self.transform_expr(argument)?;
            for i in 0..count {
                args.push(CsExpr::cast(
                    TypeId::BYTE,
                    CsExpr::index(source.clone(), CsExpr::int(i as i64)),
                ));
            }
        } else {
            for byte in bytes {
                let (expr, ty) = self.transform_expr(byte)?;
                args.push(if ty == TypeId::BYTE {
                    expr
                } else {
                    CsExpr::cast(TypeId::BYTE, expr)
                });
            }
        }
        if args.len() != count {
            self.ctx.warn(
                DiagnosticKind::CryptoFallback,
                format!("Pack{bits} received {} of {count} bytes", args.len()),
            );
        }
        let helper = format!("Pack{}{}", bits, if big_endian { "BE" } else { "LE" });
        Ok((CsExpr::opcodes_call(helper, args), unsigned_of(bits)))
    }

    /// An N-element byte-array literal of shift-mask extractions, in the
    /// requested endianness.
    fn build_unpack(
        &mut self,
        bits: u16,
        big_endian: bool,
        value: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let count = bits / 8;
        let (value_expr, value_ty) = self.transform_expr(value)?;
        let unsigned = unsigned_of(bits);
        let value_expr = if value_ty == unsigned {
            value_expr
        } else {
            CsExpr::cast(unsigned, value_expr)
        };
        let mut items = Vec::with_capacity(usize::from(count));
        for i in 0..count {
            let shift = if big_endian { bits - 8 - i * 8 } else { i * 8 };
            let extracted = if shift == 0 {
                CsExpr::binary(
                    CsBinaryOp::BitAnd,
                    value_expr.clone(),
                    mask_ff(unsigned),
                )
            } else {
                CsExpr::binary(
                    CsBinaryOp::BitAnd,
                    CsExpr::binary(
                        CsBinaryOp::Shr,
                        value_expr.clone(),
                        CsExpr::int(i64::from(shift)),
                    ),
                    mask_ff(unsigned),
                )
            };
            items.push(CsExpr::cast(TypeId::BYTE, extracted));
        }
        Ok((
            CsExpr::ArrayCreation {
                elem: TypeId::BYTE,
                size: None,
                init: Some(items),
                jagged_inner: false,
            },
            TypeId::BYTE_ARRAY,
        ))
    }

    fn build_data_view_read(
        &mut self,
        view: &IlNode,
        element: NumericKind,
        offset: &IlNode,
        little_endian: bool,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (view_expr, _) = self.transform_expr(view)?;
        let (offset_expr, offset_ty) = self.transform_expr(offset)?;
        let offset_expr = self.coerce_assign(offset_expr, offset_ty, TypeId::INT);
        let result_ty = numeric_kind_type(element);

        match element {
            NumericKind::U8 => Ok((CsExpr::index(view_expr, offset_expr), TypeId::BYTE)),
            NumericKind::I8 => Ok((
                CsExpr::cast(TypeId::SBYTE, CsExpr::index(view_expr, offset_expr)),
                TypeId::SBYTE,
            )),
            NumericKind::F32 | NumericKind::F64 => {
                if !little_endian {
                    self.ctx.warn(
                        DiagnosticKind::CryptoFallback,
                        "big-endian float read emitted through BitConverter",
                    );
                }
                let method = if element == NumericKind::F32 {
                    "ToSingle"
                } else {
                    "ToDouble"
                };
                Ok((
                    CsExpr::call(
                        CsExpr::ident("BitConverter"),
                        method,
                        vec![view_expr, offset_expr],
                    ),
                    result_ty,
                ))
            }
            _ => {
                let unsigned_bits = element.bits();
                let helper = format!(
                    "ReadU{}{}",
                    unsigned_bits,
                    if little_endian { "LE" } else { "BE" }
                );
                let read = CsExpr::opcodes_call(helper, vec![view_expr, offset_expr]);
                if element.is_signed() {
                    Ok((CsExpr::cast(result_ty, read), result_ty))
                } else {
                    Ok((read, result_ty))
                }
            }
        }
    }

    fn build_data_view_write(
        &mut self,
        view: &IlNode,
        element: NumericKind,
        offset: &IlNode,
        value: &IlNode,
        little_endian: bool,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (view_expr, _) = self.transform_expr(view)?;
        let (offset_expr, offset_ty) = self.transform_expr(offset)?;
        let offset_expr = self.coerce_assign(offset_expr, offset_ty, TypeId::INT);
        let (value_expr, value_ty) = self.transform_expr(value)?;

        match element {
            NumericKind::U8 | NumericKind::I8 => {
                let value_expr = self.coerce_assign(value_expr, value_ty, TypeId::BYTE);
                Ok((
                    CsExpr::Assignment {
                        op: ilcs_csharp::ast::CsAssignOp::Assign,
                        target: Box::new(CsExpr::index(view_expr, offset_expr)),
                        value: Box::new(value_expr),
                    },
                    TypeId::VOID,
                ))
            }
            NumericKind::F32 | NumericKind::F64 => {
                // BitConverter.GetBytes(v).CopyTo(view, offset)
                let bytes = CsExpr::call(
                    CsExpr::ident("BitConverter"),
                    "GetBytes",
                    vec![value_expr],
                );
                Ok((
                    CsExpr::call(bytes, "CopyTo", vec![view_expr, offset_expr]),
                    TypeId::VOID,
                ))
            }
            _ => {
                let unsigned = unsigned_of(element.bits());
                let value_expr = self.coerce_assign(value_expr, value_ty, unsigned);
                let helper = format!(
                    "WriteU{}{}",
                    element.bits(),
                    if little_endian { "LE" } else { "BE" }
                );
                Ok((
                    CsExpr::opcodes_call(helper, vec![view_expr, offset_expr, value_expr]),
                    TypeId::VOID,
                ))
            }
        }
    }

    /// The OpCodes escape hatch: known helpers get typed arguments and
    /// returns, unknown ones warn and pass through untouched.
    fn build_opcodes_call(
        &mut self,
        method: &str,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        match self.ctx.kb.opcode(method) {
            Some(op) => {
                let param_types: Vec<TypeId> = op
                    .params
                    .iter()
                    .map(|p| parse_type_str(&self.ctx.interner, p))
                    .collect();
                let return_ty = parse_type_str(&self.ctx.interner, &op.returns);
                let cs_args = self.transform_args(args, &param_types)?;
                Ok((CsExpr::opcodes_call(method.to_string(), cs_args), return_ty))
            }
            None => {
                self.ctx.warn(
                    DiagnosticKind::UnknownOpCode,
                    format!("OpCodes.{method} is not in the helper table"),
                );
                let mut cs_args = Vec::with_capacity(args.len());
                for arg in args {
                    let (expr, _) = self.transform_expr(arg)?;
                    cs_args.push(expr);
                }
                Ok((
                    CsExpr::opcodes_call(method.to_string(), cs_args),
                    TypeId::DYNAMIC,
                ))
            }
        }
    }

    fn build_math_call(
        &mut self,
        func: MathFunc,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let mut transformed = Vec::with_capacity(args.len());
        for arg in args {
            transformed.push(self.transform_expr(arg)?);
        }

        match func {
            MathFunc::Floor | MathFunc::Ceil | MathFunc::Round | MathFunc::Trunc => {
                let (expr, ty) = transformed
                    .into_iter()
                    .next()
                    .unwrap_or((CsExpr::int(0), TypeId::INT));
                // Integer division already floors; the call disappears.
                if self.ctx.interner.is_integer(ty) {
                    return Ok((expr, ty));
                }
                let name = match func {
                    MathFunc::Floor => "Floor",
                    MathFunc::Ceil => "Ceiling",
                    MathFunc::Round => "Round",
                    _ => "Truncate",
                };
                Ok((
                    CsExpr::call(CsExpr::ident("Math"), name, vec![expr]),
                    TypeId::DOUBLE,
                ))
            }
            MathFunc::Abs => {
                let (expr, ty) = transformed
                    .into_iter()
                    .next()
                    .unwrap_or((CsExpr::int(0), TypeId::INT));
                // Unsigned operands are their own absolute value.
                if self
                    .ctx
                    .interner
                    .primitive(ty)
                    .is_some_and(|k| k.signed() == Some(false))
                {
                    return Ok((expr, ty));
                }
                Ok((CsExpr::call(CsExpr::ident("Math"), "Abs", vec![expr]), ty))
            }
            MathFunc::Min | MathFunc::Max => {
                let name = if func == MathFunc::Min { "Min" } else { "Max" };
                let mut common = transformed
                    .first()
                    .map(|(_, ty)| *ty)
                    .unwrap_or(TypeId::INT);
                for (_, ty) in transformed.iter().skip(1) {
                    common = ilcs_csharp::registry::widen(&self.ctx.interner, common, *ty)
                        .unwrap_or(TypeId::DOUBLE);
                }
                let mut iter = transformed.into_iter();
                let (first, first_ty) = iter.next().unwrap_or((CsExpr::int(0), TypeId::INT));
                let mut acc = self.coerce_assign(first, first_ty, common);
                for (expr, ty) in iter {
                    let expr = self.coerce_assign(expr, ty, common);
                    acc = CsExpr::call(CsExpr::ident("Math"), name, vec![acc, expr]);
                }
                Ok((acc, common))
            }
            MathFunc::Pow => {
                let mut iter = transformed.into_iter();
                let (base, _) = iter.next().unwrap_or((CsExpr::int(0), TypeId::INT));
                let (exp, _) = iter.next().unwrap_or((CsExpr::int(1), TypeId::INT));
                Ok((
                    CsExpr::call(CsExpr::ident("Math"), "Pow", vec![base, exp]),
                    TypeId::DOUBLE,
                ))
            }
            MathFunc::Sign => {
                let (expr, ty) = transformed
                    .into_iter()
                    .next()
                    .unwrap_or((CsExpr::int(0), TypeId::INT));
                // Math.Sign has no unsigned overloads.
                let expr = if self
                    .ctx
                    .interner
                    .primitive(ty)
                    .is_some_and(|k| k.signed() == Some(false))
                {
                    CsExpr::cast(TypeId::LONG, expr)
                } else {
                    expr
                };
                Ok((
                    CsExpr::call(CsExpr::ident("Math"), "Sign", vec![expr]),
                    TypeId::INT,
                ))
            }
            MathFunc::Hypot => {
                let mut iter = transformed.into_iter();
                let (x, _) = iter.next().unwrap_or((CsExpr::int(0), TypeId::INT));
                let (y, _) = iter.next().unwrap_or((CsExpr::int(0), TypeId::INT));
                let sum = CsExpr::binary(
                    CsBinaryOp::Add,
                    CsExpr::binary(CsBinaryOp::Mul, x.clone(), x),
                    CsExpr::binary(CsBinaryOp::Mul, y.clone(), y),
                );
                Ok((
                    CsExpr::call(CsExpr::ident("Math"), "Sqrt", vec![sum]),
                    TypeId::DOUBLE,
                ))
            }
            _ => {
                let name = match func {
                    MathFunc::Sqrt => "Sqrt",
                    MathFunc::Exp => "Exp",
                    MathFunc::Log => "Log",
                    MathFunc::Log2 => "Log2",
                    MathFunc::Log10 => "Log10",
                    MathFunc::Sin => "Sin",
                    MathFunc::Cos => "Cos",
                    MathFunc::Tan => "Tan",
                    MathFunc::Atan2 => "Atan2",
                    _ => unreachable!("handled above"),
                };
                let args: Vec<CsExpr> = transformed.into_iter().map(|(e, _)| e).collect();
                Ok((
                    CsExpr::call(CsExpr::ident("Math"), name, args),
                    TypeId::DOUBLE,
                ))
            }
        }
    }
}

fn mask_ff(unsigned: TypeId) -> CsExpr {
    CsExpr::Literal {
        value: CsLiteral::UInt(0xFF),
        ty: unsigned,
    }
}

fn build_math_constant(name: MathConst) -> (CsExpr, TypeId) {
    let expr = match name {
        MathConst::Pi => CsExpr::member(CsExpr::ident("Math"), "PI"),
        MathConst::E => CsExpr::member(CsExpr::ident("Math"), "E"),
        // The remaining constants have no Math member; emit literals.
        MathConst::Ln2 => float_literal(std::f64::consts::LN_2),
        MathConst::Ln10 => float_literal(std::f64::consts::LN_10),
        MathConst::Log2E => float_literal(std::f64::consts::LOG2_E),
        MathConst::Log10E => float_literal(std::f64::consts::LOG10_E),
        MathConst::Sqrt2 => float_literal(std::f64::consts::SQRT_2),
        MathConst::Sqrt1_2 => float_literal(std::f64::consts::FRAC_1_SQRT_2),
    };
    (expr, TypeId::DOUBLE)
}

fn build_number_constant(name: NumberConst) -> (CsExpr, TypeId) {
    match name {
        NumberConst::MaxSafeInteger => (
            CsExpr::Literal {
                value: CsLiteral::Int(9_007_199_254_740_991),
                ty: TypeId::LONG,
            },
            TypeId::LONG,
        ),
        NumberConst::MinSafeInteger => (
            CsExpr::Literal {
                value: CsLiteral::Int(-9_007_199_254_740_991),
                ty: TypeId::LONG,
            },
            TypeId::LONG,
        ),
        NumberConst::MaxValue => (
            CsExpr::member(CsExpr::ident("double"), "MaxValue"),
            TypeId::DOUBLE,
        ),
        NumberConst::MinValue => (float_literal(5e-324), TypeId::DOUBLE),
        NumberConst::Epsilon => (float_literal(f64::EPSILON), TypeId::DOUBLE),
        NumberConst::PositiveInfinity => (
            CsExpr::member(CsExpr::ident("double"), "PositiveInfinity"),
            TypeId::DOUBLE,
        ),
        NumberConst::NegativeInfinity => (
            CsExpr::member(CsExpr::ident("double"), "NegativeInfinity"),
            TypeId::DOUBLE,
        ),
        NumberConst::NaN => (
            CsExpr::member(CsExpr::ident("double"), "NaN"),
            TypeId::DOUBLE,
        ),
    }
}

fn float_literal(value: f64) -> CsExpr {
    CsExpr::Literal {
        value: CsLiteral::Float(value),
        ty: TypeId::DOUBLE,
    }
}
