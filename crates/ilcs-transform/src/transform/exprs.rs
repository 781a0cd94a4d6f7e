//! Expression transformation: the main dispatch plus the operator rules.

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{CsAssignOp, CsBinaryOp, CsExpr, CsLiteral, CsUnaryOp};
use ilcs_csharp::registry::{arithmetic_result, needs_narrow, promote_small, shift_result, widen};
use ilcs_csharp::types::{CsType, TypeId};
use ilcs_il::{
    AssignOp, BinaryOp, IlMemberProperty, IlNode, IlValue, LogicalOp, UnaryOp, UpdateOp,
};

use super::Transformer;
use crate::infer::{infer_type, int_literal_type, name_heuristic};

impl<'a> Transformer<'a> {
    /// Transform an IL expression into a C# expression plus its type.
    pub(crate) fn transform_expr(&mut self, node: &IlNode) -> Result<(CsExpr, TypeId), Fatal> {
        match node {
            IlNode::Literal { value } => Ok(self.transform_literal(value)),
            IlNode::Identifier { name } => Ok(self.transform_identifier(name)),
            IlNode::This => Ok((CsExpr::This, infer_type(self.ctx, node)?)),
            IlNode::Super => Ok((CsExpr::Base, infer_type(self.ctx, node)?)),
            IlNode::Member { object, property } => self.transform_member(node, object, property),
            IlNode::ThisPropertyAccess { property } => Ok(self.transform_this_property(property)),
            IlNode::ThisMethodCall { method, args } => self.transform_this_method_call(method, args),
            IlNode::ParentMethodCall { method, args } => {
                self.transform_parent_method_call(method, args)
            }
            IlNode::ParentConstructorCall { .. } => {
                Ok(self.unhandled(node, "super() outside constructor head"))
            }
            IlNode::Call { callee, args } => self.transform_call(callee, args),
            IlNode::New { callee, args } => self.transform_new(callee, args),

            IlNode::Binary { op, left, right } => self.transform_binary(*op, left, right),
            IlNode::Logical { op, left, right } => self.transform_logical(*op, left, right),
            IlNode::Unary { op, operand } => self.transform_unary(*op, operand),
            IlNode::Update { op, prefix, target } => self.transform_update(*op, *prefix, target),
            IlNode::Assignment { op, target, value } => {
                self.transform_assignment(*op, target, value)
            }
            IlNode::Conditional {
                cond,
                then_branch,
                else_branch,
            } => self.transform_conditional(cond, then_branch, else_branch),
            IlNode::Sequence { exprs } => {
                // C# has no comma operator; only the final value survives
                // in expression position.
                if exprs.len() > 1 {
                    self.ctx.warn(
                        DiagnosticKind::UnhandledNode,
                        "sequence expression collapsed to its last operand",
                    );
                }
                match exprs.last() {
                    Some(last) => self.transform_expr(last),
                    None => Ok((CsExpr::null(), TypeId::DYNAMIC)),
                }
            }
            IlNode::Spread { argument } => {
                self.ctx.warn(
                    DiagnosticKind::UnhandledNode,
                    "spread outside call/literal position",
                );
                self.transform_expr(argument)
            }

            IlNode::Template { parts } | IlNode::StringInterpolation { parts } => {
                self.transform_interpolation(parts)
            }
            IlNode::ArrayLiteral { elements } => self.transform_array_literal(elements),
            IlNode::ObjectLiteral { properties } => self.transform_object_literal(properties),
            IlNode::ArrowFunction {
                params,
                body,
                is_expression,
            } => self.transform_arrow(params, body, *is_expression),

            // IL-lowered primitives live in their own modules.
            IlNode::RotateLeft { .. }
            | IlNode::RotateRight { .. }
            | IlNode::PackBytes { .. }
            | IlNode::UnpackBytes { .. }
            | IlNode::Cast { .. }
            | IlNode::BigIntCast { .. }
            | IlNode::ByteBufferView { .. }
            | IlNode::DataViewRead { .. }
            | IlNode::DataViewWrite { .. }
            | IlNode::OpCodesCall { .. }
            | IlNode::Clz32 { .. }
            | IlNode::Imul { .. }
            | IlNode::MathCall { .. }
            | IlNode::MathConstant { .. }
            | IlNode::NumberConstant { .. }
            | IlNode::Random
            | IlNode::IsFinite { .. }
            | IlNode::IsNaN { .. }
            | IlNode::IsInteger { .. } => self.transform_numeric_primitive(node),

            IlNode::ArrayLength { .. }
            | IlNode::ArrayAppend { .. }
            | IlNode::ArraySlice { .. }
            | IlNode::ArrayFill { .. }
            | IlNode::ArrayXor { .. }
            | IlNode::ArrayClear { .. }
            | IlNode::ArrayIndexOf { .. }
            | IlNode::ArrayIncludes { .. }
            | IlNode::ArrayConcat { .. }
            | IlNode::ArrayJoin { .. }
            | IlNode::ArrayReverse { .. }
            | IlNode::ArrayReduce { .. }
            | IlNode::ArrayMap { .. }
            | IlNode::ArrayFilter { .. }
            | IlNode::ArrayForEach { .. }
            | IlNode::ArrayFind { .. }
            | IlNode::ArrayFindIndex { .. }
            | IlNode::ArrayEvery { .. }
            | IlNode::ArraySome { .. }
            | IlNode::ArraySort { .. }
            | IlNode::ArrayPop { .. }
            | IlNode::ArrayShift { .. }
            | IlNode::ArrayCreation { .. }
            | IlNode::ArraySplice { .. }
            | IlNode::TypedArrayCreation { .. }
            | IlNode::TypedArraySet { .. }
            | IlNode::TypedArraySubarray { .. }
            | IlNode::ArrayFrom { .. }
            | IlNode::IsArrayCheck { .. } => self.transform_array_op(node),

            IlNode::HexEncode { .. }
            | IlNode::HexDecode { .. }
            | IlNode::StringToBytes { .. }
            | IlNode::BytesToString { .. }
            | IlNode::StringCharCodeAt { .. }
            | IlNode::StringCharAt { .. }
            | IlNode::StringSubstring { .. }
            | IlNode::StringReplace { .. }
            | IlNode::StringSplit { .. }
            | IlNode::StringIndexOf { .. }
            | IlNode::StringIncludes { .. }
            | IlNode::StringToUpperCase { .. }
            | IlNode::StringToLowerCase { .. }
            | IlNode::StringTrim { .. }
            | IlNode::StringRepeat { .. }
            | IlNode::StringPadStart { .. }
            | IlNode::StringStartsWith { .. }
            | IlNode::StringFromCharCodes { .. } => self.transform_string_op(node),

            IlNode::MapCreation
            | IlNode::MapGet { .. }
            | IlNode::MapSet { .. }
            | IlNode::MapHas { .. }
            | IlNode::MapDelete { .. }
            | IlNode::SetCreation
            | IlNode::ObjectKeys { .. }
            | IlNode::ObjectValues { .. }
            | IlNode::ObjectEntries { .. }
            | IlNode::ObjectCreate { .. }
            | IlNode::ObjectFreeze { .. }
            | IlNode::ErrorCreation { .. }
            | IlNode::DebugOutput { .. } => self.transform_object_op(node),

            IlNode::InstanceOfCheck { value, class_name } => {
                let (expr, _) = self.transform_expr(value)?;
                let ty = self.ctx.interner.generic(class_name.clone(), Vec::new());
                Ok((
                    CsExpr::Is {
                        expr: Box::new(expr),
                        ty,
                    },
                    TypeId::BOOL,
                ))
            }
            IlNode::TypeOfExpression { value } => {
                // Standalone typeof (not compared to a literal) has no
                // faithful C# equivalent.
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "standalone typeof emitted as GetType().Name",
                );
                let (expr, _) = self.transform_expr(value)?;
                Ok((
                    CsExpr::member(CsExpr::call(expr, "GetType", vec![]), "Name"),
                    TypeId::STRING,
                ))
            }
            IlNode::DestructuringAssignment { .. } => {
                Ok(self.unhandled(node, "destructuring in expression position"))
            }

            // Structure and statement nodes cannot appear in expression
            // position; the IL is malformed.
            other => Err(self.ctx.fatal_malformed(
                other.kind_name(),
                "structure/statement node in expression position",
            )),
        }
    }

    fn transform_literal(&mut self, value: &IlValue) -> (CsExpr, TypeId) {
        match value {
            IlValue::Null => (CsExpr::null(), TypeId::DYNAMIC),
            IlValue::Bool(b) => (CsExpr::bool(*b), TypeId::BOOL),
            IlValue::Int(v) => {
                let ty = int_literal_type(*v);
                (
                    CsExpr::Literal {
                        value: CsLiteral::Int(*v),
                        ty,
                    },
                    ty,
                )
            }
            IlValue::Float(v) => (
                CsExpr::Literal {
                    value: CsLiteral::Float(*v),
                    ty: TypeId::DOUBLE,
                },
                TypeId::DOUBLE,
            ),
            IlValue::Str(s) => (CsExpr::str(s.clone()), TypeId::STRING),
            IlValue::BigInt(text) => match text.parse::<i64>() {
                Ok(v) => (
                    CsExpr::Literal {
                        value: CsLiteral::Int(v),
                        ty: TypeId::LONG,
                    },
                    TypeId::LONG,
                ),
                Err(_) => match text.parse::<u64>() {
                    Ok(v) => (
                        CsExpr::Literal {
                            value: CsLiteral::UInt(v),
                            ty: TypeId::ULONG,
                        },
                        TypeId::ULONG,
                    ),
                    Err(_) => {
                        self.ctx.warn(
                            DiagnosticKind::AmbiguousType,
                            format!("BigInt literal `{text}` exceeds 64 bits"),
                        );
                        (CsExpr::Raw(format!("{text}UL")), TypeId::ULONG)
                    }
                },
            },
        }
    }

    fn transform_identifier(&mut self, name: &str) -> (CsExpr, TypeId) {
        if let Some(ty) = self.ctx.scopes.lookup(name) {
            let target = self
                .ctx
                .scopes
                .target_name(name)
                .unwrap_or(name)
                .to_string();
            return (CsExpr::ident(ilcs_common::escape_reserved(&target)), ty);
        }
        if self.ctx.known_classes.contains(name) || self.ctx.kb.is_known_class(name) {
            let ty = self.ctx.interner.generic(name.to_string(), Vec::new());
            return (CsExpr::ident(name.to_string()), ty);
        }
        if name == "OpCodes" {
            return (CsExpr::ident("OpCodes"), TypeId::DYNAMIC);
        }
        self.ctx.warn(
            DiagnosticKind::UnresolvedIdentifier,
            format!("identifier `{name}` resolved through no scope"),
        );
        (
            CsExpr::ident(ilcs_common::escape_reserved(name)),
            name_heuristic(name),
        )
    }

    fn transform_this_property(&mut self, property: &str) -> (CsExpr, TypeId) {
        let class = self.ctx.current_class.clone().unwrap_or_default();
        let ty = {
            // Own fields first, then inherited framework properties.
            if let Some(field_ty) = self.ctx.field_type(&class, property) {
                field_ty
            } else if let Some(parent) = self.ctx.current_parent.clone() {
                match self.ctx.kb.lookup_property(&parent, property) {
                    Some((_, ty_str)) => {
                        crate::framework::parse_type_str(&self.ctx.interner, ty_str)
                    }
                    None => name_heuristic(property),
                }
            } else {
                name_heuristic(property)
            }
        };
        let name = if self.ctx.field_type(&class, property).is_some() {
            self.ctx.field_target_name(&class, property)
        } else if let Some(parent) = self.ctx.current_parent.clone() {
            match self.ctx.kb.lookup_property(&parent, property) {
                Some((canonical, _)) => canonical.to_string(),
                None => ilcs_common::to_pascal_case(property),
            }
        } else {
            ilcs_common::to_pascal_case(property)
        };
        (CsExpr::member(CsExpr::This, name), ty)
    }

    fn transform_member(
        &mut self,
        node: &IlNode,
        object: &IlNode,
        property: &IlMemberProperty,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        match property {
            IlMemberProperty::Dotted(name) => {
                // Static member access on a declared class.
                if let IlNode::Identifier { name: class } = object {
                    if self.ctx.scopes.lookup(class).is_none() {
                        if let Some(result) = self.class_static_member(class, name) {
                            return Ok(result);
                        }
                    }
                }
                let (obj_expr, obj_ty) = self.transform_expr(object)?;
                if name == "length" {
                    return Ok((CsExpr::member(obj_expr, "Length"), TypeId::INT));
                }
                let ty = infer_type(self.ctx, node)?;
                // Tuple elements keep their declared PascalCase names.
                if let CsType::Tuple(elems) = self.ctx.interner.lookup(obj_ty) {
                    let wanted = ilcs_common::to_pascal_case(name);
                    if let Some(elem) = elems
                        .iter()
                        .find(|e| e.name.eq_ignore_ascii_case(&wanted))
                    {
                        return Ok((CsExpr::member(obj_expr, elem.name.clone()), elem.ty));
                    }
                }
                Ok((
                    CsExpr::member(obj_expr, ilcs_common::to_pascal_case(name)),
                    ty,
                ))
            }
            IlMemberProperty::Computed(index) => {
                // `"A"[0]` is a char literal outright.
                if let (
                    IlNode::Literal {
                        value: IlValue::Str(s),
                    },
                    IlNode::Literal {
                        value: IlValue::Int(i),
                    },
                ) = (object, &**index)
                {
                    if let Some(c) = s.chars().nth(*i as usize) {
                        return Ok((
                            CsExpr::Literal {
                                value: CsLiteral::Char(c),
                                ty: TypeId::CHAR,
                            },
                            TypeId::CHAR,
                        ));
                    }
                }
                let (obj_expr, _) = self.transform_expr(object)?;
                let (index_expr, index_ty) = self.transform_expr(index)?;
                let elem_ty = infer_type(self.ctx, node)?;
                // Dictionary-style access keeps string keys; array access
                // coerces the index to int.
                let index_expr = if index_ty == TypeId::STRING {
                    index_expr
                } else {
                    self.coerce_assign(index_expr, index_ty, TypeId::INT)
                };
                Ok((CsExpr::index(obj_expr, index_expr), elem_ty))
            }
        }
    }

    // =====================================================================
    // Operators
    // =====================================================================

    pub(crate) fn transform_binary(
        &mut self,
        op: BinaryOp,
        left: &IlNode,
        right: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        // typeof x === "string" and friends fold to `is` patterns.
        if let Some(result) = self.try_typeof_comparison(op, left, right)? {
            return Ok(result);
        }

        let (left_expr, left_ty) = self.transform_expr(left)?;
        let is_zero_shift = matches!(
            right,
            IlNode::Literal {
                value: IlValue::Int(0)
            }
        );
        if op == BinaryOp::UShr && is_zero_shift {
            // `x >>> 0`: a forced coercion to uint. Mandatory cast unless
            // the operand already is one.
            if left_ty == TypeId::UINT {
                return Ok((left_expr, TypeId::UINT));
            }
            return Ok((CsExpr::cast(TypeId::UINT, left_expr), TypeId::UINT));
        }
        let (right_expr, right_ty) = self.transform_expr(right)?;
        self.build_binary(op, (left_expr, left_ty), (right_expr, right_ty))
    }

    /// Operator emission with the promotion/cast rules applied. Both
    /// operands are already transformed.
    pub(crate) fn build_binary(
        &mut self,
        op: BinaryOp,
        (left_expr, left_ty): (CsExpr, TypeId),
        (right_expr, right_ty): (CsExpr, TypeId),
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if op.is_comparison() {
            return Ok(self.build_comparison(op, (left_expr, left_ty), (right_expr, right_ty)));
        }

        if op == BinaryOp::UShr {
            // Shift on the unsigned reinterpretation of the left operand.
            let promoted = promote_small(&self.ctx.interner, left_ty);
            let (unsigned_ty, needs_cast) =
                if promoted == TypeId::LONG || promoted == TypeId::ULONG {
                    (TypeId::ULONG, promoted != TypeId::ULONG)
                } else {
                    (TypeId::UINT, promoted != TypeId::UINT)
                };
            let left_expr = if needs_cast {
                CsExpr::cast(unsigned_ty, left_expr)
            } else {
                left_expr
            };
            let right_expr = self.coerce_assign(right_expr, right_ty, TypeId::INT);
            return Ok((
                CsExpr::binary(CsBinaryOp::Shr, left_expr, right_expr),
                unsigned_ty,
            ));
        }

        if op.is_shift() {
            let result = shift_result(&self.ctx.interner, left_ty);
            let right_expr = self.coerce_assign(right_expr, right_ty, TypeId::INT);
            let cs_op = match op {
                BinaryOp::Shl => CsBinaryOp::Shl,
                _ => CsBinaryOp::Shr,
            };
            return Ok((CsExpr::binary(cs_op, left_expr, right_expr), result));
        }

        let result = arithmetic_result(&self.ctx.interner, left_ty, right_ty)
            .map_err(|e| self.ctx.fatal_invariant("Binary", e.message))?;

        // 64-bit parity: bitwise mixing of a 64-bit operand with a
        // narrower one casts the narrow side up.
        let (left_expr, right_expr) = if op.is_bitwise() && is_64_bit(&self.ctx.interner, result) {
            let left_expr = if !is_64_bit(&self.ctx.interner, left_ty) {
                CsExpr::cast(result, left_expr)
            } else {
                left_expr
            };
            let right_expr = if !is_64_bit(&self.ctx.interner, right_ty) {
                CsExpr::cast(result, right_expr)
            } else {
                right_expr
            };
            (left_expr, right_expr)
        } else {
            (left_expr, right_expr)
        };

        let cs_op = match op {
            BinaryOp::Add => CsBinaryOp::Add,
            BinaryOp::Sub => CsBinaryOp::Sub,
            BinaryOp::Mul => CsBinaryOp::Mul,
            BinaryOp::Div => CsBinaryOp::Div,
            BinaryOp::Rem => CsBinaryOp::Rem,
            BinaryOp::BitAnd => CsBinaryOp::BitAnd,
            BinaryOp::BitOr => CsBinaryOp::BitOr,
            BinaryOp::BitXor => CsBinaryOp::BitXor,
            _ => unreachable!("shifts and comparisons handled above"),
        };
        Ok((CsExpr::binary(cs_op, left_expr, right_expr), result))
    }

    fn build_comparison(
        &mut self,
        op: BinaryOp,
        (left_expr, left_ty): (CsExpr, TypeId),
        (right_expr, right_ty): (CsExpr, TypeId),
    ) -> (CsExpr, TypeId) {
        let relational = matches!(
            op,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        );
        let cs_op = match op {
            BinaryOp::Eq | BinaryOp::StrictEq => CsBinaryOp::Eq,
            BinaryOp::Ne | BinaryOp::StrictNe => CsBinaryOp::Ne,
            BinaryOp::Lt => CsBinaryOp::Lt,
            BinaryOp::Le => CsBinaryOp::Le,
            BinaryOp::Gt => CsBinaryOp::Gt,
            BinaryOp::Ge => CsBinaryOp::Ge,
            _ => unreachable!(),
        };

        if relational && (left_ty == TypeId::STRING || right_ty == TypeId::STRING) {
            // Both single-char literals compare as chars; everything else
            // goes through string.Compare.
            let left_char = as_char_literal(&left_expr);
            let right_char = as_char_literal(&right_expr);
            if let (Some(lc), Some(rc)) = (left_char, right_char) {
                return (
                    CsExpr::binary(
                        cs_op,
                        CsExpr::Literal {
                            value: CsLiteral::Char(lc),
                            ty: TypeId::CHAR,
                        },
                        CsExpr::Literal {
                            value: CsLiteral::Char(rc),
                            ty: TypeId::CHAR,
                        },
                    ),
                    TypeId::BOOL,
                );
            }
            let compare = CsExpr::call(
                CsExpr::ident("string"),
                "Compare",
                vec![left_expr, right_expr],
            );
            return (
                CsExpr::binary(cs_op, compare, CsExpr::int(0)),
                TypeId::BOOL,
            );
        }

        // Mixed signedness in a comparison follows the assignment rules:
        // cast the side that needs narrowing toward the common type.
        let common = widen(&self.ctx.interner, left_ty, right_ty).unwrap_or(TypeId::DYNAMIC);
        let left_expr = if self.ctx.interner.is_numeric(common)
            && needs_narrow(&self.ctx.interner, left_ty, common)
        {
            CsExpr::cast(common, left_expr)
        } else {
            left_expr
        };
        let right_expr = if self.ctx.interner.is_numeric(common)
            && needs_narrow(&self.ctx.interner, right_ty, common)
        {
            CsExpr::cast(common, right_expr)
        } else {
            right_expr
        };
        (CsExpr::binary(cs_op, left_expr, right_expr), TypeId::BOOL)
    }

    /// `typeof x === "string"` folds to `x is string` (negated for the
    /// inequality forms); when the operand's type is statically known the
    /// whole comparison folds to a constant.
    fn try_typeof_comparison(
        &mut self,
        op: BinaryOp,
        left: &IlNode,
        right: &IlNode,
    ) -> Result<Option<(CsExpr, TypeId)>, Fatal> {
        if !op.is_comparison() {
            return Ok(None);
        }
        let (type_of, literal) = match (left, right) {
            (
                IlNode::TypeOfExpression { value },
                IlNode::Literal {
                    value: IlValue::Str(s),
                },
            ) => (value, s),
            (
                IlNode::Literal {
                    value: IlValue::Str(s),
                },
                IlNode::TypeOfExpression { value },
            ) => (value, s),
            _ => return Ok(None),
        };
        let negated = matches!(op, BinaryOp::Ne | BinaryOp::StrictNe);
        let tested = match literal.as_str() {
            "string" => TypeId::STRING,
            "number" => TypeId::DOUBLE,
            "boolean" => TypeId::BOOL,
            "object" => TypeId::DYNAMIC,
            _ => return Ok(None),
        };

        let operand_ty = infer_type(self.ctx, type_of)?;
        // Statically decidable: fold to the constant of the right sense.
        if operand_ty != TypeId::DYNAMIC {
            let matches_test = match literal.as_str() {
                "string" => operand_ty == TypeId::STRING,
                "number" => self.ctx.interner.is_numeric(operand_ty),
                "boolean" => operand_ty == TypeId::BOOL,
                "object" => self.ctx.interner.is_array(operand_ty),
                _ => false,
            };
            return Ok(Some((CsExpr::bool(matches_test != negated), TypeId::BOOL)));
        }

        let (expr, _) = self.transform_expr(type_of)?;
        let is_expr = CsExpr::Is {
            expr: Box::new(expr),
            ty: tested,
        };
        let result = if negated {
            CsExpr::Unary {
                op: CsUnaryOp::Not,
                operand: Box::new(is_expr),
            }
        } else {
            is_expr
        };
        Ok(Some((result, TypeId::BOOL)))
    }

    fn transform_logical(
        &mut self,
        op: LogicalOp,
        left: &IlNode,
        right: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (left_expr, left_ty) = self.transform_expr(left)?;
        let (right_expr, right_ty) = self.transform_expr(right)?;

        if left_ty == TypeId::BOOL && right_ty == TypeId::BOOL {
            let cs_op = match op {
                LogicalOp::And => CsBinaryOp::And,
                LogicalOp::Or => CsBinaryOp::Or,
                LogicalOp::Nullish => CsBinaryOp::NullCoalesce,
            };
            return Ok((CsExpr::binary(cs_op, left_expr, right_expr), TypeId::BOOL));
        }

        let result = widen(&self.ctx.interner, left_ty, right_ty).unwrap_or(TypeId::DYNAMIC);
        match op {
            // `a || b` / `a ?? b` on references: null-coalescing.
            LogicalOp::Or | LogicalOp::Nullish
                if self.ctx.interner.is_reference(left_ty) || left_ty == TypeId::DYNAMIC =>
            {
                Ok((
                    CsExpr::binary(CsBinaryOp::NullCoalesce, left_expr, right_expr),
                    result,
                ))
            }
            // Numeric `a || b` keeps JS default-value semantics.
            LogicalOp::Or | LogicalOp::Nullish => Ok((
                CsExpr::Conditional {
                    cond: Box::new(CsExpr::not_zero(left_expr.clone())),
                    then_branch: Box::new(left_expr),
                    else_branch: Box::new(right_expr),
                },
                result,
            )),
            LogicalOp::And => {
                let cond = self.truthy_of(left_expr.clone(), left_ty);
                Ok((
                    CsExpr::Conditional {
                        cond: Box::new(cond),
                        then_branch: Box::new(right_expr),
                        else_branch: Box::new(left_expr),
                    },
                    result,
                ))
            }
        }
    }

    fn transform_unary(
        &mut self,
        op: UnaryOp,
        operand: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        match op {
            UnaryOp::Not => {
                let negated = self.negated_condition(operand)?;
                Ok((negated, TypeId::BOOL))
            }
            UnaryOp::Minus => {
                let (expr, ty) = self.transform_expr(operand)?;
                // Negating an unsigned operand requires widening first.
                let expr = if ty == TypeId::UINT || ty == TypeId::ULONG {
                    CsExpr::cast(TypeId::LONG, expr)
                } else {
                    expr
                };
                let ty = if ty == TypeId::UINT || ty == TypeId::ULONG {
                    TypeId::LONG
                } else {
                    promote_small(&self.ctx.interner, ty)
                };
                Ok((
                    CsExpr::Unary {
                        op: CsUnaryOp::Minus,
                        operand: Box::new(expr),
                    },
                    ty,
                ))
            }
            UnaryOp::Plus => {
                // JS `+x` is a numeric coercion; C# unary plus is a no-op,
                // so emit the coercion explicitly for non-numerics.
                let (expr, ty) = self.transform_expr(operand)?;
                if self.ctx.interner.is_numeric(ty) {
                    Ok((expr, promote_small(&self.ctx.interner, ty)))
                } else {
                    Ok((
                        CsExpr::call(CsExpr::ident("double"), "Parse", vec![expr]),
                        TypeId::DOUBLE,
                    ))
                }
            }
            UnaryOp::BitNot => {
                let (expr, ty) = self.transform_expr(operand)?;
                let promoted = promote_small(&self.ctx.interner, ty);
                let result = if self.ctx.interner.is_integer(promoted) {
                    promoted
                } else {
                    TypeId::INT
                };
                Ok((
                    CsExpr::Unary {
                        op: CsUnaryOp::BitNot,
                        operand: Box::new(expr),
                    },
                    result,
                ))
            }
            UnaryOp::Void => {
                self.ctx
                    .warn(DiagnosticKind::UnhandledNode, "void operator has no C# form");
                let (expr, _) = self.transform_expr(operand)?;
                Ok((expr, TypeId::DYNAMIC))
            }
        }
    }

    fn transform_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (expr, ty) = self.transform_expr(target)?;
        let cs_op = match (op, prefix) {
            (UpdateOp::Increment, true) => CsUnaryOp::PreIncrement,
            (UpdateOp::Increment, false) => CsUnaryOp::PostIncrement,
            (UpdateOp::Decrement, true) => CsUnaryOp::PreDecrement,
            (UpdateOp::Decrement, false) => CsUnaryOp::PostDecrement,
        };
        Ok((
            CsExpr::Unary {
                op: cs_op,
                operand: Box::new(expr),
            },
            ty,
        ))
    }

    pub(crate) fn transform_assignment(
        &mut self,
        op: AssignOp,
        target: &IlNode,
        value: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (target_expr, target_ty) = self.transform_expr(target)?;

        match op.binary_op() {
            None => {
                // Plain `=`: the RHS is coerced to the LHS type; array
                // targets push their element type as context.
                let rhs = if self.ctx.interner.is_array(target_ty) {
                    let elem = self
                        .ctx
                        .interner
                        .element_of(target_ty)
                        .unwrap_or(TypeId::BYTE);
                    self.ctx.elem_context.push(elem);
                    let result = self.transform_expr(value);
                    self.ctx.elem_context.pop();
                    result?
                } else {
                    self.transform_expr(value)?
                };
                let (rhs_expr, rhs_ty) = rhs;
                let rhs_expr = self.coerce_assign(rhs_expr, rhs_ty, target_ty);
                Ok((
                    CsExpr::Assignment {
                        op: CsAssignOp::Assign,
                        target: Box::new(target_expr),
                        value: Box::new(rhs_expr),
                    },
                    target_ty,
                ))
            }
            Some(bin) => {
                let (value_expr, value_ty) = self.transform_expr(value)?;
                // The type the equivalent binary expression would have.
                let result_ty = if bin == BinaryOp::UShr {
                    TypeId::UINT
                } else if bin.is_shift() {
                    shift_result(&self.ctx.interner, target_ty)
                } else {
                    arithmetic_result(&self.ctx.interner, target_ty, value_ty)
                        .map_err(|e| self.ctx.fatal_invariant("Assignment", e.message))?
                };

                let widens = result_ty != target_ty
                    && needs_narrow(&self.ctx.interner, result_ty, target_ty);
                if widens || bin == BinaryOp::UShr {
                    // `lhs op= rhs` would not compile once the operator
                    // widens; rewrite to `lhs = (T)(lhs op rhs)`.
                    let (binary, binary_ty) = self.build_binary(
                        bin,
                        (target_expr.clone(), target_ty),
                        (value_expr, value_ty),
                    )?;
                    let cast = self.coerce_assign(binary, binary_ty, target_ty);
                    return Ok((
                        CsExpr::Assignment {
                            op: CsAssignOp::Assign,
                            target: Box::new(target_expr),
                            value: Box::new(cast),
                        },
                        target_ty,
                    ));
                }

                let cs_op = match bin {
                    BinaryOp::Add => CsAssignOp::Add,
                    BinaryOp::Sub => CsAssignOp::Sub,
                    BinaryOp::Mul => CsAssignOp::Mul,
                    BinaryOp::Div => CsAssignOp::Div,
                    BinaryOp::Rem => CsAssignOp::Rem,
                    BinaryOp::BitAnd => CsAssignOp::BitAnd,
                    BinaryOp::BitOr => CsAssignOp::BitOr,
                    BinaryOp::BitXor => CsAssignOp::BitXor,
                    BinaryOp::Shl => CsAssignOp::Shl,
                    _ => CsAssignOp::Shr,
                };
                let value_expr = if bin.is_shift() {
                    self.coerce_assign(value_expr, value_ty, TypeId::INT)
                } else {
                    self.coerce_assign(value_expr, value_ty, target_ty)
                };
                Ok((
                    CsExpr::Assignment {
                        op: cs_op,
                        target: Box::new(target_expr),
                        value: Box::new(value_expr),
                    },
                    target_ty,
                ))
            }
        }
    }

    fn transform_conditional(
        &mut self,
        cond: &IlNode,
        then_branch: &IlNode,
        else_branch: &IlNode,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        // Constant conditions select their branch outright.
        if let IlNode::Literal {
            value: IlValue::Bool(b),
        } = cond
        {
            return if *b {
                self.transform_expr(then_branch)
            } else {
                self.transform_expr(else_branch)
            };
        }

        // `Array.isArray(x) ? x : convert(x)` with x already known to be
        // an array collapses to `x ?? Array.Empty<T>()`.
        if let (IlNode::IsArrayCheck { value }, IlNode::Identifier { name }) = (cond, then_branch) {
            if let IlNode::Identifier { name: checked } = &**value {
                if checked == name {
                    let known = self.ctx.scopes.lookup(name);
                    if let Some(ty) = known {
                        if self.ctx.interner.is_array(ty) {
                            let elem = self
                                .ctx
                                .interner
                                .element_of(ty)
                                .unwrap_or(TypeId::BYTE);
                            let (expr, _) = self.transform_expr(then_branch)?;
                            let empty = CsExpr::invoke(
                                CsExpr::member(
                                    CsExpr::ident("Array"),
                                    format!("Empty<{}>", self.ctx.interner.display(elem)),
                                ),
                                vec![],
                            );
                            return Ok((
                                CsExpr::binary(CsBinaryOp::NullCoalesce, expr, empty),
                                ty,
                            ));
                        }
                    }
                }
            }
        }

        let cond_expr = self.condition(cond)?;
        let (then_expr, then_ty) = self.transform_expr(then_branch)?;
        let (else_expr, else_ty) = self.transform_expr(else_branch)?;
        let result = widen(&self.ctx.interner, then_ty, else_ty).unwrap_or(TypeId::DYNAMIC);
        let then_expr = self.coerce_assign(then_expr, then_ty, result);
        let else_expr = self.coerce_assign(else_expr, else_ty, result);
        Ok((
            CsExpr::Conditional {
                cond: Box::new(cond_expr),
                then_branch: Box::new(then_expr),
                else_branch: Box::new(else_expr),
            },
            result,
        ))
    }

    // =====================================================================
    // Conditions (type-directed truthiness)
    // =====================================================================

    /// Rewrite an IL expression for a boolean condition position.
    pub(crate) fn condition(&mut self, node: &IlNode) -> Result<CsExpr, Fatal> {
        match node {
            // Short-circuit operators stay boolean operators in condition
            // position, each side rewritten recursively.
            IlNode::Logical {
                op: LogicalOp::And,
                left,
                right,
            } => {
                let left = self.condition(left)?;
                let right = self.condition(right)?;
                Ok(CsExpr::binary(CsBinaryOp::And, left, right))
            }
            IlNode::Logical {
                op: LogicalOp::Or,
                left,
                right,
            } => {
                let left = self.condition(left)?;
                let right = self.condition(right)?;
                Ok(CsExpr::binary(CsBinaryOp::Or, left, right))
            }
            IlNode::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.negated_condition(operand),
            _ => {
                let (expr, ty) = self.transform_expr(node)?;
                Ok(self.truthy_of(expr, ty))
            }
        }
    }

    /// The truthiness rewrite for an already-transformed operand.
    pub(crate) fn truthy_of(&self, expr: CsExpr, ty: TypeId) -> CsExpr {
        if ty == TypeId::BOOL {
            return expr;
        }
        if self.ctx.interner.is_numeric(ty) {
            return CsExpr::not_zero(expr);
        }
        if ty == TypeId::CHAR {
            return CsExpr::binary(
                CsBinaryOp::Ne,
                expr,
                CsExpr::Literal {
                    value: CsLiteral::Char('\0'),
                    ty: TypeId::CHAR,
                },
            );
        }
        // Strings, arrays, generics, object: null check.
        CsExpr::not_null(expr)
    }

    /// `!x`, rewritten per the operand type and inverted.
    fn negated_condition(&mut self, operand: &IlNode) -> Result<CsExpr, Fatal> {
        let (expr, ty) = self.transform_expr(operand)?;
        if ty == TypeId::BOOL {
            return Ok(CsExpr::Unary {
                op: CsUnaryOp::Not,
                operand: Box::new(expr),
            });
        }
        if self.ctx.interner.is_numeric(ty) {
            return Ok(CsExpr::binary(CsBinaryOp::Eq, expr, CsExpr::int(0)));
        }
        Ok(CsExpr::binary(CsBinaryOp::Eq, expr, CsExpr::null()))
    }
}

fn is_64_bit(interner: &ilcs_csharp::types::TypeInterner, ty: TypeId) -> bool {
    interner
        .primitive(ty)
        .is_some_and(|k| k.is_integer() && k.width() == Some(64))
}

fn as_char_literal(expr: &CsExpr) -> Option<char> {
    match expr {
        CsExpr::Literal {
            value: CsLiteral::Str(s),
            ..
        } if s.chars().count() == 1 => s.chars().next(),
        CsExpr::Literal {
            value: CsLiteral::Char(c),
            ..
        } => Some(*c),
        _ => None,
    }
}
