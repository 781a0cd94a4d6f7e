//! Collection rewrites: JS array idioms onto .NET arrays and LINQ.
//!
//! Mutating idioms (`push`, `fill`, in-place `sort`, `splice`) have a
//! statement form (the rewrite reassigns or calls an in-place helper) and
//! a degraded expression form that warns; fixed-size .NET arrays leave no
//! better option.

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{CsAssignOp, CsExpr, CsStmt};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlValue};

use super::Transformer;
use crate::infer::infer_type;

impl<'a> Transformer<'a> {
    pub(crate) fn transform_array_op(&mut self, node: &IlNode) -> Result<(CsExpr, TypeId), Fatal> {
        match node {
            IlNode::ArrayLength { array } => {
                let (a, _) = self.transform_expr(array)?;
                Ok((CsExpr::member(a, "Length"), TypeId::INT))
            }
            IlNode::ArrayAppend { array, items } => self.build_append(array, items),
            IlNode::ArraySlice { array, start, end } => {
                self.build_slice(array, start.as_deref(), end.as_deref())
            }
            IlNode::ArrayFill {
                array,
                value,
                start,
                end,
            } => self.build_fill_expr(array, value, start.as_deref(), end.as_deref()),
            IlNode::ArrayXor { array, other } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "in-place xor used in expression position",
                );
                let (a, _) = self.transform_expr(array)?;
                let (b, _) = self.transform_expr(other)?;
                Ok((CsExpr::opcodes_call("XorArrays", vec![a, b]), TypeId::VOID))
            }
            IlNode::ArrayClear { array } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "array clear used in expression position",
                );
                let (a, _) = self.transform_expr(array)?;
                Ok((
                    CsExpr::call(
                        CsExpr::ident("Array"),
                        "Clear",
                        vec![a.clone(), CsExpr::int(0), CsExpr::member(a, "Length")],
                    ),
                    TypeId::VOID,
                ))
            }
            IlNode::ArrayIndexOf { array, value } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let (v, _) = self.transform_expr(value)?;
                if self.ctx.options.debug_index_of {
                    tracing::debug!(
                        target_ty = %self.ctx.interner.display(a_ty),
                        "indexOf disambiguation"
                    );
                }
                if a_ty == TypeId::STRING {
                    Ok((CsExpr::call(a, "IndexOf", vec![v]), TypeId::INT))
                } else {
                    Ok((
                        CsExpr::call(CsExpr::ident("Array"), "IndexOf", vec![a, v]),
                        TypeId::INT,
                    ))
                }
            }
            IlNode::ArrayIncludes { array, value } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let (v, v_ty) = self.transform_expr(value)?;
                if self.ctx.options.debug_index_of {
                    tracing::debug!(
                        target_ty = %self.ctx.interner.display(a_ty),
                        "includes disambiguation"
                    );
                }
                let v = match self.ctx.interner.element_of(a_ty) {
                    Some(elem) => self.coerce_assign(v, v_ty, elem),
                    None => v,
                };
                Ok((CsExpr::call(a, "Contains", vec![v]), TypeId::BOOL))
            }
            IlNode::ArrayConcat { array, others } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let mut chain = a;
                for other in others {
                    let (b, _) = self.transform_expr(other)?;
                    chain = CsExpr::call(chain, "Concat", vec![b]);
                }
                Ok((CsExpr::call(chain, "ToArray", vec![]), a_ty))
            }
            IlNode::ArrayJoin { array, separator } => {
                let (a, _) = self.transform_expr(array)?;
                let sep = match separator {
                    Some(node) => self.transform_expr(node)?.0,
                    None => CsExpr::str(","),
                };
                Ok((
                    CsExpr::call(CsExpr::ident("string"), "Join", vec![sep, a]),
                    TypeId::STRING,
                ))
            }
            IlNode::ArrayReverse { array } => {
                // Expression position: a fresh reversed copy.
                let (a, a_ty) = self.transform_expr(array)?;
                Ok((
                    CsExpr::call(CsExpr::call(a, "Reverse", vec![]), "ToArray", vec![]),
                    a_ty,
                ))
            }
            IlNode::ArrayReduce {
                array,
                callback,
                initial,
            } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let result_ty = match initial {
                    Some(init) => infer_type(self.ctx, init)?,
                    None => elem,
                };
                let cb = self.transform_callback(callback, &[result_ty, elem])?;
                let args = match initial {
                    Some(init) => {
                        let (init_expr, _) = self.transform_expr(init)?;
                        vec![init_expr, cb]
                    }
                    None => vec![cb],
                };
                Ok((CsExpr::call(a, "Aggregate", args), result_ty))
            }
            IlNode::ArrayMap { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((
                    CsExpr::call(CsExpr::call(a, "Select", vec![cb]), "ToArray", vec![]),
                    a_ty,
                ))
            }
            IlNode::ArrayFilter { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((
                    CsExpr::call(CsExpr::call(a, "Where", vec![cb]), "ToArray", vec![]),
                    a_ty,
                ))
            }
            IlNode::ArrayForEach { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((
                    CsExpr::call(CsExpr::ident("Array"), "ForEach", vec![a, cb]),
                    TypeId::VOID,
                ))
            }
            IlNode::ArrayFind { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((CsExpr::call(a, "FirstOrDefault", vec![cb]), elem))
            }
            IlNode::ArrayFindIndex { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((
                    CsExpr::call(CsExpr::ident("Array"), "FindIndex", vec![a, cb]),
                    TypeId::INT,
                ))
            }
            IlNode::ArrayEvery { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((CsExpr::call(a, "All", vec![cb]), TypeId::BOOL))
            }
            IlNode::ArraySome { array, callback } => {
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                let cb = self.transform_callback(callback, &[elem])?;
                Ok((CsExpr::call(a, "Any", vec![cb]), TypeId::BOOL))
            }
            IlNode::ArraySort { array, comparator } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "in-place sort used in expression position",
                );
                let _ = comparator;
                let (a, a_ty) = self.transform_expr(array)?;
                let identity = CsExpr::Lambda {
                    params: vec!["x".to_string()],
                    body: Box::new(ilcs_csharp::ast::CsLambdaBody::Expr(CsExpr::ident("x"))),
                };
                Ok((
                    CsExpr::call(
                        CsExpr::call(a, "OrderBy", vec![identity]),
                        "ToArray",
                        vec![],
                    ),
                    a_ty,
                ))
            }
            IlNode::ArrayPop { array } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "pop in expression position reads without shrinking",
                );
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                Ok((CsExpr::call(a, "Last", vec![]), elem))
            }
            IlNode::ArrayShift { array } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "shift in expression position reads without shrinking",
                );
                let (a, a_ty) = self.transform_expr(array)?;
                let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
                Ok((CsExpr::call(a, "First", vec![]), elem))
            }
            IlNode::ArrayCreation { length } => {
                let elem = self.ctx.current_elem_context().unwrap_or(TypeId::UINT);
                let size = match length {
                    Some(len) => {
                        let (expr, len_ty) = self.transform_expr(len)?;
                        Some(Box::new(self.coerce_assign(expr, len_ty, TypeId::INT)))
                    }
                    None => Some(Box::new(CsExpr::int(0))),
                };
                Ok((
                    CsExpr::ArrayCreation {
                        elem,
                        size,
                        init: None,
                        jagged_inner: false,
                    },
                    self.ctx.interner.array_of(elem),
                ))
            }
            IlNode::ArraySplice {
                array,
                start,
                delete_count,
                ..
            } => {
                // The expression value of splice is the removed segment.
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "splice in expression position yields the removed slice only",
                );
                let (a, a_ty) = self.transform_expr(array)?;
                let (start_expr, start_ty) = self.transform_expr(start)?;
                let start_expr = self.coerce_assign(start_expr, start_ty, TypeId::INT);
                let end = match delete_count {
                    Some(count) => {
                        let (count_expr, count_ty) = self.transform_expr(count)?;
                        let count_expr =
                            self.coerce_assign(count_expr, count_ty, TypeId::INT);
                        CsExpr::binary(
                            ilcs_csharp::ast::CsBinaryOp::Add,
                            start_expr.clone(),
                            count_expr,
                        )
                    }
                    None => CsExpr::member(a.clone(), "Length"),
                };
                Ok((
                    CsExpr::opcodes_call("SliceArray", vec![a, start_expr, end]),
                    a_ty,
                ))
            }
            IlNode::TypedArrayCreation { element, arg } => {
                self.transform_typed_array_creation(*element, arg.as_deref())
            }
            IlNode::TypedArraySet { target, source, offset } => {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    "typed-array set used in expression position",
                );
                let mut stmts =
                    self.transform_typed_set_stmt(target, source, offset.as_deref())?;
                match stmts.pop() {
                    Some(CsStmt::Expr(expr)) => Ok((expr, TypeId::VOID)),
                    _ => Ok((CsExpr::null(), TypeId::VOID)),
                }
            }
            IlNode::TypedArraySubarray { array, start, end } => {
                self.build_slice(array, start.as_deref(), end.as_deref())
            }
            IlNode::ArrayFrom { source, mapper } => {
                let (src, src_ty) = self.transform_expr(source)?;
                if src_ty == TypeId::STRING {
                    return match mapper {
                        Some(cb) => {
                            let cb = self.transform_callback(cb, &[TypeId::CHAR])?;
                            Ok((
                                CsExpr::call(
                                    CsExpr::call(src, "Select", vec![cb]),
                                    "ToArray",
                                    vec![],
                                ),
                                self.ctx.interner.array_of(TypeId::CHAR),
                            ))
                        }
                        None => Ok((
                            CsExpr::call(src, "ToCharArray", vec![]),
                            self.ctx.interner.array_of(TypeId::CHAR),
                        )),
                    };
                }
                let ty = if self.ctx.interner.is_array(src_ty) {
                    src_ty
                } else {
                    TypeId::UINT_ARRAY
                };
                match mapper {
                    Some(cb) => {
                        let elem = self.ctx.interner.element_of(ty).unwrap_or(TypeId::DYNAMIC);
                        let cb = self.transform_callback(cb, &[elem])?;
                        Ok((
                            CsExpr::call(CsExpr::call(src, "Select", vec![cb]), "ToArray", vec![]),
                            ty,
                        ))
                    }
                    None => Ok((CsExpr::call(src, "ToArray", vec![]), ty)),
                }
            }
            IlNode::IsArrayCheck { value } => {
                let value_ty = infer_type(self.ctx, value)?;
                if value_ty != TypeId::DYNAMIC {
                    // Statically decided; dead-code eliminate the check.
                    return Ok((
                        CsExpr::bool(self.ctx.interner.is_array(value_ty)),
                        TypeId::BOOL,
                    ));
                }
                let (expr, _) = self.transform_expr(value)?;
                Ok((
                    CsExpr::Is {
                        expr: Box::new(expr),
                        ty: self.ctx.interner.generic("Array", Vec::new()),
                    },
                    TypeId::BOOL,
                ))
            }
            other => Err(self
                .ctx
                .fatal_malformed(other.kind_name(), "not an array operation")),
        }
    }

    pub(crate) fn transform_array_literal(
        &mut self,
        elements: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        // Type first (respects the element context), then emit with each
        // element coerced to the element type.
        let literal_ty = infer_type(
            self.ctx,
            &IlNode::ArrayLiteral {
                elements: elements.to_vec(),
            },
        )?;
        let elem = self
            .ctx
            .interner
            .element_of(literal_ty)
            .unwrap_or(TypeId::BYTE);

        if elements.is_empty() {
            return Ok((
                CsExpr::invoke(
                    CsExpr::member(
                        CsExpr::ident("Array"),
                        format!("Empty<{}>", self.ctx.interner.display(elem)),
                    ),
                    vec![],
                ),
                literal_ty,
            ));
        }

        let has_spread = elements.iter().any(|e| matches!(e, IlNode::Spread { .. }));
        self.ctx.elem_context.push(elem);
        let result = self.build_literal_elements(elements, elem, has_spread, literal_ty);
        self.ctx.elem_context.pop();
        result
    }

    fn build_literal_elements(
        &mut self,
        elements: &[IlNode],
        elem: TypeId,
        has_spread: bool,
        literal_ty: TypeId,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if !has_spread {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                let (expr, ty) = self.transform_expr(element)?;
                items.push(self.coerce_assign(expr, ty, elem));
            }
            return Ok((
                CsExpr::ArrayCreation {
                    elem,
                    size: None,
                    init: Some(items),
                    jagged_inner: false,
                },
                literal_ty,
            ));
        }

        // Spread elements split the literal into concatenated segments.
        let mut chain: Option<CsExpr> = None;
        let mut group: Vec<CsExpr> = Vec::new();
        let flush = |chain: Option<CsExpr>, group: &mut Vec<CsExpr>| -> Option<CsExpr> {
            if group.is_empty() {
                return chain;
            }
            let segment = CsExpr::ArrayCreation {
                elem,
                size: None,
                init: Some(std::mem::take(group)),
                jagged_inner: false,
            };
            Some(match chain {
                None => segment,
                Some(prior) => CsExpr::call(prior, "Concat", vec![segment]),
            })
        };
        for element in elements {
            match element {
                IlNode::Spread { argument } => {
                    chain = flush(chain, &mut group);
                    let (spread_expr, _) = self.transform_expr(argument)?;
                    chain = Some(match chain {
                        None => spread_expr,
                        Some(prior) => CsExpr::call(prior, "Concat", vec![spread_expr]),
                    });
                }
                other => {
                    let (expr, ty) = self.transform_expr(other)?;
                    group.push(self.coerce_assign(expr, ty, elem));
                }
            }
        }
        chain = flush(chain, &mut group);
        let chain = chain.unwrap_or(CsExpr::ArrayCreation {
            elem,
            size: None,
            init: Some(Vec::new()),
            jagged_inner: false,
        });
        Ok((CsExpr::call(chain, "ToArray", vec![]), literal_ty))
    }

    /// `a.push(x, ...ys)` as `a = a.Append(x).Concat(ys).ToArray()`.
    fn build_append(&mut self, array: &IlNode, items: &[IlNode]) -> Result<(CsExpr, TypeId), Fatal> {
        let (a, a_ty) = self.transform_expr(array)?;
        let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::BYTE);
        let mut chain = a.clone();
        for item in items {
            match item {
                IlNode::Spread { argument } => {
                    let (spread_expr, _) = self.transform_expr(argument)?;
                    chain = CsExpr::call(chain, "Concat", vec![spread_expr]);
                }
                other => {
                    let (expr, ty) = self.transform_expr(other)?;
                    let expr = self.coerce_assign(expr, ty, elem);
                    chain = CsExpr::call(chain, "Append", vec![expr]);
                }
            }
        }
        chain = CsExpr::call(chain, "ToArray", vec![]);
        Ok((
            CsExpr::Assignment {
                op: CsAssignOp::Assign,
                target: Box::new(a),
                value: Box::new(chain),
            },
            a_ty,
        ))
    }

    pub(crate) fn transform_append_stmt(
        &mut self,
        array: &IlNode,
        items: &[IlNode],
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (assignment, _) = self.build_append(array, items)?;
        Ok(vec![CsStmt::Expr(assignment)])
    }

    /// `SliceArray(a, start, end)` with negative-index arithmetic.
    fn build_slice(
        &mut self,
        array: &IlNode,
        start: Option<&IlNode>,
        end: Option<&IlNode>,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let (a, a_ty) = self.transform_expr(array)?;
        let start_expr = self.slice_bound(&a, start, CsExpr::int(0))?;
        let end_expr = self.slice_bound(&a, end, CsExpr::member(a.clone(), "Length"))?;
        Ok((
            CsExpr::opcodes_call("SliceArray", vec![a, start_expr, end_expr]),
            a_ty,
        ))
    }

    fn slice_bound(
        &mut self,
        array_expr: &CsExpr,
        bound: Option<&IlNode>,
        missing: CsExpr,
    ) -> Result<CsExpr, Fatal> {
        match bound {
            None => Ok(missing),
            Some(IlNode::Literal {
                value: IlValue::Int(n),
            }) if *n < 0 => Ok(CsExpr::binary(
                ilcs_csharp::ast::CsBinaryOp::Sub,
                CsExpr::member(array_expr.clone(), "Length"),
                CsExpr::int(-n),
            )),
            Some(node) => {
                let (expr, ty) = self.transform_expr(node)?;
                Ok(self.coerce_assign(expr, ty, TypeId::INT))
            }
        }
    }

    /// Fill in expression position: fresh creations become
    /// `Enumerable.Repeat(v, n).ToArray()`; anything else degrades to a
    /// filled copy with a warning.
    fn build_fill_expr(
        &mut self,
        array: &IlNode,
        value: &IlNode,
        start: Option<&IlNode>,
        end: Option<&IlNode>,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if start.is_some() || end.is_some() {
            self.ctx.warn(
                DiagnosticKind::CryptoFallback,
                "ranged fill is not supported; filling the whole array",
            );
        }
        if let IlNode::ArrayCreation { length } = array {
            let (value_expr, value_ty) = self.transform_expr(value)?;
            let elem = self
                .ctx
                .current_elem_context()
                .unwrap_or(if self.ctx.interner.is_numeric(value_ty) {
                    value_ty
                } else {
                    TypeId::UINT
                });
            let value_expr = self.coerce_assign(value_expr, value_ty, elem);
            let count = match length {
                Some(len) => {
                    let (expr, len_ty) = self.transform_expr(len)?;
                    self.coerce_assign(expr, len_ty, TypeId::INT)
                }
                None => CsExpr::int(0),
            };
            return Ok((
                CsExpr::call(
                    CsExpr::call(
                        CsExpr::ident("Enumerable"),
                        "Repeat",
                        vec![value_expr, count],
                    ),
                    "ToArray",
                    vec![],
                ),
                self.ctx.interner.array_of(elem),
            ));
        }
        self.ctx.warn(
            DiagnosticKind::CryptoFallback,
            "fill of an existing array in expression position copies it",
        );
        let (a, a_ty) = self.transform_expr(array)?;
        let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::BYTE);
        let (value_expr, value_ty) = self.transform_expr(value)?;
        let value_expr = self.coerce_assign(value_expr, value_ty, elem);
        Ok((
            CsExpr::call(
                CsExpr::call(
                    CsExpr::ident("Enumerable"),
                    "Repeat",
                    vec![value_expr, CsExpr::member(a, "Length")],
                ),
                "ToArray",
                vec![],
            ),
            a_ty,
        ))
    }

    /// Statement-position fill: the in-place helper, which fills and does
    /// not return. Fresh creations still take the Repeat form through an
    /// assignment rewrite at the declaration site.
    pub(crate) fn transform_fill_stmt(
        &mut self,
        array: &IlNode,
        value: &IlNode,
        start: Option<&IlNode>,
        end: Option<&IlNode>,
    ) -> Result<Vec<CsStmt>, Fatal> {
        if start.is_some() || end.is_some() {
            self.ctx.warn(
                DiagnosticKind::CryptoFallback,
                "ranged fill is not supported; filling the whole array",
            );
        }
        let (a, a_ty) = self.transform_expr(array)?;
        let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::BYTE);
        let (value_expr, value_ty) = self.transform_expr(value)?;
        let value_expr = self.coerce_assign(value_expr, value_ty, elem);
        Ok(vec![CsStmt::Expr(CsExpr::opcodes_call(
            "FillArray",
            vec![a, value_expr],
        ))])
    }

    pub(crate) fn transform_sort_stmt(
        &mut self,
        array: &IlNode,
        comparator: Option<&IlNode>,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (a, a_ty) = self.transform_expr(array)?;
        let mut args = vec![a];
        if let Some(cmp) = comparator {
            let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::DYNAMIC);
            let cb = self.transform_callback(cmp, &[elem, elem])?;
            args.push(cb);
        }
        Ok(vec![CsStmt::Expr(CsExpr::call(
            CsExpr::ident("Array"),
            "Sort",
            args,
        ))])
    }

    pub(crate) fn transform_splice_stmt(
        &mut self,
        array: &IlNode,
        start: &IlNode,
        delete_count: Option<&IlNode>,
        items: &[IlNode],
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (a, a_ty) = self.transform_expr(array)?;
        let elem = self.ctx.interner.element_of(a_ty).unwrap_or(TypeId::BYTE);
        let (start_expr, start_ty) = self.transform_expr(start)?;
        let start_expr = self.coerce_assign(start_expr, start_ty, TypeId::INT);

        let mut chain = CsExpr::call(a.clone(), "Take", vec![start_expr.clone()]);
        if !items.is_empty() {
            let mut inserted = Vec::with_capacity(items.len());
            for item in items {
                let (expr, ty) = self.transform_expr(item)?;
                inserted.push(self.coerce_assign(expr, ty, elem));
            }
            chain = CsExpr::call(
                chain,
                "Concat",
                vec![CsExpr::ArrayCreation {
                    elem,
                    size: None,
                    init: Some(inserted),
                    jagged_inner: false,
                }],
            );
        }
        if let Some(count) = delete_count {
            let (count_expr, count_ty) = self.transform_expr(count)?;
            let count_expr = self.coerce_assign(count_expr, count_ty, TypeId::INT);
            let tail_start = CsExpr::binary(
                ilcs_csharp::ast::CsBinaryOp::Add,
                start_expr,
                count_expr,
            );
            chain = CsExpr::call(
                chain,
                "Concat",
                vec![CsExpr::call(a.clone(), "Skip", vec![tail_start])],
            );
        }
        chain = CsExpr::call(chain, "ToArray", vec![]);
        Ok(vec![CsStmt::Expr(CsExpr::Assignment {
            op: CsAssignOp::Assign,
            target: Box::new(a),
            value: Box::new(chain),
        })])
    }

    /// `a.pop()` / `a.shift()` at statement level shrink the array.
    pub(crate) fn transform_shrink_stmt(
        &mut self,
        array: &IlNode,
        from_end: bool,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (a, _) = self.transform_expr(array)?;
        let chain = if from_end {
            CsExpr::call(
                a.clone(),
                "Take",
                vec![CsExpr::binary(
                    ilcs_csharp::ast::CsBinaryOp::Sub,
                    CsExpr::member(a.clone(), "Length"),
                    CsExpr::int(1),
                )],
            )
        } else {
            CsExpr::call(a.clone(), "Skip", vec![CsExpr::int(1)])
        };
        let chain = CsExpr::call(chain, "ToArray", vec![]);
        Ok(vec![CsStmt::Expr(CsExpr::Assignment {
            op: CsAssignOp::Assign,
            target: Box::new(a),
            value: Box::new(chain),
        })])
    }

    pub(crate) fn transform_typed_set_stmt(
        &mut self,
        target: &IlNode,
        source: &IlNode,
        offset: Option<&IlNode>,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (dst, _) = self.transform_expr(target)?;
        let (src, _) = self.transform_expr(source)?;
        let offset_expr = match offset {
            Some(node) => {
                let (expr, ty) = self.transform_expr(node)?;
                self.coerce_assign(expr, ty, TypeId::INT)
            }
            None => CsExpr::int(0),
        };
        Ok(vec![CsStmt::Expr(CsExpr::call(
            CsExpr::ident("Array"),
            "Copy",
            vec![
                src.clone(),
                CsExpr::int(0),
                dst,
                offset_expr,
                CsExpr::member(src, "Length"),
            ],
        ))])
    }

    fn transform_typed_array_creation(
        &mut self,
        element: ilcs_il::NumericKind,
        arg: Option<&IlNode>,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let elem = crate::infer::numeric_kind_type(element);
        let array_ty = self.ctx.interner.array_of(elem);
        let Some(arg_node) = arg else {
            return Ok((
                CsExpr::ArrayCreation {
                    elem,
                    size: Some(Box::new(CsExpr::int(0))),
                    init: None,
                    jagged_inner: false,
                },
                array_ty,
            ));
        };

        // A view over an ArrayBuffer-backed variable.
        if let IlNode::Identifier { name } = arg_node {
            if self.ctx.scopes.is_array_buffer(name) {
                let (buffer, _) = self.transform_expr(arg_node)?;
                return match element {
                    ilcs_il::NumericKind::U8 => Ok((buffer, TypeId::BYTE_ARRAY)),
                    ilcs_il::NumericKind::U32 => Ok((
                        CsExpr::opcodes_call("BytesToUInt32ArrayLE", vec![buffer]),
                        TypeId::UINT_ARRAY,
                    )),
                    _ => {
                        self.ctx.warn(
                            DiagnosticKind::CryptoFallback,
                            format!("no view helper for {element:?} over a buffer"),
                        );
                        Ok((buffer, array_ty))
                    }
                };
            }
        }

        let (arg_expr, arg_ty) = self.transform_expr(arg_node)?;
        if self.ctx.interner.is_numeric(arg_ty) {
            let size = self.coerce_assign(arg_expr, arg_ty, TypeId::INT);
            return Ok((
                CsExpr::ArrayCreation {
                    elem,
                    size: Some(Box::new(size)),
                    init: None,
                    jagged_inner: false,
                },
                array_ty,
            ));
        }
        if self.ctx.interner.is_array(arg_ty) {
            // A copying construction from another array.
            let same_elem = self.ctx.interner.element_of(arg_ty) == Some(elem);
            if same_elem {
                return Ok((CsExpr::call(arg_expr, "ToArray", vec![]), array_ty));
            }
            let lambda = CsExpr::Lambda {
                params: vec!["x".to_string()],
                body: Box::new(ilcs_csharp::ast::CsLambdaBody::Expr(CsExpr::cast(
                    elem,
                    CsExpr::ident("x"),
                ))),
            };
            return Ok((
                CsExpr::call(
                    CsExpr::call(arg_expr, "Select", vec![lambda]),
                    "ToArray",
                    vec![],
                ),
                array_ty,
            ));
        }
        self.ctx.warn(
            DiagnosticKind::CryptoFallback,
            "typed-array construction over an untyped source",
        );
        Ok((arg_expr, array_ty))
    }

    /// A LINQ/Array callback: arrow functions become lambdas with their
    /// parameters typed from the collection's element type.
    pub(crate) fn transform_callback(
        &mut self,
        callback: &IlNode,
        param_types: &[TypeId],
    ) -> Result<CsExpr, Fatal> {
        match callback {
            IlNode::ArrowFunction {
                params,
                body,
                is_expression,
            } => {
                self.ctx.scopes.push();
                let mut names = Vec::with_capacity(params.len());
                for (i, param) in params.iter().enumerate() {
                    let ty = param_types.get(i).copied().unwrap_or(TypeId::DYNAMIC);
                    let declared = self.ctx.scopes.declare(&param.name, ty);
                    names.push(ilcs_common::escape_reserved(&declared.target_name));
                }
                let body = if *is_expression {
                    let (expr, _) = self.transform_expr(body)?;
                    ilcs_csharp::ast::CsLambdaBody::Expr(expr)
                } else {
                    let stmts = self.stmt_list(body)?;
                    ilcs_csharp::ast::CsLambdaBody::Block(stmts)
                };
                self.ctx.scopes.pop();
                Ok(CsExpr::Lambda {
                    params: names,
                    body: Box::new(body),
                })
            }
            other => {
                let (expr, _) = self.transform_expr(other)?;
                Ok(expr)
            }
        }
    }
}
