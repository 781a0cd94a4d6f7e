//! Statement transformation.
//!
//! Statements are where one IL node can fan out into several C#
//! statements (push rewrites, destructuring, sequence expressions), so
//! `transform_stmt` returns a list.

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{CsCatch, CsExpr, CsStmt, CsSwitchSection};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlSwitchCase};

use super::Transformer;
use crate::infer::name_heuristic;

impl<'a> Transformer<'a> {
    pub(crate) fn transform_stmt(&mut self, node: &IlNode) -> Result<Vec<CsStmt>, Fatal> {
        match node {
            IlNode::Block { body } => {
                self.ctx.scopes.push();
                let mut out = Vec::with_capacity(body.len());
                for stmt in body {
                    out.extend(self.transform_stmt(stmt)?);
                }
                self.ctx.scopes.pop();
                Ok(vec![CsStmt::Block(out)])
            }
            IlNode::VarDecl { name, init, .. } => self.transform_var_decl(name, init.as_deref()),
            IlNode::ExpressionStatement { expr } => self.transform_expr_stmt(expr),
            IlNode::Empty => Ok(vec![CsStmt::Empty]),

            IlNode::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.condition(cond)?;
                let then_branch = self.nested_stmt(then_branch)?;
                let else_branch = match else_branch {
                    Some(alt) => Some(Box::new(self.nested_stmt(alt)?)),
                    None => None,
                };
                Ok(vec![CsStmt::If {
                    cond,
                    then_branch: Box::new(then_branch),
                    else_branch,
                }])
            }

            IlNode::While { cond, body } => {
                let cond = self.condition(cond)?;
                let body = self.nested_stmt(body)?;
                Ok(vec![CsStmt::While {
                    cond,
                    body: Box::new(body),
                }])
            }
            IlNode::DoWhile { body, cond } => {
                let body = self.nested_stmt(body)?;
                let cond = self.condition(cond)?;
                Ok(vec![CsStmt::DoWhile {
                    body: Box::new(body),
                    cond,
                }])
            }

            IlNode::For {
                init,
                test,
                update,
                body,
            } => self.transform_for(init.as_deref(), test.as_deref(), update.as_deref(), body),

            IlNode::ForOf {
                binding,
                iterable,
                body,
            } => {
                let (iter_expr, iter_ty) = self.transform_expr(iterable)?;
                let elem_ty = if iter_ty == TypeId::STRING {
                    TypeId::CHAR
                } else {
                    self.ctx
                        .interner
                        .element_of(iter_ty)
                        .unwrap_or(TypeId::DYNAMIC)
                };
                self.ctx.scopes.push();
                let declared = self.ctx.scopes.declare(binding, elem_ty);
                if declared.renamed {
                    self.ctx.warn(
                        DiagnosticKind::RenamedForCollision,
                        format!("loop binding `{binding}` renamed to `{}`", declared.target_name),
                    );
                }
                let body = self.nested_stmt_no_push(body)?;
                self.ctx.scopes.pop();
                Ok(vec![CsStmt::Foreach {
                    binding: declared.target_name,
                    binding_ty: TypeId::VAR,
                    iterable: iter_expr,
                    body: Box::new(body),
                }])
            }

            IlNode::ForIn {
                binding,
                object,
                body,
            } => {
                let (obj_expr, _) = self.transform_expr(object)?;
                self.ctx.scopes.push();
                let declared = self.ctx.scopes.declare(binding, TypeId::STRING);
                if declared.renamed {
                    self.ctx.warn(
                        DiagnosticKind::RenamedForCollision,
                        format!("loop binding `{binding}` renamed to `{}`", declared.target_name),
                    );
                }
                let body = self.nested_stmt_no_push(body)?;
                self.ctx.scopes.pop();
                Ok(vec![CsStmt::Foreach {
                    binding: declared.target_name,
                    binding_ty: TypeId::VAR,
                    iterable: CsExpr::member(obj_expr, "Keys"),
                    body: Box::new(body),
                }])
            }

            IlNode::Switch {
                discriminant,
                cases,
            } => self.transform_switch(discriminant, cases),

            IlNode::Break => Ok(vec![CsStmt::Break]),
            IlNode::Continue => Ok(vec![CsStmt::Continue]),

            IlNode::Throw { argument } => {
                let (expr, ty) = self.transform_expr(argument)?;
                // A bare string throw wraps into the base exception type.
                let expr = if ty == TypeId::STRING {
                    CsExpr::ObjectCreation {
                        ty: self.ctx.interner.generic("Exception", Vec::new()),
                        args: vec![expr],
                    }
                } else {
                    expr
                };
                Ok(vec![CsStmt::Throw(Some(expr))])
            }

            IlNode::Try {
                block,
                catch_binding,
                handler,
                finalizer,
            } => {
                let body = self.stmt_list(block)?;
                let mut catches = Vec::new();
                if let Some(handler_block) = handler {
                    self.ctx.scopes.push();
                    let binding = catch_binding.as_ref().map(|name| {
                        let exception_ty = self.ctx.interner.generic("Exception", Vec::new());
                        self.ctx.scopes.declare(name, exception_ty).target_name
                    });
                    let handler_stmts = self.stmt_list(handler_block)?;
                    self.ctx.scopes.pop();
                    catches.push(CsCatch {
                        exception_type: Some("Exception".to_string()),
                        binding,
                        body: handler_stmts,
                    });
                }
                let finally = match finalizer {
                    Some(fin) => Some(self.stmt_list(fin)?),
                    None => None,
                };
                Ok(vec![CsStmt::Try {
                    body,
                    catches,
                    finally,
                }])
            }

            IlNode::Return { argument } => {
                let expected = self.ctx.current_return_type;
                match argument {
                    None => Ok(vec![CsStmt::Return(None)]),
                    Some(arg) => {
                        let expr = self.transform_return_value(arg, expected)?;
                        Ok(vec![CsStmt::Return(Some(expr))])
                    }
                }
            }

            // Expressions in statement position (the IL producer emits
            // bare expressions for some lowered forms).
            other if is_expression_node(other) => self.transform_expr_stmt(other),

            other => Err(self
                .ctx
                .fatal_malformed(other.kind_name(), "structure node in statement position")),
        }
    }

    /// Transform a return argument against the declared return type,
    /// inserting the narrowing cast and the `Array.Empty` rewrite.
    fn transform_return_value(
        &mut self,
        arg: &IlNode,
        expected: TypeId,
    ) -> Result<CsExpr, Fatal> {
        if let IlNode::ArrayLiteral { elements } = arg {
            if elements.is_empty() && self.ctx.interner.is_array(expected) {
                let elem = self
                    .ctx
                    .interner
                    .element_of(expected)
                    .unwrap_or(TypeId::BYTE);
                return Ok(CsExpr::invoke(
                    CsExpr::member(
                        CsExpr::ident("Array"),
                        format!("Empty<{}>", self.ctx.interner.display(elem)),
                    ),
                    vec![],
                ));
            }
        }
        let (expr, ty) = if self.ctx.interner.is_array(expected) {
            let elem = self
                .ctx
                .interner
                .element_of(expected)
                .unwrap_or(TypeId::BYTE);
            self.ctx.elem_context.push(elem);
            let result = self.transform_expr(arg);
            self.ctx.elem_context.pop();
            result?
        } else {
            self.transform_expr(arg)?
        };
        Ok(self.coerce_assign(expr, ty, expected))
    }

    fn transform_var_decl(
        &mut self,
        name: &str,
        init: Option<&IlNode>,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let hint = self.hints.local_types.get(name).copied();
        let jagged = self.hints.jagged.contains(name);

        // `const buf = new ArrayBuffer(n)` backs typed views later.
        if let Some(IlNode::New { callee, .. }) = init {
            if callee == "ArrayBuffer" {
                self.ctx.scopes.mark_array_buffer(name);
            }
        }

        let (init_expr, ty) = match init {
            None => (None, hint.unwrap_or_else(|| name_heuristic(name))),
            Some(init_node) => {
                if jagged {
                    return self.transform_jagged_decl(name, init_node, hint);
                }
                // An empty literal with a pinned array type becomes
                // Array.Empty<T>().
                if let IlNode::ArrayLiteral { elements } = init_node {
                    if elements.is_empty() {
                        if let Some(pinned) = hint {
                            if self.ctx.interner.is_array(pinned) {
                                let elem = self
                                    .ctx
                                    .interner
                                    .element_of(pinned)
                                    .unwrap_or(TypeId::BYTE);
                                let empty = CsExpr::invoke(
                                    CsExpr::member(
                                        CsExpr::ident("Array"),
                                        format!("Empty<{}>", self.ctx.interner.display(elem)),
                                    ),
                                    vec![],
                                );
                                let declared = self.declare_local(name, pinned);
                                return Ok(vec![CsStmt::LocalDecl {
                                    name: declared,
                                    ty: pinned,
                                    init: Some(empty),
                                }]);
                            }
                        }
                    }
                }

                let (expr, init_ty) = if let Some(pinned) = hint {
                    if self.ctx.interner.is_array(pinned) {
                        let elem = self
                            .ctx
                            .interner
                            .element_of(pinned)
                            .unwrap_or(TypeId::BYTE);
                        self.ctx.elem_context.push(elem);
                        let result = self.transform_expr(init_node);
                        self.ctx.elem_context.pop();
                        result?
                    } else {
                        self.transform_expr(init_node)?
                    }
                } else {
                    self.transform_expr(init_node)?
                };
                let ty = hint.unwrap_or(init_ty);
                let expr = self.coerce_assign(expr, init_ty, ty);
                (Some(expr), ty)
            }
        };

        // Wholly untyped declarations let the C# compiler infer.
        let ty = if ty == TypeId::DYNAMIC && init_expr.is_some() {
            TypeId::VAR
        } else {
            ty
        };
        let declared = self.declare_local(name, ty);
        Ok(vec![CsStmt::LocalDecl {
            name: declared,
            ty,
            init: init_expr,
        }])
    }

    /// `a = new Array(n)` with later `a[i] = ...`/`a[i][j]` evidence:
    /// declare `T[][] a = new T[n][]`.
    fn transform_jagged_decl(
        &mut self,
        name: &str,
        init: &IlNode,
        hint: Option<TypeId>,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let elem = hint
            .and_then(|t| self.ctx.interner.element_of(t))
            .and_then(|t| self.ctx.interner.element_of(t))
            .unwrap_or(TypeId::UINT);
        let ty = self.ctx.interner.jagged_of(elem);
        let init_expr = match init {
            IlNode::ArrayCreation { length } => {
                let size = match length {
                    Some(len) => {
                        let (expr, len_ty) = self.transform_expr(len)?;
                        Some(Box::new(self.coerce_assign(expr, len_ty, TypeId::INT)))
                    }
                    None => Some(Box::new(CsExpr::int(0))),
                };
                CsExpr::ArrayCreation {
                    elem,
                    size,
                    init: None,
                    jagged_inner: true,
                }
            }
            other => {
                let (expr, _) = self.transform_expr(other)?;
                expr
            }
        };
        let declared = self.declare_local(name, ty);
        self.ctx.scopes.mark_jagged(name);
        Ok(vec![CsStmt::LocalDecl {
            name: declared,
            ty,
            init: Some(init_expr),
        }])
    }

    fn declare_local(&mut self, name: &str, ty: TypeId) -> String {
        let declared = self.ctx.scopes.declare(name, ty);
        if declared.renamed {
            self.ctx.warn(
                DiagnosticKind::RenamedForCollision,
                format!("local `{name}` renamed to `{}`", declared.target_name),
            );
        }
        ilcs_common::escape_reserved(&declared.target_name)
    }

    /// Expression-statement dispatch: the statement-level rewrites first,
    /// then the generic expression fallback.
    fn transform_expr_stmt(&mut self, expr: &IlNode) -> Result<Vec<CsStmt>, Fatal> {
        match expr {
            IlNode::ArrayAppend { array, items } => self.transform_append_stmt(array, items),
            IlNode::ArrayFill {
                array,
                value,
                start,
                end,
            } => self.transform_fill_stmt(array, value, start.as_deref(), end.as_deref()),
            IlNode::ArrayXor { array, other } => {
                let (a, _) = self.transform_expr(array)?;
                let (b, _) = self.transform_expr(other)?;
                Ok(vec![CsStmt::Expr(CsExpr::opcodes_call(
                    "XorArrays",
                    vec![a, b],
                ))])
            }
            IlNode::ArrayClear { array } => {
                let (a, _) = self.transform_expr(array)?;
                Ok(vec![CsStmt::Expr(CsExpr::call(
                    CsExpr::ident("Array"),
                    "Clear",
                    vec![a.clone(), CsExpr::int(0), CsExpr::member(a, "Length")],
                ))])
            }
            IlNode::ArrayReverse { array } => {
                let (a, _) = self.transform_expr(array)?;
                Ok(vec![CsStmt::Expr(CsExpr::call(
                    CsExpr::ident("Array"),
                    "Reverse",
                    vec![a],
                ))])
            }
            IlNode::ArraySort { array, comparator } => {
                self.transform_sort_stmt(array, comparator.as_deref())
            }
            IlNode::ArraySplice {
                array,
                start,
                delete_count,
                items,
            } => self.transform_splice_stmt(array, start, delete_count.as_deref(), items),
            IlNode::ArrayPop { array } => self.transform_shrink_stmt(array, true),
            IlNode::ArrayShift { array } => self.transform_shrink_stmt(array, false),
            IlNode::TypedArraySet {
                target,
                source,
                offset,
            } => self.transform_typed_set_stmt(target, source, offset.as_deref()),
            IlNode::MapSet { map, key, value } => {
                let (m, _) = self.transform_expr(map)?;
                let (k, _) = self.transform_expr(key)?;
                let (v, _) = self.transform_expr(value)?;
                Ok(vec![CsStmt::Expr(CsExpr::Assignment {
                    op: ilcs_csharp::ast::CsAssignOp::Assign,
                    target: Box::new(CsExpr::index(m, k)),
                    value: Box::new(v),
                })])
            }
            IlNode::DataViewWrite { .. } => {
                let (expr, _) = self.transform_numeric_primitive(expr)?;
                Ok(vec![CsStmt::Expr(expr)])
            }
            IlNode::DebugOutput { args } => self.transform_debug_output(args),
            IlNode::DestructuringAssignment {
                targets,
                source,
                declare,
            } => self.transform_destructuring(targets, source, *declare),
            IlNode::Sequence { exprs } => {
                let mut out = Vec::with_capacity(exprs.len());
                for item in exprs {
                    out.extend(self.transform_expr_stmt(item)?);
                }
                Ok(out)
            }
            other => {
                let (expr, _) = self.transform_expr(other)?;
                Ok(vec![CsStmt::Expr(expr)])
            }
        }
    }

    fn transform_for(
        &mut self,
        init: Option<&IlNode>,
        test: Option<&IlNode>,
        update: Option<&IlNode>,
        body: &IlNode,
    ) -> Result<Vec<CsStmt>, Fatal> {
        self.ctx.scopes.push();
        let init_stmt = match init {
            None => None,
            Some(node) => {
                let mut stmts = self.transform_stmt(node)?;
                if stmts.len() == 1 {
                    Some(Box::new(stmts.remove(0)))
                } else {
                    Some(Box::new(CsStmt::Block(stmts)))
                }
            }
        };
        let cond = match test {
            Some(node) => Some(self.condition(node)?),
            None => None,
        };
        // A sequence update keeps its first expression in the header;
        // the rest run at the end of the body.
        let (update_expr, trailing) = match update {
            None => (None, Vec::new()),
            Some(IlNode::Sequence { exprs }) if !exprs.is_empty() => {
                let (first, _) = self.transform_expr(&exprs[0])?;
                let mut trailing = Vec::new();
                for extra in &exprs[1..] {
                    trailing.extend(self.transform_expr_stmt(extra)?);
                }
                (Some(first), trailing)
            }
            Some(node) => {
                let (expr, _) = self.transform_expr(node)?;
                (Some(expr), Vec::new())
            }
        };
        let mut body_stmt = self.nested_stmt_no_push(body)?;
        if !trailing.is_empty() {
            let mut stmts = match body_stmt {
                CsStmt::Block(stmts) => stmts,
                other => vec![other],
            };
            stmts.extend(trailing);
            body_stmt = CsStmt::Block(stmts);
        }
        self.ctx.scopes.pop();
        Ok(vec![CsStmt::For {
            init: init_stmt,
            cond,
            update: update_expr,
            body: Box::new(body_stmt),
        }])
    }

    fn transform_switch(
        &mut self,
        discriminant: &IlNode,
        cases: &[IlSwitchCase],
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (value, _) = self.transform_expr(discriminant)?;
        let mut sections = Vec::with_capacity(cases.len());
        for case in cases {
            let label = match &case.test {
                Some(test) => {
                    let (expr, _) = self.transform_expr(test)?;
                    Some(expr)
                }
                None => None,
            };
            self.ctx.scopes.push();
            let mut body = Vec::with_capacity(case.body.len());
            for stmt in &case.body {
                body.extend(self.transform_stmt(stmt)?);
            }
            self.ctx.scopes.pop();
            // C# requires every non-empty section to end in a jump.
            if !body.is_empty() && !ends_in_jump(&body) {
                body.push(CsStmt::Break);
            }
            sections.push(CsSwitchSection {
                labels: vec![label],
                body,
            });
        }
        Ok(vec![CsStmt::Switch { value, sections }])
    }

    /// A nested statement position (`if` branch, loop body): always a
    /// block in its own scope.
    fn nested_stmt(&mut self, node: &IlNode) -> Result<CsStmt, Fatal> {
        match node {
            IlNode::Block { .. } => {
                let mut stmts = self.transform_stmt(node)?;
                Ok(if stmts.len() == 1 {
                    stmts.remove(0)
                } else {
                    CsStmt::Block(stmts)
                })
            }
            other => {
                let stmts = self.transform_stmt(other)?;
                Ok(match stmts.len() {
                    1 => stmts.into_iter().next().expect("length checked"),
                    _ => CsStmt::Block(stmts),
                })
            }
        }
    }

    /// Like `nested_stmt` but the caller already pushed the scope frame
    /// (for-loop headers, foreach bindings).
    fn nested_stmt_no_push(&mut self, node: &IlNode) -> Result<CsStmt, Fatal> {
        match node {
            IlNode::Block { body } => {
                let mut out = Vec::with_capacity(body.len());
                for stmt in body {
                    out.extend(self.transform_stmt(stmt)?);
                }
                Ok(CsStmt::Block(out))
            }
            other => self.nested_stmt(other),
        }
    }

    /// The statements of a block node without the enclosing `Block` wrapper.
    pub(crate) fn stmt_list(&mut self, node: &IlNode) -> Result<Vec<CsStmt>, Fatal> {
        match node {
            IlNode::Block { body } => {
                self.ctx.scopes.push();
                let mut out = Vec::with_capacity(body.len());
                for stmt in body {
                    out.extend(self.transform_stmt(stmt)?);
                }
                self.ctx.scopes.pop();
                Ok(out)
            }
            other => self.transform_stmt(other),
        }
    }

    /// `const [a, b] = src;` - one declaration per element, `var`-typed,
    /// with `src[i]` initializers. Holes skip their index.
    pub(crate) fn transform_destructuring(
        &mut self,
        targets: &[Option<String>],
        source: &IlNode,
        declare: bool,
    ) -> Result<Vec<CsStmt>, Fatal> {
        let (src_expr, src_ty) = self.transform_expr(source)?;
        let mut out = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            let Some(target_name) = target else {
                continue;
            };
            let elem_ty = match self.ctx.interner.lookup(src_ty) {
                ilcs_csharp::types::CsType::Tuple(elems) => {
                    elems.get(i).map(|e| e.ty).unwrap_or(TypeId::DYNAMIC)
                }
                _ => self
                    .ctx
                    .interner
                    .element_of(src_ty)
                    .unwrap_or(TypeId::DYNAMIC),
            };
            let init = CsExpr::index(src_expr.clone(), CsExpr::int(i as i64));
            if declare {
                let declared = self.declare_local(target_name, elem_ty);
                out.push(CsStmt::LocalDecl {
                    name: declared,
                    ty: TypeId::VAR,
                    init: Some(init),
                });
            } else {
                let (target_expr, target_ty) =
                    self.transform_expr(&IlNode::ident(target_name.clone()))?;
                let init = self.coerce_assign(init, elem_ty, target_ty);
                out.push(CsStmt::Expr(CsExpr::Assignment {
                    op: ilcs_csharp::ast::CsAssignOp::Assign,
                    target: Box::new(target_expr),
                    value: Box::new(init),
                }));
            }
        }
        Ok(out)
    }
}

fn ends_in_jump(stmts: &[CsStmt]) -> bool {
    matches!(
        stmts.last(),
        Some(CsStmt::Break | CsStmt::Continue | CsStmt::Return(_) | CsStmt::Throw(_))
    )
}

/// Whether a node is an expression variant (valid in statement position
/// behind an implicit expression statement).
fn is_expression_node(node: &IlNode) -> bool {
    !matches!(
        node,
        IlNode::Program { .. }
            | IlNode::Class { .. }
            | IlNode::Method { .. }
            | IlNode::Constructor { .. }
            | IlNode::Field { .. }
            | IlNode::Property { .. }
    )
}
