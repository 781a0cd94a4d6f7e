//! Objects, dictionaries, calls and object-literal rewrites.

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{CsExpr, CsLambdaBody, CsStmt};
use ilcs_csharp::types::{CsType, TypeId};
use ilcs_il::{IlMemberProperty, IlNode, IlObjectProperty, IlParam};

use super::{Transformer, exception_type_name};
use crate::framework::parse_type_str;

impl<'a> Transformer<'a> {
    pub(crate) fn transform_object_op(&mut self, node: &IlNode) -> Result<(CsExpr, TypeId), Fatal> {
        match node {
            IlNode::MapCreation => {
                let ty = self
                    .ctx
                    .interner
                    .generic("Dictionary", vec![TypeId::STRING, TypeId::DYNAMIC]);
                Ok((CsExpr::ObjectCreation { ty, args: vec![] }, ty))
            }
            IlNode::MapGet { map, key } => {
                let (m, m_ty) = self.transform_expr(map)?;
                let (k, _) = self.transform_expr(key)?;
                let value_ty = match self.ctx.interner.lookup(m_ty) {
                    CsType::Generic { name, args } if name == "Dictionary" && args.len() == 2 => {
                        args[1]
                    }
                    _ => TypeId::DYNAMIC,
                };
                Ok((CsExpr::index(m, k), value_ty))
            }
            IlNode::MapSet { map, key, value } => {
                // Expression position: the assignment expression itself.
                let (m, _) = self.transform_expr(map)?;
                let (k, _) = self.transform_expr(key)?;
                let (v, _) = self.transform_expr(value)?;
                Ok((
                    CsExpr::Assignment {
                        op: ilcs_csharp::ast::CsAssignOp::Assign,
                        target: Box::new(CsExpr::index(m, k)),
                        value: Box::new(v),
                    },
                    TypeId::VOID,
                ))
            }
            IlNode::MapHas { map, key } => {
                let (m, _) = self.transform_expr(map)?;
                let (k, _) = self.transform_expr(key)?;
                Ok((CsExpr::call(m, "ContainsKey", vec![k]), TypeId::BOOL))
            }
            IlNode::MapDelete { map, key } => {
                let (m, _) = self.transform_expr(map)?;
                let (k, _) = self.transform_expr(key)?;
                Ok((CsExpr::call(m, "Remove", vec![k]), TypeId::BOOL))
            }
            IlNode::SetCreation => {
                let ty = self.ctx.interner.generic("HashSet", vec![TypeId::DYNAMIC]);
                Ok((CsExpr::ObjectCreation { ty, args: vec![] }, ty))
            }

            IlNode::ObjectKeys { object } => {
                let (o, _) = self.transform_expr(object)?;
                Ok((
                    CsExpr::call(CsExpr::member(o, "Keys"), "ToArray", vec![]),
                    TypeId::STRING_ARRAY,
                ))
            }
            IlNode::ObjectValues { object } => {
                let (o, o_ty) = self.transform_expr(object)?;
                let value_ty = match self.ctx.interner.lookup(o_ty) {
                    CsType::Generic { name, args } if name == "Dictionary" && args.len() == 2 => {
                        args[1]
                    }
                    _ => TypeId::DYNAMIC,
                };
                Ok((
                    CsExpr::call(CsExpr::member(o, "Values"), "ToArray", vec![]),
                    self.ctx.interner.array_of(value_ty),
                ))
            }
            IlNode::ObjectEntries { object } => {
                // Key/value pairs surface as value tuples.
                let (o, _) = self.transform_expr(object)?;
                let kv = CsExpr::ident("kv");
                let pair = CsExpr::Tuple(vec![
                    CsExpr::member(kv.clone(), "Key"),
                    CsExpr::member(kv, "Value"),
                ]);
                let lambda = CsExpr::Lambda {
                    params: vec!["kv".to_string()],
                    body: Box::new(CsLambdaBody::Expr(pair)),
                };
                Ok((
                    CsExpr::call(CsExpr::call(o, "Select", vec![lambda]), "ToArray", vec![]),
                    TypeId::DYNAMIC,
                ))
            }
            IlNode::ObjectCreate { prototype } => {
                if !matches!(
                    &**prototype,
                    IlNode::Literal {
                        value: ilcs_il::IlValue::Null
                    }
                ) {
                    self.ctx.warn(
                        DiagnosticKind::CryptoFallback,
                        "Object.create with a non-null prototype becomes a plain dictionary",
                    );
                }
                let ty = self
                    .ctx
                    .interner
                    .generic("Dictionary", vec![TypeId::STRING, TypeId::DYNAMIC]);
                Ok((CsExpr::ObjectCreation { ty, args: vec![] }, ty))
            }
            IlNode::ObjectFreeze { object } => {
                // No C# equivalent for shallow freezing; pass through.
                self.transform_expr(object)
            }

            IlNode::ErrorCreation { error, message } => {
                let ty = self
                    .ctx
                    .interner
                    .generic(exception_type_name(*error), Vec::new());
                let args = match message {
                    Some(msg) => {
                        let (expr, _) = self.transform_expr(msg)?;
                        vec![expr]
                    }
                    None => vec![],
                };
                Ok((CsExpr::ObjectCreation { ty, args }, ty))
            }
            IlNode::DebugOutput { args } => {
                let mut stmts = self.transform_debug_output(args)?;
                match stmts.pop() {
                    Some(CsStmt::Expr(expr)) => Ok((expr, TypeId::VOID)),
                    _ => Ok((CsExpr::null(), TypeId::VOID)),
                }
            }

            other => Err(self
                .ctx
                .fatal_malformed(other.kind_name(), "not an object operation")),
        }
    }

    pub(crate) fn transform_debug_output(
        &mut self,
        args: &[IlNode],
    ) -> Result<Vec<CsStmt>, Fatal> {
        let expr = match args {
            [] => CsExpr::call(CsExpr::ident("Console"), "WriteLine", vec![]),
            [single] => {
                let (arg, _) = self.transform_expr(single)?;
                CsExpr::call(CsExpr::ident("Console"), "WriteLine", vec![arg])
            }
            many => {
                let mut items = Vec::with_capacity(many.len());
                for arg in many {
                    let (expr, _) = self.transform_expr(arg)?;
                    items.push(expr);
                }
                let array = CsExpr::ArrayCreation {
                    elem: TypeId::DYNAMIC,
                    size: None,
                    init: Some(items),
                    jagged_inner: false,
                };
                CsExpr::call(
                    CsExpr::ident("Console"),
                    "WriteLine",
                    vec![CsExpr::call(
                        CsExpr::ident("string"),
                        "Join",
                        vec![CsExpr::str(" "), array],
                    )],
                )
            }
        };
        Ok(vec![CsStmt::Expr(expr)])
    }

    /// Object literals: in a framework-typed array context they become
    /// positional constructor calls; elsewhere, anonymous objects.
    pub(crate) fn transform_object_literal(
        &mut self,
        properties: &[IlObjectProperty],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if let Some(elem) = self.ctx.current_elem_context() {
            if let CsType::Generic { name, .. } = self.ctx.interner.lookup(elem) {
                if let Some(ctor) = self.ctx.kb.ctor_params(&name) {
                    let ctor: Vec<_> = ctor.to_vec();
                    return self.build_framework_object(&name, elem, &ctor, properties);
                }
            }
        }

        let mut members = Vec::with_capacity(properties.len());
        for property in properties {
            let (expr, _) = self.transform_expr(&property.value)?;
            members.push((ilcs_common::to_pascal_case(&property.key), expr));
        }
        Ok((CsExpr::AnonymousObject(members), TypeId::DYNAMIC))
    }

    /// Positional-argument rewrite for TestCase/KeySize/LinkItem/
    /// Vulnerability literals. Nested byte-array fields are typed
    /// explicitly: the outer element context would otherwise misguide
    /// them.
    fn build_framework_object(
        &mut self,
        class: &str,
        elem: TypeId,
        ctor: &[crate::framework::KbParam],
        properties: &[IlObjectProperty],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let mut args = Vec::with_capacity(ctor.len());
        for param in ctor {
            let param_ty = parse_type_str(&self.ctx.interner, &param.ty);
            let value = properties
                .iter()
                .find(|p| p.key.eq_ignore_ascii_case(&param.name));
            match value {
                Some(property) => {
                    let expr = if self.ctx.interner.is_array(param_ty) {
                        let nested_elem = self
                            .ctx
                            .interner
                            .element_of(param_ty)
                            .unwrap_or(TypeId::BYTE);
                        self.ctx.elem_context.push(nested_elem);
                        let result = self.transform_expr(&property.value);
                        self.ctx.elem_context.pop();
                        let (expr, from) = result?;
                        self.coerce_arg(expr, from, param_ty)
                    } else {
                        let (expr, from) = self.transform_expr(&property.value)?;
                        self.coerce_arg(expr, from, param_ty)
                    };
                    args.push(expr);
                }
                None => args.push(ilcs_csharp::registry::default_value(
                    &self.ctx.interner,
                    param_ty,
                )),
            }
        }

        for property in properties {
            let known = ctor
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&property.key));
            if !known {
                self.ctx.warn(
                    DiagnosticKind::CryptoFallback,
                    format!("object literal key `{}` has no {class} constructor slot", property.key),
                );
            }
        }

        Ok((
            CsExpr::ObjectCreation {
                ty: elem,
                args,
            },
            elem,
        ))
    }

    pub(crate) fn transform_arrow(
        &mut self,
        params: &[IlParam],
        body: &IlNode,
        is_expression: bool,
    ) -> Result<(CsExpr, TypeId), Fatal> {
        // An arrow outside a typed callback position: parameters type by
        // name only.
        self.ctx.scopes.push();
        let mut names = Vec::with_capacity(params.len());
        for param in params {
            let ty = crate::infer::name_heuristic(&param.name);
            let declared = self.ctx.scopes.declare(&param.name, ty);
            names.push(ilcs_common::escape_reserved(&declared.target_name));
        }
        let lambda_body = if is_expression {
            let (expr, _) = self.transform_expr(body)?;
            CsLambdaBody::Expr(expr)
        } else {
            CsLambdaBody::Block(self.stmt_list(body)?)
        };
        self.ctx.scopes.pop();
        Ok((
            CsExpr::Lambda {
                params: names,
                body: Box::new(lambda_body),
            },
            TypeId::DYNAMIC,
        ))
    }

    pub(crate) fn transform_this_method_call(
        &mut self,
        method: &str,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        let class = self.ctx.current_class.clone().unwrap_or_default();
        if let Some(signature) = self.ctx.signatures.get(&class, method).cloned() {
            let cs_args = self.transform_args(args, &signature.param_types)?;
            let name = if signature.is_override {
                self.ctx
                    .current_parent
                    .clone()
                    .and_then(|p| self.ctx.kb.lookup_method(&p, method))
                    .map(|(_, canonical, _)| canonical.to_string())
                    .unwrap_or_else(|| ilcs_common::to_pascal_case(method))
            } else {
                ilcs_common::to_pascal_case(method)
            };
            return Ok((
                CsExpr::call(CsExpr::This, name, cs_args),
                signature.return_type,
            ));
        }
        // An inherited method not overridden locally.
        if let Some(parent) = self.ctx.current_parent.clone() {
            if let Some((_, canonical, kb_sig)) = self.ctx.kb.lookup_method(&parent, method) {
                let canonical = canonical.to_string();
                let param_types: Vec<TypeId> = kb_sig
                    .params
                    .iter()
                    .map(|p| parse_type_str(&self.ctx.interner, &p.ty))
                    .collect();
                let return_ty = parse_type_str(&self.ctx.interner, &kb_sig.returns);
                let cs_args = self.transform_args(args, &param_types)?;
                return Ok((CsExpr::call(CsExpr::This, canonical, cs_args), return_ty));
            }
        }
        self.ctx.warn(
            DiagnosticKind::UnresolvedIdentifier,
            format!("this.{method}() matches no registered method"),
        );
        let cs_args = self.transform_args(args, &[])?;
        Ok((
            CsExpr::call(CsExpr::This, ilcs_common::to_pascal_case(method), cs_args),
            TypeId::DYNAMIC,
        ))
    }

    pub(crate) fn transform_parent_method_call(
        &mut self,
        method: &str,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        if let Some(parent) = self.ctx.current_parent.clone() {
            if let Some((_, canonical, kb_sig)) = self.ctx.kb.lookup_method(&parent, method) {
                let canonical = canonical.to_string();
                let param_types: Vec<TypeId> = kb_sig
                    .params
                    .iter()
                    .map(|p| parse_type_str(&self.ctx.interner, &p.ty))
                    .collect();
                let return_ty = parse_type_str(&self.ctx.interner, &kb_sig.returns);
                let cs_args = self.transform_args(args, &param_types)?;
                return Ok((CsExpr::call(CsExpr::Base, canonical, cs_args), return_ty));
            }
        }
        self.ctx.warn(
            DiagnosticKind::UnresolvedIdentifier,
            format!("super.{method}() matches no framework method"),
        );
        let cs_args = self.transform_args(args, &[])?;
        Ok((
            CsExpr::call(CsExpr::Base, ilcs_common::to_pascal_case(method), cs_args),
            TypeId::DYNAMIC,
        ))
    }

    pub(crate) fn transform_call(
        &mut self,
        callee: &IlNode,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        match callee {
            // Free functions live on the wrapper class.
            IlNode::Identifier { name } if self.ctx.scopes.lookup(name).is_none() => {
                let wrapper = self.ctx.options.class_name.clone();
                if let Some(signature) = self.ctx.signatures.get(&wrapper, name).cloned() {
                    let cs_args = self.transform_args(args, &signature.param_types)?;
                    return Ok((
                        CsExpr::invoke(
                            CsExpr::ident(ilcs_common::to_pascal_case(name)),
                            cs_args,
                        ),
                        signature.return_type,
                    ));
                }
                self.ctx.warn(
                    DiagnosticKind::UnresolvedIdentifier,
                    format!("call target `{name}` matches no registered function"),
                );
                let cs_args = self.transform_args(args, &[])?;
                Ok((
                    CsExpr::invoke(CsExpr::ident(name.clone()), cs_args),
                    TypeId::DYNAMIC,
                ))
            }
            IlNode::Member {
                object,
                property: IlMemberProperty::Dotted(method),
            } => {
                let (obj_expr, obj_ty) = self.transform_expr(object)?;
                if let CsType::Generic { name, .. } = self.ctx.interner.lookup(obj_ty) {
                    if let Some(signature) = self.ctx.signatures.get(&name, method).cloned() {
                        let cs_args = self.transform_args(args, &signature.param_types)?;
                        return Ok((
                            CsExpr::call(
                                obj_expr,
                                ilcs_common::to_pascal_case(method),
                                cs_args,
                            ),
                            signature.return_type,
                        ));
                    }
                    if let Some((_, canonical, kb_sig)) =
                        self.ctx.kb.lookup_method(&name, method)
                    {
                        let canonical = canonical.to_string();
                        let param_types: Vec<TypeId> = kb_sig
                            .params
                            .iter()
                            .map(|p| parse_type_str(&self.ctx.interner, &p.ty))
                            .collect();
                        let return_ty = parse_type_str(&self.ctx.interner, &kb_sig.returns);
                        let cs_args = self.transform_args(args, &param_types)?;
                        return Ok((CsExpr::call(obj_expr, canonical, cs_args), return_ty));
                    }
                }
                let cs_args = self.transform_args(args, &[])?;
                Ok((
                    CsExpr::call(obj_expr, ilcs_common::to_pascal_case(method), cs_args),
                    TypeId::DYNAMIC,
                ))
            }
            other => {
                // Calling a computed expression: transform both sides and
                // hope the target is callable.
                let (callee_expr, _) = self.transform_expr(other)?;
                let cs_args = self.transform_args(args, &[])?;
                Ok((CsExpr::invoke(callee_expr, cs_args), TypeId::DYNAMIC))
            }
        }
    }

    pub(crate) fn transform_new(
        &mut self,
        callee: &str,
        args: &[IlNode],
    ) -> Result<(CsExpr, TypeId), Fatal> {
        // `new ArrayBuffer(n)` backs typed views; in C# it is just bytes.
        if callee == "ArrayBuffer" {
            let size = match args.first() {
                Some(len) => {
                    let (expr, ty) = self.transform_expr(len)?;
                    self.coerce_assign(expr, ty, TypeId::INT)
                }
                None => CsExpr::int(0),
            };
            return Ok((
                CsExpr::ArrayCreation {
                    elem: TypeId::BYTE,
                    size: Some(Box::new(size)),
                    init: None,
                    jagged_inner: false,
                },
                TypeId::BYTE_ARRAY,
            ));
        }

        let ty = self.ctx.interner.generic(callee.to_string(), Vec::new());
        // Framework data classes carry positional constructors; local
        // classes have registered constructor signatures.
        let param_types: Vec<TypeId> = if let Some(ctor) = self.ctx.kb.ctor_params(callee) {
            let ctor: Vec<_> = ctor.to_vec();
            ctor.iter()
                .map(|p| parse_type_str(&self.ctx.interner, &p.ty))
                .collect()
        } else if let Some(signature) = self.ctx.signatures.get(callee, "constructor") {
            signature.param_types.to_vec()
        } else {
            Vec::new()
        };
        let cs_args = self.transform_args(args, &param_types)?;
        Ok((CsExpr::ObjectCreation { ty, args: cs_args }, ty))
    }

    /// Member access where the object is a known class name: static
    /// member access, PascalCased.
    pub(crate) fn class_static_member(
        &mut self,
        class: &str,
        member: &str,
    ) -> Option<(CsExpr, TypeId)> {
        if !self.ctx.known_classes.contains(class) && !self.ctx.kb.is_known_class(class) {
            return None;
        }
        let ty = self
            .ctx
            .class_field_types
            .get(class)
            .and_then(|fields| fields.get(member))
            .copied()
            .unwrap_or(TypeId::DYNAMIC);
        Some((
            CsExpr::member(
                CsExpr::ident(class.to_string()),
                ilcs_common::to_pascal_case(member),
            ),
            ty,
        ))
    }
}
