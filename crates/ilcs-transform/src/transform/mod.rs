//! Node transformers.
//!
//! One rule per IL node variant, dispatched from `transform_expr` /
//! `transform_stmt` in the submodules. The transformer itself is
//! stateless per node; everything mutable lives in the `TransformContext`
//! (scope stack, signature registry, diagnostics) plus the pre-analysis
//! of the body currently being emitted.
//!
//! The walk per class:
//! 1. collect constructor field assignments into the class field table
//! 2. pre-register every method's signature estimate
//! 3. refine weak return types with full pre-analysis available
//! 4. transform members, pushing a scope per body

mod arrays;
mod crypto;
mod exprs;
mod objects;
mod stmts;
mod strings;

use ilcs_common::{DiagnosticKind, Fatal};
use ilcs_csharp::ast::{
    CsClass, CsConstructor, CsExpr, CsField, CsMember, CsMethod, CsParam, CsProperty, CsStmt,
    CsUnit, CsVisibility,
};
use ilcs_csharp::registry::{needs_cast_at_call, needs_narrow, widen};
use ilcs_csharp::types::TypeId;
use ilcs_il::{IlNode, IlParam, IlValue, JsErrorKind};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::analyze::{BodyAnalysis, analyze_body};
use crate::context::TransformContext;
use crate::framework::parse_type_str;
use crate::infer::{infer_type, name_heuristic, parse_hint};
use crate::signatures::{ParamTypes, Signature};

/// The C# exception type for a JavaScript error constructor.
pub fn exception_type_name(kind: JsErrorKind) -> &'static str {
    match kind {
        JsErrorKind::Error => "Exception",
        JsErrorKind::TypeError => "ArgumentException",
        JsErrorKind::RangeError => "ArgumentOutOfRangeException",
        JsErrorKind::SyntaxError => "FormatException",
        JsErrorKind::ReferenceError => "NullReferenceException",
    }
}

pub struct Transformer<'a> {
    pub(crate) ctx: &'a mut TransformContext,
    /// Pre-analysis of the body currently being transformed.
    pub(crate) hints: BodyAnalysis,
}

/// Transform a whole IL program into a compilation unit.
pub fn transform_program(ctx: &mut TransformContext, program: &IlNode) -> Result<CsUnit, Fatal> {
    let IlNode::Program { body } = program else {
        return Err(ctx.fatal_malformed(program.kind_name(), "expected a Program root"));
    };

    let mut transformer = Transformer {
        ctx,
        hints: BodyAnalysis::default(),
    };

    // Record every declared class before any body is touched so static
    // member accesses resolve regardless of declaration order.
    for node in body {
        if let IlNode::Class { name, .. } = node {
            transformer.ctx.known_classes.insert(name.clone());
        }
    }
    let wrapper_name = transformer.ctx.options.class_name.clone();
    transformer.ctx.known_classes.insert(wrapper_name.clone());

    let mut types = Vec::new();
    let mut wrapper_members: Vec<CsMember> = Vec::new();

    // Pre-register free functions on the wrapper class.
    for node in body {
        if let IlNode::Method {
            name,
            params,
            body: method_body,
            return_hint,
            ..
        } = node
        {
            transformer.pre_register_method(
                &wrapper_name,
                None,
                name,
                params,
                method_body,
                return_hint.as_deref(),
                true,
            );
        }
    }

    for node in body {
        match node {
            IlNode::Class {
                name,
                parent,
                members,
            } => {
                let class = transformer.transform_class(name, parent.as_deref(), members)?;
                types.push(class);
            }
            IlNode::Method {
                name,
                params,
                body: method_body,
                ..
            } => {
                transformer.ctx.current_class = Some(wrapper_name.clone());
                transformer.ctx.current_parent = None;
                transformer.ctx.push_path(format!("Method[{name}]"));
                let method =
                    transformer.transform_method(&wrapper_name, name, params, method_body, true)?;
                transformer.ctx.pop_path();
                transformer.ctx.current_class = None;
                wrapper_members.push(CsMember::Method(method));
            }
            IlNode::VarDecl { name, init, .. } => {
                let field = transformer.transform_free_variable(name, init.as_deref())?;
                wrapper_members.push(CsMember::Field(field));
            }
            IlNode::Empty => {}
            other => {
                transformer.ctx.warn(
                    DiagnosticKind::UnhandledNode,
                    format!("top-level {} has no C# position", other.kind_name()),
                );
            }
        }
    }

    if !wrapper_members.is_empty() {
        let mut wrapper = CsClass::new(wrapper_name);
        wrapper.is_static = true;
        wrapper.members = wrapper_members;
        types.push(wrapper);
    }

    Ok(CsUnit {
        usings: vec![
            "System".to_string(),
            "System.Collections.Generic".to_string(),
            "System.Linq".to_string(),
        ],
        namespace: Some(ctx.options.namespace.clone()),
        types,
    })
}

impl<'a> Transformer<'a> {
    // =====================================================================
    // Classes
    // =====================================================================

    fn transform_class(
        &mut self,
        name: &str,
        parent: Option<&str>,
        members: &[IlNode],
    ) -> Result<CsClass, Fatal> {
        trace!(class = name, "transform class");
        self.ctx.push_path(format!("Class[{name}]"));
        self.ctx.current_class = Some(name.to_string());
        self.ctx.current_parent = parent.map(str::to_string);

        // Phase 0: constructor field assignments and declared fields.
        self.collect_class_fields(name, members)?;

        // Phase 1: pre-register all methods (and the constructor).
        for member in members {
            match member {
                IlNode::Method {
                    name: method_name,
                    params,
                    body,
                    is_static,
                    return_hint,
                } => self.pre_register_method(
                    name,
                    parent,
                    method_name,
                    params,
                    body,
                    return_hint.as_deref(),
                    *is_static,
                ),
                IlNode::Constructor { params, body } => {
                    self.pre_register_method(name, parent, "constructor", params, body, None, false)
                }
                _ => {}
            }
        }

        // Phase 2: refine weak return types. Must complete before any
        // body of this class is transformed.
        for member in members {
            if let IlNode::Method {
                name: method_name,
                params,
                body,
                ..
            } = member
            {
                self.refine_method_return(name, method_name, params, body);
            }
        }

        // Phase 3: transform members.
        let mut class = CsClass::new(name);
        class.base = parent.map(str::to_string);

        self.emit_fields(name, members, &mut class)?;

        for member in members {
            match member {
                IlNode::Constructor { params, body } => {
                    self.ctx.push_path("Constructor".to_string());
                    let ctor = self.transform_constructor(name, params, body)?;
                    self.ctx.pop_path();
                    class.members.push(CsMember::Constructor(ctor));
                }
                IlNode::Method {
                    name: method_name,
                    params,
                    body,
                    is_static,
                    ..
                } => {
                    self.ctx.push_path(format!("Method[{method_name}]"));
                    let method =
                        self.transform_method(name, method_name, params, body, *is_static)?;
                    self.ctx.pop_path();
                    class.members.push(CsMember::Method(method));
                }
                IlNode::Property {
                    name: property_name,
                    body,
                    is_static,
                } => {
                    self.ctx.push_path(format!("Property[{property_name}]"));
                    let property = self.transform_property(property_name, body, *is_static)?;
                    self.ctx.pop_path();
                    class.members.push(CsMember::Property(property));
                }
                IlNode::Field { .. } => {} // already emitted
                IlNode::Empty => {}
                other => {
                    self.ctx.warn(
                        DiagnosticKind::UnhandledNode,
                        format!("class member {} has no C# position", other.kind_name()),
                    );
                }
            }
        }

        self.ctx.current_class = None;
        self.ctx.current_parent = None;
        self.ctx.pop_path();
        Ok(class)
    }

    /// Collect `this.x = ...` assignments in the constructor plus declared
    /// `Field` members into the class field table, in assignment order.
    fn collect_class_fields(&mut self, class: &str, members: &[IlNode]) -> Result<(), Fatal> {
        self.ctx.class_field_types.entry(class.to_string()).or_default();

        for member in members {
            if let IlNode::Field { name, value, .. } = member {
                let ty = match value {
                    Some(init) => infer_type(self.ctx, init)?,
                    None => name_heuristic(name),
                };
                self.ctx
                    .class_field_types
                    .get_mut(class)
                    .expect("entry created above")
                    .entry(name.clone())
                    .or_insert(ty);
            }
        }

        let Some(IlNode::Constructor { params, body }) = members
            .iter()
            .find(|m| matches!(m, IlNode::Constructor { .. }))
        else {
            return Ok(());
        };

        // Constructor parameters get their estimated types so field
        // initializers like `this.key = key` type correctly. A parameter
        // with the same name as an inherited property takes its type.
        self.ctx.scopes.enter_method();
        for param in params {
            let ty = self.estimate_param_type(class, param, body);
            self.ctx.scopes.declare(&param.name, ty);
        }
        self.collect_field_assignments(class, body)?;
        Ok(())
    }

    fn collect_field_assignments(&mut self, class: &str, node: &IlNode) -> Result<(), Fatal> {
        if let IlNode::Assignment { target, value, .. } = node {
            if let IlNode::ThisPropertyAccess { property } = &**target {
                let inherited = self
                    .ctx
                    .current_parent
                    .as_deref()
                    .and_then(|p| self.ctx.kb.lookup_property(p, property))
                    .is_some();
                if !inherited {
                    let ty = infer_type(self.ctx, value)?;
                    let existing = self
                        .ctx
                        .class_field_types
                        .get(class)
                        .and_then(|f| f.get(property.as_str()))
                        .copied();
                    // A second assignment may widen the field.
                    let resolved = match existing {
                        None => ty,
                        Some(e) => widen(&self.ctx.interner, e, ty).unwrap_or(e),
                    };
                    self.ctx
                        .class_field_types
                        .get_mut(class)
                        .expect("class entry exists")
                        .insert(property.clone(), resolved);
                }
            }
        }
        for child in node.children() {
            self.collect_field_assignments(class, child)?;
        }
        Ok(())
    }

    /// Emit field/property declarations for the class field table.
    /// A field whose PascalCase form collides with a method name becomes
    /// a private backing field `_name` instead of a public property.
    fn emit_fields(
        &mut self,
        class: &str,
        members: &[IlNode],
        out: &mut CsClass,
    ) -> Result<(), Fatal> {
        // Field initializers must not see leftover scope state from the
        // refinement pass.
        self.ctx.scopes.enter_method();
        let method_names: Vec<String> = members
            .iter()
            .filter_map(|m| match m {
                IlNode::Method { name, .. } => Some(ilcs_common::to_pascal_case(name)),
                IlNode::Property { name, .. } => Some(ilcs_common::to_pascal_case(name)),
                _ => None,
            })
            .collect();

        let declared_statics: FxHashMap<String, (bool, Option<IlNode>)> = members
            .iter()
            .filter_map(|m| match m {
                IlNode::Field {
                    name,
                    value,
                    is_static,
                } => Some((name.clone(), (*is_static, value.as_deref().cloned()))),
                _ => None,
            })
            .collect();

        let fields = self
            .ctx
            .class_field_types
            .get(class)
            .cloned()
            .unwrap_or_default();

        for (field_name, field_ty) in fields {
            let pascal = ilcs_common::to_pascal_case(&field_name);
            let (is_static, declared_init) = declared_statics
                .get(&field_name)
                .cloned()
                .unwrap_or((false, None));
            let init = match declared_init {
                Some(init_node) => {
                    let (expr, from) = self.transform_expr(&init_node)?;
                    Some(self.coerce_assign(expr, from, field_ty))
                }
                None => None,
            };
            if method_names.contains(&pascal) {
                let backing = format!("_{}", ilcs_common::to_camel_case(&field_name));
                self.ctx.warn(
                    DiagnosticKind::RenamedForCollision,
                    format!("field `{field_name}` collides with member `{pascal}`; backed by `{backing}`"),
                );
                self.ctx
                    .field_renames
                    .entry(class.to_string())
                    .or_default()
                    .insert(field_name.clone(), backing.clone());
                out.members.push(CsMember::Field(CsField {
                    visibility: CsVisibility::Private,
                    name: backing,
                    ty: field_ty,
                    is_static,
                    is_readonly: false,
                    init,
                }));
            } else if is_static {
                out.members.push(CsMember::Field(CsField {
                    visibility: CsVisibility::Public,
                    name: pascal,
                    ty: field_ty,
                    is_static: true,
                    is_readonly: true,
                    init,
                }));
            } else {
                out.members.push(CsMember::Property(CsProperty {
                    visibility: CsVisibility::Public,
                    name: pascal,
                    ty: field_ty,
                    is_static: false,
                    is_override: false,
                    get_body: None,
                    has_setter: true,
                }));
            }
        }
        Ok(())
    }

    // =====================================================================
    // Signatures
    // =====================================================================

    /// Phase 1: estimate and register a method signature without
    /// transforming its body. Framework overrides take the inherited
    /// signature bit for bit.
    #[allow(clippy::too_many_arguments)]
    fn pre_register_method(
        &mut self,
        class: &str,
        parent: Option<&str>,
        method: &str,
        params: &[IlParam],
        body: &IlNode,
        return_hint: Option<&str>,
        is_static: bool,
    ) {
        if self.ctx.signatures.contains(class, method) {
            return;
        }

        // Override detection: the inherited signature wins outright, and
        // overrides are instance methods no matter what the IL says.
        if let Some(parent_class) = parent {
            if let Some((_, canonical, kb_sig)) = self.ctx.kb.lookup_method(parent_class, method) {
                let canonical = canonical.to_string();
                let param_names: Vec<String> =
                    kb_sig.params.iter().map(|p| p.name.clone()).collect();
                let param_types: ParamTypes = kb_sig
                    .params
                    .iter()
                    .map(|p| parse_type_str(&self.ctx.interner, &p.ty))
                    .collect();
                let defaults: Vec<Option<CsExpr>> = kb_sig
                    .params
                    .iter()
                    .map(|p| p.default.as_ref().map(|d| CsExpr::Raw(d.clone())))
                    .collect();
                let return_type = parse_type_str(&self.ctx.interner, &kb_sig.returns);
                trace!(class, method, canonical = %canonical, "pre-register override");
                self.ctx.signatures.register(
                    class,
                    method,
                    Signature::new(param_names, param_types, defaults, return_type)
                        .with_override()
                        .with_static(false),
                );
                return;
            }
        }

        let param_names: Vec<String> = params
            .iter()
            .map(|p| ilcs_common::to_camel_case(&p.name))
            .collect();
        let param_types: ParamTypes = params
            .iter()
            .map(|p| self.estimate_param_type(class, p, body))
            .collect();
        let defaults: Vec<Option<CsExpr>> = params
            .iter()
            .map(|p| p.default.as_deref().map(default_literal))
            .collect();

        let return_type = match return_hint {
            Some(hint) => parse_hint(self.ctx, hint),
            None => self.scan_return_type(body),
        };

        trace!(class, method, "pre-register");
        self.ctx.signatures.register(
            class,
            method,
            Signature::new(param_names, param_types, defaults, return_type)
                .with_static(is_static),
        );
    }

    /// A parameter's type estimate: JSDoc hint, then a same-named
    /// inherited property, then body usage, then the crypto name rules.
    fn estimate_param_type(&mut self, _class: &str, param: &IlParam, body: &IlNode) -> TypeId {
        if let Some(hint) = &param.type_hint {
            return parse_hint(self.ctx, hint);
        }
        if let Some(parent) = self.ctx.current_parent.clone() {
            if let Some((_, ty)) = self.ctx.kb.lookup_property(&parent, &param.name) {
                return parse_type_str(&self.ctx.interner, ty);
            }
        }
        if let Some(default) = &param.default {
            if let Ok(ty) = infer_type(self.ctx, default) {
                if ty == TypeId::BOOL || ty == TypeId::STRING {
                    return ty;
                }
            }
        }
        let names: Vec<&str> = std::iter::once(param.name.as_str()).collect();
        let analysis = analyze_body(&names, &FxHashMap::default(), body, TypeId::VOID);
        let usage = analysis.usage(&param.name);
        if !usage.is_empty() {
            return analysis.classify_param(&param.name);
        }
        name_heuristic(&param.name)
    }

    /// The cheap return-expression scan used at pre-registration: infer
    /// every `return` argument with no local knowledge and widen.
    fn scan_return_type(&mut self, body: &IlNode) -> TypeId {
        let mut returns = Vec::new();
        collect_returns(body, &mut returns);
        let mut folded: Option<TypeId> = None;
        for argument in returns {
            let ty = infer_type(self.ctx, argument).unwrap_or(TypeId::DYNAMIC);
            folded = Some(match folded {
                None => ty,
                Some(acc) => widen(&self.ctx.interner, acc, ty).unwrap_or(TypeId::DYNAMIC),
            });
        }
        folded.unwrap_or(TypeId::VOID)
    }

    /// Phase 2: re-infer weak return types (`object`, `byte`, dynamic)
    /// with full local pre-analysis available.
    fn refine_method_return(
        &mut self,
        class: &str,
        method: &str,
        params: &[IlParam],
        body: &IlNode,
    ) {
        let Some(signature) = self.ctx.signatures.get(class, method) else {
            return;
        };
        if signature.is_override {
            return;
        }
        let weak = signature.return_type == TypeId::DYNAMIC
            || signature.return_type == TypeId::BYTE;
        if !weak {
            return;
        }

        let param_types: FxHashMap<String, TypeId> = params
            .iter()
            .zip(signature.param_types.iter())
            .map(|(p, &t)| (p.name.clone(), t))
            .collect();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        let analysis = analyze_body(&names, &param_types, body, TypeId::DYNAMIC);

        self.ctx.scopes.enter_method();
        for (name, &ty) in &param_types {
            self.ctx.scopes.declare(name, ty);
        }
        for (name, &ty) in &analysis.local_types {
            self.ctx.scopes.declare(name, ty);
        }

        let refined = self.scan_return_type(body);
        if refined != TypeId::VOID && refined != TypeId::DYNAMIC {
            if self.ctx.signatures.refine_return(class, method, refined) {
                trace!(class, method, "refined return type");
            }
        }
    }

    // =====================================================================
    // Bodies
    // =====================================================================

    fn transform_method(
        &mut self,
        class: &str,
        method: &str,
        params: &[IlParam],
        body: &IlNode,
        is_static: bool,
    ) -> Result<CsMethod, Fatal> {
        let signature = self
            .ctx
            .signatures
            .get(class, method)
            .cloned()
            .ok_or_else(|| {
                self.ctx
                    .fatal_malformed("Method", format!("method {class}.{method} not registered"))
            })?;

        let cs_params: Vec<CsParam> = signature
            .param_names
            .iter()
            .zip(signature.param_types.iter())
            .zip(signature.defaults.iter())
            .map(|((name, &ty), default)| CsParam {
                name: name.clone(),
                ty,
                default: default.clone(),
            })
            .collect();

        let body_stmts =
            self.transform_body(params, &signature, body, signature.return_type)?;

        let name = if signature.is_override {
            // The canonical framework name, exactly as inherited.
            self.ctx
                .current_parent
                .clone()
                .and_then(|p| self.ctx.kb.lookup_method(&p, method))
                .map(|(_, canonical, _)| canonical.to_string())
                .unwrap_or_else(|| ilcs_common::to_pascal_case(method))
        } else {
            ilcs_common::to_pascal_case(method)
        };

        Ok(CsMethod {
            visibility: CsVisibility::Public,
            name,
            params: cs_params,
            return_type: signature.return_type,
            is_static: if signature.is_override { false } else { is_static },
            is_override: signature.is_override,
            body: body_stmts,
        })
    }

    fn transform_constructor(
        &mut self,
        class: &str,
        params: &[IlParam],
        body: &IlNode,
    ) -> Result<CsConstructor, Fatal> {
        let signature = self
            .ctx
            .signatures
            .get(class, "constructor")
            .cloned()
            .ok_or_else(|| {
                self.ctx
                    .fatal_malformed("Constructor", format!("constructor of {class} not registered"))
            })?;

        let cs_params: Vec<CsParam> = signature
            .param_names
            .iter()
            .zip(signature.param_types.iter())
            .zip(signature.defaults.iter())
            .map(|((name, &ty), default)| CsParam {
                name: name.clone(),
                ty,
                default: default.clone(),
            })
            .collect();

        // A leading super() call becomes the `: base(...)` initializer.
        let mut base_args = None;
        let mut body_node = body;
        let stripped;
        if let IlNode::Block { body: stmts } = body {
            if let Some(IlNode::ExpressionStatement { expr }) = stmts.first() {
                if let IlNode::ParentConstructorCall { args } = &**expr {
                    self.ctx.scopes.enter_method();
                    for (param, &ty) in params.iter().zip(signature.param_types.iter()) {
                        self.ctx.scopes.declare(&param.name, ty);
                    }
                    let mut transformed = Vec::with_capacity(args.len());
                    for arg in args {
                        let (expr, _) = self.transform_expr(arg)?;
                        transformed.push(expr);
                    }
                    base_args = Some(transformed);
                    stripped = IlNode::Block {
                        body: stmts[1..].to_vec(),
                    };
                    body_node = &stripped;
                }
            }
        }

        let body_stmts = self.transform_body(params, &signature, body_node, TypeId::VOID)?;

        Ok(CsConstructor {
            visibility: CsVisibility::Public,
            class_name: class.to_string(),
            params: cs_params,
            base_args,
            body: body_stmts,
        })
    }

    fn transform_property(
        &mut self,
        name: &str,
        body: &IlNode,
        is_static: bool,
    ) -> Result<CsProperty, Fatal> {
        let signature = Signature::new(Vec::new(), ParamTypes::new(), Vec::new(), TypeId::DYNAMIC);
        let return_type = self.scan_return_type(body);
        let get_body = self.transform_body(&[], &signature, body, return_type)?;
        Ok(CsProperty {
            visibility: CsVisibility::Public,
            name: ilcs_common::to_pascal_case(name),
            ty: return_type,
            is_static,
            is_override: false,
            get_body: Some(get_body),
            has_setter: false,
        })
    }

    /// Transform one body: enter a fresh method scope, declare the
    /// parameters, run pre-analysis, then emit statements.
    fn transform_body(
        &mut self,
        params: &[IlParam],
        signature: &Signature,
        body: &IlNode,
        return_type: TypeId,
    ) -> Result<Vec<CsStmt>, Fatal> {
        self.ctx.scopes.enter_method();
        self.ctx.current_return_type = return_type;

        let param_types: FxHashMap<String, TypeId> = params
            .iter()
            .zip(signature.param_types.iter())
            .map(|(p, &t)| (p.name.clone(), t))
            .collect();
        for (param, &ty) in params.iter().zip(signature.param_types.iter()) {
            self.ctx.scopes.declare(&param.name, ty);
        }

        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        let previous = std::mem::take(&mut self.hints);
        self.hints = analyze_body(&names, &param_types, body, return_type);

        let stmts = match body {
            IlNode::Block { body: inner } => {
                let mut out = Vec::with_capacity(inner.len());
                for stmt in inner {
                    out.extend(self.transform_stmt(stmt)?);
                }
                out
            }
            // Expression-bodied (arrow) forms return their expression.
            expr => {
                let (cs_expr, from) = self.transform_expr(expr)?;
                let coerced = self.coerce_assign(cs_expr, from, return_type);
                vec![CsStmt::Return(Some(coerced))]
            }
        };

        self.hints = previous;
        Ok(stmts)
    }

    fn transform_free_variable(
        &mut self,
        name: &str,
        init: Option<&IlNode>,
    ) -> Result<CsField, Fatal> {
        let (init_expr, ty) = match init {
            Some(node) => {
                let (expr, ty) = self.transform_expr(node)?;
                (Some(expr), ty)
            }
            None => (None, name_heuristic(name)),
        };
        Ok(CsField {
            visibility: CsVisibility::Public,
            name: ilcs_common::to_pascal_case(name),
            ty,
            is_static: true,
            is_readonly: false,
            init: init_expr,
        })
    }

    // =====================================================================
    // Shared helpers
    // =====================================================================

    /// Insert a narrowing cast when assigning `from` into a `to` slot.
    pub(crate) fn coerce_assign(&self, expr: CsExpr, from: TypeId, to: TypeId) -> CsExpr {
        if to == TypeId::VAR || to == TypeId::VOID || from == to {
            return expr;
        }
        if needs_narrow(&self.ctx.interner, from, to) {
            return CsExpr::cast(to, expr);
        }
        if from == TypeId::DYNAMIC && self.ctx.interner.is_numeric(to) {
            return CsExpr::cast(to, expr);
        }
        expr
    }

    /// Insert a cast when passing `from` to a parameter of type `to`.
    pub(crate) fn coerce_arg(&self, expr: CsExpr, from: TypeId, to: TypeId) -> CsExpr {
        if to == TypeId::DYNAMIC || to == TypeId::VAR || from == to {
            return expr;
        }
        let castable = self.ctx.interner.is_numeric(to)
            || self.ctx.interner.primitive(to).is_some()
            || self.ctx.interner.is_array(to);
        if castable && needs_cast_at_call(&self.ctx.interner, from, to) {
            // Arrays of mismatched element types cannot be cast; leave
            // them alone rather than emit a cast that cannot compile.
            if self.ctx.interner.is_array(from) && self.ctx.interner.is_array(to) {
                return expr;
            }
            return CsExpr::cast(to, expr);
        }
        expr
    }

    /// The error sentinel for nodes with no rule; never silent.
    pub(crate) fn unhandled(&mut self, node: &IlNode, reason: &str) -> (CsExpr, TypeId) {
        self.ctx.warn(
            DiagnosticKind::UnhandledNode,
            format!("{}: {}", node.kind_name(), reason),
        );
        (
            CsExpr::ident(format!("__UNTRANSLATED_{}__", node.kind_name())),
            TypeId::DYNAMIC,
        )
    }

    /// Transform call arguments, coercing each to its parameter type.
    pub(crate) fn transform_args(
        &mut self,
        args: &[IlNode],
        param_types: &[TypeId],
    ) -> Result<Vec<CsExpr>, Fatal> {
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let expected = param_types.get(i).copied();
            if let Some(to) = expected {
                if self.ctx.interner.is_array(to) {
                    let elem = self.ctx.interner.element_of(to).unwrap_or(TypeId::BYTE);
                    self.ctx.elem_context.push(elem);
                    let (expr, from) = self.transform_expr(arg)?;
                    self.ctx.elem_context.pop();
                    out.push(self.coerce_arg(expr, from, to));
                    continue;
                }
            }
            let (expr, from) = self.transform_expr(arg)?;
            out.push(match expected {
                Some(to) => self.coerce_arg(expr, from, to),
                None => expr,
            });
        }
        Ok(out)
    }
}

fn collect_returns<'n>(node: &'n IlNode, out: &mut Vec<&'n IlNode>) {
    if let IlNode::Return {
        argument: Some(argument),
    } = node
    {
        out.push(argument);
    }
    // Nested functions keep their own returns.
    if matches!(node, IlNode::ArrowFunction { .. }) {
        return;
    }
    for child in node.children() {
        collect_returns(child, out);
    }
}

/// A literal default value for a parameter, or `null` when the default
/// expression is not a literal.
fn default_literal(node: &IlNode) -> CsExpr {
    match node {
        IlNode::Literal { value } => match value {
            IlValue::Null => CsExpr::null(),
            IlValue::Bool(b) => CsExpr::bool(*b),
            IlValue::Int(v) => CsExpr::int(*v),
            IlValue::Float(v) => CsExpr::Literal {
                value: ilcs_csharp::ast::CsLiteral::Float(*v),
                ty: TypeId::DOUBLE,
            },
            IlValue::Str(s) => CsExpr::str(s.clone()),
            IlValue::BigInt(text) => CsExpr::Raw(format!("{text}UL")),
        },
        _ => CsExpr::null(),
    }
}
