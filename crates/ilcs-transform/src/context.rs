//! Transform context.
//!
//! Holds the shared state used throughout the IL-to-C# pass. This
//! separates state from logic: the inferer, pre-analyzer and node
//! transformers all borrow the context mutably instead of owning slices
//! of it. One context lives exactly as long as one `transpile` call.

use ilcs_common::{Diagnostic, DiagnosticKind, Fatal, TranspileOptions};
use ilcs_csharp::types::{TypeId, TypeInterner};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::framework::FrameworkKb;
use crate::scope::ScopeStack;
use crate::signatures::SignatureRegistry;

pub struct TransformContext {
    pub options: TranspileOptions,
    pub interner: TypeInterner,
    pub kb: FrameworkKb,
    pub signatures: SignatureRegistry,
    pub scopes: ScopeStack,
    /// Per-class constructor field types, in first-assignment order.
    pub class_field_types: FxHashMap<String, IndexMap<String, TypeId>>,
    /// Per-class field renames: source field name -> emitted backing
    /// field name, for fields whose PascalCase form collided with a
    /// method name.
    pub field_renames: FxHashMap<String, FxHashMap<String, String>>,
    pub diagnostics: Vec<Diagnostic>,
    /// Classes declared in this compilation unit, for static-member
    /// access resolution.
    pub known_classes: rustc_hash::FxHashSet<String>,
    /// Name of the class currently being transformed.
    pub current_class: Option<String>,
    /// Its `extends` target, when present.
    pub current_parent: Option<String>,
    /// Declared return type of the method body being transformed.
    pub current_return_type: TypeId,
    /// Expected array-element types, innermost last. Transformers push
    /// one when they know what an array literal should contain.
    pub elem_context: Vec<TypeId>,
    path: Vec<String>,
}

impl TransformContext {
    pub fn new(options: TranspileOptions) -> Result<Self, Fatal> {
        let kb = FrameworkKb::with_overrides(
            options.framework_types.as_ref(),
            options.opcodes_types.as_ref(),
        )
        .map_err(|e| Fatal::malformed("Program", "Options", format!("bad override table: {e}")))?;
        Ok(Self {
            options,
            interner: TypeInterner::new(),
            kb,
            signatures: SignatureRegistry::new(),
            scopes: ScopeStack::new(),
            class_field_types: FxHashMap::default(),
            field_renames: FxHashMap::default(),
            diagnostics: Vec::new(),
            known_classes: rustc_hash::FxHashSet::default(),
            current_class: None,
            current_parent: None,
            current_return_type: TypeId::VOID,
            elem_context: Vec::new(),
            path: vec!["Program".to_string()],
        })
    }

    pub fn push_path(&mut self, segment: String) {
        self.path.push(segment);
    }

    pub fn pop_path(&mut self) {
        self.path.pop();
    }

    pub fn path_string(&self) -> String {
        self.path.join("/")
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let diag = Diagnostic::new(kind, self.path_string(), message);
        tracing::debug!(kind = kind.as_str(), message = %diag.message, "diagnostic");
        self.diagnostics.push(diag);
    }

    pub fn fatal_malformed(&self, node_kind: &'static str, message: impl Into<String>) -> Fatal {
        Fatal::malformed(node_kind, self.path_string(), message)
    }

    pub fn fatal_invariant(&self, node_kind: &'static str, message: impl Into<String>) -> Fatal {
        Fatal::type_invariant(node_kind, self.path_string(), message)
    }

    /// The recorded type of `class.field`, if the constructor pass saw it.
    pub fn field_type(&self, class: &str, field: &str) -> Option<TypeId> {
        self.class_field_types.get(class)?.get(field).copied()
    }

    /// The emitted member name for a `this.field` access: the rename map
    /// first (collision backing fields), then the PascalCase property.
    pub fn field_target_name(&self, class: &str, field: &str) -> String {
        if let Some(renames) = self.field_renames.get(class) {
            if let Some(renamed) = renames.get(field) {
                return renamed.clone();
            }
        }
        ilcs_common::to_pascal_case(field)
    }

    pub fn current_elem_context(&self) -> Option<TypeId> {
        self.elem_context.last().copied()
    }
}
