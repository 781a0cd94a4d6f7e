//! The per-compilation signature registry.
//!
//! Methods are registered before any body is transformed so that calls to
//! methods defined later in source order still resolve. Construction is
//! explicitly two-pass (pre-register, then refine) rather than lazy; the
//! refinement updates the return type in place at most once per method.

use ilcs_csharp::ast::CsExpr;
use ilcs_csharp::types::TypeId;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Parameter-type lists are short in practice; keep them inline.
pub type ParamTypes = SmallVec<[TypeId; 4]>;

/// The registered signature of one `(class, method)` pair.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Parameter names as they will be emitted.
    pub param_names: Vec<String>,
    pub param_types: ParamTypes,
    pub defaults: Vec<Option<CsExpr>>,
    pub return_type: TypeId,
    /// True when the method overrides a framework base-class method; the
    /// signature is then the inherited one, bit for bit.
    pub is_override: bool,
    pub is_static: bool,
    refined: bool,
}

impl Signature {
    pub fn new(
        param_names: Vec<String>,
        param_types: ParamTypes,
        defaults: Vec<Option<CsExpr>>,
        return_type: TypeId,
    ) -> Self {
        Self {
            param_names,
            param_types,
            defaults,
            return_type,
            is_override: false,
            is_static: false,
            refined: false,
        }
    }

    pub fn with_override(mut self) -> Self {
        self.is_override = true;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// Maps `class.method` to its signature. Insertion order is preserved so
/// downstream iteration is deterministic.
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    map: IndexMap<String, Signature>,
}

fn key(class: &str, method: &str) -> String {
    format!("{class}.{method}")
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: &str, method: &str, signature: Signature) {
        self.map.insert(key(class, method), signature);
    }

    pub fn get(&self, class: &str, method: &str) -> Option<&Signature> {
        self.map.get(&key(class, method))
    }

    /// Update a return type during the refinement pass. Parameter counts
    /// and types are stable by contract; only the return type may change,
    /// and only once. Override signatures are never refined - they are
    /// inherited bit for bit. Returns whether the update was applied.
    pub fn refine_return(&mut self, class: &str, method: &str, return_type: TypeId) -> bool {
        let Some(signature) = self.map.get_mut(&key(class, method)) else {
            return false;
        };
        if signature.refined || signature.is_override || signature.return_type == return_type {
            return false;
        }
        signature.return_type = return_type;
        signature.refined = true;
        true
    }

    pub fn contains(&self, class: &str, method: &str) -> bool {
        self.map.contains_key(&key(class, method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_signature(return_type: TypeId) -> Signature {
        Signature::new(
            vec!["data".to_string()],
            smallvec::smallvec![TypeId::BYTE_ARRAY],
            vec![None],
            return_type,
        )
    }

    #[test]
    fn register_then_get() {
        let mut registry = SignatureRegistry::new();
        registry.register("Aes", "encryptBlock", simple_signature(TypeId::BYTE_ARRAY));
        let sig = registry.get("Aes", "encryptBlock").unwrap();
        assert_eq!(sig.return_type, TypeId::BYTE_ARRAY);
        assert!(registry.get("Aes", "decryptBlock").is_none());
    }

    #[test]
    fn refine_applies_once() {
        let mut registry = SignatureRegistry::new();
        registry.register("Aes", "mix", simple_signature(TypeId::DYNAMIC));
        assert!(registry.refine_return("Aes", "mix", TypeId::UINT_ARRAY));
        assert_eq!(registry.get("Aes", "mix").unwrap().return_type, TypeId::UINT_ARRAY);
        // A second refinement is rejected.
        assert!(!registry.refine_return("Aes", "mix", TypeId::BYTE_ARRAY));
        assert_eq!(registry.get("Aes", "mix").unwrap().return_type, TypeId::UINT_ARRAY);
    }

    #[test]
    fn refine_never_touches_overrides() {
        let mut registry = SignatureRegistry::new();
        registry.register(
            "Aes",
            "createInstance",
            simple_signature(TypeId::DYNAMIC).with_override(),
        );
        assert!(!registry.refine_return("Aes", "createInstance", TypeId::UINT));
        assert_eq!(
            registry.get("Aes", "createInstance").unwrap().return_type,
            TypeId::DYNAMIC
        );
    }
}
