//! Transpiler options.
//!
//! This module lives in ilcs-common so that both the type layer and the
//! transformer can reference `TranspileOptions` without creating a circular
//! dependency. The framework/opcodes override tables are kept as raw JSON
//! values here; `ilcs-transform` deserializes them into its knowledge-base
//! structs when the transformation context is built.

use serde::{Deserialize, Serialize};

/// Configuration for one transpilation run.
///
/// All fields have serde defaults so a host CLI can read the whole struct
/// from a JSON config file and omit anything it does not care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileOptions {
    /// Namespace wrapping the emitted compilation unit.
    pub namespace: String,
    /// Outer class name for free-floating declarations.
    pub class_name: String,
    /// Extra framework base-class descriptions, merged *under* the
    /// built-ins: built-ins always win on names they define.
    pub framework_types: Option<serde_json::Value>,
    /// Return/parameter types for OpCodes helper methods, merged under the
    /// built-in helper table.
    pub opcodes_types: Option<serde_json::Value>,
    /// Emit trace lines while disambiguating `indexOf` rewrites.
    pub debug_index_of: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            namespace: "Generated".to_string(),
            class_name: "Program".to_string(),
            framework_types: None,
            opcodes_types: None,
            debug_index_of: false,
        }
    }
}
