//! Common types and utilities for the ilcs IL-to-C# transpiler.
//!
//! This crate provides foundational types used across all ilcs crates:
//! - Diagnostics (`Diagnostic`, `DiagnosticKind`, `Fatal`)
//! - Transpiler options (`TranspileOptions`)
//! - Identifier casing and C# keyword escaping

// Diagnostics - warnings accumulated during transformation, fatal errors
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticKind, Fatal, FatalKind};

// Options - Shared configuration to break circular dependencies
pub mod options;
pub use options::TranspileOptions;

// Identifier casing and reserved-word escaping
pub mod idents;
pub use idents::{escape_reserved, is_reserved_word, to_camel_case, to_pascal_case};
