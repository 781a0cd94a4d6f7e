//! C# target AST and type system for the ilcs IL-to-C# transpiler.
//!
//! This crate owns everything the transformer needs to know about the
//! target language:
//! - `CsType` / `TypeId` / `TypeInterner` - the interned catalog of C#
//!   types with width and signedness queries
//! - the numeric-promotion and narrowing-conversion rules (`registry`)
//! - the C# AST the transformer builds (`ast`)
//!
//! It deliberately knows nothing about the IL; the dependency points the
//! other way.

pub mod ast;
pub mod registry;
pub mod types;

pub use ast::{
    CsAssignOp, CsBinaryOp, CsCatch, CsClass, CsConstructor, CsExpr, CsField, CsInterpPart,
    CsLambdaBody, CsLiteral, CsMember, CsMethod, CsParam, CsProperty, CsStmt, CsSwitchSection,
    CsUnaryOp, CsUnit, CsVisibility,
};
pub use registry::TypeError;
pub use types::{CsType, PrimitiveKind, TupleElem, TypeId, TypeInterner};
