//! IL AST definitions for the ilcs IL-to-C# transpiler.
//!
//! The upstream JavaScript front end lowers JS-specific idioms into this
//! intermediate tree before the C# transformer ever sees it: `x >>> 0`
//! arrives as a `Binary` with `UShr`, `a.push(x)` as `ArrayAppend`,
//! `Math.floor(x)` as a `MathCall`, rotation idioms as `RotateLeft`/
//! `RotateRight`, and so on. Every variant is a struct or unit variant so
//! the tree round-trips through the internally-tagged JSON form the
//! pipeline produces.
//!
//! The enum is closed on purpose: adding a variant is a compile-time
//! obligation for every consumer, which is how unhandled-node bugs are
//! kept out of the transformer.

pub mod ast;
pub mod ops;

pub use ast::{
    IlMemberProperty, IlNode, IlObjectProperty, IlParam, IlSwitchCase, IlValue, TemplatePart,
};
pub use ops::{
    AssignOp, BinaryOp, JsErrorKind, LogicalOp, MathConst, MathFunc, NumberConst, NumericKind,
    UnaryOp, UpdateOp,
};
