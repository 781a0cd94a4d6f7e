//! IL-to-C# transformation core.
//!
//! The entry point is [`transpile`]: one IL program plus one options
//! record in, one C# compilation unit plus accumulated diagnostics out.
//! The pass is a sequential tree walk - referentially transparent for a
//! given `(program, options)` pair, byte-identical output run to run.
//!
//! ```
//! use ilcs_common::TranspileOptions;
//! use ilcs_il::IlNode;
//!
//! let program = IlNode::Program { body: vec![] };
//! let result = ilcs_transform::transpile(&program, TranspileOptions::default()).unwrap();
//! assert!(result.diagnostics.is_empty());
//! ```

pub mod analyze;
pub mod context;
pub mod framework;
pub mod infer;
pub mod scope;
pub mod signatures;
pub mod transform;

use ilcs_common::{Diagnostic, Fatal, TranspileOptions};
use ilcs_csharp::ast::CsUnit;
use ilcs_il::IlNode;

pub use analyze::{BodyAnalysis, ParamUsage, analyze_body};
pub use context::TransformContext;
pub use framework::FrameworkKb;
pub use scope::ScopeStack;
pub use signatures::{Signature, SignatureRegistry};

/// The result of a successful transpilation. The interner travels with
/// the unit: `TypeId`s in the tree are only meaningful against it, and
/// the downstream emitter renders type names through it.
#[derive(Debug)]
pub struct Transpiled {
    pub unit: CsUnit,
    pub diagnostics: Vec<Diagnostic>,
    pub interner: ilcs_csharp::types::TypeInterner,
}

/// Transform an IL program into a C# compilation unit.
///
/// Fatal conditions (malformed IL, a type-registry invariant violation)
/// return `Err`; everything else degrades to a conservative node plus a
/// diagnostic on the returned list.
pub fn transpile(program: &IlNode, options: TranspileOptions) -> Result<Transpiled, Fatal> {
    let mut ctx = TransformContext::new(options)?;
    tracing::debug!("transpile start");
    let unit = transform::transform_program(&mut ctx, program)?;
    tracing::debug!(diagnostics = ctx.diagnostics.len(), "transpile done");
    Ok(Transpiled {
        unit,
        diagnostics: ctx.diagnostics,
        interner: ctx.interner,
    })
}
