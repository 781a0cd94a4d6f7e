//! Diagnostics for the IL-to-C# transformation.
//!
//! The transformer never panics on bad input. Recoverable problems become
//! `Diagnostic` values accumulated on the transform context; the two
//! unrecoverable conditions (malformed IL, a type-registry invariant
//! violation) become a `Fatal` returned through `Result`.

use std::fmt;

/// Category of a recoverable diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An IL node variant the transformer has no rule for. The output
    /// contains an error sentinel identifier at the node's position.
    UnhandledNode,
    /// Type inference had to fall back to a default with no signal at all.
    AmbiguousType,
    /// A call to an OpCodes helper not present in the framework table.
    UnknownOpCode,
    /// An identifier that resolved through no scope frame, class field
    /// table or framework property.
    UnresolvedIdentifier,
    /// An identifier was renamed to avoid a C# CS0136 redeclaration error.
    RenamedForCollision,
    /// A crypto-specific rewrite (object literal to framework constructor,
    /// typed-array view, ...) could not be applied and a conservative form
    /// was emitted instead.
    CryptoFallback,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnhandledNode => "UnhandledNode",
            DiagnosticKind::AmbiguousType => "AmbiguousType",
            DiagnosticKind::UnknownOpCode => "UnknownOpCode",
            DiagnosticKind::UnresolvedIdentifier => "UnresolvedIdentifier",
            DiagnosticKind::RenamedForCollision => "RenamedForCollision",
            DiagnosticKind::CryptoFallback => "CryptoFallback",
        }
    }
}

/// A recoverable diagnostic. The walk continues after recording one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Slash-separated path to the node, e.g. `Program/Class[Aes]/Method[encrypt]`.
    pub path: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind.as_str(), self.message, self.path)
    }
}

/// Category of a fatal error. Fatal errors abort the walk; no target AST
/// is returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FatalKind {
    /// An IL node whose payload does not have the shape its `kind` requires.
    MalformedIl,
    /// A type-registry invariant was violated, e.g. widening an array type
    /// against a primitive.
    TypeInvariant,
}

/// An unrecoverable transformation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fatal {
    pub kind: FatalKind,
    /// The IL node kind that triggered the abort.
    pub node_kind: &'static str,
    /// Slash-separated path to the offending node.
    pub path: String,
    pub message: String,
}

impl Fatal {
    pub fn malformed(
        node_kind: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: FatalKind::MalformedIl,
            node_kind,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn type_invariant(
        node_kind: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: FatalKind::TypeInvariant,
            node_kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FatalKind::MalformedIl => "malformed IL",
            FatalKind::TypeInvariant => "type invariant violation",
        };
        write!(
            f,
            "{} at {} ({}): {}",
            kind, self.path, self.node_kind, self.message
        )
    }
}

impl std::error::Error for Fatal {}
