//! Error types for the playgraph-ir crate
//!
//! Three severity classes, matching the extraction failure taxonomy:
//! - upstream/model problems are carried as non-fatal [`Diagnostic`]s and the
//!   extraction continues with a best-effort partial graph;
//! - [`ExtractionError::RecursiveDefinition`] is a catchable per-unit failure;
//! - everything marked fatal is an internal invariant violation that aborts
//!   the single extraction unit (never the whole batch).

use super::ids::{DefVersion, NodeId};
use super::span::SourceLocation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A construct the extractor does not model (statement blocks, for
    /// one). Raised at the collaborator boundary; the engine downgrades it
    /// to a [`Diagnostic`] and continues.
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String },

    /// Template text the expression parser rejected.
    #[error("template parse failure: {message}")]
    TemplateParse { message: String },

    /// A variable whose initializer transitively depends on itself.
    #[error("recursive definition of variable '{name}'")]
    RecursiveDefinition { name: String },

    /// Edge legality predicate rejected the endpoint kinds. Fatal.
    #[error("illegal {edge} edge: {source_kind} -> {target_kind}")]
    IllegalEdge {
        edge: &'static str,
        source_kind: &'static str,
        target_kind: &'static str,
    },

    /// Edge endpoint was never inserted. Fatal.
    #[error("unknown node {0}")]
    MissingNode(NodeId),

    /// Scope push/pop order did not mirror the walked nesting. Fatal.
    #[error("scope discipline violation: {0}")]
    ScopeDiscipline(String),

    /// Visibility data requested before being recorded. Fatal.
    #[error("no visibility recorded for '{name}' v{version}")]
    VisibilityMissing { name: String, version: DefVersion },

    /// Core bug. Fatal.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExtractionError {
    /// Fatal errors abort the extraction unit; they indicate a core bug
    /// rather than a property of the analyzed sources.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractionError::IllegalEdge { .. }
                | ExtractionError::MissingNode(_)
                | ExtractionError::ScopeDiscipline(_)
                | ExtractionError::VisibilityMissing { .. }
                | ExtractionError::Internal(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Non-fatal diagnostic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    UnsupportedConstruct,
    MalformedTemplate,
    MissingInclude,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedConstruct => "unsupported_construct",
            DiagnosticKind::MalformedTemplate => "malformed_template",
            DiagnosticKind::MissingInclude => "missing_include",
        }
    }
}

/// Non-fatal diagnostic recorded during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(ExtractionError::Internal("bug".into()).is_fatal());
        assert!(ExtractionError::ScopeDiscipline("pop".into()).is_fatal());
        assert!(!ExtractionError::RecursiveDefinition { name: "a".into() }.is_fatal());
        assert!(!ExtractionError::TemplateParse {
            message: "bad".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = ExtractionError::RecursiveDefinition { name: "app_port".into() };
        assert!(err.to_string().contains("app_port"));
    }
}
