//! Shared models used across all feature slices

pub mod error;
pub mod ids;
pub mod span;
pub mod value;

pub use error::{Diagnostic, DiagnosticKind, ExtractionError, Result};
pub use ids::{DefVersion, NodeId, ValueVersion};
pub use span::{SourceLocation, Span};
pub use value::{CompositeValue, ScalarValue};
