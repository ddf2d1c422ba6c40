//! Evaluation: memoization records and the `VarContext` engine
//!
//! Decides when a previously computed value may be reused and when it must
//! be recomputed, tracking definition and value revisions SSA-style.

pub mod application;
pub mod domain;

pub use application::{ExtractionArtifacts, RecomputationEvent, VarContext};
pub use domain::{
    classify_change, Dependency, DependencyChange, TemplateRecord, VariableDefinitionRecord,
    VariableValueRecord, ValueKind,
};
