/*
 * Playgraph IR - Playbook Program Dependence Graph Extraction Core
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (Span, values, errors)
 * - features/    : Vertical slices (template → scoping → evaluation → graph)
 *
 * The engine reproduces the host automation system's dynamically-scoped,
 * precedence-ordered variable binding model and decides when a computed
 * value may be reused versus recomputed, emitting a typed dependence graph
 * plus a definition-time visibility record.
 */

#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use features::evaluation::{
    classify_change, DependencyChange, ExtractionArtifacts, RecomputationEvent, VarContext,
};
pub use features::extraction::{load_variable_file, run_batch, ExtractionReport, ExtractionUnit};
pub use features::graph::{Edge, Graph, GraphDto, Node, NodeKind};
pub use features::scoping::{EnvironmentStack, ScopeLevel, ScopeToken};
pub use features::template::{JinjaScanner, ParsedTemplate, TemplateParser};
pub use features::visibility::{VisibilityDto, VisibilityRecorder};
pub use shared::models::{
    Diagnostic, DiagnosticKind, ExtractionError, NodeId, Result, SourceLocation, Span,
};
