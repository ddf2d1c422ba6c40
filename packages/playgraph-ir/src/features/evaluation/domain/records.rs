//! Memoization records
//!
//! Immutable, equality-based keys linking environments to graph nodes:
//! - a definition record per (name, version);
//! - a value record per computed value of one definition;
//! - a template record per cached expression evaluation.

use crate::features::scoping::domain::ScopeLevel;
use crate::shared::models::{DefVersion, NodeId, ValueVersion};
use serde::{Deserialize, Serialize};

/// One exact dependency of a cached evaluation: the definition revision and
/// value revision that were actually used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: DefVersion,
    pub value_version: ValueVersion,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: DefVersion, value_version: ValueVersion) -> Self {
        Dependency {
            name: name.into(),
            version,
            value_version,
        }
    }
}

/// Record of one variable definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDefinitionRecord {
    pub name: String,
    pub version: DefVersion,
    /// Raw initializer template; absent for definitions without one
    pub initializer: Option<String>,
    /// True when the value is fixed eagerly at definition time (facts,
    /// injected host variables); false for lazily-templated initializers
    pub eager: bool,
    pub level: ScopeLevel,
    /// The `Variable` node created at definition time (value_version 0)
    pub node: NodeId,
}

/// Record of one cached expression evaluation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// The data node this evaluation produced (intermediate value, or the
    /// literal node for bare-literal templates)
    pub data_node: NodeId,
    /// The originating `Expression` node; absent for bare literals
    pub expr_node: Option<NodeId>,
    /// Exact (name, version, value_version) triples the evaluation used,
    /// in resolution order
    pub dependencies: Vec<Dependency>,
    pub is_literal: bool,
    /// Derived from the expression's impure-component list
    pub may_be_impure: bool,
}

/// Record of one concrete value of one variable definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableValueRecord {
    /// Which definition revision this value belongs to
    pub definition_version: DefVersion,
    pub kind: ValueKind,
}

/// Constant values never need re-evaluation machinery; changeable values
/// carry the template record they were computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Constant {
        /// The `Variable` node (value_version is always 0 for constants)
        node: NodeId,
    },
    Changeable {
        template: TemplateRecord,
        value_version: ValueVersion,
        /// The `Variable` node carrying this value_version
        node: NodeId,
    },
}

impl VariableValueRecord {
    pub fn constant(definition_version: DefVersion, node: NodeId) -> Self {
        VariableValueRecord {
            definition_version,
            kind: ValueKind::Constant { node },
        }
    }

    pub fn changeable(
        definition_version: DefVersion,
        template: TemplateRecord,
        value_version: ValueVersion,
        node: NodeId,
    ) -> Self {
        VariableValueRecord {
            definition_version,
            kind: ValueKind::Changeable {
                template,
                value_version,
                node,
            },
        }
    }

    pub fn value_version(&self) -> ValueVersion {
        match &self.kind {
            ValueKind::Constant { .. } => 0,
            ValueKind::Changeable { value_version, .. } => *value_version,
        }
    }

    /// The data node a `Use` edge should start from when this value is read
    pub fn node(&self) -> NodeId {
        match &self.kind {
            ValueKind::Constant { node } => *node,
            ValueKind::Changeable { node, .. } => *node,
        }
    }

    pub fn template(&self) -> Option<&TemplateRecord> {
        match &self.kind {
            ValueKind::Constant { .. } => None,
            ValueKind::Changeable { template, .. } => Some(template),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Dependency-change classification
// ═══════════════════════════════════════════════════════════════════════════

/// Why two value revisions of the same definition differ.
///
/// Computed by the core, consumed as data by downstream rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyChange {
    /// A dependency was rebound to a different definition revision
    Rebound {
        name: String,
        old_version: DefVersion,
        new_version: DefVersion,
    },
    /// A dependency's value changed transitively (same definition revision)
    TransitiveValueChange {
        name: String,
        old_value_version: ValueVersion,
        new_value_version: ValueVersion,
    },
    /// Identical inputs: the expression itself is non-idempotent
    NonIdempotent,
}

/// Classify why `new` was computed when `old` already existed.
///
/// Returns `None` when the records are identical (no recomputation
/// happened, or the comparison is meaningless).
pub fn classify_change(old: &TemplateRecord, new: &TemplateRecord) -> Option<DependencyChange> {
    for new_dep in &new.dependencies {
        let Some(old_dep) = old.dependencies.iter().find(|d| d.name == new_dep.name) else {
            continue;
        };
        if old_dep.version != new_dep.version {
            return Some(DependencyChange::Rebound {
                name: new_dep.name.clone(),
                old_version: old_dep.version,
                new_version: new_dep.version,
            });
        }
    }
    for new_dep in &new.dependencies {
        let Some(old_dep) = old.dependencies.iter().find(|d| d.name == new_dep.name) else {
            continue;
        };
        if old_dep.value_version != new_dep.value_version {
            return Some(DependencyChange::TransitiveValueChange {
                name: new_dep.name.clone(),
                old_value_version: old_dep.value_version,
                new_value_version: new_dep.value_version,
            });
        }
    }
    if old.dependencies == new.dependencies && new.may_be_impure && old.data_node != new.data_node {
        return Some(DependencyChange::NonIdempotent);
    }
    None
}
