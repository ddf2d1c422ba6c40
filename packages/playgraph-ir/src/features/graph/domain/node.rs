//! Graph node model
//!
//! Closed sum type: adding a node kind is a compile-time exercise, every
//! legality predicate and kind query matches exhaustively.

use crate::shared::models::{CompositeValue, DefVersion, ScalarValue, ValueVersion};
use serde::{Deserialize, Serialize};

/// Node kind discriminant (used by edge legality and queries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Task,
    Loop,
    Conditional,
    Variable,
    IntermediateValue,
    ScalarLiteral,
    CompositeLiteral,
    Expression,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Task => "Task",
            NodeKind::Loop => "Loop",
            NodeKind::Conditional => "Conditional",
            NodeKind::Variable => "Variable",
            NodeKind::IntermediateValue => "IntermediateValue",
            NodeKind::ScalarLiteral => "ScalarLiteral",
            NodeKind::CompositeLiteral => "CompositeLiteral",
            NodeKind::Expression => "Expression",
        }
    }

    /// Control-flow node kinds
    pub fn is_control(&self) -> bool {
        matches!(self, NodeKind::Task | NodeKind::Loop | NodeKind::Conditional)
    }

    /// Data-flow node kinds
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            NodeKind::Variable
                | NodeKind::IntermediateValue
                | NodeKind::ScalarLiteral
                | NodeKind::CompositeLiteral
                | NodeKind::Expression
        )
    }
}

/// Graph node
///
/// `Variable` carries both counters: `version` distinguishes successive
/// rebindings of one name, `value_version` successive recomputed values of
/// one rebinding. A recomputation adds a fresh `Variable` node with the same
/// `version` and a bumped `value_version`; nodes are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Task {
        action: String,
        name: Option<String>,
    },
    Loop,
    Conditional,
    Variable {
        name: String,
        version: DefVersion,
        value_version: ValueVersion,
        /// Numeric precedence of the level the definition was created at
        precedence: u8,
    },
    IntermediateValue {
        /// Globally increasing within one extraction; one per evaluation
        /// occurrence of an expression
        identifier: u64,
    },
    ScalarLiteral(ScalarValue),
    CompositeLiteral(CompositeValue),
    Expression {
        /// Raw template text
        expr: String,
        /// Named filters/tests/lookups known to be non-deterministic or
        /// environment-dependent
        impure_components: Vec<String>,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Task { .. } => NodeKind::Task,
            Node::Loop => NodeKind::Loop,
            Node::Conditional => NodeKind::Conditional,
            Node::Variable { .. } => NodeKind::Variable,
            Node::IntermediateValue { .. } => NodeKind::IntermediateValue,
            Node::ScalarLiteral(_) => NodeKind::ScalarLiteral,
            Node::CompositeLiteral(_) => NodeKind::CompositeLiteral,
            Node::Expression { .. } => NodeKind::Expression,
        }
    }

    pub fn is_control(&self) -> bool {
        self.kind().is_control()
    }

    pub fn is_data(&self) -> bool {
        self.kind().is_data()
    }

    /// Whether the expression uses any impure construct
    pub fn may_be_impure(&self) -> bool {
        match self {
            Node::Expression {
                impure_components, ..
            } => !impure_components.is_empty(),
            _ => false,
        }
    }
}
