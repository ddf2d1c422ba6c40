//! Graph edge model with legality predicates
//!
//! Each edge variant admits a fixed set of (source, target) node kinds,
//! checked at insertion time by [`crate::features::graph::Graph::add_edge`].

use super::node::NodeKind;
use serde::{Deserialize, Serialize};

/// Graph edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Edge {
    /// Control flow between control nodes
    Order {
        transitive: bool,
        back: bool,
    },
    /// Data flowing into an expression, loop source, or conditional
    Use,
    /// Data flowing into a task argument
    Keyword {
        keyword: String,
    },
    /// Value producer defining a variable or intermediate value
    Def,
    /// A conditional that guards whether a variable gets defined
    DefinedIf,
    /// A loop source defining the per-iteration loop variable
    DefLoopItem,
}

impl Edge {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Edge::Order { .. } => "Order",
            Edge::Use => "Use",
            Edge::Keyword { .. } => "Keyword",
            Edge::Def => "Def",
            Edge::DefinedIf => "DefinedIf",
            Edge::DefLoopItem => "DefLoopItem",
        }
    }

    /// Legality predicate: may this edge connect `source` to `target`?
    ///
    /// Exhaustive over edge variants; the node-kind sets mirror the IR
    /// contract:
    /// - `Order` connects control nodes only;
    /// - `Use` feeds data into Expression/Loop/Conditional;
    /// - `Keyword` feeds data into a Task argument;
    /// - `Def` into an IntermediateValue comes only from its Expression,
    ///   into a Variable from any value producer (literal, intermediate
    ///   value, expression, or a registering task);
    /// - `DefinedIf` connects a Conditional to a Variable;
    /// - `DefLoopItem` connects the loop-source data node to the loop
    ///   variable.
    pub fn legal(&self, source: NodeKind, target: NodeKind) -> bool {
        match self {
            Edge::Order { .. } => source.is_control() && target.is_control(),
            Edge::Use => {
                source.is_data()
                    && matches!(
                        target,
                        NodeKind::Expression | NodeKind::Loop | NodeKind::Conditional
                    )
            }
            Edge::Keyword { .. } => source.is_data() && target == NodeKind::Task,
            Edge::Def => match target {
                NodeKind::IntermediateValue => source == NodeKind::Expression,
                NodeKind::Variable => matches!(
                    source,
                    NodeKind::ScalarLiteral
                        | NodeKind::CompositeLiteral
                        | NodeKind::IntermediateValue
                        | NodeKind::Expression
                        | NodeKind::Task
                ),
                _ => false,
            },
            Edge::DefinedIf => source == NodeKind::Conditional && target == NodeKind::Variable,
            Edge::DefLoopItem => source.is_data() && target == NodeKind::Variable,
        }
    }
}
