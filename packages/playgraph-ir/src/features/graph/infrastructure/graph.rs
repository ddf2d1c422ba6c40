//! Typed graph substrate
//!
//! Append-only: nodes and edges are created once during a single sequential
//! extraction pass and never mutated or deleted. The whole graph is owned
//! exclusively by one extraction run.
//!
//! Uses petgraph for the underlying storage with a NodeId -> NodeIndex side
//! map, so id assignment stays monotonic and opaque to callers.

use crate::features::graph::domain::{Edge, Node, NodeKind};
use crate::shared::models::{ExtractionError, NodeId, Result, SourceLocation};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Node with its assigned id and optional source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    pub node: Node,
    pub location: Option<SourceLocation>,
}

/// Program dependence graph for one extraction unit
#[derive(Debug, Default)]
pub struct Graph {
    graph: DiGraph<NodeEntry, Edge>,
    index: FxHashMap<NodeId, NodeIndex>,
    next_id: u32,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Insert a node, assigning its id. Ids are assigned exactly once and
    /// are immutable thereafter.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.add_node_at(node, None)
    }

    pub fn add_node_at(&mut self, node: Node, location: Option<SourceLocation>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let idx = self.graph.add_node(NodeEntry { id, node, location });
        self.index.insert(id, idx);
        tracing::trace!(node = %id, "added node");
        id
    }

    /// Insert an edge, enforcing the variant's legality predicate.
    ///
    /// Re-adding an equal edge between the same endpoints is a no-op and
    /// returns the existing edge handle. Missing endpoints and illegal
    /// endpoint kinds are fatal errors.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: Edge) -> Result<EdgeIndex> {
        let src_idx = self.index(source)?;
        let dst_idx = self.index(target)?;

        let src_kind = self.graph[src_idx].node.kind();
        let dst_kind = self.graph[dst_idx].node.kind();
        if !edge.legal(src_kind, dst_kind) {
            return Err(ExtractionError::IllegalEdge {
                edge: edge.kind_str(),
                source_kind: src_kind.as_str(),
                target_kind: dst_kind.as_str(),
            });
        }

        // Parallel edges of identical (source, target, edge) are deduplicated
        for existing in self.graph.edges_connecting(src_idx, dst_idx) {
            if existing.weight() == &edge {
                return Ok(petgraph::visit::EdgeRef::id(&existing));
            }
        }

        Ok(self.graph.add_edge(src_idx, dst_idx, edge))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&idx| &self.graph[idx].node)
    }

    pub fn location(&self, id: NodeId) -> Option<&SourceLocation> {
        self.index
            .get(&id)
            .and_then(|&idx| self.graph[idx].location.as_ref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Incoming (predecessor, edge) pairs
    pub fn predecessors(&self, id: NodeId) -> Vec<(NodeId, &Edge)> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Outgoing (successor, edge) pairs
    pub fn successors(&self, id: NodeId) -> Vec<(NodeId, &Edge)> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Predecessors reached over edges matching `filter`
    pub fn predecessors_by<F>(&self, id: NodeId, filter: F) -> Vec<NodeId>
    where
        F: Fn(&Edge) -> bool,
    {
        self.predecessors(id)
            .into_iter()
            .filter(|(_, e)| filter(e))
            .map(|(n, _)| n)
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntry> {
        self.graph.node_weights()
    }

    /// All node ids of a given kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.graph
            .node_weights()
            .filter(|entry| entry.node.kind() == kind)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let mut control_edges = 0;
        let mut data_edges = 0;
        for edge in self.graph.edge_weights() {
            match edge {
                Edge::Order { .. } => control_edges += 1,
                _ => data_edges += 1,
            }
        }
        GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            control_edges,
            data_edges,
        }
    }

    fn neighbors(&self, id: NodeId, dir: Direction) -> Vec<(NodeId, &Edge)> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Incoming => petgraph::visit::EdgeRef::source(&e),
                    Direction::Outgoing => petgraph::visit::EdgeRef::target(&e),
                };
                (self.graph[other].id, e.weight())
            })
            .collect()
    }

    fn index(&self, id: NodeId) -> Result<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or(ExtractionError::MissingNode(id))
    }
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub control_edges: usize,
    pub data_edges: usize,
}

/// Serializable DTO (node list + edge list)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeEntry>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDto {
    pub source: NodeId,
    pub target: NodeId,
    pub edge: Edge,
}

impl Graph {
    pub fn to_dto(&self) -> GraphDto {
        let nodes = self.graph.node_weights().cloned().collect();
        let edges = self
            .graph
            .edge_indices()
            .filter_map(|idx| {
                let (a, b) = self.graph.edge_endpoints(idx)?;
                Some(EdgeDto {
                    source: self.graph[a].id,
                    target: self.graph[b].id,
                    edge: self.graph[idx].clone(),
                })
            })
            .collect();
        GraphDto { nodes, edges }
    }
}

impl Serialize for Graph {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_dto().serialize(serializer)
    }
}
