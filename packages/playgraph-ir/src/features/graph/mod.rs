//! Graph IR: typed nodes and edges with insertion-time legality checks
//!
//! The substrate everything else writes into. Append-only within one
//! extraction run; no removal or update API.

pub mod domain;
pub mod infrastructure;

pub use domain::{Edge, Node, NodeKind};
pub use infrastructure::{EdgeDto, Graph, GraphDto, GraphStats, NodeEntry};
