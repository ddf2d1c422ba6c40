//! Graph IR infrastructure

pub mod graph;

pub use graph::{EdgeDto, Graph, GraphDto, GraphStats, NodeEntry};
