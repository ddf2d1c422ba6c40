//! Graph IR domain models

pub mod edge;
pub mod node;

pub use edge::Edge;
pub use node::{Node, NodeKind};
