//! Opaque identifiers
//!
//! Node ids are assigned exactly once, on insertion, by the owning `Graph`.
//! They are monotonic within one extraction and never reused.

use serde::{Deserialize, Serialize};

/// Graph node id (opaque, monotonically assigned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Definition revision of a variable name
pub type DefVersion = u32;

/// Value revision of one variable definition
pub type ValueVersion = u32;
