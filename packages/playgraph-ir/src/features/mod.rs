//! Feature modules - each follows Hexagonal Architecture where it has mass
//!
//! - domain/         - Pure models (no external collaborators)
//! - ports/          - Interface definitions (traits)
//! - application/    - Orchestrating services
//! - infrastructure/ - Concrete engines

pub mod evaluation;
pub mod extraction;
pub mod graph;
pub mod scoping;
pub mod template;
pub mod visibility;
