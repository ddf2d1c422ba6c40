//! Scoping: precedence levels, environments, and the environment stack
//!
//! Implements the host system's 21-level variable precedence model with
//! first-match-wins resolution over a precedence-ordered chain of
//! environments, plus the value-hoisting rule that keeps computed values
//! alive exactly as long as their dependencies are.

pub mod domain;
pub mod infrastructure;

pub use domain::{Environment, ScopeLevel};
pub use infrastructure::{EnvKey, EnvironmentStack, ScopeToken};
