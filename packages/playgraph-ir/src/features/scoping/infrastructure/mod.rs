pub mod stack;

pub use stack::{EnvKey, EnvironmentStack, ScopeToken};
