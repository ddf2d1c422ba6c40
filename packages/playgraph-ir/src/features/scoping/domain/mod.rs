pub mod environment;
pub mod level;

pub use environment::Environment;
pub use level::ScopeLevel;
