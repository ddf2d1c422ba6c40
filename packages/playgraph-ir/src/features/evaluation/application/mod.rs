pub mod var_context;

pub use var_context::{ExtractionArtifacts, RecomputationEvent, VarContext};
