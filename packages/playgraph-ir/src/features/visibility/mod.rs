//! Definition-time visibility records

pub mod recorder;

pub use recorder::{VisibilityDto, VisibilityEntry, VisibilityRecorder};
