//! Extraction driver surface
//!
//! Ties the engine together for callers: closure-based extraction units,
//! the parallel batch runner, and variable-file loading. Control-flow
//! walking itself stays outside the crate; drivers use the
//! [`crate::features::evaluation::VarContext`] API plus direct graph
//! access.

pub mod batch;
pub mod vars;

pub use batch::{run_batch, run_unit, ExtractionReport, ExtractionUnit};
pub use vars::load_variable_file;
