//! Template-expression boundary
//!
//! The engine consumes templates only through [`TemplateParser`]; the
//! bundled [`JinjaScanner`] is a reference implementation good enough for
//! extraction and tests.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Template, TemplateExpr, TemplatePart};
pub use infrastructure::impurity;
pub use infrastructure::JinjaScanner;
pub use ports::{ParsedTemplate, TemplateParser};
