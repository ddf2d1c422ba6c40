//! Template ports (external collaborator boundary)

pub mod parser;

pub use parser::{ParsedTemplate, TemplateParser};
