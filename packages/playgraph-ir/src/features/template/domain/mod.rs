//! Template domain models

pub mod ast;

pub use ast::{walk, BinOp, ExprVisitor, Template, TemplateExpr, TemplatePart};
