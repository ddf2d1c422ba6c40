//! Template infrastructure: bundled scanner and impurity table

pub mod impurity;
pub mod scanner;

pub use scanner::JinjaScanner;
