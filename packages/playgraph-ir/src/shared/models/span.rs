//! Source spans and locations
//!
//! Every graph node may carry a `SourceLocation`. Included files keep a chain
//! back to the location of the include that pulled them in.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source span (line/column range, 1-based lines, 0-based columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Span {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Zero-width span at a single point
    pub fn point(line: u32, col: u32) -> Self {
        Span::new(line, col, line, col)
    }
}

/// Source location with include chain
///
/// `included_from` points at the location of the `include_*` / `import_*`
/// keyword that pulled this file in, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub span: Span,
    pub included_from: Option<Box<SourceLocation>>,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, span: Span) -> Self {
        SourceLocation {
            file: file.into(),
            span,
            included_from: None,
        }
    }

    pub fn included_from(mut self, parent: SourceLocation) -> Self {
        self.included_from = Some(Box::new(parent));
        self
    }

    /// Depth of the include chain (0 for a top-level file)
    pub fn include_depth(&self) -> usize {
        match &self.included_from {
            Some(parent) => 1 + parent.include_depth(),
            None => 0,
        }
    }
}
