//! Template parser port
//!
//! The expression language is an external collaborator: the engine only
//! needs referenced variable names, used filter/test/lookup names, and an
//! impurity classification. The bundled reference implementation is
//! [`crate::features::template::JinjaScanner`].

use crate::features::template::domain::ast::{walk, ExprVisitor, Template, TemplateExpr};
use crate::features::template::infrastructure::impurity::impure_components;
use crate::shared::models::Result;

/// Outcome of parsing one template string
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub template: Template,
    /// Referenced variable names, in first-occurrence order, deduplicated
    pub referenced: Vec<String>,
    /// Filter names used (`| default(...)` etc.)
    pub filters: Vec<String>,
    /// Test names used (`is defined` etc.)
    pub tests: Vec<String>,
    /// Lookup/builtin call names used (`lookup(...)`, `now()` etc.)
    pub lookups: Vec<String>,
    /// True when the whole template is constant text with no expression
    pub is_literal: bool,
}

impl ParsedTemplate {
    pub fn from_template(template: Template) -> Self {
        let mut collector = UsageCollector::default();
        for expr in template.expressions() {
            walk(expr, &mut collector);
        }
        let is_literal = template.is_literal();
        ParsedTemplate {
            template,
            referenced: collector.referenced,
            filters: collector.filters,
            tests: collector.tests,
            lookups: collector.lookups,
            is_literal,
        }
    }

    /// Names of non-deterministic or environment-dependent constructs used
    pub fn impure_components(&self) -> Vec<String> {
        impure_components(self)
    }
}

#[derive(Default)]
struct UsageCollector {
    referenced: Vec<String>,
    filters: Vec<String>,
    tests: Vec<String>,
    lookups: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

impl ExprVisitor for UsageCollector {
    fn visit_name(&mut self, name: &str) {
        push_unique(&mut self.referenced, name);
    }

    fn visit_call(&mut self, name: &str) {
        push_unique(&mut self.lookups, name);
    }

    fn visit_filter(&mut self, name: &str) {
        push_unique(&mut self.filters, name);
    }

    fn visit_test(&mut self, name: &str) {
        push_unique(&mut self.tests, name);
    }
}

/// Template-language collaborator boundary.
///
/// `parse` treats text without `{{ }}` markers as a literal; `parse_condition`
/// parses bare expression text (`when:` style conditions are not wrapped in
/// braces).
pub trait TemplateParser {
    fn parse(&self, text: &str) -> Result<ParsedTemplate>;

    fn parse_condition(&self, text: &str) -> Result<ParsedTemplate>;
}
