//! One scope's private stores
//!
//! Pure storage: local lookups and inserts only, never looks outside
//! itself. Resolution across environments lives in
//! [`crate::features::scoping::EnvironmentStack`].

use crate::features::evaluation::domain::records::{
    TemplateRecord, VariableDefinitionRecord, VariableValueRecord,
};
use rustc_hash::FxHashMap;

/// Variable definitions, variable values, and cached expression
/// evaluations for one scope.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    definitions: FxHashMap<String, VariableDefinitionRecord>,
    values: FxHashMap<String, VariableValueRecord>,
    expressions: FxHashMap<String, TemplateRecord>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn definition(&self, name: &str) -> Option<&VariableDefinitionRecord> {
        self.definitions.get(name)
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn set_definition(&mut self, record: VariableDefinitionRecord) {
        self.definitions.insert(record.name.clone(), record);
    }

    pub fn value(&self, name: &str) -> Option<&VariableValueRecord> {
        self.values.get(name)
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set_value(&mut self, name: impl Into<String>, record: VariableValueRecord) {
        self.values.insert(name.into(), record);
    }

    pub fn expression(&self, text: &str) -> Option<&TemplateRecord> {
        self.expressions.get(text)
    }

    pub fn has_expression(&self, text: &str) -> bool {
        self.expressions.contains_key(text)
    }

    pub fn set_expression(&mut self, text: impl Into<String>, record: TemplateRecord) {
        self.expressions.insert(text.into(), record);
    }

    pub fn definitions(&self) -> impl Iterator<Item = &VariableDefinitionRecord> {
        self.definitions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.values.is_empty() && self.expressions.is_empty()
    }
}
