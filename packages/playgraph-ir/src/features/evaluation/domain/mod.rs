pub mod records;

pub use records::{
    classify_change, Dependency, DependencyChange, TemplateRecord, VariableDefinitionRecord,
    VariableValueRecord, ValueKind,
};
