//! Literal value models
//!
//! Constant values appearing in playbook sources: scalars and composites.
//! Composites keep their children as JSON values; the core never interprets
//! them beyond equality and serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar constant value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Int(_) => "int",
            ScalarValue::Float(_) => "float",
            ScalarValue::Str(_) => "str",
        }
    }

    /// Convert a YAML scalar; returns `None` for sequences and mappings.
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<ScalarValue> {
        match value {
            serde_yaml::Value::Null => Some(ScalarValue::Null),
            serde_yaml::Value::Bool(b) => Some(ScalarValue::Bool(*b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(ScalarValue::Int(i))
                } else {
                    n.as_f64().map(ScalarValue::Float)
                }
            }
            serde_yaml::Value::String(s) => Some(ScalarValue::Str(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Composite constant value (sequence or mapping)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CompositeValue {
    Seq(Vec<Value>),
    Map(serde_json::Map<String, Value>),
}

impl CompositeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            CompositeValue::Seq(_) => "seq",
            CompositeValue::Map(_) => "map",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CompositeValue::Seq(items) => items.len(),
            CompositeValue::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_from_yaml() {
        let v: serde_yaml::Value = serde_yaml::from_str("42").unwrap();
        assert_eq!(ScalarValue::from_yaml(&v), Some(ScalarValue::Int(42)));

        let v: serde_yaml::Value = serde_yaml::from_str("hello").unwrap();
        assert_eq!(
            ScalarValue::from_yaml(&v),
            Some(ScalarValue::Str("hello".to_string()))
        );

        let v: serde_yaml::Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert_eq!(ScalarValue::from_yaml(&v), None);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(ScalarValue::Str("x".into()).to_string(), "x");
        assert_eq!(ScalarValue::Null.to_string(), "null");
    }
}
