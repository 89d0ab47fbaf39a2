//! Object filters and masks
//!
//! SoftLayer expresses `a.b.c == v` as nested objects:
//! `{"a":{"b":{"c":{"operation":v}}}}`.

use serde::Serialize;
use serde_json::{Map, Value};

/// `objectFilter` query parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectFilter(Value);

impl ObjectFilter {
    /// Equality on a dotted property path
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        let mut node = Value::Object(Map::from_iter([(
            "operation".to_string(),
            value.into(),
        )]));
        for segment in path.rsplit('.') {
            node = Value::Object(Map::from_iter([(segment.to_string(), node)]));
        }
        Self(node)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl std::fmt::Display for ObjectFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wrap a property list in `mask[...]` unless it already is
pub fn object_mask(mask: &str) -> String {
    let mask = mask.trim();
    if mask.starts_with("mask") {
        mask.to_string()
    } else {
        format!("mask[{}]", mask)
    }
}
