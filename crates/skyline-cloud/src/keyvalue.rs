//! Key/value annotation and parameter codec
//!
//! Annotations and parameters travel as a JSON array of `{"key", "value"}`
//! objects rather than a plain object. Duplicate keys are legal on the wire;
//! when the array is folded into a map the last occurrence wins.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Map form of a key/value array
pub type KeyValueMap = BTreeMap<String, Value>;

/// One wire entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Ordered key/value list exactly as the remote API sends it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueList(pub Vec<KeyValue>);

impl KeyValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON array form; an empty string is an empty list
    pub fn parse(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_json::from_str(json)?)
    }

    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.0.push(KeyValue::new(key, value));
    }

    /// Value of the last entry named `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().rev().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Fold into a map, last duplicate wins
    pub fn to_map(&self) -> KeyValueMap {
        self.0
            .iter()
            .map(|kv| (kv.key.clone(), kv.value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl From<&KeyValueMap> for KeyValueList {
    fn from(map: &KeyValueMap) -> Self {
        Self(
            map.iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Parse a wire array into a map
pub fn expand(json: &str) -> Result<KeyValueMap> {
    Ok(KeyValueList::parse(json)?.to_map())
}

/// Serialize a map to the wire array, keys in sorted order
pub fn flatten(map: &KeyValueMap) -> Result<String> {
    KeyValueList::from(map).to_json()
}

/// Whether two wire arrays carry the same key/value content
///
/// Used to suppress diffs that only reorder entries. Any parse failure, or an
/// empty `old`, reports "not equivalent".
pub fn equivalent(old: &str, new: &str) -> bool {
    if old.is_empty() {
        return false;
    }
    let old_map = match expand(old) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("Could not parse previous key/value array: {}", e);
            return false;
        }
    };
    let new_map = match expand(new) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("Could not parse new key/value array: {}", e);
            return false;
        }
    };
    old_map == new_map
}

/// Check that a configuration string is valid JSON
pub fn validate(json: &str) -> Result<()> {
    serde_json::from_str::<Value>(json)?;
    Ok(())
}

/// Re-serialize JSON in compact form
pub fn normalize(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    Ok(serde_json::to_string(&value)?)
}
