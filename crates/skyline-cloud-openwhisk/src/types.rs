//! OpenWhisk entity documents

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyline_cloud::KeyValueList;

/// Action code and runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
}

/// Action resource limits as the API names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub timeout: u64,
    pub memory: u64,
    pub logs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<Exec>,
    #[serde(default)]
    pub annotations: KeyValueList,
    #[serde(default)]
    pub parameters: KeyValueList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default)]
    pub annotations: KeyValueList,
    #[serde(default)]
    pub parameters: KeyValueList,
}

impl Trigger {
    /// Feed action recorded on the trigger, if any
    pub fn feed(&self) -> Option<String> {
        self.annotations
            .get(FEED_ANNOTATION)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Annotation key holding a trigger's feed action
pub const FEED_ANNOTATION: &str = "feed";

/// Annotation key OpenWhisk adds to package bindings
pub const BINDING_ANNOTATION: &str = "binding";

/// Reference from a rule to its trigger or action
///
/// Sent as a fully qualified string; the API answers with `{path, name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Path(String),
    Qualified { path: String, name: String },
}

impl EntityRef {
    /// Entity name without namespace or package
    pub fn name(&self) -> &str {
        match self {
            EntityRef::Path(path) => path.rsplit('/').next().unwrap_or(path.as_str()),
            EntityRef::Qualified { name, .. } => name,
        }
    }

    /// `/path/name` form
    pub fn qualified(&self) -> String {
        match self {
            EntityRef::Path(path) => path.clone(),
            EntityRef::Qualified { path, name } => format!("/{}/{}", path, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    pub trigger: EntityRef,
    pub action: EntityRef,
}

/// Package a binding points at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

impl Binding {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default)]
    pub annotations: KeyValueList,
    #[serde(default)]
    pub parameters: KeyValueList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
}

impl Package {
    /// Bound package as `/namespace/name`, if this package is a binding
    pub fn bound_to(&self) -> Option<String> {
        self.binding
            .as_ref()
            .filter(|b| !b.is_empty())
            .map(|b| format!("/{}/{}", b.namespace, b.name))
    }
}

/// Annotations minus the keys the platform manages itself
pub fn user_defined(list: &KeyValueList, reserved: &str) -> KeyValueList {
    KeyValueList(
        list.iter()
            .filter(|kv| kv.key != reserved)
            .cloned()
            .collect(),
    )
}
