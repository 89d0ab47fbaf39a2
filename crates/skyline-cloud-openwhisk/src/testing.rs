//! In-memory OpenWhisk deployment used by the handler tests

use crate::client::{Collection, WhiskApi};
use crate::error::{Result, WhiskError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

pub const AUTH_KEY: &str = "23bc46b1-71f6-4ed5-8c54-816aa4f8c502:secret";

type Key = (Collection, String, String);

#[derive(Default)]
struct Deployment {
    entities: HashMap<Key, Value>,
    puts: Vec<(Collection, String, String, bool)>,
    invocations: Vec<(String, String, Value)>,
    fail_invocations: bool,
}

pub struct FakeWhisk {
    namespace: String,
    deployment: Mutex<Deployment>,
}

fn missing(collection: Collection, name: &str) -> WhiskError {
    WhiskError::Api {
        status: 404,
        message: format!("The requested resource does not exist: {} {}", collection, name),
    }
}

/// `/a/b/c` as the API reports rule references
fn path_and_name(reference: &Value) -> Value {
    match reference.as_str() {
        Some(qualified) => {
            let trimmed = qualified.trim_start_matches('/');
            match trimmed.rsplit_once('/') {
                Some((path, name)) => json!({"path": path, "name": name}),
                None => json!({"path": "_", "name": trimmed}),
            }
        }
        None => reference.clone(),
    }
}

fn bump(version: &str) -> String {
    let mut parts: Vec<u64> = version.split('.').filter_map(|p| p.parse().ok()).collect();
    if parts.len() != 3 {
        return "0.0.1".to_string();
    }
    parts[2] += 1;
    format!("{}.{}.{}", parts[0], parts[1], parts[2])
}

impl FakeWhisk {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            deployment: Mutex::new(Deployment::default()),
        }
    }

    fn deployment(&self) -> MutexGuard<'_, Deployment> {
        self.deployment.lock().unwrap()
    }

    pub fn entity(&self, collection: Collection, namespace: &str, name: &str) -> Option<Value> {
        self.deployment()
            .entities
            .get(&(collection, namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn seed(&self, collection: Collection, namespace: &str, name: &str, entity: Value) {
        self.deployment()
            .entities
            .insert((collection, namespace.to_string(), name.to_string()), entity);
    }

    pub fn puts(&self) -> Vec<(Collection, String, String, bool)> {
        self.deployment().puts.clone()
    }

    pub fn invocations(&self) -> Vec<(String, String, Value)> {
        self.deployment().invocations.clone()
    }

    pub fn fail_invocations(&self) {
        self.deployment().fail_invocations = true;
    }
}

#[async_trait]
impl WhiskApi for FakeWhisk {
    fn default_namespace(&self) -> &str {
        &self.namespace
    }

    fn auth_key(&self) -> &str {
        AUTH_KEY
    }

    async fn get(&self, collection: Collection, namespace: &str, name: &str) -> Result<Value> {
        self.entity(collection, namespace, name)
            .ok_or_else(|| missing(collection, name))
    }

    async fn put(
        &self,
        collection: Collection,
        namespace: &str,
        name: &str,
        body: &Value,
        overwrite: bool,
    ) -> Result<Value> {
        let mut deployment = self.deployment();
        deployment
            .puts
            .push((collection, namespace.to_string(), name.to_string(), overwrite));

        let key = (collection, namespace.to_string(), name.to_string());
        let previous = deployment.entities.get(&key).cloned();
        if previous.is_some() && !overwrite {
            return Err(WhiskError::Api {
                status: 409,
                message: "resource by this name exists".to_string(),
            });
        }

        let mut stored = body.clone();
        let entity_namespace = match name.rsplit_once('/') {
            Some((package, _)) => format!("{}/{}", namespace, package),
            None => namespace.to_string(),
        };
        let version = previous
            .as_ref()
            .and_then(|p| p.get("version"))
            .and_then(Value::as_str)
            .map(bump)
            .unwrap_or_else(|| "0.0.1".to_string());

        if let Some(object) = stored.as_object_mut() {
            object.insert("namespace".to_string(), json!(entity_namespace));
            object.insert("version".to_string(), json!(version));
            object
                .entry("publish".to_string())
                .or_insert(json!(false));
            if collection == Collection::Rules {
                for field in ["trigger", "action"] {
                    if let Some(reference) = object.get(field) {
                        let converted = path_and_name(reference);
                        object.insert(field.to_string(), converted);
                    }
                }
                let status = previous
                    .as_ref()
                    .and_then(|p| p.get("status"))
                    .cloned()
                    .unwrap_or_else(|| json!("active"));
                object.insert("status".to_string(), status);
            }
        }

        deployment.entities.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, collection: Collection, namespace: &str, name: &str) -> Result<()> {
        self.deployment()
            .entities
            .remove(&(collection, namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| missing(collection, name))
    }

    async fn invoke(&self, namespace: &str, name: &str, params: &Value) -> Result<Value> {
        let mut deployment = self.deployment();
        deployment
            .invocations
            .push((namespace.to_string(), name.to_string(), params.clone()));
        if deployment.fail_invocations {
            return Err(WhiskError::Api {
                status: 502,
                message: "The action did not produce a valid response".to_string(),
            });
        }
        Ok(json!({}))
    }

    async fn set_rule_state(&self, namespace: &str, name: &str, status: &str) -> Result<Value> {
        let mut deployment = self.deployment();
        let key = (Collection::Rules, namespace.to_string(), name.to_string());
        let rule = deployment
            .entities
            .get_mut(&key)
            .ok_or_else(|| missing(Collection::Rules, name))?;
        if let Some(object) = rule.as_object_mut() {
            object.insert("status".to_string(), json!(status));
        }
        Ok(rule.clone())
    }
}
