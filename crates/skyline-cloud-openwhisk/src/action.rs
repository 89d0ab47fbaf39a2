//! Action handler

use crate::client::{Collection, WhiskApi, fetch, probe, store};
use crate::error::Result;
use crate::exec::{ExecConfig, LimitsConfig, expand_exec, expand_limits, flatten_exec, flatten_limits};
use crate::names::{EntityName, declared_name};
use crate::types::Action;
use async_trait::async_trait;
use serde_json::json;
use skyline_cloud::keyvalue::{self, KeyValueList};
use skyline_cloud::{QualifiedName, ResourceConfig, ResourceHandler, ResourceState, ResourceStatus};
use std::sync::Arc;

pub const ACTION_RESOURCE: &str = "ibm_openwhisk_action";

/// Declared action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub name: QualifiedName,
    pub exec: ExecConfig,
    pub limits: LimitsConfig,
    pub publish: bool,
    /// Key/value JSON array
    pub annotations: String,
    /// Key/value JSON array
    pub parameters: String,
}

impl ActionSpec {
    pub fn from_config(config: &ResourceConfig) -> Result<Self> {
        Ok(Self {
            name: declared_name(config)?,
            exec: config.require("exec")?,
            limits: config.get_config("limits").unwrap_or_default(),
            publish: config.get_config("publish").unwrap_or(false),
            annotations: keyvalue::normalize(&key_value_field(config, "annotations"))?,
            parameters: keyvalue::normalize(&key_value_field(config, "parameters"))?,
        })
    }

    /// Request body for this action
    pub fn to_action(&self, default_namespace: &str) -> Result<Action> {
        Ok(Action {
            name: self.name.entity().to_string(),
            publish: Some(self.publish),
            exec: Some(expand_exec(&self.exec, default_namespace)?),
            limits: Some(expand_limits(&self.limits)),
            annotations: KeyValueList::parse(&self.annotations)?,
            parameters: KeyValueList::parse(&self.parameters)?,
            ..Default::default()
        })
    }
}

/// Key/value array field, `[]` when unset
pub(crate) fn key_value_field(config: &ResourceConfig, key: &str) -> String {
    config
        .get_config::<String>(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "[]".to_string())
}

/// Whether a key/value array field changed beyond reordering
pub(crate) fn key_value_changed(prior: &ResourceConfig, desired: &ResourceConfig, key: &str) -> bool {
    !keyvalue::equivalent(&key_value_field(prior, key), &key_value_field(desired, key))
}

/// `ibm_openwhisk_action` lifecycle
pub struct ActionHandler {
    api: Arc<dyn WhiskApi>,
}

impl ActionHandler {
    pub fn new(api: Arc<dyn WhiskApi>) -> Self {
        Self { api }
    }

    pub async fn read_action(&self, id: &str) -> Result<ResourceState> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let action: Action =
            fetch(self.api.as_ref(), Collection::Actions, &target.namespace, &target.path).await?;
        action_state(id, &action)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        self.api
            .delete(Collection::Actions, &target.namespace, &target.path)
            .await?;
        tracing::info!(action = %target.qualified(), "Deleted action");
        Ok(())
    }
}

fn action_state(id: &str, action: &Action) -> Result<ResourceState> {
    // The API reports packaged actions in namespace `ns/pkg`.
    let (namespace, package) = action
        .namespace
        .split_once('/')
        .unwrap_or((action.namespace.as_str(), ""));

    let mut state = ResourceState::new(id, ACTION_RESOURCE)
        .with_status(ResourceStatus::Active)
        .with_attribute("name", json!(action.name))
        .with_attribute("namespace", json!(namespace))
        .with_attribute("package", json!(package))
        .with_attribute("publish", json!(action.publish.unwrap_or(false)))
        .with_attribute("version", json!(action.version))
        .with_attribute("annotations", json!(action.annotations.to_json()?))
        .with_attribute("parameters", json!(action.parameters.to_json()?));

    if let Some(exec) = &action.exec {
        state.set_attribute("exec", serde_json::to_value(flatten_exec(exec))?);
    }
    if let Some(limits) = &action.limits {
        state.set_attribute("limits", serde_json::to_value(flatten_limits(limits))?);
    }
    Ok(state)
}

#[async_trait]
impl ResourceHandler for ActionHandler {
    fn resource_type(&self) -> &str {
        ACTION_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let spec = ActionSpec::from_config(desired)?;
        let default_namespace = self.api.default_namespace();
        let target = EntityName::from_qualified(&spec.name, default_namespace);
        let payload = spec.to_action(default_namespace)?;

        tracing::info!(action = %target.qualified(), kind = %spec.exec.kind, "Creating action");
        store(
            self.api.as_ref(),
            Collection::Actions,
            &target.namespace,
            &target.path,
            &payload,
            false,
        )
        .await?;

        Ok(self.read_action(&target.id(default_namespace)).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_action(id).await?)
    }

    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> skyline_cloud::Result<ResourceState> {
        let changed = ["publish", "exec", "limits"]
            .iter()
            .any(|key| desired.has_change(prior, key))
            || key_value_changed(prior, desired, "annotations")
            || key_value_changed(prior, desired, "parameters");

        if changed {
            let spec = ActionSpec::from_config(desired)?;
            let target = EntityName::from_id(id, self.api.default_namespace())?;
            let mut payload = spec.to_action(self.api.default_namespace())?;
            payload.name = target.entity().to_string();

            tracing::info!(action = %target.qualified(), "Updating action");
            store(
                self.api.as_ref(),
                Collection::Actions,
                &target.namespace,
                &target.path,
                &payload,
                true,
            )
            .await?;
        }

        Ok(self.read_action(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        Ok(self.remove(id).await?)
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let found = probe(self.api.as_ref(), Collection::Actions, &target.namespace, &target.path)
            .await?;
        Ok(found
            .and_then(|v| v.get("name").and_then(|n| n.as_str()).map(str::to_string))
            .is_some_and(|name| name == target.entity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWhisk;
    use skyline_cloud::CloudError;

    const NS: &str = "org_dev";

    fn handler() -> (ActionHandler, Arc<FakeWhisk>) {
        let fake = Arc::new(FakeWhisk::new(NS));
        (ActionHandler::new(fake.clone()), fake)
    }

    fn hello(extra: serde_json::Value) -> ResourceConfig {
        let mut config = json!({
            "name": "hello",
            "exec": {"kind": "nodejs:6", "code": "function main(p) { return p; }"}
        });
        if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        ResourceConfig::new(ACTION_RESOURCE, "hello", config)
    }

    #[tokio::test]
    async fn test_create_with_defaults() {
        let (handler, fake) = handler();
        let state = handler.create(&hello(json!({}))).await.unwrap();

        assert_eq!(state.id, "hello");
        assert_eq!(state.get_attribute::<String>("version").as_deref(), Some("0.0.1"));
        assert_eq!(state.get_attribute::<bool>("publish"), Some(false));
        assert_eq!(state.get_attribute::<String>("annotations").as_deref(), Some("[]"));
        assert_eq!(
            state.get_attribute::<serde_json::Value>("limits"),
            Some(json!({"timeout": 60000, "memory": 256, "log_size": 10}))
        );

        let stored = fake.entity(Collection::Actions, NS, "hello").unwrap();
        assert_eq!(stored["limits"]["logs"], json!(10));
        assert_eq!(stored["exec"]["kind"], json!("nodejs:6"));
        assert!(!fake.puts()[0].3);
    }

    #[tokio::test]
    async fn test_create_in_package_uses_package_path() {
        let (handler, fake) = handler();
        let config = hello(json!({"name": "/org_dev/utils/hello", "parameters": r#"[{"key":"greeting","value":"hi"}]"#}));
        let state = handler.create(&config).await.unwrap();

        assert_eq!(state.id, "utils/hello");
        assert_eq!(state.get_attribute::<String>("package").as_deref(), Some("utils"));
        assert_eq!(state.get_attribute::<String>("namespace").as_deref(), Some(NS));
        assert!(fake.entity(Collection::Actions, NS, "utils/hello").is_some());
    }

    #[tokio::test]
    async fn test_create_with_package_field_uses_default_namespace() {
        let (handler, fake) = handler();
        let state = handler
            .create(&hello(json!({"name": "hello", "package": "utils"})))
            .await
            .unwrap();

        assert_eq!(state.id, "utils/hello");
        assert_eq!(state.get_attribute::<String>("namespace").as_deref(), Some(NS));
        assert!(fake.entity(Collection::Actions, NS, "utils/hello").is_some());
    }

    #[tokio::test]
    async fn test_create_in_other_namespace_gets_qualified_id() {
        let (handler, _fake) = handler();
        let state = handler
            .create(&hello(json!({"name": "/shared/hello"})))
            .await
            .unwrap();

        assert_eq!(state.id, "/shared/hello");
        assert!(handler.exists("/shared/hello").await.unwrap());
        assert!(!handler.exists("hello").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_name_and_json() {
        let (handler, fake) = handler();

        let err = handler
            .create(&hello(json!({"name": "a/b/c/d"})))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::MalformedIdentifier { .. }));

        let err = handler
            .create(&hello(json!({"annotations": "[{"})))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Json(_)));
        assert!(fake.puts().is_empty());
    }

    #[test]
    fn test_declared_key_value_fields_are_compacted() {
        let config = hello(json!({"parameters": "[ {\"key\": \"greeting\",\n \"value\": \"hi\"} ]"}));
        let spec = ActionSpec::from_config(&config).unwrap();

        assert_eq!(spec.parameters, r#"[{"key":"greeting","value":"hi"}]"#);
        assert_eq!(spec.annotations, "[]");
    }

    #[tokio::test]
    async fn test_update_publish_reinserts_with_overwrite() {
        let (handler, fake) = handler();
        let prior = hello(json!({}));
        handler.create(&prior).await.unwrap();

        let desired = hello(json!({"publish": true}));
        let state = handler.update("hello", &prior, &desired).await.unwrap();

        assert_eq!(state.get_attribute::<bool>("publish"), Some(true));
        assert_eq!(state.get_attribute::<String>("version").as_deref(), Some("0.0.2"));
        assert_eq!(fake.puts().last().map(|p| p.3), Some(true));
    }

    #[tokio::test]
    async fn test_reordered_parameters_do_not_update() {
        let (handler, fake) = handler();
        let prior = hello(json!({"parameters": r#"[{"key":"a","value":1},{"key":"b","value":2}]"#}));
        handler.create(&prior).await.unwrap();

        let desired = hello(json!({"parameters": r#"[{"key":"b","value":2},{"key":"a","value":1}]"#}));
        handler.update("hello", &prior, &desired).await.unwrap();

        assert_eq!(fake.puts().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let (handler, _fake) = handler();
        handler.create(&hello(json!({}))).await.unwrap();

        assert!(handler.exists("hello").await.unwrap());
        handler.delete("hello").await.unwrap();
        assert!(!handler.exists("hello").await.unwrap());

        let err = handler.delete("hello").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
