//! Rule handler

use crate::client::{Collection, WhiskApi, fetch, probe, store};
use crate::error::Result;
use crate::names::{EntityName, canonical, declared_top_level_name};
use crate::types::{EntityRef, Rule};
use async_trait::async_trait;
use serde_json::{Value, json};
use skyline_cloud::{ResourceConfig, ResourceHandler, ResourceState, ResourceStatus};
use std::sync::Arc;

pub const RULE_RESOURCE: &str = "ibm_openwhisk_rule";

/// `ibm_openwhisk_rule` lifecycle
pub struct RuleHandler {
    api: Arc<dyn WhiskApi>,
}

impl RuleHandler {
    pub fn new(api: Arc<dyn WhiskApi>) -> Self {
        Self { api }
    }

    /// Rule body with trigger and action bound to the rule's namespace
    fn build_rule(&self, config: &ResourceConfig, target: &EntityName) -> skyline_cloud::Result<Rule> {
        let trigger: String = config.require("trigger_name")?;
        let action: String = config.require("action_name")?;
        Ok(Rule {
            name: target.entity().to_string(),
            namespace: String::new(),
            version: String::new(),
            publish: Some(config.get_config("publish").unwrap_or(false)),
            status: String::new(),
            trigger: EntityRef::Path(canonical(&trigger, &target.namespace)?),
            action: EntityRef::Path(canonical(&action, &target.namespace)?),
        })
    }

    pub async fn read_rule(&self, id: &str) -> Result<ResourceState> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let rule: Rule =
            fetch(self.api.as_ref(), Collection::Rules, &target.namespace, &target.path).await?;
        Ok(rule_state(id, &rule))
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;

        // Active rules cannot be deleted.
        if let Err(e) = self
            .api
            .set_rule_state(&target.namespace, &target.path, "inactive")
            .await
        {
            tracing::warn!(rule = %target.qualified(), "Failed to deactivate rule: {}", e);
        }

        self.api
            .delete(Collection::Rules, &target.namespace, &target.path)
            .await?;
        tracing::info!(rule = %target.qualified(), "Deleted rule");
        Ok(())
    }
}

fn rule_state(id: &str, rule: &Rule) -> ResourceState {
    let status = match rule.status.as_str() {
        "active" => ResourceStatus::Active,
        "inactive" => ResourceStatus::Inactive,
        _ => ResourceStatus::Unknown,
    };

    ResourceState::new(id, RULE_RESOURCE)
        .with_status(status)
        .with_attribute("name", json!(rule.name))
        .with_attribute("namespace", json!(rule.namespace))
        .with_attribute("publish", json!(rule.publish.unwrap_or(false)))
        .with_attribute("version", json!(rule.version))
        .with_attribute("status", json!(rule.status))
        .with_attribute("trigger_name", json!(rule.trigger.name()))
        .with_attribute("action_name", json!(rule.action.qualified()))
}

#[async_trait]
impl ResourceHandler for RuleHandler {
    fn resource_type(&self) -> &str {
        RULE_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let name = declared_top_level_name(desired, "rule")?;
        let default_namespace = self.api.default_namespace();
        let target = EntityName::from_qualified(&name, default_namespace);
        let rule = self.build_rule(desired, &target)?;

        tracing::info!(
            rule = %target.qualified(),
            trigger = %rule.trigger.qualified(),
            action = %rule.action.qualified(),
            "Creating rule"
        );
        store(
            self.api.as_ref(),
            Collection::Rules,
            &target.namespace,
            &target.path,
            &rule,
            false,
        )
        .await?;

        Ok(self.read_rule(&target.id(default_namespace)).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_rule(id).await?)
    }

    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> skyline_cloud::Result<ResourceState> {
        let changed = ["trigger_name", "action_name", "publish"]
            .iter()
            .any(|key| desired.has_change(prior, key));

        if changed {
            let target = EntityName::from_id(id, self.api.default_namespace())?;
            let rule = self.build_rule(desired, &target)?;

            tracing::info!(rule = %target.qualified(), "Updating rule");
            store(
                self.api.as_ref(),
                Collection::Rules,
                &target.namespace,
                &target.path,
                &rule,
                true,
            )
            .await?;
        }

        Ok(self.read_rule(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        Ok(self.remove(id).await?)
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let found = probe(self.api.as_ref(), Collection::Rules, &target.namespace, &target.path)
            .await?;
        Ok(found
            .as_ref()
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| name == target.entity()))
    }
}
