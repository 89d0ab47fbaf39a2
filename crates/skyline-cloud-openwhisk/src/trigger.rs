//! Trigger handler
//!
//! A trigger may be fed by a feed action. The feed is recorded as the `feed`
//! annotation and is invoked with `lifecycleEvent` `CREATE` after the trigger
//! is stored and `DELETE` before it is removed.

use crate::action::{key_value_changed, key_value_field};
use crate::client::{Collection, WhiskApi, fetch, probe, store};
use crate::error::{Result, WhiskError};
use crate::names::{EntityName, canonical, declared_top_level_name};
use crate::types::{FEED_ANNOTATION, Trigger, user_defined};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use skyline_cloud::keyvalue::{self, KeyValueList};
use skyline_cloud::{QualifiedName, ResourceConfig, ResourceHandler, ResourceState, ResourceStatus};
use std::sync::Arc;

pub const TRIGGER_RESOURCE: &str = "ibm_openwhisk_trigger";

/// Declared feed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    /// Key/value JSON array passed to the feed action
    #[serde(default)]
    pub parameters: String,
}

/// `feed` is accepted as a block or a one-element list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedField {
    Block(FeedConfig),
    List(Vec<FeedConfig>),
}

fn declared_feed(config: &ResourceConfig) -> Result<Option<FeedConfig>> {
    match config.get_config::<FeedField>("feed") {
        None => Ok(None),
        Some(FeedField::Block(feed)) => Ok(Some(feed)),
        Some(FeedField::List(mut feeds)) => match feeds.len() {
            0 => Ok(None),
            1 => Ok(feeds.pop()),
            n => Err(WhiskError::InvalidConfig(format!(
                "a trigger takes at most one feed, found {}",
                n
            ))),
        },
    }
}

/// Declared trigger
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub name: QualifiedName,
    pub feed: Option<FeedConfig>,
    pub publish: bool,
    pub annotations: String,
    pub parameters: String,
}

impl TriggerSpec {
    pub fn from_config(config: &ResourceConfig) -> Result<Self> {
        let spec = Self {
            name: declared_top_level_name(config, "trigger")?,
            feed: declared_feed(config)?,
            publish: config.get_config("publish").unwrap_or(false),
            annotations: keyvalue::normalize(&key_value_field(config, "user_defined_annotations"))?,
            parameters: keyvalue::normalize(&key_value_field(config, "user_defined_parameters"))?,
        };
        if let Some(feed) = &spec.feed {
            keyvalue::validate(&key_or_empty(&feed.parameters))?;
        }
        Ok(spec)
    }

    /// Request body; `feed` is the canonical feed action name
    pub fn to_trigger(&self, feed: Option<&str>) -> Result<Trigger> {
        let mut annotations = KeyValueList::parse(&self.annotations)?;
        if let Some(feed) = feed {
            annotations.push(FEED_ANNOTATION, json!(feed));
        }
        Ok(Trigger {
            name: self.name.entity().to_string(),
            publish: Some(self.publish),
            annotations,
            parameters: KeyValueList::parse(&self.parameters)?,
            ..Default::default()
        })
    }
}

fn key_or_empty(json: &str) -> String {
    if json.trim().is_empty() {
        "[]".to_string()
    } else {
        json.to_string()
    }
}

/// `ibm_openwhisk_trigger` lifecycle
pub struct TriggerHandler {
    api: Arc<dyn WhiskApi>,
}

impl TriggerHandler {
    pub fn new(api: Arc<dyn WhiskApi>) -> Self {
        Self { api }
    }

    /// Run the feed action for one lifecycle event
    async fn invoke_feed(
        &self,
        feed: &str,
        trigger: &EntityName,
        event: &str,
        parameters: &str,
    ) -> Result<()> {
        let feed_name = QualifiedName::parse(feed)?;
        let action = EntityName::from_qualified(&feed_name, self.api.default_namespace());

        let mut params = KeyValueList::parse(parameters)?.to_map();
        params.insert("lifecycleEvent".to_string(), json!(event));
        params.insert("triggerName".to_string(), json!(trigger.qualified()));
        params.insert("authKey".to_string(), json!(self.api.auth_key()));

        tracing::debug!(feed, event, trigger = %trigger.qualified(), "Invoking feed action");
        self.api
            .invoke(&action.namespace, &action.path, &serde_json::to_value(params)?)
            .await
            .map(|_| ())
            .map_err(|e| WhiskError::FeedFailed {
                feed: feed.to_string(),
                message: e.to_string(),
            })
    }

    pub async fn read_trigger(&self, id: &str) -> Result<ResourceState> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let trigger: Trigger =
            fetch(self.api.as_ref(), Collection::Triggers, &target.namespace, &target.path).await?;
        trigger_state(id, &trigger)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let trigger: Trigger =
            fetch(self.api.as_ref(), Collection::Triggers, &target.namespace, &target.path).await?;

        if let Some(feed) = trigger.feed() {
            self.invoke_feed(&feed, &target, "DELETE", "[]").await?;
        }

        self.api
            .delete(Collection::Triggers, &target.namespace, &target.path)
            .await?;
        tracing::info!(trigger = %target.qualified(), "Deleted trigger");
        Ok(())
    }
}

fn trigger_state(id: &str, trigger: &Trigger) -> Result<ResourceState> {
    let annotations = user_defined(&trigger.annotations, FEED_ANNOTATION);

    let mut state = ResourceState::new(id, TRIGGER_RESOURCE)
        .with_status(ResourceStatus::Active)
        .with_attribute("name", json!(trigger.name))
        .with_attribute("namespace", json!(trigger.namespace))
        .with_attribute("publish", json!(trigger.publish.unwrap_or(false)))
        .with_attribute("version", json!(trigger.version))
        .with_attribute("user_defined_annotations", json!(annotations.to_json()?))
        .with_attribute("user_defined_parameters", json!(trigger.parameters.to_json()?))
        .with_attribute("annotations", json!(trigger.annotations.to_json()?))
        .with_attribute("parameters", json!(trigger.parameters.to_json()?));

    if let Some(feed) = trigger.feed() {
        state.set_attribute("feed", json!({ "name": feed }));
    }
    Ok(state)
}

#[async_trait]
impl ResourceHandler for TriggerHandler {
    fn resource_type(&self) -> &str {
        TRIGGER_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let spec = TriggerSpec::from_config(desired)?;
        let default_namespace = self.api.default_namespace();
        let target = EntityName::from_qualified(&spec.name, default_namespace);
        let feed = match &spec.feed {
            Some(feed) => Some(canonical(&feed.name, default_namespace)?),
            None => None,
        };
        let payload = spec.to_trigger(feed.as_deref())?;

        tracing::info!(trigger = %target.qualified(), feed = ?feed, "Creating trigger");
        store(
            self.api.as_ref(),
            Collection::Triggers,
            &target.namespace,
            &target.path,
            &payload,
            false,
        )
        .await?;

        if let (Some(feed), Some(declared)) = (&feed, &spec.feed) {
            let parameters = key_or_empty(&declared.parameters);
            if let Err(e) = self.invoke_feed(feed, &target, "CREATE", &parameters).await {
                if let Err(cleanup) = self
                    .api
                    .delete(Collection::Triggers, &target.namespace, &target.path)
                    .await
                {
                    tracing::warn!(
                        trigger = %target.qualified(),
                        "Failed to remove trigger after feed error: {}",
                        cleanup
                    );
                }
                return Err(e.into());
            }
        }

        Ok(self.read_trigger(&target.id(default_namespace)).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_trigger(id).await?)
    }

    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> skyline_cloud::Result<ResourceState> {
        if declared_feed(prior)? != declared_feed(desired)? {
            return Err(WhiskError::InvalidConfig(
                "the feed of an existing trigger cannot be changed".to_string(),
            )
            .into());
        }

        let changed = desired.has_change(prior, "publish")
            || key_value_changed(prior, desired, "user_defined_annotations")
            || key_value_changed(prior, desired, "user_defined_parameters");

        if changed {
            let spec = TriggerSpec::from_config(desired)?;
            let target = EntityName::from_id(id, self.api.default_namespace())?;
            let current: Trigger = fetch(
                self.api.as_ref(),
                Collection::Triggers,
                &target.namespace,
                &target.path,
            )
            .await?;
            let feed = current.feed();
            let mut payload = spec.to_trigger(feed.as_deref())?;
            payload.name = target.entity().to_string();

            tracing::info!(trigger = %target.qualified(), "Updating trigger");
            store(
                self.api.as_ref(),
                Collection::Triggers,
                &target.namespace,
                &target.path,
                &payload,
                true,
            )
            .await?;
        }

        Ok(self.read_trigger(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        Ok(self.remove(id).await?)
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let found = probe(self.api.as_ref(), Collection::Triggers, &target.namespace, &target.path)
            .await?;
        Ok(found
            .as_ref()
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| name == target.entity()))
    }
}
