//! Resource handler trait definitions

use crate::error::{CloudError, Result};
use crate::state::ResourceState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handler for one declared resource type
///
/// Every managed resource (firewall, VLAN, action, rule, ...) implements this
/// trait so callers can drive its lifecycle without knowing which remote API
/// sits behind it.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Returns the declared resource type (e.g., "ibm_firewall")
    fn resource_type(&self) -> &str;

    /// Create the resource and return its materialized state
    async fn create(&self, desired: &ResourceConfig) -> Result<ResourceState>;

    /// Read the current remote state of a resource
    async fn read(&self, id: &str) -> Result<ResourceState>;

    /// Apply the fields that changed between `prior` and `desired`
    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> Result<ResourceState>;

    /// Delete the resource
    async fn delete(&self, id: &str) -> Result<()>;

    /// Check whether the resource still exists remotely
    async fn exists(&self, id: &str) -> Result<bool>;
}

/// Read-only lookup of an existing remote object
#[async_trait]
pub trait DataSource: Send + Sync {
    fn resource_type(&self) -> &str;

    async fn read(&self, query: &ResourceConfig) -> Result<ResourceState>;
}

/// Declared configuration for a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "ibm_network_vlan")
    pub resource_type: String,

    /// Local resource label
    pub id: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            config,
        }
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a required configuration value
    pub fn require<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_config(key).ok_or_else(|| {
            CloudError::InvalidConfig(format!("{}: '{}' is required", self.key(), key))
        })
    }

    /// Get a string value, treating a missing field as empty
    pub fn get_str(&self, key: &str) -> String {
        self.get_config::<String>(key).unwrap_or_default()
    }

    /// Whether `key` differs between `prior` and this configuration
    pub fn has_change(&self, prior: &ResourceConfig, key: &str) -> bool {
        self.config.get(key) != prior.config.get(key)
    }

    /// Declared tags, sorted and de-duplicated
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.get_config("tags").unwrap_or_default();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Retry configuration for transient remote failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after the given zero-based attempt failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}
