//! Dedicated hardware firewall handler

use crate::client::SoftLayerApi;
use crate::datatypes::{OrderContainer, join_tags, tag_names};
use crate::error::{Result, SoftLayerError};
use crate::order::{FIREWALL_POLL, find_dedicated_firewall_by_order_id};
use crate::parse_id;
use crate::product::{FIREWALL_PACKAGE_TYPE, exact_price, firewall_key_name};
use async_trait::async_trait;
use serde_json::json;
use skyline_cloud::{OrderPoller, ResourceConfig, ResourceHandler, ResourceState, ResourceStatus};
use std::sync::Arc;

pub const FIREWALL_RESOURCE: &str = "ibm_firewall";

const FIREWALL_MASK: &str = "id,networkVlan.highAvailabilityFirewallFlag,tagReferences[id,tag[name]]";

/// Declared firewall configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FirewallSpec {
    pub ha_enabled: bool,
    pub public_vlan_id: i64,
    pub tags: Vec<String>,
}

impl FirewallSpec {
    pub fn from_config(config: &ResourceConfig) -> skyline_cloud::Result<Self> {
        Ok(Self {
            ha_enabled: config.get_config("ha_enabled").unwrap_or(false),
            public_vlan_id: config.require("public_vlan_id")?,
            tags: config.tags(),
        })
    }
}

/// `ibm_firewall` lifecycle
pub struct FirewallHandler {
    api: Arc<dyn SoftLayerApi>,
    poller: OrderPoller,
}

impl FirewallHandler {
    pub fn new(api: Arc<dyn SoftLayerApi>) -> Self {
        Self {
            api,
            poller: OrderPoller::new(FIREWALL_POLL),
        }
    }

    /// Replace the order poller (custom clock or cancellation)
    pub fn with_poller(mut self, poller: OrderPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Order the firewall and wait for it; returns the firewall id
    pub async fn order(&self, spec: &FirewallSpec) -> Result<i64> {
        let key_name = firewall_key_name(spec.ha_enabled);
        let package = self.api.get_package_by_type(FIREWALL_PACKAGE_TYPE).await?;
        let package_id = package.id.ok_or_else(|| {
            SoftLayerError::UnexpectedResponse(format!("{} package without id", FIREWALL_PACKAGE_TYPE))
        })?;
        let items = self.api.get_package_items(package_id).await?;
        let price = exact_price(&items, key_name)?;

        let order = OrderContainer::dedicated_firewall(package_id, price, spec.public_vlan_id);

        tracing::info!(vlan_id = spec.public_vlan_id, key_name, "Creating dedicated hardware firewall");
        let receipt = self.api.place_order(&order).await?;
        let order_id = receipt.require_order_id()?;

        let vlan = find_dedicated_firewall_by_order_id(self.api.as_ref(), &self.poller, order_id).await?;
        let id = vlan
            .network_vlan_firewall
            .as_ref()
            .and_then(|fw| fw.id)
            .ok_or_else(|| {
                SoftLayerError::UnexpectedResponse(format!(
                    "VLAN for order {} has no firewall",
                    order_id
                ))
            })?;

        tracing::info!(firewall_id = id, order_id, "Firewall provisioned");
        Ok(id)
    }

    pub async fn set_tags(&self, id: i64, tags: &[String]) -> Result<()> {
        match self.api.set_firewall_tags(id, &join_tags(tags)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SoftLayerError::TagsFailed { kind: "firewall", id }),
            Err(e) => {
                tracing::warn!(firewall_id = id, error = %e, "setTags failed");
                Err(SoftLayerError::TagsFailed { kind: "firewall", id })
            }
        }
    }

    pub async fn read_firewall(&self, id: i64) -> Result<ResourceState> {
        let fw = self.api.get_firewall(id, FIREWALL_MASK).await?;
        let vlan = fw.network_vlan.as_deref().ok_or_else(|| {
            SoftLayerError::UnexpectedResponse(format!("firewall {} without network VLAN", id))
        })?;

        Ok(ResourceState::new(id.to_string(), FIREWALL_RESOURCE)
            .with_status(ResourceStatus::Active)
            .with_attribute("public_vlan_id", json!(vlan.require_id()?))
            .with_attribute(
                "ha_enabled",
                json!(vlan.high_availability_firewall_flag.unwrap_or(false)),
            )
            .with_attribute("tags", json!(tag_names(&fw.tag_references))))
    }

    pub async fn cancel(&self, id: i64) -> Result<()> {
        let billing_item = self
            .api
            .get_firewall_billing_item(id)
            .await?
            .and_then(|b| b.id)
            .ok_or_else(|| SoftLayerError::BillingItemNotFound(format!("firewall {}", id)))?;

        if !self.api.cancel_billing_item(billing_item).await? {
            return Err(SoftLayerError::CancellationFailed(billing_item));
        }
        tracing::info!(firewall_id = id, billing_item, "Firewall cancelled");
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for FirewallHandler {
    fn resource_type(&self) -> &str {
        FIREWALL_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let spec = FirewallSpec::from_config(desired)?;
        let id = self.order(&spec).await?;
        if !spec.tags.is_empty() {
            self.set_tags(id, &spec.tags).await?;
        }
        Ok(self.read_firewall(id).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_firewall(parse_id(id)?).await?)
    }

    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> skyline_cloud::Result<ResourceState> {
        let id = parse_id(id)?;
        if desired.has_change(prior, "tags") {
            self.set_tags(id, &desired.tags()).await?;
        }
        Ok(self.read_firewall(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        Ok(self.cancel(parse_id(id)?).await?)
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let id = parse_id(id)?;
        match self.api.get_firewall(id, "id").await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
