//! Network VLAN handler

use crate::client::SoftLayerApi;
use crate::datatypes::{NetworkVlan, OrderContainer, join_tags, tag_names};
use crate::error::{Result, SoftLayerError};
use crate::order::{VLAN_POLL, find_vlan_by_order_id};
use crate::parse_id;
use crate::product::{
    ADDITIONAL_SERVICES_PACKAGE_TYPE, NETWORK_VLAN_PACKAGE_TYPE, containing_price, exact_price,
    subnet_key_name, vlan_key_name,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use skyline_cloud::{OrderPoller, ResourceConfig, ResourceHandler, ResourceState, ResourceStatus};
use std::sync::Arc;

pub const VLAN_RESOURCE: &str = "ibm_network_vlan";

const VLAN_MASK: &str = "id,name,primaryRouter[datacenter[name]],primaryRouter[hostname],vlanNumber,\
billingItem[recurringFee],guestNetworkComponentCount,subnets[networkIdentifier,cidr,subnetType],\
tagReferences[id,tag[name]]";

/// Declared VLAN configuration
#[derive(Debug, Clone, PartialEq)]
pub struct VlanSpec {
    pub datacenter: String,
    pub vlan_type: String,
    pub subnet_size: u32,
    pub name: String,
    pub router_hostname: String,
    pub tags: Vec<String>,
}

impl VlanSpec {
    pub fn from_config(config: &ResourceConfig) -> skyline_cloud::Result<Self> {
        let spec = Self {
            datacenter: config.require("datacenter")?,
            vlan_type: config.require("type")?,
            subnet_size: config.require("subnet_size")?,
            name: config.get_str("name"),
            router_hostname: config.get_str("router_hostname"),
            tags: config.tags(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vlan_type != "PRIVATE" && self.vlan_type != "PUBLIC" {
            return Err(SoftLayerError::InvalidConfig(
                "vlan type should be either 'PRIVATE' or 'PUBLIC'".to_string(),
            ));
        }
        let router = self.router_hostname.as_str();
        if (self.vlan_type == "PRIVATE" && router.contains("fcr"))
            || (self.vlan_type == "PUBLIC" && router.contains("bcr"))
        {
            return Err(SoftLayerError::InvalidConfig(format!(
                "mismatch between vlan_type '{}' and router_hostname '{}'",
                self.vlan_type, router
            )));
        }
        Ok(())
    }
}

/// Subnet entry as reported in state
#[derive(Debug, Clone, PartialEq, Serialize)]
struct SubnetEntry {
    subnet: String,
    subnet_type: String,
}

/// `ibm_network_vlan` lifecycle
pub struct VlanHandler {
    api: Arc<dyn SoftLayerApi>,
    poller: OrderPoller,
}

impl VlanHandler {
    pub fn new(api: Arc<dyn SoftLayerApi>) -> Self {
        Self {
            api,
            poller: OrderPoller::new(VLAN_POLL),
        }
    }

    pub fn with_poller(mut self, poller: OrderPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Build the order container against one catalog package
    pub async fn build_order(&self, spec: &VlanSpec, package_type: &str) -> Result<OrderContainer> {
        if spec.datacenter.is_empty() {
            return Err(SoftLayerError::InvalidConfig("datacenter name is empty.".to_string()));
        }

        let datacenter = self.api.get_datacenter_by_name(&spec.datacenter).await?;
        let location_id = datacenter
            .id
            .ok_or_else(|| SoftLayerError::DatacenterNotFound(spec.datacenter.clone()))?;

        let package = self.api.get_package_by_type(package_type).await?;
        let package_id = package.id.ok_or_else(|| {
            SoftLayerError::UnexpectedResponse(format!("{} package without id", package_type))
        })?;
        let items = self.api.get_package_items(package_id).await?;

        let vlan_price = exact_price(&items, &vlan_key_name(&spec.vlan_type))?;
        let subnet_price = containing_price(&items, &subnet_key_name(spec.subnet_size))?;

        let mut order =
            OrderContainer::network_vlan(package_id, location_id, vec![vlan_price, subnet_price]);

        if !spec.router_hostname.is_empty() {
            let router = self.api.get_router_by_hostname(&spec.router_hostname).await?;
            order.router_id = Some(
                router
                    .id
                    .ok_or_else(|| SoftLayerError::RouterNotFound(spec.router_hostname.clone()))?,
            );
        }

        Ok(order)
    }

    /// Order the VLAN and wait for it; returns the VLAN id
    pub async fn order(&self, spec: &VlanSpec) -> Result<i64> {
        let order = match self.build_order(spec, NETWORK_VLAN_PACKAGE_TYPE).await {
            Ok(order) => order,
            Err(e) => {
                tracing::debug!(error = %e, "Falling back to {}", ADDITIONAL_SERVICES_PACKAGE_TYPE);
                self.build_order(spec, ADDITIONAL_SERVICES_PACKAGE_TYPE).await?
            }
        };

        tracing::info!(datacenter = %spec.datacenter, vlan_type = %spec.vlan_type, "Creating VLAN");
        let receipt = self.api.place_order(&order).await?;
        let order_id = receipt.require_order_id()?;

        let vlan = find_vlan_by_order_id(self.api.as_ref(), &self.poller, order_id).await?;
        let id = vlan.require_id()?;
        tracing::info!(vlan_id = id, order_id, "VLAN provisioned");
        Ok(id)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<()> {
        self.api.edit_vlan_name(id, name).await?;
        Ok(())
    }

    pub async fn set_tags(&self, id: i64, tags: &[String]) -> Result<()> {
        match self.api.set_vlan_tags(id, &join_tags(tags)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SoftLayerError::TagsFailed { kind: "vlan", id }),
            Err(e) => {
                tracing::warn!(vlan_id = id, error = %e, "setTags failed");
                Err(SoftLayerError::TagsFailed { kind: "vlan", id })
            }
        }
    }

    pub async fn read_vlan(&self, id: i64) -> Result<ResourceState> {
        let vlan = self.api.get_vlan(id, VLAN_MASK).await?;
        vlan_state(&vlan)
    }

    /// Cancel the billing item; SoftLayer-managed VLANs have none and are left alone
    pub async fn cancel(&self, id: i64) -> Result<()> {
        let Some(billing_item) = self.api.get_vlan_billing_item(id).await?.and_then(|b| b.id)
        else {
            tracing::info!(vlan_id = id, "VLAN is managed by SoftLayer, nothing to cancel");
            return Ok(());
        };

        if !self.api.cancel_billing_item(billing_item).await? {
            tracing::warn!(vlan_id = id, billing_item, "Cancellation reported unsuccessful");
        }
        tracing::info!(vlan_id = id, billing_item, "VLAN cancelled");
        Ok(())
    }
}

/// Router hostnames starting with `fcr` are frontend (public) routers
fn vlan_type_for_router(hostname: &str) -> &'static str {
    if hostname.starts_with("fcr") {
        "PUBLIC"
    } else {
        "PRIVATE"
    }
}

fn vlan_state(vlan: &NetworkVlan) -> Result<ResourceState> {
    let id = vlan.require_id()?;
    let mut state = ResourceState::new(id.to_string(), VLAN_RESOURCE)
        .with_status(ResourceStatus::Active)
        .with_attribute("vlan_number", json!(vlan.vlan_number))
        .with_attribute(
            "child_resource_count",
            json!(vlan.guest_network_component_count),
        )
        .with_attribute("name", json!(vlan.name.clone().unwrap_or_default()))
        .with_attribute("softlayer_managed", json!(vlan.billing_item.is_none()))
        .with_attribute("tags", json!(tag_names(&vlan.tag_references)));

    if let Some(router) = &vlan.primary_router {
        let hostname = router.hostname.clone().unwrap_or_default();
        state.set_attribute("type", json!(vlan_type_for_router(&hostname)));
        state.set_attribute("router_hostname", json!(hostname));
        if let Some(name) = router.datacenter.as_ref().and_then(|dc| dc.name.clone()) {
            state.set_attribute("datacenter", json!(name));
        }
    }

    let subnets: Vec<SubnetEntry> = vlan
        .subnets
        .iter()
        .map(|s| SubnetEntry {
            subnet: format!(
                "{}/{}",
                s.network_identifier.as_deref().unwrap_or_default(),
                s.cidr.unwrap_or_default()
            ),
            subnet_type: s.subnet_type.clone().unwrap_or_default(),
        })
        .collect();
    state.set_attribute("subnets", serde_json::to_value(&subnets)?);

    let subnet_size = vlan
        .subnets
        .first()
        .and_then(|s| s.cidr)
        .filter(|cidr| *cidr <= 32)
        .map(|cidr| 1u64 << (32 - cidr))
        .unwrap_or(0);
    state.set_attribute("subnet_size", json!(subnet_size));

    Ok(state)
}

#[async_trait]
impl ResourceHandler for VlanHandler {
    fn resource_type(&self) -> &str {
        VLAN_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let spec = VlanSpec::from_config(desired)?;
        let id = self.order(&spec).await?;

        if !spec.name.is_empty() {
            self.rename(id, &spec.name).await?;
        }
        if !spec.tags.is_empty() {
            self.set_tags(id, &spec.tags).await?;
        }
        Ok(self.read_vlan(id).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_vlan(parse_id(id)?).await?)
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
        if desired.has_change(prior, "name") {
            self.rename(id, &desired.get_str("name")).await?;
        }
        Ok(self.read_vlan(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        Ok(self.cancel(parse_id(id)?).await?)
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let id = parse_id(id)?;
        match self.api.get_vlan(id, "id").await {
            Ok(vlan) => Ok(vlan.id == Some(id)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
