//! SoftLayer provider for Skyline
//!
//! Orders dedicated hardware firewalls and network VLANs through the
//! SoftLayer product ordering API and waits for the orders to complete.
//!
//! # Example
//!
//! ```no_run
//! use skyline_cloud::ResourceHandler;
//! use skyline_cloud_softlayer::{SoftLayerClient, SoftLayerConfig, VlanHandler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SoftLayerClient::new(SoftLayerConfig::new("user", "api-key"))?;
//! let vlans = VlanHandler::new(Arc::new(client));
//! let state = vlans.read("1234").await?;
//! println!("{} is a {} VLAN", state.id, state.attributes["type"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod datatypes;
pub mod error;
pub mod filter;
pub mod firewall;
pub mod order;
pub mod product;
pub mod vlan;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{SOFTLAYER_REST_ENDPOINT, SoftLayerApi, SoftLayerClient, SoftLayerConfig};
pub use error::{Result, SoftLayerError};
pub use filter::{ObjectFilter, object_mask};
pub use firewall::{FIREWALL_RESOURCE, FirewallHandler, FirewallSpec};
pub use order::{FIREWALL_POLL, VLAN_POLL, find_dedicated_firewall_by_order_id, find_vlan_by_order_id};
pub use vlan::{VLAN_RESOURCE, VlanHandler, VlanSpec};

/// Numeric object id from a resource id string
pub(crate) fn parse_id(id: &str) -> Result<i64> {
    id.trim()
        .parse()
        .map_err(|_| SoftLayerError::InvalidId(id.to_string()))
}
