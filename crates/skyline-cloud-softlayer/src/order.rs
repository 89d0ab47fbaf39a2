//! Order completion lookups
//!
//! A placed order materializes asynchronously: the account gains a VLAN whose
//! billing item points back at the order. These helpers poll the account for
//! that VLAN with per-resource timing.

use crate::client::SoftLayerApi;
use crate::datatypes::NetworkVlan;
use crate::error::{Result, SoftLayerError};
use crate::filter::ObjectFilter;
use skyline_cloud::poller::DEFAULT_MAX_INTERVAL;
use skyline_cloud::{OrderFilter, OrderPoller, PollConfig};
use std::time::Duration;

/// Dedicated firewalls take long to provision
pub const FIREWALL_POLL: PollConfig = PollConfig {
    timeout: Duration::from_secs(45 * 60),
    initial_delay: Duration::from_secs(10),
    min_interval: Duration::from_secs(10),
    max_interval: DEFAULT_MAX_INTERVAL,
};

pub const VLAN_POLL: PollConfig = PollConfig {
    timeout: Duration::from_secs(10 * 60),
    initial_delay: Duration::from_secs(5),
    min_interval: Duration::from_secs(3),
    max_interval: DEFAULT_MAX_INTERVAL,
};

pub const FIREWALL_ORDER_PATH: &str = "networkVlans.networkVlanFirewall.billingItem.orderItem.order.id";
pub const VLAN_ORDER_PATH: &str = "networkVlans.billingItem.orderItem.order.id";

const FIREWALL_VLAN_MASK: &str = "firewallNetworkComponents,networkVlanFirewall.billingItem.orderItem.order.id,dedicatedFirewallFlag,firewallGuestNetworkComponents,firewallInterfaces,firewallRules,highAvailabilityFirewallFlag";
const VLAN_MASK: &str = "id";

/// Wait for the VLAN that hosts the dedicated firewall of `order_id`
pub async fn find_dedicated_firewall_by_order_id(
    api: &dyn SoftLayerApi,
    poller: &OrderPoller,
    order_id: u64,
) -> Result<NetworkVlan> {
    find_by_order_id(
        api,
        poller,
        "dedicated firewall",
        FIREWALL_ORDER_PATH,
        FIREWALL_VLAN_MASK,
        order_id,
    )
    .await
}

/// Wait for the VLAN created by `order_id`
pub async fn find_vlan_by_order_id(
    api: &dyn SoftLayerApi,
    poller: &OrderPoller,
    order_id: u64,
) -> Result<NetworkVlan> {
    find_by_order_id(api, poller, "VLAN", VLAN_ORDER_PATH, VLAN_MASK, order_id).await
}

async fn find_by_order_id(
    api: &dyn SoftLayerApi,
    poller: &OrderPoller,
    kind: &'static str,
    path: &str,
    mask: &'static str,
    order_id: u64,
) -> Result<NetworkVlan> {
    let filter = OrderFilter::new(path, order_id)?;
    poller
        .wait_for(&filter, |f| {
            let object_filter = ObjectFilter::eq(&f.path, f.order_id);
            async move { api.get_network_vlans(&object_filter, mask).await }
        })
        .await
        .map_err(|e| SoftLayerError::from_poll(kind, e))
}
