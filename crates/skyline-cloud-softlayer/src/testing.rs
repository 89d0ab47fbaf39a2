//! In-memory SoftLayer account used by the handler tests

use crate::client::SoftLayerApi;
use crate::datatypes::{
    BillingItem, Firewall, Hardware, ItemPrice, Location, NetworkVlan, OrderContainer,
    OrderReceipt, ProductItem, ProductPackage, Tag, TagReference,
};
use crate::error::{Result, SoftLayerError};
use crate::filter::ObjectFilter;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Account {
    listings: VecDeque<Vec<NetworkVlan>>,
    listing_failure: Option<u16>,
    vlan_filters: Vec<String>,
    packages: HashMap<String, i64>,
    items: HashMap<i64, Vec<ProductItem>>,
    orders: Vec<OrderContainer>,
    datacenters: HashMap<String, i64>,
    routers: HashMap<String, i64>,
    vlans: HashMap<i64, NetworkVlan>,
    firewalls: HashMap<i64, Firewall>,
    vlan_billing: HashMap<i64, i64>,
    firewall_billing: HashMap<i64, i64>,
    vlan_tags: HashMap<i64, String>,
    firewall_tags: HashMap<i64, String>,
    renamed: Vec<(i64, String)>,
    cancelled: Vec<i64>,
    cancel_fails: bool,
}

pub struct FakeSoftLayer {
    account: Mutex<Account>,
}

fn not_found(what: &str) -> SoftLayerError {
    SoftLayerError::Api {
        status: 404,
        code: "SoftLayer_Exception_ObjectNotFound".to_string(),
        message: format!("Unable to find object {}", what),
    }
}

fn tag_references(tags: &str) -> Vec<TagReference> {
    tags.split(',')
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(i, name)| TagReference {
            id: Some(i as i64 + 1),
            tag: Some(Tag {
                name: Some(name.to_string()),
            }),
        })
        .collect()
}

impl FakeSoftLayer {
    pub fn new() -> Self {
        Self {
            account: Mutex::new(Account::default()),
        }
    }

    fn account(&self) -> MutexGuard<'_, Account> {
        self.account.lock().unwrap()
    }

    pub fn vlan(&self, id: i64) -> NetworkVlan {
        NetworkVlan {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Results for successive `getNetworkVlans` calls; empty once drained
    pub fn queue_vlan_listings(&self, listings: Vec<Vec<NetworkVlan>>) {
        self.account().listings.extend(listings);
    }

    pub fn fail_vlan_listing(&self, status: u16) {
        self.account().listing_failure = Some(status);
    }

    pub fn vlan_filters(&self) -> Vec<String> {
        self.account().vlan_filters.clone()
    }

    pub fn add_package(&self, package_type: &str, id: i64) {
        self.account().packages.insert(package_type.to_string(), id);
    }

    pub fn add_item(&self, package_id: i64, key_name: &str, price_id: i64) {
        self.account()
            .items
            .entry(package_id)
            .or_default()
            .push(ProductItem {
                id: None,
                key_name: Some(key_name.to_string()),
                prices: vec![ItemPrice { id: price_id }],
            });
    }

    pub fn add_datacenter(&self, name: &str, id: i64) {
        self.account().datacenters.insert(name.to_string(), id);
    }

    pub fn add_router(&self, hostname: &str, id: i64) {
        self.account().routers.insert(hostname.to_string(), id);
    }

    pub fn insert_vlan(&self, vlan: NetworkVlan) {
        if let Some(id) = vlan.id {
            self.account().vlans.insert(id, vlan);
        }
    }

    pub fn insert_firewall(&self, firewall: Firewall) {
        if let Some(id) = firewall.id {
            self.account().firewalls.insert(id, firewall);
        }
    }

    pub fn set_vlan_billing_item(&self, vlan_id: i64, billing_item: i64) {
        self.account().vlan_billing.insert(vlan_id, billing_item);
    }

    pub fn set_firewall_billing_item(&self, firewall_id: i64, billing_item: i64) {
        self.account()
            .firewall_billing
            .insert(firewall_id, billing_item);
    }

    pub fn set_cancel_result(&self, success: bool) {
        self.account().cancel_fails = !success;
    }

    pub fn orders(&self) -> Vec<OrderContainer> {
        self.account().orders.clone()
    }

    pub fn renamed(&self) -> Vec<(i64, String)> {
        self.account().renamed.clone()
    }

    pub fn cancelled(&self) -> Vec<i64> {
        self.account().cancelled.clone()
    }

    pub fn vlan_tags(&self, id: i64) -> Option<String> {
        self.account().vlan_tags.get(&id).cloned()
    }

    pub fn firewall_tags(&self, id: i64) -> Option<String> {
        self.account().firewall_tags.get(&id).cloned()
    }
}

#[async_trait]
impl SoftLayerApi for FakeSoftLayer {
    async fn get_network_vlans(
        &self,
        filter: &ObjectFilter,
        _mask: &str,
    ) -> Result<Vec<NetworkVlan>> {
        let mut account = self.account();
        account.vlan_filters.push(filter.to_string());
        if let Some(status) = account.listing_failure {
            return Err(SoftLayerError::Api {
                status,
                code: String::new(),
                message: "listing failed".to_string(),
            });
        }
        Ok(account.listings.pop_front().unwrap_or_default())
    }

    async fn get_package_by_type(&self, package_type: &str) -> Result<ProductPackage> {
        let id = self.account().packages.get(package_type).copied();
        id.map(|id| ProductPackage {
            id: Some(id),
            key_name: Some(package_type.to_string()),
            name: None,
        })
        .ok_or_else(|| SoftLayerError::PackageNotFound(package_type.to_string()))
    }

    async fn get_package_items(&self, package_id: i64) -> Result<Vec<ProductItem>> {
        Ok(self
            .account()
            .items
            .get(&package_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn place_order(&self, order: &OrderContainer) -> Result<OrderReceipt> {
        let mut account = self.account();
        account.orders.push(order.clone());
        Ok(OrderReceipt {
            order_id: Some(9000 + account.orders.len() as i64),
        })
    }

    async fn get_datacenter_by_name(&self, name: &str) -> Result<Location> {
        let id = self.account().datacenters.get(name).copied();
        id.map(|id| Location {
            id: Some(id),
            name: Some(name.to_string()),
        })
        .ok_or_else(|| SoftLayerError::DatacenterNotFound(name.to_string()))
    }

    async fn get_router_by_hostname(&self, hostname: &str) -> Result<Hardware> {
        let id = self.account().routers.get(hostname).copied();
        id.map(|id| Hardware {
            id: Some(id),
            hostname: Some(hostname.to_string()),
            datacenter: None,
        })
        .ok_or_else(|| SoftLayerError::RouterNotFound(hostname.to_string()))
    }

    async fn get_vlan(&self, id: i64, _mask: &str) -> Result<NetworkVlan> {
        self.account()
            .vlans
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(&format!("SoftLayer_Network_Vlan {}", id)))
    }

    async fn edit_vlan_name(&self, id: i64, name: &str) -> Result<bool> {
        let mut account = self.account();
        account.renamed.push((id, name.to_string()));
        if let Some(vlan) = account.vlans.get_mut(&id) {
            vlan.name = Some(name.to_string());
        }
        Ok(true)
    }

    async fn get_vlan_billing_item(&self, id: i64) -> Result<Option<BillingItem>> {
        let item = self.account().vlan_billing.get(&id).copied();
        Ok(item.map(|id| BillingItem { id: Some(id) }))
    }

    async fn set_vlan_tags(&self, id: i64, tags: &str) -> Result<bool> {
        let mut account = self.account();
        account.vlan_tags.insert(id, tags.to_string());
        if let Some(vlan) = account.vlans.get_mut(&id) {
            vlan.tag_references = tag_references(tags);
        }
        Ok(true)
    }

    async fn get_firewall(&self, id: i64, _mask: &str) -> Result<Firewall> {
        self.account()
            .firewalls
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(&format!("SoftLayer_Network_Vlan_Firewall {}", id)))
    }

    async fn get_firewall_billing_item(&self, id: i64) -> Result<Option<BillingItem>> {
        let item = self.account().firewall_billing.get(&id).copied();
        Ok(item.map(|id| BillingItem { id: Some(id) }))
    }

    async fn set_firewall_tags(&self, id: i64, tags: &str) -> Result<bool> {
        let mut account = self.account();
        account.firewall_tags.insert(id, tags.to_string());
        if let Some(fw) = account.firewalls.get_mut(&id) {
            fw.tag_references = tag_references(tags);
        }
        Ok(true)
    }

    async fn cancel_billing_item(&self, id: i64) -> Result<bool> {
        let mut account = self.account();
        account.cancelled.push(id);
        Ok(!account.cancel_fails)
    }
}
