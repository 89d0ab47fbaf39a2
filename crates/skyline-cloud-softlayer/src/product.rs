//! Product catalog price selection

use crate::datatypes::{ItemPrice, ProductItem};
use crate::error::{Result, SoftLayerError};

pub const FIREWALL_PACKAGE_TYPE: &str = "ADDITIONAL_SERVICES_FIREWALL";
pub const NETWORK_VLAN_PACKAGE_TYPE: &str = "ADDITIONAL_SERVICES_NETWORK_VLAN";
pub const ADDITIONAL_SERVICES_PACKAGE_TYPE: &str = "ADDITIONAL_SERVICES";

/// Catalog key of the firewall product
pub fn firewall_key_name(ha_enabled: bool) -> &'static str {
    if ha_enabled {
        "HARDWARE_FIREWALL_HIGH_AVAILABILITY"
    } else {
        "HARDWARE_FIREWALL_DEDICATED"
    }
}

pub fn vlan_key_name(vlan_type: &str) -> String {
    format!("{}_NETWORK_VLAN", vlan_type)
}

pub fn subnet_key_name(subnet_size: u32) -> String {
    format!("{}_STATIC_PUBLIC_IP_ADDRESSES", subnet_size)
}

/// First price of the first item whose key name is exactly `key_name`
pub fn exact_price(items: &[ProductItem], key_name: &str) -> Result<ItemPrice> {
    first_price(items, key_name, |k| k == key_name)
}

/// First price of the first item whose key name contains `fragment`
pub fn containing_price(items: &[ProductItem], fragment: &str) -> Result<ItemPrice> {
    first_price(items, fragment, |k| k.contains(fragment))
}

fn first_price(
    items: &[ProductItem],
    label: &str,
    matches: impl Fn(&str) -> bool,
) -> Result<ItemPrice> {
    items
        .iter()
        .filter(|item| item.key_name.as_deref().is_some_and(&matches))
        .find_map(|item| item.prices.first().copied())
        .ok_or_else(|| SoftLayerError::ProductNotFound(label.to_string()))
}
