//! SoftLayer API data types
//!
//! Only the properties the handlers read are modelled. SoftLayer omits any
//! property not selected by the object mask, so nearly everything is optional.

use crate::error::{Result, SoftLayerError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkVlan {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub vlan_number: Option<i64>,
    pub primary_router: Option<Hardware>,
    pub billing_item: Option<BillingItem>,
    pub guest_network_component_count: Option<i64>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub tag_references: Vec<TagReference>,
    pub network_vlan_firewall: Option<Firewall>,
    pub high_availability_firewall_flag: Option<bool>,
}

impl NetworkVlan {
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| SoftLayerError::UnexpectedResponse("VLAN without id".to_string()))
    }
}

/// `SoftLayer_Network_Vlan_Firewall`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    pub id: Option<i64>,
    pub network_vlan: Option<Box<NetworkVlan>>,
    #[serde(default)]
    pub tag_references: Vec<TagReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hardware {
    pub id: Option<i64>,
    pub hostname: Option<String>,
    pub datacenter: Option<Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub network_identifier: Option<String>,
    pub cidr: Option<u32>,
    pub subnet_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingItem {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub id: Option<i64>,
    pub tag: Option<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPackage {
    pub id: Option<i64>,
    pub key_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub id: Option<i64>,
    pub key_name: Option<String>,
    #[serde(default)]
    pub prices: Vec<ItemPrice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPrice {
    pub id: i64,
}

/// Product order container sent to `placeOrder`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContainer {
    pub complex_type: String,
    pub package_id: i64,
    pub prices: Vec<ItemPrice>,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<i64>,
}

impl OrderContainer {
    pub fn dedicated_firewall(package_id: i64, price: ItemPrice, vlan_id: i64) -> Self {
        Self {
            complex_type: "SoftLayer_Container_Product_Order_Network_Protection_Firewall_Dedicated"
                .to_string(),
            package_id,
            prices: vec![price],
            quantity: 1,
            location: None,
            vlan_id: Some(vlan_id),
            router_id: None,
        }
    }

    pub fn network_vlan(package_id: i64, location_id: i64, prices: Vec<ItemPrice>) -> Self {
        Self {
            complex_type: "SoftLayer_Container_Product_Order_Network_Vlan".to_string(),
            package_id,
            prices,
            quantity: 1,
            location: Some(location_id.to_string()),
            vlan_id: None,
            router_id: None,
        }
    }
}

/// `SoftLayer_Container_Product_Order_Receipt`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: Option<i64>,
}

impl OrderReceipt {
    pub fn require_order_id(&self) -> Result<u64> {
        self.order_id
            .and_then(|id| u64::try_from(id).ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                SoftLayerError::UnexpectedResponse("order receipt without order id".to_string())
            })
    }
}

/// Tag names from tag references, skipping references without a tag
pub fn tag_names(refs: &[TagReference]) -> Vec<String> {
    refs.iter()
        .filter_map(|r| r.tag.as_ref().and_then(|t| t.name.clone()))
        .collect()
}

/// Comma-separated tag list as `setTags` expects it
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_vlan_with_mask_subset() {
        let vlan: NetworkVlan = serde_json::from_value(json!({
            "id": 1234,
            "vlanNumber": 1120,
            "primaryRouter": {"hostname": "fcr01a.dal09", "datacenter": {"name": "dal09"}},
            "subnets": [{"networkIdentifier": "10.0.0.0", "cidr": 29, "subnetType": "PRIMARY"}],
            "tagReferences": [{"id": 1, "tag": {"name": "prod"}}, {"id": 2}]
        }))
        .unwrap();

        assert_eq!(vlan.require_id().unwrap(), 1234);
        assert!(vlan.billing_item.is_none());
        assert_eq!(vlan.subnets[0].cidr, Some(29));
        assert_eq!(tag_names(&vlan.tag_references), vec!["prod".to_string()]);
    }

    #[test]
    fn test_order_container_wire_shape() {
        let order = OrderContainer::dedicated_firewall(44, ItemPrice { id: 9 }, 1234);
        let wire = serde_json::to_value(&order).unwrap();

        assert_eq!(wire["packageId"], json!(44));
        assert_eq!(wire["prices"], json!([{"id": 9}]));
        assert_eq!(wire["vlanId"], json!(1234));
        assert!(wire.get("location").is_none());
    }

    #[test]
    fn test_receipt_requires_positive_order_id() {
        assert_eq!(OrderReceipt { order_id: Some(5) }.require_order_id().unwrap(), 5);
        assert!(OrderReceipt { order_id: None }.require_order_id().is_err());
        assert!(OrderReceipt { order_id: Some(0) }.require_order_id().is_err());
    }
}
