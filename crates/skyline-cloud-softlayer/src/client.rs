//! SoftLayer REST client
//!
//! Direct SoftLayer API implementation over `reqwest`. Requests use basic
//! authentication with the account username and API key; service methods are
//! addressed as `{endpoint}/{Service}/{id}/{method}.json`.

use crate::datatypes::{
    BillingItem, Firewall, Hardware, Location, NetworkVlan, OrderContainer, OrderReceipt,
    ProductItem, ProductPackage,
};
use crate::error::{Result, SoftLayerError};
use crate::filter::{ObjectFilter, object_mask};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use skyline_cloud::RetryConfig;
use std::time::Duration;

/// Default SoftLayer REST endpoint
pub const SOFTLAYER_REST_ENDPOINT: &str = "https://api.softlayer.com/rest/v3";

/// Remote operations the SoftLayer handlers need
#[async_trait]
pub trait SoftLayerApi: Send + Sync {
    /// `SoftLayer_Account::getNetworkVlans`
    async fn get_network_vlans(&self, filter: &ObjectFilter, mask: &str)
    -> Result<Vec<NetworkVlan>>;

    async fn get_package_by_type(&self, package_type: &str) -> Result<ProductPackage>;

    async fn get_package_items(&self, package_id: i64) -> Result<Vec<ProductItem>>;

    async fn place_order(&self, order: &OrderContainer) -> Result<OrderReceipt>;

    async fn get_datacenter_by_name(&self, name: &str) -> Result<Location>;

    async fn get_router_by_hostname(&self, hostname: &str) -> Result<Hardware>;

    async fn get_vlan(&self, id: i64, mask: &str) -> Result<NetworkVlan>;

    async fn edit_vlan_name(&self, id: i64, name: &str) -> Result<bool>;

    async fn get_vlan_billing_item(&self, id: i64) -> Result<Option<BillingItem>>;

    async fn set_vlan_tags(&self, id: i64, tags: &str) -> Result<bool>;

    async fn get_firewall(&self, id: i64, mask: &str) -> Result<Firewall>;

    async fn get_firewall_billing_item(&self, id: i64) -> Result<Option<BillingItem>>;

    async fn set_firewall_tags(&self, id: i64, tags: &str) -> Result<bool>;

    async fn cancel_billing_item(&self, id: i64) -> Result<bool>;
}

/// Connection settings for [`SoftLayerClient`]
#[derive(Debug, Clone)]
pub struct SoftLayerConfig {
    pub endpoint: String,
    pub username: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl SoftLayerConfig {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: SOFTLAYER_REST_ENDPOINT.to_string(),
            username: username.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// SoftLayer REST client
pub struct SoftLayerClient {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    api_key: String,
    retry: RetryConfig,
}

impl SoftLayerClient {
    pub fn new(config: SoftLayerConfig) -> Result<Self> {
        if config.username.is_empty() || config.api_key.is_empty() {
            return Err(SoftLayerError::MissingCredentials);
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("skyline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            username: config.username,
            api_key: config.api_key,
            retry: RetryConfig::none(),
        })
    }

    /// Retry transient failures (5xx, 429, connect/timeouts) with backoff
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, service: &str, id: Option<i64>, method: &str) -> String {
        match id {
            Some(id) => format!("{}/{}/{}/{}.json", self.endpoint, service, id, method),
            None => format!("{}/{}/{}.json", self.endpoint, service, method),
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: ServiceRequest<'_>) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match self.send(&request).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        service = request.service,
                        method = request.method,
                        attempt = attempt + 1,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "SoftLayer call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: &ServiceRequest<'_>) -> Result<T> {
        let url = self.url(request.service, request.id, request.method);
        let http_method = if request.parameters.is_some() {
            Method::POST
        } else {
            Method::GET
        };

        tracing::debug!("{} {}", http_method, url);

        let mut builder = self
            .client
            .request(http_method, &url)
            .basic_auth(&self.username, Some(&self.api_key));

        let mut query = Vec::new();
        if let Some(mask) = request.mask {
            query.push(("objectMask", object_mask(mask)));
        }
        if let Some(filter) = request.filter {
            query.push(("objectFilter", filter.to_string()));
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(parameters) = &request.parameters {
            builder = builder.json(&json!({ "parameters": parameters }));
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let api_error: ApiError = serde_json::from_str(&body).unwrap_or_default();
            return Err(SoftLayerError::Api {
                status: status.as_u16(),
                code: api_error.code.unwrap_or_default(),
                message: api_error.error.unwrap_or(body),
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

/// One service method call
struct ServiceRequest<'a> {
    service: &'a str,
    id: Option<i64>,
    method: &'a str,
    mask: Option<&'a str>,
    filter: Option<&'a ObjectFilter>,
    parameters: Option<Vec<Value>>,
}

impl<'a> ServiceRequest<'a> {
    fn new(service: &'a str, method: &'a str) -> Self {
        Self {
            service,
            id: None,
            method,
            mask: None,
            filter: None,
            parameters: None,
        }
    }

    fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    fn mask(mut self, mask: &'a str) -> Self {
        self.mask = Some(mask);
        self
    }

    fn filter(mut self, filter: &'a ObjectFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    fn parameters(mut self, parameters: Vec<Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    error: Option<String>,
    code: Option<String>,
}

/// Billing item lookups answer `null` or `{}` when nothing is billed
fn present(item: Option<BillingItem>) -> Option<BillingItem> {
    item.filter(|b| b.id.is_some())
}

#[async_trait]
impl SoftLayerApi for SoftLayerClient {
    async fn get_network_vlans(
        &self,
        filter: &ObjectFilter,
        mask: &str,
    ) -> Result<Vec<NetworkVlan>> {
        self.call(
            ServiceRequest::new("SoftLayer_Account", "getNetworkVlans")
                .filter(filter)
                .mask(mask),
        )
        .await
    }

    async fn get_package_by_type(&self, package_type: &str) -> Result<ProductPackage> {
        let filter = ObjectFilter::eq("type.keyName", package_type);
        let packages: Vec<ProductPackage> = self
            .call(
                ServiceRequest::new("SoftLayer_Product_Package", "getAllObjects")
                    .filter(&filter)
                    .mask("id,name,keyName"),
            )
            .await?;

        packages
            .into_iter()
            .next()
            .ok_or_else(|| SoftLayerError::PackageNotFound(package_type.to_string()))
    }

    async fn get_package_items(&self, package_id: i64) -> Result<Vec<ProductItem>> {
        self.call(
            ServiceRequest::new("SoftLayer_Product_Package", "getItems")
                .id(package_id)
                .mask("id,keyName,prices[id]"),
        )
        .await
    }

    async fn place_order(&self, order: &OrderContainer) -> Result<OrderReceipt> {
        self.call(
            ServiceRequest::new("SoftLayer_Product_Order", "placeOrder")
                .parameters(vec![serde_json::to_value(order)?, Value::Bool(false)]),
        )
        .await
    }

    async fn get_datacenter_by_name(&self, name: &str) -> Result<Location> {
        let filter = ObjectFilter::eq("name", name);
        let datacenters: Vec<Location> = self
            .call(
                ServiceRequest::new("SoftLayer_Location_Datacenter", "getDatacenters")
                    .filter(&filter)
                    .mask("id,name"),
            )
            .await?;

        datacenters
            .into_iter()
            .next()
            .ok_or_else(|| SoftLayerError::DatacenterNotFound(name.to_string()))
    }

    async fn get_router_by_hostname(&self, hostname: &str) -> Result<Hardware> {
        let filter = ObjectFilter::eq("routers.hostname", hostname);
        let routers: Vec<Hardware> = self
            .call(
                ServiceRequest::new("SoftLayer_Account", "getRouters")
                    .filter(&filter)
                    .mask("id,hostname"),
            )
            .await?;

        routers
            .into_iter()
            .next()
            .ok_or_else(|| SoftLayerError::RouterNotFound(hostname.to_string()))
    }

    async fn get_vlan(&self, id: i64, mask: &str) -> Result<NetworkVlan> {
        self.call(
            ServiceRequest::new("SoftLayer_Network_Vlan", "getObject")
                .id(id)
                .mask(mask),
        )
        .await
    }

    async fn edit_vlan_name(&self, id: i64, name: &str) -> Result<bool> {
        self.call(
            ServiceRequest::new("SoftLayer_Network_Vlan", "editObject")
                .id(id)
                .parameters(vec![json!({ "name": name })]),
        )
        .await
    }

    async fn get_vlan_billing_item(&self, id: i64) -> Result<Option<BillingItem>> {
        let item: Option<BillingItem> = self
            .call(ServiceRequest::new("SoftLayer_Network_Vlan", "getBillingItem").id(id))
            .await?;
        Ok(present(item))
    }

    async fn set_vlan_tags(&self, id: i64, tags: &str) -> Result<bool> {
        self.call(
            ServiceRequest::new("SoftLayer_Network_Vlan", "setTags")
                .id(id)
                .parameters(vec![json!(tags)]),
        )
        .await
    }

    async fn get_firewall(&self, id: i64, mask: &str) -> Result<Firewall> {
        self.call(
            ServiceRequest::new("SoftLayer_Network_Vlan_Firewall", "getObject")
                .id(id)
                .mask(mask),
        )
        .await
    }

    async fn get_firewall_billing_item(&self, id: i64) -> Result<Option<BillingItem>> {
        let item: Option<BillingItem> = self
            .call(ServiceRequest::new("SoftLayer_Network_Vlan_Firewall", "getBillingItem").id(id))
            .await?;
        Ok(present(item))
    }

    async fn set_firewall_tags(&self, id: i64, tags: &str) -> Result<bool> {
        self.call(
            ServiceRequest::new("SoftLayer_Network_Vlan_Firewall", "setTags")
                .id(id)
                .parameters(vec![json!(tags)]),
        )
        .await
    }

    async fn cancel_billing_item(&self, id: i64) -> Result<bool> {
        self.call(ServiceRequest::new("SoftLayer_Billing_Item", "cancelService").id(id))
            .await
    }
}
