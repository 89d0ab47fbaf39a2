use anyhow::Context;
use skyline_cloud::{CancellationToken, DEFAULT_NAMESPACE, OrderPoller, RetryConfig};
use skyline_cloud_openwhisk::{WhiskApi, WhiskClient, WhiskConfig, connect_with_api_key, region_endpoint};
use skyline_cloud_softlayer::{
    FIREWALL_POLL, FirewallHandler, SoftLayerApi, SoftLayerClient, SoftLayerConfig, VLAN_POLL,
    VlanHandler,
};
use skyline_config::{Config, ConfigError, WhiskCredentials};
use std::sync::Arc;

/// Lazily built API clients
///
/// A service whose settings are incomplete fails only when a command uses it.
pub struct ClientSession {
    config: Config,
    softlayer: Result<SoftLayerConfig, ConfigError>,
    whisk: Result<WhiskCredentials, ConfigError>,
    cancel: CancellationToken,
}

impl ClientSession {
    pub fn new(config: Config) -> Self {
        let softlayer = config.softlayer_credentials().map(|(username, api_key)| {
            let mut softlayer = SoftLayerConfig::new(username, api_key);
            softlayer.endpoint = config.softlayer.endpoint_url.clone();
            softlayer.timeout = config.softlayer_timeout();
            softlayer
        });
        let whisk = config.whisk_credentials();

        Self {
            config,
            softlayer,
            whisk,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelled on Ctrl-C; stops any running order poll
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Constant delay between retries
    fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.config.retry_count.saturating_add(1),
            initial_delay: self.config.retry_delay(),
            max_delay: self.config.retry_delay(),
            backoff_multiplier: 1.0,
        }
    }

    pub fn softlayer(&self) -> anyhow::Result<Arc<dyn SoftLayerApi>> {
        let config = match &self.softlayer {
            Ok(config) => config.clone(),
            Err(e) => anyhow::bail!("{}", e),
        };
        let client = SoftLayerClient::new(config)
            .context("Failed to create SoftLayer client")?
            .with_retry(self.retry());
        Ok(Arc::new(client))
    }

    pub fn vlan_handler(&self) -> anyhow::Result<VlanHandler> {
        let poller = OrderPoller::new(VLAN_POLL).with_cancellation(self.cancellation());
        Ok(VlanHandler::new(self.softlayer()?).with_poller(poller))
    }

    pub fn firewall_handler(&self) -> anyhow::Result<FirewallHandler> {
        let poller = OrderPoller::new(FIREWALL_POLL).with_cancellation(self.cancellation());
        Ok(FirewallHandler::new(self.softlayer()?).with_poller(poller))
    }

    pub async fn openwhisk(&self) -> anyhow::Result<Arc<dyn WhiskApi>> {
        let credentials = match &self.whisk {
            Ok(credentials) => credentials.clone(),
            Err(e) => anyhow::bail!("{}", e),
        };
        let settings = &self.config.openwhisk;

        let client = match credentials {
            WhiskCredentials::AuthKey(auth_key) => {
                let host = if settings.host.is_empty() {
                    region_endpoint(&self.config.region)
                } else {
                    settings.host.clone()
                };
                let namespace = if settings.namespace.is_empty() {
                    DEFAULT_NAMESPACE
                } else {
                    settings.namespace.as_str()
                };
                let mut config = WhiskConfig::new(host, auth_key).with_namespace(namespace);
                config.timeout = self.config.bluemix_timeout();
                WhiskClient::new(config).context("Failed to create OpenWhisk client")?
            }
            WhiskCredentials::ApiKey(api_key) => {
                if settings.namespace.is_empty() {
                    anyhow::bail!(
                        "openwhisk.namespace (or OW_NAMESPACE) is required to look up the namespace key"
                    );
                }
                connect_with_api_key(
                    &self.config.region,
                    &api_key,
                    &settings.namespace,
                    self.config.bluemix_timeout(),
                )
                .await
                .context("Failed to fetch OpenWhisk namespace credentials")?
            }
        };
        Ok(Arc::new(client))
    }
}
