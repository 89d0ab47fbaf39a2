//! OpenWhisk REST client
//!
//! Entities live under `{base}/api/v1/namespaces/{namespace}/{collection}/{name}`.
//! The namespace is passed on every call rather than held as client state, so
//! one client serves several namespaces.

use crate::error::{Result, WhiskError};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use skyline_cloud::DEFAULT_NAMESPACE;
use std::fmt;
use std::time::Duration;

/// Entity collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Actions,
    Triggers,
    Rules,
    Packages,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Actions => "actions",
            Collection::Triggers => "triggers",
            Collection::Rules => "rules",
            Collection::Packages => "packages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote operations the OpenWhisk handlers need
///
/// `name` is the entity path inside the namespace: `entity` or
/// `package/entity` for actions.
#[async_trait]
pub trait WhiskApi: Send + Sync {
    /// Namespace used when an identifier names none
    fn default_namespace(&self) -> &str;

    /// `uuid:key` credentials, forwarded to feed actions
    fn auth_key(&self) -> &str;

    async fn get(&self, collection: Collection, namespace: &str, name: &str) -> Result<Value>;

    async fn put(
        &self,
        collection: Collection,
        namespace: &str,
        name: &str,
        body: &Value,
        overwrite: bool,
    ) -> Result<Value>;

    async fn delete(&self, collection: Collection, namespace: &str, name: &str) -> Result<()>;

    /// Blocking action invocation returning the activation result
    async fn invoke(&self, namespace: &str, name: &str, params: &Value) -> Result<Value>;

    /// Enable or disable a rule (`active` / `inactive`)
    async fn set_rule_state(&self, namespace: &str, name: &str, status: &str) -> Result<Value>;
}

/// Fetch and decode an entity
pub async fn fetch<T: DeserializeOwned>(
    api: &dyn WhiskApi,
    collection: Collection,
    namespace: &str,
    name: &str,
) -> Result<T> {
    let value = api.get(collection, namespace, name).await?;
    Ok(serde_json::from_value(value)?)
}

/// Encode, store and decode an entity
pub async fn store<T: Serialize + DeserializeOwned>(
    api: &dyn WhiskApi,
    collection: Collection,
    namespace: &str,
    name: &str,
    entity: &T,
    overwrite: bool,
) -> Result<T> {
    let body = serde_json::to_value(entity)?;
    let value = api.put(collection, namespace, name, &body, overwrite).await?;
    Ok(serde_json::from_value(value)?)
}

/// `exists` helper: 404 means absent
pub async fn probe(
    api: &dyn WhiskApi,
    collection: Collection,
    namespace: &str,
    name: &str,
) -> Result<Option<Value>> {
    match api.get(collection, namespace, name).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Connection settings for [`WhiskClient`]
#[derive(Debug, Clone)]
pub struct WhiskConfig {
    /// API host, with or without scheme
    pub host: String,
    pub auth_key: String,
    pub namespace: String,
    pub timeout: Duration,
}

impl WhiskConfig {
    pub fn new(host: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth_key: auth_key.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// OpenWhisk REST client
pub struct WhiskClient {
    client: reqwest::Client,
    base: Url,
    user: String,
    password: String,
    auth_key: String,
    namespace: String,
}

impl WhiskClient {
    pub fn new(config: WhiskConfig) -> Result<Self> {
        if config.auth_key.is_empty() {
            return Err(WhiskError::MissingAuthKey);
        }
        let (user, password) = config
            .auth_key
            .split_once(':')
            .ok_or(WhiskError::InvalidAuthKey)?;

        let host = config.host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/api/v1/namespaces", host)
        } else {
            format!("https://{}/api/v1/namespaces", host)
        };
        let base = Url::parse(&base)
            .map_err(|e| WhiskError::InvalidConfig(format!("invalid OpenWhisk host '{}': {}", host, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("skyline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let namespace = if config.namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            config.namespace
        };

        Ok(Self {
            client,
            base,
            user: user.to_string(),
            password: password.to_string(),
            auth_key: config.auth_key.clone(),
            namespace,
        })
    }

    /// `{base}/{namespace}/{collection}/{name...}` with each segment escaped
    fn entity_url(&self, namespace: &str, collection: &str, name: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| WhiskError::InvalidConfig(format!("cannot-be-a-base URL {}", self.base)))?
            .push(namespace)
            .push(collection)
            .extend(name.split('/'));
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(WhiskError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl WhiskApi for WhiskClient {
    fn default_namespace(&self) -> &str {
        &self.namespace
    }

    fn auth_key(&self) -> &str {
        &self.auth_key
    }

    async fn get(&self, collection: Collection, namespace: &str, name: &str) -> Result<Value> {
        let url = self.entity_url(namespace, collection.as_str(), name)?;
        self.send(Method::GET, url, None).await
    }

    async fn put(
        &self,
        collection: Collection,
        namespace: &str,
        name: &str,
        body: &Value,
        overwrite: bool,
    ) -> Result<Value> {
        let mut url = self.entity_url(namespace, collection.as_str(), name)?;
        url.query_pairs_mut()
            .append_pair("overwrite", if overwrite { "true" } else { "false" });
        self.send(Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, collection: Collection, namespace: &str, name: &str) -> Result<()> {
        let url = self.entity_url(namespace, collection.as_str(), name)?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn invoke(&self, namespace: &str, name: &str, params: &Value) -> Result<Value> {
        let mut url = self.entity_url(namespace, Collection::Actions.as_str(), name)?;
        url.query_pairs_mut()
            .append_pair("blocking", "true")
            .append_pair("result", "true");
        self.send(Method::POST, url, Some(params)).await
    }

    async fn set_rule_state(&self, namespace: &str, name: &str, status: &str) -> Result<Value> {
        let url = self.entity_url(namespace, Collection::Rules.as_str(), name)?;
        self.send(Method::POST, url, Some(&json!({ "status": status })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWhisk;

    fn client(host: &str) -> WhiskClient {
        WhiskClient::new(WhiskConfig::new(host, "23bc46b1-71f6-4ed5-8c54-816aa4f8c502:secret"))
            .unwrap()
    }

    #[test]
    fn test_entity_urls() {
        let client = client("openwhisk.ng.bluemix.net");
        let url = client
            .entity_url("org_dev", "actions", "utils/hello world")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://openwhisk.ng.bluemix.net/api/v1/namespaces/org_dev/actions/utils/hello%20world"
        );
    }

    #[test]
    fn test_host_with_scheme_is_kept() {
        let client = client("http://localhost:3233/");
        let url = client.entity_url("_", "rules", "nightly").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3233/api/v1/namespaces/_/rules/nightly");
    }

    #[test]
    fn test_auth_key_is_split_for_basic_auth() {
        let client = client("localhost");
        assert_eq!(client.user, "23bc46b1-71f6-4ed5-8c54-816aa4f8c502");
        assert_eq!(client.password, "secret");
        assert_eq!(client.default_namespace(), "_");
    }

    #[test]
    fn test_probe_maps_not_found_to_none() {
        let fake = FakeWhisk::new("org_dev");
        fake.seed(Collection::Actions, "org_dev", "hello", json!({"name": "hello"}));

        let found =
            tokio_test::block_on(probe(&fake, Collection::Actions, "org_dev", "hello")).unwrap();
        assert_eq!(found, Some(json!({"name": "hello"})));

        let missing =
            tokio_test::block_on(probe(&fake, Collection::Actions, "org_dev", "nope")).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_bad_credentials() {
        assert!(matches!(
            WhiskClient::new(WhiskConfig::new("localhost", "")),
            Err(WhiskError::MissingAuthKey)
        ));
        assert!(matches!(
            WhiskClient::new(WhiskConfig::new("localhost", "no-colon")),
            Err(WhiskError::InvalidAuthKey)
        ));
    }
}
