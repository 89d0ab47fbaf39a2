//! Namespace credentials from an IBM Cloud account
//!
//! Without a configured auth key, the account's UAA tokens are exchanged at
//! the regional OpenWhisk endpoint for the per-namespace `uuid:key` pairs.

use crate::client::{WhiskClient, WhiskConfig};
use crate::error::{Result, WhiskError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// UAA access and refresh tokens, as issued with their `Bearer ` prefix
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub namespaces: Vec<NamespaceKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceKey {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct UaaToken {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: String,
}

/// Regional OpenWhisk endpoint
pub fn region_endpoint(region: &str) -> String {
    if region == "us-south" {
        "https://openwhisk.ng.bluemix.net".to_string()
    } else {
        format!("https://openwhisk.{}.bluemix.net", region)
    }
}

/// Regional UAA token endpoint
pub fn uaa_endpoint(region: &str) -> String {
    let domain = if region == "us-south" {
        "ng.bluemix.net".to_string()
    } else {
        format!("{}.bluemix.net", region)
    };
    format!("https://login.{}/UAALoginServerWAR/oauth/token", domain)
}

/// Token without its 7-character `Bearer ` prefix
fn strip_bearer(token: &str) -> &str {
    match token.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &token[7..],
        _ => token,
    }
}

/// Pick the key of `namespace`, or list what the account has
pub fn select_namespace(response: AuthResponse, namespace: &str) -> Result<String> {
    let mut available = Vec::with_capacity(response.namespaces.len());
    for entry in response.namespaces {
        if entry.name == namespace {
            return Ok(entry.key);
        }
        available.push(entry.name);
    }
    Err(WhiskError::NamespaceNotFound {
        namespace: namespace.to_string(),
        available,
    })
}

/// Exchange an IBM Cloud API key for UAA tokens
pub async fn fetch_uaa_tokens(
    http: &reqwest::Client,
    region: &str,
    api_key: &str,
) -> Result<Tokens> {
    let response = http
        .post(uaa_endpoint(region))
        .basic_auth("cf", Some(""))
        .form(&[
            ("grant_type", "password"),
            ("username", "apikey"),
            ("password", api_key),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WhiskError::Authentication(format!(
            "UAA token request failed (HTTP {}): {}",
            status.as_u16(),
            body
        )));
    }

    let token: UaaToken = response.json().await?;
    let token_type = if token.token_type.is_empty() {
        "Bearer".to_string()
    } else {
        token.token_type
    };
    Ok(Tokens {
        access_token: format!("{} {}", token_type, token.access_token),
        refresh_token: format!("{} {}", token_type, token.refresh_token),
    })
}

/// Look up the auth key of `namespace` at `endpoint`
pub async fn fetch_namespace_key(
    http: &reqwest::Client,
    endpoint: &str,
    tokens: &Tokens,
    namespace: &str,
) -> Result<String> {
    let payload = AuthPayload {
        access_token: strip_bearer(&tokens.access_token),
        refresh_token: strip_bearer(&tokens.refresh_token),
    };

    let url = format!("{}/bluemix/v1/authenticate", endpoint.trim_end_matches('/'));
    tracing::debug!("POST {}", url);
    let response = http.post(&url).json(&payload).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WhiskError::Authentication(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let auth: AuthResponse = response.json().await?;
    select_namespace(auth, namespace)
}

/// Build a client for `namespace` from an IBM Cloud API key
pub async fn connect_with_api_key(
    region: &str,
    api_key: &str,
    namespace: &str,
    timeout: Duration,
) -> Result<WhiskClient> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("skyline/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let endpoint = region_endpoint(region);
    let tokens = fetch_uaa_tokens(&http, region, api_key).await?;
    let auth_key = fetch_namespace_key(&http, &endpoint, &tokens, namespace).await?;
    tracing::info!(namespace, region, "Resolved OpenWhisk namespace key");

    let mut config = WhiskConfig::new(endpoint, auth_key).with_namespace(namespace);
    config.timeout = timeout;
    WhiskClient::new(config)
}
