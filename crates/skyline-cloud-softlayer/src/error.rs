//! SoftLayer provider error types

use skyline_cloud::{CloudError, PollError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoftLayerError {
    #[error(
        "softlayer_username and softlayer_api_key must be provided. Please see the documentation on how to configure them"
    )]
    MissingCredentials,

    #[error("SoftLayer API error (HTTP {status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("No product items matching {0} could be found")]
    ProductNotFound(String),

    #[error("Product package of type {0} not found")]
    PackageNotFound(String),

    #[error("Datacenter not found: {0}")]
    DatacenterNotFound(String),

    #[error("Router not found: {0}")]
    RouterNotFound(String),

    #[error("Not a valid ID, must be an integer: {0}")]
    InvalidId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No billing item for {0}")]
    BillingItemNotFound(String),

    #[error("SoftLayer reported an unsuccessful cancellation of billing item {0}")]
    CancellationFailed(i64),

    #[error("Could not set tags on {kind} {id}")]
    TagsFailed { kind: &'static str, id: i64 },

    #[error("Cannot find {kind} with order id '{order_id}' within {elapsed:?}")]
    OrderTimeout {
        kind: &'static str,
        order_id: u64,
        elapsed: Duration,
    },

    #[error("Expected one {kind} for order id '{order_id}', found {count}")]
    AmbiguousOrder {
        kind: &'static str,
        order_id: u64,
        count: usize,
    },

    #[error("Wait for {kind} with order id '{order_id}' was cancelled")]
    OrderCancelled { kind: &'static str, order_id: u64 },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

impl SoftLayerError {
    /// Whether the API reported the object as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            SoftLayerError::Api { status, code, .. } => {
                *status == 404 || code == "SoftLayer_Exception_ObjectNotFound"
            }
            _ => false,
        }
    }

    /// Whether repeating the request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SoftLayerError::Api { status, .. } => *status >= 500 || *status == 429,
            SoftLayerError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Attach the resource kind to a finished poll
    pub(crate) fn from_poll(kind: &'static str, err: PollError<SoftLayerError>) -> Self {
        match err {
            PollError::Timeout { order_id, elapsed } => SoftLayerError::OrderTimeout {
                kind,
                order_id,
                elapsed,
            },
            PollError::Ambiguous { order_id, count } => SoftLayerError::AmbiguousOrder {
                kind,
                order_id,
                count,
            },
            PollError::Cancelled { order_id } => SoftLayerError::OrderCancelled { kind, order_id },
            PollError::Transport(e) => e,
        }
    }
}

impl From<SoftLayerError> for CloudError {
    fn from(err: SoftLayerError) -> Self {
        match err {
            SoftLayerError::CloudError(e) => e,
            SoftLayerError::MissingCredentials => CloudError::AuthenticationFailed(err.to_string()),
            SoftLayerError::OrderTimeout { .. } => CloudError::Timeout(err.to_string()),
            SoftLayerError::AmbiguousOrder { .. } => CloudError::AmbiguousResult(err.to_string()),
            SoftLayerError::OrderCancelled { .. } => CloudError::Cancelled(err.to_string()),
            SoftLayerError::InvalidId(_) | SoftLayerError::InvalidConfig(_) => {
                CloudError::InvalidConfig(err.to_string())
            }
            ref e if e.is_not_found() => CloudError::ResourceNotFound(err.to_string()),
            SoftLayerError::Api { status: 401, .. } | SoftLayerError::Api { status: 403, .. } => {
                CloudError::AuthenticationFailed(err.to_string())
            }
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SoftLayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: &str) -> SoftLayerError {
        SoftLayerError::Api {
            status,
            code: code.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_not_found_classification() {
        assert!(api(404, "").is_not_found());
        assert!(api(500, "SoftLayer_Exception_ObjectNotFound").is_not_found());
        assert!(!api(500, "SoftLayer_Exception_Public").is_not_found());
    }

    #[test]
    fn test_into_cloud_error_keeps_kind() {
        let err: CloudError = SoftLayerError::AmbiguousOrder {
            kind: "vlan",
            order_id: 7,
            count: 2,
        }
        .into();
        assert!(matches!(err, CloudError::AmbiguousResult(_)));

        let err: CloudError = api(404, "SoftLayer_Exception_ObjectNotFound").into();
        assert!(err.is_not_found());

        let err: CloudError = api(503, "").into();
        assert!(matches!(err, CloudError::ApiError(_)));
    }
}
