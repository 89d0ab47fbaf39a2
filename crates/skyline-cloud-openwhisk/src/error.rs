//! OpenWhisk provider error types

use skyline_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhiskError {
    #[error("OpenWhisk auth key is not configured")]
    MissingAuthKey,

    #[error("OpenWhisk auth key must have the form '<uuid>:<key>'")]
    InvalidAuthKey,

    #[error("Couldn't find Whisk Auth Key for namespace {namespace}. Available namespaces are {available:?}")]
    NamespaceNotFound {
        namespace: String,
        available: Vec<String>,
    },

    #[error("Couldn't fetch namespace details: {0}")]
    Authentication(String),

    #[error("OpenWhisk API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Feed action {feed} failed: {message}")]
    FeedFailed { feed: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

impl WhiskError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WhiskError::Api { status: 404, .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WhiskError::Api { status: 409, .. })
    }
}

impl From<WhiskError> for CloudError {
    fn from(err: WhiskError) -> Self {
        match err {
            WhiskError::CloudError(e) => e,
            WhiskError::MissingAuthKey
            | WhiskError::InvalidAuthKey
            | WhiskError::NamespaceNotFound { .. }
            | WhiskError::Authentication(_)
            | WhiskError::Api { status: 401, .. }
            | WhiskError::Api { status: 403, .. } => {
                CloudError::AuthenticationFailed(err.to_string())
            }
            WhiskError::Api { status: 404, .. } => CloudError::ResourceNotFound(err.to_string()),
            WhiskError::InvalidConfig(_) => CloudError::InvalidConfig(err.to_string()),
            WhiskError::JsonError(e) => CloudError::Json(e),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WhiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let missing = WhiskError::Api {
            status: 404,
            message: "The requested resource does not exist.".to_string(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_conflict());

        let cloud: CloudError = missing.into();
        assert!(cloud.is_not_found());
    }

    #[test]
    fn test_namespace_error_lists_available() {
        let err = WhiskError::NamespaceNotFound {
            namespace: "dev".to_string(),
            available: vec!["org_prod".to_string(), "org_test".to_string()],
        };
        assert!(err.to_string().contains(r#"["org_prod", "org_test"]"#));
        assert!(matches!(CloudError::from(err), CloudError::AuthenticationFailed(_)));
    }
}
