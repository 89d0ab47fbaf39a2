//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed identifier '{raw}': {reason}")]
    MalformedIdentifier { raw: String, reason: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Ambiguous result: {0}")]
    AmbiguousResult(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the remote resource is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
