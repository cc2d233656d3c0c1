//! Error types for the offline proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the offline proxy.
///
/// A cache miss is not an error: lookups return `Option` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The network fetch could not complete (DNS, timeout, connection reset)
    #[error("Network failure: {0}")]
    Network(String),

    /// A pre-cache fetch failed while installing a proxy version
    #[error("Install failed for version {version}: {reason}")]
    InstallAssetFailure { version: String, reason: String },

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Returns true when the failure came from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(self, ProxyError::Network(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::Network(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InstallAssetFailure { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
