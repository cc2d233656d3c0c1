//! Network Module
//!
//! The outbound fetch seam. Strategies only ever talk to the `Network` trait.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::proxy::{ProxyRequest, ProxyResponse, ResponseSource};

// == Network Trait ==
/// Performs a network fetch.
///
/// Any response that arrives, whatever its status, is `Ok`. `Err` is reserved
/// for fetches that could not complete and is always `ProxyError::Network`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse>;
}

// == HTTP Network ==
/// `Network` backed by a reqwest client with a per-request deadline.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Creates a client whose fetches fail after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        debug!(method = %request.method, url = %request.url, "Network fetch");

        let mut headers = request.headers.clone();
        headers.remove(header::HOST);
        headers.remove(header::CONNECTION);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| ProxyError::Network(format!("{}: {}", request.url, e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        // Read the body exactly once; callers duplicate the bytes if they branch
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Network(format!("{}: {}", request.url, e)))?;

        Ok(ProxyResponse::new(status, headers, body, ResponseSource::Network))
    }
}
