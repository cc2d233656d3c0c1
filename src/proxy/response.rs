//! Proxy Response Module
//!
//! Fully read responses returned by the strategy executor.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cache::{RequestIdentity, StoredResponse};

/// Header telling the caller where a proxied response came from.
pub const SOURCE_HEADER: &str = "x-proxy-source";

// == Response Source ==
/// Where a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fetched from the network under a caching policy
    Network,
    /// Served from a cache region
    Cache,
    /// The offline document substituted for a failed navigation
    Offline,
    /// Forwarded untouched, no cache involved
    PassThrough,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
            ResponseSource::PassThrough => "passthrough",
        }
    }
}

// == Proxy Response ==
/// A response whose body has already been read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, source: ResponseSource) -> Self {
        Self {
            status,
            headers,
            body,
            source,
        }
    }

    /// Re-labels the response source.
    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Builds a cache record answering `identity` from an independent copy of
    /// this response's bytes.
    pub fn to_stored(&self, identity: RequestIdentity) -> StoredResponse {
        StoredResponse::new(
            identity,
            self.status,
            self.headers.clone(),
            Bytes::copy_from_slice(&self.body),
        )
    }

    /// Wraps a cached record.
    pub fn from_stored(stored: StoredResponse, source: ResponseSource) -> Self {
        Self::new(stored.status, stored.headers, stored.body, source)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        // Framing headers belong to the upstream connection, axum recomputes them
        headers.remove(header::TRANSFER_ENCODING);
        headers.remove(header::CONNECTION);
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(SOURCE_HEADER, HeaderValue::from_static(self.source.as_str()));

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_sets_source_header() {
        let response = ProxyResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(b"hi"),
            ResponseSource::Cache,
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(SOURCE_HEADER).unwrap(), "cache");
    }

    #[test]
    fn test_to_stored_copies_body() {
        let response = ProxyResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(b"payload"),
            ResponseSource::Network,
        );
        let stored = response.to_stored(RequestIdentity::get("http://shop.test/a"));

        assert_eq!(stored.body, response.body);
        assert_eq!(stored.status, StatusCode::OK);
    }
}
