//! Stored Response Module
//!
//! Defines the request identity used as cache key and the response record
//! persisted per entry.

use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};

// == Request Identity ==
/// Identity of a cached request: method plus absolute URL, query included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: String,
}

impl RequestIdentity {
    /// Creates a new identity from a method and absolute URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    /// Shorthand for a GET identity, the only method that is ever cached.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Stored Response ==
/// A response record held in a cache region.
///
/// The body is an owned, fully read byte buffer. Anything that both stores
/// and returns a response works on two independent copies of it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    /// Request this response answers
    pub identity: RequestIdentity,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body bytes
    pub body: Bytes,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: i64,
}

impl StoredResponse {
    // == Constructor ==
    /// Creates a new record stamped with the current time.
    pub fn new(identity: RequestIdentity, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            identity,
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Returns true for 2xx responses, the only ones allowed into a region.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Approximate size of the record in bytes (body plus headers).
    pub fn size_bytes(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.body.len() + headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = RequestIdentity::get("http://shop.test/api/products?page=2");
        assert_eq!(identity.to_string(), "GET http://shop.test/api/products?page=2");
    }

    #[test]
    fn test_identity_query_is_significant() {
        let a = RequestIdentity::get("http://shop.test/api/products?page=1");
        let b = RequestIdentity::get("http://shop.test/api/products?page=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_success_and_size() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/html".parse().unwrap());
        let record = StoredResponse::new(
            RequestIdentity::get("http://shop.test/"),
            StatusCode::OK,
            headers,
            Bytes::from_static(b"<html></html>"),
        );

        assert!(record.is_success());
        assert_eq!(record.size_bytes(), 13 + "content-type".len() + "text/html".len());
    }

    #[test]
    fn test_record_not_found_is_not_success() {
        let record = StoredResponse::new(
            RequestIdentity::get("http://shop.test/missing"),
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            Bytes::new(),
        );
        assert!(!record.is_success());
    }
}
