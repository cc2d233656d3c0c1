//! Cache Storage Module
//!
//! Region-partitioned store of response records. Lookups span every region,
//! current and stale; deletion only ever removes whole regions.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheRegion, CacheStats, RequestIdentity, StoredResponse};
use crate::error::{ProxyError, Result};

// == Cache Storage ==
/// Main cache storage holding every named region.
#[derive(Debug, Default)]
pub struct CacheStorage {
    /// Regions keyed by name
    regions: HashMap<String, CacheRegion>,
    /// Region names in creation order, the order lookups search them in
    order: Vec<String>,
    /// Counters
    stats: CacheStats,
}

impl CacheStorage {
    // == Constructor ==
    /// Creates an empty storage with no regions.
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Opens a region, creating it if absent. Idempotent.
    pub fn open(&mut self, name: &str) -> &mut CacheRegion {
        if !self.regions.contains_key(name) {
            debug!(region = name, "Creating cache region");
            self.order.push(name.to_string());
        }
        self.regions
            .entry(name.to_string())
            .or_insert_with(|| CacheRegion::new(name))
    }

    // == Put ==
    /// Stores a response into a region, overwriting any entry for the same identity.
    ///
    /// Non-2xx responses are rejected so that error pages never become cached truth.
    pub fn put(&mut self, region: &str, response: StoredResponse) -> Result<()> {
        if !response.is_success() {
            return Err(ProxyError::InvalidRequest(format!(
                "Refusing to cache {} response for {}",
                response.status, response.identity
            )));
        }

        self.open(region).put(response);
        self.stats.record_write();
        Ok(())
    }

    // == Get ==
    /// Looks up an identity across all regions in creation order.
    ///
    /// Returns an independent copy of the record; `None` is a plain miss.
    pub fn get(&mut self, identity: &RequestIdentity) -> Option<StoredResponse> {
        let found = self.peek(identity).cloned();
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Looks up an identity without touching the counters.
    pub fn peek(&self, identity: &RequestIdentity) -> Option<&StoredResponse> {
        self.order
            .iter()
            .filter_map(|name| self.regions.get(name))
            .find_map(|region| region.get(identity))
    }

    /// Returns a region by name, if it exists.
    pub fn region(&self, name: &str) -> Option<&CacheRegion> {
        self.regions.get(name)
    }

    // == Delete Region ==
    /// Removes a region and every entry in it.
    ///
    /// Returns true if the region existed.
    pub fn delete_region(&mut self, name: &str) -> bool {
        self.order.retain(|n| n != name);
        self.regions.remove(name).is_some()
    }

    // == List Regions ==
    /// Lists region names in creation order.
    pub fn list_regions(&self) -> Vec<String> {
        self.order.clone()
    }

    // == Clear ==
    /// Deletes every region. Returns the number of regions removed.
    pub fn clear(&mut self) -> usize {
        let count = self.regions.len();
        self.regions.clear();
        self.order.clear();
        count
    }

    pub fn record_network_failure(&mut self) {
        self.stats.record_network_failure();
    }

    pub fn record_offline_fallback(&mut self) {
        self.stats.record_offline_fallback();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.len();
        stats.total_bytes = self.regions.values().map(CacheRegion::size_bytes).sum();
        stats
    }

    /// Number of entries across all regions.
    pub fn len(&self) -> usize {
        self.regions.values().map(CacheRegion::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};

    fn response(url: &str, status: StatusCode, body: &'static str) -> StoredResponse {
        StoredResponse::new(
            RequestIdentity::get(url),
            status,
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_storage_new() {
        let storage = CacheStorage::new();
        assert!(storage.is_empty());
        assert!(storage.list_regions().is_empty());
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut storage = CacheStorage::new();
        storage.open("static-v2");
        storage.open("static-v2");
        assert_eq!(storage.list_regions(), vec!["static-v2"]);
    }

    #[test]
    fn test_put_and_get() {
        let mut storage = CacheStorage::new();
        storage
            .put("api-v2", response("http://shop.test/api/products", StatusCode::OK, "[1]"))
            .unwrap();

        let found = storage
            .get(&RequestIdentity::get("http://shop.test/api/products"))
            .unwrap();
        assert_eq!(found.body, Bytes::from_static(b"[1]"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_put_rejects_non_success() {
        let mut storage = CacheStorage::new();
        let result = storage.put(
            "dynamic-v2",
            response("http://shop.test/broken", StatusCode::INTERNAL_SERVER_ERROR, "oops"),
        );

        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let mut storage = CacheStorage::new();
        storage.put("r", response("http://shop.test/a", StatusCode::OK, "first")).unwrap();
        storage.put("r", response("http://shop.test/a", StatusCode::OK, "second")).unwrap();

        let found = storage.get(&RequestIdentity::get("http://shop.test/a")).unwrap();
        assert_eq!(found.body, Bytes::from_static(b"second"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_get_spans_stale_regions() {
        let mut storage = CacheStorage::new();
        storage
            .put("static-v1", response("http://shop.test/logo.png", StatusCode::OK, "old"))
            .unwrap();
        storage.open("static-v2");

        assert!(storage.get(&RequestIdentity::get("http://shop.test/logo.png")).is_some());
    }

    #[test]
    fn test_get_prefers_oldest_region() {
        let mut storage = CacheStorage::new();
        storage.put("first", response("http://shop.test/a", StatusCode::OK, "one")).unwrap();
        storage.put("second", response("http://shop.test/a", StatusCode::OK, "two")).unwrap();

        let found = storage.get(&RequestIdentity::get("http://shop.test/a")).unwrap();
        assert_eq!(found.body, Bytes::from_static(b"one"));
    }

    #[test]
    fn test_delete_region() {
        let mut storage = CacheStorage::new();
        storage.put("static-v1", response("http://shop.test/", StatusCode::OK, "x")).unwrap();

        assert!(storage.delete_region("static-v1"));
        assert!(!storage.delete_region("static-v1"));
        assert!(storage.get(&RequestIdentity::get("http://shop.test/")).is_none());
        assert!(storage.list_regions().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut storage = CacheStorage::new();
        storage.put("a", response("http://shop.test/1", StatusCode::OK, "x")).unwrap();
        storage.put("b", response("http://shop.test/2", StatusCode::OK, "y")).unwrap();

        assert_eq!(storage.clear(), 2);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut storage = CacheStorage::new();
        storage.put("a", response("http://shop.test/1", StatusCode::OK, "abc")).unwrap();
        storage.get(&RequestIdentity::get("http://shop.test/1"));
        storage.get(&RequestIdentity::get("http://shop.test/nope"));

        let stats = storage.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_bytes, 3);
    }

    #[test]
    fn test_peek_does_not_count() {
        let mut storage = CacheStorage::new();
        storage.put("a", response("http://shop.test/1", StatusCode::OK, "abc")).unwrap();
        assert!(storage.peek(&RequestIdentity::get("http://shop.test/1")).is_some());
        assert_eq!(storage.stats().hits, 0);
    }
}
