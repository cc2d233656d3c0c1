//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check overwrite, fidelity and region-deletion behavior.

use std::collections::HashSet;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use proptest::prelude::*;

use crate::cache::{CacheStorage, RequestIdentity, StoredResponse};

// == Strategies ==
/// Generates absolute URLs with an optional query string
fn url_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,12}(/[a-z0-9]{1,8}){0,3}", proptest::option::of("[a-z]{1,5}=[0-9]{1,3}")).prop_map(
        |(path, query)| match query {
            Some(q) => format!("http://shop.test/{}?{}", path, q),
            None => format!("http://shop.test/{}", path),
        },
    )
}

fn body_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

fn region_strategy() -> impl Strategy<Value = String> {
    "(static|dynamic|api)-v[1-3]"
}

fn status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![200u16..300, 300u16..600]
}

fn record(url: &str, status: u16, body: Vec<u8>) -> StoredResponse {
    StoredResponse::new(
        RequestIdentity::get(url),
        StatusCode::from_u16(status).unwrap(),
        HeaderMap::new(),
        Bytes::from(body),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Repeating put for one identity leaves exactly the last payload.
    #[test]
    fn prop_overwrite_semantics(
        url in url_strategy(),
        region in region_strategy(),
        first in body_strategy(),
        second in body_strategy()
    ) {
        let mut storage = CacheStorage::new();

        storage.put(&region, record(&url, 200, first)).unwrap();
        storage.put(&region, record(&url, 200, second.clone())).unwrap();

        let found = storage.get(&RequestIdentity::get(url.as_str())).unwrap();
        prop_assert_eq!(found.body, Bytes::from(second));
        prop_assert_eq!(storage.len(), 1, "Overwrite must not duplicate");
    }

    // What was written is exactly what comes back.
    #[test]
    fn prop_write_fidelity(url in url_strategy(), status in 200u16..300, body in body_strategy()) {
        let mut storage = CacheStorage::new();
        let written = record(&url, status, body);

        storage.put("api-v2", written.clone()).unwrap();

        let found = storage.get(&written.identity).unwrap();
        prop_assert_eq!(found, written);
    }

    // Only 2xx responses are ever persisted.
    #[test]
    fn prop_only_success_is_stored(
        writes in prop::collection::vec((url_strategy(), status_strategy()), 1..40)
    ) {
        let mut storage = CacheStorage::new();
        let mut succeeded = HashSet::new();

        for (url, status) in &writes {
            let accepted = storage.put("dynamic-v2", record(url, *status, vec![1, 2, 3])).is_ok();
            prop_assert_eq!(accepted, (200..300).contains(status));
            if accepted {
                succeeded.insert(url.clone());
            }
        }

        for (url, _) in &writes {
            let stored = storage.peek(&RequestIdentity::get(url.as_str()));
            prop_assert_eq!(stored.is_some(), succeeded.contains(url));
            if let Some(stored) = stored {
                prop_assert!(stored.is_success());
            }
        }
    }

    // Deleting a region removes all of its entries and nothing else.
    #[test]
    fn prop_delete_region_is_wholesale(
        entries in prop::collection::vec((region_strategy(), url_strategy()), 1..40),
        victim in region_strategy()
    ) {
        let mut storage = CacheStorage::new();
        for (region, url) in &entries {
            storage.put(region, record(url, 200, b"x".to_vec())).unwrap();
        }
        let survivors: usize = storage
            .list_regions()
            .iter()
            .filter(|name| **name != victim)
            .filter_map(|name| storage.region(name))
            .map(|region| region.len())
            .sum();

        storage.delete_region(&victim);

        prop_assert!(storage.region(&victim).is_none());
        prop_assert!(!storage.list_regions().contains(&victim));
        prop_assert_eq!(storage.len(), survivors);
    }
}
