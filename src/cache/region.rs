//! Cache Region Module
//!
//! A named, versioned partition of stored responses.

use std::collections::HashMap;

use crate::cache::{RequestIdentity, StoredResponse};

// == Cache Region ==
/// A named partition of the cache store, e.g. `siraha-bazaar-static-v2`.
///
/// Entries are whole records. A write always replaces the previous record for
/// the same identity, so interleaved writers can never produce a torn entry.
#[derive(Debug, Default, Clone)]
pub struct CacheRegion {
    name: String,
    entries: HashMap<RequestIdentity, StoredResponse>,
}

impl CacheRegion {
    /// Creates an empty region.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Region name including its version suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or overwrites the entry for the record's identity.
    ///
    /// Returns the record that was replaced, if any.
    pub fn put(&mut self, response: StoredResponse) -> Option<StoredResponse> {
        self.entries.insert(response.identity.clone(), response)
    }

    /// Looks up an entry by identity.
    pub fn get(&self, identity: &RequestIdentity) -> Option<&StoredResponse> {
        self.entries.get(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total approximate size of every record in bytes.
    pub fn size_bytes(&self) -> usize {
        self.entries.values().map(StoredResponse::size_bytes).sum()
    }
}
