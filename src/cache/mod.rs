//! Cache Module
//!
//! Region-partitioned response storage shared by every in-flight request.

mod record;
mod region;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use record::{RequestIdentity, StoredResponse};
pub use region::CacheRegion;
pub use stats::CacheStats;
pub use store::CacheStorage;

/// Cache storage shared across concurrent tasks.
pub type SharedStorage = Arc<RwLock<CacheStorage>>;
