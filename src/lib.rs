//! Offline Proxy - An offline-first caching proxy for the Siraha Bazaar storefront
//!
//! Intercepts requests in front of an origin server, answers them from
//! versioned cache regions when the network is unavailable, renders push
//! notifications and replays actions deferred while offline.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notifications;
pub mod proxy;
pub mod status;
pub mod sync;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::Config;
pub use dispatch::{EventOutcome, OfflineProxy, ProxyEvent};
pub use error::{ProxyError, Result};
pub use tasks::spawn_reconnect_watcher;
