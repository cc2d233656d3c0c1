//! Request Classifier
//!
//! Maps a request to the cache region and strategy that handle it. Rules are
//! evaluated in a fixed order and the first match wins.

use axum::http::Method;
use serde::Serialize;

use crate::lifecycle::CacheManifest;
use crate::proxy::{Destination, ProxyRequest};

// == Region Kind ==
/// The three region families every proxy version owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Static,
    Dynamic,
    Api,
}

impl RegionKind {
    pub const ALL: [RegionKind; 3] = [RegionKind::Static, RegionKind::Dynamic, RegionKind::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Static => "static",
            RegionKind::Dynamic => "dynamic",
            RegionKind::Api => "api",
        }
    }
}

// == Strategy Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CacheFirst,
    /// Network, then cache, then the offline document for navigations
    NetworkFirst,
}

// == Request Policy ==
/// Derived per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    pub region: RegionKind,
    pub strategy: StrategyKind,
}

impl RequestPolicy {
    pub const fn new(region: RegionKind, strategy: StrategyKind) -> Self {
        Self { region, strategy }
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Forward to the network untouched, never consult the cache
    PassThrough,
    Policy(RequestPolicy),
}

// == Request Classifier ==
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    api_marker: String,
}

impl RequestClassifier {
    /// Creates a classifier treating paths containing `api_marker` as API calls.
    pub fn new(api_marker: impl Into<String>) -> Self {
        Self {
            api_marker: api_marker.into(),
        }
    }

    /// Classifies a request against the static asset list of `manifest`.
    pub fn classify(&self, request: &ProxyRequest, manifest: &CacheManifest) -> Classification {
        if request.method != Method::GET {
            return Classification::PassThrough;
        }

        let path = request.url.path();

        let policy = if !self.api_marker.is_empty() && path.contains(&self.api_marker) {
            RequestPolicy::new(RegionKind::Api, StrategyKind::NetworkFirst)
        } else if request.destination == Destination::Image {
            RequestPolicy::new(RegionKind::Dynamic, StrategyKind::CacheFirst)
        } else if is_static_asset(path, manifest.static_assets()) {
            RequestPolicy::new(RegionKind::Static, StrategyKind::CacheFirst)
        } else {
            RequestPolicy::new(RegionKind::Dynamic, StrategyKind::NetworkFirst)
        };

        Classification::Policy(policy)
    }
}

/// Returns true when `path` ends with one of the declared asset paths.
///
/// The root document `/` only matches the root path itself.
pub fn is_static_asset(path: &str, assets: &[String]) -> bool {
    assets.iter().any(|asset| {
        if asset == "/" {
            path == "/"
        } else {
            path.ends_with(asset.as_str())
        }
    })
}
