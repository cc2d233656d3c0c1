//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;

use url::Url;

use crate::error::{ProxyError, Result};
use crate::lifecycle::CacheManifest;

/// Default static assets pre-cached at install time.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &["/", "/manifest.json", "/assets/icon2.png", "/offline.html"];

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin server every intercepted request is forwarded to
    pub upstream_url: String,
    /// Prefix shared by every cache region name
    pub cache_prefix: String,
    /// Deploy-time proxy version, drives region naming
    pub cache_version: String,
    /// Paths pre-cached into the static region at install
    pub static_assets: Vec<String>,
    /// Document served to navigations that fail with nothing cached
    pub offline_document: String,
    /// Path segment that marks API requests
    pub api_marker: String,
    /// Deadline for a single network fetch in milliseconds
    pub fetch_timeout_ms: u64,
    /// Path probed by the reconnect watcher
    pub probe_path: String,
    /// Reconnect watcher interval in seconds
    pub probe_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Origin server (default: http://127.0.0.1:5000)
    /// - `CACHE_PREFIX` - Region name prefix (default: siraha-bazaar)
    /// - `CACHE_VERSION` - Proxy version (default: v2)
    /// - `STATIC_ASSETS` - Comma separated asset paths
    /// - `OFFLINE_DOCUMENT` - Offline fallback path (default: /offline.html)
    /// - `API_MARKER` - API path marker (default: /api/)
    /// - `FETCH_TIMEOUT_MS` - Network deadline (default: 10000)
    /// - `PROBE_PATH` - Connectivity probe path (default: /)
    /// - `PROBE_INTERVAL_SECS` - Connectivity probe interval (default: 15)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            static_assets: env::var("STATIC_ASSETS")
                .ok()
                .map(|v| parse_asset_list(&v))
                .filter(|assets| !assets.is_empty())
                .unwrap_or(defaults.static_assets),
            offline_document: env::var("OFFLINE_DOCUMENT").unwrap_or(defaults.offline_document),
            api_marker: env::var("API_MARKER").unwrap_or(defaults.api_marker),
            fetch_timeout_ms: parse_var("FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch_timeout_ms),
            probe_path: env::var("PROBE_PATH").unwrap_or(defaults.probe_path),
            probe_interval: parse_var("PROBE_INTERVAL_SECS").unwrap_or(defaults.probe_interval),
        }
    }

    /// Parses the upstream URL into the origin used for request identities.
    pub fn origin(&self) -> Result<Url> {
        Url::parse(&self.upstream_url).map_err(|e| {
            ProxyError::InvalidRequest(format!("UPSTREAM_URL '{}' is invalid: {}", self.upstream_url, e))
        })
    }

    /// Builds the cache manifest for the configured version.
    pub fn manifest(&self) -> CacheManifest {
        CacheManifest::new(&self.cache_prefix, &self.cache_version, self.static_assets.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_url: "http://127.0.0.1:5000".to_string(),
            cache_prefix: "siraha-bazaar".to_string(),
            cache_version: "v2".to_string(),
            static_assets: DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            offline_document: "/offline.html".to_string(),
            api_marker: "/api/".to_string(),
            fetch_timeout_ms: 10_000,
            probe_path: "/".to_string(),
            probe_interval: 15,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Splits a comma separated asset list, dropping blanks.
pub fn parse_asset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
