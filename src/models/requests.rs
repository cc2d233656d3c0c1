//! Request DTOs for the control API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::sync::BACKGROUND_SYNC_TAG;

/// Request body for deploying a proxy version (POST /__proxy/versions)
#[derive(Debug, Clone, Deserialize)]
pub struct InstallRequest {
    /// Version suffix for the new regions, e.g. `v3`
    pub version: String,
    /// Static assets to pre-cache, defaults to the configured list
    #[serde(default)]
    pub static_assets: Option<Vec<String>>,
}

impl InstallRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.version.trim().is_empty() {
            return Some("Version cannot be empty".to_string());
        }
        if !self
            .version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Some("Version may only contain letters, digits, '.', '_' and '-'".to_string());
        }
        if let Some(assets) = &self.static_assets {
            if let Some(bad) = assets.iter().find(|a| !a.starts_with('/')) {
                return Some(format!("Asset path '{}' must start with '/'", bad));
            }
        }
        None
    }
}

/// Request body for registering an open client window (POST /__proxy/clients)
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterClientRequest {
    /// URL the window shows, absolute or origin-relative
    pub url: String,
}

/// Request body for a reconnect signal (POST /__proxy/sync)
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    #[serde(default = "default_sync_tag")]
    pub tag: String,
}

fn default_sync_tag() -> String {
    BACKGROUND_SYNC_TAG.to_string()
}
