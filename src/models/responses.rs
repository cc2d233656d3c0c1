//! Response DTOs for the control API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::lifecycle::{InstallOutcome, LifecycleSnapshot, LifecycleState};
use crate::notifications::{NotificationDescriptor, WindowClient};
use crate::status::UpdateEvent;

/// Response body for the health endpoint (GET /__proxy/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Version currently intercepting requests
    pub active_version: Option<String>,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(active_version: Option<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            active_version,
        }
    }
}

/// Response body for the stats endpoint (GET /__proxy/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for GET /__proxy/regions
#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

/// Response body for control messages and cache clearing
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// What the message did: `activated`, `nothing_waiting` or `cleared`
    pub result: String,
    /// Regions deleted by an activation or a clear
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted_regions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions_removed: Option<usize>,
}

impl MessageResponse {
    pub fn activated(deleted_regions: Vec<String>) -> Self {
        Self {
            result: "activated".to_string(),
            deleted_regions,
            regions_removed: None,
        }
    }

    pub fn nothing_waiting() -> Self {
        Self {
            result: "nothing_waiting".to_string(),
            deleted_regions: Vec::new(),
            regions_removed: None,
        }
    }

    pub fn cleared(regions_removed: usize) -> Self {
        Self {
            result: "cleared".to_string(),
            deleted_regions: Vec::new(),
            regions_removed: Some(regions_removed),
        }
    }
}

/// Response body for POST /__proxy/versions
#[derive(Debug, Clone, Serialize)]
pub struct InstallResponse {
    pub version: String,
    pub state: LifecycleState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted_regions: Vec<String>,
}

impl From<InstallOutcome> for InstallResponse {
    fn from(outcome: InstallOutcome) -> Self {
        match outcome {
            InstallOutcome::Activated { version, deleted } => Self {
                version,
                state: LifecycleState::Active,
                deleted_regions: deleted,
            },
            InstallOutcome::Waiting { version } => Self {
                version,
                state: LifecycleState::Waiting,
                deleted_regions: Vec::new(),
            },
        }
    }
}

/// Response body for GET /__proxy/lifecycle
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleResponse {
    #[serde(flatten)]
    pub snapshot: LifecycleSnapshot,
    /// Announced update still waiting for takeover
    pub pending_update: Option<UpdateEvent>,
}

/// Response body for POST /__proxy/push
#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub displayed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationDescriptor>,
}

impl PushResponse {
    pub fn new(notification: Option<NotificationDescriptor>) -> Self {
        Self {
            displayed: notification.is_some(),
            notification,
        }
    }
}

/// Response body for DELETE /__proxy/clients/:id
#[derive(Debug, Clone, Serialize)]
pub struct ClientClosedResponse {
    pub id: u64,
    pub url: String,
    /// True when closing this window let the waiting version take over
    pub activated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted_regions: Vec<String>,
}

impl ClientClosedResponse {
    pub fn new(window: WindowClient, activated: Option<Vec<String>>) -> Self {
        Self {
            id: window.id,
            url: window.url,
            activated: activated.is_some(),
            deleted_regions: activated.unwrap_or_default(),
        }
    }
}
