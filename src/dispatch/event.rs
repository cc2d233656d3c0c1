//! Proxy Events
//!
//! Every input the proxy reacts to, and what handling it produced.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{CacheManifest, InstallOutcome};
use crate::notifications::{ClickOutcome, NotificationData, NotificationDescriptor, WindowClient};
use crate::proxy::{ProxyRequest, ProxyResponse};
use crate::sync::SyncReport;

/// Control message posted by the client application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activate a waiting version now
    SkipWaiting,
    /// Delete every cache region
    ClearCache,
}

/// A user interaction with a displayed notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationClick {
    /// Tag of the clicked notification; it is closed and its data reused
    #[serde(default)]
    pub tag: Option<String>,
    /// Clicked action, `None` for the notification body
    #[serde(default)]
    pub action: Option<String>,
    /// Routing data, overrides the displayed notification's data
    #[serde(default)]
    pub data: Option<NotificationData>,
}

// == Proxy Event ==
#[derive(Debug, Clone)]
pub enum ProxyEvent {
    Install(CacheManifest),
    Activate,
    Fetch(ProxyRequest),
    /// Raw push body as delivered by the push service
    Push(Vec<u8>),
    NotificationClick(NotificationClick),
    /// The user dismissed a notification without clicking it
    NotificationClose { tag: String },
    /// A client window was closed
    ClientClosed { id: u64 },
    Sync { tag: String },
    Message(ClientMessage),
}

impl ProxyEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyEvent::Install(_) => "install",
            ProxyEvent::Activate => "activate",
            ProxyEvent::Fetch(_) => "fetch",
            ProxyEvent::Push(_) => "push",
            ProxyEvent::NotificationClick(_) => "notificationclick",
            ProxyEvent::NotificationClose { .. } => "notificationclose",
            ProxyEvent::ClientClosed { .. } => "clientclosed",
            ProxyEvent::Sync { .. } => "sync",
            ProxyEvent::Message(_) => "message",
        }
    }
}

// == Event Outcome ==
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallOutcome),
    /// Regions deleted by an activation
    Activated(Vec<String>),
    Response(ProxyResponse),
    /// `None` when the payload was malformed and dropped
    Displayed(Option<NotificationDescriptor>),
    Navigated(ClickOutcome),
    /// `None` when no notification had that tag
    Dismissed(Option<NotificationDescriptor>),
    /// The closed window, and the regions purged if its closing let a
    /// waiting version activate
    ClientClosed {
        window: Option<WindowClient>,
        activated: Option<Vec<String>>,
    },
    Synced(SyncReport),
    /// `SKIP_WAITING` with nothing waiting
    NothingWaiting,
    /// Number of regions removed by `CLEAR_CACHE`
    Cleared(usize),
}
