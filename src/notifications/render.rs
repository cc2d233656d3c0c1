//! Notification Rendering
//!
//! Builds typed, actionable notifications from push payloads.

use serde::Serialize;
use tracing::warn;

use crate::notifications::{NotificationAction, NotificationData, NotificationType, PushPayload};

/// Icon and badge used when the payload names none.
pub const DEFAULT_ICON: &str = "/assets/icon2.png";

// == Notification Descriptor ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Display slot; a new notification with the same tag replaces the old one
    pub tag: String,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    /// Unix milliseconds
    pub timestamp: i64,
    pub silent: bool,
    pub data: NotificationData,
}

/// Parses and renders a raw push body.
///
/// Malformed payloads are logged and dropped.
pub fn render(raw: &[u8], now_ms: i64) -> Option<NotificationDescriptor> {
    match serde_json::from_slice::<PushPayload>(raw) {
        Ok(payload) => Some(render_payload(payload, now_ms)),
        Err(e) => {
            warn!(error = %e, "Dropping malformed push payload");
            None
        }
    }
}

/// Renders a parsed payload using the per-type table.
pub fn render_payload(payload: PushPayload, now_ms: i64) -> NotificationDescriptor {
    let kind = NotificationType::from_wire(payload.kind.as_deref());
    let tag_type = payload
        .kind
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("general");

    let (require_interaction, vibrate, actions): (bool, &[u32], &[(&str, &str)]) = match kind {
        NotificationType::DeliveryAssignment => (
            true,
            &[300, 200, 300, 200, 300],
            &[("accept", "Accept"), ("view", "View Details")],
        ),
        NotificationType::OrderUpdate => (false, &[200, 100, 200], &[("track", "Track Order")]),
        NotificationType::Promotion => (false, &[100, 50, 100], &[("view", "View Offer")]),
        NotificationType::DeliveryStatus => (false, &[200, 100, 200], &[("track", "Track Delivery")]),
        NotificationType::Generic => (false, &[], &[]),
    };

    NotificationDescriptor {
        title: payload.title,
        body: payload.body,
        icon: payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        badge: payload.badge.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        kind,
        tag: format!("siraha-{}-{}", tag_type, now_ms),
        actions: actions
            .iter()
            .map(|(action, title)| NotificationAction {
                action: action.to_string(),
                title: title.to_string(),
                icon: Some(DEFAULT_ICON.to_string()),
            })
            .collect(),
        require_interaction,
        vibrate: vibrate.to_vec(),
        timestamp: now_ms,
        silent: false,
        data: payload.data.unwrap_or_default(),
    }
}
