//! Push Payload Module
//!
//! Wire shape of the JSON delivered by the push service.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// == Notification Type ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DeliveryAssignment,
    OrderUpdate,
    Promotion,
    DeliveryStatus,
    Generic,
}

impl NotificationType {
    /// Maps a wire `type` string. Unknown or missing types are `Generic`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("delivery_assignment") => NotificationType::DeliveryAssignment,
            Some("order_update") => NotificationType::OrderUpdate,
            Some("promotion") => NotificationType::Promotion,
            Some("delivery_status") => NotificationType::DeliveryStatus,
            _ => NotificationType::Generic,
        }
    }
}

/// An action button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Routing data carried by a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
}

// == Push Payload ==
/// Inbound push payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Accepted on the wire; the per-type table decides the rendered actions
    #[serde(default)]
    pub actions: Option<Vec<NotificationAction>>,
    /// Accepted on the wire; the per-type table decides the rendered value
    #[serde(default)]
    pub require_interaction: Option<bool>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

/// Accepts ids sent as either JSON numbers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_minimal() {
        let payload: PushPayload = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
        assert_eq!(payload.title, "Hi");
        assert_eq!(payload.body, "");
        assert!(payload.kind.is_none());
    }

    #[test]
    fn test_payload_ids_accept_numbers_and_strings() {
        let payload: PushPayload = serde_json::from_str(
            r#"{"title":"t","body":"b","type":"delivery_assignment","data":{"orderId":5,"deliveryId":"D-9"}}"#,
        )
        .unwrap();
        let data = payload.data.unwrap();
        assert_eq!(data.order_id.as_deref(), Some("5"));
        assert_eq!(data.delivery_id.as_deref(), Some("D-9"));
    }

    #[test]
    fn test_payload_without_title_is_rejected() {
        assert!(serde_json::from_str::<PushPayload>(r#"{"body":"b"}"#).is_err());
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(NotificationType::from_wire(Some("order_update")), NotificationType::OrderUpdate);
        assert_eq!(NotificationType::from_wire(Some("flash_sale")), NotificationType::Generic);
        assert_eq!(NotificationType::from_wire(None), NotificationType::Generic);
    }
}
