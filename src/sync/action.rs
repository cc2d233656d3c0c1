//! Deferred Action Records
//!
//! Schema of a mutation recorded while offline and replayed on reconnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag of the reconnect signal that flushes the default queue.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

// == Deferred Action ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredAction {
    pub id: u64,
    /// Sync tag that triggers replay of this action
    pub tag: String,
    /// HTTP method used on replay
    pub method: String,
    /// Origin-relative path the action is replayed against
    pub path: String,
    /// JSON body sent on replay
    pub body: Value,
    /// Sent as `Idempotency-Key` so the origin can discard repeats
    pub idempotency_key: String,
    pub enqueued_at: DateTime<Utc>,
    /// Replay attempts that ended without a definitive answer
    pub attempts: u32,
    /// Bumped when a replacement arrives while the previous payload is in
    /// flight, so the origin never discards it as a repeat
    pub revision: u32,
    /// Write sequence number, tells a mid-flush replacement apart
    #[serde(skip)]
    pub(crate) write_seq: u64,
}

impl DeferredAction {
    /// Key sent in the `Idempotency-Key` header on replay.
    pub fn replay_key(&self) -> String {
        if self.revision == 0 {
            self.idempotency_key.clone()
        } else {
            format!("{}.{}", self.idempotency_key, self.revision)
        }
    }
}

/// Request to record a deferred action.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDeferredAction {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub body: Value,
    pub idempotency_key: String,
}

fn default_tag() -> String {
    BACKGROUND_SYNC_TAG.to_string()
}

fn default_method() -> String {
    "POST".to_string()
}

impl NewDeferredAction {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.idempotency_key.trim().is_empty() {
            return Some("idempotency_key cannot be empty".to_string());
        }
        if !self.path.starts_with('/') {
            return Some("path must start with '/'".to_string());
        }
        if self.path.starts_with("//") {
            return Some("path must be origin-relative, not '//host'".to_string());
        }
        if self.tag.is_empty() {
            return Some("tag cannot be empty".to_string());
        }
        if axum::http::Method::from_bytes(self.method.as_bytes()).is_err() {
            return Some(format!("'{}' is not a valid HTTP method", self.method));
        }
        None
    }
}

/// Totals from one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub tag: String,
    /// Replayed with a 2xx and removed
    pub replayed: usize,
    /// Refused by the origin with a 4xx and removed
    pub rejected: usize,
    /// Left queued for the next reconnect
    pub retained: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_action_defaults() {
        let action: NewDeferredAction =
            serde_json::from_str(r#"{"path":"/api/cart","idempotency_key":"k1"}"#).unwrap();
        assert_eq!(action.tag, BACKGROUND_SYNC_TAG);
        assert_eq!(action.method, "POST");
        assert!(action.body.is_null());
        assert!(action.validate().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut action: NewDeferredAction =
            serde_json::from_str(r#"{"path":"/api/cart","idempotency_key":" "}"#).unwrap();
        assert!(action.validate().is_some());

        action.idempotency_key = "k".to_string();
        action.path = "api/cart".to_string();
        assert!(action.validate().is_some());

        action.path = "//evil.test/api/cart".to_string();
        assert!(action.validate().is_some());

        action.path = "/api/cart".to_string();
        action.method = "NOT A METHOD".to_string();
        assert!(action.validate().is_some());
    }

    #[test]
    fn test_replay_key_carries_revision() {
        let mut action = DeferredAction {
            id: 1,
            tag: BACKGROUND_SYNC_TAG.to_string(),
            method: "POST".to_string(),
            path: "/api/cart".to_string(),
            body: Value::Null,
            idempotency_key: "cart-3".to_string(),
            enqueued_at: Utc::now(),
            attempts: 0,
            revision: 0,
            write_seq: 1,
        };
        assert_eq!(action.replay_key(), "cart-3");

        action.revision = 2;
        assert_eq!(action.replay_key(), "cart-3.2");
    }
}
