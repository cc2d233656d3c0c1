//! Update Announcer
//!
//! Observes proxy version changes and tells subscribers about them.

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

/// Event delivered to update subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A new version is installed and waiting for takeover
    UpdateAvailable { version: String, message: String },
    /// A version became active
    Activated { version: String },
}

type Subscriber = Box<dyn Fn(&UpdateEvent) + Send + Sync>;

// == Update Announcer ==
/// Callback registry for version changes.
///
/// Also remembers the pending update so that late pollers can still see it.
#[derive(Default)]
pub struct UpdateAnnouncer {
    subscribers: RwLock<Vec<Subscriber>>,
    pending: RwLock<Option<UpdateEvent>>,
}

impl UpdateAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked for every future event.
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().await.push(Box::new(callback));
    }

    /// Delivers an event to every subscriber.
    pub async fn announce(&self, event: UpdateEvent) {
        match &event {
            UpdateEvent::UpdateAvailable { version, .. } => {
                info!(version = %version, "Update available");
                *self.pending.write().await = Some(event.clone());
            }
            UpdateEvent::Activated { version } => {
                info!(version = %version, "Version activated");
                *self.pending.write().await = None;
            }
        }

        for subscriber in self.subscribers.read().await.iter() {
            subscriber(&event);
        }
    }

    /// The update announced but not yet activated, if any.
    pub async fn pending(&self) -> Option<UpdateEvent> {
        self.pending.read().await.clone()
    }
}

/// Builds the user-facing announcement for a newly installed version.
pub fn update_available(version: &str) -> UpdateEvent {
    UpdateEvent::UpdateAvailable {
        version: version.to_string(),
        message: "A new version of Siraha Bazaar is available!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let announcer = UpdateAnnouncer::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        announcer
            .subscribe(move |event| sink.lock().unwrap().push(event.clone()))
            .await;

        announcer.announce(update_available("v3")).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], UpdateEvent::UpdateAvailable { version, .. } if version == "v3"));
    }

    #[tokio::test]
    async fn test_activation_clears_pending() {
        let announcer = UpdateAnnouncer::new();
        announcer.announce(update_available("v3")).await;
        assert!(announcer.pending().await.is_some());

        announcer
            .announce(UpdateEvent::Activated {
                version: "v3".to_string(),
            })
            .await;
        assert!(announcer.pending().await.is_none());
    }
}
