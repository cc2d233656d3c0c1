//! Network Monitor
//!
//! Tracks connectivity and notifies subscribers of transitions.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::info;

type Subscriber = Box<dyn Fn(bool) + Send + Sync>;

// == Network Monitor ==
pub struct NetworkMonitor {
    online: AtomicBool,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl NetworkMonitor {
    /// Creates a monitor with an initial connectivity state.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Registers a callback receiving the new state on every transition.
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.subscribers.write().await.push(Box::new(callback));
    }

    /// Records the observed state.
    ///
    /// Returns true if this was a transition. Subscribers are only called on
    /// transitions.
    pub async fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }

        info!(online, "Connectivity changed");
        for subscriber in self.subscribers.read().await.iter() {
            subscriber(online);
        }
        true
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
