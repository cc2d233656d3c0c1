//! Notification Router
//!
//! Tracks displayed notifications and open client windows, and turns a
//! notification click into a focused or newly opened window.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::notifications::{NotificationData, NotificationDescriptor};
use crate::proxy::map_onto_origin;

// == Target Resolution ==
/// Resolves a clicked action to an absolute navigation target.
///
/// - `accept`: delivery dashboard with an accept intent and the delivery id
/// - `track`: order tracking page when an order id is present, else home
/// - `view` and anything else: the payload url, else home
///
/// Every target stays on `origin`; a payload url on another origin goes home.
pub fn resolve_target(origin: &Url, action: Option<&str>, data: &NotificationData) -> Url {
    let home = map_onto_origin(origin, "/").unwrap_or_else(|_| origin.clone());

    match action {
        Some("accept") => {
            let mut target = match map_onto_origin(origin, "/delivery-partner/dashboard") {
                Ok(url) => url,
                Err(_) => return home,
            };
            {
                let mut query = target.query_pairs_mut();
                query.append_pair("action", "accept");
                if let Some(id) = &data.delivery_id {
                    query.append_pair("deliveryId", id);
                }
            }
            target
        }
        Some("track") => data
            .order_id
            .as_ref()
            .and_then(|id| map_onto_origin(origin, &format!("/orders/{}/tracking", id)).ok())
            .unwrap_or(home),
        _ => data
            .url
            .as_deref()
            .and_then(|url| same_origin_target(origin, url))
            .unwrap_or(home),
    }
}

fn same_origin_target(origin: &Url, url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(absolute) if absolute.origin() == origin.origin() => Some(absolute),
        Ok(_) => None,
        Err(_) => map_onto_origin(origin, url).ok(),
    }
}

// == Client Windows ==
/// An open client window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowClient {
    pub id: u64,
    pub url: String,
    pub focused: bool,
}

/// What a click did to the set of windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Focused { client_id: u64, url: String },
    Opened { client_id: u64, url: String },
}

/// Registry of open client windows.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    windows: Vec<WindowClient>,
    next_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an open window showing `url`.
    pub fn register(&mut self, url: impl Into<String>) -> WindowClient {
        self.next_id += 1;
        let client = WindowClient {
            id: self.next_id,
            url: url.into(),
            focused: false,
        };
        self.windows.push(client.clone());
        client
    }

    pub fn list(&self) -> Vec<WindowClient> {
        self.windows.clone()
    }

    /// Forgets a closed window, returning it if it was known.
    pub fn remove(&mut self, id: u64) -> Option<WindowClient> {
        let index = self.windows.iter().position(|w| w.id == id)?;
        Some(self.windows.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Gives focus to one window. Returns false for an unknown id.
    pub fn focus(&mut self, id: u64) -> bool {
        if !self.windows.iter().any(|w| w.id == id) {
            return false;
        }
        for window in &mut self.windows {
            window.focused = window.id == id;
        }
        true
    }

    /// Opens and focuses a new window on `url`.
    pub fn open_window(&mut self, url: &str) -> WindowClient {
        let client = self.register(url);
        self.focus(client.id);
        WindowClient {
            focused: true,
            ..client
        }
    }

    /// Focuses a window already showing `target`, else opens a new one.
    pub fn focus_or_open(&mut self, target: &Url) -> ClickOutcome {
        let existing = self
            .windows
            .iter()
            .find(|w| w.url == target.as_str())
            .map(|w| w.id);

        match existing {
            Some(id) => {
                self.focus(id);
                debug!(client_id = id, url = %target, "Focusing existing window");
                ClickOutcome::Focused {
                    client_id: id,
                    url: target.to_string(),
                }
            }
            None => {
                let client = self.open_window(target.as_str());
                debug!(client_id = client.id, url = %target, "Opening new window");
                ClickOutcome::Opened {
                    client_id: client.id,
                    url: client.url,
                }
            }
        }
    }
}

// == Notification Center ==
/// Most notifications kept on display at once.
pub const MAX_DISPLAYED_NOTIFICATIONS: usize = 20;

/// Notifications currently on display, one per tag, oldest first.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    displayed: VecDeque<NotificationDescriptor>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displays a notification, replacing any with the same tag.
    ///
    /// Past `MAX_DISPLAYED_NOTIFICATIONS` the oldest one is dropped.
    pub fn show(&mut self, descriptor: NotificationDescriptor) {
        self.displayed.retain(|d| d.tag != descriptor.tag);
        self.displayed.push_back(descriptor);
        while self.displayed.len() > MAX_DISPLAYED_NOTIFICATIONS {
            if let Some(evicted) = self.displayed.pop_front() {
                debug!(tag = %evicted.tag, "Dropping oldest notification");
            }
        }
    }

    /// Closes a notification, returning it if it was displayed.
    pub fn close(&mut self, tag: &str) -> Option<NotificationDescriptor> {
        let index = self.displayed.iter().position(|d| d.tag == tag)?;
        self.displayed.remove(index)
    }

    pub fn list(&self) -> Vec<NotificationDescriptor> {
        self.displayed.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }
}
