//! Notifications Module
//!
//! Push payload rendering and click routing.

mod payload;
mod render;
mod router;

pub use payload::{NotificationAction, NotificationData, NotificationType, PushPayload};
pub use render::{render, render_payload, NotificationDescriptor, DEFAULT_ICON};
pub use router::{
    resolve_target, ClickOutcome, ClientRegistry, NotificationCenter, WindowClient,
    MAX_DISPLAYED_NOTIFICATIONS,
};
