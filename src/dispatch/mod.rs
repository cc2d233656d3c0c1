//! Dispatch Module
//!
//! The event table tying every component together.

mod context;
mod event;

pub use context::OfflineProxy;
pub use event::{ClientMessage, EventOutcome, NotificationClick, ProxyEvent};
