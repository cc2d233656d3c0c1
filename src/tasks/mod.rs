//! Background Tasks Module
//!
//! Contains background tasks that run periodically during proxy operation.
//!
//! # Tasks
//! - Reconnect watcher: probes the origin and triggers background sync

mod reconnect;

pub use reconnect::{probe_once, spawn_reconnect_watcher};
