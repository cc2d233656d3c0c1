//! Status Module
//!
//! Observer objects for version updates and connectivity. Both are built once
//! at startup and shared by reference.

mod network;
mod update;

pub use network::NetworkMonitor;
pub use update::{update_available, UpdateAnnouncer, UpdateEvent};
