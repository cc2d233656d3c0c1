//! Lifecycle Module
//!
//! Version manifests and the install/activate/takeover state machine.

mod controller;
mod manifest;

pub use controller::{
    purge_stale_regions, InstallOutcome, LifecycleController, LifecycleSnapshot, LifecycleState,
};
pub use manifest::CacheManifest;
