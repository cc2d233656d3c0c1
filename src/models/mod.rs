//! Request and Response models for the control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InstallRequest, RegisterClientRequest, SyncRequest};
pub use responses::{
    ClientClosedResponse, HealthResponse, InstallResponse, LifecycleResponse, MessageResponse,
    PushResponse, RegionsResponse, StatsResponse,
};
