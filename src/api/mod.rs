//! API Module
//!
//! HTTP front of the proxy.
//!
//! # Endpoints
//! - `/__proxy/*` - Control surface (health, stats, lifecycle, push, sync)
//! - everything else - Intercepted and answered by the caching strategies

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
