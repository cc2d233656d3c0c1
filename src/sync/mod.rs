//! Background Sync Module
//!
//! Deferred actions recorded offline and replayed on reconnect.

mod action;
mod queue;

pub use action::{DeferredAction, NewDeferredAction, SyncReport, BACKGROUND_SYNC_TAG};
pub use queue::{DeferredActionQueue, IDEMPOTENCY_HEADER};
