//! Deferred Action Queue
//!
//! Holds offline-recorded actions and replays them when a reconnect signal
//! arrives. Replay is at-least-once: an action leaves the queue only after
//! the origin answered it definitively.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, Method};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ProxyError, Result};
use crate::proxy::{map_onto_origin, Network, ProxyRequest};
use crate::sync::{DeferredAction, NewDeferredAction, SyncReport};

/// Header carrying an action's idempotency key on replay.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayResult {
    Replayed,
    Rejected,
    Retained,
}

#[derive(Debug, Default)]
struct Pending {
    actions: VecDeque<DeferredAction>,
    next_id: u64,
    next_seq: u64,
}

// == Deferred Action Queue ==
pub struct DeferredActionQueue {
    pending: Mutex<Pending>,
    /// Serializes flushes
    flush_lock: Mutex<()>,
    network: Arc<dyn Network>,
    origin: Url,
}

impl DeferredActionQueue {
    pub fn new(network: Arc<dyn Network>, origin: Url) -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            flush_lock: Mutex::new(()),
            network,
            origin,
        }
    }

    // == Enqueue ==
    /// Records an action. An action with an already queued idempotency key
    /// replaces the queued one in place.
    pub async fn enqueue(&self, request: NewDeferredAction) -> Result<DeferredAction> {
        if let Some(message) = request.validate() {
            return Err(ProxyError::InvalidRequest(message));
        }

        let mut pending = self.pending.lock().await;
        let existing = pending
            .actions
            .iter()
            .position(|a| a.idempotency_key == request.idempotency_key);

        let (id, revision) = match existing {
            Some(index) => (pending.actions[index].id, pending.actions[index].revision),
            None => {
                pending.next_id += 1;
                (pending.next_id, 0)
            }
        };
        pending.next_seq += 1;

        let action = DeferredAction {
            id,
            tag: request.tag,
            method: request.method.to_ascii_uppercase(),
            path: request.path,
            body: request.body,
            idempotency_key: request.idempotency_key,
            enqueued_at: chrono::Utc::now(),
            attempts: 0,
            revision,
            write_seq: pending.next_seq,
        };

        match existing {
            Some(index) => pending.actions[index] = action.clone(),
            None => pending.actions.push_back(action.clone()),
        }
        debug!(id = action.id, tag = %action.tag, path = %action.path, "Deferred action queued");
        Ok(action)
    }

    /// Actions still waiting for replay, in enqueue order.
    pub async fn pending(&self) -> Vec<DeferredAction> {
        self.pending.lock().await.actions.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.actions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Flush ==
    /// Replays every action queued under `tag`, in enqueue order.
    ///
    /// The queue is not locked while requests are in flight, so actions can
    /// be recorded during a flush; they wait for the next one.
    pub async fn flush(&self, tag: &str) -> SyncReport {
        let _guard = self.flush_lock.lock().await;
        let batch: Vec<DeferredAction> = self
            .pending
            .lock()
            .await
            .actions
            .iter()
            .filter(|a| a.tag == tag)
            .cloned()
            .collect();

        let mut report = SyncReport {
            tag: tag.to_string(),
            ..SyncReport::default()
        };
        if batch.is_empty() {
            debug!(tag, "Background sync found nothing to replay");
            return report;
        }
        info!(tag, actions = batch.len(), "Background sync triggered");

        for action in batch {
            let result = self.replay(&action).await;
            let mut pending = self.pending.lock().await;
            let Some(index) = pending.actions.iter().position(|a| a.id == action.id) else {
                continue;
            };
            // A newer record with the same key arrived mid-flight. The origin
            // may already hold the old payload under this key, so the
            // replacement is kept under the next revision.
            if pending.actions[index].write_seq != action.write_seq {
                pending.actions[index].revision += 1;
                report.retained += 1;
                continue;
            }

            match result {
                ReplayResult::Replayed => {
                    pending.actions.remove(index);
                    report.replayed += 1;
                }
                ReplayResult::Rejected => {
                    pending.actions.remove(index);
                    report.rejected += 1;
                }
                ReplayResult::Retained => {
                    pending.actions[index].attempts += 1;
                    report.retained += 1;
                }
            }
        }

        info!(
            tag,
            replayed = report.replayed,
            rejected = report.rejected,
            retained = report.retained,
            "Background sync finished"
        );
        report
    }

    async fn replay(&self, action: &DeferredAction) -> ReplayResult {
        let request = match self.build_request(action) {
            Ok(request) => request,
            Err(e) => {
                warn!(id = action.id, error = %e, "Dropping unreplayable action");
                return ReplayResult::Rejected;
            }
        };

        match self.network.fetch(&request).await {
            Ok(response) if response.status.is_success() => ReplayResult::Replayed,
            Ok(response) if response.status.is_client_error() => {
                warn!(id = action.id, status = %response.status, "Origin rejected deferred action");
                ReplayResult::Rejected
            }
            Ok(response) => {
                debug!(id = action.id, status = %response.status, "Replay deferred to next sync");
                ReplayResult::Retained
            }
            Err(e) => {
                debug!(id = action.id, error = %e, "Replay failed, keeping action");
                ReplayResult::Retained
            }
        }
    }

    fn build_request(&self, action: &DeferredAction) -> Result<ProxyRequest> {
        let method = Method::from_bytes(action.method.as_bytes())
            .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
        let url = map_onto_origin(&self.origin, &action.path)?;
        let key = HeaderValue::from_str(&action.replay_key())
            .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
        let body = serde_json::to_vec(&action.body).map_err(|e| ProxyError::Internal(e.to_string()))?;

        let mut request = ProxyRequest::new(method, url).with_body(Bytes::from(body));
        request
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.headers.insert(IDEMPOTENCY_HEADER, key);
        Ok(request)
    }
}
