//! API Handlers
//!
//! The intercepting fallback handler plus the `/__proxy` control endpoints.
//! Every handler turns its input into a `ProxyEvent` or reads shared state.

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method},
    Json,
};
use url::Url;

use crate::config::Config;
use crate::dispatch::{ClientMessage, EventOutcome, NotificationClick, OfflineProxy, ProxyEvent};
use crate::error::{ProxyError, Result};
use crate::models::{
    ClientClosedResponse, HealthResponse, InstallRequest, InstallResponse, LifecycleResponse, MessageResponse,
    PushResponse, RegionsResponse, RegisterClientRequest, StatsResponse, SyncRequest,
};
use crate::notifications::{ClickOutcome, NotificationDescriptor, WindowClient};
use crate::proxy::{map_onto_origin, Destination, ProxyRequest, ProxyResponse};
use crate::sync::{DeferredAction, NewDeferredAction, SyncReport};

/// Largest request body the proxy will buffer.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Proxy context
    pub proxy: OfflineProxy,
}

impl AppState {
    /// Creates a new AppState around an existing proxy.
    pub fn new(proxy: OfflineProxy) -> Self {
        Self { proxy }
    }

    /// Creates a new AppState from configuration, with a real HTTP network.
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self::new(OfflineProxy::from_config(config)?))
    }
}

fn unexpected(outcome: EventOutcome) -> ProxyError {
    ProxyError::Internal(format!("Unexpected event outcome: {:?}", outcome))
}

// == Interception ==

/// Fallback handler: every request outside `/__proxy` is intercepted.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<ProxyResponse> {
    let request = into_proxy_request(&state.proxy.origin, request).await?;

    match state.proxy.dispatch(ProxyEvent::Fetch(request)).await? {
        EventOutcome::Response(response) => Ok(response),
        other => Err(unexpected(other)),
    }
}

/// Maps an inbound HTTP request onto the origin.
pub async fn into_proxy_request(origin: &Url, request: Request) -> Result<ProxyRequest> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = map_onto_origin(origin, path_and_query)?;

    let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| ProxyError::InvalidRequest(format!("Failed to read request body: {}", e)))?;

    let destination = header_str(&parts.headers, "sec-fetch-dest")
        .map(Destination::from_fetch_dest)
        .unwrap_or_default();
    let navigate = is_navigation(&parts.method, &parts.headers);

    let mut request = ProxyRequest::new(parts.method, url)
        .with_destination(destination)
        .with_headers(parts.headers)
        .with_body(body);
    if navigate {
        request = request.navigation();
    }
    Ok(request)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `Sec-Fetch-Mode: navigate`, or an HTML-accepting GET with no destination hint.
fn is_navigation(method: &Method, headers: &HeaderMap) -> bool {
    if let Some(mode) = header_str(headers, "sec-fetch-mode") {
        return mode.eq_ignore_ascii_case("navigate");
    }
    *method == Method::GET
        && header_str(headers, "sec-fetch-dest").is_none()
        && header_str(headers, header::ACCEPT.as_str())
            .map(|accept| accept.contains("text/html"))
            .unwrap_or(false)
}

// == Status ==

/// Handler for GET /__proxy/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let active = state
        .proxy
        .lifecycle
        .active_manifest()
        .await
        .map(|m| m.version().to_string());
    Json(HealthResponse::healthy(active))
}

/// Handler for GET /__proxy/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.proxy.stats().await))
}

/// Handler for GET /__proxy/regions
pub async fn regions_handler(State(state): State<AppState>) -> Json<RegionsResponse> {
    let regions = state.proxy.storage.read().await.list_regions();
    Json(RegionsResponse { regions })
}

// == Messages & Lifecycle ==

/// Handler for POST /__proxy/message
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<ClientMessage>,
) -> Result<Json<MessageResponse>> {
    match state.proxy.dispatch(ProxyEvent::Message(message)).await? {
        EventOutcome::Activated(deleted) => Ok(Json(MessageResponse::activated(deleted))),
        EventOutcome::NothingWaiting => Ok(Json(MessageResponse::nothing_waiting())),
        EventOutcome::Cleared(removed) => Ok(Json(MessageResponse::cleared(removed))),
        other => Err(unexpected(other)),
    }
}

/// Handler for DELETE /__proxy/cache
pub async fn clear_cache_handler(state: State<AppState>) -> Result<Json<MessageResponse>> {
    message_handler(state, Json(ClientMessage::ClearCache)).await
}

/// Handler for POST /__proxy/versions
pub async fn install_handler(
    State(state): State<AppState>,
    Json(req): Json<InstallRequest>,
) -> Result<Json<InstallResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ProxyError::InvalidRequest(error_msg));
    }

    let manifest = state.proxy.manifest_for(&req.version, req.static_assets);
    match state.proxy.dispatch(ProxyEvent::Install(manifest)).await? {
        EventOutcome::Installed(outcome) => Ok(Json(InstallResponse::from(outcome))),
        other => Err(unexpected(other)),
    }
}

/// Handler for GET /__proxy/lifecycle
pub async fn lifecycle_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    Json(LifecycleResponse {
        snapshot: state.proxy.lifecycle.snapshot().await,
        pending_update: state.proxy.announcer.pending().await,
    })
}

// == Notifications ==

/// Handler for POST /__proxy/push
///
/// Malformed payloads are dropped and reported as not displayed.
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<PushResponse>> {
    match state.proxy.dispatch(ProxyEvent::Push(body.to_vec())).await? {
        EventOutcome::Displayed(notification) => Ok(Json(PushResponse::new(notification))),
        other => Err(unexpected(other)),
    }
}

/// Handler for GET /__proxy/notifications
pub async fn notifications_handler(State(state): State<AppState>) -> Json<Vec<NotificationDescriptor>> {
    Json(state.proxy.notifications.read().await.list())
}

/// Handler for POST /__proxy/notifications/click
pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(click): Json<NotificationClick>,
) -> Result<Json<ClickOutcome>> {
    match state.proxy.dispatch(ProxyEvent::NotificationClick(click)).await? {
        EventOutcome::Navigated(outcome) => Ok(Json(outcome)),
        other => Err(unexpected(other)),
    }
}

/// Handler for DELETE /__proxy/notifications/:tag
pub async fn dismiss_notification_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<NotificationDescriptor>> {
    match state
        .proxy
        .dispatch(ProxyEvent::NotificationClose { tag: tag.clone() })
        .await?
    {
        EventOutcome::Dismissed(Some(descriptor)) => Ok(Json(descriptor)),
        EventOutcome::Dismissed(None) => Err(ProxyError::NotFound(format!("Notification {}", tag))),
        other => Err(unexpected(other)),
    }
}

// == Client Windows ==

/// Handler for GET /__proxy/clients
pub async fn list_clients_handler(State(state): State<AppState>) -> Json<Vec<WindowClient>> {
    Json(state.proxy.clients.read().await.list())
}

/// Handler for POST /__proxy/clients
pub async fn register_client_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterClientRequest>,
) -> Result<Json<WindowClient>> {
    Ok(Json(state.proxy.register_client(&req.url).await?))
}

/// Handler for DELETE /__proxy/clients/:id
///
/// Closing the last window lets a waiting version activate.
pub async fn remove_client_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ClientClosedResponse>> {
    match state.proxy.dispatch(ProxyEvent::ClientClosed { id }).await? {
        EventOutcome::ClientClosed {
            window: Some(window),
            activated,
        } => Ok(Json(ClientClosedResponse::new(window, activated))),
        EventOutcome::ClientClosed { window: None, .. } => {
            Err(ProxyError::NotFound(format!("Client {}", id)))
        }
        other => Err(unexpected(other)),
    }
}

// == Background Sync ==

/// Handler for POST /__proxy/sync/actions
pub async fn enqueue_action_handler(
    State(state): State<AppState>,
    Json(req): Json<NewDeferredAction>,
) -> Result<Json<DeferredAction>> {
    Ok(Json(state.proxy.sync.enqueue(req).await?))
}

/// Handler for GET /__proxy/sync/actions
pub async fn pending_actions_handler(State(state): State<AppState>) -> Json<Vec<DeferredAction>> {
    Json(state.proxy.sync.pending().await)
}

/// Handler for POST /__proxy/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncReport>> {
    match state.proxy.dispatch(ProxyEvent::Sync { tag: req.tag }).await? {
        EventOutcome::Synced(report) => Ok(Json(report)),
        other => Err(unexpected(other)),
    }
}
