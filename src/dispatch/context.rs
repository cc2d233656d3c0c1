//! Offline Proxy Context
//!
//! One context object built at startup and shared by every consumer. All
//! inputs go through `dispatch`, which maps each event kind to its handler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::cache::{CacheStats, CacheStorage, RequestIdentity, SharedStorage};
use crate::config::Config;
use crate::dispatch::{ClientMessage, EventOutcome, NotificationClick, ProxyEvent};
use crate::error::{ProxyError, Result};
use crate::lifecycle::{CacheManifest, LifecycleController};
use crate::notifications::{self, resolve_target, ClientRegistry, NotificationCenter, WindowClient};
use crate::proxy::{
    map_onto_origin, Classification, HttpNetwork, Network, ProxyRequest, ProxyResponse, RequestClassifier,
    StrategyExecutor,
};
use crate::status::{NetworkMonitor, UpdateAnnouncer};
use crate::sync::DeferredActionQueue;

// == Offline Proxy ==
/// Shared proxy context. Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct OfflineProxy {
    pub config: Arc<Config>,
    pub origin: Url,
    pub storage: SharedStorage,
    pub network: Arc<dyn Network>,
    pub classifier: RequestClassifier,
    pub executor: StrategyExecutor,
    pub lifecycle: Arc<LifecycleController>,
    pub notifications: Arc<RwLock<NotificationCenter>>,
    pub clients: Arc<RwLock<ClientRegistry>>,
    pub sync: Arc<DeferredActionQueue>,
    pub announcer: Arc<UpdateAnnouncer>,
    pub monitor: Arc<NetworkMonitor>,
}

impl OfflineProxy {
    /// Creates a proxy using `network` for every outbound fetch.
    pub fn new(config: Config, network: Arc<dyn Network>) -> Result<Self> {
        let origin = config.origin()?;
        let offline_url = map_onto_origin(&origin, &config.offline_document)?;

        let storage: SharedStorage = Arc::new(RwLock::new(CacheStorage::new()));
        let announcer = Arc::new(UpdateAnnouncer::new());
        let executor = StrategyExecutor::new(
            storage.clone(),
            network.clone(),
            RequestIdentity::get(offline_url.as_str()),
        );
        let lifecycle = Arc::new(LifecycleController::new(
            storage.clone(),
            network.clone(),
            origin.clone(),
            announcer.clone(),
        ));
        let sync = Arc::new(DeferredActionQueue::new(network.clone(), origin.clone()));

        Ok(Self {
            classifier: RequestClassifier::new(config.api_marker.clone()),
            config: Arc::new(config),
            origin,
            storage,
            network,
            executor,
            lifecycle,
            notifications: Arc::new(RwLock::new(NotificationCenter::new())),
            clients: Arc::new(RwLock::new(ClientRegistry::new())),
            sync,
            announcer,
            monitor: Arc::new(NetworkMonitor::default()),
        })
    }

    /// Creates a proxy backed by a real HTTP client.
    pub fn from_config(config: Config) -> Result<Self> {
        let network = HttpNetwork::new(Duration::from_millis(config.fetch_timeout_ms))?;
        Self::new(config, Arc::new(network))
    }

    /// Manifest for the configured version.
    pub fn configured_manifest(&self) -> CacheManifest {
        self.config.manifest()
    }

    /// Manifest for another version sharing the configured prefix.
    pub fn manifest_for(&self, version: &str, static_assets: Option<Vec<String>>) -> CacheManifest {
        CacheManifest::new(
            &self.config.cache_prefix,
            version,
            static_assets.unwrap_or_else(|| self.config.static_assets.clone()),
        )
    }

    pub async fn stats(&self) -> CacheStats {
        self.storage.read().await.stats()
    }

    // == Dispatch ==
    /// Routes an event to its handler.
    pub async fn dispatch(&self, event: ProxyEvent) -> Result<EventOutcome> {
        debug!(event = event.kind(), "Dispatching event");
        match event {
            ProxyEvent::Install(manifest) => self.on_install(manifest).await,
            ProxyEvent::Activate => self.on_activate().await,
            ProxyEvent::Fetch(request) => self.on_fetch(request).await,
            ProxyEvent::Push(raw) => self.on_push(raw).await,
            ProxyEvent::NotificationClick(click) => self.on_notification_click(click).await,
            ProxyEvent::NotificationClose { tag } => self.on_notification_close(tag).await,
            ProxyEvent::ClientClosed { id } => self.on_client_closed(id).await,
            ProxyEvent::Sync { tag } => self.on_sync(tag).await,
            ProxyEvent::Message(message) => self.on_message(message).await,
        }
    }

    async fn on_install(&self, manifest: CacheManifest) -> Result<EventOutcome> {
        let outcome = self.lifecycle.install(manifest).await?;
        Ok(EventOutcome::Installed(outcome))
    }

    async fn on_activate(&self) -> Result<EventOutcome> {
        let deleted = self.lifecycle.activate().await?;
        Ok(EventOutcome::Activated(deleted))
    }

    async fn on_fetch(&self, request: ProxyRequest) -> Result<EventOutcome> {
        // Nothing is intercepted until a version is active
        let Some(manifest) = self.lifecycle.active_manifest().await else {
            return self.executor.pass_through(&request).await.map(EventOutcome::Response);
        };

        let response: ProxyResponse = match self.classifier.classify(&request, &manifest) {
            Classification::PassThrough => self.executor.pass_through(&request).await?,
            Classification::Policy(policy) => {
                let region = manifest.region_name(policy.region);
                self.executor.execute(policy.strategy, &request, &region).await?
            }
        };
        Ok(EventOutcome::Response(response))
    }

    async fn on_push(&self, raw: Vec<u8>) -> Result<EventOutcome> {
        let now = chrono::Utc::now().timestamp_millis();
        let descriptor = notifications::render(&raw, now);
        if let Some(descriptor) = &descriptor {
            info!(tag = %descriptor.tag, title = %descriptor.title, "Showing notification");
            self.notifications.write().await.show(descriptor.clone());
        }
        Ok(EventOutcome::Displayed(descriptor))
    }

    async fn on_notification_click(&self, click: NotificationClick) -> Result<EventOutcome> {
        let closed = match &click.tag {
            Some(tag) => self.notifications.write().await.close(tag),
            None => None,
        };
        let data = click
            .data
            .or_else(|| closed.map(|descriptor| descriptor.data))
            .unwrap_or_default();

        let target = resolve_target(&self.origin, click.action.as_deref(), &data);
        info!(action = ?click.action, target = %target, "Notification clicked");
        let outcome = self.clients.write().await.focus_or_open(&target);
        Ok(EventOutcome::Navigated(outcome))
    }

    async fn on_notification_close(&self, tag: String) -> Result<EventOutcome> {
        let closed = self.notifications.write().await.close(&tag);
        debug!(tag = %tag, found = closed.is_some(), "Notification dismissed");
        Ok(EventOutcome::Dismissed(closed))
    }

    async fn on_client_closed(&self, id: u64) -> Result<EventOutcome> {
        let (window, retired) = {
            let mut clients = self.clients.write().await;
            let window = clients.remove(id);
            (window, clients.is_empty())
        };

        // The last window referencing the old version is gone
        let activated = if window.is_some() && retired {
            self.lifecycle.activate_waiting().await?
        } else {
            None
        };
        if let Some(deleted) = &activated {
            info!(regions = deleted.len(), "Waiting version activated after last client closed");
        }
        Ok(EventOutcome::ClientClosed { window, activated })
    }

    /// Registers an open client window on `url`.
    ///
    /// Origin-relative paths are mapped onto the origin; absolute URLs must
    /// share its scheme, host and port.
    pub async fn register_client(&self, url: &str) -> Result<WindowClient> {
        let url = match Url::parse(url) {
            Ok(absolute) if absolute.origin() == self.origin.origin() => absolute,
            Ok(absolute) => {
                return Err(ProxyError::InvalidRequest(format!(
                    "Window url '{}' is not on the proxied origin",
                    absolute
                )))
            }
            Err(_) => map_onto_origin(&self.origin, url)?,
        };
        Ok(self.clients.write().await.register(url.as_str()))
    }

    async fn on_sync(&self, tag: String) -> Result<EventOutcome> {
        Ok(EventOutcome::Synced(self.sync.flush(&tag).await))
    }

    async fn on_message(&self, message: ClientMessage) -> Result<EventOutcome> {
        match message {
            ClientMessage::SkipWaiting => match self.lifecycle.skip_waiting().await? {
                Some(deleted) => Ok(EventOutcome::Activated(deleted)),
                None => Ok(EventOutcome::NothingWaiting),
            },
            ClientMessage::ClearCache => {
                let removed = self.storage.write().await.clear();
                info!(regions = removed, "Cache cleared");
                Ok(EventOutcome::Cleared(removed))
            }
        }
    }
}
