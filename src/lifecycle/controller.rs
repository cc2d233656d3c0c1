//! Lifecycle Controller
//!
//! Drives a proxy version through install, waiting, activation and takeover.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use url::Url;

use crate::cache::{CacheStorage, SharedStorage, StoredResponse};
use crate::error::{ProxyError, Result};
use crate::lifecycle::CacheManifest;
use crate::proxy::{map_onto_origin, Network, ProxyRequest};
use crate::status::{update_available, UpdateAnnouncer, UpdateEvent};

// == Lifecycle State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing installed yet
    Idle,
    Installing,
    /// Installed, waiting for the previous version to retire
    Waiting,
    Activating,
    Active,
    /// The only install attempt failed and no version is active
    Redundant,
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// First deployment or reinstall of the running version: active right away
    Activated { version: String, deleted: Vec<String> },
    /// Another version is active; this one waits for takeover
    Waiting { version: String },
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleSnapshot {
    pub state: LifecycleState,
    pub active_version: Option<String>,
    pub waiting_version: Option<String>,
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    active: Option<Arc<CacheManifest>>,
    waiting: Option<Arc<CacheManifest>>,
}

// == Lifecycle Controller ==
pub struct LifecycleController {
    inner: RwLock<Inner>,
    storage: SharedStorage,
    network: Arc<dyn Network>,
    origin: Url,
    announcer: Arc<UpdateAnnouncer>,
}

impl LifecycleController {
    pub fn new(
        storage: SharedStorage,
        network: Arc<dyn Network>,
        origin: Url,
        announcer: Arc<UpdateAnnouncer>,
    ) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: LifecycleState::Idle,
                active: None,
                waiting: None,
            }),
            storage,
            network,
            origin,
            announcer,
        }
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.read().await.state
    }

    /// Manifest of the version currently serving requests.
    pub async fn active_manifest(&self) -> Option<Arc<CacheManifest>> {
        self.inner.read().await.active.clone()
    }

    pub async fn snapshot(&self) -> LifecycleSnapshot {
        let inner = self.inner.read().await;
        LifecycleSnapshot {
            state: inner.state,
            active_version: inner.active.as_ref().map(|m| m.version().to_string()),
            waiting_version: inner.waiting.as_ref().map(|m| m.version().to_string()),
        }
    }

    // == Install ==
    /// Pre-populates the static region of `manifest`.
    ///
    /// Every listed asset must fetch with a 2xx, otherwise nothing is written
    /// and the controller falls back to its previous state.
    pub async fn install(&self, manifest: CacheManifest) -> Result<InstallOutcome> {
        {
            let mut inner = self.inner.write().await;
            if matches!(inner.state, LifecycleState::Installing | LifecycleState::Activating) {
                return Err(ProxyError::InvalidRequest(format!(
                    "Cannot install {} while {:?}",
                    manifest.version(),
                    inner.state
                )));
            }
            inner.state = LifecycleState::Installing;
        }
        info!(version = manifest.version(), "Installing proxy version");

        let records = match self.fetch_assets(&manifest).await {
            Ok(records) => records,
            Err(reason) => {
                let mut inner = self.inner.write().await;
                inner.state = if inner.waiting.is_some() {
                    LifecycleState::Waiting
                } else if inner.active.is_some() {
                    LifecycleState::Active
                } else {
                    LifecycleState::Redundant
                };
                error!(version = manifest.version(), reason = %reason, "Install failed");
                return Err(ProxyError::InstallAssetFailure {
                    version: manifest.version().to_string(),
                    reason,
                });
            }
        };

        {
            let mut storage = self.storage.write().await;
            let region = manifest.static_region();
            storage.open(&region);
            for record in records {
                storage.put(&region, record)?;
            }
        }
        info!(
            version = manifest.version(),
            assets = manifest.static_assets().len(),
            "Static assets cached"
        );

        let version = manifest.version().to_string();
        let manifest = Arc::new(manifest);
        let replaces_running = {
            let mut inner = self.inner.write().await;
            inner.waiting = Some(manifest);
            inner.state = LifecycleState::Waiting;
            match &inner.active {
                None => true,
                Some(active) => active.version() == version,
            }
        };

        if replaces_running {
            let deleted = self.activate().await?;
            return Ok(InstallOutcome::Activated { version, deleted });
        }

        self.announcer.announce(update_available(&version)).await;
        Ok(InstallOutcome::Waiting { version })
    }

    /// Fetches every static asset, failing on the first unusable one.
    async fn fetch_assets(&self, manifest: &CacheManifest) -> std::result::Result<Vec<StoredResponse>, String> {
        let mut records = Vec::with_capacity(manifest.static_assets().len());
        for asset in manifest.static_assets() {
            let url = map_onto_origin(&self.origin, asset).map_err(|e| e.to_string())?;
            let request = ProxyRequest::get(url);

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| format!("{} could not be fetched: {}", asset, e))?;
            if !response.status.is_success() {
                return Err(format!("{} returned {}", asset, response.status));
            }
            records.push(response.to_stored(request.identity()));
        }
        Ok(records)
    }

    // == Activate ==
    /// Promotes the waiting version and deletes every region it does not own.
    ///
    /// Returns the names of the deleted regions.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut inner = self.inner.write().await;
        let manifest = inner
            .waiting
            .take()
            .ok_or_else(|| ProxyError::InvalidRequest("No version is waiting to activate".to_string()))?;
        inner.state = LifecycleState::Activating;

        let deleted = {
            let mut storage = self.storage.write().await;
            purge_stale_regions(&mut storage, &manifest)
        };

        let version = manifest.version().to_string();
        inner.active = Some(manifest);
        inner.state = LifecycleState::Active;
        drop(inner);

        info!(version = %version, deleted = deleted.len(), "Proxy version active");
        self.announcer.announce(UpdateEvent::Activated { version }).await;
        Ok(deleted)
    }

    // == Skip Waiting ==
    /// Forces a waiting version to take over immediately.
    ///
    /// Returns `None` when nothing is waiting.
    pub async fn skip_waiting(&self) -> Result<Option<Vec<String>>> {
        let activated = self.activate_waiting().await?;
        if activated.is_none() {
            warn!("Skip waiting requested with no waiting version");
        }
        Ok(activated)
    }

    /// Activates the waiting version once the previous one is retired.
    ///
    /// Returns `None` when nothing is waiting.
    pub async fn activate_waiting(&self) -> Result<Option<Vec<String>>> {
        if self.inner.read().await.state != LifecycleState::Waiting {
            return Ok(None);
        }
        self.activate().await.map(Some)
    }
}

/// Deletes every region not owned by `manifest`, returning their names.
pub fn purge_stale_regions(storage: &mut CacheStorage, manifest: &CacheManifest) -> Vec<String> {
    let stale = manifest.stale_regions(&storage.list_regions());
    for name in &stale {
        info!(region = %name, "Deleting old cache region");
        storage.delete_region(name);
    }
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RequestIdentity;
    use crate::test_support::StubNetwork;
    use axum::http::StatusCode;
    use proptest::prelude::*;
    use std::sync::Mutex;

    const ORIGIN: &str = "http://shop.test";
    const ASSETS: [&str; 4] = ["/", "/manifest.json", "/assets/icon2.png", "/offline.html"];

    fn manifest(version: &str) -> CacheManifest {
        CacheManifest::new(
            "siraha-bazaar",
            version,
            ASSETS.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn serve_assets(network: &StubNetwork) {
        for asset in ASSETS {
            network.respond(&format!("{}{}", ORIGIN, asset), StatusCode::OK, asset);
        }
    }

    fn setup() -> (LifecycleController, SharedStorage, Arc<StubNetwork>, Arc<UpdateAnnouncer>) {
        let storage: SharedStorage = Arc::new(RwLock::new(CacheStorage::new()));
        let network = Arc::new(StubNetwork::new());
        let announcer = Arc::new(UpdateAnnouncer::new());
        let controller = LifecycleController::new(
            storage.clone(),
            network.clone(),
            Url::parse(ORIGIN).unwrap(),
            announcer.clone(),
        );
        (controller, storage, network, announcer)
    }

    #[tokio::test]
    async fn test_first_install_activates_immediately() {
        let (controller, storage, network, _) = setup();
        serve_assets(&network);

        let outcome = controller.install(manifest("v2")).await.unwrap();

        assert!(matches!(outcome, InstallOutcome::Activated { ref version, .. } if version == "v2"));
        assert_eq!(controller.state().await, LifecycleState::Active);
        let storage = storage.read().await;
        let region = storage.region("siraha-bazaar-static-v2").unwrap();
        assert_eq!(region.len(), 4);
        assert!(region.get(&RequestIdentity::get("http://shop.test/offline.html")).is_some());
    }

    #[tokio::test]
    async fn test_install_failure_writes_nothing() {
        let (controller, storage, network, _) = setup();
        serve_assets(&network);
        network.fail("http://shop.test/manifest.json");

        let result = controller.install(manifest("v2")).await;

        assert!(matches!(result, Err(ProxyError::InstallAssetFailure { .. })));
        assert_eq!(controller.state().await, LifecycleState::Redundant);
        assert!(storage.read().await.is_empty());
        assert!(controller.active_manifest().await.is_none());
    }

    #[tokio::test]
    async fn test_install_rejects_non_success_asset() {
        let (controller, _, network, _) = setup();
        serve_assets(&network);
        network.respond("http://shop.test/assets/icon2.png", StatusCode::NOT_FOUND, "");

        let result = controller.install(manifest("v2")).await;
        assert!(matches!(result, Err(ProxyError::InstallAssetFailure { .. })));
    }

    #[tokio::test]
    async fn test_failed_upgrade_keeps_old_version_active() {
        let (controller, _, network, _) = setup();
        serve_assets(&network);
        controller.install(manifest("v2")).await.unwrap();

        network.set_offline(true);
        assert!(controller.install(manifest("v3")).await.is_err());

        assert_eq!(controller.state().await, LifecycleState::Active);
        assert_eq!(controller.active_manifest().await.unwrap().version(), "v2");
    }

    #[tokio::test]
    async fn test_upgrade_waits_and_announces() {
        let (controller, storage, network, announcer) = setup();
        serve_assets(&network);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        announcer
            .subscribe(move |event| sink.lock().unwrap().push(event.clone()))
            .await;

        controller.install(manifest("v2")).await.unwrap();
        let outcome = controller.install(manifest("v3")).await.unwrap();

        assert_eq!(outcome, InstallOutcome::Waiting { version: "v3".to_string() });
        assert_eq!(controller.state().await, LifecycleState::Waiting);
        assert_eq!(controller.active_manifest().await.unwrap().version(), "v2");
        assert!(storage.read().await.region("siraha-bazaar-static-v2").is_some());
        assert!(matches!(
            seen.lock().unwrap().last(),
            Some(UpdateEvent::UpdateAvailable { version, .. }) if version == "v3"
        ));
    }

    #[tokio::test]
    async fn test_skip_waiting_takes_over_and_purges() {
        let (controller, storage, network, _) = setup();
        serve_assets(&network);
        controller.install(manifest("v2")).await.unwrap();
        storage.write().await.open("siraha-bazaar-api-v2");
        controller.install(manifest("v3")).await.unwrap();

        let deleted = controller.skip_waiting().await.unwrap().unwrap();

        assert_eq!(deleted, vec!["siraha-bazaar-static-v2", "siraha-bazaar-api-v2"]);
        assert_eq!(controller.active_manifest().await.unwrap().version(), "v3");
        assert_eq!(storage.read().await.list_regions(), vec!["siraha-bazaar-static-v3"]);
        assert_eq!(controller.snapshot().await.waiting_version, None);
    }

    #[tokio::test]
    async fn test_skip_waiting_without_waiting_version() {
        let (controller, _, _, _) = setup();
        assert_eq!(controller.skip_waiting().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_activate_without_waiting_is_an_error() {
        let (controller, _, _, _) = setup();
        assert!(matches!(controller.activate().await, Err(ProxyError::InvalidRequest(_))));
    }

    fn region_name_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "siraha-bazaar-(static|dynamic|api)-v[1-4]",
            "siraha-bazaar-v[1-4]",
            "[a-z]{1,10}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Activation keeps exactly the regions of the current manifest.
        #[test]
        fn prop_activation_purges_only_stale(
            existing in prop::collection::vec(region_name_strategy(), 0..20),
            version in "v[1-4]"
        ) {
            let manifest = CacheManifest::new("siraha-bazaar", &version, vec![]);
            let mut storage = CacheStorage::new();
            for name in &existing {
                storage.open(name);
            }

            let deleted = purge_stale_regions(&mut storage, &manifest);

            for name in storage.list_regions() {
                prop_assert!(manifest.contains(&name), "kept stale region {}", name);
            }
            for name in &existing {
                if manifest.contains(name) {
                    prop_assert!(storage.region(name).is_some(), "deleted current region {}", name);
                } else {
                    prop_assert!(deleted.contains(name));
                }
            }
        }
    }
}
