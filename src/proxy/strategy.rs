//! Strategy Executor
//!
//! Cache-first and network-first control flows with their fallbacks. Steps
//! within one request run strictly in order, and the storage lock is never
//! held across a network fetch.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{RequestIdentity, SharedStorage};
use crate::error::Result;
use crate::proxy::{Network, ProxyRequest, ProxyResponse, ResponseSource, StrategyKind};

// == Strategy Executor ==
#[derive(Clone)]
pub struct StrategyExecutor {
    storage: SharedStorage,
    network: Arc<dyn Network>,
    /// Identity of the document served to navigations that fail uncached
    offline_document: RequestIdentity,
}

impl StrategyExecutor {
    pub fn new(storage: SharedStorage, network: Arc<dyn Network>, offline_document: RequestIdentity) -> Self {
        Self {
            storage,
            network,
            offline_document,
        }
    }

    /// Runs `strategy` for `request`, writing successes into `region`.
    pub async fn execute(
        &self,
        strategy: StrategyKind,
        request: &ProxyRequest,
        region: &str,
    ) -> Result<ProxyResponse> {
        match strategy {
            StrategyKind::CacheFirst => self.cache_first(request, region).await,
            StrategyKind::NetworkFirst => self.network_first(request, region).await,
        }
    }

    /// Forwards a request without reading or writing any region.
    pub async fn pass_through(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        let response = self.network.fetch(request).await?;
        Ok(response.with_source(ResponseSource::PassThrough))
    }

    // == Network First ==
    /// Network, then any cached copy, then the offline document for navigations.
    pub async fn network_first(&self, request: &ProxyRequest, region: &str) -> Result<ProxyResponse> {
        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, region, &response).await;
                return Ok(response.with_source(ResponseSource::Network));
            }
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        debug!(url = %request.url, error = %error, "Network failed, trying cache");
        let identity = request.identity();
        let mut storage = self.storage.write().await;
        storage.record_network_failure();

        if let Some(cached) = storage.get(&identity) {
            return Ok(ProxyResponse::from_stored(cached, ResponseSource::Cache));
        }

        if request.navigate {
            if let Some(offline) = storage.get(&self.offline_document) {
                storage.record_offline_fallback();
                debug!(url = %request.url, "Serving offline document");
                return Ok(ProxyResponse::from_stored(offline, ResponseSource::Offline));
            }
            warn!(url = %request.url, "Offline document is not cached");
        }

        Err(error)
    }

    // == Cache First ==
    /// Any cached copy, else the network. Failures propagate with no substitute.
    pub async fn cache_first(&self, request: &ProxyRequest, region: &str) -> Result<ProxyResponse> {
        let identity = request.identity();
        let cached = self.storage.write().await.get(&identity);
        if let Some(cached) = cached {
            return Ok(ProxyResponse::from_stored(cached, ResponseSource::Cache));
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, region, &response).await;
                Ok(response.with_source(ResponseSource::Network))
            }
            Err(e) => {
                if e.is_network() {
                    self.storage.write().await.record_network_failure();
                }
                debug!(url = %request.url, error = %e, "Failed to fetch");
                Err(e)
            }
        }
    }

    /// Writes a copy of a 2xx response into `region`; anything else is skipped.
    async fn store(&self, request: &ProxyRequest, region: &str, response: &ProxyResponse) {
        if !response.status.is_success() {
            debug!(url = %request.url, status = %response.status, "Not caching non-success response");
            return;
        }

        let record = response.to_stored(request.identity());
        if let Err(e) = self.storage.write().await.put(region, record) {
            warn!(url = %request.url, error = %e, "Cache write failed");
        }
    }
}
