//! Reconnect Watcher
//!
//! Background task that probes the origin and turns a return of connectivity
//! into a background sync.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::{OfflineProxy, ProxyEvent};
use crate::proxy::{map_onto_origin, ProxyRequest};
use crate::sync::BACKGROUND_SYNC_TAG;

/// Spawns a task that probes the origin every `interval_secs` seconds.
///
/// On an offline to online transition it dispatches a `background-sync`
/// event, and retries the install if no version is active yet.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_reconnect_watcher(proxy: OfflineProxy, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting reconnect watcher with interval of {} seconds", interval_secs);

        loop {
            tokio::time::sleep(interval).await;
            probe_once(&proxy).await;
        }
    })
}

/// Runs a single probe. Returns true if it observed a reconnect.
pub async fn probe_once(proxy: &OfflineProxy) -> bool {
    let url = match map_onto_origin(&proxy.origin, &proxy.config.probe_path) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Invalid probe path");
            return false;
        }
    };

    let online = proxy.network.fetch(&ProxyRequest::get(url)).await.is_ok();
    if !proxy.monitor.set_online(online).await || !online {
        debug!(online, "Connectivity unchanged");
        return false;
    }

    info!("Connectivity restored");
    if proxy.lifecycle.active_manifest().await.is_none() {
        let manifest = proxy.configured_manifest();
        if let Err(e) = proxy.dispatch(ProxyEvent::Install(manifest)).await {
            warn!(error = %e, "Install retry failed");
        }
    }
    if let Err(e) = proxy
        .dispatch(ProxyEvent::Sync {
            tag: BACKGROUND_SYNC_TAG.to_string(),
        })
        .await
    {
        warn!(error = %e, "Background sync failed");
    }
    true
}
