//! Offline Proxy - An offline-first caching proxy for the Siraha Bazaar storefront
//!
//! Binary entry point: loads configuration, installs the configured version
//! and serves the intercepting router.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_proxy::api::{create_router, AppState};
use offline_proxy::{spawn_reconnect_watcher, Config, EventOutcome, ProxyEvent};

/// Main entry point for the offline proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the proxy context and install the configured version
/// 4. Start the reconnect watcher
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, version={}, assets={}, port={}, probe_interval={}s",
        config.upstream_url,
        config.cache_version,
        config.static_assets.len(),
        config.server_port,
        config.probe_interval
    );

    let port = config.server_port;
    let probe_interval = config.probe_interval;
    let state = AppState::from_config(config).context("failed to build proxy")?;

    // An unreachable origin leaves the proxy in pass-through until the watcher retries
    let manifest = state.proxy.configured_manifest();
    match state.proxy.dispatch(ProxyEvent::Install(manifest)).await {
        Ok(EventOutcome::Installed(outcome)) => info!(?outcome, "Initial install finished"),
        Ok(other) => warn!(?other, "Unexpected install outcome"),
        Err(e) => error!(error = %e, "Initial install failed"),
    }

    let watcher_handle = spawn_reconnect_watcher(state.proxy.clone(), probe_interval);
    info!("Reconnect watcher started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(watcher_handle))
        .await
        .context("server error")?;

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the watcher.
async fn shutdown_signal(watcher_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    watcher_handle.abort();
    warn!("Reconnect watcher aborted");
}
