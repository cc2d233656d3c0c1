//! API Routes
//!
//! Configures the Axum router: control endpoints under `/__proxy`, everything
//! else intercepted by the proxy.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, dismiss_notification_handler, enqueue_action_handler, health_handler,
    install_handler, lifecycle_handler, list_clients_handler, message_handler,
    notification_click_handler, notifications_handler, pending_actions_handler, proxy_handler,
    push_handler, regions_handler, register_client_handler, remove_client_handler,
    stats_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let control = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/regions", get(regions_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/message", post(message_handler))
        .route("/versions", post(install_handler))
        .route("/lifecycle", get(lifecycle_handler))
        .route("/push", post(push_handler))
        .route("/notifications", get(notifications_handler))
        .route("/notifications/click", post(notification_click_handler))
        .route("/notifications/:tag", delete(dismiss_notification_handler))
        .route("/clients", get(list_clients_handler).post(register_client_handler))
        .route("/clients/:id", delete(remove_client_handler))
        .route("/sync", post(sync_handler))
        .route("/sync/actions", get(pending_actions_handler).post(enqueue_action_handler));

    Router::new()
        .nest("/__proxy", control)
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatch::OfflineProxy;
    use crate::test_support::StubNetwork;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app(network: Arc<StubNetwork>) -> Router {
        let config = Config {
            upstream_url: "http://shop.test".to_string(),
            ..Config::default()
        };
        let proxy = OfflineProxy::new(config, network).unwrap();
        create_router(AppState::new(proxy))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Arc::new(StubNetwork::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__proxy/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_path_is_proxied() {
        let network = Arc::new(StubNetwork::new());
        network.respond("http://shop.test/stores", StatusCode::OK, "stores");
        let app = create_test_app(network.clone());

        let response = app
            .oneshot(Request::builder().uri("/stores").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(network.calls(), vec!["GET http://shop.test/stores"]);
    }

    #[tokio::test]
    async fn test_network_failure_is_bad_gateway() {
        let network = Arc::new(StubNetwork::new());
        network.set_offline(true);
        let app = create_test_app(network);

        let response = app
            .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_invalid_message_rejected() {
        let app = create_test_app(Arc::new(StubNetwork::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/__proxy/message")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"RELOAD"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
