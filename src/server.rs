//! HTTP server
//!
//! Wraps the API router with request tracing, permissive CORS and a body
//! size limit, then serves it until Ctrl+C or SIGTERM.

use std::sync::Arc;

use axum::Router;
use pantrypal_storage::ChallengeStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::config::ServerConfig;

pub fn build_app(store: Arc<dyn ChallengeStore>, config: &ServerConfig) -> Router {
    let state = Arc::new(ApiState::new(store));

    api::router(state)
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub async fn run_server(store: Arc<dyn ChallengeStore>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = build_app(store, config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("PantryPal API listening on {}", addr);
    info!("  GET  /health");
    info!("  GET  /requests, POST /requests, PUT /requests/:id/(approve|decline)");
    info!("  GET  /challenges, PUT /challenges/:id/(claim|status|difficulty)");
    info!("  POST /ingredients");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
