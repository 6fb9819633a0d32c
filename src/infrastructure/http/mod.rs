pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{health, history::HistoryController, playback::PlaybackController};
use crate::domain::cache::AudioStore;
use crate::infrastructure::config::Config;
use request_id::request_id_middleware;

/// Build the application router with all routes configured
pub fn build_router(
    store: Arc<AudioStore>,
    playback_controller: Arc<PlaybackController>,
    history_controller: Arc<HistoryController>,
) -> Router {
    let playback_routes = Router::new()
        .route("/api/play", post(PlaybackController::play))
        .route("/api/stop", post(PlaybackController::stop))
        .route(
            "/api/playback/:session_id/complete",
            post(PlaybackController::complete),
        )
        .route("/api/status", get(PlaybackController::status))
        .with_state(playback_controller);

    let history_routes = Router::new()
        .route("/api/history", get(HistoryController::list))
        .route("/api/history/:key/play", post(HistoryController::replay))
        .with_state(history_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(store)
        .merge(playback_routes)
        .merge(history_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware))
                // The browser UI is served from a different origin
                .layer(CorsLayer::permissive()),
        )
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_http_server(config: &Config, app: Router) -> std::io::Result<()> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
