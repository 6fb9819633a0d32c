use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::cache::AudioStore;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(store): State<Arc<AudioStore>>) -> impl IntoResponse {
    match store.len().await {
        Ok(entries) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "storage": "connected",
                "entries": entries,
                "capacity": store.capacity()
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Audio storage readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "storage": "disconnected"
                })),
            )
        }
    }
}
