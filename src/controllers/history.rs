use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use super::playback::audio_response;
use crate::{
    domain::{
        cache::CacheKey,
        playback::{HistoryItem, PlaybackService, PlaybackServiceApi},
    },
    error::{AppError, AppResult},
};

pub struct HistoryController {
    playback_service: Arc<PlaybackService>,
}

impl HistoryController {
    pub fn new(playback_service: Arc<PlaybackService>) -> Self {
        Self { playback_service }
    }

    /// GET /api/history - Cached clips, most recently used first
    pub async fn list(
        State(controller): State<Arc<HistoryController>>,
    ) -> AppResult<Json<Vec<HistoryItem>>> {
        let items = controller.playback_service.history().await?;
        Ok(Json(items))
    }

    /// POST /api/history/:key/play - Replay a cached clip
    pub async fn replay(
        State(controller): State<Arc<HistoryController>>,
        Path(key): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let service = controller.playback_service.clone();
        let key = CacheKey::from_normalized(key);

        let resource = tokio::spawn(async move { service.play_saved(key).await })
            .await
            .map_err(|e| AppError::Internal(format!("playback task failed: {}", e)))??;

        audio_response(resource)
    }
}
