use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::playback::{
        PlayRequest, PlayableResource, PlaybackService, PlaybackServiceApi, StatusResponse,
        StopRequest,
    },
    error::{AppError, AppResult},
};

pub const X_SESSION_ID: &str = "x-session-id";
pub const X_CACHE: &str = "x-cache";
pub const X_CACHED: &str = "x-cached";
pub const X_CACHE_KEY: &str = "x-cache-key";
pub const X_SOURCE_TEXT: &str = "x-source-text";

pub struct PlaybackController {
    playback_service: Arc<PlaybackService>,
    max_text_chars: usize,
}

impl PlaybackController {
    pub fn new(playback_service: Arc<PlaybackService>, max_text_chars: usize) -> Self {
        Self {
            playback_service,
            max_text_chars,
        }
    }

    /// POST /api/play - Serve text as audio, from the cache when possible
    pub async fn play(
        State(controller): State<Arc<PlaybackController>>,
        Json(request): Json<PlayRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        controller.validate_text(&request.text)?;

        // Detached so a dropped connection cannot leave the reentrancy guard held
        let service = controller.playback_service.clone();
        let resource = tokio::spawn(async move { service.play(request.text).await })
            .await
            .map_err(|e| AppError::Internal(format!("playback task failed: {}", e)))??;

        audio_response(resource)
    }

    /// POST /api/playback/:session_id/complete - Playback ended or was stopped by the player
    pub async fn complete(
        State(controller): State<Arc<PlaybackController>>,
        Path(session_id): Path<Uuid>,
    ) -> StatusCode {
        controller.playback_service.finish(session_id);
        StatusCode::NO_CONTENT
    }

    /// POST /api/stop - User pressed stop
    pub async fn stop(
        State(controller): State<Arc<PlaybackController>>,
        request: Option<Json<StopRequest>>,
    ) -> StatusCode {
        let displayed_text = request.and_then(|Json(r)| r.displayed_text);
        controller.playback_service.cancel(displayed_text);
        StatusCode::NO_CONTENT
    }

    /// GET /api/status - Current orchestrator state
    pub async fn status(State(controller): State<Arc<PlaybackController>>) -> Json<StatusResponse> {
        Json(StatusResponse {
            state: controller.playback_service.state(),
        })
    }

    fn validate_text(&self, text: &str) -> AppResult<()> {
        if text.is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }

        if text.chars().count() > self.max_text_chars {
            return Err(AppError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                self.max_text_chars
            )));
        }

        Ok(())
    }
}

/// Audio body plus the session and cache headers the player needs
pub(crate) fn audio_response(resource: PlayableResource) -> AppResult<(StatusCode, HeaderMap, Body)> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&resource.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(X_SESSION_ID, header_value(&resource.session_id.to_string())?);
    headers.insert(X_CACHE, HeaderValue::from_static(resource.source.as_str()));
    headers.insert(
        X_CACHED,
        HeaderValue::from_static(if resource.cached { "true" } else { "false" }),
    );
    headers.insert(
        X_CACHE_KEY,
        header_value(&urlencoding::encode(resource.key.as_str()))?,
    );
    headers.insert(
        X_SOURCE_TEXT,
        header_value(&urlencoding::encode(&resource.text))?,
    );

    Ok((StatusCode::OK, headers, Body::from(resource.audio)))
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("invalid header value: {}", e)))
}
