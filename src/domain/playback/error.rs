use crate::domain::cache::CacheKey;
use crate::error::AppError;
use crate::infrastructure::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("text cannot be empty")]
    EmptyText,
    #[error("a playback is already in progress")]
    Busy,
    #[error("no cached audio for '{0}'")]
    NotFound(CacheKey),
    #[error("synthesis failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("playback was cancelled")]
    Cancelled,
    #[error("audio cache unavailable: {0}")]
    Unavailable(String),
}

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::EmptyText => AppError::BadRequest(err.to_string()),
            PlaybackError::Busy | PlaybackError::Cancelled => AppError::Conflict(err.to_string()),
            PlaybackError::NotFound(_) => AppError::NotFound(err.to_string()),
            PlaybackError::Gateway(e) => AppError::ExternalService(e.to_string()),
            PlaybackError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}
