use crate::domain::cache::CacheKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/play
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayRequest {
    pub text: String,
}

/// Request for POST /api/stop
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StopRequest {
    /// Text currently shown to the user, when it may have changed since the play request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayed_text: Option<String>,
}

/// Where a served clip came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Hit,
    Miss,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::Hit => "hit",
            CacheSource::Miss => "miss",
        }
    }
}

/// Orchestrator state as reported by GET /api/status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Normalizing,
    Lookup,
    Hit,
    Miss,
    Serving,
}

/// One served clip, handed to the playback collaborator.
///
/// Playback ends when `session_id` is passed back to `finish`.
#[derive(Debug, Clone)]
pub struct PlayableResource {
    pub session_id: Uuid,
    pub text: String,
    pub key: CacheKey,
    pub audio: Vec<u8>,
    pub content_type: String,
    pub source: CacheSource,
    /// Whether the clip is in the store after this serve
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub key: CacheKey,
    pub text: String,
    pub last_used_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: PlaybackPhase,
}
