use super::key::CacheKey;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// A synthesized clip as held by the audio store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEntry {
    pub key: CacheKey,
    pub audio_data: Vec<u8>,
    pub content_type: String,
    pub source_text: String,
    /// Milliseconds since the Unix epoch of the last serve
    pub last_used_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("audio field is not a base64 data URL")]
    DataUrl,
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid lastUsed timestamp: {0}")]
    Timestamp(#[from] std::num::ParseIntError),
}

/// On-disk layout of a cached clip.
///
/// `audio` is a `data:<mime>;base64,<payload>` URL and `lastUsed` is the
/// millisecond timestamp rendered as a decimal string.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    audio: String,
    #[serde(rename = "lastUsed")]
    last_used: String,
    text: String,
}

impl AudioEntry {
    pub fn new(
        key: CacheKey,
        audio_data: Vec<u8>,
        content_type: impl Into<String>,
        source_text: impl Into<String>,
        last_used_at: i64,
    ) -> Self {
        Self {
            key,
            audio_data,
            content_type: content_type.into(),
            source_text: source_text.into(),
            last_used_at,
        }
    }

    /// Size in bytes of the payload, used for logging
    pub fn audio_size(&self) -> usize {
        self.audio_data.len()
    }

    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        let record = StoredRecord {
            audio: format!(
                "data:{};base64,{}",
                self.content_type,
                STANDARD.encode(&self.audio_data)
            ),
            last_used: self.last_used_at.to_string(),
            text: self.source_text.clone(),
        };

        Ok(serde_json::to_vec(&record)?)
    }

    pub fn decode(key: CacheKey, bytes: &[u8]) -> Result<Self, RecordError> {
        let record: StoredRecord = serde_json::from_slice(bytes)?;

        let (content_type, payload) = record
            .audio
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .ok_or(RecordError::DataUrl)?;

        Ok(Self {
            key,
            audio_data: STANDARD.decode(payload)?,
            content_type: content_type.to_string(),
            source_text: record.text,
            last_used_at: record.last_used.parse()?,
        })
    }
}
