use super::key::CacheKey;
use crate::infrastructure::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no cached audio for key '{0}'")]
    NotFound(CacheKey),
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("storage error: {0}")]
    Backend(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { .. } => StoreError::QuotaExceeded(err.to_string()),
            StorageError::Backend(msg) => StoreError::Backend(msg),
        }
    }
}
