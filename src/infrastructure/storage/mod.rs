pub mod memory_storage;
pub mod sqlite_storage;

pub use memory_storage::MemoryStorage;
pub use sqlite_storage::SqliteStorage;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("quota exceeded: write of {requested} bytes with {available} bytes available")]
    QuotaExceeded { requested: usize, available: usize },
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Durable, capacity-limited key/value byte store.
///
/// The quota covers the byte length of every key plus its value. A `set`
/// that would push the total over the quota fails with
/// `StorageError::QuotaExceeded` and leaves the previous value untouched.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    async fn len(&self) -> Result<usize, StorageError>;

    /// Readiness probe
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Bytes a record occupies against the quota
pub(crate) fn record_size(key: &str, value: &[u8]) -> usize {
    key.len() + value.len()
}
