use super::{record_size, StorageBackend, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local storage backend with the same quota semantics as the SQLite one
pub struct MemoryStorage {
    records: Mutex<HashMap<String, Vec<u8>>>,
    quota_bytes: usize,
}

impl MemoryStorage {
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            quota_bytes,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Bytes currently counted against the quota
    #[cfg(test)]
    pub async fn used_bytes(&self) -> usize {
        let records = self.records.lock().await;
        records.iter().map(|(k, v)| record_size(k, v)).sum()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut records = self.records.lock().await;

        let used_by_others: usize = records
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| record_size(k, v))
            .sum();
        let requested = record_size(key, value);
        let available = self.quota_bytes.saturating_sub(used_by_others);

        if requested > available {
            return Err(StorageError::QuotaExceeded {
                requested,
                available,
            });
        }

        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.records.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.records.lock().await.keys().cloned().collect())
    }

    async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.records.lock().await.len())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
