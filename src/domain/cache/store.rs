use super::entry::AudioEntry;
use super::error::StoreError;
use super::key::CacheKey;
use crate::infrastructure::storage::StorageBackend;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Capacity used when none is configured
pub const DEFAULT_MAX_ENTRIES: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new key was stored, after evicting the listed keys
    Inserted { evicted: Vec<CacheKey> },
    /// The key already existed and was overwritten in place
    Replaced,
}

/// Bounded audio cache with least-recently-used eviction.
///
/// The store owns every entry in its backend. Recency is never updated by
/// reads; callers record a serve with `touch` (or by `put`ting the entry).
/// The evict-then-insert sequence of `put` and the read-modify-write of
/// `touch` are serialized by `write_lock`.
pub struct AudioStore {
    backend: Arc<dyn StorageBackend>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl AudioStore {
    pub fn new(backend: Arc<dyn StorageBackend>, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up an entry. Corrupted records are purged and reported as absent.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<AudioEntry>, StoreError> {
        let Some(bytes) = self.backend.get(key.as_str()).await? else {
            return Ok(None);
        };

        match AudioEntry::decode(key.clone(), &bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Purging corrupted audio record");
                let _guard = self.write_lock.lock().await;
                self.purge_if_corrupted(key).await?;
                Ok(None)
            }
        }
    }

    /// Store an entry under `key`, evicting the least recently used entry
    /// first when a new key would exceed capacity.
    ///
    /// Fails with `StoreError::QuotaExceeded` when the backend rejects the
    /// write; evictions made before the failed write stay in effect.
    pub async fn put(&self, key: &CacheKey, mut entry: AudioEntry) -> Result<PutOutcome, StoreError> {
        entry.key = key.clone();
        let record = entry
            .encode()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let _guard = self.write_lock.lock().await;

        if self.backend.get(key.as_str()).await?.is_some() {
            self.backend.set(key.as_str(), &record).await?;
            tracing::debug!(key = %key, audio_size = entry.audio_size(), "Audio entry replaced");
            return Ok(PutOutcome::Replaced);
        }

        let mut evicted = Vec::new();
        let mut count = self.backend.len().await?;

        // Normally runs once; more only if the backend already holds more
        // records than the configured capacity
        while count >= self.capacity {
            let Some(victim) = self.least_recently_used().await? else {
                break;
            };
            self.backend.remove(victim.as_str()).await?;
            tracing::info!(
                evicted_key = %victim,
                capacity = self.capacity,
                "Evicted least recently used audio entry"
            );
            evicted.push(victim);
            count -= 1;
        }

        self.backend.set(key.as_str(), &record).await?;

        tracing::debug!(
            key = %key,
            audio_size = entry.audio_size(),
            entries = count + 1,
            "Audio entry stored"
        );

        Ok(PutOutcome::Inserted { evicted })
    }

    /// Record a serve of an existing entry
    pub async fn touch(&self, key: &CacheKey, timestamp_ms: i64) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let bytes = self
            .backend
            .get(key.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        let mut entry = match AudioEntry::decode(key.clone(), &bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Purging corrupted audio record");
                self.backend.remove(key.as_str()).await?;
                return Err(StoreError::NotFound(key.clone()));
            }
        };

        entry.last_used_at = timestamp_ms;
        let record = entry
            .encode()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.backend.set(key.as_str(), &record).await?;

        Ok(())
    }

    /// Drop an entry. Removing an absent key is not an error.
    pub async fn remove(&self, key: &CacheKey) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(key.as_str()).await?;
        tracing::debug!(key = %key, "Audio entry removed");
        Ok(())
    }

    /// Every decodable entry, in no particular order
    pub async fn list(&self) -> Result<Vec<AudioEntry>, StoreError> {
        let mut entries = Vec::new();

        for raw_key in self.backend.keys().await? {
            let key = CacheKey::from_normalized(raw_key);
            let Some(bytes) = self.backend.get(key.as_str()).await? else {
                continue;
            };
            match AudioEntry::decode(key.clone(), &bytes) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping corrupted audio record");
                }
            }
        }

        Ok(entries)
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.backend.len().await?)
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        Ok(self.backend.ping().await?)
    }

    /// Key with the smallest `last_used_at`. Corrupted records sort first.
    /// Ties resolve to whichever the backend lists first.
    async fn least_recently_used(&self) -> Result<Option<CacheKey>, StoreError> {
        let mut oldest: Option<(CacheKey, i64)> = None;

        for raw_key in self.backend.keys().await? {
            let key = CacheKey::from_normalized(raw_key);
            let Some(bytes) = self.backend.get(key.as_str()).await? else {
                continue;
            };
            let last_used_at = AudioEntry::decode(key.clone(), &bytes)
                .map(|entry| entry.last_used_at)
                .unwrap_or(i64::MIN);

            if oldest.as_ref().map_or(true, |(_, ts)| last_used_at < *ts) {
                oldest = Some((key, last_used_at));
            }
        }

        Ok(oldest.map(|(key, _)| key))
    }

    async fn purge_if_corrupted(&self, key: &CacheKey) -> Result<(), StoreError> {
        if let Some(bytes) = self.backend.get(key.as_str()).await? {
            if AudioEntry::decode(key.clone(), &bytes).is_err() {
                self.backend.remove(key.as_str()).await?;
            }
        }
        Ok(())
    }
}
