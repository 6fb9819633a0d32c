use super::dto::{CacheSource, HistoryItem, PlayableResource, PlaybackPhase};
use super::error::PlaybackError;
use crate::domain::cache::{normalize, AudioEntry, AudioStore, CacheKey, StoreError};
use crate::domain::shared::clock::Clock;
use crate::infrastructure::gateway::SynthesisGateway;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// The single play cycle the orchestrator allows at a time
#[derive(Debug)]
enum Slot {
    Idle,
    InFlight(InFlight),
    Serving { session_id: Uuid, started_at: Instant },
}

#[derive(Debug)]
struct InFlight {
    phase: PlaybackPhase,
    text: String,
    cancellation: Option<Cancellation>,
}

#[derive(Debug)]
struct Cancellation {
    displayed_text: Option<String>,
}

/// Holds the slot for one play cycle. Dropping it before `settle` (an
/// aborted request or a panicking provider) returns the slot to idle.
struct CycleGuard<'a> {
    service: &'a PlaybackService,
    settled: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut slot = self.service.lock_slot();
        if matches!(&*slot, Slot::InFlight(_)) {
            tracing::warn!("Play request abandoned before completion - releasing playback slot");
            *slot = Slot::Idle;
        }
    }
}

/// A clip ready to be served, before a session is opened for it
struct Resolved {
    text: String,
    key: CacheKey,
    audio: Vec<u8>,
    content_type: String,
    source: CacheSource,
    cached: bool,
}

impl Resolved {
    fn from_entry(text: String, entry: AudioEntry) -> Self {
        Self {
            text,
            key: entry.key,
            audio: entry.audio_data,
            content_type: entry.content_type,
            source: CacheSource::Hit,
            cached: true,
        }
    }
}

pub struct PlaybackService {
    store: Arc<AudioStore>,
    gateway: Arc<dyn SynthesisGateway>,
    clock: Arc<dyn Clock>,
    session_timeout: Option<Duration>,
    slot: Mutex<Slot>,
}

impl PlaybackService {
    pub fn new(
        store: Arc<AudioStore>,
        gateway: Arc<dyn SynthesisGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            session_timeout: None,
            slot: Mutex::new(Slot::Idle),
        }
    }

    /// Let a new play request take over a session that was never finished
    /// after `timeout`
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }
}

#[async_trait]
pub trait PlaybackServiceApi: Send + Sync {
    /// Serve `text`, from the cache when possible.
    ///
    /// This operation:
    /// - Normalizes the text into a cache key
    /// - On a hit, records the serve and returns the cached clip
    /// - On a miss, synthesizes the literal text and writes it back
    ///
    /// The returned session stays open until `finish` is called with its id.
    async fn play(&self, text: String) -> Result<PlayableResource, PlaybackError>;

    /// Serve an entry picked from the history list. Never synthesizes.
    async fn play_saved(&self, key: CacheKey) -> Result<PlayableResource, PlaybackError>;

    /// Playback of `session_id` completed or was stopped.
    /// Returns false when the id does not match the open session.
    fn finish(&self, session_id: Uuid) -> bool;

    /// User pressed stop. An in-flight synthesis is left to finish but its
    /// result is not served; it is still cached unless `displayed_text`
    /// differs from the requested text.
    fn cancel(&self, displayed_text: Option<String>);

    /// Cached entries, most recently used first
    async fn history(&self) -> Result<Vec<HistoryItem>, PlaybackError>;

    fn state(&self) -> PlaybackPhase;
}

#[async_trait]
impl PlaybackServiceApi for PlaybackService {
    async fn play(&self, text: String) -> Result<PlayableResource, PlaybackError> {
        if text.is_empty() {
            return Err(PlaybackError::EmptyText);
        }

        let cycle = self.enter(&text)?;

        let key = normalize(&text);
        tracing::debug!(key = %key, text_length = text.len(), "Text normalized");

        let outcome = self.resolve_text(text, key).await;
        self.settle(cycle, outcome)
    }

    async fn play_saved(&self, key: CacheKey) -> Result<PlayableResource, PlaybackError> {
        let cycle = self.enter(key.as_str())?;
        let outcome = self.resolve_saved(key).await;
        self.settle(cycle, outcome)
    }

    fn finish(&self, session_id: Uuid) -> bool {
        let mut slot = self.lock_slot();
        let is_open = matches!(&*slot, Slot::Serving { session_id: open, .. } if *open == session_id);

        if is_open {
            *slot = Slot::Idle;
            tracing::debug!(session_id = %session_id, "Playback finished");
        } else {
            tracing::debug!(session_id = %session_id, "Ignoring finish for stale session");
        }
        is_open
    }

    fn cancel(&self, displayed_text: Option<String>) {
        let mut slot = self.lock_slot();
        if let Slot::InFlight(in_flight) = &mut *slot {
            tracing::info!(
                phase = ?in_flight.phase,
                "Stop requested while a play request is in flight"
            );
            in_flight.cancellation = Some(Cancellation { displayed_text });
            return;
        }

        if let Slot::Serving { session_id, .. } = &*slot {
            tracing::debug!(session_id = %session_id, "Playback stopped");
        }
        *slot = Slot::Idle;
    }

    async fn history(&self) -> Result<Vec<HistoryItem>, PlaybackError> {
        let entries = self
            .store
            .list()
            .await
            .map_err(|e| PlaybackError::Unavailable(e.to_string()))?;

        let mut items: Vec<HistoryItem> = entries
            .into_iter()
            .map(|entry| HistoryItem {
                key: entry.key,
                text: entry.source_text,
                last_used_at: entry.last_used_at,
            })
            .collect();
        items.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));

        Ok(items)
    }

    fn state(&self) -> PlaybackPhase {
        match &*self.lock_slot() {
            Slot::Idle => PlaybackPhase::Idle,
            Slot::InFlight(in_flight) => in_flight.phase,
            Slot::Serving { .. } => PlaybackPhase::Serving,
        }
    }
}

impl PlaybackService {
    async fn resolve_text(&self, text: String, key: CacheKey) -> Result<Resolved, PlaybackError> {
        self.set_phase(PlaybackPhase::Lookup);

        if let Some(entry) = self.lookup(&key).await {
            self.set_phase(PlaybackPhase::Hit);

            match self.record_serve(&entry).await {
                Ok(()) => {
                    tracing::info!(
                        key = %key,
                        cached_audio_size = entry.audio_size(),
                        "Cache hit - serving stored audio"
                    );
                    return Ok(Resolved::from_entry(text, entry));
                }
                Err(StoreError::NotFound(_)) => {
                    tracing::info!(
                        key = %key,
                        "Entry evicted before its serve was recorded - treating as miss"
                    );
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to record serve, serving anyway");
                    return Ok(Resolved::from_entry(text, entry));
                }
            }
        }

        self.set_phase(PlaybackPhase::Miss);
        self.synthesize_and_cache(text, key).await
    }

    async fn resolve_saved(&self, key: CacheKey) -> Result<Resolved, PlaybackError> {
        self.set_phase(PlaybackPhase::Lookup);

        let entry = self
            .lookup(&key)
            .await
            .ok_or_else(|| PlaybackError::NotFound(key.clone()))?;

        self.set_phase(PlaybackPhase::Hit);

        match self.record_serve(&entry).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => return Err(PlaybackError::NotFound(key)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to record serve, serving anyway");
            }
        }

        tracing::info!(key = %key, "Replaying audio from history");
        let text = entry.source_text.clone();
        Ok(Resolved::from_entry(text, entry))
    }

    async fn synthesize_and_cache(
        &self,
        text: String,
        key: CacheKey,
    ) -> Result<Resolved, PlaybackError> {
        tracing::info!(
            key = %key,
            provider = self.gateway.provider(),
            "Cache miss - requesting synthesis"
        );

        let audio = self.gateway.synthesize(&text).await.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Synthesis failed");
            PlaybackError::Gateway(e)
        })?;

        let cached = if self.should_cache() {
            self.write_back(&key, &text, audio.bytes.clone(), &audio.content_type)
                .await
                && self.keep_written(&key).await
        } else {
            tracing::info!(
                key = %key,
                "Displayed text changed after stop - discarding synthesized audio"
            );
            false
        };

        Ok(Resolved {
            text,
            key,
            audio: audio.bytes,
            content_type: audio.content_type,
            source: CacheSource::Miss,
            cached,
        })
    }

    /// Store a freshly synthesized clip. Write failures only cost the cache entry.
    async fn write_back(&self, key: &CacheKey, text: &str, bytes: Vec<u8>, content_type: &str) -> bool {
        let entry = AudioEntry::new(key.clone(), bytes, content_type, text, self.clock.now_ms());
        let audio_size = entry.audio_size();

        match self.store.put(key, entry).await {
            Ok(outcome) => {
                tracing::info!(key = %key, audio_size = audio_size, outcome = ?outcome, "TTS result cached");
                true
            }
            Err(StoreError::QuotaExceeded(msg)) => {
                tracing::warn!(
                    key = %key,
                    audio_size = audio_size,
                    reason = %msg,
                    "Storage quota exceeded - serving without caching"
                );
                false
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to cache audio - serving without caching");
                false
            }
        }
    }

    /// Undo a write-back when a stop with a different displayed text
    /// arrived while the write was in progress
    async fn keep_written(&self, key: &CacheKey) -> bool {
        if self.should_cache() {
            return true;
        }

        tracing::info!(
            key = %key,
            "Displayed text changed during write-back - removing synthesized audio"
        );
        if let Err(e) = self.store.remove(key).await {
            tracing::error!(key = %key, error = %e, "Failed to remove discarded audio");
        }
        false
    }

    async fn lookup(&self, key: &CacheKey) -> Option<AudioEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed - treating as miss");
                None
            }
        }
    }

    /// Bump recency for a serve. Skipped when a stop already arrived, and
    /// reverted when one arrives during the update, since nothing is served.
    async fn record_serve(&self, entry: &AudioEntry) -> Result<(), StoreError> {
        if self.is_cancelled() {
            return Ok(());
        }

        self.store.touch(&entry.key, self.clock.now_ms()).await?;

        if self.is_cancelled() {
            tracing::debug!(key = %entry.key, "Stop arrived during serve - restoring recency");
            self.store.touch(&entry.key, entry.last_used_at).await?;
        }
        Ok(())
    }

    /// Idle -> Normalizing, or `Busy`
    fn enter(&self, text: &str) -> Result<CycleGuard<'_>, PlaybackError> {
        let mut slot = self.lock_slot();

        match &*slot {
            Slot::Idle => {}
            Slot::Serving {
                session_id,
                started_at,
            } if self.session_expired(*started_at) => {
                tracing::warn!(session_id = %session_id, "Releasing abandoned playback session");
            }
            _ => {
                tracing::debug!("Rejecting play request while another is in progress");
                return Err(PlaybackError::Busy);
            }
        }

        *slot = Slot::InFlight(InFlight {
            phase: PlaybackPhase::Normalizing,
            text: text.to_string(),
            cancellation: None,
        });
        Ok(CycleGuard {
            service: self,
            settled: false,
        })
    }

    /// Close the in-flight cycle: open a session, or fall back to idle on
    /// failure or cancellation
    fn settle(
        &self,
        mut cycle: CycleGuard<'_>,
        outcome: Result<Resolved, PlaybackError>,
    ) -> Result<PlayableResource, PlaybackError> {
        let mut slot = self.lock_slot();
        cycle.settled = true;

        let cancelled = matches!(&*slot, Slot::InFlight(in_flight) if in_flight.cancellation.is_some());
        if cancelled {
            *slot = Slot::Idle;
            tracing::info!("Play request cancelled before serving");
            return Err(PlaybackError::Cancelled);
        }

        let resolved = match outcome {
            Ok(resolved) => resolved,
            Err(e) => {
                *slot = Slot::Idle;
                return Err(e);
            }
        };

        let session_id = Uuid::new_v4();
        *slot = Slot::Serving {
            session_id,
            started_at: Instant::now(),
        };

        tracing::debug!(
            session_id = %session_id,
            source = resolved.source.as_str(),
            cached = resolved.cached,
            "Serving audio"
        );

        Ok(PlayableResource {
            session_id,
            text: resolved.text,
            key: resolved.key,
            audio: resolved.audio,
            content_type: resolved.content_type,
            source: resolved.source,
            cached: resolved.cached,
        })
    }

    /// False only when a stop arrived together with a different displayed text
    fn should_cache(&self) -> bool {
        match &*self.lock_slot() {
            Slot::InFlight(InFlight {
                text,
                cancellation: Some(cancellation),
                ..
            }) => cancellation
                .displayed_text
                .as_deref()
                .map_or(true, |displayed| displayed == text),
            _ => true,
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(&*self.lock_slot(), Slot::InFlight(in_flight) if in_flight.cancellation.is_some())
    }

    fn set_phase(&self, phase: PlaybackPhase) {
        if let Slot::InFlight(in_flight) = &mut *self.lock_slot() {
            in_flight.phase = phase;
        }
    }

    fn session_expired(&self, started_at: Instant) -> bool {
        self.session_timeout
            .map_or(false, |timeout| started_at.elapsed() >= timeout)
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
