use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use talkback::infrastructure::gateway::{GatewayError, SynthesisGateway, SynthesizedAudio};
use tokio::sync::Notify;

/// Synthesis gateway answering `audio:<text>` as Ogg audio, recording every call
#[derive(Default)]
pub struct MockGateway {
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for `release` before answering
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("audio:{}", text).into_bytes()
    }
}

#[async_trait]
impl SynthesisGateway for MockGateway {
    fn provider(&self) -> &'static str {
        "mock"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError> {
        self.calls.lock().push(text.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        Ok(SynthesizedAudio {
            bytes: Self::audio_for(text),
            content_type: "audio/ogg".to_string(),
        })
    }
}
