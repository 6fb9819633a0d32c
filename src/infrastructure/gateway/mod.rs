pub mod openai_gateway;
pub mod polly_gateway;
pub mod watson_gateway;

pub use openai_gateway::OpenAiGateway;
pub use polly_gateway::PollyGateway;
pub use watson_gateway::WatsonGateway;

use async_trait::async_trait;

/// Audio returned by a synthesis provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("synthesis request failed: {0}")]
    Request(String),
    #[error("synthesis service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("synthesis service returned no audio")]
    EmptyAudio,
    #[error("synthesis service unavailable: {0}")]
    Unavailable(String),
}

/// Remote text-to-speech service.
///
/// Implementations receive the literal user text. They own their own
/// timeouts; callers never retry.
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    /// Short provider name for logs
    fn provider(&self) -> &'static str;

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError>;
}
