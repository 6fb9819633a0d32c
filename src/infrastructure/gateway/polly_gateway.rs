use super::{GatewayError, SynthesisGateway, SynthesizedAudio};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// Voices that support the neural engine
/// Based on AWS Polly documentation
const NEURAL_VOICES: &[&str] = &[
    "Joanna", "Matthew", "Ivy", "Kendra", "Kimberly", "Salli", "Joey", "Justin", "Kevin", "Lupe",
    "Pedro", "Sergio", "Lea", "Remi", "Vicki", "Daniel", "Bianca", "Adriano", "Ines", "Camila",
    "Vitoria", "Thiago",
];

/// AWS Polly implementation of the synthesis gateway
pub struct PollyGateway {
    polly_client: Arc<PollyClient>,
    voice: String,
}

impl PollyGateway {
    pub fn new(polly_client: Arc<PollyClient>, voice: impl Into<String>) -> Self {
        Self {
            polly_client,
            voice: voice.into(),
        }
    }

    fn engine_for(voice: &str) -> Engine {
        if NEURAL_VOICES.contains(&voice) {
            Engine::Neural
        } else {
            Engine::Standard
        }
    }
}

#[async_trait]
impl SynthesisGateway for PollyGateway {
    fn provider(&self) -> &'static str {
        "polly"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError> {
        let start_time = std::time::Instant::now();
        let engine = Self::engine_for(&self.voice);

        tracing::info!(
            voice = %self.voice,
            engine = ?engine,
            output_format = "OggVorbis",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(VoiceId::from(self.voice.as_str()))
            .output_format(OutputFormat::OggVorbis)
            .engine(engine)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice = %self.voice,
                    "AWS Polly synthesize_speech failed"
                );
                GatewayError::Request(format!("AWS Polly error: {}", e))
            })?;

        let content_type = result
            .content_type()
            .unwrap_or("audio/ogg")
            .to_string();

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            GatewayError::Request(format!("failed to read audio stream: {}", e))
        })?;

        let bytes = audio_stream.into_bytes().to_vec();
        if bytes.is_empty() {
            return Err(GatewayError::EmptyAudio);
        }

        tracing::info!(
            provider = "polly",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = bytes.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            bytes,
            content_type,
        })
    }
}
