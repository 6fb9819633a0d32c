use super::{GatewayError, SynthesisGateway, SynthesizedAudio};
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI TTS implementation of the synthesis gateway
pub struct OpenAiGateway {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    voice: String,
}

impl OpenAiGateway {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, voice: String) -> Self {
        Self {
            client,
            model,
            voice,
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    fn voice(&self) -> Voice {
        match self.voice.to_lowercase().as_str() {
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Alloy,
        }
    }
}

#[async_trait]
impl SynthesisGateway for OpenAiGateway {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            voice = %self.voice,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice: self.voice(),
            // Opus in an Ogg container, same as the Watson default
            response_format: Some(SpeechResponseFormat::Opus),
            speed: None,
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice = %self.voice,
                "OpenAI TTS API call failed"
            );
            GatewayError::Request(format!("OpenAI TTS error: {}", e))
        })?;

        let bytes = response.bytes.to_vec();
        if bytes.is_empty() {
            return Err(GatewayError::EmptyAudio);
        }

        tracing::info!(
            provider = "openai",
            model = %self.model,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = bytes.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            bytes,
            content_type: "audio/ogg".to_string(),
        })
    }
}
