use super::{GatewayError, SynthesisGateway, SynthesizedAudio};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

const AUDIO_FORMAT: &str = "audio/ogg";

#[derive(Debug, Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
}

/// IBM Watson Text to Speech over its REST API
pub struct WatsonGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice: Option<String>,
}

impl WatsonGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        voice: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            voice,
        })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/v1/synthesize", self.base_url)
    }
}

#[async_trait]
impl SynthesisGateway for WatsonGateway {
    fn provider(&self) -> &'static str {
        "watson"
    }

    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            provider = "watson",
            voice = ?self.voice,
            text_length = text.len(),
            "Calling Watson synthesize"
        );

        let mut request = self
            .client
            .post(self.synthesize_url())
            .basic_auth("apikey", Some(&self.api_key))
            .header(ACCEPT, AUDIO_FORMAT)
            .json(&SynthesizeBody { text });

        if let Some(voice) = &self.voice {
            request = request.query(&[("voice", voice.as_str())]);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, provider = "watson", "Watson synthesize request failed");
            if e.is_timeout() || e.is_connect() {
                GatewayError::Unavailable(e.to_string())
            } else {
                GatewayError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Watson synthesize returned an error status"
            );
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(AUDIO_FORMAT)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Request(format!("failed to read audio body: {}", e)))?
            .to_vec();

        if bytes.is_empty() {
            return Err(GatewayError::EmptyAudio);
        }

        tracing::info!(
            provider = "watson",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = bytes.len(),
            content_type = %content_type,
            "TTS synthesis completed"
        );

        Ok(SynthesizedAudio {
            bytes,
            content_type,
        })
    }
}
