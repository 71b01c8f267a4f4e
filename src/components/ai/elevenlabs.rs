use super::speech::{SpeechRequest, SpeechSynthesis};
use crate::error::{synthesis_error, AssistantResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

const ELEVENLABS_API: &str = "https://api.elevenlabs.io";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// ElevenLabs text-to-speech REST client
#[derive(Clone)]
pub struct ElevenLabsSpeech {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ElevenLabsSpeech {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: ELEVENLABS_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url.trim_end_matches('/'),
            voice_id,
            OUTPUT_FORMAT
        )
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabsSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> AssistantResult<Vec<u8>> {
        debug!(
            "Requesting {} chars of speech with model {}",
            request.text.chars().count(),
            request.model_id
        );

        let body = json!({
            "text": request.text,
            "model_id": request.model_id,
            "voice_settings": {
                "stability": request.stability,
                "similarity_boost": request.similarity_boost,
            }
        });

        let response = self
            .client
            .post(self.endpoint(&request.voice_id))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| synthesis_error(&format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(synthesis_error(&format!(
                "ElevenLabs API error: HTTP {} - {}",
                status, error_body
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| synthesis_error(&format!("Failed to read audio: {}", e)))?;
        Ok(audio.to_vec())
    }
}
