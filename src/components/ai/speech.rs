use crate::error::{synthesis_error, AssistantResult};
use crate::utils::{truncate_chars, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Longer texts are cut before synthesis
pub const MAX_SPEECH_CHARS: usize = 1000;

/// ElevenLabs premade voice "Rachel"
pub const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const SPEECH_MODEL: &str = "eleven_multilingual_v2";
pub const STABILITY: f32 = 0.7;
pub const SIMILARITY_BOOST: f32 = 0.5;

/// One text-to-speech call
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

/// Capability to turn text into compressed audio bytes
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> AssistantResult<Vec<u8>>;
}

/// Best-effort speech for summaries
#[derive(Clone)]
pub struct SpeechClient {
    provider: Arc<dyn SpeechSynthesis>,
    retry: RetryPolicy,
}

impl SpeechClient {
    pub fn new(provider: Arc<dyn SpeechSynthesis>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::SPEECH,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The request sent for `text`
    pub fn request_for(text: &str) -> SpeechRequest {
        SpeechRequest {
            text: truncate_chars(text, MAX_SPEECH_CHARS).to_string(),
            voice_id: VOICE_ID.to_string(),
            model_id: SPEECH_MODEL.to_string(),
            stability: STABILITY,
            similarity_boost: SIMILARITY_BOOST,
        }
    }

    /// Synthesize `text` into audio.
    ///
    /// Empty text is a no-op. Any failure, after retries, yields `None`.
    pub async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        if text.is_empty() {
            return None;
        }

        let request = Self::request_for(text);
        let request = &request;
        let provider = &self.provider;

        let result = self
            .retry
            .run("Speech synthesis", move |attempt| async move {
                debug!("Requesting speech (attempt {})", attempt);
                let audio = provider.synthesize(request).await?;
                if audio.is_empty() {
                    return Err(synthesis_error("Provider returned no audio"));
                }
                Ok(audio)
            })
            .await;

        match result {
            Ok(audio) => {
                info!("Synthesized {} bytes of audio", audio.len());
                Some(audio)
            }
            Err(e) => {
                error!("Speech synthesis failed: {}", e);
                None
            }
        }
    }
}
