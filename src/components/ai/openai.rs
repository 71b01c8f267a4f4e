use super::summarizer::{ChatCompletion, CompletionRequest};
use crate::error::{summarization_error, AssistantResult};
use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::providers::openai::Client as OpenAiClient;
use serde_json::json;
use tracing::debug;

/// OpenAI chat completions through Rig
#[derive(Clone)]
pub struct OpenAiChat {
    client: OpenAiClient,
}

impl OpenAiChat {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: OpenAiClient::new(api_key),
        }
    }

    /// Talk to an OpenAI-compatible endpoint, e.g. `http://127.0.0.1:8080/v1`
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: OpenAiClient::from_url(api_key, base_url),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    async fn complete(&self, request: &CompletionRequest) -> AssistantResult<String> {
        debug!("Using OpenAI model: {}", request.model);

        let agent = self
            .client
            .agent(&request.model)
            .preamble(&request.system)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            // The OpenAI provider only forwards the output cap through additional params
            .additional_params(json!({ "max_tokens": request.max_tokens }))
            .build();

        agent
            .chat(request.user.clone(), Vec::<Message>::new())
            .await
            .map_err(|e| summarization_error(&format!("OpenAI API request failed: {}", e)))
    }
}
