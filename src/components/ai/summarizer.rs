use crate::error::{summarization_error, AssistantResult, Error};
use crate::utils::{truncate_chars, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Returned instead of calling the model when there is nothing to summarize
pub const NO_CONTENT_SUMMARY: &str = "No content provided for summary generation.";

/// Only the start of long notes is sent to the model
pub const MAX_NOTES_CHARS: usize = 3000;

pub const SUMMARY_MODEL: &str = "gpt-4-turbo";
pub const SUMMARY_MAX_TOKENS: u64 = 500;
pub const SUMMARY_TEMPERATURE: f64 = 0.3;

pub const SYSTEM_PROMPT: &str = "You're an expert meeting assistant. Create a structured summary including:
- Key discussion topics
- Important decisions made
- Action items with owners
- Next steps
Format using markdown bullet points.";

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u64,
    pub temperature: f64,
}

/// Capability to complete a system + user chat exchange
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> AssistantResult<String>;
}

/// Turns freeform meeting notes into a markdown summary
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn ChatCompletion>,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn ChatCompletion>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::SUMMARY,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The request sent for `notes`
    pub fn request_for(notes: &str) -> CompletionRequest {
        CompletionRequest {
            model: SUMMARY_MODEL.to_string(),
            system: SYSTEM_PROMPT.to_string(),
            user: format!("Meeting notes:\n{}", truncate_chars(notes, MAX_NOTES_CHARS)),
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        }
    }

    /// Summarize `notes`, reporting failure as an error.
    ///
    /// Blank notes short-circuit to [`NO_CONTENT_SUMMARY`]. Failed calls are
    /// retried per the summary policy; an empty completion counts as failed.
    pub async fn try_summarize(&self, notes: &str) -> AssistantResult<String> {
        if notes.trim().is_empty() {
            return Ok(NO_CONTENT_SUMMARY.to_string());
        }

        let request = Self::request_for(notes);
        let request = &request;
        let provider = &self.provider;

        let summary = self
            .retry
            .run("Summary generation", move |attempt| async move {
                debug!("Requesting summary (attempt {})", attempt);
                let text = provider.complete(request).await?;
                if text.trim().is_empty() {
                    return Err(summarization_error("Model returned an empty completion"));
                }
                Ok(text)
            })
            .await?;

        info!("Generated summary ({} chars)", summary.chars().count());
        Ok(summary)
    }

    /// Summarize `notes`, never failing.
    ///
    /// When every attempt fails the returned text is a fallback message
    /// naming the reason, shaped so it can be displayed like a summary.
    pub async fn summarize(&self, notes: &str) -> String {
        match self.try_summarize(notes).await {
            Ok(summary) => summary,
            Err(e) => {
                error!("Summary generation failed: {}", e);
                fallback_summary(&e)
            }
        }
    }
}

/// Summary-shaped text shown when generation failed
pub fn fallback_summary(err: &Error) -> String {
    let reason = match err {
        Error::Summarization(reason) => reason.clone(),
        other => other.to_string(),
    };
    format!("⚠️ Summary generation failed: {}", reason)
}
