use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the assistant
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Credentials are missing, revoked or the consent flow could not complete.
    /// Fatal for any calendar operation.
    #[error("Calendar authentication failed: {0}")]
    #[diagnostic(
        code(meeting_assistant::authentication),
        help("Run `get_calendar_token` to grant calendar access again")
    )]
    Authentication(String),

    /// The calendar provider answered with an error or could not be reached.
    /// Never retried internally; the caller decides whether to try again.
    #[error("Failed to fetch calendar events: {0}")]
    #[diagnostic(code(meeting_assistant::fetch))]
    TransientFetch(String),

    #[error("Summary generation failed: {0}")]
    #[diagnostic(code(meeting_assistant::summarization))]
    Summarization(String),

    #[error("Speech synthesis failed: {0}")]
    #[diagnostic(code(meeting_assistant::synthesis))]
    Synthesis(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(meeting_assistant::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(meeting_assistant::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(meeting_assistant::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(meeting_assistant::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(meeting_assistant::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AssistantResult<T> = Result<T, Error>;

/// Helper to create environment errors for missing variables
pub fn env_error(vars: &str) -> Error {
    Error::Environment(format!("Missing required environment variables: {}", vars))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Authentication(message.to_string())
}

/// Helper to create calendar fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::TransientFetch(message.to_string())
}

/// Helper to create summarization errors
pub fn summarization_error(message: &str) -> Error {
    Error::Summarization(message.to_string())
}

/// Helper to create speech synthesis errors
pub fn synthesis_error(message: &str) -> Error {
    Error::Synthesis(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
