use crate::assistant::Assistant;
use crate::components::ai::{ElevenLabsSpeech, OpenAiChat, SpeechClient, Summarizer};
use crate::components::google_calendar::{
    CalendarClient, CredentialStore, GoogleEventsApi, GoogleOAuth, TokenFile,
};
use crate::config::Config;
use crate::error::{AssistantResult, Error};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Initialize logging with environment-based configuration
pub fn init_logging(verbose: bool) -> miette::Result<()> {
    let default_filter = if verbose {
        "debug,hyper=warn,reqwest=warn,rig=info"
    } else {
        "info,hyper=warn,reqwest=warn,rig=warn"
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the configuration; nothing touches the network before this succeeds
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!(
                "Using timezone {} and calendar {}",
                config.timezone.name(),
                config.calendar_id
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Shared HTTP client for every provider
pub fn http_client() -> AssistantResult<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("meeting-assistant/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))
}

/// Google OAuth flow configured from `config`
pub fn oauth_flow(config: &Config, client: Client) -> GoogleOAuth {
    GoogleOAuth::new(client, config.credentials_file.clone(), config.redirect_port)
}

/// Credential store backed by the configured token file
pub fn credential_store(config: &Config, client: Client) -> CredentialStore {
    CredentialStore::new(
        TokenFile::new(config.token_file.clone()),
        Arc::new(oauth_flow(config, client)),
    )
}

/// Wire the real providers into an [`Assistant`]
pub fn build_assistant(config: &Config) -> AssistantResult<Assistant> {
    let client = http_client()?;

    let calendar = CalendarClient::new(
        Arc::new(GoogleEventsApi::new(client.clone())),
        credential_store(config, client.clone()),
        config.calendar_id.clone(),
        config.timezone,
    );
    let summarizer = Summarizer::new(Arc::new(OpenAiChat::new(&config.openai_api_key)));
    let speech = SpeechClient::new(Arc::new(ElevenLabsSpeech::new(
        client,
        config.elevenlabs_api_key.clone(),
    )));

    Ok(Assistant::new(calendar, summarizer, speech, config.max_results))
}
