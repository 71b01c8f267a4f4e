use crate::error::{config_error, env_error, AssistantResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Timezone used when `TIMEZONE` is unset or invalid
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Optional file with non-secret overrides
pub const CONFIG_FILE: &str = "config/assistant.toml";

pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_MAX_RESULTS: u32 = 10;

const REQUIRED_VARS: [&str; 2] = ["OPENAI_API_KEY", "ELEVENLABS_API_KEY"];

/// Non-secret settings that may live in `config/assistant.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileOverrides {
    pub timezone: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
    pub calendar_id: Option<String>,
    pub max_results: Option<u32>,
}

impl FileOverrides {
    /// Read overrides from disk; a missing or unreadable file yields no overrides
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Main configuration structure for the assistant
#[derive(Clone)]
pub struct Config {
    /// OpenAI API key for summaries
    pub openai_api_key: String,
    /// ElevenLabs API key for speech
    pub elevenlabs_api_key: String,
    /// Timezone meetings are queried and displayed in
    pub timezone: Tz,
    /// OAuth client secret file, only read during interactive consent
    pub credentials_file: PathBuf,
    /// Persisted credential bundle
    pub token_file: PathBuf,
    /// Calendar to list events from
    pub calendar_id: String,
    /// Default number of meetings to fetch
    pub max_results: u32,
    /// Loopback port for the consent callback, 0 picks a free one
    pub redirect_port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &"<redacted>")
            .field("elevenlabs_api_key", &"<redacted>")
            .field("timezone", &self.timezone.name())
            .field("credentials_file", &self.credentials_file)
            .field("token_file", &self.token_file)
            .field("calendar_id", &self.calendar_id)
            .field("max_results", &self.max_results)
            .field("redirect_port", &self.redirect_port)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and the optional config file
    pub fn load() -> AssistantResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let overrides = FileOverrides::load(Path::new(CONFIG_FILE));
        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    /// Resolve configuration from an arbitrary variable lookup.
    ///
    /// Values from `lookup` win over `overrides`. Every missing required
    /// variable is reported at once.
    pub fn from_lookup<F>(lookup: F, overrides: FileOverrides) -> AssistantResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| value(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(env_error(&missing.join(", ")));
        }

        let openai_api_key = value("OPENAI_API_KEY").unwrap_or_default();
        let elevenlabs_api_key = value("ELEVENLABS_API_KEY").unwrap_or_default();

        let timezone = value("TIMEZONE")
            .or(overrides.timezone)
            .map(|name| parse_timezone(&name))
            .unwrap_or(DEFAULT_TIMEZONE);

        let credentials_file = value("GOOGLE_CREDENTIALS")
            .map(PathBuf::from)
            .or(overrides.credentials_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));

        let token_file = value("GOOGLE_TOKEN_FILE")
            .map(PathBuf::from)
            .or(overrides.token_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));

        let calendar_id = value("GOOGLE_CALENDAR_ID")
            .or(overrides.calendar_id)
            .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

        let max_results = overrides.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(config_error("max_results must be at least 1"));
        }

        let redirect_port = match value("OAUTH_REDIRECT_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| config_error("Invalid OAUTH_REDIRECT_PORT format"))?,
            None => 0,
        };

        Ok(Config {
            openai_api_key,
            elevenlabs_api_key,
            timezone,
            credentials_file,
            token_file,
            calendar_id,
            max_results,
            redirect_port,
        })
    }
}

/// Parse an IANA timezone name, falling back to the default on failure
pub fn parse_timezone(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(
                "Invalid TIMEZONE '{}', defaulting to {}",
                name,
                DEFAULT_TIMEZONE.name()
            );
            DEFAULT_TIMEZONE
        }
    }
}
