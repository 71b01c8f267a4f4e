use super::token::Credential;
use crate::error::{auth_error, AssistantResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Read-only calendar access
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// How long the loopback listener waits for the browser to come back
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth client registration from the downloaded client secret file
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parse the Google "installed" or "web" client secret layout
    pub fn parse(json: &str) -> AssistantResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| auth_error(&format!("Invalid client secret file: {}", e)))?;
        file.installed
            .or(file.web)
            .filter(|secret| !secret.client_id.is_empty() && !secret.client_secret.is_empty())
            .ok_or_else(|| auth_error("Client secret file has no usable client registration"))
    }

    pub async fn load(path: &Path) -> AssistantResult<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            auth_error(&format!(
                "Failed to read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&json)
    }
}

/// Response of the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

/// The two ways of obtaining a calendar credential
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    /// Exchange the credential's refresh token for a new access token
    async fn refresh(&self, credential: &Credential) -> AssistantResult<Credential>;

    /// Run the browser-mediated consent flow and return a new credential
    async fn consent(&self) -> AssistantResult<Credential>;
}

/// Google's installed-app OAuth flow with a loopback redirect
#[derive(Clone)]
pub struct GoogleOAuth {
    client: Client,
    credentials_file: PathBuf,
    redirect_port: u16,
}

impl GoogleOAuth {
    pub fn new(client: Client, credentials_file: impl Into<PathBuf>, redirect_port: u16) -> Self {
        Self {
            client,
            credentials_file: credentials_file.into(),
            redirect_port,
        }
    }

    async fn request_token(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
        purpose: &str,
    ) -> AssistantResult<TokenGrant> {
        let response = self
            .client
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to {}: {}", purpose, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to {}: HTTP {} - {}",
                purpose, status, error_body
            )));
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))
    }
}

#[async_trait]
impl OAuthFlow for GoogleOAuth {
    async fn refresh(&self, credential: &Credential) -> AssistantResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| auth_error("No refresh token in token data"))?;

        // Older token files may lack the client registration
        let (client_id, client_secret, token_uri) =
            match (&credential.client_id, &credential.client_secret) {
                (Some(id), Some(secret)) => (
                    id.clone(),
                    secret.clone(),
                    credential
                        .token_uri
                        .clone()
                        .unwrap_or_else(default_token_uri),
                ),
                _ => {
                    let secret = ClientSecret::load(&self.credentials_file).await?;
                    (secret.client_id, secret.client_secret, secret.token_uri)
                }
            };

        let grant = self
            .request_token(
                &token_uri,
                &[
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ],
                "refresh token",
            )
            .await?;

        let mut refreshed = credential.refreshed(grant, Utc::now().timestamp());
        refreshed.client_id = Some(client_id);
        refreshed.client_secret = Some(client_secret);
        refreshed.token_uri = Some(token_uri);
        Ok(refreshed)
    }

    async fn consent(&self) -> AssistantResult<Credential> {
        let secret = ClientSecret::load(&self.credentials_file).await?;

        let server = tiny_http::Server::http(("127.0.0.1", self.redirect_port))
            .map_err(|e| auth_error(&format!("Failed to start callback listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| auth_error("Callback listener has no TCP address"))?;
        let redirect_uri = format!("http://localhost:{}/", port);

        // The callback must echo this back
        let state = Uuid::new_v4().to_string();
        let auth_url = authorization_url(&secret, &redirect_uri, &state)?;

        info!("Opening browser for Google Calendar authorization...");
        println!(
            "Please visit this URL to authorize calendar access:\n{}",
            auth_url
        );
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            warn!("Could not open a browser: {}", e);
        }

        let code = tokio::task::spawn_blocking(move || wait_for_code(&server, &state))
            .await
            .map_err(|e| auth_error(&format!("Callback listener crashed: {}", e)))??;

        let grant = self
            .request_token(
                &secret.token_uri,
                &[
                    ("client_id", secret.client_id.as_str()),
                    ("client_secret", secret.client_secret.as_str()),
                    ("code", code.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("grant_type", "authorization_code"),
                ],
                "exchange authorization code",
            )
            .await?;

        Ok(Credential::from_grant(grant, &secret, Utc::now().timestamp()))
    }
}

/// Build the consent page URL
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    state: &str,
) -> AssistantResult<Url> {
    let mut url = Url::parse(&secret.auth_uri)
        .map_err(|e| auth_error(&format!("Invalid auth_uri: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("client_id", &secret.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", CALENDAR_READONLY_SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", state);
    Ok(url)
}

/// Outcome of one request hitting the loopback listener
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    /// Unrelated request such as `/favicon.ico`
    Ignored,
}

/// Inspect a callback request target (`/path?query`)
pub fn parse_callback(target: &str, expected_state: &str) -> AssistantResult<CallbackOutcome> {
    let base = Url::parse("http://localhost/").map_err(|e| auth_error(&e.to_string()))?;
    let url = base
        .join(target)
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(auth_error(&format!("Authorization was declined: {}", value)));
            }
            _ => {}
        }
    }

    match code {
        None => Ok(CallbackOutcome::Ignored),
        Some(_) if state.as_deref() != Some(expected_state) => {
            Err(auth_error("Authorization callback state mismatch"))
        }
        Some(code) => Ok(CallbackOutcome::Code(code)),
    }
}

fn wait_for_code(server: &tiny_http::Server, expected_state: &str) -> AssistantResult<String> {
    let deadline = Instant::now() + CONSENT_TIMEOUT;
    println!("Waiting for authorization callback...");

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(auth_error("Timed out waiting for authorization"));
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => return Err(auth_error(&format!("Callback listener failed: {}", e))),
        };

        let target = request.url().to_string();
        debug!("Authorization callback hit {}", target.split('?').next().unwrap_or(""));

        let (outcome, page) = match parse_callback(&target, expected_state) {
            Ok(CallbackOutcome::Code(code)) => (
                Ok(Some(code)),
                "Authorization successful! You can close this window.",
            ),
            Ok(CallbackOutcome::Ignored) => (Ok(None), "Waiting for authorization..."),
            Err(e) => (Err(e), "Authorization failed. You can close this window."),
        };

        if let Err(e) = request.respond(tiny_http::Response::from_string(page)) {
            warn!("Failed to answer authorization callback: {}", e);
        }

        match outcome {
            Ok(Some(code)) => return Ok(code),
            Ok(None) => continue,
            Err(e) => return Err(e),
        }
    }
}
