use super::oauth::{ClientSecret, OAuthFlow, TokenGrant, CALENDAR_READONLY_SCOPE};
use crate::error::{AssistantResult, Error};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Access tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// OAuth2 credential bundle persisted in the token file
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) when the access token stops working
    pub expires_at: i64,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Kept so refreshing does not need the client secret file
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Credential {
    /// Build a credential from a fresh authorization-code grant
    pub fn from_grant(grant: TokenGrant, client: &ClientSecret, now: i64) -> Self {
        let scopes = grant_scopes(&grant);
        Self {
            expires_at: now + grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            scopes,
            token_type: grant.token_type.unwrap_or_else(default_token_type),
            client_id: Some(client.client_id.clone()),
            client_secret: Some(client.client_secret.clone()),
            token_uri: Some(client.token_uri.clone()),
        }
    }

    /// Apply a refresh grant, keeping the old refresh token when none is returned
    pub fn refreshed(&self, grant: TokenGrant, now: i64) -> Self {
        let scopes = match grant.scope {
            Some(_) => grant_scopes(&grant),
            None => self.scopes.clone(),
        };
        Self {
            expires_at: now + grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
            scopes,
            token_type: grant.token_type.unwrap_or_else(|| self.token_type.clone()),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_uri: self.token_uri.clone(),
        }
    }

    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at - EXPIRY_SKEW_SECS > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now().timestamp())
    }

    pub fn is_refreshable(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

fn grant_scopes(grant: &TokenGrant) -> Vec<String> {
    match &grant.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => vec![CALENDAR_READONLY_SCOPE.to_string()],
    }
}

/// JSON file holding the persisted [`Credential`]
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credential. A missing file is `None`; so is a corrupt
    /// one, which is logged and left for the next save to overwrite.
    pub async fn load(&self) -> AssistantResult<Option<Credential>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) => {
                info!("Loaded existing credentials from {}", self.path.display());
                Ok(Some(credential))
            }
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, credential: &Credential) -> AssistantResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, json).await?;
        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

/// Owns the calendar credential: loads it, refreshes it and falls back to
/// interactive consent when nothing usable is stored.
#[derive(Clone)]
pub struct CredentialStore {
    token_file: TokenFile,
    oauth: Arc<dyn OAuthFlow>,
}

impl CredentialStore {
    pub fn new(token_file: TokenFile, oauth: Arc<dyn OAuthFlow>) -> Self {
        Self { token_file, oauth }
    }

    /// Return a usable credential, refreshing or re-consenting as needed.
    ///
    /// Any new credential is written back to the token file.
    pub async fn get_valid_credential(&self) -> AssistantResult<Credential> {
        let stored = self
            .token_file
            .load()
            .await
            .map_err(into_auth_error)?
            .filter(|credential| {
            let scoped = credential.has_scope(CALENDAR_READONLY_SCOPE);
            if !scoped {
                warn!("Stored credentials lack calendar access, requesting consent");
            }
            scoped
        });

        if let Some(credential) = stored {
            if credential.is_valid() {
                return Ok(credential);
            }

            if credential.is_refreshable() {
                match self.oauth.refresh(&credential).await {
                    Ok(refreshed) => {
                        info!("Refreshed expired credentials");
                        self.token_file.save(&refreshed).await.map_err(into_auth_error)?;
                        return Ok(refreshed);
                    }
                    Err(e) => warn!("Credential refresh failed, requesting consent: {}", e),
                }
            }
        }

        let credential = self.oauth.consent().await.map_err(into_auth_error)?;
        info!("Created new credentials via OAuth flow");
        self.token_file.save(&credential).await.map_err(into_auth_error)?;
        Ok(credential)
    }

    /// Refresh a credential the provider rejected, without interactive consent
    pub async fn renew(&self, stale: &Credential) -> AssistantResult<Credential> {
        if !stale.is_refreshable() {
            return Err(Error::Authentication(
                "Credentials were rejected and cannot be refreshed".to_string(),
            ));
        }
        let refreshed = self.oauth.refresh(stale).await.map_err(into_auth_error)?;
        self.token_file.save(&refreshed).await.map_err(into_auth_error)?;
        info!("Renewed rejected credentials");
        Ok(refreshed)
    }
}

fn into_auth_error(err: Error) -> Error {
    match err {
        Error::Authentication(_) => err,
        other => Error::Authentication(other.to_string()),
    }
}
