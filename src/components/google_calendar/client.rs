use super::api::{EventQuery, EventsApi};
use super::models::{EventsPage, Meeting};
use super::time::normalize_event;
use super::token::{Credential, CredentialStore};
use crate::error::{AssistantResult, Error};
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lists upcoming meetings from one calendar.
///
/// The authenticated session is obtained lazily on first use and reused
/// until it expires or the provider rejects it.
pub struct CalendarClient {
    api: Arc<dyn EventsApi>,
    credentials: CredentialStore,
    calendar_id: String,
    timezone: Tz,
    session: Mutex<Option<Credential>>,
}

impl CalendarClient {
    pub fn new(
        api: Arc<dyn EventsApi>,
        credentials: CredentialStore,
        calendar_id: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            api,
            credentials,
            calendar_id: calendar_id.into(),
            timezone,
            session: Mutex::new(None),
        }
    }

    /// Drop the cached session so the next call goes back to the credential store
    pub async fn invalidate_session(&self) {
        *self.session.lock().await = None;
    }

    /// Fetch at most `max_results` events starting from now, ordered by start time.
    ///
    /// Provider errors are returned as-is without retrying. A rejected
    /// credential is refreshed once; if that fails the call ends with
    /// [`Error::Authentication`].
    pub async fn list_upcoming_meetings(&self, max_results: u32) -> AssistantResult<Vec<Meeting>> {
        let query = EventQuery {
            calendar_id: self.calendar_id.clone(),
            time_min: Utc::now().with_timezone(&self.timezone).to_rfc3339(),
            max_results,
            time_zone: self.timezone.name().to_string(),
        };

        let page = self.fetch_page(&query).await?;
        let meetings: Vec<Meeting> = page
            .items
            .into_iter()
            .map(|event| normalize_event(event, &self.timezone))
            .collect();

        info!("Fetched {} upcoming meetings", meetings.len());
        Ok(meetings)
    }

    async fn fetch_page(&self, query: &EventQuery) -> AssistantResult<EventsPage> {
        let mut session = self.session.lock().await;

        let credential = match session.take() {
            Some(credential) if credential.is_valid() => credential,
            _ => self.credentials.get_valid_credential().await?,
        };

        match self.api.list_events(&credential, query).await {
            Ok(page) => {
                *session = Some(credential);
                Ok(page)
            }
            Err(Error::Authentication(reason)) => {
                warn!("Calendar rejected the session, refreshing: {}", reason);
                let renewed = self.credentials.renew(&credential).await?;
                let page = self.api.list_events(&renewed, query).await?;
                *session = Some(renewed);
                Ok(page)
            }
            Err(e) => {
                *session = Some(credential);
                Err(e)
            }
        }
    }
}
