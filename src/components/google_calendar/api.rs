use super::models::EventsPage;
use super::token::Credential;
use crate::error::{auth_error, fetch_error, AssistantResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Parameters of one events-list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// Lower bound for event start, RFC 3339 with offset
    pub time_min: String,
    pub max_results: u32,
    /// IANA name the provider should render times in
    pub time_zone: String,
}

/// Capability to fetch one page of calendar events.
///
/// Implementations report a rejected credential as
/// [`Error::Authentication`](crate::error::Error::Authentication) and every
/// other failure as [`Error::TransientFetch`](crate::error::Error::TransientFetch).
#[async_trait]
pub trait EventsApi: Send + Sync {
    async fn list_events(
        &self,
        credential: &Credential,
        query: &EventQuery,
    ) -> AssistantResult<EventsPage>;
}

/// Google Calendar v3 REST implementation
#[derive(Clone)]
pub struct GoogleEventsApi {
    client: Client,
    base_url: String,
}

impl GoogleEventsApi {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: GOOGLE_CALENDAR_API.to_string(),
        }
    }

    /// Point at another endpoint, e.g. a local test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the events-list URL for a query
    pub fn events_url(&self, query: &EventQuery) -> AssistantResult<Url> {
        let mut url = Url::parse(&format!("{}/", self.base_url.trim_end_matches('/')))
            .map_err(|e| fetch_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| fetch_error("Calendar API URL cannot be a base"))?
            .pop_if_empty()
            .extend(["calendars", query.calendar_id.as_str(), "events"]);

        url.query_pairs_mut()
            .append_pair("timeMin", &query.time_min)
            .append_pair("maxResults", &query.max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("timeZone", &query.time_zone);

        Ok(url)
    }
}

#[async_trait]
impl EventsApi for GoogleEventsApi {
    async fn list_events(
        &self,
        credential: &Credential,
        query: &EventQuery,
    ) -> AssistantResult<EventsPage> {
        let url = self.events_url(query)?;
        debug!("Requesting calendar events for {}", query.calendar_id);

        let response = self
            .client
            .get(url)
            .header("Authorization", credential.authorization())
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to fetch events: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            if status == StatusCode::UNAUTHORIZED {
                return Err(auth_error(&format!(
                    "Calendar API rejected credentials: {}",
                    error_body
                )));
            }
            return Err(fetch_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json::<EventsPage>()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse events response: {}", e)))
    }
}
