//! Google Calendar integration: credentials, the events API and
//! normalization of events into [`Meeting`] records.

pub mod api;
mod client;
pub mod models;
pub mod oauth;
pub mod time;
pub mod token;

pub use api::{EventQuery, EventsApi, GoogleEventsApi};
pub use client::CalendarClient;
pub use models::{CalendarEvent, EventTime, EventsPage, Meeting};
pub use oauth::{GoogleOAuth, OAuthFlow};
pub use token::{Credential, CredentialStore, TokenFile};
