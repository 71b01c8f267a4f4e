#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use meeting_assistant::components::ai::{
    ChatCompletion, CompletionRequest, SpeechRequest, SpeechSynthesis,
};
use meeting_assistant::components::google_calendar::oauth::CALENDAR_READONLY_SCOPE;
use meeting_assistant::components::google_calendar::{
    Credential, CredentialStore, EventQuery, EventsApi, EventsPage, OAuthFlow, TokenFile,
};
use meeting_assistant::error::{
    auth_error, summarization_error, synthesis_error, AssistantResult,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a calendar credential expiring `expires_in` seconds from now
pub fn credential(access_token: &str, expires_in: i64, refresh_token: Option<&str>) -> Credential {
    Credential {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at: Utc::now().timestamp() + expires_in,
        scopes: vec![CALENDAR_READONLY_SCOPE.to_string()],
        token_type: "Bearer".to_string(),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        token_uri: None,
    }
}

/// OAuth flow that never touches the network
#[derive(Default)]
pub struct StubOAuth {
    pub refresh_fails: bool,
    pub consent_fails: bool,
    pub refresh_calls: AtomicUsize,
    pub consent_calls: AtomicUsize,
}

impl StubOAuth {
    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn consents(&self) -> usize {
        self.consent_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthFlow for StubOAuth {
    async fn refresh(&self, stale: &Credential) -> AssistantResult<Credential> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fails {
            return Err(auth_error("invalid_grant: Token has been expired or revoked"));
        }
        Ok(credential(
            "refreshed-token",
            3600,
            stale.refresh_token.as_deref(),
        ))
    }

    async fn consent(&self) -> AssistantResult<Credential> {
        self.consent_calls.fetch_add(1, Ordering::SeqCst);
        if self.consent_fails {
            return Err(auth_error("Authorization was declined: access_denied"));
        }
        Ok(credential("consented-token", 3600, Some("consented-refresh")))
    }
}

/// Credential store over a token file in `dir`, optionally pre-seeded
pub async fn store_in(
    dir: &Path,
    stored: Option<&Credential>,
    oauth: Arc<StubOAuth>,
) -> (CredentialStore, TokenFile) {
    let token_file = TokenFile::new(dir.join("token.json"));
    if let Some(credential) = stored {
        token_file.save(credential).await.unwrap();
    }
    (CredentialStore::new(token_file.clone(), oauth), token_file)
}

/// Events API replaying queued responses and recording every request
#[derive(Default)]
pub struct StubEventsApi {
    responses: Mutex<VecDeque<AssistantResult<EventsPage>>>,
    pub requests: Mutex<Vec<(String, EventQuery)>>,
}

impl StubEventsApi {
    pub fn replying(responses: Vec<AssistantResult<EventsPage>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn page(json: &str) -> EventsPage {
        serde_json::from_str(json).unwrap()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }
}

#[async_trait]
impl EventsApi for StubEventsApi {
    async fn list_events(
        &self,
        credential: &Credential,
        query: &EventQuery,
    ) -> AssistantResult<EventsPage> {
        self.requests
            .lock()
            .unwrap()
            .push((credential.access_token.clone(), query.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EventsPage::default()))
    }
}

/// Chat model that fails a fixed number of times, then answers
pub struct StubChat {
    reply: String,
    failures: usize,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl StubChat {
    pub fn replying(reply: &str) -> Self {
        Self::failing_then(0, reply)
    }

    pub fn always_failing() -> Self {
        Self::failing_then(usize::MAX, "")
    }

    pub fn failing_then(failures: usize, reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failures,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletion for StubChat {
    async fn complete(&self, request: &CompletionRequest) -> AssistantResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if call < self.failures {
            return Err(summarization_error("OpenAI API request failed: 503 Service Unavailable"));
        }
        Ok(self.reply.clone())
    }
}

/// Speech provider that fails a fixed number of times, then returns audio
pub struct StubSpeech {
    audio: Vec<u8>,
    failures: usize,
    pub calls: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
}

impl StubSpeech {
    pub fn returning(audio: &[u8]) -> Self {
        Self::failing_then(0, audio)
    }

    pub fn always_failing() -> Self {
        Self::failing_then(usize::MAX, b"")
    }

    pub fn failing_then(failures: usize, audio: &[u8]) -> Self {
        Self {
            audio: audio.to_vec(),
            failures,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesis for StubSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> AssistantResult<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(request.text.clone());
        if call < self.failures {
            return Err(synthesis_error("ElevenLabs API error: HTTP 429"));
        }
        Ok(self.audio.clone())
    }
}

/// One request as seen by [`serve_once`]
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Loopback HTTP server answering exactly one request with `status` and `body`.
///
/// Returns `http://127.0.0.1:<port>` and a handle yielding the captured request.
pub fn serve_once(
    status: u16,
    content_type: &str,
    body: &[u8],
) -> (String, std::thread::JoinHandle<CapturedRequest>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let body = body.to_vec();
    let content_type = tiny_http::Header::from_bytes("Content-Type", content_type).unwrap();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut captured = CapturedRequest {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
                .collect(),
            body: String::new(),
        };
        std::io::Read::read_to_string(request.as_reader(), &mut captured.body).unwrap();

        let response = tiny_http::Response::from_data(body)
            .with_status_code(status)
            .with_header(content_type);
        request.respond(response).unwrap();
        captured
    });

    (format!("http://127.0.0.1:{}", port), handle)
}
