use crate::components::google_calendar::Meeting;
use crate::components::{CalendarClient, SpeechClient, Summarizer};
use crate::error::{other_error, AssistantResult};
use tracing::info;

/// What the presentation layer currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub meetings: Vec<Meeting>,
    /// Index into `meetings` of the meeting the summary belongs to
    pub selected: Option<usize>,
    pub summary: Option<String>,
    pub audio: Option<Vec<u8>>,
}

/// Ties the calendar, summary and speech clients to one user's session.
///
/// Every action runs to completion before the next one starts.
pub struct Assistant {
    calendar: CalendarClient,
    summarizer: Summarizer,
    speech: SpeechClient,
    max_results: u32,
    state: SessionState,
}

impl Assistant {
    pub fn new(
        calendar: CalendarClient,
        summarizer: Summarizer,
        speech: SpeechClient,
        max_results: u32,
    ) -> Self {
        Self {
            calendar,
            summarizer,
            speech,
            max_results,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Re-fetch the meeting list. On failure the previous list is kept.
    pub async fn refresh(&mut self) -> AssistantResult<&[Meeting]> {
        let meetings = self
            .calendar
            .list_upcoming_meetings(self.max_results)
            .await?;
        self.state.meetings = meetings;
        Ok(&self.state.meetings)
    }

    /// Fetch meetings only when none are loaded yet
    pub async fn ensure_meetings(&mut self) -> AssistantResult<&[Meeting]> {
        if self.state.meetings.is_empty() {
            return self.refresh().await;
        }
        Ok(&self.state.meetings)
    }

    /// Summarize the selected meeting's description and read the summary aloud.
    ///
    /// Only an unknown index is an error; summary and speech failures
    /// show up as fallback text and missing audio.
    pub async fn generate_summary(&mut self, index: usize) -> AssistantResult<&SessionState> {
        let description = self
            .state
            .meetings
            .get(index)
            .map(|meeting| meeting.description.clone())
            .ok_or_else(|| {
                other_error(&format!(
                    "No meeting at position {} ({} loaded)",
                    index,
                    self.state.meetings.len()
                ))
            })?;

        info!("Generating summary for meeting {}", index);
        self.state.selected = Some(index);
        self.state.audio = None;

        let summary = self.summarizer.summarize(&description).await;
        if !summary.is_empty() {
            self.state.audio = self.speech.synthesize(&summary).await;
        }
        self.state.summary = Some(summary);

        Ok(&self.state)
    }

    /// Forget the current summary, audio and selection
    pub fn clear(&mut self) {
        self.state.selected = None;
        self.state.summary = None;
        self.state.audio = None;
    }
}
