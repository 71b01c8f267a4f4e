// Export components
pub mod ai;
pub mod google_calendar;

// Re-export the clients the presentation layer talks to
pub use ai::{SpeechClient, Summarizer};
pub use google_calendar::CalendarClient;
