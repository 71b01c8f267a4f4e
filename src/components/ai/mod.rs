//! Language-model summaries and speech synthesis.
//!
//! Both clients degrade instead of failing: a summary that cannot be
//! generated becomes a visible fallback text, audio that cannot be
//! synthesized becomes `None`.

pub mod elevenlabs;
pub mod openai;
pub mod speech;
pub mod summarizer;

pub use elevenlabs::ElevenLabsSpeech;
pub use openai::OpenAiChat;
pub use speech::{SpeechClient, SpeechRequest, SpeechSynthesis};
pub use summarizer::{ChatCompletion, CompletionRequest, Summarizer};
