//! External AI backends
//!
//! Text generation, transcription and synthesis sit behind narrow traits so
//! the pipeline, the quiz scheduler and the tests can swap implementations.

mod openai;
mod stt;
mod tts;

use async_trait::async_trait;
use serde::Serialize;

pub use openai::{DEFAULT_API_BASE, OpenAiChat};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};

use crate::Result;
use crate::audio::AudioFormat;
use crate::language::LanguageProfile;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message in a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Produces text from a conversation
#[async_trait]
pub trait GenerativeTextBackend: Send + Sync {
    /// Complete the conversation and return the assistant's reply
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

/// Turns spoken audio into text
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe `audio` encoded as `format`
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String>;
}

/// Turns text into spoken audio
#[async_trait]
pub trait SpeechSynthesisBackend: Send + Sync {
    /// Speak `text` in `language`, returning MP3 bytes
    async fn synthesize(&self, text: &str, language: &LanguageProfile) -> Result<Vec<u8>>;
}
