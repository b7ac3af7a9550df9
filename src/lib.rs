//! Polyglot - a voice-enabled language tutor bot
//!
//! This library provides the building blocks of the bot:
//! - Audio pipeline (voice note decoding, speech synthesis, temp-file hygiene)
//! - Translation quizzes with per-chat sessions and scheduled broadcasts
//! - Telegram transport and the command dispatcher
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               Telegram (long polling)               │
//! └────────────────────┬────────────────────────────────┘
//!                      │ InboundEvent
//! ┌────────────────────▼────────────────────────────────┐
//! │  Bot dispatcher  │  Quiz scheduler  │  Sessions     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │  Audio pipeline (ffmpeg)  │  LLM  │  STT  │  TTS     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod backends;
pub mod bot;
pub mod channels;
pub mod config;
pub mod daemon;
pub mod error;
pub mod language;
pub mod quiz;
pub mod retry;
pub mod system;
pub mod text;
pub mod words;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use language::LanguageProfile;
