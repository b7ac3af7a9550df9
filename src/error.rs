//! Error types for the polyglot bot

use std::fmt;

use thiserror::Error;

use crate::retry::is_recoverable;

/// Result type alias for polyglot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which external backend produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Generative text (chat completions)
    Generation,
    /// Speech-to-text
    Transcription,
    /// Text-to-speech
    Synthesis,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generation => "generation",
            Self::Transcription => "transcription",
            Self::Synthesis => "synthesis",
        })
    }
}

/// Errors that can occur in the polyglot bot
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Messaging transport error (send failed, chat unreachable)
    #[error("transport error: {0}")]
    Transport(String),

    /// External backend call failed
    #[error("{kind} backend error{}: {message}", status_suffix(.status))]
    Backend {
        kind: BackendKind,
        status: Option<u16>,
        message: String,
    },

    /// Generated content did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Audio artifact could not be created, read or removed
    #[error("resource error: {0}")]
    Resource(String),

    /// Audio transcoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Caller is not allowed to run this operation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl Error {
    /// Build a backend error
    #[must_use]
    pub fn backend(kind: BackendKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Backend {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend {
                status, message, ..
            } => is_recoverable(status.unwrap_or_default(), message),
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Plain apology text safe to show an end user
    ///
    /// Never includes internal detail; the full error goes to the log.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "You are not authorized to use this command.",
            Self::Parse(_)
            | Self::Backend {
                kind: BackendKind::Generation,
                ..
            } => "Sorry, I couldn't generate a response at the moment. Please try again later.",
            Self::Backend {
                kind: BackendKind::Transcription,
                ..
            }
            | Self::Audio(_) => {
                "Sorry, I couldn't understand that audio. Please try sending it again."
            }
            _ => "Sorry, something went wrong. Please try again later.",
        }
    }
}
