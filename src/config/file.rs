//! TOML configuration file loading
//!
//! Supports `~/.config/polyglot/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct PolyglotConfigFile {
    /// Telegram user allowed to run admin commands
    #[serde(default)]
    pub admin_id: Option<i64>,

    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramFileConfig,

    /// Text generation settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Speech backends
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Artifact storage and transcoding
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Quiz broadcast settings
    #[serde(default)]
    pub quiz: QuizFileConfig,

    /// Vocabulary word lists
    #[serde(default)]
    pub words: WordsFileConfig,

    /// Backend retry policy
    #[serde(default)]
    pub retry: RetryFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelegramFileConfig {
    pub token: Option<String>,
    /// Pause between getUpdates calls, in milliseconds
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// OpenAI-compatible API base URL
    pub api_base: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Speech backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// "whisper" or "deepgram"
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// "google", "openai" or "elevenlabs"
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    pub artifact_dir: Option<String>,
    /// ffmpeg binary name or path
    pub ffmpeg: Option<String>,
    pub transcode_workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizFileConfig {
    pub interval_secs: Option<u64>,
    pub prompt_language: Option<String>,
    pub target_language: Option<String>,
    pub broadcast_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WordsFileConfig {
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetryFileConfig {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
    pub max_delay_ms: Option<u64>,
}

/// Load the TOML config file
///
/// With an explicit `path` the file must exist and parse. Without one, the
/// standard path is tried and any problem falls back to defaults.
///
/// # Errors
///
/// Returns error if an explicit file cannot be read or parsed
pub fn load_config_file(path: Option<&Path>) -> Result<PolyglotConfigFile> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(PolyglotConfigFile::default());
    };

    if !path.exists() {
        return Ok(PolyglotConfigFile::default());
    }

    Ok(match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                PolyglotConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            PolyglotConfigFile::default()
        }
    })
}

/// Return the config file path: `~/.config/polyglot/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("polyglot").join("config.toml"))
}
