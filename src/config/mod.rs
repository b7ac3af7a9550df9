//! Configuration management for the polyglot bot
//!
//! Layering is environment > TOML file > defaults.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backends::{DEFAULT_API_BASE, SttProvider, TtsProvider};
use crate::language::LanguageProfile;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

use file::PolyglotConfigFile;

/// Polyglot bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot settings
    pub telegram: TelegramConfig,

    /// Telegram user allowed to run admin commands and receive tickets
    pub admin_id: Option<i64>,

    /// Text generation settings
    pub llm: LlmConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Speech backends
    pub voice: VoiceConfig,

    /// Artifact storage and transcoding
    pub audio: AudioConfig,

    /// Quiz broadcast settings
    pub quiz: QuizConfig,

    /// Directory holding `<language>.txt` word lists
    pub words_dir: PathBuf,

    /// Retry policy applied by every backend client
    pub retry: RetryPolicy,
}

/// Telegram bot settings
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token
    pub token: Option<String>,
    /// Pause between getUpdates calls
    pub poll_interval: Duration,
}

/// Text generation settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    /// Temperature for general tutoring replies
    pub temperature: f32,
    pub api_base: String,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Speech backend configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub stt_provider: SttProvider,

    /// STT model identifier
    pub stt_model: String,

    pub tts_provider: TtsProvider,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

/// Artifact storage and transcoding
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Where transient audio files live
    pub artifact_dir: PathBuf,
    /// ffmpeg binary name or path
    pub ffmpeg: String,
    /// Concurrent transcodes
    pub transcode_workers: usize,
}

/// Quiz broadcast settings
#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub interval: Duration,
    /// Language of the spoken sentence
    pub prompt_language: &'static LanguageProfile,
    /// Language the answer is expected in
    pub target_language: &'static LanguageProfile,
    /// Subscribers served concurrently per tick
    pub broadcast_concurrency: usize,
}

/// Return the data directory (`~/.local/share/polyglot` on Linux)
#[must_use]
pub fn data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from(".polyglot"), |d| d.data_dir().join("polyglot"))
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// `path` overrides the standard config file location.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unusable or a value is
    /// invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(path)?;
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for unknown providers or languages and for
    /// out-of-range numbers
    pub fn from_sources(fc: PolyglotConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parsed = |key: &str| -> Result<Option<u64>> {
            env(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map_err(|_| Error::Config(format!("{key} must be a whole number, got {v:?}")))
                })
                .transpose()
        };

        let telegram = TelegramConfig {
            token: env("TELEGRAM_BOT_TOKEN").or(fc.telegram.token),
            poll_interval: Duration::from_millis(
                parsed("POLYGLOT_POLL_INTERVAL_MS")?
                    .or(fc.telegram.poll_interval_ms)
                    .unwrap_or(1000),
            ),
        };

        let admin_id = match env("ADMIN_ID") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| Error::Config(format!("ADMIN_ID must be a numeric user id, got {raw:?}")))?,
            ),
            None => fc.admin_id,
        };

        let llm = LlmConfig {
            model: env("POLYGLOT_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            temperature: fc.llm.temperature.unwrap_or(0.5),
            api_base: fc
                .llm
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        let voice = VoiceConfig {
            stt_provider: fc
                .voice
                .stt_provider
                .as_deref()
                .map_or(Ok(SttProvider::Whisper), str::parse)?,
            stt_model: fc.voice.stt_model.unwrap_or_else(|| "whisper-1".to_string()),
            tts_provider: fc
                .voice
                .tts_provider
                .as_deref()
                .map_or(Ok(TtsProvider::Google), str::parse)?,
            tts_model: fc.voice.tts_model.unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
        };

        let audio = AudioConfig {
            artifact_dir: env("POLYGLOT_AUDIO_DIR")
                .or(fc.audio.artifact_dir)
                .map_or_else(|| data_dir().join("audios"), PathBuf::from),
            ffmpeg: env("POLYGLOT_FFMPEG")
                .or(fc.audio.ffmpeg)
                .unwrap_or_else(|| "ffmpeg".to_string()),
            transcode_workers: fc.audio.transcode_workers.unwrap_or(2),
        };

        let quiz = QuizConfig {
            interval: Duration::from_secs(
                parsed("POLYGLOT_QUIZ_INTERVAL_SECS")?
                    .or(fc.quiz.interval_secs)
                    .unwrap_or(3600),
            ),
            prompt_language: language(fc.quiz.prompt_language.as_deref(), "english")?,
            target_language: language(fc.quiz.target_language.as_deref(), "ukrainian")?,
            broadcast_concurrency: fc.quiz.broadcast_concurrency.unwrap_or(4),
        };

        let words_dir = env("POLYGLOT_WORDS_DIR")
            .or(fc.words.dir)
            .map_or_else(|| data_dir().join("words"), PathBuf::from);

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: fc.retry.max_attempts.unwrap_or(default_retry.max_attempts),
            base_delay: fc
                .retry
                .base_delay_ms
                .map_or(default_retry.base_delay, Duration::from_millis),
            multiplier: fc.retry.multiplier.unwrap_or(default_retry.multiplier),
            max_delay: fc
                .retry
                .max_delay_ms
                .map_or(default_retry.max_delay, Duration::from_millis),
        };

        let config = Self {
            telegram,
            admin_id,
            llm,
            api_keys,
            voice,
            audio,
            quiz,
            words_dir,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let at_least_one = [
            ("audio.transcode_workers", self.audio.transcode_workers),
            ("quiz.broadcast_concurrency", self.quiz.broadcast_concurrency),
        ];
        for (key, value) in at_least_one {
            if value == 0 {
                return Err(Error::Config(format!("{key} must be at least 1")));
            }
        }

        if self.quiz.interval.is_zero() {
            return Err(Error::Config("quiz.interval_secs must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(Error::Config("retry.multiplier must be a number >= 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config("llm.temperature must be between 0 and 2".to_string()));
        }
        if self.quiz.prompt_language == self.quiz.target_language {
            return Err(Error::Config(
                "quiz.prompt_language and quiz.target_language must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Telegram bot token, required to run the bot
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no token is configured
    pub fn telegram_token(&self) -> Result<&str> {
        self.telegram
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))
    }

    /// `OpenAI` API key, required for text generation
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no key is configured
    pub fn openai_key(&self) -> Result<&str> {
        self.api_keys
            .openai
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))
    }
}

fn language(name: Option<&str>, default: &str) -> Result<&'static LanguageProfile> {
    let name = name.unwrap_or(default);
    LanguageProfile::lookup(name)
        .ok_or_else(|| Error::Config(format!("unsupported language: {name}")))
}
