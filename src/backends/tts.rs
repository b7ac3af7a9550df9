//! Text-to-speech clients

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::SpeechSynthesisBackend;
use crate::error::BackendKind;
use crate::language::LanguageProfile;
use crate::retry::RetryPolicy;
use crate::text::split_text;
use crate::{Error, Result};

/// Longest input the Google translate speech endpoint accepts per request
const GOOGLE_MAX_CHARS: usize = 100;

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    /// Keyless Google translate speech endpoint, locale-aware
    Google,
    OpenAI,
    ElevenLabs,
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    voice: String,
    model: String,
    provider: TtsProvider,
    retry: RetryPolicy,
}

impl TextToSpeech {
    /// Create a synthesizer using the Google translate speech endpoint
    #[must_use]
    pub fn new_google() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            voice: String::new(),
            model: String::new(),
            provider: TtsProvider::Google,
            retry: RetryPolicy::default(),
        }
    }

    /// Create a synthesizer using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: SecretString, voice: String, model: String) -> Result<Self> {
        Self::with_key(TtsProvider::OpenAI, api_key, voice, model)
    }

    /// Create a synthesizer using `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: SecretString, voice_id: String, model: String) -> Result<Self> {
        Self::with_key(TtsProvider::ElevenLabs, api_key, voice_id, model)
    }

    fn with_key(
        provider: TtsProvider,
        api_key: SecretString,
        voice: String,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("{provider:?} API key required for TTS")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key),
            voice,
            model,
            provider,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn key(&self) -> &str {
        self.api_key.as_ref().map_or("", |k| k.expose_secret())
    }

    /// Synthesize using the Google translate speech endpoint
    ///
    /// Long text is spoken in pieces; MP3 frames concatenate cleanly.
    async fn synthesize_google(&self, text: &str, language: &LanguageProfile) -> Result<Vec<u8>> {
        let url = format!("https://translate.google.{}/translate_tts", language.tld);
        let pieces = split_text(text, GOOGLE_MAX_CHARS);
        let total = pieces.len().to_string();
        let mut audio = Vec::new();

        for (idx, piece) in pieces.iter().enumerate() {
            let idx = idx.to_string();
            let response = self
                .client
                .get(&url)
                .header("User-Agent", "Mozilla/5.0")
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language.locale),
                    ("q", piece.as_str()),
                    ("idx", idx.as_str()),
                    ("total", total.as_str()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::backend(
                    BackendKind::Synthesis,
                    Some(status.as_u16()),
                    body,
                ));
            }

            audio.extend_from_slice(&response.bytes().await?);
        }

        Ok(audio)
    }

    /// Synthesize using `OpenAI` TTS (language is inferred from the text)
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(self.key())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(
                BackendKind::Synthesis,
                Some(status.as_u16()),
                body,
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesize using `ElevenLabs` TTS
    async fn synthesize_elevenlabs(&self, text: &str, language: &LanguageProfile) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            language_code: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            language_code: language.locale,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.key())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(
                BackendKind::Synthesis,
                Some(status.as_u16()),
                body,
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesisBackend for TextToSpeech {
    async fn synthesize(&self, text: &str, language: &LanguageProfile) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::backend(BackendKind::Synthesis, None, "nothing to synthesize"));
        }

        let audio = self
            .retry
            .run("speech synthesis", || async {
                match self.provider {
                    TtsProvider::Google => self.synthesize_google(text, language).await,
                    TtsProvider::OpenAI => self.synthesize_openai(text).await,
                    TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text, language).await,
                }
            })
            .await?;

        tracing::debug!(
            provider = ?self.provider,
            locale = language.locale,
            audio_bytes = audio.len(),
            "speech synthesized"
        );
        Ok(audio)
    }
}
