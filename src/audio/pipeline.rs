//! Voice note decoding and speech synthesis
//!
//! Each call owns the artifacts it creates. They are released explicitly on
//! the happy path and removed by `Drop` on every other exit, including a
//! dropped (cancelled) future.

use std::sync::Arc;

use super::artifact::{ArtifactManager, AudioArtifact, AudioFormat};
use super::transcode::Transcoder;
use crate::Result;
use crate::backends::{SpeechSynthesisBackend, TranscriptionBackend};
use crate::channels::MessagingTransport;
use crate::language::LanguageProfile;

/// Converts between voice notes and text
pub struct AudioPipeline {
    artifacts: ArtifactManager,
    transcoder: Arc<dyn Transcoder>,
    transcriber: Arc<dyn TranscriptionBackend>,
    synthesizer: Arc<dyn SpeechSynthesisBackend>,
}

impl AudioPipeline {
    #[must_use]
    pub fn new(
        artifacts: ArtifactManager,
        transcoder: Arc<dyn Transcoder>,
        transcriber: Arc<dyn TranscriptionBackend>,
        synthesizer: Arc<dyn SpeechSynthesisBackend>,
    ) -> Self {
        Self {
            artifacts,
            transcoder,
            transcriber,
            synthesizer,
        }
    }

    /// Transcribe a native voice note
    ///
    /// Persists the raw container, converts it for the transcription backend
    /// and returns the transcript. Both intermediate files are gone when this
    /// returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error (resource, audio or backend)
    pub async fn decode_voice_note(&self, raw: &[u8]) -> Result<String> {
        let native = self.artifacts.persist(raw, AudioFormat::OggOpus).await?;
        let converted = self.artifacts.reserve(AudioFormat::Mp3);

        self.transcoder.transcode(&native, &converted).await?;
        native.release();

        let audio = converted.read().await?;
        converted.release();

        let transcript = self
            .transcriber
            .transcribe(&audio, AudioFormat::Mp3)
            .await?;

        tracing::debug!(chars = transcript.chars().count(), "voice note decoded");
        Ok(transcript)
    }

    /// Synthesize `text` in `language` into a new artifact
    ///
    /// The caller owns the returned artifact and must hand it to exactly one
    /// send; [`deliver`] does that and releases it afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails or the audio cannot be stored
    pub async fn synthesize_speech(
        &self,
        text: &str,
        language: &LanguageProfile,
    ) -> Result<AudioArtifact> {
        let audio = self.synthesizer.synthesize(text, language).await?;
        self.artifacts.persist(&audio, AudioFormat::Mp3).await
    }

    /// Synthesize `text` and send it as a voice message
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or the send fails
    pub async fn send_speech(
        &self,
        transport: &dyn MessagingTransport,
        recipient: i64,
        text: &str,
        language: &LanguageProfile,
        caption: Option<&str>,
    ) -> Result<()> {
        let artifact = self.synthesize_speech(text, language).await?;
        deliver(transport, recipient, artifact, caption).await
    }
}

/// Send `artifact` as a voice message, then release it regardless of outcome
///
/// # Errors
///
/// Returns error if the artifact cannot be read or the transport fails
pub async fn deliver(
    transport: &dyn MessagingTransport,
    recipient: i64,
    artifact: AudioArtifact,
    caption: Option<&str>,
) -> Result<()> {
    let result = match artifact.read().await {
        Ok(audio) => transport.send_voice(recipient, audio, caption).await,
        Err(e) => Err(e),
    };
    artifact.release();
    result
}
