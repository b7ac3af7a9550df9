//! Shared test utilities
//!
//! In-memory transport and backends, plus a builder for a fully wired bot
//! whose audio artifacts live in a temp directory.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use polyglot_bot::audio::{ArtifactManager, AudioArtifact, AudioFormat, AudioPipeline, Transcoder};
use polyglot_bot::backends::{
    ChatMessage, GenerativeTextBackend, SpeechSynthesisBackend, TranscriptionBackend,
};
use polyglot_bot::bot::{Bot, BotDeps, BotSettings};
use polyglot_bot::channels::{InboundEvent, InboundKind, MessagingTransport, RecipientId};
use polyglot_bot::error::BackendKind;
use polyglot_bot::quiz::{
    BroadcastScheduler, QuizDelivery, QuizGenerator, QuizSessionStore, SubscriptionRegistry,
};
use polyglot_bot::words::WordListStore;
use polyglot_bot::{Error, LanguageProfile, Result};
use tempfile::TempDir;

pub const ADMIN: i64 = 1000;

/// A well-formed generated quiz
pub const QUIZ_REPLY: &str = "English: The cat sleeps on the sofa.\n\
    Correct Ukrainian: Кіт спить на дивані.\n\
    Incorrect Ukrainian: Собака спить на дивані.\n\
    Incorrect Ukrainian: Кіт їсть на дивані.\n\
    Incorrect Ukrainian: Кіт спить на кухні.";

pub const QUIZ_SENTENCE: &str = "The cat sleeps on the sofa.";
pub const QUIZ_ANSWER: &str = "Кіт спить на дивані.";

/// Number of entries in `dir`
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(Iterator::count).unwrap_or(0)
}

// -- transport ----------------------------------------------------------------

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        recipient: RecipientId,
        text: String,
    },
    Voice {
        recipient: RecipientId,
        audio: Vec<u8>,
        caption: Option<String>,
    },
}

impl Sent {
    pub const fn recipient(&self) -> RecipientId {
        match self {
            Self::Text { recipient, .. } | Self::Voice { recipient, .. } => *recipient,
        }
    }
}

/// Transport that records everything it sends
#[derive(Default)]
pub struct RecordingTransport {
    sent: tokio::sync::Mutex<Vec<Sent>>,
    unreachable: Mutex<HashSet<RecipientId>>,
    fail_voice: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every send to `recipient` fails from now on
    pub fn make_unreachable(&self, recipient: RecipientId) {
        self.unreachable.lock().unwrap().insert(recipient);
    }

    /// Every voice send fails from now on
    pub fn fail_voice(&self) {
        *self.fail_voice.lock().unwrap() = true;
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: RecipientId) -> Vec<Sent> {
        self.sent()
            .await
            .into_iter()
            .filter(|s| s.recipient() == recipient)
            .collect()
    }

    pub async fn texts_to(&self, recipient: RecipientId) -> Vec<String> {
        self.sent_to(recipient)
            .await
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                Sent::Voice { .. } => None,
            })
            .collect()
    }

    pub async fn voices_to(&self, recipient: RecipientId) -> usize {
        self.sent_to(recipient)
            .await
            .iter()
            .filter(|s| matches!(s, Sent::Voice { .. }))
            .count()
    }

    pub async fn last_text_to(&self, recipient: RecipientId) -> Option<String> {
        self.texts_to(recipient).await.pop()
    }

    fn check(&self, recipient: RecipientId) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(&recipient) {
            return Err(Error::Transport(format!("chat {recipient} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<()> {
        self.check(recipient)?;
        self.sent.lock().await.push(Sent::Text {
            recipient,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_voice(
        &self,
        recipient: RecipientId,
        audio: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        self.check(recipient)?;
        if *self.fail_voice.lock().unwrap() {
            return Err(Error::Transport("voice upload rejected".to_string()));
        }
        self.sent.lock().await.push(Sent::Voice {
            recipient,
            audio,
            caption: caption.map(str::to_string),
        });
        Ok(())
    }
}

// -- text generation ----------------------------------------------------------

/// Generator that replays queued replies, then a fallback
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    pub fn new(fallback: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_reply(&self, reply: &str) {
        self.script.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: Error) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// User-role content of every request, in order
    pub fn user_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|messages| messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl GenerativeTextBackend for ScriptedGenerator {
    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

// -- speech -------------------------------------------------------------------

/// Transcriber returning a fixed transcript, or failing
pub struct FakeTranscriber {
    transcript: String,
    fail: bool,
    seen: Mutex<Vec<(Vec<u8>, AudioFormat)>>,
}

impl FakeTranscriber {
    pub fn new(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.to_string(),
            fail: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transcript: String::new(),
            fail: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<(Vec<u8>, AudioFormat)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptionBackend for FakeTranscriber {
    async fn transcribe(&self, audio: &[u8], format: AudioFormat) -> Result<String> {
        self.seen.lock().unwrap().push((audio.to_vec(), format));
        if self.fail {
            return Err(Error::backend(BackendKind::Transcription, Some(500), "stt down"));
        }
        Ok(self.transcript.clone())
    }
}

/// Synthesizer returning fixed bytes, or failing
pub struct FakeSynthesizer {
    fail: bool,
    spoken: Mutex<Vec<(String, &'static str)>>,
}

pub const SPEECH_BYTES: &[u8] = b"ID3-fake-mp3";

impl FakeSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            spoken: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            spoken: Mutex::new(Vec::new()),
        })
    }

    /// `(text, locale)` of every synthesis request
    pub fn spoken(&self) -> Vec<(String, &'static str)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesisBackend for FakeSynthesizer {
    async fn synthesize(&self, text: &str, language: &LanguageProfile) -> Result<Vec<u8>> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), language.locale));
        if self.fail {
            return Err(Error::backend(BackendKind::Synthesis, Some(503), "tts down"));
        }
        Ok(SPEECH_BYTES.to_vec())
    }
}

// -- transcoding --------------------------------------------------------------

/// Copies the input file unchanged
pub struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(&self, input: &AudioArtifact, output: &AudioArtifact) -> Result<()> {
        tokio::fs::copy(input.path(), output.path()).await?;
        Ok(())
    }
}

/// Copies, then leaves a directory where the input file was so that
/// removing the input fails
pub struct PathSwappingTranscoder;

#[async_trait]
impl Transcoder for PathSwappingTranscoder {
    async fn transcode(&self, input: &AudioArtifact, output: &AudioArtifact) -> Result<()> {
        tokio::fs::copy(input.path(), output.path()).await?;
        tokio::fs::remove_file(input.path()).await?;
        tokio::fs::create_dir(input.path()).await?;
        tokio::fs::write(input.path().join("pinned"), b"x").await?;
        Ok(())
    }
}

/// Writes partial output, then fails
pub struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, _input: &AudioArtifact, output: &AudioArtifact) -> Result<()> {
        tokio::fs::write(output.path(), b"partial").await?;
        Err(Error::Audio("ffmpeg exited with 1: invalid data".to_string()))
    }
}

/// Writes partial output, then never finishes
pub struct StalledTranscoder;

#[async_trait]
impl Transcoder for StalledTranscoder {
    async fn transcode(&self, _input: &AudioArtifact, output: &AudioArtifact) -> Result<()> {
        tokio::fs::write(output.path(), b"partial").await?;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Build a pipeline whose artifacts live in `dir`
pub fn pipeline(
    dir: &Path,
    transcoder: Arc<dyn Transcoder>,
    transcriber: Arc<dyn TranscriptionBackend>,
    synthesizer: Arc<dyn SpeechSynthesisBackend>,
) -> Arc<AudioPipeline> {
    Arc::new(AudioPipeline::new(
        ArtifactManager::new(dir).unwrap(),
        transcoder,
        transcriber,
        synthesizer,
    ))
}

// -- wired bot ----------------------------------------------------------------

/// A bot over in-memory fakes
pub struct Harness {
    pub bot: Bot,
    pub transport: Arc<RecordingTransport>,
    pub llm: Arc<ScriptedGenerator>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub transcriber: Arc<FakeTranscriber>,
    pub registry: Arc<SubscriptionRegistry>,
    pub sessions: Arc<QuizSessionStore>,
    pub scheduler: Arc<BroadcastScheduler>,
    pub delivery: Arc<QuizDelivery>,
    pub artifacts: TempDir,
}

pub struct HarnessBuilder {
    admin_id: Option<i64>,
    interval: Duration,
    synthesizer: Arc<FakeSynthesizer>,
    transcriber: Arc<FakeTranscriber>,
    words: WordListStore,
}

impl HarnessBuilder {
    pub fn admin(mut self, admin_id: Option<i64>) -> Self {
        self.admin_id = admin_id;
        self
    }

    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<FakeSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn transcriber(mut self, transcriber: Arc<FakeTranscriber>) -> Self {
        self.transcriber = transcriber;
        self
    }

    pub fn words(mut self, words: WordListStore) -> Self {
        self.words = words;
        self
    }

    pub fn build(self) -> Harness {
        let artifacts = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::new();
        let llm = ScriptedGenerator::new(QUIZ_REPLY);

        let pipeline = pipeline(
            artifacts.path(),
            Arc::new(CopyTranscoder),
            self.transcriber.clone(),
            self.synthesizer.clone(),
        );
        let generator = Arc::new(QuizGenerator::new(
            llm.clone(),
            LanguageProfile::english(),
            LanguageProfile::lookup("ukrainian").unwrap(),
        ));

        let sessions = Arc::new(QuizSessionStore::new());
        let registry = Arc::new(SubscriptionRegistry::new());
        let delivery = Arc::new(QuizDelivery {
            sessions: sessions.clone(),
            generator,
            pipeline,
            transport: transport.clone(),
        });
        let scheduler = Arc::new(BroadcastScheduler::new(
            registry.clone(),
            delivery.clone(),
            self.interval,
            4,
        ));

        let bot = Bot::new(BotDeps {
            transport: transport.clone(),
            llm: llm.clone(),
            delivery: delivery.clone(),
            scheduler: scheduler.clone(),
            registry: registry.clone(),
            words: Arc::new(self.words),
            settings: BotSettings {
                admin_id: self.admin_id,
                bot_username: Some("polyglot_bot".to_string()),
                temperature: 0.5,
                translate_target: LanguageProfile::lookup("ukrainian").unwrap(),
            },
        });

        Harness {
            bot,
            transport,
            llm,
            synthesizer: self.synthesizer,
            transcriber: self.transcriber,
            registry,
            sessions,
            scheduler,
            delivery,
            artifacts,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            admin_id: Some(ADMIN),
            interval: Duration::from_secs(3600),
            synthesizer: FakeSynthesizer::new(),
            transcriber: FakeTranscriber::new("hello there"),
            words: WordListStore::from_lists([
                ("english", vec!["serendipity"]),
                ("german", vec!["Fernweh"]),
            ]),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Deliver a text message from `sender` in their private chat
    pub async fn text(&self, sender: i64, text: &str) {
        self.bot
            .handle(InboundEvent {
                recipient: sender,
                sender,
                sender_name: format!("user{sender}"),
                kind: InboundKind::Text(text.to_string()),
            })
            .await;
    }

    /// Deliver a voice note from `sender` in their private chat
    pub async fn voice(&self, sender: i64, audio: &[u8]) {
        self.bot
            .handle(InboundEvent {
                recipient: sender,
                sender,
                sender_name: format!("user{sender}"),
                kind: InboundKind::Voice(audio.to_vec()),
            })
            .await;
    }

    /// Deliver one quiz to `recipient` outside the dispatcher
    pub async fn deliver_quiz(&self, recipient: RecipientId) -> Result<()> {
        self.delivery.deliver(recipient).await
    }

    pub fn artifact_count(&self) -> usize {
        file_count(self.artifacts.path())
    }
}
