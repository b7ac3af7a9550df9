//! Bot daemon - wires services together and runs until interrupted

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::mpsc;

use crate::audio::{ArtifactManager, AudioPipeline, FfmpegTranscoder};
use crate::backends::{
    GenerativeTextBackend, OpenAiChat, SpeechToText, SttProvider, TextToSpeech, TtsProvider,
};
use crate::bot::{Bot, BotDeps, BotSettings, Command};
use crate::channels::{MessagingTransport, TelegramChannel};
use crate::config::Config;
use crate::language::VOCABULARY_LANGUAGES;
use crate::quiz::{
    BroadcastScheduler, QuizDelivery, QuizGenerator, QuizSessionStore, SubscriptionRegistry,
};
use crate::system::SystemStats;
use crate::words::WordListStore;
use crate::{Error, Result};

/// Backend clients and the audio pipeline
///
/// Shared by the daemon and the one-shot CLI commands.
pub struct Services {
    pub llm: Arc<dyn GenerativeTextBackend>,
    pub pipeline: Arc<AudioPipeline>,
    pub generator: Arc<QuizGenerator>,
}

impl Services {
    /// Build clients from configuration and run startup checks
    ///
    /// # Errors
    ///
    /// Returns error if a required key is missing, `ffmpeg` cannot be found
    /// or the artifact directory cannot be created
    pub fn build(config: &Config) -> Result<Self> {
        let openai_key = config.openai_key()?.to_string();

        let llm: Arc<dyn GenerativeTextBackend> = Arc::new(
            OpenAiChat::new(SecretString::from(openai_key.clone()), config.llm.model.clone())?
                .with_api_base(config.llm.api_base.clone())
                .with_retry(config.retry.clone()),
        );

        let stt_key = match config.voice.stt_provider {
            SttProvider::Whisper => Some(openai_key.clone()),
            SttProvider::Deepgram => config.api_keys.deepgram.clone(),
        }
        .ok_or_else(|| Error::Config("DEEPGRAM_API_KEY is not set".to_string()))?;
        let transcriber = SpeechToText::new(
            config.voice.stt_provider,
            SecretString::from(stt_key),
            config.voice.stt_model.clone(),
        )?
        .with_retry(config.retry.clone());

        let synthesizer = match config.voice.tts_provider {
            TtsProvider::Google => TextToSpeech::new_google(),
            TtsProvider::OpenAI => TextToSpeech::new_openai(
                SecretString::from(openai_key),
                config.voice.tts_voice.clone(),
                config.voice.tts_model.clone(),
            )?,
            TtsProvider::ElevenLabs => {
                let key = config
                    .api_keys
                    .elevenlabs
                    .clone()
                    .ok_or_else(|| Error::Config("ELEVENLABS_API_KEY is not set".to_string()))?;
                TextToSpeech::new_elevenlabs(
                    SecretString::from(key),
                    config.voice.tts_voice.clone(),
                    config.voice.tts_model.clone(),
                )?
            }
        }
        .with_retry(config.retry.clone());

        let transcoder =
            FfmpegTranscoder::locate(&config.audio.ffmpeg, config.audio.transcode_workers)?;
        let artifacts = ArtifactManager::new(config.audio.artifact_dir.clone())?;

        let pipeline = Arc::new(AudioPipeline::new(
            artifacts,
            Arc::new(transcoder),
            Arc::new(transcriber),
            Arc::new(synthesizer),
        ));

        let generator = Arc::new(QuizGenerator::new(
            Arc::clone(&llm),
            config.quiz.prompt_language,
            config.quiz.target_language,
        ));

        tracing::info!(
            model = %config.llm.model,
            stt = ?config.voice.stt_provider,
            tts = ?config.voice.tts_provider,
            artifact_dir = %config.audio.artifact_dir.display(),
            "services ready"
        );

        Ok(Self {
            llm,
            pipeline,
            generator,
        })
    }
}

/// The bot daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run polling, the quiz scheduler and the dispatcher until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if startup fails (missing credentials, `ffmpeg`, or an
    /// unreachable Telegram API)
    pub async fn run(&self) -> Result<()> {
        let token = self.config.telegram_token()?.to_string();
        let services = Services::build(&self.config)?;

        std::fs::create_dir_all(&self.config.words_dir)?;
        let words = Arc::new(WordListStore::load(&self.config.words_dir, VOCABULARY_LANGUAGES)?);

        let (telegram, mut events) = TelegramChannel::with_receiver(token);
        let telegram = telegram.with_retry(self.config.retry.clone());
        let bot_username = telegram.connect().await?;

        match SystemStats::collect().await {
            Ok(stats) => tracing::info!(
                cpu = stats.cpu,
                memory = stats.memory,
                disk = stats.disk,
                "{}",
                stats.summary_line()
            ),
            Err(e) => tracing::warn!(error = %e, "failed to read system stats"),
        }

        if let Err(e) = telegram.sync_commands(&Command::public_menu()).await {
            tracing::warn!(error = %e, "failed to register bot commands");
        }

        let polling = telegram.start_polling(self.config.telegram.poll_interval)?;
        let transport: Arc<dyn MessagingTransport> = Arc::new(telegram);

        let registry = Arc::new(SubscriptionRegistry::new());
        let delivery = Arc::new(QuizDelivery {
            sessions: Arc::new(QuizSessionStore::new()),
            generator: Arc::clone(&services.generator),
            pipeline: Arc::clone(&services.pipeline),
            transport: Arc::clone(&transport),
        });
        let scheduler = Arc::new(BroadcastScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&delivery),
            self.config.quiz.interval,
            self.config.quiz.broadcast_concurrency,
        ));

        let bot = Arc::new(Bot::new(BotDeps {
            transport,
            llm: services.llm,
            delivery,
            scheduler: Arc::clone(&scheduler),
            registry,
            words,
            settings: BotSettings {
                admin_id: self.config.admin_id,
                bot_username,
                temperature: self.config.llm.temperature,
                translate_target: self.config.quiz.target_language,
            },
        }));

        // Set up shutdown signal for the scheduler
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let scheduler_task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run(&mut shutdown_rx).await })
        };

        tracing::info!("polyglot bot ready");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("Telegram polling stopped");
                        break;
                    };
                    let bot = Arc::clone(&bot);
                    tokio::spawn(async move { bot.handle(event).await });
                }
            }
        }

        // Closing the channel stops the scheduler
        drop(shutdown_tx);
        polling.abort();
        if let Err(e) = scheduler_task.await {
            tracing::warn!(error = %e, "quiz scheduler task failed");
        }

        tracing::info!("daemon stopped");
        Ok(())
    }
}
