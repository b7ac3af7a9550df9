//! Inbound message dispatch
//!
//! [`Bot::handle`] turns one [`InboundEvent`] into replies: commands, quiz
//! answers and voice conversations. Errors never escape; the user gets a
//! plain apology and the detail goes to the log.

mod command;
mod prefs;
mod prompts;

use std::sync::Arc;
use std::time::Instant;

pub use command::{Command, ParsedCommand, TextInput, help_text, parse_input};
pub use prefs::{PreferenceStore, Preferences};
pub use prompts::WritingTask;

use crate::backends::{ChatMessage, GenerativeTextBackend};
use crate::channels::{InboundEvent, InboundKind, MessagingTransport, RecipientId};
use crate::error::BackendKind;
use crate::language::{LanguageProfile, VOCABULARY_LANGUAGES};
use crate::quiz::{
    AnswerOutcome, BroadcastScheduler, QuizDelivery, SubscribeOutcome, SubscriptionRegistry,
    UnsubscribeOutcome,
};
use crate::system::SystemStats;
use crate::words::WordListStore;
use crate::{Error, Result};

const WELCOME: &str = "Hello! I'm a language-tutor bot designed to help you improve your \
     vocabulary.\nTo get started, type /help for available commands.\nLet's expand our \
     vocabulary together! 😊";

/// Sent when a voice note cannot be handled
pub const VOICE_APOLOGY: &str =
    "Sorry, I encountered an error while processing your voice message. Please try again.";

/// Sent when a plain-text answer arrives with no quiz pending
pub const NO_QUIZ_PENDING: &str =
    "Sorry, I couldn't retrieve the quiz data. Please start a new quiz with /quiz.";

const CORRECT_ANSWER: &str = "🎉 Correct! Well done!";

const QUIZ_CANCELLED: &str = "Quiz cancelled. You can start a new quiz anytime with /quiz.";

const VOICE_REPLY_FAILED: &str = "Sorry, an error occurred while generating the voice response.";

const DEV_INFO: &str = concat!(
    "👨🏻‍💻 Developer Information:\n",
    "Polyglot v",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Maintainers: ",
    env!("CARGO_PKG_AUTHORS"),
    "\n",
    "🌐 Languages: English, German, Ukrainian",
);

/// Static settings for the dispatcher
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Telegram user allowed to run admin commands and receive tickets
    pub admin_id: Option<i64>,
    /// Our own username, for `/command@bot` addressing
    pub bot_username: Option<String>,
    /// Sampling temperature for general replies
    pub temperature: f32,
    /// Language `/translate` translates into
    pub translate_target: &'static LanguageProfile,
}

/// Shared services the dispatcher calls into
pub struct BotDeps {
    pub transport: Arc<dyn MessagingTransport>,
    pub llm: Arc<dyn GenerativeTextBackend>,
    pub delivery: Arc<QuizDelivery>,
    pub scheduler: Arc<BroadcastScheduler>,
    pub registry: Arc<SubscriptionRegistry>,
    pub words: Arc<WordListStore>,
    pub settings: BotSettings,
}

/// Command and message dispatcher
pub struct Bot {
    transport: Arc<dyn MessagingTransport>,
    llm: Arc<dyn GenerativeTextBackend>,
    delivery: Arc<QuizDelivery>,
    scheduler: Arc<BroadcastScheduler>,
    registry: Arc<SubscriptionRegistry>,
    words: Arc<WordListStore>,
    settings: BotSettings,
    prefs: PreferenceStore,
}

impl Bot {
    #[must_use]
    pub fn new(deps: BotDeps) -> Self {
        Self {
            transport: deps.transport,
            llm: deps.llm,
            delivery: deps.delivery,
            scheduler: deps.scheduler,
            registry: deps.registry,
            words: deps.words,
            settings: deps.settings,
            prefs: PreferenceStore::new(),
        }
    }

    /// Per-chat preferences
    #[must_use]
    pub const fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    /// Handle one inbound event to completion
    pub async fn handle(&self, event: InboundEvent) {
        let recipient = event.recipient;

        match event.kind {
            InboundKind::Text(text) => {
                if let Err(e) = self
                    .handle_text(recipient, event.sender, &event.sender_name, &text)
                    .await
                {
                    tracing::warn!(recipient, error = %e, "message handling failed");
                    self.reply_best_effort(recipient, e.user_message()).await;
                }
            }
            InboundKind::Voice(audio) => {
                if let Err(e) = self.handle_voice(recipient, &audio).await {
                    tracing::warn!(recipient, error = %e, "voice handling failed");
                    self.reply_best_effort(recipient, VOICE_APOLOGY).await;
                }
            }
        }
    }

    async fn handle_text(
        &self,
        recipient: RecipientId,
        sender: i64,
        sender_name: &str,
        text: &str,
    ) -> Result<()> {
        match parse_input(text, self.settings.bot_username.as_deref()) {
            TextInput::Plain(answer) => self.answer_quiz(recipient, &answer).await,
            TextInput::Unknown(name) => {
                // Commands for other bots in a group are not ours to answer
                if name.contains('@') {
                    return Ok(());
                }
                self.reply(recipient, "Unknown command. Type /help for available commands.")
                    .await
            }
            TextInput::Command(parsed) => {
                tracing::info!(command = %parsed.command, recipient, sender, "command invoked");
                if parsed.command.is_admin_only() {
                    self.require_admin(sender)?;
                }
                self.run_command(recipient, sender, sender_name, &parsed)
                    .await
            }
        }
    }

    fn require_admin(&self, sender: i64) -> Result<()> {
        if self.settings.admin_id == Some(sender) {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("user {sender} is not the admin")))
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn run_command(
        &self,
        recipient: RecipientId,
        sender: i64,
        sender_name: &str,
        parsed: &ParsedCommand,
    ) -> Result<()> {
        match parsed.command {
            Command::Start => self.reply(recipient, WELCOME).await,
            Command::Help => self.reply(recipient, &help_text()).await,
            Command::Quiz => self.start_quiz(recipient).await,
            Command::Cancel => {
                let discarded = self.delivery.sessions.cancel(recipient);
                tracing::debug!(recipient, discarded, "quiz cancelled");
                self.reply(recipient, QUIZ_CANCELLED).await
            }
            Command::SubscribeQuiz => {
                let text = match self.registry.subscribe(recipient) {
                    SubscribeOutcome::NewlySubscribed => {
                        "You've successfully subscribed to hourly quizzes!"
                    }
                    SubscribeOutcome::AlreadySubscribed => {
                        "You're already subscribed to hourly quizzes."
                    }
                };
                self.reply(recipient, text).await
            }
            Command::UnsubscribeQuiz => {
                let text = match self.registry.unsubscribe(recipient) {
                    UnsubscribeOutcome::WasSubscribed => {
                        "You've successfully unsubscribed from hourly quizzes."
                    }
                    UnsubscribeOutcome::NotSubscribed => {
                        "You're not currently subscribed to hourly quizzes."
                    }
                };
                self.reply(recipient, text).await
            }
            Command::SetLanguage => self.set_language(recipient, parsed.args()).await,
            Command::SendVocab => self.send_vocab(recipient).await,
            Command::Meaning => {
                let Some(word) = parsed.args() else {
                    return self
                        .reply(recipient, "Please provide a word to define. Usage: /meaning <word>")
                        .await;
                };
                self.reply(
                    recipient,
                    &format!("Generating definitions and sentence example for: {word}"),
                )
                .await?;
                let response = self.ask(prompts::meaning(word)).await?;
                self.reply_with_voice(recipient, &response, LanguageProfile::english())
                    .await
            }
            Command::Translate => {
                let Some(text) = parsed.args() else {
                    return self
                        .reply(
                            recipient,
                            "Please provide some text to translate. Usage: /translate <text>",
                        )
                        .await;
                };
                let target = self.settings.translate_target;
                let translated = self
                    .llm
                    .complete(&prompts::translate(text, target), self.settings.temperature)
                    .await?;
                self.reply(
                    recipient,
                    &format!(
                        "Original: {text}\nTranslated to {}: {translated}",
                        target.display_name()
                    ),
                )
                .await
            }
            Command::GrammarCheck => {
                let Some(text) = parsed.args() else {
                    return self
                        .reply(
                            recipient,
                            "Please provide some text to check. Usage: /grammar_check <your text>",
                        )
                        .await;
                };
                self.reply(recipient, "Checking grammar...").await?;
                let corrected = self
                    .llm
                    .complete(&prompts::grammar(text), prompts::GRAMMAR_TEMPERATURE)
                    .await?;
                self.reply(
                    recipient,
                    &format!("Original text:\n{text}\n\nCorrected text:\n{corrected}"),
                )
                .await
            }
            Command::Email => self.writing(recipient, parsed, WritingTask::Email).await,
            Command::Letter => self.writing(recipient, parsed, WritingTask::Letter).await,
            Command::Essay => self.writing(recipient, parsed, WritingTask::Essay).await,
            Command::Summarise => self.writing(recipient, parsed, WritingTask::Summarise).await,
            Command::Compose => self.writing(recipient, parsed, WritingTask::Compose).await,
            Command::Rewrite => self.writing(recipient, parsed, WritingTask::Rewrite).await,
            Command::Pronounce => self.pronounce(recipient, parsed.args()).await,
            Command::StartSpeechPractice => {
                self.prefs.update(recipient, |p| p.speech_practice = true);
                self.reply(
                    recipient,
                    "Welcome to the speech practice session! Please send a voice message, \
                     and I'll respond with feedback.",
                )
                .await
            }
            Command::StopSpeechPractice => {
                self.prefs.update(recipient, |p| p.speech_practice = false);
                self.reply(
                    recipient,
                    "Speech practice session ended. Voice messages will get regular answers again.",
                )
                .await
            }
            Command::Ticket => self.ticket(recipient, sender, sender_name, parsed.args()).await,
            Command::Ping => {
                let started = Instant::now();
                self.reply(recipient, "Pinging...").await?;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.reply(recipient, &format!("Pong! Latency is {latency_ms:.2}ms"))
                    .await
            }
            Command::Stats => {
                let stats = SystemStats::collect().await?;
                self.reply(recipient, &stats.reply_text()).await
            }
            Command::Dev => self.reply(recipient, DEV_INFO).await,
            Command::Broadcast => {
                self.reply(
                    recipient,
                    &format!("Sending quizzes to {} subscribers...", self.registry.len()),
                )
                .await?;
                let report = self.scheduler.tick().await;
                self.reply(
                    recipient,
                    &format!(
                        "Broadcast finished: {} delivered, {} failed.",
                        report.delivered, report.failed
                    ),
                )
                .await
            }
            Command::Subscribers => {
                let count = self.registry.len();
                self.reply(recipient, &format!("{count} subscribers.")).await
            }
        }
    }

    /// Deliver an on-demand quiz
    ///
    /// Generation failures were already apologized for by the delivery.
    async fn start_quiz(&self, recipient: RecipientId) -> Result<()> {
        match self.delivery.deliver(recipient).await {
            Ok(()) => Ok(()),
            Err(
                e @ (Error::Parse(_)
                | Error::Backend {
                    kind: BackendKind::Generation,
                    ..
                }),
            ) => {
                tracing::warn!(recipient, error = %e, "quiz generation failed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn answer_quiz(&self, recipient: RecipientId, answer: &str) -> Result<()> {
        let reply = match self.delivery.sessions.resolve(recipient, answer) {
            AnswerOutcome::NoSession => NO_QUIZ_PENDING.to_string(),
            AnswerOutcome::Answered {
                matched,
                correct_answer,
                prompt_sentence,
            } => {
                let verdict = if matched {
                    CORRECT_ANSWER.to_string()
                } else {
                    format!("❌ Sorry, that's not correct. The right answer is:\n\n{correct_answer}")
                };
                let source = self.delivery.generator.prompt_language().display_name();
                format!("{verdict}\n\n{source} sentence: {prompt_sentence}")
            }
        };

        self.reply(recipient, &reply).await
    }

    async fn set_language(&self, recipient: RecipientId, args: Option<&str>) -> Result<()> {
        let Some(name) = args else {
            return self
                .reply(
                    recipient,
                    "Please specify a language. Usage: /set_language <language>",
                )
                .await;
        };

        let profile = LanguageProfile::lookup(name)
            .filter(|p| VOCABULARY_LANGUAGES.contains(&p.name));
        let Some(profile) = profile else {
            return self
                .reply(
                    recipient,
                    "Invalid language. Supported languages are 'english' and 'german'.",
                )
                .await;
        };

        self.prefs
            .update(recipient, |p| p.vocabulary_language = profile);
        self.reply(
            recipient,
            &format!("Vocabulary language set to {}.", profile.display_name()),
        )
        .await
    }

    async fn send_vocab(&self, recipient: RecipientId) -> Result<()> {
        let language = self.prefs.get(recipient).vocabulary_language;

        let Some(word) = self.words.random_word(language.name) else {
            tracing::warn!(language = language.name, "no vocabulary words available");
            return self
                .reply(
                    recipient,
                    &format!("Sorry, no words available for {}.", language.display_name()),
                )
                .await;
        };

        let (define, example) = prompts::vocabulary(&word, language);
        let definition = self.ask(define).await?;
        let sentence = self.ask(example).await?;

        let text = format!("Word: {word}\nDefinition: {definition}\nExample sentence: {sentence}");
        self.reply_with_voice(recipient, &text, language).await
    }

    async fn writing(
        &self,
        recipient: RecipientId,
        parsed: &ParsedCommand,
        task: WritingTask,
    ) -> Result<()> {
        let Some(info) = parsed.args() else {
            return self
                .reply(
                    recipient,
                    &format!(
                        "Please provide the necessary information for the {} command.",
                        parsed.command
                    ),
                )
                .await;
        };

        self.reply(recipient, &format!("Generating response for: {info}"))
            .await?;
        let response = self.ask(task.prompt(info)).await?;
        self.reply(recipient, &response).await
    }

    async fn pronounce(&self, recipient: RecipientId, args: Option<&str>) -> Result<()> {
        let Some(text) = args else {
            return self
                .reply(
                    recipient,
                    "Please provide a word or phrase to pronounce. Usage: /pronounce <word or phrase>",
                )
                .await;
        };

        self.reply(
            recipient,
            &format!("Generating pronunciation guidance for: {text}"),
        )
        .await?;

        let guidance = self.ask(prompts::pronounce(text)).await?;
        let full = format!("Pronunciation guidance for '{text}':\n\n{guidance}");
        self.reply_with_voice(recipient, &full, LanguageProfile::english())
            .await?;

        let language = self.prefs.get(recipient).vocabulary_language;
        let caption = format!("Pronunciation of '{text}'");
        self.delivery
            .pipeline
            .send_speech(
                self.transport.as_ref(),
                recipient,
                text,
                language,
                Some(&caption),
            )
            .await
    }

    async fn ticket(
        &self,
        recipient: RecipientId,
        sender: i64,
        sender_name: &str,
        args: Option<&str>,
    ) -> Result<()> {
        let Some(issue) = args else {
            return self
                .reply(
                    recipient,
                    "Please provide the issue details. Usage: /ticket <issue description>",
                )
                .await;
        };

        let Some(admin) = self.settings.admin_id else {
            return Err(Error::Config("ADMIN_ID not set; tickets are disabled".to_string()));
        };

        self.reply(recipient, &format!("Creating issue ticket for: {issue}"))
            .await?;
        let description = self.ask(prompts::ticket(issue)).await?;

        let forwarded = format!("{description}\n\nIssue Raised by: {sender_name} ({sender})");
        if let Err(e) = self.transport.send_text(admin, &forwarded).await {
            tracing::error!(admin, error = %e, "failed to forward ticket to admin");
            return self
                .reply(
                    recipient,
                    "Failed to send issue to admin. Please try again later.",
                )
                .await;
        }

        self.reply(recipient, &format!("Issue sent to admin:\n{description}"))
            .await
    }

    /// Transcribe a voice note, answer it and speak the answer back
    async fn handle_voice(&self, recipient: RecipientId, audio: &[u8]) -> Result<()> {
        let transcript = self.delivery.pipeline.decode_voice_note(audio).await?;
        tracing::info!(recipient, chars = transcript.chars().count(), "voice note transcribed");

        let prompt = if self.prefs.get(recipient).speech_practice {
            prompts::speech_practice(&transcript)
        } else {
            transcript
        };
        let response = self.ask(prompt).await?;

        self.reply(recipient, &response).await?;
        self.delivery
            .pipeline
            .send_speech(
                self.transport.as_ref(),
                recipient,
                &response,
                LanguageProfile::english(),
                None,
            )
            .await
    }

    /// Ask the tutor persona
    async fn ask(&self, prompt: impl Into<String> + Send) -> Result<String> {
        let messages: [ChatMessage; 2] = prompts::tutor(prompt);
        self.llm
            .complete(&messages, self.settings.temperature)
            .await
    }

    async fn reply(&self, recipient: RecipientId, text: &str) -> Result<()> {
        self.transport.send_text(recipient, text).await
    }

    /// Send `text`, then the same text as speech
    ///
    /// A failed voice reply is apologized for, not propagated.
    async fn reply_with_voice(
        &self,
        recipient: RecipientId,
        text: &str,
        language: &LanguageProfile,
    ) -> Result<()> {
        self.reply(recipient, text).await?;

        if let Err(e) = self
            .delivery
            .pipeline
            .send_speech(self.transport.as_ref(), recipient, text, language, None)
            .await
        {
            tracing::warn!(recipient, error = %e, "voice reply failed");
            self.reply_best_effort(recipient, VOICE_REPLY_FAILED).await;
        }
        Ok(())
    }

    async fn reply_best_effort(&self, recipient: RecipientId, text: &str) {
        if let Err(e) = self.transport.send_text(recipient, text).await {
            tracing::warn!(recipient, error = %e, "failed to send reply");
        }
    }
}
