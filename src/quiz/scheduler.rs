//! Periodic quiz broadcast to subscribers

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use super::generator::QuizGenerator;
use super::session::QuizSessionStore;
use super::subscriptions::SubscriptionRegistry;
use crate::Result;
use crate::audio::AudioPipeline;
use crate::channels::{MessagingTransport, RecipientId};

/// Sent when a quiz could not be generated
pub const GENERATION_APOLOGY: &str =
    "Sorry, I couldn't generate a quiz question at the moment. Please try again later.";

/// Outcome counts for one broadcast round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Everything needed to deliver a quiz to one recipient
pub struct QuizDelivery {
    pub sessions: Arc<QuizSessionStore>,
    pub generator: Arc<QuizGenerator>,
    pub pipeline: Arc<AudioPipeline>,
    pub transport: Arc<dyn MessagingTransport>,
}

impl QuizDelivery {
    /// Generate a quiz, speak its sentence, list the options and await an answer
    ///
    /// Generation failures send a best-effort apology. A session is opened
    /// only after both messages went out.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error
    pub async fn deliver(&self, recipient: RecipientId) -> Result<()> {
        let question = match self.generator.generate().await {
            Ok(question) => question,
            Err(e) => {
                if let Err(send_err) = self.transport.send_text(recipient, GENERATION_APOLOGY).await {
                    tracing::warn!(recipient, error = %send_err, "failed to send quiz apology");
                }
                return Err(e);
            }
        };

        let target = self.generator.target_language().display_name();
        let caption = format!("Listen to the sentence and provide the correct {target} translation.");

        self.pipeline
            .send_speech(
                self.transport.as_ref(),
                recipient,
                question.prompt_sentence(),
                self.generator.prompt_language(),
                Some(&caption),
            )
            .await?;

        let options = format!(
            "{}\n\nPlease type your {target} translation:",
            question.options_text()
        );
        self.transport.send_text(recipient, &options).await?;

        self.sessions.open(recipient, question);
        Ok(())
    }
}

/// Sends a quiz to every subscriber on a fixed interval
pub struct BroadcastScheduler {
    registry: Arc<SubscriptionRegistry>,
    delivery: Arc<QuizDelivery>,
    interval: Duration,
    concurrency: usize,
}

impl BroadcastScheduler {
    /// `concurrency` bounds in-flight recipients per tick (minimum 1)
    #[must_use]
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        delivery: Arc<QuizDelivery>,
        interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            registry,
            delivery,
            interval,
            concurrency: concurrency.max(1),
        }
    }

    /// Deliver one quiz to every current subscriber
    ///
    /// Failures are logged per recipient and never stop the round.
    pub async fn tick(&self) -> TickReport {
        let started = Instant::now();
        let recipients = self.registry.list();
        tracing::info!(subscribers = recipients.len(), "scheduled quiz started");

        let outcomes: Vec<bool> = stream::iter(recipients)
            .map(|recipient| async move {
                match self.delivery.deliver(recipient).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(recipient, error = %e, "scheduled quiz failed");
                        false
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        let report = TickReport {
            delivered,
            failed: outcomes.len() - delivered,
        };

        tracing::info!(
            delivered = report.delivered,
            failed = report.failed,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "scheduled quiz completed"
        );
        report
    }

    /// Tick on the configured interval until `shutdown_rx` fires or closes
    ///
    /// The first tick happens one interval after start. A tick in progress
    /// is finished before shutdown is observed.
    pub async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Skip the first immediate tick
        interval.tick().await;

        tracing::info!(interval_secs = self.interval.as_secs(), "quiz scheduler started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!("quiz scheduler stopped");
    }
}
