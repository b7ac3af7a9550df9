//! Telegram channel adapter
//!
//! Long-polls the Bot API for updates and sends replies through it.

mod api;
pub mod dedup;
pub mod polling;
pub mod types;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use super::{InboundEvent, MessagingTransport, RecipientId};
use crate::Result;
use crate::retry::RetryPolicy;

pub use dedup::UpdateDedup;
pub use types::BotCommand;

/// Capacity of the inbound event queue
const EVENT_QUEUE_CAPACITY: usize = 100;

/// Telegram channel adapter
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    client: Client,
    event_tx: Option<mpsc::Sender<InboundEvent>>,
    retry: RetryPolicy,
}

impl TelegramChannel {
    /// Create a send-only Telegram channel adapter
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
            event_tx: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Create with an event receiver for polling mode
    ///
    /// Returns the channel and a receiver for inbound events
    #[must_use]
    pub fn with_receiver(token: String) -> (Self, mpsc::Receiver<InboundEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let channel = Self {
            event_tx: Some(tx),
            ..Self::new(token)
        };
        (channel, rx)
    }

    /// Override the retry policy for rate-limited or failing sends
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Verify the token and return the bot's username
    ///
    /// # Errors
    ///
    /// Returns error if the token is rejected or the API is unreachable
    pub async fn connect(&self) -> Result<Option<String>> {
        let me = self.get_me().await?;
        tracing::info!(bot_id = me.id, username = ?me.username, "Telegram channel connected");
        Ok(me.username)
    }
}

#[async_trait]
impl MessagingTransport for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<()> {
        self.send_message(recipient, text).await
    }

    async fn send_voice(
        &self,
        recipient: RecipientId,
        audio: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        self.upload_voice(recipient, audio, caption).await
    }
}
