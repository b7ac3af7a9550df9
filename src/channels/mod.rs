//! Messaging transport
//!
//! The bot talks to users through a [`MessagingTransport`]; inbound traffic
//! arrives as [`InboundEvent`]s on an mpsc channel.

pub mod telegram;

use async_trait::async_trait;

pub use telegram::{BotCommand, TelegramChannel, UpdateDedup};

use crate::Result;

/// Addressable chat on the transport
pub type RecipientId = i64;

/// Payload of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Plain text or a `/command`
    Text(String),
    /// Raw native voice note container, already downloaded
    Voice(Vec<u8>),
}

/// A message from a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Chat to reply to
    pub recipient: RecipientId,

    /// User who sent the message
    pub sender: i64,

    /// Sender display name
    pub sender_name: String,

    pub kind: InboundKind,
}

/// Outbound side of a messaging platform
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Get the transport name
    fn name(&self) -> &'static str;

    /// Send a plain text message
    async fn send_text(&self, recipient: RecipientId, text: &str) -> Result<()>;

    /// Send encoded audio as a voice message
    async fn send_voice(
        &self,
        recipient: RecipientId,
        audio: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()>;
}
