//! Telegram polling mode: getUpdates loop and update conversion

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use super::TelegramChannel;
use super::dedup::UpdateDedup;
use crate::channels::{InboundEvent, InboundKind};
use crate::{Error, Result};

/// Long-poll timeout passed to getUpdates, in seconds
const LONG_POLL_SECS: u64 = 30;

/// Response from Telegram getUpdates API
#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    result: Vec<PollingUpdate>,
}

/// A single update from getUpdates
#[derive(Debug, Deserialize)]
struct PollingUpdate {
    update_id: i64,
    message: Option<PollingMessage>,
}

/// Message from a polling update
#[derive(Debug, Deserialize)]
struct PollingMessage {
    chat: PollingChat,
    from: Option<PollingUser>,
    text: Option<String>,
    voice: Option<PollingVoice>,
}

/// Voice note from polling
#[derive(Debug, Deserialize)]
struct PollingVoice {
    file_id: String,
    duration: Option<u32>,
}

/// Chat info from polling
#[derive(Debug, Deserialize)]
struct PollingChat {
    id: i64,
}

/// User info from polling
#[derive(Debug, Deserialize)]
struct PollingUser {
    id: i64,
    is_bot: bool,
    first_name: String,
}

/// What an update asks the bot to handle before any download
#[derive(Debug, PartialEq, Eq)]
enum PendingKind {
    Text(String),
    Voice { file_id: String },
}

#[derive(Debug, PartialEq, Eq)]
struct PendingEvent {
    recipient: i64,
    sender: i64,
    sender_name: String,
    kind: PendingKind,
}

impl TelegramChannel {
    /// Spawn a background task that polls Telegram's getUpdates API
    ///
    /// Voice notes are downloaded before being forwarded, so consumers see
    /// raw audio bytes. The task runs until aborted or the receiver closes.
    ///
    /// # Errors
    ///
    /// Returns error if the channel was created without a receiver
    pub fn start_polling(&self, interval: Duration) -> Result<tokio::task::JoinHandle<()>> {
        let tx = self.event_tx.clone().ok_or_else(|| {
            Error::Config("start_polling requires a receiver (use with_receiver)".to_string())
        })?;
        let channel = self.clone();

        Ok(tokio::spawn(async move {
            channel.polling_loop(tx, interval).await;
        }))
    }

    /// Run the polling loop (background task)
    async fn polling_loop(&self, tx: mpsc::Sender<InboundEvent>, interval: Duration) {
        // getUpdates fails while a webhook is set
        let delete_url = self.method_url("deleteWebhook");
        if let Err(e) = self.client.post(&delete_url).send().await {
            tracing::warn!(error = %e, "failed to delete Telegram webhook before polling");
        }

        let mut offset: Option<i64> = None;
        let mut dedup = UpdateDedup::default();
        let url = self.method_url("getUpdates");

        tracing::info!("Telegram polling started");

        loop {
            let mut params = serde_json::json!({
                "timeout": LONG_POLL_SECS,
                "allowed_updates": ["message"],
            });
            if let Some(off) = offset {
                params["offset"] = serde_json::json!(off);
            }

            let updates = match self.client.post(&url).json(&params).send().await {
                Ok(resp) => match resp.json::<GetUpdatesResponse>().await {
                    Ok(body) => body.result,
                    Err(e) => {
                        tracing::warn!(error = %e, "unreadable getUpdates response");
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Telegram getUpdates error");
                    Vec::new()
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);

                if dedup.is_duplicate(update.update_id) {
                    continue;
                }

                let Some(pending) = update_to_pending(update) else {
                    continue;
                };

                let Some(event) = self.resolve_pending(pending).await else {
                    continue;
                };

                if tx.send(event).await.is_err() {
                    tracing::info!("event receiver closed, stopping Telegram polling");
                    return;
                }
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Download voice payloads; drops the event if the download fails
    async fn resolve_pending(&self, pending: PendingEvent) -> Option<InboundEvent> {
        let kind = match pending.kind {
            PendingKind::Text(text) => InboundKind::Text(text),
            PendingKind::Voice { file_id } => match self.download_file(&file_id).await {
                Ok(bytes) => InboundKind::Voice(bytes),
                Err(e) => {
                    tracing::warn!(chat_id = pending.recipient, error = %e, "voice download failed");
                    if let Err(e) = self
                        .send_message(
                            pending.recipient,
                            "Sorry, I couldn't download your voice message. Please try again.",
                        )
                        .await
                    {
                        tracing::warn!(chat_id = pending.recipient, error = %e, "failed to notify user");
                    }
                    return None;
                }
            },
        };

        Some(InboundEvent {
            recipient: pending.recipient,
            sender: pending.sender,
            sender_name: pending.sender_name,
            kind,
        })
    }
}

/// Convert a polling update into a pending event
///
/// Skips bot senders and messages with neither text nor a voice note.
fn update_to_pending(update: PollingUpdate) -> Option<PendingEvent> {
    let msg = update.message?;

    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        return None;
    }

    let kind = if let Some(voice) = msg.voice {
        tracing::debug!(chat_id = msg.chat.id, duration = ?voice.duration, "voice note received");
        PendingKind::Voice {
            file_id: voice.file_id,
        }
    } else {
        PendingKind::Text(msg.text.filter(|t| !t.trim().is_empty())?)
    };

    let (sender, sender_name) = msg
        .from
        .map_or_else(|| (msg.chat.id, "Unknown".to_string()), |u| (u.id, u.first_name));

    Some(PendingEvent {
        recipient: msg.chat.id,
        sender,
        sender_name,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> PollingUpdate {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn text_message_converts() {
        let update = parse(
            r#"{"update_id":1,"message":{"message_id":5,"chat":{"id":42,"type":"private"},
                "from":{"id":7,"is_bot":false,"first_name":"Ada"},"text":"/quiz"}}"#,
        );

        assert_eq!(
            update_to_pending(update),
            Some(PendingEvent {
                recipient: 42,
                sender: 7,
                sender_name: "Ada".to_string(),
                kind: PendingKind::Text("/quiz".to_string()),
            })
        );
    }

    #[test]
    fn voice_message_converts_to_file_ref() {
        let update = parse(
            r#"{"update_id":2,"message":{"message_id":6,"chat":{"id":42,"type":"private"},
                "from":{"id":7,"is_bot":false,"first_name":"Ada"},
                "voice":{"file_id":"AwAD","duration":3,"mime_type":"audio/ogg"}}}"#,
        );

        let pending = update_to_pending(update).unwrap();
        assert_eq!(
            pending.kind,
            PendingKind::Voice {
                file_id: "AwAD".to_string()
            }
        );
    }

    #[test]
    fn bot_messages_are_skipped() {
        let update = parse(
            r#"{"update_id":3,"message":{"message_id":7,"chat":{"id":42,"type":"private"},
                "from":{"id":9,"is_bot":true,"first_name":"Other"},"text":"hi"}}"#,
        );
        assert!(update_to_pending(update).is_none());
    }

    #[test]
    fn empty_and_non_message_updates_are_skipped() {
        let sticker = parse(
            r#"{"update_id":4,"message":{"message_id":8,"chat":{"id":42,"type":"private"},
                "from":{"id":7,"is_bot":false,"first_name":"Ada"},"sticker":{"file_id":"x"}}}"#,
        );
        assert!(update_to_pending(sticker).is_none());

        let edited = parse(r#"{"update_id":5,"edited_message":{}}"#);
        assert!(update_to_pending(edited).is_none());
    }

    #[test]
    fn missing_sender_falls_back_to_chat() {
        let update = parse(
            r#"{"update_id":6,"message":{"message_id":9,"chat":{"id":-100,"type":"channel"},"text":"hello"}}"#,
        );
        let pending = update_to_pending(update).unwrap();
        assert_eq!(pending.sender, -100);
        assert_eq!(pending.sender_name, "Unknown");
    }

    #[test]
    fn polling_endpoints_share_the_api_base() {
        let channel = TelegramChannel::new("123:abc".to_string());
        assert_eq!(
            channel.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
        assert!(channel.method_url("deleteWebhook").ends_with("/deleteWebhook"));
    }
}
