//! Raw Telegram Bot API calls

use reqwest::StatusCode;

use super::types::{
    API_BASE, BotCommand, BotUser, FILE_BASE, GetFileRequest, MAX_MESSAGE_CHARS,
    SendMessageRequest, SetMyCommandsRequest, TelegramFile, TelegramResponse,
};
use crate::retry::{delay_for_attempt, is_recoverable, parse_retry_after};
use crate::text::split_text;
use crate::{Error, Result};

/// Whether an error body means the chat can never be reached
fn is_unreachable(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("chat not found")
        || lower.contains("bot was blocked by the user")
        || lower.contains("user is deactivated")
}

impl super::TelegramChannel {
    pub(super) fn method_url(&self, method: &str) -> String {
        format!("{API_BASE}{}/{method}", self.token)
    }

    /// Send a request built by `build`, retrying on 429 and 5xx
    ///
    /// Honors Telegram's `retry_after` hint when present.
    async fn send_with_retry<F>(&self, method: &str, chat_id: i64, build: F) -> Result<()>
    where
        F: Fn() -> Result<reqwest::RequestBuilder>,
    {
        let mut attempt = 0;
        loop {
            let response = build()?
                .send()
                .await
                .map_err(|e| Error::Transport(format!("Telegram {method} error: {e}")))?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();

            if is_unreachable(&body) {
                return Err(Error::Transport(format!(
                    "Telegram chat {chat_id} not reachable: {body}"
                )));
            }

            if is_recoverable(status.as_u16(), &body) && attempt + 1 < self.retry.max_attempts {
                let delay = delay_for_attempt(&self.retry, attempt, parse_retry_after(&body));
                tracing::warn!(chat_id, method, status = %status, ?delay, "Telegram send throttled, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(Error::Transport(format!(
                "Telegram {method} error: {status} - {body}"
            )));
        }
    }

    /// Send a plain-text message, split to fit Telegram's size cap
    ///
    /// # Errors
    ///
    /// Returns error if any part fails to send
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = self.method_url("sendMessage");

        for part in split_text(text, MAX_MESSAGE_CHARS) {
            self.send_with_retry("sendMessage", chat_id, || {
                Ok(self.client.post(&url).json(&SendMessageRequest {
                    chat_id,
                    text: &part,
                    disable_web_page_preview: Some(true),
                }))
            })
            .await?;
        }

        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Upload audio bytes as a voice message
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn upload_voice(
        &self,
        chat_id: i64,
        audio: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let url = self.method_url("sendVoice");
        let audio_bytes = audio.len();

        self.send_with_retry("sendVoice", chat_id, || {
            let part = reqwest::multipart::Part::bytes(audio.clone())
                .file_name("voice.mp3")
                .mime_str("audio/mpeg")
                .map_err(|e| Error::Transport(format!("Telegram sendVoice error: {e}")))?;

            let mut form = reqwest::multipart::Form::new()
                .text("chat_id", chat_id.to_string())
                .part("voice", part);
            if let Some(caption) = caption {
                form = form.text("caption", caption.to_string());
            }

            Ok(self.client.post(&url).multipart(form))
        })
        .await?;

        tracing::debug!(chat_id, audio_bytes, "Telegram voice message sent");
        Ok(())
    }

    /// Download a file from Telegram by `file_id`.
    ///
    /// Calls `getFile` to get the file path, then downloads from
    /// `https://api.telegram.org/file/bot{token}/{file_path}`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request or download fails
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.method_url("getFile"))
            .json(&GetFileRequest { file_id })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Telegram getFile error: {e}")))?;

        let parsed: TelegramResponse<TelegramFile> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Telegram getFile parse error: {e}")))?;

        let file = parsed.result.ok_or_else(|| {
            Error::Transport(format!(
                "Telegram getFile error: {}",
                parsed.description.unwrap_or_default()
            ))
        })?;
        let file_path = file
            .file_path
            .ok_or_else(|| Error::Transport("Telegram getFile returned no file_path".to_string()))?;

        let download = self
            .client
            .get(format!("{FILE_BASE}{}/{file_path}", self.token))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Telegram file download error: {e}")))?;

        if download.status() != StatusCode::OK {
            return Err(Error::Transport(format!(
                "Telegram file download error: {}",
                download.status()
            )));
        }

        let bytes = download
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Telegram file download error: {e}")))?;

        tracing::debug!(file_id, expected = ?file.file_size, bytes = bytes.len(), "Telegram file downloaded");
        Ok(bytes.to_vec())
    }

    /// Register the bot's command menu
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    pub async fn sync_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("setMyCommands"))
            .json(&SetMyCommandsRequest { commands })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Telegram setMyCommands error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "Telegram setMyCommands error: {status} - {body}"
            )));
        }

        tracing::info!(count = commands.len(), "Telegram commands synced");
        Ok(())
    }

    /// Fetch the bot's own account
    pub(crate) async fn get_me(&self) -> Result<BotUser> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Telegram getMe error: {e}")))?;

        let status = response.status();
        let parsed: TelegramResponse<BotUser> = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Telegram getMe parse error: {e}")))?;

        if !parsed.ok {
            return Err(Error::Config(format!(
                "Telegram rejected bot token: {status} - {}",
                parsed.description.unwrap_or_default()
            )));
        }

        parsed
            .result
            .ok_or_else(|| Error::Transport("Telegram getMe returned no result".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_bodies() {
        assert!(is_unreachable(r#"{"description":"Bad Request: chat not found"}"#));
        assert!(is_unreachable("Forbidden: bot was blocked by the user"));
        assert!(!is_unreachable("Too Many Requests: retry after 3"));
    }

    #[test]
    fn method_url_embeds_token() {
        let channel = super::super::TelegramChannel::new("123:abc".to_string());
        assert_eq!(
            channel.method_url("getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }
}
