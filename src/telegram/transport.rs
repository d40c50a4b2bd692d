//! Chat transport
//!
//! The replacement flow only needs three operations from the chat
//! platform: upload a video, post a text notice, delete a message. The
//! [`ChatTransport`] trait captures exactly those, so tests can drive the
//! flow with a recording stub while production wraps the teloxide `Bot`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use thiserror::Error;
use tokio::time::timeout;

use crate::telegram::Bot;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),

    #[error("upload timed out after {0}s")]
    Timeout(u64),

    /// Catch-all used by test stubs and wrappers.
    #[error("{0}")]
    Other(String),
}

/// The three chat operations the core depends on.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Upload a local file as a video attachment.
    async fn send_video(&self, chat_id: ChatId, file: &Path, caption: Option<&str>)
        -> Result<(), TransportError>;

    /// Post a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;

    /// Delete a message by id.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError>;
}

/// Production transport around the teloxide `Bot`. Uploads are bounded by
/// the configured timeout; text and delete calls are small enough to ride
/// on the client's own timeouts.
pub struct TelegramTransport {
    bot: Bot,
    upload_timeout: Duration,
}

impl TelegramTransport {
    pub fn new(bot: Bot, upload_timeout: Duration) -> Self {
        Self { bot, upload_timeout }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_video(
        &self,
        chat_id: ChatId,
        file: &Path,
        caption: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .send_video(chat_id, InputFile::file(file.to_path_buf()))
            .supports_streaming(true);
        if let Some(caption) = caption {
            request = request.caption(caption.to_string());
        }

        match timeout(self.upload_timeout, request.send()).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(TransportError::Timeout(self.upload_timeout.as_secs())),
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }
}
