//! Outbound side of the bot.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ReplyParameters};
use tracing::{info, warn};

/// Where the engine sends its replies.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Send plain text, optionally as a reply. Returns the new message id.
    async fn send_text(&self, chat_id: i64, text: &str, reply_to_message_id: Option<i64>) -> Result<i64, String>;

    /// Send a photo by URL. Returns the new message id.
    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<i64, String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbox for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str, reply_to_message_id: Option<i64>) -> Result<i64, String> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn send_photo(&self, chat_id: i64, url: &str) -> Result<i64, String> {
        info!("📷 Sending image to chat {}: {}", chat_id, url);

        let url = reqwest::Url::parse(url).map_err(|e| {
            let msg = format!("Invalid image URL {url:?}: {e}");
            warn!("{}", msg);
            msg
        })?;

        self.bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send image: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
