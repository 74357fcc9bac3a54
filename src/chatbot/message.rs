//! Inbound message as the engine sees it.

use teloxide::types::{Message, User};

use crate::chatbot::members::Member;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub message_id: i64,
    /// Chat ID where this message was sent (negative = group, positive = DM).
    pub chat_id: i64,
    pub sender: Member,
    /// Message text; empty for media without a caption.
    pub text: String,
    /// Author of the message this one replies to.
    pub reply_to: Option<Member>,
}

impl ChatMessage {
    /// Build from a Telegram update. `None` for messages without a sender
    /// (channel posts).
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let sender = member_from_user(msg.from.as_ref()?);
        let reply_to = msg
            .reply_to_message()
            .and_then(|reply| reply.from.as_ref())
            .map(member_from_user);

        Some(Self {
            message_id: msg.id.0 as i64,
            chat_id: msg.chat.id.0,
            sender,
            text: msg.text().unwrap_or("").to_string(),
            reply_to,
        })
    }
}

fn member_from_user(user: &User) -> Member {
    Member {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    }
}
