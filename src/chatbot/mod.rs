//! Chatbot module - keyword replies, AI queries and image search for Telegram.

pub mod ai;
pub mod cache;
pub mod calendar;
pub mod commands;
pub mod engine;
pub mod images;
pub mod members;
pub mod message;
pub mod responses;
pub mod storage;
pub mod telegram;


pub use engine::{ChatbotConfig, ChatbotEngine, Stores};
pub use members::Member;
pub use message::ChatMessage;
pub use telegram::{Outbox, TelegramClient};
