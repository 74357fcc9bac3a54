//! Dastyar - a Persian group-chat assistant for Telegram and the small
//! chat-completion proxy that can sit behind its `+` queries.

pub mod api;
pub mod chatbot;
pub mod config;
pub mod locale;
pub mod proxy;
pub mod telegram_log;
