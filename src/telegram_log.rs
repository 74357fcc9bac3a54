//! Forwards the bot's own log events to an operator chat.
//!
//! WARN and ERROR go out as soon as they arrive. INFO lines are collected and
//! sent as one message every few seconds, or earlier when the batch fills up.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Telegram rejects messages longer than 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const MAX_BATCH: usize = 50;

/// Targets whose events are never forwarded. Sending a log message goes
/// through these crates, so forwarding their events would feed back into
/// the channel.
const MUTED_TARGETS: [&str; 4] = ["teloxide", "reqwest", "hyper", "h2"];

#[derive(Debug, PartialEq, Eq)]
enum LogLine {
    Urgent(String),
    Info(String),
}

pub struct TelegramLogLayer {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl TelegramLogLayer {
    /// Must be called inside a tokio runtime: the sender task is spawned here.
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_logs(bot, chat_id, rx));
        Self { tx }
    }
}

async fn forward_logs(bot: Bot, chat_id: ChatId, mut rx: mpsc::UnboundedReceiver<LogLine>) {
    let mut batch = InfoBatch::default();
    let mut interval = tokio::time::interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(LogLine::Urgent(text)) => send_log(&bot, chat_id, &text).await,
                Some(LogLine::Info(text)) => {
                    if let Some(full) = batch.push(text) {
                        send_log(&bot, chat_id, &full).await;
                    }
                }
                None => break,
            },
            _ = interval.tick() => {
                if let Some(pending) = batch.take() {
                    send_log(&bot, chat_id, &pending).await;
                }
            }
        }
    }

    if let Some(pending) = batch.take() {
        send_log(&bot, chat_id, &pending).await;
    }
}

/// Pending INFO lines.
#[derive(Default)]
struct InfoBatch {
    lines: Vec<String>,
}

impl InfoBatch {
    /// Add a line. Returns the joined batch once it is full.
    fn push(&mut self, line: String) -> Option<String> {
        self.lines.push(line);
        if self.lines.len() >= MAX_BATCH {
            return self.take();
        }
        None
    }

    fn take(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let joined = self.lines.join("\n");
        self.lines.clear();
        Some(joined)
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
    format!("{head}...")
}

async fn send_log(bot: &Bot, chat_id: ChatId, text: &str) {
    // Logging from here would loop back into the channel
    if let Err(e) = bot.send_message(chat_id, truncate(text)).await {
        eprintln!("Failed to forward log to Telegram: {e}");
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let fields = std::mem::take(&mut self.message);
            self.message = format!("{value:?}");
            if !fields.is_empty() {
                self.message.push_str(&format!(" ({fields})"));
            }
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message.push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

fn classify(level: Level, message: String) -> Option<LogLine> {
    match level {
        Level::ERROR => Some(LogLine::Urgent(format!("❌ {message}"))),
        Level::WARN => Some(LogLine::Urgent(format!("⚠️ {message}"))),
        Level::INFO => Some(LogLine::Info(message)),
        _ => None,
    }
}

fn is_muted(target: &str) -> bool {
    MUTED_TARGETS
        .iter()
        .any(|muted| target == *muted || target.starts_with(&format!("{muted}::")))
}

impl<S: Subscriber> Layer<S> for TelegramLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::INFO || is_muted(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if let Some(line) = classify(*metadata.level(), visitor.message) {
            // The receiver only goes away when the runtime shuts down
            let _ = self.tx.send(line);
        }
    }
}
