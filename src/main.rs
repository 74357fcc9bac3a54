use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

use dastyar::chatbot::{ChatMessage, ChatbotConfig, ChatbotEngine, Stores, TelegramClient};
use dastyar::config::Config;
use dastyar::telegram_log::TelegramLogLayer;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("dastyar.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_chat_id) = config.log_chat_id {
        registry.with(TelegramLogLayer::new(bot.clone(), log_chat_id)).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting dastyar...");
    info!("Loaded config from {config_path}");
    info!("Data directory: {}", config.data_dir.display());

    let stores = Stores::open(&config.data_dir);
    info!(
        "Loaded {} users, {} admins, {} taught keywords",
        stores.members.user_count(),
        stores.members.admin_count(),
        stores.responses.entries().len()
    );

    let telegram = Arc::new(TelegramClient::new(bot.clone()));
    let engine = Arc::new(ChatbotEngine::new(ChatbotConfig::from(&config), stores, telegram));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("👋 Stopped");
}

async fn handle_new_message(msg: Message, engine: Arc<ChatbotEngine>) -> ResponseResult<()> {
    let Some(chat_msg) = ChatMessage::from_telegram(&msg) else {
        debug!("Ignoring message {} without a sender", msg.id);
        return Ok(());
    };

    let preview: String = chat_msg.text.chars().take(100).collect();
    info!(
        "Message from {} ({}) in {}: \"{preview}\"",
        chat_msg.sender.first_name, chat_msg.sender.id, chat_msg.chat_id
    );

    engine.handle_message(&chat_msg).await;
    Ok(())
}
