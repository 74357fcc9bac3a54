//! Chat-completion proxy.
//!
//! Usage: chat_proxy
//!
//! Reads OPENAI_API_KEY (required), PORT (default 9000) and OPENAI_BASE_URL
//! from the environment or a `.env` file, then serves `GET /?text=...`.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use dastyar::proxy::{CompletionClient, ProxyConfig, router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let client = Arc::new(CompletionClient::new(config.api_key, config.base_url.clone()));
    let app = router(client);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("🚀 Chat proxy listening on http://{addr} (upstream {})", config.base_url);

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {e}");
    }
    info!("👋 Stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
