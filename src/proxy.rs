//! HTTP front for a chat-completion API.
//!
//! `GET /?text=...` forwards the text as a single user message and answers
//! with `{"message": ...}` holding the first completion, `{"error": ...}` with
//! 400 when `text` is missing, or `{"error": ...}` with 500 when the upstream
//! call fails.

use std::fmt;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::api::{ApiError, read_json};

/// Model every request is sent to.
pub const COMPLETION_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, PartialEq, Eq)]
pub enum ProxyConfigError {
    MissingApiKey,
    InvalidPort(String),
}

impl fmt::Display for ProxyConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "OPENAI_API_KEY is not set"),
            Self::InvalidPort(value) => write!(f, "PORT must be a port number, got '{value}'"),
        }
    }
}

impl std::error::Error for ProxyConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub api_key: String,
    pub port: u16,
    /// Base URL of the completion API, without a trailing slash.
    pub base_url: String,
}

impl ProxyConfig {
    /// Read `OPENAI_API_KEY`, `PORT` and `OPENAI_BASE_URL` from the process
    /// environment.
    pub fn from_env() -> Result<Self, ProxyConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProxyConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProxyConfigError::MissingApiKey)?;

        let port = match lookup("PORT") {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse()
                .map_err(|_| ProxyConfigError::InvalidPort(value))?,
            _ => DEFAULT_PORT,
        };

        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 1],
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct CompletionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Send `text` as one user message and return the first completion.
    pub async fn complete(&self, text: &str) -> Result<String, ApiError> {
        let request = CompletionRequest {
            model: COMPLETION_MODEL,
            messages: [CompletionMessage {
                role: "user",
                content: text,
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let completion: CompletionResponse = read_json(response).await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ApiError::Parse("response has no completion".to_string()))
    }
}

#[derive(Deserialize)]
pub struct CompletionQuery {
    text: Option<String>,
}

pub fn router(client: Arc<CompletionClient>) -> Router {
    Router::new().route("/", get(handle_completion)).with_state(client)
}

async fn handle_completion(
    State(client): State<Arc<CompletionClient>>,
    query: Result<Query<CompletionQuery>, QueryRejection>,
) -> Response {
    let text = match query {
        Ok(Query(query)) => query.text.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            info!("Rejected query string: {e}");
            None
        }
    };
    let Some(text) = text else {
        return (StatusCode::BAD_REQUEST, axum::Json(json!({ "error": "Text is required" }))).into_response();
    };

    info!("💬 Completion request ({} chars)", text.chars().count());

    match client.complete(&text).await {
        Ok(message) => axum::Json(json!({ "message": message })).into_response(),
        Err(e) => {
            error!("Completion failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({ "error": "Something went wrong" })),
            )
                .into_response()
        }
    }
}
