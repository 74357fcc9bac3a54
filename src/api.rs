//! Shared plumbing for the third-party HTTP APIs the bot and proxy call.

use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug)]
pub enum ApiError {
    Http(String),
    Status(u16, String),
    Parse(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {e}"),
            ApiError::Status(code, body) => write!(f, "API error {code}: {body}"),
            ApiError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Check the status of a response and decode its JSON body.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Http(e.to_string()))?;

    debug!("API response status: {status}");

    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16(), body));
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Single GET returning a decoded JSON body. No retries.
pub async fn get_json<T: DeserializeOwned>(http: &reqwest::Client, url: &str) -> Result<T, ApiError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::Http(e.to_string()))?;
    read_json(response).await
}
