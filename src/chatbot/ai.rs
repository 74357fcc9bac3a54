//! Client for the licensed GPT proxy behind `+` queries.

use serde::Deserialize;
use tracing::info;

use crate::api::{ApiError, get_json};

pub struct AiClient {
    endpoint: String,
    license: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct AiResponse {
    #[serde(default)]
    result: serde_json::Value,
}

impl AiClient {
    pub fn new(endpoint: String, license: String) -> Self {
        Self {
            endpoint,
            license,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, query: &str) -> String {
        format!(
            "{}?q={}&license={}",
            self.endpoint,
            urlencoding::encode(query),
            urlencoding::encode(&self.license)
        )
    }

    /// Ask the proxy. `Ok(None)` when it answered without a usable result.
    pub async fn ask(&self, query: &str) -> Result<Option<String>, ApiError> {
        info!("🤖 AI query: {}", query);
        let response: AiResponse = get_json(&self.http, &self.url(query)).await?;

        Ok(match response.result {
            serde_json::Value::String(answer) if !answer.trim().is_empty() => Some(answer),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_url_encodes_query_and_license() {
        let client = AiClient::new("https://ai.example/gpt".into(), "a&b".into());
        assert_eq!(client.url("what is 1+1?"), "https://ai.example/gpt?q=what%20is%201%2B1%3F&license=a%26b");
    }

    #[tokio::test]
    async fn test_ask_returns_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gpt")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "سلام".into()),
                Matcher::UrlEncoded("license".into(), "lic".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": "درود"}"#)
            .create_async()
            .await;

        let client = AiClient::new(format!("{}/gpt", server.url()), "lic".into());
        assert_eq!(client.ask("سلام").await.unwrap().as_deref(), Some("درود"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_falsy_result_is_no_answer() {
        for body in [r#"{"result": ""}"#, r#"{"result": null}"#, r#"{"result": false}"#, "{}"] {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/gpt")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let client = AiClient::new(format!("{}/gpt", server.url()), String::new());
            assert_eq!(client.ask("x").await.unwrap(), None, "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gpt")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = AiClient::new(format!("{}/gpt", server.url()), String::new());
        assert!(matches!(client.ask("x").await, Err(ApiError::Status(502, _))));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gpt")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = AiClient::new(format!("{}/gpt", server.url()), String::new());
        assert!(matches!(client.ask("x").await, Err(ApiError::Parse(_))));
    }
}
