//! Client for the image search API.

use serde::Deserialize;
use tracing::info;

use crate::api::{ApiError, get_json};

pub struct ImageClient {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: serde_json::Value,
}

impl ImageClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http: reqwest::Client::new(),
        }
    }

    /// Image URLs matching `query`; empty when nothing was found.
    pub async fn search(&self, query: &str) -> Result<Vec<String>, ApiError> {
        info!("🔎 Image search: {}", query);
        let url = format!("{}?v=4&text={}", self.endpoint, urlencoding::encode(query));
        let response: SearchResponse = get_json(&self.http, &url).await?;

        let urls = match response.result {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(url) if !url.is_empty() => Some(url),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_returns_urls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/img.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("v".into(), "4".into()),
                Matcher::UrlEncoded("text".into(), "گربه".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"result": ["https://img.example/1.jpg", "https://img.example/2.jpg"]}"#)
            .create_async()
            .await;

        let client = ImageClient::new(format!("{}/img.php", server.url()));
        let urls = client.search("گربه").await.unwrap();
        assert_eq!(urls, vec!["https://img.example/1.jpg", "https://img.example/2.jpg"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_result_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/img.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok": false}"#)
            .create_async()
            .await;

        let client = ImageClient::new(format!("{}/img.php", server.url()));
        assert!(client.search("x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/img.php")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = ImageClient::new(format!("{}/img.php", server.url()));
        assert!(matches!(client.search("x").await, Err(ApiError::Status(500, _))));
    }
}
