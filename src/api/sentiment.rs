use super::{UpstreamError, UpstreamHttp};
use crate::config::UpstreamSettings;
use async_trait::async_trait;
use serde::Deserialize;

/// Response from the sentiment index service
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentPayload {
    pub score: f64,
    #[serde(default)]
    pub regime: String,
    #[serde(default)]
    pub as_of: String,
    #[serde(default)]
    pub subscores: Vec<Subscore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscore {
    pub name: String,
    pub score: f64,
}

impl SentimentPayload {
    /// Look up a named component score (e.g. "Market Volatility")
    pub fn subscore(&self, name: &str) -> Option<f64> {
        self.subscores
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.score)
    }
}

#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn fetch_sentiment(&self) -> Result<SentimentPayload, UpstreamError>;
}

/// Client for the sentiment index service
#[derive(Clone)]
pub struct SentimentClient {
    http: UpstreamHttp,
    url: String,
}

impl SentimentClient {
    pub fn new(url: impl Into<String>, settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: UpstreamHttp::new("sentiment", settings)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SentimentSource for SentimentClient {
    async fn fetch_sentiment(&self) -> Result<SentimentPayload, UpstreamError> {
        tracing::debug!("Fetching sentiment index from {}", self.url);

        let payload: SentimentPayload = self.http.get_json(&self.url).await?;

        tracing::debug!(
            "Sentiment score {:.1} ({}) with {} subscores",
            payload.score,
            payload.regime,
            payload.subscores.len()
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_sentiment() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sentiment")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "score": 68.5,
                    "regime": "Risk-On",
                    "as_of": "2025-03-14T15:30:00Z",
                    "subscores": [
                        {"name": "Market Volatility", "score": 72},
                        {"name": "Risk Appetite", "score": 61}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = SentimentClient::new(
            format!("{}/api/sentiment", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();
        let payload = client.fetch_sentiment().await.unwrap();

        assert_eq!(payload.score, 68.5);
        assert_eq!(payload.regime, "Risk-On");
        assert_eq!(payload.subscore("Market Volatility"), Some(72.0));
        assert_eq!(payload.subscore("Risk Appetite"), Some(61.0));
        assert_eq!(payload.subscore("Momentum"), None);
    }

    #[tokio::test]
    async fn test_fetch_sentiment_without_subscores() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sentiment")
            .with_status(200)
            .with_body(r#"{"score": 40}"#)
            .create_async()
            .await;

        let client = SentimentClient::new(
            format!("{}/api/sentiment", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();
        let payload = client.fetch_sentiment().await.unwrap();

        assert_eq!(payload.score, 40.0);
        assert!(payload.subscores.is_empty());
    }
}
