use super::{Freshness, UpstreamError, UpstreamHttp};
use crate::config::UpstreamSettings;
use async_trait::async_trait;
use serde::Deserialize;

/// Response from the Trump policy-risk index service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrumpIndexPayload {
    pub z_score: f64,
    pub freshness: Freshness,
}

#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn fetch_policy_index(&self) -> Result<TrumpIndexPayload, UpstreamError>;
}

#[derive(Clone)]
pub struct TrumpIndexClient {
    http: UpstreamHttp,
    url: String,
}

impl TrumpIndexClient {
    pub fn new(url: impl Into<String>, settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: UpstreamHttp::new("policy", settings)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PolicySource for TrumpIndexClient {
    async fn fetch_policy_index(&self) -> Result<TrumpIndexPayload, UpstreamError> {
        let payload: TrumpIndexPayload = self.http.get_json(&self.url).await?;

        tracing::debug!(
            "Policy index z={:.2} from {}",
            payload.z_score,
            payload.freshness.data_source
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_policy_index() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/trump-index")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"zScore": 0.82, "freshness": {"dataSource": "mock"}}"#)
            .create_async()
            .await;

        let client = TrumpIndexClient::new(
            format!("{}/api/trump-index", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();
        let payload = client.fetch_policy_index().await.unwrap();

        assert_eq!(payload.z_score, 0.82);
        assert!(!payload.freshness.is_live());
    }

    #[tokio::test]
    async fn test_missing_z_score_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/trump-index")
            .with_status(200)
            .with_body(r#"{"freshness": {"dataSource": "live"}}"#)
            .create_async()
            .await;

        let client = TrumpIndexClient::new(
            format!("{}/api/trump-index", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();

        let result = client.fetch_policy_index().await;
        assert!(matches!(result, Err(UpstreamError::Decode { service: "policy", .. })));
    }
}
