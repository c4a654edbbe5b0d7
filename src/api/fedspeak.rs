use super::{Freshness, UpstreamError, UpstreamHttp};
use crate::config::UpstreamSettings;
use crate::models::FedTone;
use async_trait::async_trait;
use serde::Deserialize;

/// Response from the Fedspeak tone service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FedspeakPayload {
    pub current_tone: FedTone,
    pub tone_score: f64,
    pub freshness: Freshness,
}

#[async_trait]
pub trait FedspeakSource: Send + Sync {
    async fn fetch_fed_tone(&self) -> Result<FedspeakPayload, UpstreamError>;
}

#[derive(Clone)]
pub struct FedspeakClient {
    http: UpstreamHttp,
    url: String,
}

impl FedspeakClient {
    pub fn new(url: impl Into<String>, settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: UpstreamHttp::new("fedspeak", settings)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl FedspeakSource for FedspeakClient {
    async fn fetch_fed_tone(&self) -> Result<FedspeakPayload, UpstreamError> {
        let payload: FedspeakPayload = self.http.get_json(&self.url).await?;

        tracing::debug!(
            "Fed tone {:?} ({:.2}) from {}",
            payload.current_tone,
            payload.tone_score,
            payload.freshness.data_source
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_fetch_fed_tone() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/fedspeak")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"currentTone": "hawkish", "toneScore": 0.64, "freshness": {"dataSource": "live"}}"#,
            )
            .create_async()
            .await;

        let client = FedspeakClient::new(
            format!("{}/api/fedspeak", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();
        let payload = client.fetch_fed_tone().await.unwrap();

        assert_eq!(payload.current_tone, FedTone::Hawkish);
        assert_eq!(payload.tone_score, 0.64);
        assert!(payload.freshness.is_live());
    }

    #[tokio::test]
    async fn test_unknown_tone_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/fedspeak")
            .with_status(200)
            .with_body(
                r#"{"currentTone": "confused", "toneScore": 0.0, "freshness": {"dataSource": "live"}}"#,
            )
            .create_async()
            .await;

        let client = FedspeakClient::new(
            format!("{}/api/fedspeak", server.url()),
            &UpstreamSettings::default(),
        )
        .unwrap();

        assert_err!(client.fetch_fed_tone().await);
    }
}
