pub mod fedspeak;
pub mod http;
pub mod policy;
pub mod sentiment;

pub use fedspeak::{FedspeakClient, FedspeakPayload, FedspeakSource};
pub use http::UpstreamHttp;
pub use policy::{PolicySource, TrumpIndexClient, TrumpIndexPayload};
pub use sentiment::{SentimentClient, SentimentPayload, SentimentSource, Subscore};

use serde::Deserialize;

/// Failure talking to an upstream signal service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unreadable payload: {source}")]
    Decode {
        service: &'static str,
        source: reqwest::Error,
    },

    #[error("{service} still failing after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        service: &'static str,
        attempts: u32,
        last_error: String,
    },
}

/// Provenance block attached to policy and Fedspeak payloads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    pub data_source: String,
}

impl Freshness {
    /// `mock` and `fallback` sources are not live data
    pub fn is_live(&self) -> bool {
        !matches!(self.data_source.as_str(), "mock" | "fallback")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_live_detection() {
        let live = Freshness {
            data_source: "fred".to_string(),
        };
        let mock = Freshness {
            data_source: "mock".to_string(),
        };
        let fallback = Freshness {
            data_source: "fallback".to_string(),
        };

        assert!(live.is_live());
        assert!(!mock.is_live());
        assert!(!fallback.is_live());
    }
}
