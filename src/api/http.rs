use super::UpstreamError;
use crate::config::UpstreamSettings;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const INITIAL_BACKOFF_MS: u64 = 500;

// Type alias for the rate limiter to simplify signatures
type UpstreamRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Rate-limited JSON GET with retry, shared by the upstream clients
///
/// Retries 429 and 5xx responses and transport errors with exponential
/// backoff. Other 4xx responses fail immediately.
#[derive(Clone)]
pub struct UpstreamHttp {
    client: Client,
    service: &'static str,
    rate_limiter: Arc<UpstreamRateLimiter>,
    max_retries: u32,
}

impl UpstreamHttp {
    pub fn new(service: &'static str, settings: &UpstreamSettings) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(UpstreamError::Client)?;

        let rpm = NonZeroU32::new(settings.rate_limit_rpm).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            service,
            rate_limiter,
            max_retries: settings.max_retries.max(1),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let service = self.service;
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            self.rate_limiter.until_ready().await;

            last_error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|source| UpstreamError::Decode { service, source });
                    }

                    if status.as_u16() != 429 && !status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(UpstreamError::Status {
                            service,
                            status: status.as_u16(),
                            body,
                        });
                    }

                    format!("HTTP {}", status)
                }
                Err(e) => e.to_string(),
            };

            if attempt < self.max_retries {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "{} request failed ({}), retrying in {}ms (attempt {}/{})",
                    service,
                    last_error,
                    backoff_ms,
                    attempt,
                    self.max_retries
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(UpstreamError::RetriesExhausted {
            service,
            attempts: self.max_retries,
            last_error,
        })
    }
}
