use crate::models::MarketRegimeSnapshot;
use crate::regime::HistoryStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::{timeout, Duration};

/// Redis-backed snapshot history
///
/// Keeps the previous snapshot as JSON under
/// `regimebot:{namespace}:previous-snapshot`, so several processes (or
/// tenants with their own namespace) share or separate their history and
/// a restart does not reset change detection.
pub struct RedisHistory {
    conn: ConnectionManager,
    key: String,
}

impl RedisHistory {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `namespace` - Separates histories of independent deployments
    pub async fn new(redis_url: &str, namespace: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("Invalid Redis URL")?;

        // Add 5 second timeout to connection attempt
        let conn = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timeout after 5 seconds"))??;

        tracing::info!("Connected to Redis at {}", redis_url);

        Ok(Self {
            conn,
            key: format!("regimebot:{}:previous-snapshot", namespace),
        })
    }
}

#[async_trait]
impl HistoryStore for RedisHistory {
    async fn get(&self) -> Result<Option<MarketRegimeSnapshot>> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.get(&self.key).await?;

        match stored {
            Some(json) => {
                let snapshot = serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt snapshot under {}", self.key))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, snapshot: &MarketRegimeSnapshot) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(snapshot)?;
        conn.set::<_, _, ()>(&self.key, json).await?;

        tracing::debug!("Stored previous snapshot under {}", self.key);

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&self.key).await?;
        Ok(())
    }
}
