use crate::models::MarketRegimeSnapshot;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Storage for the last successfully built snapshot
///
/// Used to report `changedSinceYesterday`. Entries never expire; they live
/// until overwritten or cleared.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get(&self) -> Result<Option<MarketRegimeSnapshot>>;
    async fn set(&self, snapshot: &MarketRegimeSnapshot) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Process-local history (lost on restart)
#[derive(Default)]
pub struct InMemoryHistory {
    previous: RwLock<Option<MarketRegimeSnapshot>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn get(&self) -> Result<Option<MarketRegimeSnapshot>> {
        Ok(self.previous.read().await.clone())
    }

    async fn set(&self, snapshot: &MarketRegimeSnapshot) -> Result<()> {
        *self.previous.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.previous.write().await = None;
        Ok(())
    }
}
