use crate::cache::TtlCache;
use crate::config::CacheSettings;
use crate::models::{
    DriverDirection, DriverStrength, MarketRegime, MarketRegimeSnapshot, RegimeDriver,
    RegimeInputs, SentimentInput, SnapshotMeta,
};
use crate::regime::classifier::classify_regime;
use crate::regime::history::HistoryStore;
use crate::regime::normalizer::SignalNormalizer;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Duration;

const FALLBACK_CONFIDENCE: u8 = 30;
const NO_HISTORY_NOTE: &str =
    "No previous snapshot available; change detection starts with this one";

/// Serves the current market regime snapshot
///
/// Cache miss: normalize -> classify -> compare with previous -> store.
/// Any failure on that path yields a fixed fallback snapshot, which is
/// neither cached nor remembered.
///
/// This struct is cloneable; clones share the cache and history.
#[derive(Clone)]
pub struct RegimeService {
    normalizer: SignalNormalizer,
    cache: TtlCache<MarketRegimeSnapshot>,
    history: Arc<dyn HistoryStore>,
    cache_key: String,
    ttl: Duration,
}

impl RegimeService {
    pub fn new(
        normalizer: SignalNormalizer,
        history: Arc<dyn HistoryStore>,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            normalizer,
            cache: TtlCache::new(),
            history,
            cache_key: settings.key.clone(),
            ttl: Duration::from_secs(settings.ttl_secs),
        }
    }

    /// Current snapshot; never fails
    pub async fn get_regime_snapshot(&self) -> MarketRegimeSnapshot {
        let result = self
            .cache
            .get_cached_or_fetch(&self.cache_key, self.ttl, || self.build_snapshot())
            .await;

        match result {
            Ok(cached) => {
                tracing::debug!(cache_hit = cached.hit, "Serving market regime snapshot");
                cached.data
            }
            Err(e) => {
                tracing::error!("Failed to build regime snapshot, serving fallback: {:#}", e);
                fallback_snapshot()
            }
        }
    }

    /// Last successfully built snapshot, if any
    pub async fn get_previous_snapshot(&self) -> Result<Option<MarketRegimeSnapshot>> {
        self.history.get().await
    }

    /// Forget the previous snapshot; the next build reports no history.
    /// A snapshot already in the cache is left alone.
    pub async fn clear_previous_snapshot(&self) -> Result<()> {
        self.history.clear().await
    }

    async fn build_snapshot(&self) -> Result<MarketRegimeSnapshot> {
        let normalized = self.normalizer.fetch_regime_inputs().await;
        let classification = classify_regime(&normalized.inputs);

        let previous = self
            .history
            .get()
            .await
            .context("Failed to read previous snapshot")?;

        let (changed_since_yesterday, notes) = match &previous {
            Some(prev) => (prev.regime != classification.regime, None),
            None => (false, Some(NO_HISTORY_NOTE.to_string())),
        };

        let snapshot = MarketRegimeSnapshot {
            as_of: Utc::now(),
            regime: classification.regime,
            confidence: classification.confidence,
            changed_since_yesterday,
            drivers: classification.drivers,
            inputs: normalized.inputs,
            meta: SnapshotMeta {
                is_mock: normalized.is_mock,
                missing_inputs: normalized.missing_inputs,
                notes,
            },
        };

        self.history
            .set(&snapshot)
            .await
            .context("Failed to store snapshot history")?;

        tracing::info!(
            regime = %snapshot.regime,
            confidence = snapshot.confidence,
            changed = snapshot.changed_since_yesterday,
            is_mock = snapshot.meta.is_mock,
            "Built market regime snapshot"
        );

        Ok(snapshot)
    }
}

/// Safe snapshot served when the normal path fails
pub fn fallback_snapshot() -> MarketRegimeSnapshot {
    MarketRegimeSnapshot {
        as_of: Utc::now(),
        regime: MarketRegime::Neutral,
        confidence: FALLBACK_CONFIDENCE,
        changed_since_yesterday: false,
        drivers: vec![RegimeDriver::new(
            "sentiment",
            "Sentiment",
            DriverDirection::Flat,
            DriverStrength::Low,
            "Regime data unavailable; defaulting to Neutral".to_string(),
        )],
        inputs: RegimeInputs {
            sentiment: Some(SentimentInput::mocked_neutral()),
            ..Default::default()
        },
        meta: SnapshotMeta {
            is_mock: true,
            missing_inputs: ["policy", "fed", "volatility", "riskAppetite"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            notes: Some("Fallback snapshot after an internal error".to_string()),
        },
    }
}
