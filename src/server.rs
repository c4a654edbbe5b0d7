//! HTTP surface for the regime engine
//!
//! - GET /api/market-regime: current `MarketRegimeSnapshot` (polled by the UI)
//! - GET /health: liveness probe

use crate::models::MarketRegimeSnapshot;
use crate::regime::RegimeService;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub struct ServerState {
    pub service: RegimeService,
    pub start_time: Instant,
}

impl ServerState {
    pub fn new(service: RegimeService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// GET /api/market-regime
async fn market_regime_handler(
    State(state): State<Arc<ServerState>>,
) -> Json<MarketRegimeSnapshot> {
    Json(state.service.get_regime_snapshot().await)
}

/// GET /health
async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/market-regime", get(market_regime_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the HTTP server
pub async fn run_server(service: RegimeService, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(Arc::new(ServerState::new(service)));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Serving market regime on http://{}/api/market-regime", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use crate::models::MarketRegime;
    use crate::regime::normalizer::tests::StubSources;
    use crate::regime::InMemoryHistory;

    fn state() -> Arc<ServerState> {
        let stubs = Arc::new(StubSources::live());
        let service = RegimeService::new(
            stubs.normalizer(),
            Arc::new(InMemoryHistory::new()),
            &CacheSettings::default(),
        );
        Arc::new(ServerState::new(service))
    }

    #[tokio::test]
    async fn test_market_regime_handler() {
        let Json(snapshot) = market_regime_handler(State(state())).await;

        assert_eq!(snapshot.regime, MarketRegime::RiskOn);
        assert!(snapshot.confidence <= 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(health) = health_handler(State(state())).await;

        assert_eq!(health.status, "healthy");
        assert!(health.uptime_secs < 5);
    }
}
