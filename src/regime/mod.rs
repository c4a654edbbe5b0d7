// Market regime engine: normalize -> classify -> snapshot
pub mod classifier;
pub mod history;
pub mod normalizer;
pub mod service;

pub use classifier::{
    classify_regime, classify_risk_appetite_state, classify_trump_risk,
    classify_volatility_state, RegimeClassification,
};
pub use history::{HistoryStore, InMemoryHistory};
pub use normalizer::{NormalizedInputs, SignalNormalizer};
pub use service::{fallback_snapshot, RegimeService};
