use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete market-condition classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MarketRegime {
    #[serde(rename = "Risk-On")]
    RiskOn,
    #[serde(rename = "Risk-Off")]
    RiskOff,
    Neutral,
    #[serde(rename = "Policy Shock")]
    PolicyShock,
}

impl MarketRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegime::RiskOn => "Risk-On",
            MarketRegime::RiskOff => "Risk-Off",
            MarketRegime::Neutral => "Neutral",
            MarketRegime::PolicyShock => "Policy Shock",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrumpRisk {
    Low,
    Moderate,
    Elevated,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FedTone {
    Hawkish,
    Dovish,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VolatilityState {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskAppetiteState {
    Weak,
    Neutral,
    Strong,
}

// ============== Inputs ==============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentInput {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

impl SentimentInput {
    /// Neutral placeholder used when the sentiment collaborator is unavailable
    pub fn mocked_neutral() -> Self {
        Self {
            score: 50.0,
            state: Some("Neutral".to_string()),
            as_of: None,
            is_mock: Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInput {
    pub trump_z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trump_risk: Option<TrumpRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FedInput {
    pub tone: FedTone,
    pub score: f64, // -1.0 (dovish) to 1.0 (hawkish)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityInput {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<VolatilityState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAppetiteInput {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RiskAppetiteState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

/// Everything the classifier looks at. Each sub-record is independently
/// present or absent; `None` means "no data", never "zero".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegimeInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fed: Option<FedInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<VolatilityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_appetite: Option<RiskAppetiteInput>,
}

impl RegimeInputs {
    /// Number of sub-records carrying data (0-5)
    pub fn present_count(&self) -> usize {
        [
            self.sentiment.is_some(),
            self.policy.is_some(),
            self.fed.is_some(),
            self.volatility.is_some(),
            self.risk_appetite.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

// ============== Drivers ==============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DriverDirection {
    Up,
    Down,
    Flat,
    Mixed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStrength {
    Low,
    Medium,
    High,
}

/// One explanatory factor behind a classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegimeDriver {
    pub key: String,
    pub label: String,
    pub direction: DriverDirection,
    pub strength: DriverStrength,
    pub detail: String,
}

impl RegimeDriver {
    pub fn new(
        key: &str,
        label: &str,
        direction: DriverDirection,
        strength: DriverStrength,
        detail: String,
    ) -> Self {
        debug_assert!(!detail.trim().is_empty(), "driver {} has empty detail", key);
        Self {
            key: key.to_string(),
            label: label.to_string(),
            direction,
            strength,
            detail,
        }
    }
}

// ============== Snapshot ==============

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub is_mock: bool,
    pub missing_inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fully computed classification: the unit that is cached and compared
/// across time. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketRegimeSnapshot {
    pub as_of: DateTime<Utc>,
    pub regime: MarketRegime,
    pub confidence: u8,
    pub changed_since_yesterday: bool,
    pub drivers: Vec<RegimeDriver>,
    pub inputs: RegimeInputs,
    pub meta: SnapshotMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_serializes_to_literal_strings() {
        assert_eq!(
            serde_json::to_string(&MarketRegime::PolicyShock).unwrap(),
            "\"Policy Shock\""
        );
        assert_eq!(
            serde_json::to_string(&MarketRegime::RiskOn).unwrap(),
            "\"Risk-On\""
        );
        assert_eq!(MarketRegime::RiskOff.to_string(), "Risk-Off");
    }

    #[test]
    fn test_absent_inputs_are_not_zero() {
        let inputs: RegimeInputs = serde_json::from_str(r#"{"sentiment":{"score":0}}"#).unwrap();

        assert_eq!(inputs.present_count(), 1);
        assert_eq!(inputs.sentiment.as_ref().unwrap().score, 0.0);
        assert!(inputs.policy.is_none());
    }

    #[test]
    fn test_inputs_use_camel_case_fields() {
        let json = r#"{
            "policy": {"trumpZ": 1.2, "trumpRisk": "Elevated"},
            "fed": {"tone": "hawkish", "score": 0.4, "isMock": true},
            "riskAppetite": {"score": 61, "state": "Neutral"}
        }"#;
        let inputs: RegimeInputs = serde_json::from_str(json).unwrap();

        let policy = inputs.policy.unwrap();
        assert_eq!(policy.trump_z, 1.2);
        assert_eq!(policy.trump_risk, Some(TrumpRisk::Elevated));
        assert_eq!(inputs.fed.unwrap().tone, FedTone::Hawkish);
        assert_eq!(
            inputs.risk_appetite.unwrap().state,
            Some(RiskAppetiteState::Neutral)
        );
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = MarketRegimeSnapshot {
            as_of: Utc::now(),
            regime: MarketRegime::Neutral,
            confidence: 55,
            changed_since_yesterday: false,
            drivers: vec![RegimeDriver::new(
                "sentiment",
                "Sentiment",
                DriverDirection::Flat,
                DriverStrength::Low,
                "Sentiment is balanced".to_string(),
            )],
            inputs: RegimeInputs::default(),
            meta: SnapshotMeta::default(),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["regime"], "Neutral");
        assert_eq!(value["changedSinceYesterday"], false);
        assert_eq!(value["drivers"][0]["direction"], "flat");
        assert_eq!(value["meta"]["missingInputs"], serde_json::json!([]));
        assert!(value["meta"].get("notes").is_none());
        assert!(value.get("asOf").is_some());
    }
}
