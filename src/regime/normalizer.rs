use crate::api::{FedspeakSource, PolicySource, SentimentPayload, SentimentSource};
use crate::models::{
    FedInput, PolicyInput, RegimeInputs, RiskAppetiteInput, SentimentInput, VolatilityInput,
};
use crate::regime::classifier::{
    classify_risk_appetite_state, classify_trump_risk, classify_volatility_state,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const VOLATILITY_SUBSCORE: &str = "Market Volatility";
const RISK_APPETITE_SUBSCORE: &str = "Risk Appetite";

/// Output of one fetch-and-normalize pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedInputs {
    pub inputs: RegimeInputs,
    pub is_mock: bool,
    pub missing_inputs: Vec<String>,
}

impl NormalizedInputs {
    fn mark_missing(&mut self, field: &str) {
        self.missing_inputs.push(field.to_string());
        self.is_mock = true;
    }
}

/// Fetches the three upstream signals and shapes them into `RegimeInputs`
///
/// Never fails: an unavailable source is omitted (or, for sentiment,
/// replaced with a neutral placeholder) and reported in `missing_inputs`.
#[derive(Clone)]
pub struct SignalNormalizer {
    sentiment: Arc<dyn SentimentSource>,
    policy: Arc<dyn PolicySource>,
    fedspeak: Arc<dyn FedspeakSource>,
}

impl SignalNormalizer {
    pub fn new(
        sentiment: Arc<dyn SentimentSource>,
        policy: Arc<dyn PolicySource>,
        fedspeak: Arc<dyn FedspeakSource>,
    ) -> Self {
        Self {
            sentiment,
            policy,
            fedspeak,
        }
    }

    pub async fn fetch_regime_inputs(&self) -> NormalizedInputs {
        // Independent sources: fetch concurrently, handle each result alone
        let (sentiment, policy, fed) = tokio::join!(
            self.sentiment.fetch_sentiment(),
            self.policy.fetch_policy_index(),
            self.fedspeak.fetch_fed_tone(),
        );

        let mut out = NormalizedInputs::default();
        let mut derived_missing = Vec::new();

        match sentiment {
            Ok(payload) => {
                let (volatility, risk_appetite) = derive_subscores(&payload);
                if volatility.is_none() {
                    derived_missing.push("volatility");
                }
                if risk_appetite.is_none() {
                    derived_missing.push("riskAppetite");
                }
                out.inputs.sentiment = Some(sentiment_input(payload));
                out.inputs.volatility = volatility;
                out.inputs.risk_appetite = risk_appetite;
            }
            Err(e) => {
                tracing::warn!("Sentiment unavailable, using neutral placeholder: {}", e);
                out.inputs.sentiment = Some(SentimentInput::mocked_neutral());
                out.mark_missing("sentiment");
                derived_missing.extend(["volatility", "riskAppetite"]);
            }
        }

        match policy {
            Ok(payload) => {
                let live = payload.freshness.is_live();
                if !live {
                    tracing::warn!(
                        "Policy index served from {} data",
                        payload.freshness.data_source
                    );
                    out.is_mock = true;
                }
                out.inputs.policy = Some(PolicyInput {
                    trump_z: payload.z_score,
                    trump_risk: Some(classify_trump_risk(payload.z_score)),
                    is_mock: Some(!live),
                });
            }
            Err(e) => {
                tracing::warn!("Policy index unavailable: {}", e);
                out.mark_missing("policy");
            }
        }

        match fed {
            Ok(payload) => {
                let live = payload.freshness.is_live();
                if !live {
                    tracing::warn!("Fed tone served from {} data", payload.freshness.data_source);
                    out.is_mock = true;
                }
                out.inputs.fed = Some(FedInput {
                    tone: payload.current_tone,
                    score: payload.tone_score,
                    is_mock: Some(!live),
                });
            }
            Err(e) => {
                tracing::warn!("Fed tone unavailable: {}", e);
                out.mark_missing("fed");
            }
        }

        for field in derived_missing {
            tracing::debug!("No {} subscore in sentiment payload", field);
            out.missing_inputs.push(field.to_string());
        }

        out
    }
}

fn sentiment_input(payload: SentimentPayload) -> SentimentInput {
    let as_of = DateTime::parse_from_rfc3339(&payload.as_of)
        .map(|ts| ts.with_timezone(&Utc))
        .ok();
    let state = if payload.regime.is_empty() {
        None
    } else {
        Some(payload.regime)
    };

    SentimentInput {
        score: payload.score,
        state,
        as_of,
        is_mock: Some(false),
    }
}

fn derive_subscores(
    payload: &SentimentPayload,
) -> (Option<VolatilityInput>, Option<RiskAppetiteInput>) {
    let volatility = payload
        .subscore(VOLATILITY_SUBSCORE)
        .map(|score| VolatilityInput {
            score,
            state: Some(classify_volatility_state(score)),
            is_mock: Some(false),
        });
    let risk_appetite = payload
        .subscore(RISK_APPETITE_SUBSCORE)
        .map(|score| RiskAppetiteInput {
            score,
            state: Some(classify_risk_appetite_state(score)),
            is_mock: Some(false),
        });

    (volatility, risk_appetite)
}
