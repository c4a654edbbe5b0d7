//! Market regime classifier
//!
//! Fuses sentiment, policy risk, volatility, Fed tone and risk appetite into
//! one regime:
//! - Sentiment sets the base (>= 65 Risk-On, <= 35 Risk-Off, else Neutral)
//! - Policy Shock (trumpZ >= 1.5 or High risk) overrides everything
//! - High volatility shifts one step toward Risk-Off
//! - Fed tone can pull a Neutral regime one step either way
//!
//! Pure: no I/O, no shared state.

use crate::models::{
    DriverDirection, DriverStrength, FedTone, MarketRegime, RegimeDriver, RegimeInputs,
    RiskAppetiteState, TrumpRisk, VolatilityState,
};
use serde::{Deserialize, Serialize};

const NEUTRAL_SENTIMENT: f64 = 50.0;

const RISK_ON_THRESHOLD: f64 = 65.0;
const STRONG_RISK_ON_THRESHOLD: f64 = 75.0;
const RISK_OFF_THRESHOLD: f64 = 35.0;
const STRONG_RISK_OFF_THRESHOLD: f64 = 25.0;

const POLICY_SHOCK_Z: f64 = 1.5;

const BASE_CONFIDENCE: i32 = 55;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegimeClassification {
    pub regime: MarketRegime,
    pub confidence: u8,
    pub drivers: Vec<RegimeDriver>,
}

pub fn classify_trump_risk(z: f64) -> TrumpRisk {
    if z >= 1.5 {
        TrumpRisk::High
    } else if z >= 0.75 {
        TrumpRisk::Elevated
    } else if z >= 0.25 {
        TrumpRisk::Moderate
    } else {
        TrumpRisk::Low
    }
}

/// Map the "Market Volatility" subscore to a state.
///
/// The subscore is fear/greed oriented: a high score means calm markets,
/// so the mapping is inverted (>= 70 is Low volatility).
pub fn classify_volatility_state(score: f64) -> VolatilityState {
    if score >= 70.0 {
        VolatilityState::Low
    } else if score >= 40.0 {
        VolatilityState::Moderate
    } else {
        VolatilityState::High
    }
}

pub fn classify_risk_appetite_state(score: f64) -> RiskAppetiteState {
    if score >= 65.0 {
        RiskAppetiteState::Strong
    } else if score >= 35.0 {
        RiskAppetiteState::Neutral
    } else {
        RiskAppetiteState::Weak
    }
}

/// Classify the market regime from normalized inputs
///
/// Always returns at least one driver (sentiment), even for empty inputs.
pub fn classify_regime(inputs: &RegimeInputs) -> RegimeClassification {
    let present = inputs.present_count();
    let mut drivers = Vec::new();

    // 1. Base regime from sentiment
    let sentiment_score = inputs
        .sentiment
        .as_ref()
        .map(|s| s.score)
        .unwrap_or(NEUTRAL_SENTIMENT);
    let mut regime = base_regime(sentiment_score, inputs.sentiment.is_some(), &mut drivers);

    // 2. Policy Shock override (terminal)
    if let Some(policy) = &inputs.policy {
        let z = policy.trump_z;
        let risk = policy.trump_risk.unwrap_or_else(|| classify_trump_risk(z));

        if risk == TrumpRisk::High || z >= POLICY_SHOCK_Z {
            regime = MarketRegime::PolicyShock;
            drivers.push(RegimeDriver::new(
                "policy",
                "Policy Risk",
                DriverDirection::Up,
                DriverStrength::High,
                format!(
                    "Policy risk index at z={:.2} ({:?}) signals a policy shock",
                    z, risk
                ),
            ));
        } else {
            let direction = if z > 0.5 {
                DriverDirection::Up
            } else if z < -0.5 {
                DriverDirection::Down
            } else {
                DriverDirection::Flat
            };
            let strength = if z.abs() >= 1.0 {
                DriverStrength::Medium
            } else {
                DriverStrength::Low
            };
            drivers.push(RegimeDriver::new(
                "policy",
                "Policy Risk",
                direction,
                strength,
                format!("Policy risk index at z={:.2} ({:?} risk)", z, risk),
            ));
        }
    }

    // 3. Volatility adjustment
    if let Some(volatility) = &inputs.volatility {
        let state = volatility
            .state
            .unwrap_or_else(|| classify_volatility_state(volatility.score));

        if state == VolatilityState::High && regime != MarketRegime::PolicyShock {
            let shifted = shift_toward_risk_off(regime);
            let detail = if shifted == regime {
                format!(
                    "High volatility (score {:.0}) reinforces {}",
                    volatility.score, regime
                )
            } else {
                format!(
                    "High volatility (score {:.0}) shifts regime from {} to {}",
                    volatility.score, regime, shifted
                )
            };
            drivers.push(RegimeDriver::new(
                "volatility",
                "Volatility",
                DriverDirection::Up,
                DriverStrength::High,
                detail,
            ));
            regime = shifted;
        } else {
            let (direction, strength) = match state {
                VolatilityState::High => (DriverDirection::Up, DriverStrength::Medium),
                VolatilityState::Low => (DriverDirection::Down, DriverStrength::Medium),
                VolatilityState::Moderate => (DriverDirection::Flat, DriverStrength::Low),
            };
            drivers.push(RegimeDriver::new(
                "volatility",
                "Volatility",
                direction,
                strength,
                format!("{:?} volatility (score {:.0})", state, volatility.score),
            ));
        }
    }

    // 4. Fed tone adjustment
    if let Some(fed) = &inputs.fed {
        let decisive = fed.score.abs() > 0.5;
        let shock = regime == MarketRegime::PolicyShock;

        if !shock && fed.tone == FedTone::Hawkish && sentiment_score < 50.0 {
            if regime == MarketRegime::Neutral {
                regime = MarketRegime::RiskOff;
            }
            drivers.push(RegimeDriver::new(
                "fed",
                "Fed Tone",
                DriverDirection::Up,
                if decisive { DriverStrength::High } else { DriverStrength::Medium },
                format!(
                    "Hawkish Fed (score {:.2}) with soft sentiment tilts toward Risk-Off",
                    fed.score
                ),
            ));
        } else if !shock && fed.tone == FedTone::Dovish && sentiment_score > 55.0 {
            if regime == MarketRegime::Neutral {
                regime = MarketRegime::RiskOn;
            }
            drivers.push(RegimeDriver::new(
                "fed",
                "Fed Tone",
                DriverDirection::Down,
                if decisive { DriverStrength::High } else { DriverStrength::Medium },
                format!(
                    "Dovish Fed (score {:.2}) with firm sentiment tilts toward Risk-On",
                    fed.score
                ),
            ));
        } else {
            let direction = match fed.tone {
                FedTone::Hawkish => DriverDirection::Up,
                FedTone::Dovish => DriverDirection::Down,
                FedTone::Neutral => DriverDirection::Flat,
            };
            drivers.push(RegimeDriver::new(
                "fed",
                "Fed Tone",
                direction,
                if decisive { DriverStrength::Medium } else { DriverStrength::Low },
                format!("Fed tone is {:?} (score {:.2})", fed.tone, fed.score),
            ));
        }
    }

    // 5. Risk appetite (informational only)
    if let Some(appetite) = &inputs.risk_appetite {
        let score = appetite.score;
        let state = classify_risk_appetite_state(score);
        let direction = if score >= 55.0 {
            DriverDirection::Up
        } else if score <= 45.0 {
            DriverDirection::Down
        } else {
            DriverDirection::Flat
        };
        let strength = if score >= 65.0 || score <= 35.0 {
            DriverStrength::High
        } else {
            DriverStrength::Medium
        };
        drivers.push(RegimeDriver::new(
            "riskAppetite",
            "Risk Appetite",
            direction,
            strength,
            format!("{:?} risk appetite (score {:.0})", state, score),
        ));
    }

    let confidence = score_confidence(present, &drivers);

    RegimeClassification {
        regime,
        confidence,
        drivers,
    }
}

fn base_regime(score: f64, present: bool, drivers: &mut Vec<RegimeDriver>) -> MarketRegime {
    let source = if present { "" } else { " (no sentiment data, assumed neutral)" };

    if score >= RISK_ON_THRESHOLD {
        drivers.push(RegimeDriver::new(
            "sentiment",
            "Sentiment",
            DriverDirection::Up,
            if score >= STRONG_RISK_ON_THRESHOLD {
                DriverStrength::High
            } else {
                DriverStrength::Medium
            },
            format!("Sentiment index at {:.0} favors risk-taking", score),
        ));
        MarketRegime::RiskOn
    } else if score <= RISK_OFF_THRESHOLD {
        drivers.push(RegimeDriver::new(
            "sentiment",
            "Sentiment",
            DriverDirection::Down,
            if score <= STRONG_RISK_OFF_THRESHOLD {
                DriverStrength::High
            } else {
                DriverStrength::Medium
            },
            format!("Sentiment index at {:.0} signals risk aversion", score),
        ));
        MarketRegime::RiskOff
    } else {
        drivers.push(RegimeDriver::new(
            "sentiment",
            "Sentiment",
            DriverDirection::Flat,
            DriverStrength::Low,
            format!("Sentiment index at {:.0} is balanced{}", score, source),
        ));
        MarketRegime::Neutral
    }
}

/// One step toward Risk-Off. Risk-Off and Policy Shock stay where they are.
fn shift_toward_risk_off(regime: MarketRegime) -> MarketRegime {
    match regime {
        MarketRegime::RiskOn => MarketRegime::Neutral,
        MarketRegime::Neutral => MarketRegime::RiskOff,
        other => other,
    }
}

fn score_confidence(present: usize, drivers: &[RegimeDriver]) -> u8 {
    let mut confidence = BASE_CONFIDENCE;

    if present >= 4 {
        confidence += 10;
    } else if present == 3 {
        confidence += 5;
    } else if present <= 1 {
        confidence -= 10;
    }

    let count = |direction: DriverDirection| {
        drivers.iter().filter(|d| d.direction == direction).count()
    };
    let ups = count(DriverDirection::Up);
    let downs = count(DriverDirection::Down);
    let mixed = count(DriverDirection::Mixed);

    if mixed > 0 || (ups > 0 && downs > 0) {
        // Conflicting signals
        confidence -= 5;
    } else if ups >= 3 || downs >= 3 {
        confidence += 5;
    }

    confidence.clamp(0, 100) as u8
}
