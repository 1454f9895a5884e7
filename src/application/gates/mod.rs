//! Pre-execution gates over a fully specified [`TradeRecommendation`].
//!
//! Both gates are pure rule chains: every rule runs, every violation is
//! collected, and a rejection is returned as a [`GateResult`] value.

pub mod decision_validator;
pub mod setup_quality;

use serde::{Deserialize, Serialize};

use crate::domain::entities::trade_recommendation::TradeRecommendation;
use crate::domain::values::gate_result::GateResult;

pub use decision_validator::validate_recommendation;
pub use setup_quality::check_setup_quality;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub min_risk_reward: f64,
    /// 0–100
    pub min_confidence: f64,
    /// Long setups also need one of above_sma_50, above_sma_200, higher_highs.
    pub require_trend_confirmation: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_risk_reward: 2.0,
            min_confidence: 60.0,
            require_trend_confirmation: true,
        }
    }
}

/// Combined result of both gates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    pub approved: bool,
    pub structural: GateResult,
    pub setup: GateResult,
}

/// Structural gate first, setup gate second; approval needs both.
pub fn evaluate_gates(rec: &TradeRecommendation, config: &GateConfig) -> GateVerdict {
    let structural = validate_recommendation(rec, config);
    let setup = check_setup_quality(rec, config);
    GateVerdict {
        approved: structural.approved && setup.approved,
        structural,
        setup,
    }
}

/// Run every rule and collect the violations in rule order.
pub(crate) fn run_rules<T>(
    rules: &[fn(&T, &GateConfig) -> Option<String>],
    subject: &T,
    config: &GateConfig,
) -> GateResult {
    GateResult::from_errors(rules.iter().filter_map(|rule| rule(subject, config)).collect())
}
