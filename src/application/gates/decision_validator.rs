//! Structural gate: completeness, price geometry and thresholds.

use tracing::debug;

use super::{run_rules, GateConfig};
use crate::domain::entities::trade_recommendation::{DirectionalTrade, TradeRecommendation};
use crate::domain::values::gate_result::GateResult;

type Rule = fn(&TradeRecommendation, &GateConfig) -> Option<String>;

const RULES: &[Rule] = &[
    entry_present,
    stop_present,
    quantity_positive,
    symbol_present,
    instrument_present,
    bias_directional,
    not_avoided,
    stop_on_correct_side,
    risk_reward_threshold,
    confidence_threshold,
    targets_present,
];

fn positive_price(value: Option<f64>, name: &str) -> Option<String> {
    match value {
        None => Some(format!("{name} is missing")),
        Some(v) if !v.is_finite() || v <= 0.0 => Some(format!("{name} must be a positive price, got {v}")),
        Some(_) => None,
    }
}

fn entry_present(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    positive_price(rec.entry_price, "entry price")
}

fn stop_present(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    positive_price(rec.stop_loss, "stop loss")
}

fn quantity_positive(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    match rec.quantity {
        Some(q) if q > 0 => None,
        Some(q) => Some(format!("quantity must be positive, got {q}")),
        None => Some("quantity is missing".into()),
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn symbol_present(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    blank(&rec.symbol).then(|| "symbol is missing".to_string())
}

fn instrument_present(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    blank(&rec.instrument_id).then(|| "instrument id is missing".to_string())
}

fn bias_directional(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    if rec.is_long() || rec.is_short() {
        None
    } else {
        Some(format!("bias must be long or short, got '{}'", rec.bias))
    }
}

fn not_avoided(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    rec.avoid.then(|| "recommendation is flagged avoid".to_string())
}

fn stop_on_correct_side(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    let (entry, stop) = (rec.entry()?, rec.stop()?);
    if rec.is_long() && stop >= entry {
        Some(format!("stop loss must be below entry for a long ({stop} >= {entry})"))
    } else if rec.is_short() && stop <= entry {
        Some(format!("stop loss must be above entry for a short ({stop} <= {entry})"))
    } else {
        None
    }
}

fn risk_reward_threshold(rec: &TradeRecommendation, config: &GateConfig) -> Option<String> {
    match rec.risk_reward() {
        None => Some("risk/reward is missing".into()),
        Some(rr) if rr < config.min_risk_reward => Some(format!(
            "risk/reward {rr:.2} is below minimum {:.2}",
            config.min_risk_reward
        )),
        Some(_) => None,
    }
}

fn confidence_threshold(rec: &TradeRecommendation, config: &GateConfig) -> Option<String> {
    match rec.confidence_score {
        None => Some("confidence score is missing".into()),
        Some(c) if c < config.min_confidence => Some(format!(
            "confidence {c:.1} is below minimum {:.1}",
            config.min_confidence
        )),
        Some(_) => None,
    }
}

fn targets_present(rec: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    rec.target_prices
        .is_empty()
        .then(|| "at least one target price is required".to_string())
}

/// Check a recommendation's structure against `config`. Never fails; all
/// violations are listed, the first one is the reason.
pub fn validate_recommendation(rec: &TradeRecommendation, config: &GateConfig) -> GateResult {
    let result = run_rules(RULES, rec, config);
    if !result.approved {
        debug!(
            symbol = rec.symbol.as_deref().unwrap_or("?"),
            violations = result.errors.len(),
            "recommendation failed structural validation"
        );
    }
    result
}
