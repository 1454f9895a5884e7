//! Contextual gate: does the setup behind a trade still support its direction?
//! Every check passes when the recommendation carries no facts.

use tracing::debug;

use super::{run_rules, GateConfig};
use crate::domain::entities::trade_recommendation::{DirectionalTrade, TradeRecommendation};
use crate::domain::values::gate_result::GateResult;
use crate::domain::values::indicator_facts::SetupStatus;

type Rule = fn(&TradeRecommendation, &GateConfig) -> Option<String>;

const RULES: &[Rule] = &[trend_valid, momentum_aligned, setup_ready];

fn trend_valid(trade: &TradeRecommendation, config: &GateConfig) -> Option<String> {
    let facts = trade.setup_facts()?;
    if trade.is_long() {
        if !facts.is_bullish_trend() {
            return Some("long setup requires a bullish trend".into());
        }
        if config.require_trend_confirmation && !facts.has_trend_confirmation() {
            return Some(
                "long setup requires trend confirmation (above SMA50, above SMA200 or higher highs)"
                    .into(),
            );
        }
    } else if trade.is_short() && !facts.is_bearish_trend() {
        return Some("short setup requires a bearish trend".into());
    }
    None
}

fn momentum_aligned(trade: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    let facts = trade.setup_facts()?;
    if trade.is_long() && facts.has_bearish_momentum() && !facts.has_bullish_momentum() {
        Some("long setup has bearish momentum and no bullish momentum".into())
    } else if trade.is_short() && facts.has_bullish_momentum() && !facts.has_bearish_momentum() {
        Some("short setup has bullish momentum and no bearish momentum".into())
    } else {
        None
    }
}

fn setup_ready(trade: &TradeRecommendation, _: &GateConfig) -> Option<String> {
    match trade.setup_facts()?.setup_status? {
        SetupStatus::NotReady => Some("setup status is not ready".into()),
        SetupStatus::Invalidated => Some("setup has been invalidated".into()),
        SetupStatus::Ready | SetupStatus::Forming => None,
    }
}

pub fn check_setup_quality(rec: &TradeRecommendation, config: &GateConfig) -> GateResult {
    let result = run_rules(RULES, rec, config);
    if !result.approved {
        debug!(
            symbol = rec.symbol.as_deref().unwrap_or("?"),
            reason = result.reason.as_deref().unwrap_or_default(),
            "setup quality gate rejected"
        );
    }
    result
}
