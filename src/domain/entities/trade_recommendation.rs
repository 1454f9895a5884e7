//! Fully specified trade proposal, the input to both pre-execution gates.
//!
//! Fields are optional so a malformed proposal can still be represented and
//! rejected with a complete violation list instead of failing to parse.

use serde::{Deserialize, Serialize};

use crate::domain::entities::trade_intent::TradeIntent;
use crate::domain::values::bias::Bias;
use crate::domain::values::indicator_facts::{IndicatorFacts, SetupStatus, Trend};

/// Trend and momentum facts the setup gate checks against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupFacts {
    pub trend: Option<Trend>,
    pub bullish: bool,
    pub bearish: bool,
    pub above_sma_50: bool,
    pub above_sma_200: bool,
    pub higher_highs: bool,
    pub rsi_bullish: bool,
    pub macd_bullish: bool,
    pub volume_surge: bool,
    pub rsi_bearish: bool,
    pub macd_bearish: bool,
    pub setup_status: Option<SetupStatus>,
}

impl SetupFacts {
    pub fn is_bullish_trend(&self) -> bool {
        self.bullish || self.trend == Some(Trend::Bullish)
    }

    pub fn is_bearish_trend(&self) -> bool {
        self.bearish || self.trend == Some(Trend::Bearish)
    }

    pub fn has_trend_confirmation(&self) -> bool {
        self.above_sma_50 || self.above_sma_200 || self.higher_highs
    }

    pub fn has_bullish_momentum(&self) -> bool {
        self.rsi_bullish || self.macd_bullish || self.volume_surge
    }

    pub fn has_bearish_momentum(&self) -> bool {
        self.rsi_bearish || self.macd_bearish
    }
}

impl From<&IndicatorFacts> for SetupFacts {
    fn from(f: &IndicatorFacts) -> Self {
        Self {
            trend: Some(f.trend()),
            bullish: f.bullish_trend,
            bearish: f.bearish_trend,
            above_sma_50: f.above_sma_50,
            above_sma_200: f.above_sma_200,
            higher_highs: f.higher_highs,
            rsi_bullish: f.rsi_bullish,
            macd_bullish: f.macd_bullish,
            volume_surge: f.volume_surge,
            rsi_bearish: f.rsi_bearish,
            macd_bearish: f.macd_bearish,
            setup_status: Some(f.setup_status),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeRecommendation {
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub quantity: Option<i64>,
    pub symbol: Option<String>,
    pub instrument_id: Option<String>,
    /// Raw bias text; anything other than long/short is rejected by the gate.
    pub bias: String,
    /// 0–100
    pub confidence_score: Option<f64>,
    pub risk_reward: Option<f64>,
    pub target_prices: Vec<f64>,
    pub facts: Option<SetupFacts>,
    pub invalidation_conditions: Vec<String>,
    pub avoid: bool,
}

impl TradeRecommendation {
    /// Attach sizing and identity to an intent.
    pub fn from_intent(
        intent: &TradeIntent,
        quantity: i64,
        symbol: &str,
        instrument_id: &str,
        confidence_score: f64,
        facts: Option<SetupFacts>,
    ) -> Self {
        let risk = intent.risk_per_share();
        let risk_reward = if risk > 0.0 {
            Some(((intent.reward_per_share() / risk) * 100.0).round() / 100.0)
        } else {
            None
        };
        Self {
            entry_price: Some(intent.proposed_entry()),
            stop_loss: Some(intent.proposed_sl()),
            quantity: Some(quantity),
            symbol: Some(symbol.to_string()),
            instrument_id: Some(instrument_id.to_string()),
            bias: intent.bias().to_string(),
            confidence_score: Some(confidence_score),
            risk_reward,
            target_prices: intent.proposed_targets().iter().map(|t| t.price).collect(),
            facts,
            invalidation_conditions: Vec::new(),
            avoid: intent.bias() == Bias::Avoid,
        }
    }
}

/// Direction-aware view both gates are written against.
pub trait DirectionalTrade {
    fn side(&self) -> Option<Bias>;
    fn entry(&self) -> Option<f64>;
    fn stop(&self) -> Option<f64>;
    fn risk_reward(&self) -> Option<f64>;
    fn setup_facts(&self) -> Option<&SetupFacts>;

    fn is_long(&self) -> bool {
        self.side() == Some(Bias::Long)
    }

    fn is_short(&self) -> bool {
        self.side() == Some(Bias::Short)
    }
}

impl DirectionalTrade for TradeRecommendation {
    fn side(&self) -> Option<Bias> {
        self.bias.parse().ok()
    }

    fn entry(&self) -> Option<f64> {
        self.entry_price
    }

    fn stop(&self) -> Option<f64> {
        self.stop_loss
    }

    fn risk_reward(&self) -> Option<f64> {
        self.risk_reward
    }

    fn setup_facts(&self) -> Option<&SetupFacts> {
        self.facts.as_ref()
    }
}
