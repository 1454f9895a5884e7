use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::values::bias::Bias;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTarget {
    pub price: f64,
    /// Estimated probability of the target being reached, 0.0–1.0.
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingHint {
    Full,
    Reduced,
    Minimal,
}

impl fmt::Display for SizingHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingHint::Full => write!(f, "full"),
            SizingHint::Reduced => write!(f, "reduced"),
            SizingHint::Minimal => write!(f, "minimal"),
        }
    }
}

/// Sizing-agnostic statement of direction, entry, stop and targets.
///
/// Immutable once built. Risk and reward per share are derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    bias: Bias,
    proposed_entry: f64,
    proposed_sl: f64,
    proposed_targets: Vec<PriceTarget>,
    expected_rr: f64,
    sizing_hint: SizingHint,
    strategy_key: String,
}

impl TradeIntent {
    pub fn new(
        bias: Bias,
        proposed_entry: f64,
        proposed_sl: f64,
        proposed_targets: Vec<PriceTarget>,
        expected_rr: f64,
        sizing_hint: SizingHint,
        strategy_key: String,
    ) -> Self {
        Self {
            bias,
            proposed_entry,
            proposed_sl,
            proposed_targets,
            expected_rr,
            sizing_hint,
            strategy_key,
        }
    }

    pub fn bias(&self) -> Bias {
        self.bias
    }

    pub fn proposed_entry(&self) -> f64 {
        self.proposed_entry
    }

    pub fn proposed_sl(&self) -> f64 {
        self.proposed_sl
    }

    /// Ordered nearest first.
    pub fn proposed_targets(&self) -> &[PriceTarget] {
        &self.proposed_targets
    }

    pub fn expected_rr(&self) -> f64 {
        self.expected_rr
    }

    pub fn sizing_hint(&self) -> SizingHint {
        self.sizing_hint
    }

    pub fn strategy_key(&self) -> &str {
        &self.strategy_key
    }

    pub fn risk_per_share(&self) -> f64 {
        (self.proposed_entry - self.proposed_sl).abs()
    }

    /// Distance to the first target.
    pub fn reward_per_share(&self) -> f64 {
        self.proposed_targets
            .first()
            .map(|t| (t.price - self.proposed_entry).abs())
            .unwrap_or(0.0)
    }
}
