//! Per-instrument technical facts supplied by the indicator provider.
//!
//! Indicator math lives outside this crate; the funnel only reads the
//! resulting scores and flags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A tradeable instrument in the scan universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instrument {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

impl FromStr for Trend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bullish" | "up" => Ok(Trend::Bullish),
            "bearish" | "down" => Ok(Trend::Bearish),
            "neutral" | "sideways" => Ok(Trend::Neutral),
            _ => Err(format!("Unknown trend: {s}")),
        }
    }
}

/// Upstream verdict on whether the pattern is tradeable yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    Ready,
    Forming,
    NotReady,
    Invalidated,
}

impl fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupStatus::Ready => write!(f, "ready"),
            SetupStatus::Forming => write!(f, "forming"),
            SetupStatus::NotReady => write!(f, "not_ready"),
            SetupStatus::Invalidated => write!(f, "invalidated"),
        }
    }
}

impl FromStr for SetupStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "_").as_str() {
            "ready" => Ok(SetupStatus::Ready),
            "forming" => Ok(SetupStatus::Forming),
            "not_ready" => Ok(SetupStatus::NotReady),
            "invalidated" => Ok(SetupStatus::Invalidated),
            _ => Err(format!("Unknown setup status: {s}")),
        }
    }
}

/// Scores and flags for one instrument at scan time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFacts {
    pub close: f64,
    pub atr: f64,
    pub avg_volume: f64,
    /// Number of daily bars the indicators were computed from.
    pub history_bars: u32,
    /// Base technical score, 0–100.
    pub base_score: f64,
    /// Multi-timeframe alignment score, 0–100.
    pub mtf_score: f64,
    /// Trend per timeframe label ("1d", "1w", ...).
    #[serde(default)]
    pub timeframes: BTreeMap<String, Trend>,
    #[serde(default)]
    pub bullish_trend: bool,
    #[serde(default)]
    pub bearish_trend: bool,
    #[serde(default)]
    pub above_sma_50: bool,
    #[serde(default)]
    pub above_sma_200: bool,
    #[serde(default)]
    pub higher_highs: bool,
    #[serde(default)]
    pub rsi_bullish: bool,
    #[serde(default)]
    pub macd_bullish: bool,
    #[serde(default)]
    pub volume_surge: bool,
    #[serde(default)]
    pub rsi_bearish: bool,
    #[serde(default)]
    pub macd_bearish: bool,
    pub setup_status: SetupStatus,
}

impl IndicatorFacts {
    pub fn bullish_flag_count(&self) -> usize {
        [
            self.bullish_trend,
            self.above_sma_50,
            self.above_sma_200,
            self.higher_highs,
            self.rsi_bullish,
            self.macd_bullish,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }

    pub fn bearish_flag_count(&self) -> usize {
        [self.bearish_trend, self.rsi_bearish, self.macd_bearish]
            .iter()
            .filter(|f| **f)
            .count()
    }

    /// Dominant trend implied by the trend flags alone.
    pub fn trend(&self) -> Trend {
        match (self.bullish_trend, self.bearish_trend) {
            (true, false) => Trend::Bullish,
            (false, true) => Trend::Bearish,
            _ => Trend::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicting_trend_flags_are_neutral() {
        let facts: IndicatorFacts = serde_json::from_value(serde_json::json!({
            "close": 10.0, "atr": 0.5, "avg_volume": 1e6, "history_bars": 200,
            "base_score": 70.0, "mtf_score": 60.0,
            "bullish_trend": true, "bearish_trend": true,
            "setup_status": "ready"
        }))
        .unwrap();
        assert_eq!(facts.trend(), Trend::Neutral);
        assert_eq!(facts.bullish_flag_count(), 1);
        assert_eq!(facts.bearish_flag_count(), 1);
    }

    #[test]
    fn setup_status_parses_spaced_form() {
        assert_eq!("Not Ready".parse::<SetupStatus>(), Ok(SetupStatus::NotReady));
    }
}
