//! Immutable snapshot of account and market risk state.
//!
//! Captured once per decision from a single account read. Nothing refreshes
//! it afterwards; a new decision captures a new snapshot.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Bullish,
    Bearish,
    Neutral,
    Volatile,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Bullish => write!(f, "bullish"),
            MarketRegime::Bearish => write!(f, "bearish"),
            MarketRegime::Neutral => write!(f, "neutral"),
            MarketRegime::Volatile => write!(f, "volatile"),
        }
    }
}

impl FromStr for MarketRegime {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bullish" => Ok(MarketRegime::Bullish),
            "bearish" => Ok(MarketRegime::Bearish),
            "neutral" => Ok(MarketRegime::Neutral),
            "volatile" => Ok(MarketRegime::Volatile),
            _ => Err(format!("Unknown market regime: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    PreMarket,
    MarketHours,
    PostMarket,
    AfterHours,
}

/// Exchange session boundaries in exchange-local time.
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Exchange offset from UTC in minutes. Default: -300 (New York, standard time).
    pub utc_offset_minutes: i32,
    pub pre_market_start: NaiveTime,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub post_market_end: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -300,
            pre_market_start: NaiveTime::from_hms_opt(4, 0, 0).unwrap_or_default(),
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            post_market_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
        }
    }
}

impl TimeOfDay {
    pub fn at(instant: DateTime<Utc>, session: &SessionConfig) -> Self {
        let offset = FixedOffset::east_opt(session.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        let local = instant.with_timezone(&offset);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return TimeOfDay::AfterHours;
        }
        let t = local.time();
        if t >= session.pre_market_start && t < session.open {
            TimeOfDay::PreMarket
        } else if t >= session.open && t < session.close {
            TimeOfDay::MarketHours
        } else if t >= session.close && t < session.post_market_end {
            TimeOfDay::PostMarket
        } else {
            TimeOfDay::AfterHours
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentPnl {
    pub today: f64,
    pub week: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenPositions {
    pub count: u32,
    pub total_exposure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradingDayStats {
    pub trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub consecutive_losses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemContext {
    pub market_regime: MarketRegime,
    pub recent_pnl: RecentPnl,
    /// Drawdown from equity peak, percent.
    pub drawdown_pct: f64,
    pub open_positions: OpenPositions,
    pub time_of_day: TimeOfDay,
    pub trading_day_stats: TradingDayStats,
    pub captured_at: DateTime<Utc>,
}
