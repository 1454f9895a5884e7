use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::values::system_context::{RecentPnl, TradingDayStats};

/// Read-only account state used to bound new risk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub capital: f64,
    pub total_exposure: f64,
    pub open_positions: u32,
    pub drawdown_pct: f64,
    pub pnl: RecentPnl,
    pub day: TradingDayStats,
}

pub trait AccountProvider: Send + Sync {
    fn snapshot(&self) -> Result<AccountSnapshot, DomainError>;
}
