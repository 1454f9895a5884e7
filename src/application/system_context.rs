//! Captures the [`SystemContext`] for one decision from a single account read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::ports::account_provider::AccountProvider;
use crate::domain::ports::indicator_provider::IndicatorProvider;
use crate::domain::values::system_context::{
    OpenPositions, SessionConfig, SystemContext, TimeOfDay,
};

/// Capital and exposure from the same account read as the context.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PortfolioSnapshot {
    pub capital: f64,
    pub total_exposure: f64,
    pub open_positions: u32,
}

impl PortfolioSnapshot {
    pub fn exposure_pct(&self) -> f64 {
        if self.capital <= 0.0 {
            return 100.0;
        }
        self.total_exposure / self.capital * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedState {
    pub context: SystemContext,
    pub portfolio: PortfolioSnapshot,
}

pub struct SystemContextBuilder {
    account: Arc<dyn AccountProvider>,
    market: Arc<dyn IndicatorProvider>,
    session: SessionConfig,
}

impl SystemContextBuilder {
    pub fn new(
        account: Arc<dyn AccountProvider>,
        market: Arc<dyn IndicatorProvider>,
        session: SessionConfig,
    ) -> Self {
        Self {
            account,
            market,
            session,
        }
    }

    pub fn capture(&self) -> Result<CapturedState, DomainError> {
        self.capture_at(Utc::now())
    }

    pub fn capture_at(&self, now: DateTime<Utc>) -> Result<CapturedState, DomainError> {
        let account = self.account.snapshot()?;
        let market_regime = self.market.market_regime()?;

        let context = SystemContext {
            market_regime,
            recent_pnl: account.pnl,
            drawdown_pct: account.drawdown_pct,
            open_positions: OpenPositions {
                count: account.open_positions,
                total_exposure: account.total_exposure,
            },
            time_of_day: TimeOfDay::at(now, &self.session),
            trading_day_stats: account.day,
            captured_at: now,
        };
        let portfolio = PortfolioSnapshot {
            capital: account.capital,
            total_exposure: account.total_exposure,
            open_positions: account.open_positions,
        };
        Ok(CapturedState { context, portfolio })
    }
}
