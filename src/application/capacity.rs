//! Layer 4: final selection bounded by portfolio capacity and risk state.
//!
//! Tiers are count based: tier 1 takes the best `min(limit, open_slots)`,
//! tier 2 the next `limit`, tier 3 whatever is left. Only tier 1 is final.

use serde::Serialize;
use tracing::info;

use crate::application::system_context::PortfolioSnapshot;
use crate::domain::entities::candidate::Candidate;
use crate::domain::values::stage::{CandidateStage, Tier};
use crate::domain::values::system_context::{MarketRegime, SystemContext};

#[derive(Debug, Clone, Serialize)]
pub struct CapacityConfig {
    /// Weight of AI confidence (scaled to 0–100) in the combined score.
    pub ai_weight: f64,
    pub screener_weight: f64,
    pub max_open_positions: u32,
    /// No new positions at or above this exposure, percent of capital.
    pub max_exposure_pct: f64,
    pub max_drawdown_pct: f64,
    pub max_consecutive_losses: u32,
    /// Final limit when the caller gives none.
    pub default_limit: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            ai_weight: 0.6,
            screener_weight: 0.4,
            max_open_positions: 10,
            max_exposure_pct: 80.0,
            max_drawdown_pct: 10.0,
            max_consecutive_losses: 3,
            default_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    pub tier_1: Vec<Candidate>,
    pub tier_2: Vec<Candidate>,
    pub tier_3: Vec<Candidate>,
    pub open_slots: usize,
}

impl Selection {
    pub fn tier_counts(&self) -> [usize; 3] {
        [self.tier_1.len(), self.tier_2.len(), self.tier_3.len()]
    }

    pub fn final_candidates(&self) -> &[Candidate] {
        &self.tier_1
    }
}

pub struct CapacityFilter {
    config: CapacityConfig,
}

impl CapacityFilter {
    pub fn new(config: CapacityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CapacityConfig {
        &self.config
    }

    pub fn combined_score(&self, candidate: &Candidate) -> f64 {
        let screener = candidate.raw_scores.score;
        let combined = match candidate.ai_confidence {
            Some(ai) => self.config.ai_weight * (ai * 10.0) + self.config.screener_weight * screener,
            None => screener,
        };
        (combined * 100.0).round() / 100.0
    }

    /// How many new positions the account can take right now.
    pub fn open_slots(&self, portfolio: &PortfolioSnapshot, context: &SystemContext) -> usize {
        if portfolio.exposure_pct() >= self.config.max_exposure_pct
            || context.drawdown_pct >= self.config.max_drawdown_pct
            || context.trading_day_stats.consecutive_losses >= self.config.max_consecutive_losses
        {
            return 0;
        }
        let slots = self
            .config
            .max_open_positions
            .saturating_sub(portfolio.open_positions) as usize;
        if context.market_regime == MarketRegime::Volatile {
            slots.div_ceil(2)
        } else {
            slots
        }
    }

    pub fn select(
        &self,
        evaluated: &[Candidate],
        portfolio: &PortfolioSnapshot,
        context: &SystemContext,
        limit: usize,
    ) -> Selection {
        if evaluated.is_empty() {
            return Selection::default();
        }

        let mut scored: Vec<(f64, &Candidate)> = evaluated
            .iter()
            .map(|c| (self.combined_score(c), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let open_slots = self.open_slots(portfolio, context);
        let tier_1_size = limit.min(open_slots);

        let mut selection = Selection {
            open_slots,
            ..Default::default()
        };
        for (i, (combined, c)) in scored.into_iter().enumerate() {
            let tier = if i < tier_1_size {
                Tier::Tier1
            } else if i < tier_1_size + limit {
                Tier::Tier2
            } else {
                Tier::Tier3
            };
            let mut next = c.advance(CandidateStage::Final);
            next.set_selection(combined, tier);
            let bucket = match tier {
                Tier::Tier1 => &mut selection.tier_1,
                Tier::Tier2 => &mut selection.tier_2,
                Tier::Tier3 => &mut selection.tier_3,
            };
            next.rank = bucket.len() + 1;
            bucket.push(next);
        }

        info!(
            tier_1 = selection.tier_1.len(),
            tier_2 = selection.tier_2.len(),
            tier_3 = selection.tier_3.len(),
            open_slots,
            "capacity selection done"
        );
        selection
    }
}
