//! Layer 1: eligibility screening over the full universe.
//!
//! One instrument's failure never aborts the scan; it is logged and counted.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::entities::candidate::Candidate;
use crate::domain::ports::indicator_provider::IndicatorProvider;
use crate::domain::values::indicator_facts::{IndicatorFacts, Instrument, SetupStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ScreenerConfig {
    /// Minimum eligibility score (0–100).
    pub min_score: f64,
    pub min_price: f64,
    pub min_avg_volume: f64,
    /// Fewer bars than this counts as insufficient history.
    pub min_history_bars: u32,
    /// Optional cap on the number of eligible candidates returned.
    pub max_results: Option<usize>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_score: 55.0,
            min_price: 1.0,
            min_avg_volume: 100_000.0,
            min_history_bars: 60,
            max_results: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScreenOutcome {
    /// Eligible candidates, best first.
    pub candidates: Vec<Candidate>,
    pub scanned: usize,
    /// Insufficient history.
    pub skipped: usize,
    /// Provider errors.
    pub errors: usize,
    /// Had data but did not qualify.
    pub rejected: usize,
}

/// `clamp(0.7 × base_score + 10 × min(aligned_flags, 3), 0, 100)`, where
/// aligned_flags is the larger of the bullish and bearish flag counts.
pub fn eligibility_score(facts: &IndicatorFacts) -> f64 {
    let aligned = facts.bullish_flag_count().max(facts.bearish_flag_count()).min(3);
    let raw = 0.7 * facts.base_score + 10.0 * aligned as f64;
    (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

pub struct EligibilityScreener {
    provider: Arc<dyn IndicatorProvider>,
    config: ScreenerConfig,
}

impl EligibilityScreener {
    pub fn new(provider: Arc<dyn IndicatorProvider>, config: ScreenerConfig) -> Self {
        Self { provider, config }
    }

    fn qualifies(&self, facts: &IndicatorFacts, score: f64) -> bool {
        score >= self.config.min_score
            && facts.close >= self.config.min_price
            && facts.avg_volume >= self.config.min_avg_volume
            && facts.setup_status != SetupStatus::Invalidated
    }

    pub fn screen(&self, run_id: &str, universe: &[Instrument], limit: Option<usize>) -> ScreenOutcome {
        let mut outcome = ScreenOutcome {
            scanned: universe.len(),
            ..Default::default()
        };

        for instrument in universe {
            let facts = match self.provider.facts(instrument) {
                Ok(Some(f)) if f.history_bars >= self.config.min_history_bars => f,
                Ok(_) => {
                    debug!(symbol = %instrument.symbol, "insufficient indicator history, skipping");
                    outcome.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(symbol = %instrument.symbol, error = %e, "indicator lookup failed, skipping");
                    outcome.errors += 1;
                    continue;
                }
            };

            let score = eligibility_score(&facts);
            if !self.qualifies(&facts, score) {
                outcome.rejected += 1;
                continue;
            }
            outcome
                .candidates
                .push(Candidate::screened(run_id, instrument, facts, score));
        }

        // Score descending, symbol for deterministic ties
        outcome.candidates.sort_by(|a, b| {
            b.raw_scores
                .score
                .partial_cmp(&a.raw_scores.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        if let Some(max) = limit.or(self.config.max_results) {
            outcome.candidates.truncate(max);
        }
        for (i, c) in outcome.candidates.iter_mut().enumerate() {
            c.rank = i + 1;
            c.annotate("l1_rank", i + 1);
        }
        outcome
    }
}
