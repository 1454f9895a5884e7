//! Layer 2: composite trade-quality ranking. Pure and deterministic.

use serde::Serialize;

use crate::domain::entities::candidate::Candidate;
use crate::domain::values::stage::CandidateStage;

#[derive(Debug, Clone, Serialize)]
pub struct RankerConfig {
    pub base_weight: f64,
    pub mtf_weight: f64,
    pub screener_weight: f64,
    pub max_results: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            base_weight: 0.40,
            mtf_weight: 0.35,
            screener_weight: 0.25,
            max_results: 30,
        }
    }
}

pub struct QualityRanker {
    config: RankerConfig,
}

impl QualityRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn quality_score(&self, candidate: &Candidate) -> f64 {
        let s = &candidate.raw_scores;
        let q = self.config.base_weight * s.base_score
            + self.config.mtf_weight * s.mtf_score
            + self.config.screener_weight * s.score;
        (q * 100.0).round() / 100.0
    }

    /// Re-score Layer-1 output and keep the best `max_results`. Ties keep
    /// their Layer-1 order.
    pub fn rank(&self, screened: &[Candidate]) -> Vec<Candidate> {
        let mut ranked: Vec<(usize, Candidate)> = screened
            .iter()
            .enumerate()
            .map(|(l1_index, c)| {
                let mut next = c.advance(CandidateStage::Ranked);
                next.set_quality(self.quality_score(c));
                (l1_index, next)
            })
            .collect();

        ranked.sort_by(|(ia, a), (ib, b)| {
            b.trade_quality_score
                .partial_cmp(&a.trade_quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ia.cmp(ib))
        });
        ranked.truncate(self.config.max_results);

        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (_, mut c))| {
                c.rank = i + 1;
                c.annotate("l2_rank", i + 1);
                c
            })
            .collect()
    }
}
