use serde::Serialize;

use crate::domain::values::cost::{round4, CallOutcome, CostRecord};

/// AI usage for a single run. Owned by the run and passed into the scorer,
/// so separate runs never share counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CostTracker {
    records: Vec<CostRecord>,
    cache_hits: u32,
    cached_successes: u32,
}

impl CostTracker {
    pub fn record(&mut self, record: CostRecord) {
        self.records.push(record);
    }

    pub fn record_cache_hit(&mut self, success: bool) {
        self.cache_hits += 1;
        if success {
            self.cached_successes += 1;
        }
    }

    pub fn records(&self) -> &[CostRecord] {
        &self.records
    }

    /// Metered (cache-miss) evaluations.
    pub fn calls_count(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn cache_hits(&self) -> u32 {
        self.cache_hits
    }

    /// Evaluations that produced a usable assessment, fresh or cached.
    pub fn successes(&self) -> u32 {
        self.records
            .iter()
            .filter(|r| r.outcome == CallOutcome::Success)
            .count() as u32
            + self.cached_successes
    }

    pub fn attempts(&self) -> u32 {
        self.calls_count() + self.cache_hits
    }

    pub fn total_cost(&self) -> f64 {
        round4(self.records.iter().map(|r| r.cost).sum())
    }

    pub fn total_tokens(&self) -> (u64, u64) {
        self.records.iter().fold((0, 0), |(i, o), r| {
            (i + r.input_tokens as u64, o + r.output_tokens as u64)
        })
    }
}
