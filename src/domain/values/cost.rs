//! AI call metering.
//!
//! `cost = input_tokens/1000 × input_rate + output_tokens/1000 × output_rate`,
//! rates in USD per 1K tokens keyed by model name, rounded to 4 decimals.

use serde::{Deserialize, Serialize};

/// USD per 1K tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
}

pub const DEFAULT_RATES: ModelRates = ModelRates {
    input: 0.001,
    output: 0.002,
};

/// Rates for a model. Dated suffixes ("gpt-4o-mini-2024-07-18") match by
/// prefix; the longest prefix wins so "gpt-4o-mini" is not priced as "gpt-4o".
pub fn rates_for(model: &str) -> ModelRates {
    const TABLE: &[(&str, ModelRates)] = &[
        ("gpt-4o-mini", ModelRates { input: 0.00015, output: 0.0006 }),
        ("gpt-4o", ModelRates { input: 0.0025, output: 0.01 }),
        ("claude-3-5-haiku", ModelRates { input: 0.0008, output: 0.004 }),
        ("claude-sonnet-4", ModelRates { input: 0.003, output: 0.015 }),
    ];
    let model = model.to_lowercase();
    TABLE
        .iter()
        .filter(|(prefix, _)| model.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, rates)| *rates)
        .unwrap_or(DEFAULT_RATES)
}

pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

pub fn compute_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    let rates = rates_for(model);
    round4(
        input_tokens as f64 / 1000.0 * rates.input + output_tokens as f64 / 1000.0 * rates.output,
    )
}

/// Whether the metered evaluation produced a usable assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Success,
    Failure,
}

/// One metered (cache-miss) AI evaluation, bound to its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub symbol: String,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub outcome: CallOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(rates_for("gpt-4o-mini-2024-07-18").input, 0.00015);
        assert_eq!(rates_for("gpt-4o-2024-08-06").input, 0.0025);
        assert_eq!(rates_for("some-local-model"), DEFAULT_RATES);
    }

    #[test]
    fn cost_rounds_to_four_decimals() {
        assert_eq!(compute_cost("gpt-4o", 2000, 500), 0.01);
        // 1.234 × 0.003 = 0.003702
        assert_eq!(compute_cost("claude-sonnet-4-20250514", 1234, 0), 0.0037);
        assert_eq!(compute_cost("unknown", 0, 0), 0.0);
    }
}
