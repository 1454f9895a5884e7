//! Turns a final candidate into a sizing-agnostic [`TradeIntent`].

use serde::Serialize;

use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::trade_intent::{PriceTarget, SizingHint, TradeIntent};
use crate::domain::error::DomainError;
use crate::domain::values::ai_assessment::EntryTiming;
use crate::domain::values::bias::Bias;
use crate::domain::values::indicator_facts::Trend;
use crate::domain::values::run_type::RunType;
use crate::domain::values::system_context::SystemContext;

#[derive(Debug, Clone, Serialize)]
pub struct IntentConfig {
    /// Stop distance from entry in ATRs.
    pub stop_atr_multiple: f64,
    /// Target distances in multiples of the stop distance, nearest first.
    pub target_r_multiples: Vec<f64>,
    pub target_probabilities: Vec<f64>,
    pub reduced_drawdown_pct: f64,
    pub minimal_drawdown_pct: f64,
    pub reduced_after_losses: u32,
    pub minimal_after_losses: u32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 2.0,
            target_r_multiples: vec![2.0, 3.0],
            target_probabilities: vec![0.6, 0.35],
            reduced_drawdown_pct: 5.0,
            minimal_drawdown_pct: 8.0,
            reduced_after_losses: 2,
            minimal_after_losses: 3,
        }
    }
}

/// Intent for one final-stage candidate of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateIntent {
    pub candidate_id: String,
    pub symbol: String,
    pub instrument_id: String,
    pub ai_confidence: Option<f64>,
    pub intent: TradeIntent,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn bias_for(candidate: &Candidate) -> Bias {
    let avoid_timing = candidate
        .ai_assessment
        .as_ref()
        .is_some_and(|a| a.entry_timing == EntryTiming::Avoid);
    if avoid_timing {
        return Bias::Avoid;
    }
    match candidate.indicators.trend() {
        Trend::Bullish => Bias::Long,
        Trend::Bearish => Bias::Short,
        Trend::Neutral => Bias::Avoid,
    }
}

pub fn sizing_hint(context: &SystemContext, config: &IntentConfig) -> SizingHint {
    let losses = context.trading_day_stats.consecutive_losses;
    if context.drawdown_pct >= config.minimal_drawdown_pct || losses >= config.minimal_after_losses {
        SizingHint::Minimal
    } else if context.drawdown_pct >= config.reduced_drawdown_pct || losses >= config.reduced_after_losses {
        SizingHint::Reduced
    } else {
        SizingHint::Full
    }
}

/// Build the intent for `candidate`. Avoid-biased intents carry the entry as
/// their stop and no targets.
pub fn build_intent(
    candidate: &Candidate,
    run_type: RunType,
    context: &SystemContext,
    config: &IntentConfig,
) -> Result<TradeIntent, DomainError> {
    let facts = &candidate.indicators;
    if facts.close <= 0.0 {
        return Err(DomainError::InvalidInput(format!(
            "{}: close must be positive",
            candidate.symbol
        )));
    }
    if config.target_r_multiples.len() != config.target_probabilities.len() {
        return Err(DomainError::Config(
            "target multiples and probabilities differ in length".into(),
        ));
    }

    let bias = bias_for(candidate);
    let entry = round2(facts.close);
    let strategy_key = format!("{run_type}_{bias}");
    let hint = sizing_hint(context, config);

    let direction = match bias {
        Bias::Long => 1.0,
        Bias::Short => -1.0,
        Bias::Avoid => {
            return Ok(TradeIntent::new(bias, entry, entry, Vec::new(), 0.0, hint, strategy_key));
        }
    };

    let risk = config.stop_atr_multiple * facts.atr;
    if risk <= 0.0 {
        return Err(DomainError::InvalidInput(format!(
            "{}: ATR must be positive to place a stop",
            candidate.symbol
        )));
    }

    let stop = round2(entry - direction * risk);
    let targets: Vec<PriceTarget> = config
        .target_r_multiples
        .iter()
        .zip(&config.target_probabilities)
        .map(|(r, p)| PriceTarget {
            price: round2(entry + direction * risk * r),
            probability: *p,
        })
        .collect();
    let expected_rr = round2(
        config
            .target_r_multiples
            .iter()
            .zip(&config.target_probabilities)
            .map(|(r, p)| r * p)
            .sum(),
    );

    Ok(TradeIntent::new(bias, entry, stop, targets, expected_rr, hint, strategy_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::indicator_facts::{IndicatorFacts, Instrument, SetupStatus};
    use crate::domain::values::system_context::{
        MarketRegime, OpenPositions, RecentPnl, TimeOfDay, TradingDayStats,
    };
    use chrono::Utc;

    fn context(drawdown_pct: f64, consecutive_losses: u32) -> SystemContext {
        SystemContext {
            market_regime: MarketRegime::Neutral,
            recent_pnl: RecentPnl::default(),
            drawdown_pct,
            open_positions: OpenPositions::default(),
            time_of_day: TimeOfDay::MarketHours,
            trading_day_stats: TradingDayStats {
                consecutive_losses,
                ..Default::default()
            },
            captured_at: Utc::now(),
        }
    }

    fn candidate(bullish: bool, bearish: bool) -> Candidate {
        let facts = IndicatorFacts {
            close: 100.0,
            atr: 2.5,
            avg_volume: 1_000_000.0,
            history_bars: 250,
            base_score: 70.0,
            mtf_score: 60.0,
            timeframes: Default::default(),
            bullish_trend: bullish,
            bearish_trend: bearish,
            above_sma_50: false,
            above_sma_200: false,
            higher_highs: false,
            rsi_bullish: false,
            macd_bullish: false,
            volume_surge: false,
            rsi_bearish: false,
            macd_bearish: false,
            setup_status: SetupStatus::Ready,
        };
        Candidate::screened("run", &Instrument::new("i1", "ACME"), facts, 70.0)
    }

    #[test]
    fn long_intent_levels() {
        let intent = build_intent(
            &candidate(true, false),
            RunType::Swing,
            &context(0.0, 0),
            &IntentConfig::default(),
        )
        .unwrap();
        assert_eq!(intent.bias(), Bias::Long);
        assert_eq!(intent.proposed_sl(), 95.0);
        let prices: Vec<f64> = intent.proposed_targets().iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![110.0, 115.0]);
        assert_eq!(intent.expected_rr(), 2.25);
        assert_eq!(intent.strategy_key(), "swing_long");
        assert_eq!(intent.sizing_hint(), SizingHint::Full);
    }

    #[test]
    fn short_stop_sits_above_entry() {
        let intent = build_intent(
            &candidate(false, true),
            RunType::Longterm,
            &context(0.0, 0),
            &IntentConfig::default(),
        )
        .unwrap();
        assert_eq!(intent.bias(), Bias::Short);
        assert!(intent.proposed_sl() > intent.proposed_entry());
        assert_eq!(intent.strategy_key(), "longterm_short");
    }

    #[test]
    fn neutral_trend_is_avoid() {
        let intent = build_intent(
            &candidate(false, false),
            RunType::Swing,
            &context(0.0, 0),
            &IntentConfig::default(),
        )
        .unwrap();
        assert_eq!(intent.bias(), Bias::Avoid);
        assert!(intent.proposed_targets().is_empty());
    }

    #[test]
    fn sizing_shrinks_with_risk_state() {
        let config = IntentConfig::default();
        assert_eq!(sizing_hint(&context(6.0, 0), &config), SizingHint::Reduced);
        assert_eq!(sizing_hint(&context(0.0, 2), &config), SizingHint::Reduced);
        assert_eq!(sizing_hint(&context(9.0, 0), &config), SizingHint::Minimal);
        assert_eq!(sizing_hint(&context(0.0, 3), &config), SizingHint::Minimal);
    }
}
