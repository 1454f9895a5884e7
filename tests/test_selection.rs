mod common;

use std::sync::Arc;

use chrono::Utc;
use common::*;
use tradefunnel::application::capacity::{CapacityConfig, CapacityFilter};
use tradefunnel::application::ranker::{QualityRanker, RankerConfig};
use tradefunnel::application::screener::{EligibilityScreener, ScreenerConfig};
use tradefunnel::application::system_context::PortfolioSnapshot;
use tradefunnel::domain::entities::candidate::Candidate;
use tradefunnel::domain::ports::indicator_provider::IndicatorProvider;
use tradefunnel::domain::values::stage::{CandidateStage, Tier};
use tradefunnel::domain::values::system_context::{
    MarketRegime, OpenPositions, RecentPnl, SystemContext, TimeOfDay, TradingDayStats,
};
use tradefunnel::infrastructure::market::static_provider::StaticIndicatorProvider;

fn context(regime: MarketRegime, drawdown_pct: f64, consecutive_losses: u32) -> SystemContext {
    SystemContext {
        market_regime: regime,
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

fn portfolio(total_exposure: f64, open_positions: u32) -> PortfolioSnapshot {
    PortfolioSnapshot {
        capital: 100_000.0,
        total_exposure,
        open_positions,
    }
}

fn evaluated(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            let mut c = Candidate::screened("run-1", &instrument(i), bullish_facts(80.0, 60.0), 90.0 - i as f64)
                .advance(CandidateStage::AiEvaluated);
            c.rank = i + 1;
            c
        })
        .collect()
}

fn screen(provider: StaticIndicatorProvider) -> Vec<Candidate> {
    let provider: Arc<dyn IndicatorProvider> = Arc::new(provider);
    let universe = provider.universe(tradefunnel::domain::values::run_type::RunType::Swing).unwrap();
    EligibilityScreener::new(provider, ScreenerConfig::default())
        .screen("run-1", &universe, None)
        .candidates
}

#[test]
fn test_screening_counts_skips_and_orders_by_score() {
    let provider = universe_provider(6, 4).with_instrument(instrument(99), None);
    let provider: Arc<dyn IndicatorProvider> = Arc::new(provider);
    let universe = provider.universe(tradefunnel::domain::values::run_type::RunType::Swing).unwrap();

    let outcome = EligibilityScreener::new(provider, ScreenerConfig::default()).screen("run-1", &universe, None);

    assert_eq!(outcome.scanned, 7);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.rejected, 2);
    assert_eq!(outcome.errors, 0);
    let symbols: Vec<&str> = outcome.candidates.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SYM000", "SYM001", "SYM002", "SYM003"]);
    assert!(outcome.candidates.iter().all(|c| c.stage == CandidateStage::Screened));
    assert_eq!(outcome.candidates[0].metadata["l1_rank"], 1);
}

#[test]
fn test_screening_is_deterministic() {
    let a = screen(universe_provider(50, 25));
    let b = screen(universe_provider(50, 25));
    let ids = |v: &[Candidate]| v.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
}

#[test]
fn test_ranker_keeps_layer1_order_on_ties() {
    // Identical facts, so every quality score ties
    let provider = (0..5).fold(StaticIndicatorProvider::new(MarketRegime::Neutral), |p, i| {
        p.with_instrument(instrument(i), Some(bullish_facts(80.0, 60.0)))
    });
    let screened = screen(provider);
    let ranked = QualityRanker::new(RankerConfig::default()).rank(&screened);

    let l1: Vec<&str> = screened.iter().map(|c| c.symbol.as_str()).collect();
    let l2: Vec<&str> = ranked.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(l1, l2);
    assert!(ranked.iter().all(|c| c.parent_id.is_some()));
}

#[test]
fn test_ranker_truncates_to_max_results() {
    let screened = screen(universe_provider(40, 40));
    let ranked = QualityRanker::new(RankerConfig {
        max_results: 7,
        ..Default::default()
    })
    .rank(&screened);

    assert_eq!(ranked.len(), 7);
    assert_eq!(ranked.last().unwrap().rank, 7);
    assert!(ranked
        .windows(2)
        .all(|w| w[0].trade_quality_score >= w[1].trade_quality_score));
}

#[test]
fn test_capacity_with_no_candidates() {
    let filter = CapacityFilter::new(CapacityConfig::default());
    let selection = filter.select(&[], &portfolio(0.0, 0), &context(MarketRegime::Bullish, 0.0, 0), 5);
    assert_eq!(selection.tier_counts(), [0, 0, 0]);
    assert!(selection.final_candidates().is_empty());
}

#[test]
fn test_tiers_split_by_limit_and_slots() {
    let filter = CapacityFilter::new(CapacityConfig::default());
    // 10 max positions, 7 open: 3 slots
    let selection = filter.select(&evaluated(12), &portfolio(20_000.0, 7), &context(MarketRegime::Bullish, 0.0, 0), 5);

    assert_eq!(selection.open_slots, 3);
    assert_eq!(selection.tier_counts(), [3, 5, 4]);
    assert!(selection.tier_1.iter().all(|c| c.tier == Some(Tier::Tier1)));
    assert!(selection.tier_1.iter().all(|c| c.stage == CandidateStage::Final));
    let finals: Vec<&str> = selection.final_candidates().iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(finals, vec!["SYM000", "SYM001", "SYM002"]);
}

#[test]
fn test_risk_limits_close_all_slots() {
    let filter = CapacityFilter::new(CapacityConfig::default());
    let bull = |dd, losses| context(MarketRegime::Bullish, dd, losses);

    assert_eq!(filter.open_slots(&portfolio(80_000.0, 2), &bull(0.0, 0)), 0);
    assert_eq!(filter.open_slots(&portfolio(0.0, 0), &bull(10.0, 0)), 0);
    assert_eq!(filter.open_slots(&portfolio(0.0, 0), &bull(0.0, 3)), 0);
    assert_eq!(filter.open_slots(&portfolio(79_000.0, 0), &bull(9.9, 2)), 10);

    let selection = filter.select(&evaluated(6), &portfolio(0.0, 0), &bull(12.0, 0), 5);
    assert!(selection.final_candidates().is_empty());
    assert_eq!(selection.tier_counts(), [0, 5, 1]);
}

#[test]
fn test_volatile_regime_halves_slots_rounding_up() {
    let filter = CapacityFilter::new(CapacityConfig::default());
    let volatile = context(MarketRegime::Volatile, 0.0, 0);
    assert_eq!(filter.open_slots(&portfolio(0.0, 0), &volatile), 5);
    assert_eq!(filter.open_slots(&portfolio(0.0, 5), &volatile), 3);
}

#[test]
fn test_ai_confidence_reorders_final_selection() {
    let filter = CapacityFilter::new(CapacityConfig::default());
    let mut candidates = evaluated(3);
    // SYM002 has the lowest screener score but the strongest AI view
    candidates[0].ai_confidence = Some(4.0);
    candidates[1].ai_confidence = Some(5.0);
    candidates[2].ai_confidence = Some(9.5);

    let selection = filter.select(&candidates, &portfolio(0.0, 0), &context(MarketRegime::Neutral, 0.0, 0), 1);
    assert_eq!(selection.final_candidates()[0].symbol, "SYM002");
    assert_eq!(selection.final_candidates()[0].combined_score, Some(92.2));
}
