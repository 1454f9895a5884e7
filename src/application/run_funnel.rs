//! Run tracker: executes the four layers as one auditable run.
//!
//! The run row is written before Layer 1 starts and finalized exactly once.
//! A layer error marks the run failed, notifies the operator and is returned
//! to the caller; retrying is the caller's decision. A finished run that
//! cannot be persisted notifies the same way.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, info_span, Instrument as _};

use crate::application::capacity::CapacityFilter;
use crate::application::metrics::{
    compression_efficiency, compression_ratio, overlap_pct, success_rate,
};
use crate::application::ranker::QualityRanker;
use crate::application::scoring::ai_scorer::AiScorer;
use crate::application::scoring::cost_tracker::CostTracker;
use crate::application::scoring::prompt::template_version;
use crate::application::screener::EligibilityScreener;
use crate::application::system_context::SystemContextBuilder;
use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::run::Run;
use crate::domain::error::DomainError;
use crate::domain::ports::indicator_provider::IndicatorProvider;
use crate::domain::ports::notifier::Notifier;
use crate::domain::ports::run_repository::RunRepository;
use crate::domain::values::indicator_facts::Instrument;
use crate::domain::values::run_type::RunType;

pub struct RunFunnelUseCase {
    repo: Arc<dyn RunRepository>,
    indicators: Arc<dyn IndicatorProvider>,
    screener: EligibilityScreener,
    ranker: QualityRanker,
    scorer: AiScorer,
    capacity: CapacityFilter,
    context: Arc<SystemContextBuilder>,
    notifier: Arc<dyn Notifier>,
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Keep the first occurrence of each instrument id.
fn dedupe(universe: Vec<Instrument>) -> Vec<Instrument> {
    let mut seen = HashSet::new();
    universe
        .into_iter()
        .filter(|i| {
            let first = seen.insert(i.id.clone());
            if !first {
                debug!(instrument_id = %i.id, symbol = %i.symbol, "duplicate instrument in universe, dropped");
            }
            first
        })
        .collect()
}

fn symbols(selection: &[Candidate]) -> Vec<String> {
    selection.iter().map(|c| c.symbol.clone()).collect()
}

impl RunFunnelUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn RunRepository>,
        indicators: Arc<dyn IndicatorProvider>,
        screener: EligibilityScreener,
        ranker: QualityRanker,
        scorer: AiScorer,
        capacity: CapacityFilter,
        context: Arc<SystemContextBuilder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repo,
            indicators,
            screener,
            ranker,
            scorer,
            capacity,
            context,
            notifier,
        }
    }

    /// Run the funnel for `run_type` over `universe` (the provider's full
    /// universe when `None`), keeping at most `limit` final candidates.
    pub async fn execute(
        &self,
        run_type: RunType,
        universe: Option<Vec<Instrument>>,
        limit: Option<usize>,
    ) -> Result<Run, DomainError> {
        let universe = dedupe(match universe {
            Some(u) => u,
            None => self.indicators.universe(run_type)?,
        });
        let limit = limit.unwrap_or(self.capacity.config().default_limit);

        let mut run = Run::start(run_type, universe.len());
        self.repo.create_run(&run)?;

        let span = info_span!("funnel_run", run_id = %run.id, run_type = %run_type);
        let mut tracker = CostTracker::default();
        let outcome = self
            .run_layers(&run, &universe, limit, &mut tracker)
            .instrument(span.clone())
            .await;

        let _enter = span.enter();
        run.add_ai_usage(tracker.calls_count(), tracker.total_cost());

        let metrics = match outcome {
            Ok(metrics) => metrics,
            Err(e) => {
                error!(error = %e, "funnel run failed");
                run.fail(e.to_string())?;
                if let Err(db) = self.repo.update_run(&run) {
                    error!(error = %db, "could not persist failed run");
                }
                self.notify_failure(&run, &e);
                return Err(e);
            }
        };

        run.merge_metrics(metrics);
        run.complete()?;
        if let Err(e) = self.repo.update_run(&run) {
            error!(error = %e, "could not persist completed run");
            self.notify_failure(&run, &e);
            return Err(e);
        }
        info!(
            final_count = run.metric_u64("final_count").unwrap_or(0),
            ai_calls = run.ai_calls_count(),
            ai_cost = run.ai_cost(),
            "funnel run completed"
        );
        Ok(run)
    }

    fn notify_failure(&self, run: &Run, e: &DomainError) {
        self.notifier.notify(
            &format!("Funnel run failed ({})", run.run_type),
            &format!("run {} aborted: {e}", run.id),
        );
    }

    async fn run_layers(
        &self,
        run: &Run,
        universe: &[Instrument],
        limit: usize,
        tracker: &mut CostTracker,
    ) -> Result<Map<String, Value>, DomainError> {
        info!(universe_size = universe.len(), limit, "funnel run started");

        let t = Instant::now();
        let screened = self.screener.screen(&run.id, universe, None);
        self.repo.add_candidates(&screened.candidates)?;
        let layer1_ms = elapsed_ms(t);
        info!(
            eligible = screened.candidates.len(),
            skipped = screened.skipped,
            errors = screened.errors,
            "layer 1 screening done"
        );

        let t = Instant::now();
        let ranked = self.ranker.rank(&screened.candidates);
        self.repo.add_candidates(&ranked)?;
        let layer2_ms = elapsed_ms(t);
        info!(ranked = ranked.len(), "layer 2 ranking done");

        let t = Instant::now();
        let evaluated = self.scorer.score(run.run_type, &ranked, tracker).await;
        self.repo.add_candidates(&evaluated)?;
        let layer3_ms = elapsed_ms(t);
        info!(
            evaluated = evaluated.len(),
            calls = tracker.calls_count(),
            cache_hits = tracker.cache_hits(),
            cost = tracker.total_cost(),
            "layer 3 AI scoring done"
        );

        let t = Instant::now();
        let captured = self.context.capture()?;
        let selection = self
            .capacity
            .select(&evaluated, &captured.portfolio, &captured.context, limit);
        self.repo.add_candidates(selection.final_candidates())?;
        let layer4_ms = elapsed_ms(t);

        let previous_final = match self.repo.latest_completed_run(run.run_type, &run.id)? {
            Some(prev) => Some(self.repo.final_symbols(&prev.id)?),
            None => None,
        };

        let eligible_count = screened.candidates.len();
        let final_symbols = symbols(selection.final_candidates());
        let final_count = final_symbols.len();
        let [tier_1, tier_2, tier_3] = selection.tier_counts();
        let (input_tokens, output_tokens) = tracker.total_tokens();

        let metrics = json!({
            "universe_size": run.universe_size(),
            "scanned_count": screened.scanned,
            "skipped_count": screened.skipped,
            "rejected_count": screened.rejected,
            "error_count": screened.errors,
            "eligible_count": eligible_count,
            "ranked_count": ranked.len(),
            "ai_evaluated_count": evaluated.len(),
            "ai_calls_count": tracker.calls_count(),
            "ai_cache_hits": tracker.cache_hits(),
            "ai_cost": tracker.total_cost(),
            "ai_input_tokens": input_tokens,
            "ai_output_tokens": output_tokens,
            "ai_success_rate": success_rate(tracker.successes(), tracker.attempts()),
            "ai_mode": if self.scorer.is_enabled() { "enabled" } else { "disabled" },
            "prompt_version": template_version(run.run_type),
            "final_count": final_count,
            "tier_1_count": tier_1,
            "tier_2_count": tier_2,
            "tier_3_count": tier_3,
            "open_slots": selection.open_slots,
            "final_symbols": final_symbols,
            "tier_2_symbols": symbols(&selection.tier_2),
            "tier_3_symbols": symbols(&selection.tier_3),
            "market_regime": captured.context.market_regime,
            "compression_efficiency": compression_efficiency(final_count, eligible_count),
            "compression_ratio": compression_ratio(eligible_count, final_count),
            "overlap_with_prev_run": previous_final
                .map(|prev| overlap_pct(&final_symbols, &prev))
                .unwrap_or(0.0),
            "layer1_ms": layer1_ms,
            "layer2_ms": layer2_ms,
            "layer3_ms": layer3_ms,
            "layer4_ms": layer4_ms,
        });

        Ok(into_map(metrics))
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
