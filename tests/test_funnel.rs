mod common;

use std::sync::Arc;

use common::*;
use tradefunnel::application::capacity::{CapacityConfig, CapacityFilter};
use tradefunnel::application::ranker::{QualityRanker, RankerConfig};
use tradefunnel::application::run_funnel::RunFunnelUseCase;
use tradefunnel::application::scoring::ai_scorer::{AiScorer, AiScorerConfig};
use tradefunnel::application::screener::{EligibilityScreener, ScreenerConfig};
use tradefunnel::application::system_context::SystemContextBuilder;
use tradefunnel::domain::entities::candidate::Candidate;
use tradefunnel::domain::entities::run::Run;
use tradefunnel::domain::error::DomainError;
use tradefunnel::domain::ports::ai_provider::AiProvider;
use tradefunnel::domain::ports::indicator_provider::IndicatorProvider;
use tradefunnel::domain::ports::run_repository::{RunFilter, RunRepository};
use tradefunnel::domain::values::run_type::{RunStatus, RunType};
use tradefunnel::domain::values::stage::CandidateStage;
use tradefunnel::domain::values::system_context::SessionConfig;
use tradefunnel::infrastructure::account::fixed::FixedAccountProvider;
use tradefunnel::infrastructure::memory::ai_cache::MemoryAiCache;
use tradefunnel::infrastructure::sqlite::migrations::open_connection;
use tradefunnel::infrastructure::sqlite::run_repo::SqliteRunRepo;

fn scored_funnel(provider: Arc<ScriptedProvider>) -> tradefunnel::TradeFunnel {
    setup_with(
        ":memory:",
        universe_provider(100, 40),
        Arc::new(FixedAccountProvider::new(flat_account())),
        vec![provider as Arc<dyn AiProvider>],
        Arc::new(RecordingNotifier::default()),
    )
}

#[tokio::test]
async fn test_end_to_end_compression() {
    let provider = Arc::new(ScriptedProvider::new("scripted", "gpt-4o-mini").hanging_on([1, 3, 5, 7, 9]));
    let tf = scored_funnel(provider.clone());

    let run = tf.run_funnel(RunType::Swing, None, Some(5)).await.unwrap();

    assert_eq!(run.status(), RunStatus::Completed);
    assert!(run.completed_at.is_some());
    assert_eq!(run.universe_size(), 100);
    assert_eq!(run.metric_u64("eligible_count"), Some(40));
    assert_eq!(run.metric_u64("ranked_count"), Some(30));
    assert_eq!(run.metric_u64("ai_evaluated_count"), Some(10));
    assert_eq!(run.metric_u64("final_count"), Some(5));
    assert_eq!(run.metric_f64("ai_success_rate"), Some(66.67));
    assert_eq!(run.metric_f64("compression_efficiency"), Some(12.5));
    assert_eq!(run.metric_f64("compression_ratio"), Some(8.0));
    assert_eq!(run.metric_f64("overlap_with_prev_run"), Some(0.0));
    assert_eq!(run.metrics()["prompt_version"], "swing-v1");

    // Every evaluation up to the cap was attempted, timeouts included
    assert_eq!(provider.call_count(), 15);
    assert_eq!(run.ai_calls_count(), 15);
    assert!((run.ai_cost() - 0.003).abs() < 1e-9);
}

#[tokio::test]
async fn test_stage_rows_shrink_and_link_back() {
    let provider = Arc::new(ScriptedProvider::new("scripted", "gpt-4o-mini").hanging_on([1, 3, 5, 7, 9]));
    let tf = scored_funnel(provider);
    let run = tf.run_funnel(RunType::Swing, None, Some(5)).await.unwrap();

    let count = |stage| tf.run_candidates(&run.id, Some(stage)).unwrap().len();
    let screened = count(CandidateStage::Screened);
    let ranked = count(CandidateStage::Ranked);
    let evaluated = count(CandidateStage::AiEvaluated);
    let finals = count(CandidateStage::Final);
    assert_eq!((screened, ranked, evaluated, finals), (40, 30, 10, 5));
    assert!(screened >= ranked && ranked >= evaluated && evaluated >= finals);

    let all = tf.run_candidates(&run.id, None).unwrap();
    let final_rows = tf.run_candidates(&run.id, Some(CandidateStage::Final)).unwrap();
    for row in &final_rows {
        let parent = all
            .iter()
            .find(|c| Some(&c.id) == row.parent_id.as_ref())
            .expect("final row links to its AI-evaluated row");
        assert_eq!(parent.stage, CandidateStage::AiEvaluated);
        assert_eq!(parent.instrument_id, row.instrument_id);
        assert!(row.ai_confidence.is_some());
        assert!(row.metadata.contains_key("l1_rank"));
        assert!(row.metadata.contains_key("l2_rank"));
    }

    // Timeouts hit ranked positions 2, 4, 6, 8 and 10; the best survivors win
    let symbols: Vec<&str> = final_rows.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SYM000", "SYM002", "SYM004", "SYM006", "SYM008"]);
}

#[tokio::test]
async fn test_disabled_ai_passes_capped_set_through() {
    let tf = setup(universe_provider(100, 40));
    let run = tf.run_funnel(RunType::Swing, None, None).await.unwrap();

    assert_eq!(run.metric_u64("ai_evaluated_count"), Some(15));
    assert_eq!(run.metric_u64("ai_calls_count"), Some(0));
    assert_eq!(run.metrics()["ai_mode"], "disabled");
    assert_eq!(run.metric_u64("final_count"), Some(5));
    assert_eq!(run.ai_cost(), 0.0);
}

#[tokio::test]
async fn test_empty_universe_completes_with_zero_metrics() {
    let tf = setup(universe_provider(10, 0));
    let run = tf.run_funnel(RunType::Longterm, Some(Vec::new()), None).await.unwrap();

    assert_eq!(run.status(), RunStatus::Completed);
    assert_eq!(run.universe_size(), 0);
    assert_eq!(run.metric_u64("eligible_count"), Some(0));
    assert_eq!(run.metric_u64("final_count"), Some(0));
    assert_eq!(run.metric_f64("compression_efficiency"), Some(0.0));
    assert_eq!(run.metric_f64("compression_ratio"), Some(0.0));
    assert_eq!(run.metric_u64("tier_1_count"), Some(0));
}

#[tokio::test]
async fn test_layer_failure_marks_run_failed_and_notifies() {
    let notifier = Arc::new(RecordingNotifier::default());
    let tf = setup_with(
        ":memory:",
        universe_provider(20, 10),
        Arc::new(FailingAccount),
        Vec::new(),
        notifier.clone(),
    );

    let err = tf.run_funnel(RunType::Swing, None, None).await.unwrap_err();
    assert!(err.to_string().contains("broker unavailable"));

    let runs = tf.list_runs(Some(RunType::Swing), None).unwrap();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.status(), RunStatus::Failed);
    assert!(run.completed_at.is_some());
    assert!(run.error.as_deref().unwrap().contains("broker unavailable"));
    assert!(run.metric_u64("final_count").is_none());

    // Rows from the layers that finished stay for audit
    assert_eq!(tf.run_candidates(&run.id, Some(CandidateStage::Screened)).unwrap().len(), 10);

    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains(&run.id));
}

#[tokio::test]
async fn test_overlap_with_previous_run_of_same_type() {
    let tf = setup(universe_provider(30, 12));

    let first = tf.run_funnel(RunType::Swing, None, None).await.unwrap();
    let second = tf.run_funnel(RunType::Swing, None, None).await.unwrap();
    let other = tf.run_funnel(RunType::Longterm, None, None).await.unwrap();

    assert_eq!(first.metric_f64("overlap_with_prev_run"), Some(0.0));
    assert_eq!(second.metric_f64("overlap_with_prev_run"), Some(100.0));
    assert_eq!(other.metric_f64("overlap_with_prev_run"), Some(0.0));
}

#[tokio::test]
async fn test_symbol_filter_narrows_universe() {
    let tf = setup(universe_provider(20, 20));
    let run = tf
        .run_funnel_for_symbols(RunType::Swing, &["sym000".to_string(), "SYM001".to_string()], None)
        .await
        .unwrap();
    assert_eq!(run.universe_size(), 2);
    assert_eq!(run.metric_u64("eligible_count"), Some(2));

    let missing = tf
        .run_funnel_for_symbols(RunType::Swing, &["NOPE".to_string()], None)
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_concurrent_runs_stay_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("funnel.db");
    let db = db.to_str().unwrap();

    let account = || Arc::new(FixedAccountProvider::new(flat_account()));
    let a = setup_with(db, universe_provider(50, 20), account(), Vec::new(), Arc::new(RecordingNotifier::default()));
    let b = setup_with(db, universe_provider(30, 8), account(), Vec::new(), Arc::new(RecordingNotifier::default()));

    let (ra, rb) = tokio::join!(
        a.run_funnel(RunType::Swing, None, None),
        b.run_funnel(RunType::Longterm, None, None)
    );
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    let rows_a = a.run_candidates(&ra.id, Some(CandidateStage::Screened)).unwrap();
    let rows_b = a.run_candidates(&rb.id, Some(CandidateStage::Screened)).unwrap();
    assert_eq!(rows_a.len(), 20);
    assert_eq!(rows_b.len(), 8);
    assert!(rows_a.iter().all(|c| c.run_id == ra.id));
    assert!(rows_b.iter().all(|c| c.run_id == rb.id));
    assert_eq!(a.list_runs(None, None).unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_run_is_not_found() {
    let tf = setup(universe_provider(1, 1));
    assert!(tf.get_run("missing").is_err());
    assert!(tf.run_candidates("missing", None).is_err());
}

#[tokio::test]
async fn test_repeated_instrument_is_scanned_once() {
    let tf = setup(universe_provider(5, 5));
    let universe = vec![instrument(0), instrument(1), instrument(0)];

    let run = tf.run_funnel(RunType::Swing, Some(universe), None).await.unwrap();

    assert_eq!(run.status(), RunStatus::Completed);
    assert_eq!(run.universe_size(), 2);
    assert_eq!(run.metric_u64("eligible_count"), Some(2));
    let screened = tf.run_candidates(&run.id, Some(CandidateStage::Screened)).unwrap();
    let symbols: Vec<&str> = screened.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["SYM000", "SYM001"]);
}

#[tokio::test]
async fn test_metrics_report_rejections_and_tokens() {
    let provider = Arc::new(ScriptedProvider::new("scripted", "gpt-4o-mini"));
    let tf = scored_funnel(provider);
    let run = tf.run_funnel(RunType::Swing, None, None).await.unwrap();

    assert_eq!(run.metric_u64("rejected_count"), Some(60));
    assert_eq!(run.metric_u64("ai_input_tokens"), Some(15_000));
    assert_eq!(run.metric_u64("ai_output_tokens"), Some(3_000));
}

/// Run repository whose writes of finished runs fail.
struct FinishWriteFails(SqliteRunRepo);

impl RunRepository for FinishWriteFails {
    fn create_run(&self, run: &Run) -> Result<(), DomainError> {
        self.0.create_run(run)
    }
    fn update_run(&self, _run: &Run) -> Result<(), DomainError> {
        Err(DomainError::Database("disk full".into()))
    }
    fn get_run(&self, id: &str) -> Result<Option<Run>, DomainError> {
        self.0.get_run(id)
    }
    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, DomainError> {
        self.0.list_runs(filter)
    }
    fn latest_completed_run(&self, run_type: RunType, exclude_id: &str) -> Result<Option<Run>, DomainError> {
        self.0.latest_completed_run(run_type, exclude_id)
    }
    fn add_candidates(&self, candidates: &[Candidate]) -> Result<(), DomainError> {
        self.0.add_candidates(candidates)
    }
    fn list_candidates(&self, run_id: &str, stage: Option<CandidateStage>) -> Result<Vec<Candidate>, DomainError> {
        self.0.list_candidates(run_id, stage)
    }
    fn final_symbols(&self, run_id: &str) -> Result<Vec<String>, DomainError> {
        self.0.final_symbols(run_id)
    }
}

#[tokio::test]
async fn test_unpersisted_completion_is_reported() {
    let repo = Arc::new(FinishWriteFails(SqliteRunRepo::new(open_connection(":memory:").unwrap())));
    let indicators: Arc<dyn IndicatorProvider> = Arc::new(universe_provider(10, 5));
    let notifier = Arc::new(RecordingNotifier::default());
    let funnel = RunFunnelUseCase::new(
        repo.clone(),
        indicators.clone(),
        EligibilityScreener::new(indicators.clone(), ScreenerConfig::default()),
        QualityRanker::new(RankerConfig::default()),
        AiScorer::new(Vec::new(), Arc::new(MemoryAiCache::new()), AiScorerConfig::default()),
        CapacityFilter::new(CapacityConfig::default()),
        Arc::new(SystemContextBuilder::new(
            Arc::new(FixedAccountProvider::new(flat_account())),
            indicators,
            SessionConfig::default(),
        )),
        notifier.clone(),
    );

    let err = funnel.execute(RunType::Swing, None, None).await.unwrap_err();
    assert!(err.to_string().contains("disk full"));

    let messages = notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("disk full"));
}
