pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::capacity::CapacityFilter;
use crate::application::gates::{self, GateVerdict};
use crate::application::ranker::QualityRanker;
use crate::application::run_funnel::RunFunnelUseCase;
use crate::application::runs::RunsUseCase;
use crate::application::scoring::ai_scorer::AiScorer;
use crate::application::screener::EligibilityScreener;
use crate::application::system_context::{CapturedState, SystemContextBuilder};
use crate::application::trade_intent::{build_intent, CandidateIntent};
use crate::config::{FunnelConfig, ProviderSettings};
use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::run::Run;
use crate::domain::entities::trade_recommendation::TradeRecommendation;
use crate::domain::error::DomainError;
use crate::domain::ports::account_provider::{AccountProvider, AccountSnapshot};
use crate::domain::ports::ai_provider::AiProvider;
use crate::domain::ports::indicator_provider::IndicatorProvider;
use crate::domain::ports::notifier::Notifier;
use crate::domain::values::gate_result::GateResult;
use crate::domain::values::indicator_facts::Instrument;
use crate::domain::values::run_type::RunType;
use crate::domain::values::stage::CandidateStage;
use crate::domain::values::system_context::MarketRegime;
use crate::infrastructure::account::fixed::{FixedAccountProvider, JsonFileAccountProvider};
use crate::infrastructure::ai::anthropic::AnthropicProvider;
use crate::infrastructure::ai::openai::OpenAiChatProvider;
use crate::infrastructure::market::static_provider::StaticIndicatorProvider;
use crate::infrastructure::notify::log::LogNotifier;
use crate::infrastructure::sqlite::ai_cache::SqliteAiCache;
use crate::infrastructure::sqlite::migrations::open_connection;
use crate::infrastructure::sqlite::run_repo::SqliteRunRepo;
use std::sync::Arc;
use tracing::warn;

/// External collaborators the funnel runs against.
pub struct FunnelProviders {
    pub indicators: Arc<dyn IndicatorProvider>,
    pub account: Arc<dyn AccountProvider>,
    /// Priority order; empty disables AI scoring.
    pub ai: Vec<Arc<dyn AiProvider>>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct TradeFunnel {
    config: FunnelConfig,
    indicators: Arc<dyn IndicatorProvider>,
    context: Arc<SystemContextBuilder>,
    funnel_uc: RunFunnelUseCase,
    runs_uc: RunsUseCase,
}

fn ai_providers_from(settings: &ProviderSettings, config: &FunnelConfig) -> Vec<Arc<dyn AiProvider>> {
    let mut providers: Vec<Arc<dyn AiProvider>> = Vec::new();
    for name in &settings.ai_providers {
        match name.as_str() {
            "openai" => match &settings.openai_api_key {
                Some(key) => {
                    let mut p = OpenAiChatProvider::new(key.clone(), settings.openai_model.clone(), config.ai.timeout);
                    if let Some(url) = &settings.openai_base_url {
                        p = p.with_base_url(url.clone());
                    }
                    providers.push(Arc::new(p));
                }
                None => warn!("openai listed but TRADEFUNNEL_OPENAI_API_KEY is not set, skipping"),
            },
            "anthropic" => match &settings.anthropic_api_key {
                Some(key) => providers.push(Arc::new(AnthropicProvider::new(
                    key.clone(),
                    settings.anthropic_model.clone(),
                    config.ai.timeout,
                ))),
                None => warn!("anthropic listed but TRADEFUNNEL_ANTHROPIC_API_KEY is not set, skipping"),
            },
            other => warn!(provider = other, "unknown AI provider, skipping"),
        }
    }
    providers
}

impl TradeFunnel {
    /// Build from `TRADEFUNNEL_*` environment variables.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let config = FunnelConfig::from_env();
        let settings = ProviderSettings::from_env();

        let indicators: Arc<dyn IndicatorProvider> = match &settings.facts_path {
            Some(path) => Arc::new(StaticIndicatorProvider::from_json_file(path)?),
            None => {
                warn!("TRADEFUNNEL_FACTS_PATH not set, scanning an empty universe");
                Arc::new(StaticIndicatorProvider::new(MarketRegime::Neutral))
            }
        };
        let account: Arc<dyn AccountProvider> = match &settings.account_path {
            Some(path) => Arc::new(JsonFileAccountProvider::new(path)),
            None => Arc::new(FixedAccountProvider::new(AccountSnapshot {
                capital: settings.capital,
                ..Default::default()
            })),
        };
        let ai = ai_providers_from(&settings, &config);

        Self::with_providers(
            db_path,
            config,
            FunnelProviders {
                indicators,
                account,
                ai,
                notifier: Arc::new(LogNotifier),
            },
        )
    }

    pub fn with_providers(
        db_path: &str,
        config: FunnelConfig,
        providers: FunnelProviders,
    ) -> Result<Self, DomainError> {
        let run_repo = Arc::new(SqliteRunRepo::new(open_connection(db_path)?));
        let ai_cache = Arc::new(SqliteAiCache::new(open_connection(db_path)?));

        let context = Arc::new(SystemContextBuilder::new(
            providers.account,
            providers.indicators.clone(),
            config.session.clone(),
        ));

        let funnel_uc = RunFunnelUseCase::new(
            run_repo.clone(),
            providers.indicators.clone(),
            EligibilityScreener::new(providers.indicators.clone(), config.screener.clone()),
            QualityRanker::new(config.ranker.clone()),
            AiScorer::new(providers.ai, ai_cache, config.ai.clone()),
            CapacityFilter::new(config.capacity.clone()),
            context.clone(),
            providers.notifier,
        );

        Ok(Self {
            config,
            indicators: providers.indicators,
            context,
            funnel_uc,
            runs_uc: RunsUseCase::new(run_repo),
        })
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    pub async fn run_funnel(
        &self,
        run_type: RunType,
        universe: Option<Vec<Instrument>>,
        limit: Option<usize>,
    ) -> Result<Run, DomainError> {
        self.funnel_uc.execute(run_type, universe, limit).await
    }

    /// Run over the provider universe narrowed to `symbols`.
    pub async fn run_funnel_for_symbols(
        &self,
        run_type: RunType,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<Run, DomainError> {
        let universe: Vec<Instrument> = self
            .indicators
            .universe(run_type)?
            .into_iter()
            .filter(|i| symbols.iter().any(|s| s.eq_ignore_ascii_case(&i.symbol)))
            .collect();
        if universe.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "none of {} are in the {run_type} universe",
                symbols.join(",")
            )));
        }
        self.run_funnel(run_type, Some(universe), limit).await
    }

    pub fn get_run(&self, id: &str) -> Result<Run, DomainError> {
        self.runs_uc.get(id)
    }

    pub fn list_runs(&self, run_type: Option<RunType>, limit: Option<usize>) -> Result<Vec<Run>, DomainError> {
        self.runs_uc.list(run_type, limit)
    }

    pub fn run_candidates(&self, run_id: &str, stage: Option<CandidateStage>) -> Result<Vec<Candidate>, DomainError> {
        self.runs_uc.candidates(run_id, stage)
    }

    pub fn system_context(&self) -> Result<CapturedState, DomainError> {
        self.context.capture()
    }

    /// Intents for a run's final candidates, all against one context capture.
    pub fn trade_intents(&self, run_id: &str) -> Result<Vec<CandidateIntent>, DomainError> {
        let run = self.runs_uc.get(run_id)?;
        let finals = self.runs_uc.candidates(run_id, Some(CandidateStage::Final))?;
        let captured = self.context.capture()?;
        finals
            .iter()
            .map(|c| {
                Ok(CandidateIntent {
                    candidate_id: c.id.clone(),
                    symbol: c.symbol.clone(),
                    instrument_id: c.instrument_id.clone(),
                    ai_confidence: c.ai_confidence,
                    intent: build_intent(c, run.run_type, &captured.context, &self.config.intent)?,
                })
            })
            .collect()
    }

    pub fn validate_recommendation(&self, rec: &TradeRecommendation) -> GateResult {
        gates::validate_recommendation(rec, &self.config.gates)
    }

    pub fn check_setup_quality(&self, rec: &TradeRecommendation) -> GateResult {
        gates::check_setup_quality(rec, &self.config.gates)
    }

    pub fn evaluate_gates(&self, rec: &TradeRecommendation) -> GateVerdict {
        gates::evaluate_gates(rec, &self.config.gates)
    }
}
