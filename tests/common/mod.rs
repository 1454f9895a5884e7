//! Shared test helpers.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tradefunnel::config::FunnelConfig;
use tradefunnel::domain::error::DomainError;
use tradefunnel::domain::ports::account_provider::{AccountProvider, AccountSnapshot};
use tradefunnel::domain::ports::ai_provider::{AiCompletion, AiProvider, AiRequest};
use tradefunnel::domain::ports::notifier::Notifier;
use tradefunnel::domain::values::indicator_facts::{IndicatorFacts, Instrument, SetupStatus};
use tradefunnel::domain::values::system_context::MarketRegime;
use tradefunnel::infrastructure::account::fixed::FixedAccountProvider;
use tradefunnel::infrastructure::market::static_provider::StaticIndicatorProvider;
use tradefunnel::{FunnelProviders, TradeFunnel};

/// Facts with three bullish flags, so the screener score is `0.7 × base + 30`.
pub fn bullish_facts(base_score: f64, mtf_score: f64) -> IndicatorFacts {
    IndicatorFacts {
        close: 50.0,
        atr: 1.5,
        avg_volume: 2_000_000.0,
        history_bars: 250,
        base_score,
        mtf_score,
        timeframes: Default::default(),
        bullish_trend: true,
        bearish_trend: false,
        above_sma_50: true,
        above_sma_200: false,
        higher_highs: true,
        rsi_bullish: false,
        macd_bullish: false,
        volume_surge: false,
        rsi_bearish: false,
        macd_bearish: false,
        setup_status: SetupStatus::Ready,
    }
}

/// Facts that never clear the default screener threshold.
pub fn weak_facts() -> IndicatorFacts {
    IndicatorFacts {
        bullish_trend: false,
        above_sma_50: false,
        higher_highs: false,
        ..bullish_facts(20.0, 20.0)
    }
}

pub fn instrument(i: usize) -> Instrument {
    Instrument::new(format!("inst-{i:03}"), format!("SYM{i:03}"))
}

/// `eligible` instruments with strictly decreasing scores (SYM000 best),
/// followed by `total - eligible` that fail screening.
pub fn universe_provider(total: usize, eligible: usize) -> StaticIndicatorProvider {
    (0..total).fold(StaticIndicatorProvider::new(MarketRegime::Bullish), |p, i| {
        let facts = if i < eligible {
            bullish_facts(90.0 - i as f64 * 0.5, 60.0)
        } else {
            weak_facts()
        };
        p.with_instrument(instrument(i), Some(facts))
    })
}

pub fn flat_account() -> AccountSnapshot {
    AccountSnapshot {
        capital: 100_000.0,
        ..Default::default()
    }
}

pub fn assessment_json(confidence: f64) -> String {
    serde_json::json!({
        "schema_version": "1.0",
        "stage": "advancing",
        "momentum_trend": "steady",
        "price_position": "near_support",
        "entry_timing": "immediate",
        "continuation_bias": "moderate",
        "confidence": confidence,
        "holding_period": "5-15"
    })
    .to_string()
}

pub fn symbol_of(request: &AiRequest) -> String {
    request
        .user_prompt
        .lines()
        .find_map(|l| l.strip_prefix("SYMBOL: "))
        .unwrap_or_default()
        .to_string()
}

/// AI provider answering from a script. Calls are numbered from 0 in the
/// order they arrive.
pub struct ScriptedProvider {
    pub name: String,
    pub model: String,
    pub calls: AtomicUsize,
    /// Call numbers that hang past any sensible timeout.
    pub hang_on: HashSet<usize>,
    /// Call numbers answered with a 429.
    pub rate_limit_on: HashSet<usize>,
    /// Call numbers answered with content that does not parse.
    pub garbage_on: HashSet<usize>,
    pub confidence: f64,
    pub seen_symbols: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(name: &str, model: &str) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            calls: AtomicUsize::new(0),
            hang_on: HashSet::new(),
            rate_limit_on: HashSet::new(),
            garbage_on: HashSet::new(),
            confidence: 8.0,
            seen_symbols: Mutex::new(Vec::new()),
        }
    }

    pub fn hanging_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.hang_on.extend(calls);
        self
    }

    pub fn rate_limited_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.rate_limit_on.extend(calls);
        self
    }

    pub fn garbage_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.garbage_on.extend(calls);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &AiRequest) -> Result<AiCompletion, DomainError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_symbols.lock().unwrap().push(symbol_of(request));
        if self.hang_on.contains(&n) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.rate_limit_on.contains(&n) {
            return Err(DomainError::RateLimited(self.name.clone()));
        }
        let content = if self.garbage_on.contains(&n) {
            "I think this looks great!".to_string()
        } else {
            assessment_json(self.confidence)
        };
        Ok(AiCompletion {
            content,
            model: self.model.clone(),
            input_tokens: 1000,
            output_tokens: 200,
        })
    }
}

pub struct FailingAccount;

impl AccountProvider for FailingAccount {
    fn snapshot(&self) -> Result<AccountSnapshot, DomainError> {
        Err(DomainError::Provider("broker unavailable".into()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, subject: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
    }
}

/// Defaults with a short AI timeout so hanging providers time out quickly.
pub fn test_config() -> FunnelConfig {
    let mut config = FunnelConfig::default();
    config.ai.timeout = Duration::from_millis(50);
    config
}

pub fn setup_with(
    db_path: &str,
    indicators: StaticIndicatorProvider,
    account: Arc<dyn AccountProvider>,
    ai: Vec<Arc<dyn AiProvider>>,
    notifier: Arc<dyn Notifier>,
) -> TradeFunnel {
    TradeFunnel::with_providers(
        db_path,
        test_config(),
        FunnelProviders {
            indicators: Arc::new(indicators),
            account,
            ai,
            notifier,
        },
    )
    .unwrap()
}

/// In-memory funnel with a flat account and no AI providers.
pub fn setup(indicators: StaticIndicatorProvider) -> TradeFunnel {
    setup_with(
        ":memory:",
        indicators,
        Arc::new(FixedAccountProvider::new(flat_account())),
        Vec::new(),
        Arc::new(RecordingNotifier::default()),
    )
}
