use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::application::capacity::CapacityConfig;
use crate::application::gates::GateConfig;
use crate::application::ranker::RankerConfig;
use crate::application::scoring::ai_scorer::AiScorerConfig;
use crate::application::screener::ScreenerConfig;
use crate::application::trade_intent::IntentConfig;
use crate::domain::values::system_context::SessionConfig;

const PREFIX: &str = "TRADEFUNNEL_";

fn var(name: &str) -> Option<String> {
    env::var(format!("{PREFIX}{name}"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_str(name: &str) -> Option<String> {
    var(name)
}

fn env_f64(name: &str, default: f64) -> f64 {
    var(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    var(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    var(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    var(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// Tunables for every layer and gate. Defaults hold without any environment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunnelConfig {
    pub screener: ScreenerConfig,
    pub ranker: RankerConfig,
    pub ai: AiScorerConfig,
    pub capacity: CapacityConfig,
    pub intent: IntentConfig,
    pub gates: GateConfig,
    pub session: SessionConfig,
}

impl FunnelConfig {
    /// Defaults overlaid with `TRADEFUNNEL_*` variables. Unset or unparsable
    /// values keep their default.
    pub fn from_env() -> Self {
        let d = Self::default();

        let screener = ScreenerConfig {
            min_score: env_f64("MIN_SCORE", d.screener.min_score),
            min_price: env_f64("MIN_PRICE", d.screener.min_price),
            min_avg_volume: env_f64("MIN_AVG_VOLUME", d.screener.min_avg_volume),
            min_history_bars: env_u32("MIN_HISTORY_BARS", d.screener.min_history_bars),
            max_results: var("SCREENER_MAX").and_then(|s| s.parse().ok()),
        };
        let ranker = RankerConfig {
            max_results: env_usize("RANKER_MAX", d.ranker.max_results),
            ..d.ranker
        };
        let ai = AiScorerConfig {
            max_evaluations: env_usize("AI_MAX_EVALUATIONS", d.ai.max_evaluations),
            timeout: Duration::from_secs(env_u64("AI_TIMEOUT_SECS", d.ai.timeout.as_secs())),
            temperature: env_f64("AI_TEMPERATURE", d.ai.temperature as f64) as f32,
            cache_ttl: Duration::from_secs(3600 * env_u64("AI_CACHE_TTL_HOURS", d.ai.cache_ttl.as_secs() / 3600)),
        };
        let capacity = CapacityConfig {
            max_open_positions: env_u32("MAX_OPEN_POSITIONS", d.capacity.max_open_positions),
            max_exposure_pct: env_f64("MAX_EXPOSURE_PCT", d.capacity.max_exposure_pct),
            max_drawdown_pct: env_f64("MAX_DRAWDOWN_PCT", d.capacity.max_drawdown_pct),
            max_consecutive_losses: env_u32("MAX_CONSECUTIVE_LOSSES", d.capacity.max_consecutive_losses),
            default_limit: env_usize("FINAL_LIMIT", d.capacity.default_limit),
            ..d.capacity
        };
        let gates = GateConfig {
            min_risk_reward: env_f64("MIN_RISK_REWARD", d.gates.min_risk_reward),
            min_confidence: env_f64("MIN_CONFIDENCE", d.gates.min_confidence),
            ..d.gates
        };
        let session = SessionConfig {
            utc_offset_minutes: var("UTC_OFFSET_MINUTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.session.utc_offset_minutes),
            ..d.session
        };

        Self {
            screener,
            ranker,
            ai,
            capacity,
            intent: d.intent,
            gates,
            session,
        }
    }
}

/// Which external adapters to wire, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// AI providers in priority order; empty disables Layer 3 scoring.
    pub ai_providers: Vec<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub facts_path: Option<PathBuf>,
    pub account_path: Option<PathBuf>,
    /// Capital assumed for a flat account when no account file is given.
    pub capital: f64,
}

impl ProviderSettings {
    pub fn from_env() -> Self {
        Self {
            ai_providers: env_str("AI_PROVIDERS")
                .map(|s| {
                    s.split(',')
                        .map(|p| p.trim().to_lowercase())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            openai_api_key: env_str("OPENAI_API_KEY"),
            openai_model: env_str("OPENAI_MODEL"),
            openai_base_url: env_str("OPENAI_BASE_URL"),
            anthropic_api_key: env_str("ANTHROPIC_API_KEY"),
            anthropic_model: env_str("ANTHROPIC_MODEL"),
            facts_path: env_str("FACTS_PATH").map(PathBuf::from),
            account_path: env_str("ACCOUNT_PATH").map(PathBuf::from),
            capital: env_f64("CAPITAL", 100_000.0),
        }
    }
}
