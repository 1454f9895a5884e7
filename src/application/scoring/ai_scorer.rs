//! Layer 3: AI-assisted scoring under a hard evaluation cap.
//!
//! Candidates are evaluated strictly in the order given (best first), one at
//! a time, so accounting stays deterministic. A provider error, timeout or
//! unparsable answer skips that candidate only.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::application::scoring::cost_tracker::CostTracker;
use crate::application::scoring::prompt::{Prompt, PromptBuilder};
use crate::domain::entities::candidate::Candidate;
use crate::domain::error::DomainError;
use crate::domain::ports::ai_cache::AiCache;
use crate::domain::ports::ai_provider::{AiCompletion, AiProvider, AiRequest};
use crate::domain::values::ai_assessment::AiAssessment;
use crate::domain::values::cost::{compute_cost, CallOutcome, CostRecord};
use crate::domain::values::run_type::RunType;
use crate::domain::values::stage::CandidateStage;

#[derive(Debug, Clone, Serialize)]
pub struct AiScorerConfig {
    /// Hard cap on evaluations per run, applied in score order.
    pub max_evaluations: usize,
    #[serde(skip)]
    pub timeout: Duration,
    pub temperature: f32,
    #[serde(skip)]
    pub cache_ttl: Duration,
}

impl Default for AiScorerConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 15,
            timeout: Duration::from_secs(30),
            temperature: 0.2,
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

/// Raw provider content for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse {
    pub content: String,
    pub cached: bool,
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub assessment: AiAssessment,
    pub cached: bool,
    pub provider: String,
    pub model: String,
}

/// SHA-256 over model and full prompt content.
pub fn cache_key(model: &str, prompt: &Prompt) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(b"\n");
    hasher.update(prompt.system.as_bytes());
    hasher.update(b"\n");
    hasher.update(prompt.user.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct AiScorer {
    /// Priority order; first success wins.
    providers: Vec<Arc<dyn AiProvider>>,
    cache: Arc<dyn AiCache>,
    prompts: PromptBuilder,
    config: AiScorerConfig,
}

impl AiScorer {
    pub fn new(
        providers: Vec<Arc<dyn AiProvider>>,
        cache: Arc<dyn AiCache>,
        config: AiScorerConfig,
    ) -> Self {
        Self {
            providers,
            cache,
            prompts: PromptBuilder,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn prompt_for(&self, run_type: RunType, candidate: &Candidate) -> Prompt {
        self.prompts.build(run_type, candidate)
    }

    fn cached(&self, prompt: &Prompt) -> Option<(&Arc<dyn AiProvider>, String)> {
        let ttl = chrono::Duration::from_std(self.config.cache_ttl).unwrap_or(chrono::Duration::hours(24));
        let not_before = Utc::now() - ttl;
        for provider in &self.providers {
            match self.cache.get(&cache_key(provider.model(), prompt), not_before) {
                Ok(Some(content)) => return Some((provider, content)),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "AI cache read failed, treating as miss"),
            }
        }
        None
    }

    async fn call_chain(&self, prompt: &Prompt) -> Result<(&Arc<dyn AiProvider>, AiCompletion), DomainError> {
        let request = AiRequest {
            system_prompt: prompt.system.clone(),
            user_prompt: prompt.user.clone(),
            temperature: self.config.temperature,
            timeout: self.config.timeout,
        };
        let mut last = DomainError::Provider("no AI provider configured".into());

        for provider in &self.providers {
            let result = match tokio::time::timeout(self.config.timeout, provider.complete(&request)).await {
                Ok(r) => r,
                Err(_) => Err(DomainError::Timeout(self.config.timeout.as_millis() as u64)),
            };
            match result {
                Ok(completion) => return Ok((provider, completion)),
                Err(e) => {
                    if e.is_rate_limit() {
                        debug!(provider = provider.name(), "rate limited");
                    } else {
                        warn!(provider = provider.name(), error = %e, "AI provider call failed");
                    }
                    last = e;
                }
            }
        }
        Err(last)
    }

    /// Fetch content for a prompt: a fresh cache entry when one exists,
    /// otherwise the provider chain, whose answer is cached when it parses.
    /// Nothing here is metered.
    pub async fn call(&self, prompt: &Prompt) -> Result<AiResponse, DomainError> {
        if let Some((provider, content)) = self.cached(prompt) {
            return Ok(AiResponse {
                content,
                cached: true,
                provider: provider.name().to_string(),
                model: provider.model().to_string(),
                input_tokens: 0,
                output_tokens: 0,
            });
        }

        let (provider, completion) = self.call_chain(prompt).await?;
        // Only answers that parse are replayed; a bad one is retried next time
        if AiAssessment::parse(&completion.content).is_ok() {
            let key = cache_key(provider.model(), prompt);
            if let Err(e) = self.cache.put(&key, provider.model(), &completion.content, Utc::now()) {
                warn!(error = %e, "AI cache write failed");
            }
        } else {
            debug!(provider = provider.name(), "unparsable AI answer not cached");
        }
        Ok(AiResponse {
            content: completion.content,
            cached: false,
            provider: provider.name().to_string(),
            model: completion.model,
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
        })
    }

    /// Evaluate one candidate. Cache hits cost nothing and are not metered;
    /// every cache miss produces exactly one [`CostRecord`] bound to its
    /// outcome.
    pub async fn evaluate(
        &self,
        run_type: RunType,
        candidate: &Candidate,
        tracker: &mut CostTracker,
    ) -> Result<Evaluation, DomainError> {
        let prompt = self.prompts.build(run_type, candidate);

        let response = match self.call(&prompt).await {
            Ok(r) => r,
            Err(e) => {
                // All providers were tried; attribute the failure to the last.
                let last = self.providers.last();
                tracker.record(CostRecord {
                    symbol: candidate.symbol.clone(),
                    provider: last.map(|p| p.name().to_string()).unwrap_or_default(),
                    model: last.map(|p| p.model().to_string()).unwrap_or_default(),
                    input_tokens: 0,
                    output_tokens: 0,
                    cost: 0.0,
                    outcome: CallOutcome::Failure,
                });
                return Err(e);
            }
        };

        let parsed = AiAssessment::parse(&response.content);
        if response.cached {
            tracker.record_cache_hit(parsed.is_ok());
        } else {
            tracker.record(CostRecord {
                symbol: candidate.symbol.clone(),
                provider: response.provider.clone(),
                model: response.model.clone(),
                input_tokens: response.input_tokens,
                output_tokens: response.output_tokens,
                cost: compute_cost(&response.model, response.input_tokens, response.output_tokens),
                outcome: if parsed.is_ok() {
                    CallOutcome::Success
                } else {
                    CallOutcome::Failure
                },
            });
        }

        Ok(Evaluation {
            assessment: parsed?,
            cached: response.cached,
            provider: response.provider,
            model: response.model,
        })
    }

    /// Run Layer 3 over ranked candidates. Without providers the capped set
    /// passes through unscored.
    pub async fn score(
        &self,
        run_type: RunType,
        ranked: &[Candidate],
        tracker: &mut CostTracker,
    ) -> Vec<Candidate> {
        let capped = ranked.iter().take(self.config.max_evaluations);

        if !self.is_enabled() {
            info!("no AI provider configured, passing ranked candidates through");
            return capped
                .enumerate()
                .map(|(i, c)| {
                    let mut next = c.advance(CandidateStage::AiEvaluated);
                    next.rank = i + 1;
                    next.annotate("ai_mode", "disabled");
                    next
                })
                .collect();
        }

        let mut evaluated = Vec::new();
        for candidate in capped {
            match self.evaluate(run_type, candidate, tracker).await {
                Ok(eval) => {
                    let mut next = candidate.advance(CandidateStage::AiEvaluated);
                    next.set_ai(eval.assessment);
                    next.annotate("ai_cached", eval.cached);
                    next.annotate("ai_provider", eval.provider);
                    next.annotate("ai_model", eval.model);
                    next.rank = evaluated.len() + 1;
                    evaluated.push(next);
                }
                Err(e) if e.is_rate_limit() => {
                    debug!(symbol = %candidate.symbol, "skipped after rate limit");
                }
                Err(e) => {
                    warn!(symbol = %candidate.symbol, error = %e, "AI evaluation skipped");
                }
            }
        }
        evaluated
    }
}
