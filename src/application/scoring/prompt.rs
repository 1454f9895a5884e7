//! Locked, versioned prompt templates.
//!
//! A prompt is a pure function of run type and candidate: fixed system text,
//! fixed output schema, and a data block with fixed field order and number
//! formatting. Identical inputs always give byte-identical prompts, which is
//! what makes the response cache key stable.

use crate::domain::entities::candidate::Candidate;
use crate::domain::values::ai_assessment::SCHEMA_VERSION;
use crate::domain::values::run_type::RunType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub version: &'static str,
    pub system: String,
    pub user: String,
}

const OUTPUT_SCHEMA: &str = r#"Respond with a single JSON object and nothing else:
{
  "schema_version": "1.0",
  "stage": "base" | "advancing" | "topping" | "declining",
  "momentum_trend": "accelerating" | "steady" | "decelerating" | "reversing",
  "price_position": "near_support" | "mid_range" | "near_resistance" | "breakout" | "extended",
  "entry_timing": "immediate" | "wait_for_pullback" | "wait_for_breakout" | "avoid",
  "continuation_bias": "strong" | "moderate" | "weak" | "none",
  "confidence": <number between 0.0 and 10.0>,
  "holding_period": "<low>-<high>" (trading days, integers, low <= high)
}"#;

pub fn template_version(run_type: RunType) -> &'static str {
    match run_type {
        RunType::Swing => "swing-v1",
        RunType::Longterm => "longterm-v1",
    }
}

fn horizon(run_type: RunType) -> &'static str {
    match run_type {
        RunType::Swing => "a swing trade held for roughly 3 to 20 trading days",
        RunType::Longterm => "a position trade held for roughly 20 to 120 trading days",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(&self, run_type: RunType, candidate: &Candidate) -> Prompt {
        let version = template_version(run_type);
        let system = format!(
            "You are a disciplined equity technical analyst (template {version}, schema {SCHEMA_VERSION}). \
             Assess whether the instrument described below is suitable for {}. \
             Judge only from the data provided. Do not invent prices or news.\n\n{OUTPUT_SCHEMA}",
            horizon(run_type)
        );
        Prompt {
            version,
            system,
            user: data_block(candidate),
        }
    }
}

fn flag(name: &str, value: bool) -> String {
    format!("{name}={}", if value { "yes" } else { "no" })
}

fn data_block(c: &Candidate) -> String {
    let f = &c.indicators;
    let timeframes = if c.mtf_snapshot.is_empty() {
        "n/a".to_string()
    } else {
        c.mtf_snapshot
            .iter()
            .map(|(tf, trend)| format!("{tf}={trend}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let quality = c
        .trade_quality_score
        .map(|q| format!("{q:.2}"))
        .unwrap_or_else(|| "n/a".into());
    let trend_flags = [
        flag("bullish_trend", f.bullish_trend),
        flag("bearish_trend", f.bearish_trend),
        flag("above_sma_50", f.above_sma_50),
        flag("above_sma_200", f.above_sma_200),
        flag("higher_highs", f.higher_highs),
    ];
    let momentum_flags = [
        flag("rsi_bullish", f.rsi_bullish),
        flag("macd_bullish", f.macd_bullish),
        flag("volume_surge", f.volume_surge),
        flag("rsi_bearish", f.rsi_bearish),
        flag("macd_bearish", f.macd_bearish),
    ];

    [
        format!("SYMBOL: {}", c.symbol),
        format!("CLOSE: {:.2}", f.close),
        format!("ATR: {:.2}", f.atr),
        format!("AVG_VOLUME: {:.0}", f.avg_volume),
        format!("SCREENER_SCORE: {:.2}", c.raw_scores.score),
        format!("BASE_SCORE: {:.2}", c.raw_scores.base_score),
        format!("MTF_SCORE: {:.2}", c.raw_scores.mtf_score),
        format!("QUALITY_SCORE: {quality}"),
        format!("TIMEFRAMES: {timeframes}"),
        format!("TREND_FLAGS: {}", trend_flags.join(", ")),
        format!("MOMENTUM_FLAGS: {}", momentum_flags.join(", ")),
        format!("SETUP_STATUS: {}", f.setup_status),
    ]
    .join("\n")
}
