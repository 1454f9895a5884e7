//! Versioned AI response schema.
//!
//! The provider must answer with exactly these keys and enum values. Anything
//! else, including a different `schema_version`, is a parse failure; nothing
//! is coerced.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

pub const SCHEMA_VERSION: &str = "1.0";

pub const CONFIDENCE_MIN: f64 = 0.0;
pub const CONFIDENCE_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStage {
    Base,
    Advancing,
    Topping,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumTrend {
    Accelerating,
    Steady,
    Decelerating,
    Reversing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    NearSupport,
    MidRange,
    NearResistance,
    Breakout,
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTiming {
    Immediate,
    WaitForPullback,
    WaitForBreakout,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationBias {
    Strong,
    Moderate,
    Weak,
    None,
}

/// Parsed provider answer for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiAssessment {
    pub schema_version: String,
    pub stage: PriceStage,
    pub momentum_trend: MomentumTrend,
    pub price_position: PricePosition,
    pub entry_timing: EntryTiming,
    pub continuation_bias: ContinuationBias,
    /// 0.0–10.0
    pub confidence: f64,
    /// "low-high" in trading days, e.g. "5-15".
    pub holding_period: String,
}

impl AiAssessment {
    /// Parse raw provider content, tolerating a surrounding markdown fence.
    pub fn parse(content: &str) -> Result<Self, DomainError> {
        let clean = strip_code_fence(content);
        let assessment: AiAssessment = serde_json::from_str(clean)
            .map_err(|e| DomainError::Parse(format!("AI response does not match schema: {e}")))?;
        assessment.validate()?;
        Ok(assessment)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(DomainError::Parse(format!(
                "schema_version mismatch: expected {SCHEMA_VERSION}, got {}",
                self.schema_version
            )));
        }
        if !self.confidence.is_finite()
            || !(CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&self.confidence)
        {
            return Err(DomainError::Parse(format!(
                "confidence {} outside [{CONFIDENCE_MIN}, {CONFIDENCE_MAX}]",
                self.confidence
            )));
        }
        self.holding_days()?;
        Ok(())
    }

    /// Holding period bounds in days.
    pub fn holding_days(&self) -> Result<(u32, u32), DomainError> {
        let invalid = || DomainError::Parse(format!("invalid holding_period: {}", self.holding_period));
        let (low, high) = self.holding_period.split_once('-').ok_or_else(invalid)?;
        let low: u32 = low.trim().parse().map_err(|_| invalid())?;
        let high: u32 = high.trim().parse().map_err(|_| invalid())?;
        if low > high {
            return Err(invalid());
        }
        Ok((low, high))
    }
}

fn strip_code_fence(content: &str) -> &str {
    content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
