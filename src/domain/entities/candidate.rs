//! Candidate: one instrument's scored record as it moves through the funnel.
//!
//! Each layer produces a new Candidate value from the previous one via
//! [`Candidate::advance`]; the prior-stage row stays untouched and is linked by
//! `parent_id`. Enrichment only fills empty fields and appends metadata keys,
//! so every stage row remains an accurate audit record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::values::ai_assessment::AiAssessment;
use crate::domain::values::indicator_facts::{IndicatorFacts, Instrument, Trend};
use crate::domain::values::stage::{CandidateStage, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawScores {
    /// Layer-1 eligibility score, 0–100.
    pub score: f64,
    pub base_score: f64,
    pub mtf_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    /// Run this row belongs to. Rows of other runs are never visible to it.
    pub run_id: String,
    /// Row of the previous stage this one was derived from.
    pub parent_id: Option<String>,
    pub instrument_id: String,
    pub symbol: String,
    pub stage: CandidateStage,
    /// 1-based position within the stage's output.
    pub rank: usize,
    pub raw_scores: RawScores,
    pub indicators: IndicatorFacts,
    pub mtf_snapshot: BTreeMap<String, Trend>,
    pub trade_quality_score: Option<f64>,
    pub ai_confidence: Option<f64>,
    pub ai_assessment: Option<AiAssessment>,
    pub combined_score: Option<f64>,
    pub tier: Option<Tier>,
    pub metadata: Map<String, Value>,
}

/// Row id: unique per run, stage and instrument, and reproducible.
pub fn candidate_id(run_id: &str, stage: CandidateStage, instrument_id: &str) -> String {
    format!("{run_id}:{stage}:{instrument_id}")
}

impl Candidate {
    pub fn screened(run_id: &str, instrument: &Instrument, facts: IndicatorFacts, score: f64) -> Self {
        Self {
            id: candidate_id(run_id, CandidateStage::Screened, &instrument.id),
            run_id: run_id.to_string(),
            parent_id: None,
            instrument_id: instrument.id.clone(),
            symbol: instrument.symbol.clone(),
            stage: CandidateStage::Screened,
            rank: 0,
            raw_scores: RawScores {
                score,
                base_score: facts.base_score,
                mtf_score: facts.mtf_score,
            },
            mtf_snapshot: facts.timeframes.clone(),
            indicators: facts,
            trade_quality_score: None,
            ai_confidence: None,
            ai_assessment: None,
            combined_score: None,
            tier: None,
            metadata: Map::new(),
        }
    }

    /// Derive the next-stage row. Scores and metadata carry over.
    pub fn advance(&self, stage: CandidateStage) -> Self {
        Self {
            id: candidate_id(&self.run_id, stage, &self.instrument_id),
            parent_id: Some(self.id.clone()),
            stage,
            rank: 0,
            ..self.clone()
        }
    }

    /// Append a metadata key. Existing keys are never overwritten; returns
    /// false when the key was already present.
    pub fn annotate(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.metadata.contains_key(key) {
            return false;
        }
        self.metadata.insert(key.to_string(), value.into());
        true
    }

    pub fn set_quality(&mut self, score: f64) {
        self.trade_quality_score.get_or_insert(score);
    }

    pub fn set_ai(&mut self, assessment: AiAssessment) {
        if self.ai_assessment.is_none() {
            self.ai_confidence = Some(assessment.confidence);
            self.ai_assessment = Some(assessment);
        }
    }

    pub fn set_selection(&mut self, combined_score: f64, tier: Tier) {
        self.combined_score.get_or_insert(combined_score);
        self.tier.get_or_insert(tier);
    }
}
