use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Funnel layer a candidate row was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStage {
    Screened,
    Ranked,
    AiEvaluated,
    Final,
}

impl fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateStage::Screened => write!(f, "screened"),
            CandidateStage::Ranked => write!(f, "ranked"),
            CandidateStage::AiEvaluated => write!(f, "ai_evaluated"),
            CandidateStage::Final => write!(f, "final"),
        }
    }
}

impl FromStr for CandidateStage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "screened" => Ok(CandidateStage::Screened),
            "ranked" => Ok(CandidateStage::Ranked),
            "ai_evaluated" | "ai" => Ok(CandidateStage::AiEvaluated),
            "final" => Ok(CandidateStage::Final),
            _ => Err(format!("Unknown candidate stage: {s}")),
        }
    }
}

/// Priority bucket assigned by the capacity filter. `Tier1` is actionable,
/// `Tier2` is a watch list, `Tier3` is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[serde(rename = "tier_1")]
    Tier1,
    #[serde(rename = "tier_2")]
    Tier2,
    #[serde(rename = "tier_3")]
    Tier3,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Tier1 => write!(f, "tier_1"),
            Tier::Tier2 => write!(f, "tier_2"),
            Tier::Tier3 => write!(f, "tier_3"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tier_1" | "1" => Ok(Tier::Tier1),
            "tier_2" | "2" => Ok(Tier::Tier2),
            "tier_3" | "3" => Ok(Tier::Tier3),
            _ => Err(format!("Unknown tier: {s}")),
        }
    }
}
