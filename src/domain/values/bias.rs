use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction a trade idea leans. `Avoid` is a decision too: the setup is
/// recorded but must never reach execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Long,
    Short,
    Avoid,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Long => write!(f, "long"),
            Bias::Short => write!(f, "short"),
            Bias::Avoid => write!(f, "avoid"),
        }
    }
}

impl FromStr for Bias {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" => Ok(Bias::Long),
            "short" => Ok(Bias::Short),
            "avoid" => Ok(Bias::Avoid),
            _ => Err(format!("Unknown bias: {s}")),
        }
    }
}
