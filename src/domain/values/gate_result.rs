use serde::{Deserialize, Serialize};

/// Outcome of a pre-execution gate. A rejection is a value, not an error:
/// `reason` carries the first violation, `errors` the full list for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub approved: bool,
    pub reason: Option<String>,
    pub errors: Vec<String>,
}

impl GateResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            approved: errors.is_empty(),
            reason: errors.first().cloned(),
            errors,
        }
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.contains(needle))
    }
}
