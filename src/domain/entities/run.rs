use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::DomainError;
use crate::domain::values::cost::round4;
use crate::domain::values::run_type::{RunStatus, RunType};

/// One end-to-end execution of the funnel for a strategy type.
///
/// `universe_size` is fixed at creation, status leaves `Running` exactly once,
/// metrics are only ever merged in, and AI usage totals only grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub run_type: RunType,
    universe_size: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    status: RunStatus,
    metrics: Map<String, Value>,
    ai_calls_count: u32,
    ai_cost: f64,
    pub error: Option<String>,
}

impl Run {
    pub fn start(run_type: RunType, universe_size: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            run_type,
            universe_size,
            started_at: Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            metrics: Map::new(),
            ai_calls_count: 0,
            ai_cost: 0.0,
            error: None,
        }
    }

    /// Rebuild a run from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: String,
        run_type: RunType,
        universe_size: usize,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        status: RunStatus,
        metrics: Map<String, Value>,
        ai_calls_count: u32,
        ai_cost: f64,
        error: Option<String>,
    ) -> Self {
        Self {
            id,
            run_type,
            universe_size,
            started_at,
            completed_at,
            status,
            metrics,
            ai_calls_count,
            ai_cost,
            error,
        }
    }

    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn metrics(&self) -> &Map<String, Value> {
        &self.metrics
    }

    pub fn ai_calls_count(&self) -> u32 {
        self.ai_calls_count
    }

    pub fn ai_cost(&self) -> f64 {
        self.ai_cost
    }

    pub fn metric_f64(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(Value::as_f64)
    }

    pub fn metric_u64(&self, key: &str) -> Option<u64> {
        self.metrics.get(key).and_then(Value::as_u64)
    }

    pub fn merge_metrics(&mut self, metrics: Map<String, Value>) {
        self.metrics.extend(metrics);
    }

    pub fn add_ai_usage(&mut self, calls: u32, cost: f64) {
        self.ai_calls_count += calls;
        self.ai_cost = round4(self.ai_cost + cost.max(0.0));
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.finish(RunStatus::Completed)
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        self.finish(RunStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> Result<(), DomainError> {
        if self.status != RunStatus::Running {
            return Err(DomainError::InvalidState(format!(
                "run {} already {}",
                self.id, self.status
            )));
        }
        self.status = status;
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}
