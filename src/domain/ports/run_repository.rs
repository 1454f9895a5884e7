use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::run::Run;
use crate::domain::error::DomainError;
use crate::domain::values::run_type::RunType;
use crate::domain::values::stage::CandidateStage;

#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub run_type: Option<RunType>,
    pub limit: Option<usize>,
}

/// Storage for runs and their candidate rows. Every candidate query is scoped
/// by run id.
pub trait RunRepository: Send + Sync {
    fn create_run(&self, run: &Run) -> Result<(), DomainError>;
    fn update_run(&self, run: &Run) -> Result<(), DomainError>;
    fn get_run(&self, id: &str) -> Result<Option<Run>, DomainError>;
    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<Run>, DomainError>;
    /// Most recently completed run of a type, other than `exclude_id`.
    fn latest_completed_run(&self, run_type: RunType, exclude_id: &str) -> Result<Option<Run>, DomainError>;
    fn add_candidates(&self, candidates: &[Candidate]) -> Result<(), DomainError>;
    fn list_candidates(&self, run_id: &str, stage: Option<CandidateStage>) -> Result<Vec<Candidate>, DomainError>;
    /// Distinct symbols of a run's final-stage rows.
    fn final_symbols(&self, run_id: &str) -> Result<Vec<String>, DomainError>;
}
