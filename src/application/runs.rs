use crate::domain::entities::candidate::Candidate;
use crate::domain::entities::run::Run;
use crate::domain::error::DomainError;
use crate::domain::ports::run_repository::{RunFilter, RunRepository};
use crate::domain::values::run_type::RunType;
use crate::domain::values::stage::CandidateStage;
use std::sync::Arc;

pub struct RunsUseCase {
    repo: Arc<dyn RunRepository>,
}

impl RunsUseCase {
    pub fn new(repo: Arc<dyn RunRepository>) -> Self {
        Self { repo }
    }

    pub fn get(&self, id: &str) -> Result<Run, DomainError> {
        self.repo
            .get_run(id)?
            .ok_or_else(|| DomainError::NotFound(format!("run {id}")))
    }

    pub fn list(&self, run_type: Option<RunType>, limit: Option<usize>) -> Result<Vec<Run>, DomainError> {
        self.repo.list_runs(&RunFilter { run_type, limit })
    }

    pub fn candidates(&self, run_id: &str, stage: Option<CandidateStage>) -> Result<Vec<Candidate>, DomainError> {
        // Surface a missing run as NotFound rather than an empty list
        self.get(run_id)?;
        self.repo.list_candidates(run_id, stage)
    }
}
