use crate::domain::error::DomainError;
use crate::domain::values::indicator_facts::{IndicatorFacts, Instrument};
use crate::domain::values::run_type::RunType;
use crate::domain::values::system_context::MarketRegime;

/// Source of the scan universe and per-instrument technical facts.
pub trait IndicatorProvider: Send + Sync {
    /// Full universe to scan for a strategy type.
    fn universe(&self, run_type: RunType) -> Result<Vec<Instrument>, DomainError>;

    /// Facts for one instrument. `Ok(None)` means insufficient history and is
    /// a skip, not an error.
    fn facts(&self, instrument: &Instrument) -> Result<Option<IndicatorFacts>, DomainError>;

    /// Broad market regime, read once per decision.
    fn market_regime(&self) -> Result<MarketRegime, DomainError>;
}
