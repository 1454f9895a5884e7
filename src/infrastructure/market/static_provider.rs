use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::ports::indicator_provider::IndicatorProvider;
use crate::domain::values::indicator_facts::{IndicatorFacts, Instrument};
use crate::domain::values::run_type::RunType;
use crate::domain::values::system_context::MarketRegime;

/// One universe entry. An empty `run_types` list means every run type;
/// missing `facts` means insufficient history.
#[derive(Debug, Clone, Deserialize)]
pub struct FactsEntry {
    #[serde(flatten)]
    pub instrument: Instrument,
    #[serde(default)]
    pub run_types: Vec<RunType>,
    #[serde(default)]
    pub facts: Option<IndicatorFacts>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactsFile {
    pub market_regime: MarketRegime,
    pub instruments: Vec<FactsEntry>,
}

/// Indicator facts precomputed elsewhere and held in memory, loaded from a
/// JSON export or assembled in code.
pub struct StaticIndicatorProvider {
    entries: Vec<FactsEntry>,
    index: HashMap<String, usize>,
    regime: MarketRegime,
}

impl StaticIndicatorProvider {
    pub fn new(regime: MarketRegime) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            regime,
        }
    }

    pub fn with_instrument(mut self, instrument: Instrument, facts: Option<IndicatorFacts>) -> Self {
        self.push(FactsEntry {
            instrument,
            run_types: Vec::new(),
            facts,
        });
        self
    }

    fn push(&mut self, entry: FactsEntry) {
        match self.index.get(&entry.instrument.id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.instrument.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn from_file(file: FactsFile) -> Self {
        let mut provider = Self::new(file.market_regime);
        for entry in file.instruments {
            provider.push(entry);
        }
        provider
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("cannot read facts file {}: {e}", path.display())))?;
        let file: FactsFile = serde_json::from_str(&raw)?;
        info!(path = %path.display(), instruments = file.instruments.len(), "loaded indicator facts");
        Ok(Self::from_file(file))
    }
}

impl IndicatorProvider for StaticIndicatorProvider {
    fn universe(&self, run_type: RunType) -> Result<Vec<Instrument>, DomainError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.run_types.is_empty() || e.run_types.contains(&run_type))
            .map(|e| e.instrument.clone())
            .collect())
    }

    fn facts(&self, instrument: &Instrument) -> Result<Option<IndicatorFacts>, DomainError> {
        let i = self
            .index
            .get(&instrument.id)
            .ok_or_else(|| DomainError::NotFound(format!("no facts for instrument {}", instrument.id)))?;
        Ok(self.entries[*i].facts.clone())
    }

    fn market_regime(&self) -> Result<MarketRegime, DomainError> {
        Ok(self.regime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_universe_respects_run_types() {
        let file: FactsFile = serde_json::from_value(serde_json::json!({
            "market_regime": "bullish",
            "instruments": [
                {"id": "1", "symbol": "AAA", "run_types": ["swing"]},
                {"id": "2", "symbol": "BBB"}
            ]
        }))
        .unwrap();
        let provider = StaticIndicatorProvider::from_file(file);
        assert_eq!(provider.universe(RunType::Swing).unwrap().len(), 2);
        let longterm = provider.universe(RunType::Longterm).unwrap();
        assert_eq!(longterm, vec![Instrument::new("2", "BBB")]);
        assert_eq!(provider.facts(&longterm[0]).unwrap(), None);
        assert!(provider.facts(&Instrument::new("9", "ZZZ")).is_err());
    }
}
