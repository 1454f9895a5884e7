use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::ports::ai_cache::AiCache;

/// Process-local AI response cache.
#[derive(Default)]
pub struct MemoryAiCache {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryAiCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AiCache for MemoryAiCache {
    fn get(&self, key: &str, not_before: DateTime<Utc>) -> Result<Option<String>, DomainError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(entries
            .get(key)
            .filter(|(_, at)| *at >= not_before)
            .map(|(content, _)| content.clone()))
    }

    fn put(&self, key: &str, _model: &str, content: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        entries.insert(key.to_string(), (content.to_string(), at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn stale_entries_are_misses() {
        let cache = MemoryAiCache::new();
        let written = Utc::now() - Duration::hours(25);
        cache.put("k", "m", "{}", written).unwrap();
        assert_eq!(cache.get("k", Utc::now() - Duration::hours(24)).unwrap(), None);
        assert_eq!(cache.get("k", written).unwrap().as_deref(), Some("{}"));
    }
}
