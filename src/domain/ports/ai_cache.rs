use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;

/// Response cache for AI calls, keyed by a hash of prompt content and model.
pub trait AiCache: Send + Sync {
    /// Content stored under `key` no earlier than `not_before`.
    fn get(&self, key: &str, not_before: DateTime<Utc>) -> Result<Option<String>, DomainError>;
    fn put(&self, key: &str, model: &str, content: &str, at: DateTime<Utc>) -> Result<(), DomainError>;
}
