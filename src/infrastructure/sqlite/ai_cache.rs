use crate::domain::error::DomainError;
use crate::domain::ports::ai_cache::AiCache;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// AI response cache shared across runs and processes through SQLite.
pub struct SqliteAiCache {
    conn: Mutex<Connection>,
}

impl SqliteAiCache {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl AiCache for SqliteAiCache {
    fn get(&self, key: &str, not_before: DateTime<Utc>) -> Result<Option<String>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT content, created_at FROM ai_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(content, created)| {
            let created = DateTime::parse_from_rfc3339(&created).ok()?.with_timezone(&Utc);
            (created >= not_before).then_some(content)
        }))
    }

    fn put(&self, key: &str, model: &str, content: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO ai_cache (key, model, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, model, content, at.to_rfc3339()],
        )
        .map_err(|e| DomainError::Database(format!("Failed to cache AI response: {e}")))?;
        Ok(())
    }
}
